//! gaia-sim cli
mod command;
mod utils;

use anyhow::{ensure, Result};
use clap::Parser;
use colored::Colorize;
use command::Cli;
use gaia_core::cpu::{Config, Machine, DEFAULT_ENTRY_POINT};
use gaia_core::debug;
use gaia_core::emu::Emu;
use gaia_core::exception::Exception;
use gaia_core::fpu::FpuKind;
use std::process::ExitCode;
use utils::init_logger;

fn main() -> ExitCode {
    // Initialize the logger
    init_logger();

    // Parse the command line arguments
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    ensure!(
        cli.msize > 0 && cli.msize <= 2048 && cli.msize.is_power_of_two(),
        "memory size must be a power of two between 1 and 2048 MiB"
    );

    let config = Config {
        mem_size: cli.msize << 20,
        entry_point: if cli.boot_test { 0 } else { DEFAULT_ENTRY_POINT },
        boot_test: cli.boot_test,
        debug_enabled: cli.debug,
        intr_disabled: cli.no_interrupt || cli.simple,
        fpu: if cli.fpu_maswag {
            FpuKind::Maswag
        } else {
            FpuKind::Native
        },
        show_stat: cli.stat,
        ..Config::default()
    };

    tracing::info!(file = %cli.file.display(), "starting simulation");
    let mut emu = Emu::new(config);
    emu.init_term();
    let result = emu.load_image(&cli.file).and_then(|_| emu.run());

    match result {
        Ok(()) => {
            if emu.machine.config.show_stat {
                emu.machine.print_env(true);
                debug::dump_trace(&emu.machine);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            report_fatal(&emu.machine, &e);
            emu.term.suspend();
            debug::dump_trace(&emu.machine);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Central fatal-error report: the red-tagged message and the machine
/// status. The PC is only translated when the failure did not come from
/// the translation path itself.
fn report_fatal(machine: &Machine, e: &Exception) {
    eprintln!("{}{}", "runtime error: ".red().bold(), e.to_string().bold());
    eprintln!();
    machine.print_env(!e.is_translation_fault());
}
