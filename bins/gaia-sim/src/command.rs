//! Command-line definition.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(name = "gaia-sim")]
#[clap(version, about = "Simulator for the GAIA 32-bit processor")]
pub struct Cli {
    /// Program image to execute
    pub file: PathBuf,

    /// Bootloader test mode: entry point 0, relaxed jump range checks
    #[clap(long = "boot-test")]
    pub boot_test: bool,

    /// Enable the debugger and the crash trace
    #[clap(long)]
    pub debug: bool,

    /// Use the bit-level MasWag FPU instead of host floats
    #[clap(long = "fpu-maswag")]
    pub fpu_maswag: bool,

    /// Memory size in MiB
    #[clap(long, value_name = "MB", default_value_t = 4)]
    pub msize: u32,

    /// Disable the interrupt machinery; serial reads block
    #[clap(long = "no-interrupt")]
    pub no_interrupt: bool,

    /// Same as --no-interrupt
    #[clap(long)]
    pub simple: bool,

    /// Print the simulator status after the run
    #[clap(long)]
    pub stat: bool,
}
