//! Top-level simulator driver.

use crate::cpu::{Config, Machine, HALT_CODE};
use crate::debug;
use crate::exception::Exception;
use crate::loader::{self, LoaderError};
use crate::term::RawTerminal;
use std::path::Path;

/// Owns the machine and the terminal state and drives the cycle loop.
pub struct Emu {
    pub machine: Machine,
    pub term: RawTerminal,
}

impl Emu {
    pub fn new(config: Config) -> Self {
        Self {
            machine: Machine::new(config),
            term: RawTerminal::disabled(),
        }
    }

    /// Put the controlling terminal into raw mode for the run; the guard
    /// restores it when the emulator is dropped. Blocking-serial runs want
    /// the terminal left alone.
    pub fn init_term(&mut self) {
        if !self.machine.config.intr_disabled {
            self.term = RawTerminal::enter();
        }
    }

    /// Load a program image file at the entry point.
    pub fn load_image(&mut self, path: &Path) -> Result<(), Exception> {
        let payload = loader::read_image(path)?;
        let entry = self.machine.config.entry_point;
        let size = payload.len() as u32;
        if entry.checked_add(size).is_none_or(|end| end > self.machine.mem.size()) {
            return Err(LoaderError::TooLarge { size, entry }.into());
        }
        self.machine.mem.write_bytes(entry, &payload);
        Ok(())
    }

    /// Place raw instruction words at the entry point. Embedded programs
    /// and tests skip the file header this way.
    pub fn load_program(&mut self, words: &[u32]) {
        let mut addr = self.machine.config.entry_point;
        for &word in words {
            self.machine.mem.write_word(addr, word);
            addr += 4;
        }
    }

    /// Run until the halt word. Each cycle: deliver interrupts, run the
    /// debug hook, translate the PC, stop on halt, execute, advance.
    pub fn run(&mut self) -> Result<(), Exception> {
        loop {
            if !self.machine.config.intr_disabled {
                self.machine.interrupt();
            }
            if self.machine.debug.enabled {
                debug::hook(&mut self.machine, &self.term)?;
            }
            let phys_pc = self.machine.translate(self.machine.pc)?;
            if phys_pc >= self.machine.mem.size() {
                return Err(Exception::PcOutOfRange);
            }
            let inst = self.machine.mem.read_word(phys_pc & !3);
            if inst == HALT_CODE {
                tracing::info!(executed = self.machine.inst_cnt, "halt");
                return Ok(());
            }
            self.machine.execute(inst)?;
            self.machine.pc = self.machine.pc.wrapping_add(4);
            self.machine.inst_cnt += 1;
        }
    }
}
