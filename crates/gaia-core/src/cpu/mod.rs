//! The GAIA machine.
//!
//! All mutable simulator state lives in one [`Machine`] value: the register
//! file, RAM, the translation unit, the interrupt controller and the debug
//! bookkeeping. Components take the machine by mutable reference.

use crate::debug::DebugState;
use crate::devices::serial::Serial;
use crate::exception::Exception;
use crate::fpu::FpuKind;
use crate::interrupt::{InterruptState, Irq};
use crate::mem::Memory;
use crate::mmu::{self, MmuState};
use crate::reg::RegisterFile;
use colored::Colorize;

pub mod exec;

/// Sentinel word terminating execution. Never a valid encoding.
pub const HALT_CODE: u32 = 0xffff_ffff;

/// Default RAM size (4 MiB).
pub const DEFAULT_MEM_SIZE: u32 = 0x40_0000;
/// Default load address and initial PC.
pub const DEFAULT_ENTRY_POINT: u32 = 0x2000;
/// Executed cycles per timer tick: a 100 Hz timer on a 93.33 MHz machine.
pub const DEFAULT_TIMER_INTERVAL: u64 = 933_300;

/// Static simulation parameters, fixed for the lifetime of a machine.
#[derive(Debug, Clone)]
pub struct Config {
    /// RAM size in bytes; must be a power of two.
    pub mem_size: u32,
    pub entry_point: u32,
    /// Bootloader test mode: entry point 0, relaxed jump range checks and
    /// no stack initialization.
    pub boot_test: bool,
    pub debug_enabled: bool,
    /// Disable the interrupt machinery; serial reads block.
    pub intr_disabled: bool,
    pub fpu: FpuKind,
    /// Include the register table in status reports.
    pub show_stat: bool,
    pub timer_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mem_size: DEFAULT_MEM_SIZE,
            entry_point: DEFAULT_ENTRY_POINT,
            boot_test: false,
            debug_enabled: false,
            intr_disabled: false,
            fpu: FpuKind::default(),
            show_stat: false,
            timer_interval: DEFAULT_TIMER_INTERVAL,
        }
    }
}

#[derive(Debug)]
pub struct Machine {
    pub regs: RegisterFile,
    /// Current instruction address, virtual when the MMU is on.
    pub pc: u32,
    pub mem: Memory,
    pub inst_cnt: u64,
    pub intr: InterruptState,
    pub mmu: MmuState,
    pub serial: Serial,
    pub debug: DebugState,
    pub config: Config,
    timer_tick: u64,
}

impl Machine {
    pub fn new(config: Config) -> Self {
        Self {
            regs: RegisterFile::new(config.mem_size, config.boot_test),
            pc: config.entry_point,
            mem: Memory::new(config.mem_size),
            inst_cnt: 0,
            intr: InterruptState::default(),
            mmu: MmuState::default(),
            serial: Serial::new(config.intr_disabled),
            debug: DebugState::new(config.debug_enabled),
            config,
            timer_tick: 0,
        }
    }

    /// Translate a virtual address through the current page tables.
    pub fn translate(&self, vaddr: u32) -> Result<u32, Exception> {
        mmu::translate(&self.mem, self.mmu, vaddr)
    }

    /// Execute one decoded instruction word.
    pub fn execute(&mut self, inst: u32) -> Result<(), Exception> {
        exec::execute(self, inst)
    }

    /// Sample IRQ sources and deliver the highest-priority pending IRQ if
    /// interrupts are enabled. Runs before every fetch, so a delivery
    /// rewrites the PC for the current cycle.
    pub fn interrupt(&mut self) {
        self.sample_irqs();
        if self.intr.pending != 0 && self.intr.enabled {
            self.intr.enabled = false;
            self.intr.epc = self.pc.wrapping_add(4);
            if let Some(num) = self.intr.take_lowest_pending() {
                self.intr.irq_num = num;
                tracing::trace!(irq = num, epc = self.intr.epc, "interrupt delivered");
            }
            self.pc = self.intr.handler_addr;
        }
    }

    fn sample_irqs(&mut self) {
        self.timer_tick += 1;
        if self.timer_tick >= self.config.timer_interval {
            self.intr.raise(Irq::Timer);
            self.timer_tick = 0;
        }
        if self.serial.has_input() {
            self.intr.raise(Irq::Serial);
        }
    }

    /// Deliver the software trap raised by `sysenter`.
    pub fn sysenter(&mut self) {
        self.intr.enabled = false;
        self.intr.irq_num = Irq::Sysenter as u32;
        // The interrupted address itself is already the next instruction,
        // so no -4 adjustment is needed before sysexit.
        self.intr.epc = self.pc.wrapping_add(4);
        self.pc = self.intr.handler_addr.wrapping_sub(4);
    }

    /// Return from a trap handler and re-enable interrupts.
    pub fn sysexit(&mut self) {
        self.pc = self.intr.epc.wrapping_sub(4);
        self.intr.enabled = true;
    }

    /// Print the machine status to stderr. `show_vpc` permits translating
    /// the PC; the error reporter clears it when translation itself failed.
    pub fn print_env(&self, show_vpc: bool) {
        eprintln!("{}", "*** Simulator Status ***".bold());
        if self.config.show_stat {
            eprintln!("<register>");
            for i in 0..16 {
                eprintln!(
                    "  r{:<2}: {:11} (0x{:08x}) / r{:<2}: {:11} (0x{:08x})",
                    i,
                    self.regs.read(i) as i32,
                    self.regs.read(i),
                    i + 16,
                    self.regs.read(i + 16) as i32,
                    self.regs.read(i + 16),
                );
            }
        }
        if self.mmu.enabled {
            eprintln!("<Current Virtual PC>: 0x{:08x}", self.pc);
            if show_vpc {
                if let Ok(paddr) = self.translate(self.pc) {
                    eprintln!("<Current Physical PC>: 0x{:06x}", paddr);
                }
            }
        } else {
            eprintln!("<Current PC>: 0x{:06x}", self.pc);
        }
        eprintln!("<Number of executed instructions>: {}", self.inst_cnt);
    }
}
