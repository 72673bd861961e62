//! Memory port: translated loads and stores, dispatched to RAM or to the
//! memory-mapped device registers.
//!
//! The device block sits outside RAM. Physical addresses below `mem_size`
//! go to RAM; the fixed addresses below hit devices; everything else is a
//! fatal out-of-range access.

use crate::cpu::Machine;
use crate::exception::{Access, Exception};

/// Serial data: read the next input byte / write an output byte.
pub const MMIO_SERIAL_DATA: u32 = 0x8000_1000;
/// Serial Tx-ready flag; always reads 1 in simulation.
pub const MMIO_SERIAL_TX_READY: u32 = 0x8000_1004;
/// Trap handler entry address.
pub const MMIO_INTR_ADDR: u32 = 0x8000_1100;
/// Global interrupt mask.
pub const MMIO_INTR_ENABLED: u32 = 0x8000_1104;
/// Saved PC of the last trap.
pub const MMIO_EPC: u32 = 0x8000_1108;
/// Cause code of the last delivered IRQ.
pub const MMIO_IRQ_NUM: u32 = 0x8000_110c;
/// Translation unit on/off.
pub const MMIO_MMU_ENABLED: u32 = 0x8000_1200;
/// Page directory base address.
pub const MMIO_PD_ADDR: u32 = 0x8000_1204;

impl Machine {
    /// Word load from `reg[ra] + 4*disp`.
    pub fn load(&mut self, ra: usize, disp: i32) -> Result<u32, Exception> {
        let vaddr = self.regs.read(ra).wrapping_add((disp as u32) << 2);
        self.load_word(vaddr)
    }

    /// Word load from a virtual address. Also the path the debugger uses to
    /// inspect memory.
    pub fn load_word(&mut self, vaddr: u32) -> Result<u32, Exception> {
        let addr = self.translate(vaddr)?;
        if addr & 3 != 0 {
            return Err(Exception::MisalignedAccess {
                access: Access::Load,
                addr,
            });
        }
        if addr < self.mem.size() {
            return Ok(self.mem.read_word(addr));
        }
        match addr {
            MMIO_SERIAL_DATA => self.serial.read_byte(),
            MMIO_SERIAL_TX_READY => Ok(1),
            MMIO_INTR_ADDR => Ok(self.intr.handler_addr),
            MMIO_INTR_ENABLED => Ok(self.intr.enabled as u32),
            MMIO_EPC => Ok(self.intr.epc),
            MMIO_IRQ_NUM => Ok(self.intr.irq_num),
            MMIO_MMU_ENABLED => Ok(self.mmu.enabled as u32),
            MMIO_PD_ADDR => Ok(self.mmu.pd_addr),
            _ => Err(Exception::OutOfRange {
                access: Access::Load,
                addr,
                mem_size: self.mem.size(),
            }),
        }
    }

    /// Word store to `reg[ra] + 4*disp`.
    pub fn store(&mut self, ra: usize, disp: i32, value: u32) -> Result<(), Exception> {
        let vaddr = self.regs.read(ra).wrapping_add((disp as u32) << 2);
        let addr = self.translate(vaddr)?;
        if addr & 3 != 0 {
            return Err(Exception::MisalignedAccess {
                access: Access::Store,
                addr,
            });
        }
        if addr < self.mem.size() {
            self.mem.write_word(addr, value);
            return Ok(());
        }
        match addr {
            MMIO_SERIAL_DATA => self.serial.write_byte(value),
            MMIO_INTR_ADDR => self.intr.handler_addr = value,
            MMIO_INTR_ENABLED => self.intr.enabled = value != 0,
            MMIO_EPC => self.intr.epc = value,
            MMIO_IRQ_NUM => self.intr.irq_num = value,
            MMIO_MMU_ENABLED => {
                self.mmu.enabled = value != 0;
                tracing::debug!(enabled = self.mmu.enabled, "mmu toggled");
            }
            MMIO_PD_ADDR => self.mmu.pd_addr = value,
            _ => {
                return Err(Exception::OutOfRange {
                    access: Access::Store,
                    addr,
                    mem_size: self.mem.size(),
                })
            }
        }
        Ok(())
    }

    /// Sign-extending byte load from `reg[ra] + disp`. RAM only.
    pub fn load_byte(&mut self, ra: usize, disp: i32) -> Result<u32, Exception> {
        let vaddr = self.regs.read(ra).wrapping_add(disp as u32);
        let addr = self.translate(vaddr)?;
        if addr >= self.mem.size() {
            return Err(Exception::OutOfRange {
                access: Access::LoadByte,
                addr,
                mem_size: self.mem.size(),
            });
        }
        Ok(self.mem.read_byte(addr) as i8 as i32 as u32)
    }

    /// Byte store to `reg[ra] + disp`. RAM only.
    pub fn store_byte(&mut self, ra: usize, disp: i32, value: u32) -> Result<(), Exception> {
        let vaddr = self.regs.read(ra).wrapping_add(disp as u32);
        let addr = self.translate(vaddr)?;
        if addr >= self.mem.size() {
            return Err(Exception::OutOfRange {
                access: Access::StoreByte,
                addr,
                mem_size: self.mem.size(),
            });
        }
        self.mem.write_byte(addr, value as u8);
        Ok(())
    }
}
