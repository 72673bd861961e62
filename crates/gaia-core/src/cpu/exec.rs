//! Instruction decoder and executor.
//!
//! ```text
//! bits  31..28  27..23  22..18  17..13  12..5   4..0
//!       opcode  rx      ra      rb      lit     tag
//! ```
//!
//! Memory and branch forms reuse bits 15..0 as a sign-extended 16-bit
//! displacement. Branches and jumps pre-subtract 4 from their target
//! because the cycle loop advances the PC by 4 after every instruction.

use crate::alu::{self, AluOp};
use crate::cpu::Machine;
use crate::debug;
use crate::exception::{DecodePhase, Exception};
use crate::fpu::{self, FpuOp, SignMod};

/// Top-level opcode field (bits 31..28).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opcode {
    Alu,
    Fpu,
    Ldl,
    Ldh,
    Jl,
    Jr,
    Ld,
    Ldb,
    St,
    Stb,
    Debug,
    Sysenter,
    Sysexit,
    Bne,
    Beq,
}

impl Opcode {
    fn decode(inst: u32) -> Result<Self, Exception> {
        Ok(match inst >> 28 {
            0 => Opcode::Alu,
            1 => Opcode::Fpu,
            2 => Opcode::Ldl,
            3 => Opcode::Ldh,
            4 => Opcode::Jl,
            5 => Opcode::Jr,
            6 => Opcode::Ld,
            7 => Opcode::Ldb,
            8 => Opcode::St,
            9 => Opcode::Stb,
            10 => Opcode::Debug,
            12 => Opcode::Sysenter,
            13 => Opcode::Sysexit,
            14 => Opcode::Bne,
            15 => Opcode::Beq,
            _ => {
                return Err(Exception::Decode {
                    phase: DecodePhase::Misc,
                })
            }
        })
    }
}

fn field_rx(inst: u32) -> usize {
    ((inst >> 23) & 31) as usize
}

fn field_ra(inst: u32) -> usize {
    ((inst >> 18) & 31) as usize
}

fn field_rb(inst: u32) -> usize {
    ((inst >> 13) & 31) as usize
}

/// 8-bit literal, sign-extended.
fn field_lit(inst: u32) -> u32 {
    ((inst >> 5) & 0xff) as u8 as i8 as i32 as u32
}

/// 16-bit displacement, sign-extended.
fn field_disp(inst: u32) -> i32 {
    (inst & 0xffff) as u16 as i16 as i32
}

pub fn execute(m: &mut Machine, inst: u32) -> Result<(), Exception> {
    let opcode = Opcode::decode(inst)?;
    let rx = field_rx(inst);
    let ra = field_ra(inst);
    match opcode {
        Opcode::Alu => {
            let op = AluOp::from_tag(inst & 31)?;
            let value = alu::evaluate(
                op,
                m.regs.read(ra),
                m.regs.read(field_rb(inst)),
                field_lit(inst),
            );
            m.regs.write(rx, value);
        }
        Opcode::Fpu => {
            let op = FpuOp::from_tag(inst & 31)?;
            let modifier = SignMod::from_bits(inst >> 5);
            let backend = m.config.fpu.backend();
            let result = backend.execute(op, m.regs.read(ra), m.regs.read(field_rb(inst)));
            m.regs
                .write(rx, fpu::normalize_minus_zero(fpu::apply_sign(result, modifier)));
        }
        Opcode::Ldl => {
            m.regs.write(rx, field_disp(inst) as u32);
        }
        Opcode::Ldh => {
            let value = ((inst & 0xffff) << 16) | (m.regs.read(ra) & 0xffff);
            m.regs.write(rx, value);
        }
        Opcode::Jl => {
            m.regs.write(rx, m.pc.wrapping_add(4));
            m.pc = m.pc.wrapping_add((field_disp(inst) << 2) as u32);
        }
        Opcode::Jr => {
            let target = m.regs.read(ra);
            if target & 3 != 0 {
                return Err(Exception::JumpUnaligned { reg: ra });
            }
            if !m.config.boot_test && m.translate(target)? >= m.mem.size() {
                return Err(Exception::JumpOutOfRange { reg: ra });
            }
            m.regs.write(rx, m.pc.wrapping_add(4));
            m.pc = target.wrapping_sub(4);
        }
        Opcode::Ld => {
            let value = m.load(ra, field_disp(inst))?;
            m.regs.write(rx, value);
        }
        Opcode::Ldb => {
            let value = m.load_byte(ra, field_disp(inst))?;
            m.regs.write(rx, value);
        }
        Opcode::St => {
            m.store(ra, field_disp(inst), m.regs.read(rx))?;
        }
        Opcode::Stb => {
            m.store_byte(ra, field_disp(inst), m.regs.read(rx))?;
        }
        Opcode::Debug => {
            debug::execute_op(m, rx, inst & 0xffff)?;
        }
        Opcode::Sysenter => m.sysenter(),
        Opcode::Sysexit => m.sysexit(),
        Opcode::Bne => {
            if m.regs.read(rx) != m.regs.read(ra) {
                m.pc = m.pc.wrapping_add((field_disp(inst) << 2) as u32);
            }
        }
        Opcode::Beq => {
            if m.regs.read(rx) == m.regs.read(ra) {
                m.pc = m.pc.wrapping_add((field_disp(inst) << 2) as u32);
            }
        }
    }
    Ok(())
}
