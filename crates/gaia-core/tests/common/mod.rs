//! Instruction encoders and machine builders shared by the integration
//! tests.
#![allow(dead_code)]

use gaia_core::cpu::Config;
use gaia_core::emu::Emu;

pub const HALT: u32 = 0xffff_ffff;

/// ALU: opcode 0, literal folded into rb.
pub fn alu(tag: u32, rx: u32, ra: u32, rb: u32, lit: i32) -> u32 {
    (rx << 23) | (ra << 18) | (rb << 13) | (((lit as u32) & 0xff) << 5) | tag
}

/// FPU: opcode 1, sign modifier in bits 6..5.
pub fn fpu(tag: u32, rx: u32, ra: u32, rb: u32, sig: u32) -> u32 {
    (1 << 28) | (rx << 23) | (ra << 18) | (rb << 13) | ((sig & 3) << 5) | tag
}

pub fn ldl(rx: u32, imm: i32) -> u32 {
    (2 << 28) | (rx << 23) | ((imm as u32) & 0xffff)
}

pub fn ldh(rx: u32, ra: u32, imm: u32) -> u32 {
    (3 << 28) | (rx << 23) | (ra << 18) | (imm & 0xffff)
}

pub fn jl(rx: u32, disp_words: i32) -> u32 {
    (4 << 28) | (rx << 23) | ((disp_words as u32) & 0xffff)
}

pub fn jr(rx: u32, ra: u32) -> u32 {
    (5 << 28) | (rx << 23) | (ra << 18)
}

pub fn ld(rx: u32, ra: u32, disp_words: i32) -> u32 {
    (6 << 28) | (rx << 23) | (ra << 18) | ((disp_words as u32) & 0xffff)
}

pub fn ldb(rx: u32, ra: u32, disp_bytes: i32) -> u32 {
    (7 << 28) | (rx << 23) | (ra << 18) | ((disp_bytes as u32) & 0xffff)
}

pub fn st(rx: u32, ra: u32, disp_words: i32) -> u32 {
    (8 << 28) | (rx << 23) | (ra << 18) | ((disp_words as u32) & 0xffff)
}

pub fn stb(rx: u32, ra: u32, disp_bytes: i32) -> u32 {
    (9 << 28) | (rx << 23) | (ra << 18) | ((disp_bytes as u32) & 0xffff)
}

pub fn debug_op(op: u32, id: u32) -> u32 {
    (10 << 28) | (op << 23) | (id & 0xffff)
}

pub fn sysenter() -> u32 {
    12 << 28
}

pub fn sysexit() -> u32 {
    13 << 28
}

pub fn bne(rx: u32, ra: u32, disp_words: i32) -> u32 {
    (14 << 28) | (rx << 23) | (ra << 18) | ((disp_words as u32) & 0xffff)
}

pub fn beq(rx: u32, ra: u32, disp_words: i32) -> u32 {
    (15 << 28) | (rx << 23) | (ra << 18) | ((disp_words as u32) & 0xffff)
}

/// Fresh emulator with the given program at the default entry point.
pub fn emu_with_program(config: Config, words: &[u32]) -> Emu {
    let mut emu = Emu::new(config);
    emu.load_program(words);
    emu
}

/// Run a program under the default configuration and return the machine
/// for inspection.
pub fn run_program(words: &[u32]) -> Emu {
    let mut emu = emu_with_program(Config::default(), words);
    emu.run().expect("program faulted");
    emu
}

/// Write raw words somewhere outside the main program, e.g. a trap handler.
pub fn write_words(emu: &mut Emu, addr: u32, words: &[u32]) {
    for (i, &word) in words.iter().enumerate() {
        emu.machine.mem.write_word(addr + 4 * i as u32, word);
    }
}
