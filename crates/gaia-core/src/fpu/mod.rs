//! Floating-point unit.
//!
//! Registers hold IEEE-754 single-precision bit patterns. Two
//! interchangeable backends are provided: [`NativeFpu`], which computes with
//! the host's `f32` arithmetic, and [`maswag::MaswagFpu`], a bit-level
//! software model of the MasWag FPU board. After any operation the executor
//! applies the sign modifier from instruction bits 6..5 and normalizes a
//! negative-zero bit pattern to plain zero.

pub mod maswag;

use crate::exception::{DecodePhase, Exception};

/// FPU operation, decoded from the 5-bit tag field. Tag 3 (`fdiv`) is not
/// part of the executable encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpuOp {
    Fadd,
    Fsub,
    Fmul,
    Finv,
    Fsqrt,
    Ftoi,
    Itof,
    Floor,
}

impl FpuOp {
    pub fn from_tag(tag: u32) -> Result<Self, Exception> {
        Ok(match tag {
            0 => FpuOp::Fadd,
            1 => FpuOp::Fsub,
            2 => FpuOp::Fmul,
            4 => FpuOp::Finv,
            5 => FpuOp::Fsqrt,
            6 => FpuOp::Ftoi,
            7 => FpuOp::Itof,
            8 => FpuOp::Floor,
            _ => {
                return Err(Exception::Decode {
                    phase: DecodePhase::Fpu,
                })
            }
        })
    }
}

/// Sign modifier from instruction bits 6..5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignMod {
    None,
    Neg,
    Abs,
    AbsNeg,
}

impl SignMod {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            1 => SignMod::Neg,
            2 => SignMod::Abs,
            3 => SignMod::AbsNeg,
            _ => SignMod::None,
        }
    }
}

pub fn apply_sign(x: u32, modifier: SignMod) -> u32 {
    match modifier {
        SignMod::None => x,
        SignMod::Neg => x ^ 0x8000_0000,
        SignMod::Abs => x & 0x7fff_ffff,
        SignMod::AbsNeg => x | 0x8000_0000,
    }
}

/// The register file never holds a negative zero.
pub fn normalize_minus_zero(x: u32) -> u32 {
    if x == 0x8000_0000 {
        0
    } else {
        x
    }
}

/// A floating-point implementation. All values are single-precision bit
/// patterns; `ftoi` returns a two's-complement integer in the same 32 bits.
pub trait FpuBackend {
    fn fadd(&self, a: u32, b: u32) -> u32;
    fn fsub(&self, a: u32, b: u32) -> u32;
    fn fmul(&self, a: u32, b: u32) -> u32;
    fn finv(&self, a: u32) -> u32;
    fn fsqrt(&self, a: u32) -> u32;
    fn ftoi(&self, a: u32) -> u32;
    fn itof(&self, a: u32) -> u32;
    fn floor(&self, a: u32) -> u32;

    fn execute(&self, op: FpuOp, a: u32, b: u32) -> u32 {
        match op {
            FpuOp::Fadd => self.fadd(a, b),
            FpuOp::Fsub => self.fsub(a, b),
            FpuOp::Fmul => self.fmul(a, b),
            FpuOp::Finv => self.finv(a),
            FpuOp::Fsqrt => self.fsqrt(a),
            FpuOp::Ftoi => self.ftoi(a),
            FpuOp::Itof => self.itof(a),
            FpuOp::Floor => self.floor(a),
        }
    }
}

/// Backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FpuKind {
    #[default]
    Native,
    Maswag,
}

impl FpuKind {
    pub fn backend(self) -> &'static dyn FpuBackend {
        match self {
            FpuKind::Native => &NativeFpu,
            FpuKind::Maswag => &maswag::MaswagFpu,
        }
    }
}

/// Host-float backend.
pub struct NativeFpu;

impl FpuBackend for NativeFpu {
    fn fadd(&self, a: u32, b: u32) -> u32 {
        (f32::from_bits(a) + f32::from_bits(b)).to_bits()
    }

    fn fsub(&self, a: u32, b: u32) -> u32 {
        (f32::from_bits(a) - f32::from_bits(b)).to_bits()
    }

    fn fmul(&self, a: u32, b: u32) -> u32 {
        (f32::from_bits(a) * f32::from_bits(b)).to_bits()
    }

    fn finv(&self, a: u32) -> u32 {
        // Computed in double precision, then narrowed
        ((1.0f64 / f32::from_bits(a) as f64) as f32).to_bits()
    }

    fn fsqrt(&self, a: u32) -> u32 {
        f32::from_bits(a).sqrt().to_bits()
    }

    fn ftoi(&self, a: u32) -> u32 {
        f32::from_bits(a).round_ties_even() as i32 as u32
    }

    fn itof(&self, a: u32) -> u32 {
        (a as i32 as f32).to_bits()
    }

    fn floor(&self, a: u32) -> u32 {
        f32::from_bits(a).floor().to_bits()
    }
}
