//! Integer ALU.

use crate::exception::{DecodePhase, Exception};

/// ALU operation, decoded from the 5-bit tag field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    Shl,
    Shr,
    Sar,
    And,
    Or,
    Xor,
    Lea,
    CmpUlt,
    CmpUle,
    CmpNe,
    CmpEq,
    CmpLt,
    CmpLe,
    FcmpLt,
    FcmpLe,
}

impl AluOp {
    pub fn from_tag(tag: u32) -> Result<Self, Exception> {
        Ok(match tag {
            0 => AluOp::Add,
            1 => AluOp::Sub,
            2 => AluOp::Shl,
            3 => AluOp::Shr,
            4 => AluOp::Sar,
            5 => AluOp::And,
            6 => AluOp::Or,
            7 => AluOp::Xor,
            8 => AluOp::Lea,
            22 => AluOp::CmpUlt,
            23 => AluOp::CmpUle,
            24 => AluOp::CmpNe,
            25 => AluOp::CmpEq,
            26 => AluOp::CmpLt,
            27 => AluOp::CmpLe,
            30 => AluOp::FcmpLt,
            31 => AluOp::FcmpLe,
            _ => {
                return Err(Exception::Decode {
                    phase: DecodePhase::Alu,
                })
            }
        })
    }
}

/// Evaluate an ALU operation. Most operations combine `ra` with
/// `t = rb + lit`; the float comparisons compare the raw bit patterns of
/// `ra` and `rb` and ignore the literal. Comparison results are 0 or 1.
pub fn evaluate(op: AluOp, ra: u32, rb: u32, lit: u32) -> u32 {
    let t = rb.wrapping_add(lit);
    match op {
        AluOp::Add => ra.wrapping_add(t),
        AluOp::Sub => ra.wrapping_sub(t),
        AluOp::Shl => ra.wrapping_shl(t),
        AluOp::Shr => ra.wrapping_shr(t),
        AluOp::Sar => (ra as i32).wrapping_shr(t) as u32,
        AluOp::And => ra & t,
        AluOp::Or => ra | t,
        AluOp::Xor => ra ^ t,
        AluOp::Lea => ra.wrapping_add(t.wrapping_mul(4)),
        AluOp::CmpUlt => (ra < t) as u32,
        AluOp::CmpUle => (ra <= t) as u32,
        AluOp::CmpNe => (ra != t) as u32,
        AluOp::CmpEq => (ra == t) as u32,
        AluOp::CmpLt => ((ra as i32) < (t as i32)) as u32,
        AluOp::CmpLe => ((ra as i32) <= (t as i32)) as u32,
        AluOp::FcmpLt => (f32::from_bits(ra) < f32::from_bits(rb)) as u32,
        AluOp::FcmpLe => (f32::from_bits(ra) <= f32::from_bits(rb)) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_folds_into_rb() {
        assert_eq!(evaluate(AluOp::Add, 5, 7, 0), 12);
        assert_eq!(evaluate(AluOp::Add, 5, 7, (-3i32) as u32), 9);
        assert_eq!(evaluate(AluOp::Sub, 5, 7, 0), (-2i32) as u32);
    }

    #[test]
    fn lea_scales_by_four() {
        assert_eq!(evaluate(AluOp::Lea, 0x100, 3, 1), 0x110);
    }

    #[test]
    fn signed_and_unsigned_compares_differ() {
        let minus_one = (-1i32) as u32;
        assert_eq!(evaluate(AluOp::CmpLt, minus_one, 0, 1), 1);
        assert_eq!(evaluate(AluOp::CmpUlt, minus_one, 0, 1), 0);
        assert_eq!(evaluate(AluOp::CmpEq, 4, 3, 1), 1);
    }

    #[test]
    fn float_compares_use_registers_not_literal() {
        let one = 1.0f32.to_bits();
        let two = 2.0f32.to_bits();
        assert_eq!(evaluate(AluOp::FcmpLt, one, two, 99), 1);
        assert_eq!(evaluate(AluOp::FcmpLe, two, two, 99), 1);
        assert_eq!(evaluate(AluOp::FcmpLt, two, one, 0), 0);
    }

    #[test]
    fn shift_right_variants() {
        let x = 0x8000_0000u32;
        assert_eq!(evaluate(AluOp::Shr, x, 0, 4), 0x0800_0000);
        assert_eq!(evaluate(AluOp::Sar, x, 0, 4), 0xf800_0000);
    }
}
