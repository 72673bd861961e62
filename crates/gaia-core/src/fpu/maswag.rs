//! Bit-level software model of the MasWag FPU board.
//!
//! Operations work directly on single-precision bit patterns with
//! round-to-nearest-even. Denormal inputs and results are flushed to zero,
//! as on the hardware.

use super::FpuBackend;

const SIGN_BIT: u32 = 0x8000_0000;
const FRAC_MASK: u32 = 0x007f_ffff;
const HIDDEN: u32 = 0x0080_0000;
const INF: u32 = 0x7f80_0000;
const QNAN: u32 = 0x7fc0_0000;

fn sign(x: u32) -> u32 {
    x >> 31
}

fn exp(x: u32) -> i32 {
    ((x >> 23) & 0xff) as i32
}

fn frac(x: u32) -> u32 {
    x & FRAC_MASK
}

fn is_nan(x: u32) -> bool {
    exp(x) == 255 && frac(x) != 0
}

fn is_inf(x: u32) -> bool {
    exp(x) == 255 && frac(x) == 0
}

/// Denormals count as (signed) zero.
fn is_zero(x: u32) -> bool {
    exp(x) == 0
}

/// 24-bit significand with the hidden bit set.
fn mantissa(x: u32) -> u32 {
    HIDDEN | frac(x)
}

/// Assemble sign, biased exponent and 24-bit mantissa into a bit pattern,
/// flushing underflow to zero and overflow to infinity.
fn pack(sign: u32, exp: i32, mant: u32) -> u32 {
    if exp <= 0 {
        return sign << 31;
    }
    if exp >= 255 {
        return (sign << 31) | INF;
    }
    (sign << 31) | ((exp as u32) << 23) | (mant & FRAC_MASK)
}

/// Round a 27-bit value (24-bit mantissa plus guard/round/sticky) to
/// nearest even. Returns the mantissa and the possibly bumped exponent.
fn round_grs(m: u32, e: i32) -> (u32, i32) {
    let mut mant = m >> 3;
    let grs = m & 7;
    if grs > 4 || (grs == 4 && mant & 1 == 1) {
        mant += 1;
    }
    if mant >= 1 << 24 {
        (mant >> 1, e + 1)
    } else {
        (mant, e)
    }
}

fn isqrt(v: u64) -> u64 {
    if v == 0 {
        return 0;
    }
    let mut x = v;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + v / x) / 2;
    }
    x
}

pub struct MaswagFpu;

impl MaswagFpu {
    /// Division is not in the executable encoding; the board composes it
    /// from a reciprocal and a multiply.
    pub fn fdiv(&self, a: u32, b: u32) -> u32 {
        self.fmul(a, self.finv(b))
    }
}

impl FpuBackend for MaswagFpu {
    fn fadd(&self, a: u32, b: u32) -> u32 {
        if is_nan(a) || is_nan(b) {
            return QNAN;
        }
        if is_inf(a) {
            if is_inf(b) && sign(a) != sign(b) {
                return QNAN;
            }
            return a;
        }
        if is_inf(b) {
            return b;
        }
        if is_zero(a) && is_zero(b) {
            // -0 + -0 is the only sum that keeps the sign bit
            return if sign(a) == 1 && sign(b) == 1 {
                SIGN_BIT
            } else {
                0
            };
        }
        if is_zero(a) {
            return b;
        }
        if is_zero(b) {
            return a;
        }

        // Order by magnitude so the subtraction below cannot underflow.
        let (sx, ex, mx, ey, my) = if (a & !SIGN_BIT) >= (b & !SIGN_BIT) {
            (sign(a), exp(a), mantissa(a) << 3, exp(b), mantissa(b) << 3)
        } else {
            (sign(b), exp(b), mantissa(b) << 3, exp(a), mantissa(a) << 3)
        };
        let same_sign = sign(a) == sign(b);

        let diff = (ex - ey) as u32;
        let my = if diff >= 27 {
            1
        } else {
            let sticky = (my & ((1 << diff) - 1) != 0) as u32;
            (my >> diff) | sticky
        };

        let mut e = ex;
        let mut acc = if same_sign { mx + my } else { mx - my };
        if acc == 0 {
            return 0;
        }
        while acc < 1 << 26 {
            acc <<= 1;
            e -= 1;
        }
        if acc >= 1 << 27 {
            let sticky = acc & 1;
            acc = (acc >> 1) | sticky;
            e += 1;
        }
        let (mant, e) = round_grs(acc, e);
        pack(sx, e, mant)
    }

    fn fsub(&self, a: u32, b: u32) -> u32 {
        self.fadd(a, b ^ SIGN_BIT)
    }

    fn fmul(&self, a: u32, b: u32) -> u32 {
        let s = sign(a) ^ sign(b);
        if is_nan(a) || is_nan(b) {
            return QNAN;
        }
        if is_inf(a) || is_inf(b) {
            if is_zero(a) || is_zero(b) {
                return QNAN;
            }
            return (s << 31) | INF;
        }
        if is_zero(a) || is_zero(b) {
            return s << 31;
        }

        let mut e = exp(a) + exp(b) - 127;
        let mut prod = mantissa(a) as u64 * mantissa(b) as u64; // 2^46..2^48
        if prod & (1 << 47) != 0 {
            e += 1;
        } else {
            prod <<= 1;
        }
        let sticky = (prod & ((1 << 21) - 1) != 0) as u32;
        let m27 = ((prod >> 21) as u32) | sticky;
        let (mant, e) = round_grs(m27, e);
        pack(s, e, mant)
    }

    fn finv(&self, a: u32) -> u32 {
        if is_nan(a) {
            return QNAN;
        }
        if is_inf(a) {
            return sign(a) << 31;
        }
        if is_zero(a) {
            return (sign(a) << 31) | INF;
        }
        let s = sign(a);
        let e = exp(a);
        let m = mantissa(a) as u64;
        if m == HIDDEN as u64 {
            // Exact power of two
            return pack(s, 254 - e, HIDDEN);
        }
        // 2^47 / m is in (2^23, 2^24); round the quotient to nearest even.
        let q = (1u64 << 47) / m;
        let r = (1u64 << 47) % m;
        let mut mant = q as u32;
        if 2 * r > m || (2 * r == m && mant & 1 == 1) {
            mant += 1;
        }
        let mut e2 = 253 - e;
        if mant >= 1 << 24 {
            mant >>= 1;
            e2 += 1;
        }
        pack(s, e2, mant)
    }

    fn fsqrt(&self, a: u32) -> u32 {
        if is_nan(a) {
            return QNAN;
        }
        if is_zero(a) {
            return sign(a) << 31;
        }
        if sign(a) == 1 {
            return QNAN;
        }
        if is_inf(a) {
            return a;
        }
        let mut e = exp(a) - 127;
        let mut m = mantissa(a) as u64;
        if e & 1 != 0 {
            m <<= 1;
            e -= 1;
        }
        // significand in [1, 4); sqrt(m * 2^23) is a 24-bit mantissa
        let v = m << 23;
        let t = isqrt(v);
        let t = if v - t * t > t { t + 1 } else { t };
        let mut mant = t as u32;
        let mut e2 = e / 2 + 127;
        if mant >= 1 << 24 {
            mant >>= 1;
            e2 += 1;
        }
        pack(0, e2, mant)
    }

    fn ftoi(&self, a: u32) -> u32 {
        if is_nan(a) {
            return 0;
        }
        let s = sign(a);
        if is_inf(a) {
            return if s == 1 { i32::MIN as u32 } else { i32::MAX as u32 };
        }
        if is_zero(a) {
            return 0;
        }
        let e = exp(a) - 127;
        let m = mantissa(a) as u64;
        let v = if e >= 23 {
            if e >= 31 {
                // Only -2^31 itself fits
                if s == 1 && e == 31 && m == HIDDEN as u64 {
                    return i32::MIN as u32;
                }
                return if s == 1 { i32::MIN as u32 } else { i32::MAX as u32 };
            }
            m << (e - 23)
        } else {
            let sh = 23 - e;
            if sh >= 26 {
                return 0;
            }
            let int = m >> sh;
            let rem = m & ((1u64 << sh) - 1);
            let half = 1u64 << (sh - 1);
            int + (rem > half || (rem == half && int & 1 == 1)) as u64
        };
        if s == 0 && v > i32::MAX as u64 {
            return i32::MAX as u32;
        }
        if s == 1 && v > 1 << 31 {
            return i32::MIN as u32;
        }
        let n = v as i64;
        (if s == 1 { -n } else { n }) as i32 as u32
    }

    fn itof(&self, a: u32) -> u32 {
        let n = a as i32;
        if n == 0 {
            return 0;
        }
        let s = (n < 0) as u32;
        let mag = n.unsigned_abs();
        let bits = 32 - mag.leading_zeros() as i32;
        let e = 127 + bits - 1;
        if bits <= 24 {
            return pack(s, e, mag << (24 - bits));
        }
        let sh = bits - 24;
        let int = mag >> sh;
        let rem = mag & ((1 << sh) - 1);
        let half = 1u32 << (sh - 1);
        let rounded = int + (rem > half || (rem == half && int & 1 == 1)) as u32;
        if rounded >= 1 << 24 {
            pack(s, e + 1, rounded >> 1)
        } else {
            pack(s, e, rounded)
        }
    }

    fn floor(&self, a: u32) -> u32 {
        if is_nan(a) {
            return QNAN;
        }
        if is_inf(a) {
            return a;
        }
        let s = sign(a);
        let e = exp(a) - 127;
        if e >= 23 {
            return a;
        }
        if is_zero(a) {
            return s << 31;
        }
        if e < 0 {
            // Magnitude below one rounds to 0 or -1
            return if s == 1 { (-1.0f32).to_bits() } else { 0 };
        }
        let sh = (23 - e) as u32;
        let m = mantissa(a);
        let dropped = m & ((1 << sh) - 1);
        if dropped == 0 {
            return a;
        }
        if s == 0 {
            return a & !((1 << sh) - 1);
        }
        // Negative values round away from zero; the integer magnitude is at
        // most 2^23, so the conversion back is exact.
        let int = (m >> sh) + 1;
        self.itof((-(int as i64)) as i32 as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fpu::NativeFpu;

    fn b(x: f32) -> u32 {
        x.to_bits()
    }

    #[test]
    fn exact_sums() {
        let fpu = MaswagFpu;
        assert_eq!(fpu.fadd(b(1.5), b(2.25)), b(3.75));
        assert_eq!(fpu.fadd(b(-1.5), b(1.5)), 0);
        assert_eq!(fpu.fsub(b(10.0), b(3.5)), b(6.5));
        assert_eq!(fpu.fadd(b(0.0), b(-4.25)), b(-4.25));
        assert_eq!(fpu.fsub(b(1.0), b(0.0)), b(1.0));
    }

    #[test]
    fn exact_products() {
        let fpu = MaswagFpu;
        assert_eq!(fpu.fmul(b(2.0), b(3.0)), b(6.0));
        assert_eq!(fpu.fmul(b(-0.5), b(0.25)), b(-0.125));
        assert_eq!(fpu.fmul(b(1.5), b(1.5)), b(2.25));
        assert_eq!(fpu.fmul(b(8.0), b(0.0)), 0);
    }

    #[test]
    fn reciprocal_of_powers_of_two() {
        let fpu = MaswagFpu;
        assert_eq!(fpu.finv(b(1.0)), b(1.0));
        assert_eq!(fpu.finv(b(2.0)), b(0.5));
        assert_eq!(fpu.finv(b(-4.0)), b(-0.25));
        assert_eq!(fpu.finv(b(0.5)), b(2.0));
    }

    #[test]
    fn reciprocal_matches_correctly_rounded_division() {
        let fpu = MaswagFpu;
        for x in [3.0f32, 1.25, 7.0, 100.0] {
            let expect = ((1.0f64 / x as f64) as f32).to_bits();
            assert_eq!(fpu.finv(b(x)), expect, "finv({x})");
        }
    }

    #[test]
    fn square_roots() {
        let fpu = MaswagFpu;
        let native = NativeFpu;
        assert_eq!(fpu.fsqrt(b(4.0)), b(2.0));
        assert_eq!(fpu.fsqrt(b(0.25)), b(0.5));
        for x in [2.0f32, 3.0, 10.0, 0.5, 12345.0] {
            assert_eq!(fpu.fsqrt(b(x)), native.fsqrt(b(x)), "fsqrt({x})");
        }
    }

    #[test]
    fn conversions() {
        let fpu = MaswagFpu;
        assert_eq!(fpu.itof(7), b(7.0));
        assert_eq!(fpu.itof((-3i32) as u32), b(-3.0));
        assert_eq!(fpu.itof(1 << 24 | 1), b((1 << 24) as f32));
        assert_eq!(fpu.ftoi(b(2.5)), 2);
        assert_eq!(fpu.ftoi(b(3.5)), 4);
        assert_eq!(fpu.ftoi(b(-2.5)), (-2i32) as u32);
        assert_eq!(fpu.ftoi(b(0.4)), 0);
    }

    #[test]
    fn floor_matches_native() {
        let fpu = MaswagFpu;
        let native = NativeFpu;
        for x in [1.5f32, -1.5, 0.25, -0.25, 3.0, -3.0, 123.75, -123.75] {
            assert_eq!(fpu.floor(b(x)), native.floor(b(x)), "floor({x})");
        }
    }

    #[test]
    fn division_composes_reciprocal_and_multiply() {
        let fpu = MaswagFpu;
        assert_eq!(fpu.fdiv(b(6.0), b(2.0)), b(3.0));
        assert_eq!(fpu.fdiv(b(1.0), b(4.0)), b(0.25));
    }
}
