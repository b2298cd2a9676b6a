//! Arbitrary-precision decimals
//!
//! A `BigDec` is an unscaled arbitrary-precision integer paired with a
//! non-negative decimal scale, denoting `unscaled * 10^(-scale)`.
//! Addition and subtraction align both operands to the larger scale;
//! multiplication adds scales. Division is not defined here: the value
//! layer drops decimal division to float to avoid non-terminating
//! expansions.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;

/// Decimal scale used when a ratio with a non-terminating decimal
/// expansion must be rendered as a `BigDec`.
pub const RATIO_FALLBACK_SCALE: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigDec {
    unscaled: BigInt,
    scale: u32,
}

fn pow10(exp: u32) -> BigInt {
    BigInt::from(10u8).pow(exp)
}

impl BigDec {
    /// Build a decimal from an unscaled integer and a scale.
    ///
    /// A negative scale is folded into the unscaled value so the stored
    /// scale is always non-negative.
    pub fn new(unscaled: BigInt, scale: i64) -> BigDec {
        if scale < 0 {
            BigDec {
                unscaled: unscaled * pow10((-scale) as u32),
                scale: 0,
            }
        } else {
            BigDec {
                unscaled,
                scale: scale as u32,
            }
        }
    }

    pub fn from_i64(n: i64) -> BigDec {
        BigDec::new(BigInt::from(n), 0)
    }

    pub fn from_bigint(n: &BigInt) -> BigDec {
        BigDec::new(n.clone(), 0)
    }

    pub fn unscaled(&self) -> &BigInt {
        &self.unscaled
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.unscaled.is_zero()
    }

    /// True when the decimal denotes a mathematical integer.
    pub fn is_integer(&self) -> bool {
        self.scale == 0 || (&self.unscaled % pow10(self.scale)).is_zero()
    }

    /// The integer value, when `is_integer()`.
    pub fn to_bigint(&self) -> Option<BigInt> {
        if self.scale == 0 {
            Some(self.unscaled.clone())
        } else {
            let (q, r) = self.unscaled.div_rem(&pow10(self.scale));
            if r.is_zero() { Some(q) } else { None }
        }
    }

    /// Exact rational view: `unscaled / 10^scale`, reduced.
    pub fn to_rational(&self) -> BigRational {
        BigRational::new(self.unscaled.clone(), pow10(self.scale))
    }

    pub fn to_f64(&self) -> f64 {
        self.to_rational().to_f64().unwrap_or(f64::NAN)
    }

    /// Align two decimals to a common (maximum) scale.
    fn align(&self, other: &BigDec) -> (BigInt, BigInt, u32) {
        let scale = self.scale.max(other.scale);
        let a = &self.unscaled * pow10(scale - self.scale);
        let b = &other.unscaled * pow10(scale - other.scale);
        (a, b, scale)
    }

    pub fn add(&self, other: &BigDec) -> BigDec {
        let (a, b, scale) = self.align(other);
        BigDec {
            unscaled: a + b,
            scale,
        }
    }

    pub fn sub(&self, other: &BigDec) -> BigDec {
        let (a, b, scale) = self.align(other);
        BigDec {
            unscaled: a - b,
            scale,
        }
    }

    pub fn mul(&self, other: &BigDec) -> BigDec {
        BigDec {
            unscaled: &self.unscaled * &other.unscaled,
            scale: self.scale + other.scale,
        }
    }

    pub fn neg(&self) -> BigDec {
        BigDec {
            unscaled: -&self.unscaled,
            scale: self.scale,
        }
    }

    pub fn cmp_value(&self, other: &BigDec) -> Ordering {
        let (a, b, _) = self.align(other);
        a.cmp(&b)
    }

    /// Render a reduced rational as a decimal.
    ///
    /// When the denominator divides a power of ten the conversion is
    /// exact; otherwise the quotient is truncated at
    /// [`RATIO_FALLBACK_SCALE`] digits.
    pub fn from_ratio(r: &BigRational) -> BigDec {
        let den = r.denom();
        if den.is_one() {
            return BigDec::new(r.numer().clone(), 0);
        }
        // Count the factors of 2 and 5; anything left means the decimal
        // expansion does not terminate.
        let mut rest = den.abs();
        let mut twos = 0u32;
        let mut fives = 0u32;
        let two = BigInt::from(2u8);
        let five = BigInt::from(5u8);
        while (&rest % &two).is_zero() {
            rest /= &two;
            twos += 1;
        }
        while (&rest % &five).is_zero() {
            rest /= &five;
            fives += 1;
        }
        let scale = if rest.is_one() {
            twos.max(fives)
        } else {
            RATIO_FALLBACK_SCALE
        };
        let unscaled = (r.numer() * pow10(scale)) / den;
        BigDec { unscaled, scale }
    }
}

impl fmt::Display for BigDec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.unscaled);
        }
        let sign = if self.unscaled.is_negative() { "-" } else { "" };
        let digits = self.unscaled.abs().to_string();
        let scale = self.scale as usize;
        if digits.len() > scale {
            let split = digits.len() - scale;
            write!(f, "{}{}.{}", sign, &digits[..split], &digits[split..])
        } else {
            write!(f, "{}0.{}{}", sign, "0".repeat(scale - digits.len()), digits)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(unscaled: i64, scale: i64) -> BigDec {
        BigDec::new(BigInt::from(unscaled), scale)
    }

    #[test]
    fn test_add_aligns_to_max_scale() {
        // 1.5 + 0.25 = 1.75
        let sum = dec(15, 1).add(&dec(25, 2));
        assert_eq!(sum, dec(175, 2));
        assert_eq!(sum.scale(), 2);
    }

    #[test]
    fn test_mul_adds_scales() {
        // 1.5 * 0.25 = 0.375
        let prod = dec(15, 1).mul(&dec(25, 2));
        assert_eq!(prod, dec(375, 3));
        assert_eq!(prod.scale(), 3);
    }

    #[test]
    fn test_negative_scale_folds_into_unscaled() {
        // 12 * 10^2 = 1200
        let d = dec(12, -2);
        assert_eq!(d.scale(), 0);
        assert_eq!(d.unscaled(), &BigInt::from(1200));
    }

    #[test]
    fn test_display_pads_fractional_zeros() {
        assert_eq!(dec(5, 3).to_string(), "0.005");
        assert_eq!(dec(-175, 2).to_string(), "-1.75");
        assert_eq!(dec(42, 0).to_string(), "42");
    }

    #[test]
    fn test_cmp_ignores_trailing_zeros() {
        // 1.0 == 1.00
        assert_eq!(dec(10, 1).cmp_value(&dec(100, 2)), Ordering::Equal);
        assert_eq!(dec(10, 1).cmp_value(&dec(101, 2)), Ordering::Less);
    }

    #[test]
    fn test_integer_detection() {
        assert!(dec(500, 2).is_integer());
        assert_eq!(dec(500, 2).to_bigint(), Some(BigInt::from(5)));
        assert!(!dec(501, 2).is_integer());
    }

    #[test]
    fn test_from_ratio_terminating() {
        // 1/8 = 0.125 exactly
        let r = BigRational::new(BigInt::from(1), BigInt::from(8));
        let d = BigDec::from_ratio(&r);
        assert_eq!(d.to_string(), "0.125");
    }

    #[test]
    fn test_from_ratio_non_terminating_truncates() {
        let r = BigRational::new(BigInt::from(1), BigInt::from(3));
        let d = BigDec::from_ratio(&r);
        assert_eq!(d.scale(), RATIO_FALLBACK_SCALE);
        assert!(d.to_string().starts_with("0.3333333333"));
    }
}
