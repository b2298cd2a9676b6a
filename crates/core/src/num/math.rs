//! Auxiliary math functions
//!
//! The `math` namespace: each function coerces its numeric argument to
//! float and returns a float, except the long-returning contracts
//! (`round`, `floor-div`, `floor-mod`, the exact-arithmetic family,
//! `get-exponent`). The exact family raises on overflow of the fixed
//! integer range; the IEEE helpers follow the Java Math definitions.

use super::{as_num, to_f64, to_i64, Num};
use crate::error::Error;
use crate::value::Value;
use num_traits::Signed;

const INTEGER_OVERFLOW: &str = "integer overflow";
const DIVIDE_BY_ZERO: &str = "Divide by zero";

macro_rules! float_unary {
    ($($name:ident => $method:ident),+ $(,)?) => {
        $(
            pub fn $name(v: &Value) -> Result<Value, Error> {
                Ok(Value::Float(to_f64(v, 0)?.$method()))
            }
        )+
    };
}

float_unary! {
    sin => sin,
    cos => cos,
    tan => tan,
    asin => asin,
    acos => acos,
    atan => atan,
    sinh => sinh,
    cosh => cosh,
    tanh => tanh,
    exp => exp,
    expm1 => exp_m1,
    log => ln,
    log10 => log10,
    log1p => ln_1p,
    sqrt => sqrt,
    cbrt => cbrt,
    floor => floor,
    ceil => ceil,
    to_degrees => to_degrees,
    to_radians => to_radians,
}

pub fn pow(a: &Value, b: &Value) -> Result<Value, Error> {
    Ok(Value::Float(to_f64(a, 0)?.powf(to_f64(b, 1)?)))
}

pub fn atan2(a: &Value, b: &Value) -> Result<Value, Error> {
    Ok(Value::Float(to_f64(a, 0)?.atan2(to_f64(b, 1)?)))
}

pub fn hypot(a: &Value, b: &Value) -> Result<Value, Error> {
    Ok(Value::Float(to_f64(a, 0)?.hypot(to_f64(b, 1)?)))
}

/// Round half-to-even to the nearest integral float (Java `rint`).
pub fn rint(v: &Value) -> Result<Value, Error> {
    Ok(Value::Float(round_ties_even(to_f64(v, 0)?)))
}

fn round_ties_even(f: f64) -> f64 {
    let r = f.round();
    if (r - f).abs() == 0.5 && r % 2.0 != 0.0 {
        r - (r - f).signum()
    } else {
        r
    }
}

/// Round half-up to a long (Java `Math.round`): NaN maps to 0 and
/// out-of-range values clamp.
pub fn round(v: &Value) -> Result<Value, Error> {
    let f = to_f64(v, 0)?;
    if f.is_nan() {
        return Ok(Value::Int(0));
    }
    let r = (f + 0.5).floor();
    Ok(Value::Int(if r >= i64::MAX as f64 {
        i64::MAX
    } else if r <= i64::MIN as f64 {
        i64::MIN
    } else {
        r as i64
    }))
}

/// Sign as a float in {-1.0, 0.0, 1.0}.
pub fn signum(v: &Value) -> Result<Value, Error> {
    let f = to_f64(v, 0)?;
    Ok(Value::Float(if f == 0.0 || f.is_nan() {
        f
    } else {
        f.signum()
    }))
}

/// `abs` keeps the numeric category of its argument.
pub fn abs(v: &Value) -> Result<Value, Error> {
    match as_num(v, 0)? {
        Num::Int(i) => Ok(Value::Int(i.wrapping_abs())),
        Num::Float(f) => Ok(Value::Float(f.abs())),
        Num::Big(b) => Ok(Value::big_int(b.abs())),
        Num::Ratio(r) => Ok(Value::Ratio(std::sync::Arc::new(r.abs()))),
        Num::Dec(d) => Ok(Value::big_dec(if d.unscaled().is_negative() {
            d.neg()
        } else {
            d.clone()
        })),
    }
}

// ---------------------------------------------------------------------
// Floor division on longs (Java semantics)
// ---------------------------------------------------------------------

pub fn floor_div(a: &Value, b: &Value) -> Result<Value, Error> {
    let (ia, ib) = (to_i64(a, 0)?, to_i64(b, 1)?);
    if ib == 0 {
        return Err(Error::arithmetic(DIVIDE_BY_ZERO));
    }
    let q = ia.wrapping_div(ib);
    let r = ia.wrapping_rem(ib);
    Ok(Value::Int(if r != 0 && (r ^ ib) < 0 { q - 1 } else { q }))
}

pub fn floor_mod(a: &Value, b: &Value) -> Result<Value, Error> {
    let (ia, ib) = (to_i64(a, 0)?, to_i64(b, 1)?);
    if ib == 0 {
        return Err(Error::arithmetic(DIVIDE_BY_ZERO));
    }
    let r = ia.wrapping_rem(ib);
    Ok(Value::Int(if r != 0 && (r ^ ib) < 0 { r + ib } else { r }))
}

// ---------------------------------------------------------------------
// Exact arithmetic: raises on overflow of the fixed integer range
// ---------------------------------------------------------------------

macro_rules! exact_binary {
    ($($name:ident => $method:ident),+ $(,)?) => {
        $(
            pub fn $name(a: &Value, b: &Value) -> Result<Value, Error> {
                to_i64(a, 0)?
                    .$method(to_i64(b, 1)?)
                    .map(Value::Int)
                    .ok_or_else(|| Error::arithmetic(INTEGER_OVERFLOW))
            }
        )+
    };
}

exact_binary! {
    add_exact => checked_add,
    subtract_exact => checked_sub,
    multiply_exact => checked_mul,
}

pub fn negate_exact(v: &Value) -> Result<Value, Error> {
    to_i64(v, 0)?
        .checked_neg()
        .map(Value::Int)
        .ok_or_else(|| Error::arithmetic(INTEGER_OVERFLOW))
}

pub fn increment_exact(v: &Value) -> Result<Value, Error> {
    to_i64(v, 0)?
        .checked_add(1)
        .map(Value::Int)
        .ok_or_else(|| Error::arithmetic(INTEGER_OVERFLOW))
}

pub fn decrement_exact(v: &Value) -> Result<Value, Error> {
    to_i64(v, 0)?
        .checked_sub(1)
        .map(Value::Int)
        .ok_or_else(|| Error::arithmetic(INTEGER_OVERFLOW))
}

// ---------------------------------------------------------------------
// IEEE helpers
// ---------------------------------------------------------------------

fn next_after_f64(start: f64, dir: f64) -> f64 {
    if start.is_nan() || dir.is_nan() {
        return f64::NAN;
    }
    if start == dir {
        return dir;
    }
    if start == 0.0 {
        let tiny = f64::from_bits(1);
        return if dir > 0.0 { tiny } else { -tiny };
    }
    let bits = start.to_bits();
    let next = if (dir > start) == (start > 0.0) {
        bits + 1
    } else {
        bits - 1
    };
    f64::from_bits(next)
}

pub fn next_after(a: &Value, b: &Value) -> Result<Value, Error> {
    Ok(Value::Float(next_after_f64(to_f64(a, 0)?, to_f64(b, 1)?)))
}

pub fn next_up(v: &Value) -> Result<Value, Error> {
    Ok(Value::Float(next_after_f64(to_f64(v, 0)?, f64::INFINITY)))
}

pub fn next_down(v: &Value) -> Result<Value, Error> {
    Ok(Value::Float(next_after_f64(to_f64(v, 0)?, f64::NEG_INFINITY)))
}

/// Distance to the next representable float above |v| (Java `ulp`).
pub fn ulp(v: &Value) -> Result<Value, Error> {
    let f = to_f64(v, 0)?;
    Ok(Value::Float(if f.is_nan() {
        f64::NAN
    } else if f.is_infinite() {
        f64::INFINITY
    } else {
        let a = f.abs();
        next_after_f64(a, f64::INFINITY) - a
    }))
}

pub fn copy_sign(a: &Value, b: &Value) -> Result<Value, Error> {
    Ok(Value::Float(to_f64(a, 0)?.copysign(to_f64(b, 1)?)))
}

/// Unbiased binary exponent (Java `getExponent`).
pub fn get_exponent(v: &Value) -> Result<Value, Error> {
    let f = to_f64(v, 0)?;
    let biased = ((f.to_bits() >> 52) & 0x7ff) as i64;
    Ok(Value::Int(if biased == 0 {
        -1023 // zero and subnormals
    } else {
        biased - 1023 // infinities and NaN fall out as 1024
    }))
}

/// IEEE 754 remainder: `a - b * n` with n the integer nearest `a / b`,
/// ties to even.
pub fn ieee_remainder(a: &Value, b: &Value) -> Result<Value, Error> {
    let (af, bf) = (to_f64(a, 0)?, to_f64(b, 1)?);
    if bf == 0.0 || af.is_infinite() || bf.is_nan() || af.is_nan() {
        return Ok(Value::Float(f64::NAN));
    }
    if bf.is_infinite() {
        return Ok(Value::Float(af));
    }
    Ok(Value::Float(af - bf * round_ties_even(af / bf)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trig_coerces_ints() {
        assert_eq!(sin(&Value::Int(0)).unwrap(), Value::Float(0.0));
        assert_eq!(cos(&Value::Int(0)).unwrap(), Value::Float(1.0));
    }

    #[test]
    fn test_round_half_up_and_nan() {
        assert_eq!(round(&Value::Float(2.5)).unwrap(), Value::Int(3));
        assert_eq!(round(&Value::Float(-2.5)).unwrap(), Value::Int(-2));
        assert_eq!(round(&Value::Float(f64::NAN)).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_rint_ties_to_even() {
        assert_eq!(rint(&Value::Float(2.5)).unwrap(), Value::Float(2.0));
        assert_eq!(rint(&Value::Float(3.5)).unwrap(), Value::Float(4.0));
    }

    #[test]
    fn test_floor_div_and_mod_match_java() {
        assert_eq!(floor_div(&Value::Int(-7), &Value::Int(3)).unwrap(), Value::Int(-3));
        assert_eq!(floor_mod(&Value::Int(-7), &Value::Int(3)).unwrap(), Value::Int(2));
        assert_eq!(floor_div(&Value::Int(7), &Value::Int(-3)).unwrap(), Value::Int(-3));
        assert_eq!(floor_mod(&Value::Int(7), &Value::Int(-3)).unwrap(), Value::Int(-2));
    }

    #[test]
    fn test_exact_family_raises_on_overflow() {
        assert_eq!(
            add_exact(&Value::Int(1), &Value::Int(2)).unwrap(),
            Value::Int(3)
        );
        let err = add_exact(&Value::Int(i64::MAX), &Value::Int(1)).unwrap_err();
        assert_eq!(err.message, "integer overflow");
        assert!(negate_exact(&Value::Int(i64::MIN)).is_err());
        assert!(increment_exact(&Value::Int(i64::MAX)).is_err());
    }

    #[test]
    fn test_next_after_and_ulp() {
        let up = next_up(&Value::Float(1.0)).unwrap();
        match up {
            Value::Float(f) => assert!(f > 1.0 && f - 1.0 < 1e-15),
            _ => unreachable!(),
        }
        assert_eq!(
            ulp(&Value::Float(0.0)).unwrap(),
            Value::Float(f64::from_bits(1))
        );
    }

    #[test]
    fn test_get_exponent() {
        assert_eq!(get_exponent(&Value::Float(8.0)).unwrap(), Value::Int(3));
        assert_eq!(get_exponent(&Value::Float(0.5)).unwrap(), Value::Int(-1));
        assert_eq!(get_exponent(&Value::Float(0.0)).unwrap(), Value::Int(-1023));
    }

    #[test]
    fn test_ieee_remainder() {
        // 5 = 2*3 - 1, nearest multiple
        assert_eq!(
            ieee_remainder(&Value::Float(5.0), &Value::Float(3.0)).unwrap(),
            Value::Float(-1.0)
        );
    }

    #[test]
    fn test_abs_keeps_category() {
        assert_eq!(abs(&Value::Int(-4)).unwrap(), Value::Int(4));
        assert_eq!(abs(&Value::Float(-4.5)).unwrap(), Value::Float(4.5));
        assert!(matches!(
            abs(&Value::big_int(num_bigint::BigInt::from(-3))).unwrap(),
            Value::BigInt(_)
        ));
    }

    #[test]
    fn test_angle_conversions() {
        assert_eq!(
            to_degrees(&Value::Float(std::f64::consts::PI)).unwrap(),
            Value::Float(180.0)
        );
        assert_eq!(
            to_radians(&Value::Float(180.0)).unwrap(),
            Value::Float(std::f64::consts::PI)
        );
    }
}
