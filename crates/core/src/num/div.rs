//! Division, quotient, modulus, remainder
//!
//! Exact division yields the narrowest exact result: an integer when
//! evenly divisible, otherwise a reduced ratio. Any float operand makes
//! the operation float; a decimal operand also drops division to float
//! to avoid non-terminating decimal expansions. `mod` floors toward
//! negative infinity, `rem` truncates toward zero; both coerce ratio
//! and decimal operands to float. Integer overloads throw on a zero
//! divisor.

use super::{as_num, ratio_result, Num};
use crate::error::Error;
use crate::value::Value;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};

const DIVIDE_BY_ZERO: &str = "Divide by zero";

/// `/`
pub fn div(a: &Value, b: &Value) -> Result<Value, Error> {
    let x = as_num(a, 0)?;
    let y = as_num(b, 1)?;

    // Float or decimal involvement: float division. A zero denominator
    // raises rather than producing an IEEE infinity.
    if x.is_float() || y.is_float() || x.is_dec() || y.is_dec() {
        let yf = y.to_f64();
        if yf == 0.0 {
            return Err(Error::arithmetic(DIVIDE_BY_ZERO));
        }
        return Ok(Value::Float(x.to_f64() / yf));
    }

    let ry = y.to_rational();
    if ry.is_zero() {
        return Err(Error::arithmetic(DIVIDE_BY_ZERO));
    }
    Ok(ratio_result(x.to_rational() / ry, x.is_big() || y.is_big()))
}

/// `quot`: truncated division.
pub fn quot(a: &Value, b: &Value) -> Result<Value, Error> {
    let x = as_num(a, 0)?;
    let y = as_num(b, 1)?;
    match (&x, &y) {
        (Num::Int(ia), Num::Int(ib)) => {
            if *ib == 0 {
                return Err(Error::arithmetic(DIVIDE_BY_ZERO));
            }
            Ok(Value::Int(ia.wrapping_div(*ib)))
        }
        (Num::Int(_) | Num::Big(_), Num::Int(_) | Num::Big(_)) => {
            let (ba, bb) = (x.to_rational().to_integer(), y.to_rational().to_integer());
            if bb.is_zero() {
                return Err(Error::arithmetic(DIVIDE_BY_ZERO));
            }
            Ok(Value::big_int(ba / bb))
        }
        _ => {
            let bf = y.to_f64();
            if bf == 0.0 {
                return Err(Error::arithmetic(DIVIDE_BY_ZERO));
            }
            Ok(Value::Float((x.to_f64() / bf).trunc()))
        }
    }
}

/// `mod`: floored modulus, sign follows the divisor.
pub fn modulo(a: &Value, b: &Value) -> Result<Value, Error> {
    let x = as_num(a, 0)?;
    let y = as_num(b, 1)?;
    match (&x, &y) {
        (Num::Int(ia), Num::Int(ib)) => {
            if *ib == 0 {
                return Err(Error::arithmetic(DIVIDE_BY_ZERO));
            }
            let r = ia.wrapping_rem(*ib);
            Ok(Value::Int(if r != 0 && (r ^ ib).is_negative() {
                r + ib
            } else {
                r
            }))
        }
        (Num::Int(_) | Num::Big(_), Num::Int(_) | Num::Big(_)) => {
            let (ba, bb) = (x.to_rational().to_integer(), y.to_rational().to_integer());
            if bb.is_zero() {
                return Err(Error::arithmetic(DIVIDE_BY_ZERO));
            }
            Ok(Value::big_int(ba.mod_floor(&bb)))
        }
        // Ratio and decimal operands coerce to float.
        _ => {
            let (af, bf) = (x.to_f64(), y.to_f64());
            let r = af % bf;
            Ok(Value::Float(if r != 0.0 && (r < 0.0) != (bf < 0.0) {
                r + bf
            } else {
                r
            }))
        }
    }
}

/// `rem`: truncated remainder, sign follows the dividend.
pub fn rem(a: &Value, b: &Value) -> Result<Value, Error> {
    let x = as_num(a, 0)?;
    let y = as_num(b, 1)?;
    match (&x, &y) {
        (Num::Int(ia), Num::Int(ib)) => {
            if *ib == 0 {
                return Err(Error::arithmetic(DIVIDE_BY_ZERO));
            }
            Ok(Value::Int(ia.wrapping_rem(*ib)))
        }
        (Num::Int(_) | Num::Big(_), Num::Int(_) | Num::Big(_)) => {
            let (ba, bb) = (x.to_rational().to_integer(), y.to_rational().to_integer());
            if bb.is_zero() {
                return Err(Error::arithmetic(DIVIDE_BY_ZERO));
            }
            // Truncated remainder of a/b, NOT the quotient.
            Ok(Value::big_int(ba % bb))
        }
        _ => Ok(Value::Float(x.to_f64() % y.to_f64())),
    }
}
