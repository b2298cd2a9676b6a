//! Numeric comparison
//!
//! A float operand drops both sides to IEEE comparison, so NaN is
//! unordered and every ordered relation on it is false. Exact operands
//! compare as rationals: ratio/ratio ordering cross-multiplies (the
//! denominators are positive, so no precision is lost).

use super::{as_num, Num};
use crate::error::Error;
use crate::value::Value;
use std::cmp::Ordering;

/// Compare two numeric values. `None` means unordered (NaN involved).
pub(crate) fn num_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    let x = as_num(a, 0).ok()?;
    let y = as_num(b, 1).ok()?;
    if x.is_float() || y.is_float() {
        return x.to_f64().partial_cmp(&y.to_f64());
    }
    match (&x, &y) {
        (Num::Int(ia), Num::Int(ib)) => Some(ia.cmp(ib)),
        (Num::Big(ba), Num::Big(bb)) => Some(ba.cmp(bb)),
        _ => Some(x.to_rational().cmp(&y.to_rational())),
    }
}

/// Numeric equality: same mathematical value. Both arguments must
/// already be numbers.
pub fn num_eq(a: &Value, b: &Value) -> bool {
    num_cmp(a, b) == Some(Ordering::Equal)
}

fn ordered(a: &Value, b: &Value) -> Result<Option<Ordering>, Error> {
    as_num(a, 0)?;
    as_num(b, 1)?;
    Ok(num_cmp(a, b))
}

pub fn lt(a: &Value, b: &Value) -> Result<bool, Error> {
    Ok(ordered(a, b)? == Some(Ordering::Less))
}

pub fn le(a: &Value, b: &Value) -> Result<bool, Error> {
    Ok(matches!(
        ordered(a, b)?,
        Some(Ordering::Less) | Some(Ordering::Equal)
    ))
}

pub fn gt(a: &Value, b: &Value) -> Result<bool, Error> {
    Ok(ordered(a, b)? == Some(Ordering::Greater))
}

pub fn ge(a: &Value, b: &Value) -> Result<bool, Error> {
    Ok(matches!(
        ordered(a, b)?,
        Some(Ordering::Greater) | Some(Ordering::Equal)
    ))
}
