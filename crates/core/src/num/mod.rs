//! The numeric tower
//!
//! Five numeric categories (fixed integer, float, big integer, big
//! decimal, exact ratio) with automatic promotion. Dispatch works on a
//! borrowed classification of both operands; the promotion matrix for
//! the arithmetic operators lives in `arith`, division and the
//! mod/rem family in `div`, ordered comparison in `compare`, and the
//! auxiliary math namespace in `math`.

pub mod arith;
pub mod bigdec;
pub mod compare;
pub mod div;
pub mod math;

use crate::error::Error;
use crate::value::Value;
use self::bigdec::BigDec;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::ToPrimitive;

/// Borrowed view of a numeric operand.
pub(crate) enum Num<'a> {
    Int(i64),
    Float(f64),
    Big(&'a BigInt),
    Ratio(&'a BigRational),
    Dec(&'a BigDec),
}

/// Classify a value as numeric, or raise "Cannot cast X to number" with
/// the argument position attached.
pub(crate) fn as_num<'a>(v: &'a Value, pos: usize) -> Result<Num<'a>, Error> {
    match v {
        Value::Int(i) => Ok(Num::Int(*i)),
        Value::Float(f) => Ok(Num::Float(*f)),
        Value::BigInt(b) => Ok(Num::Big(b)),
        Value::Ratio(r) => Ok(Num::Ratio(r)),
        Value::BigDec(d) => Ok(Num::Dec(d)),
        other => Err(Error::cast(other.type_name(), "number", pos)),
    }
}

impl Num<'_> {
    pub(crate) fn is_float(&self) -> bool {
        matches!(self, Num::Float(_))
    }

    pub(crate) fn is_dec(&self) -> bool {
        matches!(self, Num::Dec(_))
    }

    pub(crate) fn is_big(&self) -> bool {
        matches!(self, Num::Big(_))
    }

    pub(crate) fn to_f64(&self) -> f64 {
        match self {
            Num::Int(i) => *i as f64,
            Num::Float(f) => *f,
            Num::Big(b) => b.to_f64().unwrap_or(f64::NAN),
            Num::Ratio(r) => r.to_f64().unwrap_or(f64::NAN),
            Num::Dec(d) => d.to_f64(),
        }
    }

    /// Exact rational view. Callers guarantee the operand is not a
    /// float (the float paths never reach exact arithmetic).
    pub(crate) fn to_rational(&self) -> BigRational {
        match self {
            Num::Int(i) => BigRational::from_integer(BigInt::from(*i)),
            Num::Big(b) => BigRational::from_integer((*b).clone()),
            Num::Ratio(r) => (*r).clone(),
            Num::Dec(d) => d.to_rational(),
            Num::Float(f) => {
                BigRational::from_float(*f).unwrap_or_else(|| BigRational::from_integer(BigInt::from(0)))
            }
        }
    }

    /// Decimal view of an exact operand (ratios convert per the decimal
    /// conversion rule; floats never take this path).
    pub(crate) fn to_bigdec(&self) -> BigDec {
        match self {
            Num::Int(i) => BigDec::from_i64(*i),
            Num::Big(b) => BigDec::from_bigint(b),
            Num::Dec(d) => (*d).clone(),
            Num::Ratio(r) => BigDec::from_ratio(r),
            Num::Float(f) => BigDec::from_ratio(
                &BigRational::from_float(*f)
                    .unwrap_or_else(|| BigRational::from_integer(BigInt::from(0))),
            ),
        }
    }
}

/// Coerce a numeric value to f64 for the auxiliary math functions.
pub(crate) fn to_f64(v: &Value, pos: usize) -> Result<f64, Error> {
    Ok(as_num(v, pos)?.to_f64())
}

/// Coerce an integer-valued operand to i64, for the long-returning
/// auxiliary functions.
pub(crate) fn to_i64(v: &Value, pos: usize) -> Result<i64, Error> {
    match v {
        Value::Int(i) => Ok(*i),
        Value::BigInt(b) => b
            .to_i64()
            .ok_or_else(|| Error::arithmetic("integer overflow")),
        other => Err(Error::cast(other.type_name(), "long", pos)),
    }
}

/// Normalize an exact rational result: denominator one becomes an
/// integer (big-integer contagion keeps it a `BigInt` when either
/// operand was one); anything else is a `Ratio`.
pub(crate) fn ratio_result(r: BigRational, had_big: bool) -> Value {
    if num_traits::One::is_one(r.denom()) {
        if had_big {
            Value::big_int(r.numer().clone())
        } else {
            Value::integer(r.numer().clone())
        }
    } else {
        Value::Ratio(std::sync::Arc::new(r))
    }
}
