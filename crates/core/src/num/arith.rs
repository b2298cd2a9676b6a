//! Addition, subtraction, multiplication, negation
//!
//! The promotion matrix, widest-wins: float beats decimal beats ratio
//! beats big integer beats fixed integer. The non-promoting operators
//! spill fixed-integer overflow to float; the promoting variants
//! (`+'`, `-'`, `*'`) spill to big integers and never lose exactness.

use super::{as_num, ratio_result, Num};
use crate::error::Error;
use crate::value::Value;
use num_bigint::BigInt;

#[derive(Clone, Copy)]
enum Op {
    Add,
    Sub,
    Mul,
}

impl Op {
    fn on_f64(self, a: f64, b: f64) -> f64 {
        match self {
            Op::Add => a + b,
            Op::Sub => a - b,
            Op::Mul => a * b,
        }
    }

    fn on_i64_checked(self, a: i64, b: i64) -> Option<i64> {
        match self {
            Op::Add => a.checked_add(b),
            Op::Sub => a.checked_sub(b),
            Op::Mul => a.checked_mul(b),
        }
    }

    fn on_bigint(self, a: BigInt, b: BigInt) -> BigInt {
        match self {
            Op::Add => a + b,
            Op::Sub => a - b,
            Op::Mul => a * b,
        }
    }
}

fn arith(op: Op, a: &Value, b: &Value, promoting: bool) -> Result<Value, Error> {
    let x = as_num(a, 0)?;
    let y = as_num(b, 1)?;

    // Float wins over everything.
    if x.is_float() || y.is_float() {
        return Ok(Value::Float(op.on_f64(x.to_f64(), y.to_f64())));
    }
    // Decimal beats ratio and the integers.
    if x.is_dec() || y.is_dec() {
        let (dx, dy) = (x.to_bigdec(), y.to_bigdec());
        let d = match op {
            Op::Add => dx.add(&dy),
            Op::Sub => dx.sub(&dy),
            Op::Mul => dx.mul(&dy),
        };
        return Ok(Value::big_dec(d));
    }
    // Exact rational arithmetic when a ratio is involved.
    if matches!(x, Num::Ratio(_)) || matches!(y, Num::Ratio(_)) {
        let (rx, ry) = (x.to_rational(), y.to_rational());
        let r = match op {
            Op::Add => rx + ry,
            Op::Sub => rx - ry,
            Op::Mul => rx * ry,
        };
        return Ok(ratio_result(r, x.is_big() || y.is_big()));
    }
    // Big integers are contagious.
    if x.is_big() || y.is_big() {
        let (bx, by) = (x.to_rational(), y.to_rational());
        return Ok(Value::big_int(op.on_bigint(
            bx.to_integer(),
            by.to_integer(),
        )));
    }
    // Fixed integers: checked arithmetic, overflow per variant.
    let (ix, iy) = match (x, y) {
        (Num::Int(ix), Num::Int(iy)) => (ix, iy),
        _ => unreachable!(),
    };
    match op.on_i64_checked(ix, iy) {
        Some(n) => Ok(Value::Int(n)),
        None if promoting => Ok(Value::big_int(
            op.on_bigint(BigInt::from(ix), BigInt::from(iy)),
        )),
        None => Ok(Value::Float(op.on_f64(ix as f64, iy as f64))),
    }
}

pub fn add(a: &Value, b: &Value) -> Result<Value, Error> {
    arith(Op::Add, a, b, false)
}

pub fn sub(a: &Value, b: &Value) -> Result<Value, Error> {
    arith(Op::Sub, a, b, false)
}

pub fn mul(a: &Value, b: &Value) -> Result<Value, Error> {
    arith(Op::Mul, a, b, false)
}

/// `+'`
pub fn add_p(a: &Value, b: &Value) -> Result<Value, Error> {
    arith(Op::Add, a, b, true)
}

/// `-'`
pub fn sub_p(a: &Value, b: &Value) -> Result<Value, Error> {
    arith(Op::Sub, a, b, true)
}

/// `*'`
pub fn mul_p(a: &Value, b: &Value) -> Result<Value, Error> {
    arith(Op::Mul, a, b, true)
}

fn neg(v: &Value, promoting: bool) -> Result<Value, Error> {
    match as_num(v, 0)? {
        Num::Int(i) => match i.checked_neg() {
            Some(n) => Ok(Value::Int(n)),
            None if promoting => Ok(Value::big_int(-BigInt::from(i))),
            None => Ok(Value::Float(-(i as f64))),
        },
        Num::Float(f) => Ok(Value::Float(-f)),
        Num::Big(b) => Ok(Value::big_int(-b)),
        Num::Ratio(r) => Ok(ratio_result(-(*r).clone(), false)),
        Num::Dec(d) => Ok(Value::big_dec(d.neg())),
    }
}

pub fn negate(v: &Value) -> Result<Value, Error> {
    neg(v, false)
}

pub fn negate_p(v: &Value) -> Result<Value, Error> {
    neg(v, true)
}
