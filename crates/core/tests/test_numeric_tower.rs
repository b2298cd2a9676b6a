//! End-to-end checks of the numeric tower promotion rules
//!
//! These pin the cross-category contracts: overflow behavior of the
//! promoting and non-promoting operators, ratio reduction, mod/rem
//! signs, and hash/equality consistency over mixed representations.

use clove_core::num::{arith, compare, div};
use clove_core::{eql, hash_value, Value};
use num_bigint::BigInt;
use num_rational::BigRational;
use std::str::FromStr;

fn ratio(n: i64, d: i64) -> Value {
    Value::ratio(BigRational::new(BigInt::from(n), BigInt::from(d)))
}

#[test]
fn promoting_multiply_overflows_into_bigint() {
    let r = arith::mul_p(&Value::Int(10_000_000_000), &Value::Int(10_000_000_000)).unwrap();
    assert_eq!(
        r,
        Value::big_int(BigInt::from_str("100000000000000000000").unwrap())
    );
    assert!(matches!(r, Value::BigInt(_)));
}

#[test]
fn non_promoting_multiply_overflows_into_float() {
    let r = arith::mul(&Value::Int(9_223_372_036_854_775_807), &Value::Int(2)).unwrap();
    match r {
        Value::Float(f) => assert!(f > 1.8e19),
        other => panic!("expected float, got {:?}", other),
    }
}

#[test]
fn ratio_reduction_rules() {
    // (/ 10 5) => 2
    assert_eq!(div::div(&Value::Int(10), &Value::Int(5)).unwrap(), Value::Int(2));
    // (/ 10 3) => 10/3
    assert_eq!(div::div(&Value::Int(10), &Value::Int(3)).unwrap(), ratio(10, 3));
    // (+ 1/2 1/2) => 1, an integer, never a ratio with denominator 1
    let one = arith::add(&ratio(1, 2), &ratio(1, 2)).unwrap();
    assert!(matches!(one, Value::Int(1)));
}

#[test]
fn mod_and_rem_signs() {
    assert_eq!(
        div::modulo(&Value::Int(-7), &Value::Int(3)).unwrap(),
        Value::Int(2)
    );
    assert_eq!(div::rem(&Value::Int(-7), &Value::Int(3)).unwrap(), Value::Int(-1));
}

#[test]
fn division_inverse_round_trips_exactly() {
    for (x, y) in [(7i64, 3i64), (10, 4), (-9, 6), (1, 7)] {
        let xv = Value::Int(x);
        let yv = Value::Int(y);
        let q = div::div(&xv, &yv).unwrap();
        assert_eq!(arith::mul(&yv, &q).unwrap(), xv, "({y} * ({x} / {y}))");
    }
}

#[test]
fn addition_commutes_across_categories() {
    let samples = [
        Value::Int(3),
        Value::Float(2.25),
        Value::big_int(BigInt::from_str("123456789012345678901").unwrap()),
        ratio(22, 7),
    ];
    for a in &samples {
        for b in &samples {
            assert_eq!(arith::add_p(a, b).unwrap(), arith::add_p(b, a).unwrap());
            assert_eq!(arith::mul(a, b).unwrap(), arith::mul(b, a).unwrap());
        }
    }
}

#[test]
fn equal_numbers_hash_equal_across_categories() {
    let pairs = [
        (Value::Int(7), Value::big_int(BigInt::from(7))),
        (Value::Int(7), Value::Float(7.0)),
        (ratio(3, 2), Value::Float(1.5)),
    ];
    for (a, b) in pairs {
        assert!(eql(&a, &b), "{a} = {b}");
        assert_eq!(hash_value(&a), hash_value(&b), "hash {a} vs {b}");
    }
}

#[test]
fn comparison_is_exact_for_big_operands() {
    // i64::MAX and i64::MAX as a BigInt + 1 differ even though both
    // round to the same f64.
    let max = Value::Int(i64::MAX);
    let above = Value::big_int(BigInt::from(i64::MAX) + 1);
    assert!(compare::lt(&max, &above).unwrap());
    assert!(!eql(&max, &above));
}

#[test]
fn bigint_contagion_through_arithmetic() {
    // Int + BigInt stays big even in the compact range.
    let r = arith::add(&Value::Int(1), &Value::big_int(BigInt::from(1))).unwrap();
    assert!(matches!(r, Value::BigInt(_)));
    assert!(eql(&r, &Value::Int(2)));
}
