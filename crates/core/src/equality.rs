//! Value equality and hashing
//!
//! `eql` is the single equality used everywhere: map keys, set members,
//! `=` in the language, multimethod dispatch values. The rules:
//!
//! - Numbers are equal iff they denote the same mathematical value.
//!   Exact/exact comparisons widen to rationals; any float operand
//!   drops both sides to IEEE comparison (so NaN is never equal).
//! - Sequentials (vector, list, cons, lazy seq, chunked cons) compare
//!   element-wise across representations; comparing a lazy sequence
//!   realizes it.
//! - Maps compare as entry sets regardless of representation; sets as
//!   member sets. Strings by codepoint sequence, keywords/symbols by
//!   `(ns, name)`.
//! - Reference types, functions, transients, and arrays compare by
//!   identity.
//!
//! `hash_value` is consistent with `eql` across all categories: equal
//! numbers of different representations hash alike (integral values
//! through their integer image, everything else through its f64 image),
//! and a vector hashes like the seq of its elements.

use crate::value::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub fn eql(a: &Value, b: &Value) -> bool {
    if a.is_number() && b.is_number() {
        return crate::num::compare::num_eq(a, b);
    }
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Char(x), Value::Char(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Keyword(x), Value::Keyword(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::Reduced(x), Value::Reduced(y)) => eql(x, y),
        (Value::Set(x), Value::Set(y)) => set_equiv(x, y),
        _ if a.is_sequential() && b.is_sequential() => sequential_equiv(a, b),
        _ if is_map(a) && is_map(b) => map_equiv(a, b),
        // Identity for reference types, functions, arrays, transients.
        (Value::Atom(x), Value::Atom(y)) => Arc::ptr_eq(x, y),
        (Value::Volatile(x), Value::Volatile(y)) => Arc::ptr_eq(x, y),
        (Value::Var(x), Value::Var(y)) => Arc::ptr_eq(x, y),
        (Value::Delay(x), Value::Delay(y)) => Arc::ptr_eq(x, y),
        (Value::Future(x), Value::Future(y)) => Arc::ptr_eq(x, y),
        (Value::Promise(x), Value::Promise(y)) => Arc::ptr_eq(x, y),
        (Value::Agent(x), Value::Agent(y)) => Arc::ptr_eq(x, y),
        (Value::Array(x), Value::Array(y)) => Arc::ptr_eq(x, y),
        (Value::Fn(x), Value::Fn(y)) => Arc::ptr_eq(x, y),
        (Value::Builtin(x), Value::Builtin(y)) => Arc::ptr_eq(x, y),
        (Value::MultiFn(x), Value::MultiFn(y)) => Arc::ptr_eq(x, y),
        (Value::TransientVector(x), Value::TransientVector(y)) => Arc::ptr_eq(x, y),
        (Value::TransientMap(x), Value::TransientMap(y)) => Arc::ptr_eq(x, y),
        (Value::TransientSet(x), Value::TransientSet(y)) => Arc::ptr_eq(x, y),
        _ => false,
    }
}

fn is_map(v: &Value) -> bool {
    matches!(v, Value::Map(_) | Value::HashMap(_))
}

fn sequential_equiv(a: &Value, b: &Value) -> bool {
    // Vector/vector gets a direct element walk; everything else goes
    // through the realizing seq comparison.
    if let (Value::Vector(x), Value::Vector(y)) = (a, b) {
        return x.len() == y.len() && x.iter().zip(y.iter()).all(|(u, v)| eql(u, v));
    }
    crate::coll::seq_equiv(a, b)
}

fn map_equiv(a: &Value, b: &Value) -> bool {
    let len = |m: &Value| match m {
        Value::Map(m) => m.len(),
        Value::HashMap(m) => m.len(),
        _ => 0,
    };
    if len(a) != len(b) {
        return false;
    }
    let lookup = |m: &Value, k: &Value| -> Option<Value> {
        match m {
            Value::Map(m) => m.get(k).cloned(),
            Value::HashMap(m) => m.get(k).cloned(),
            _ => None,
        }
    };
    let entries: Vec<(Value, Value)> = match a {
        Value::Map(m) => m.iter().cloned().collect(),
        Value::HashMap(m) => m.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => return false,
    };
    entries
        .iter()
        .all(|(k, v)| matches!(lookup(b, k), Some(w) if eql(v, &w)))
}

fn set_equiv(a: &crate::coll::set::PersistentHashSet, b: &crate::coll::set::PersistentHashSet) -> bool {
    a.len() == b.len() && a.iter().all(|v| b.contains(v))
}

// ---------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------

// Per-category salts keep unequal categories from colliding trivially.
// Numbers carry no salt: cross-representation equal numbers must hash
// alike.
const SALT_STR: u64 = 0x53;
const SALT_KEYWORD: u64 = 0x4b;
const SALT_SYMBOL: u64 = 0x79;
const SALT_CHAR: u64 = 0x43;
const SALT_SEQ: u64 = 0x51;
const SALT_MAP: u64 = 0x4d;
const SALT_SET: u64 = 0x45;
const SALT_REDUCED: u64 = 0x52;

fn mix<T: Hash>(salt: u64, x: T) -> u64 {
    let mut h = DefaultHasher::new();
    salt.hash(&mut h);
    x.hash(&mut h);
    h.finish()
}

fn hash_integer(n: i64) -> u64 {
    mix(0, n)
}

fn hash_f64(f: f64) -> u64 {
    mix(1, f.to_bits())
}

/// Hash a numeric value consistently with numeric equality: an integral
/// value in the compact range hashes through its i64 image; everything
/// else through its f64 image (equal exact values share one f64 image).
fn hash_number(v: &Value) -> u64 {
    use num_traits::ToPrimitive;
    match v {
        Value::Int(i) => hash_integer(*i),
        Value::Float(f) => {
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                hash_integer(*f as i64)
            } else {
                hash_f64(*f)
            }
        }
        Value::BigInt(b) => match b.to_i64() {
            Some(i) => hash_integer(i),
            None => hash_f64(b.to_f64().unwrap_or(f64::NAN)),
        },
        Value::Ratio(r) => hash_f64(r.to_f64().unwrap_or(f64::NAN)),
        Value::BigDec(d) => match d.to_bigint().and_then(|b| b.to_i64()) {
            Some(i) => hash_integer(i),
            None => hash_f64(d.to_f64()),
        },
        _ => unreachable!("hash_number on non-number"),
    }
}

pub fn hash_value(v: &Value) -> u64 {
    if v.is_number() {
        return hash_number(v);
    }
    match v {
        Value::Nil => 0x9e37,
        Value::Bool(false) => 0x9e38,
        Value::Bool(true) => 0x9e39,
        Value::Char(c) => mix(SALT_CHAR, *c as u32),
        Value::Str(s) => mix(SALT_STR, s.as_bytes()),
        Value::Keyword(k) => {
            let mut h = DefaultHasher::new();
            SALT_KEYWORD.hash(&mut h);
            k.hash(&mut h);
            h.finish()
        }
        Value::Symbol(s) => {
            let mut h = DefaultHasher::new();
            SALT_SYMBOL.hash(&mut h);
            s.hash(&mut h);
            h.finish()
        }
        Value::Reduced(inner) => mix(SALT_REDUCED, hash_value(inner)),
        Value::Set(s) => {
            // Order-insensitive: wrapping sum of member hashes.
            let sum = s
                .iter()
                .fold(0u64, |acc, m| acc.wrapping_add(hash_value(m)));
            mix(SALT_SET, sum)
        }
        _ if is_map(v) => {
            let entries: Vec<(Value, Value)> = match v {
                Value::Map(m) => m.iter().cloned().collect(),
                Value::HashMap(m) => m.iter().map(|(k, w)| (k.clone(), w.clone())).collect(),
                _ => Vec::new(),
            };
            let sum = entries.iter().fold(0u64, |acc, (k, w)| {
                acc.wrapping_add(mix(hash_value(k), hash_value(w)))
            });
            mix(SALT_MAP, sum)
        }
        _ if v.is_sequential() => {
            // Ordered fold; realizes lazy sequences. A vector hashes the
            // same as the seq of its elements.
            let items = crate::coll::seq::to_vec(v).unwrap_or_default();
            let folded = items
                .iter()
                .fold(1u64, |acc, e| acc.wrapping_mul(31).wrapping_add(hash_value(e)));
            mix(SALT_SEQ, folded)
        }
        // Identity hash for reference types, functions, arrays,
        // transients.
        Value::Atom(p) => mix(2, Arc::as_ptr(p) as usize),
        Value::Volatile(p) => mix(2, Arc::as_ptr(p) as usize),
        Value::Var(p) => mix(2, Arc::as_ptr(p) as usize),
        Value::Delay(p) => mix(2, Arc::as_ptr(p) as usize),
        Value::Future(p) => mix(2, Arc::as_ptr(p) as usize),
        Value::Promise(p) => mix(2, Arc::as_ptr(p) as usize),
        Value::Agent(p) => mix(2, Arc::as_ptr(p) as usize),
        Value::Array(p) => mix(2, Arc::as_ptr(p) as usize),
        Value::Fn(p) => mix(2, Arc::as_ptr(p) as usize),
        Value::Builtin(p) => mix(2, Arc::as_ptr(p) as usize),
        Value::MultiFn(p) => mix(2, Arc::as_ptr(p) as usize),
        Value::TransientVector(p) => mix(2, Arc::as_ptr(p) as usize),
        Value::TransientMap(p) => mix(2, Arc::as_ptr(p) as usize),
        Value::TransientSet(p) => mix(2, Arc::as_ptr(p) as usize),
        _ => unreachable!(),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        eql(self, other)
    }
}

// NaN-bearing floats make this a loose Eq (NaN != NaN); the only
// consequence is that a NaN map key can never be looked up again, which
// matches the host-language contract.
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(hash_value(self));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use num_rational::BigRational;

    #[test]
    fn test_cross_category_numeric_equality() {
        assert!(eql(&Value::Int(5), &Value::big_int(BigInt::from(5))));
        assert!(eql(&Value::Int(5), &Value::Float(5.0)));
        assert!(eql(
            &Value::Float(0.5),
            &Value::Ratio(std::sync::Arc::new(BigRational::new(
                BigInt::from(1),
                BigInt::from(2)
            )))
        ));
        assert!(!eql(&Value::Int(5), &Value::Float(5.5)));
        assert!(!eql(&Value::Float(f64::NAN), &Value::Float(f64::NAN)));
    }

    #[test]
    fn test_equal_numbers_hash_alike() {
        let five = Value::Int(5);
        let five_big = Value::big_int(BigInt::from(5));
        let five_float = Value::Float(5.0);
        assert_eq!(hash_value(&five), hash_value(&five_big));
        assert_eq!(hash_value(&five), hash_value(&five_float));

        let half_ratio = Value::Ratio(std::sync::Arc::new(BigRational::new(
            BigInt::from(1),
            BigInt::from(2),
        )));
        assert_eq!(hash_value(&half_ratio), hash_value(&Value::Float(0.5)));
    }

    #[test]
    fn test_vector_equals_list_of_same_elements() {
        let v = Value::vector(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let l = Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert!(eql(&v, &l));
        assert_eq!(hash_value(&v), hash_value(&l));
        assert!(!eql(&v, &Value::set(vec![Value::Int(1), Value::Int(2), Value::Int(3)])));
    }

    #[test]
    fn test_lazy_seq_equality_realizes() {
        let ls = Value::lazy_seq(Value::fn_val(None, |_| {
            Ok(Value::list(vec![Value::Int(1), Value::Int(2)]))
        }));
        assert!(eql(&ls, &Value::vector(vec![Value::Int(1), Value::Int(2)])));
    }

    #[test]
    fn test_array_and_hash_maps_compare_equal() {
        let am = Value::array_map(vec![
            (Value::keyword(None, "a"), Value::Int(1)),
            (Value::keyword(None, "b"), Value::Int(2)),
        ]);
        let hm = Value::hash_map(vec![
            (Value::keyword(None, "b"), Value::Int(2)),
            (Value::keyword(None, "a"), Value::Int(1)),
        ]);
        assert!(eql(&am, &hm));
        assert_eq!(hash_value(&am), hash_value(&hm));
    }

    #[test]
    fn test_string_and_char_equality() {
        assert!(eql(&Value::string("abc"), &Value::string("abc")));
        assert!(!eql(&Value::string("abc"), &Value::string("abd")));
        assert!(eql(&Value::Char('x'), &Value::Char('x')));
        assert!(!eql(&Value::Char('x'), &Value::string("x")));
    }

    #[test]
    fn test_atoms_compare_by_identity() {
        let a = crate::refs::atom::Atom::new_value(Value::Int(1));
        let b = crate::refs::atom::Atom::new_value(Value::Int(1));
        assert!(eql(&a, &a.clone()));
        assert!(!eql(&a, &b));
    }

    #[test]
    fn test_self_equal_collections_and_stable_hash() {
        for v in [
            Value::vector(vec![Value::Int(1), Value::string("x")]),
            Value::array_map(vec![(Value::keyword(None, "k"), Value::Int(1))]),
            Value::set(vec![Value::Int(1), Value::Int(2)]),
        ] {
            assert!(eql(&v, &v));
            assert_eq!(hash_value(&v), hash_value(&v));
        }
    }
}
