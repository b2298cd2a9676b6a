//! Persistent and transient collections
//!
//! Concrete representations live in the submodules; this module holds
//! the generic operations that dispatch on the value tag (`conj`, `get`,
//! `assoc`, `nth`, ...), which is the surface the evaluator's builtins
//! call through.

pub mod array;
pub mod lazy;
pub mod list;
pub mod map;
pub mod seq;
pub mod set;
pub mod transient;
pub mod vector;

use crate::equality::eql;
use crate::error::Error;
use crate::value::Value;

/// `conj` with per-type semantics: vector appends, list prepends, set
/// inserts, map accepts an entry pair or another map. nil starts a list.
pub fn conj(coll: &Value, v: Value) -> Result<Value, Error> {
    match coll {
        Value::Nil => Ok(Value::list(vec![v])),
        Value::List(l) => Ok(Value::List(l.cons(v))),
        Value::Vector(vec) => Ok(Value::Vector(vec.conj(v))),
        Value::Set(s) => Ok(Value::Set(s.conj(v))),
        Value::Map(_) | Value::HashMap(_) => conj_entry(coll, v),
        Value::Cons(_) | Value::LazySeq(_) | Value::ChunkedCons(_) => Ok(Value::cons(v, coll.clone())),
        other => Err(Error::type_err(format!(
            "conj expects a collection, got {}",
            other.type_name()
        ))),
    }
}

fn conj_entry(m: &Value, entry: Value) -> Result<Value, Error> {
    match entry {
        Value::Nil => Ok(m.clone()),
        Value::Vector(pair) if pair.len() == 2 => assoc(m, pair.nth(0)?, pair.nth(1)?),
        Value::Map(other) => {
            let mut acc = m.clone();
            for (k, v) in other.iter() {
                acc = assoc(&acc, k.clone(), v.clone())?;
            }
            Ok(acc)
        }
        Value::HashMap(other) => {
            let mut acc = m.clone();
            for (k, v) in other.iter() {
                acc = assoc(&acc, k.clone(), v.clone())?;
            }
            Ok(acc)
        }
        _ => Err(Error::value_err("Vector arg to map conj must be a pair")),
    }
}

/// Associative lookup with a default. Non-associative values yield the
/// default rather than raising, matching the host-language `get`.
pub fn get(coll: &Value, key: &Value, default: &Value) -> Result<Value, Error> {
    let found = match coll {
        Value::Map(m) => m.get(key).cloned(),
        Value::HashMap(m) => m.get(key).cloned(),
        Value::Set(s) => {
            if s.contains(key) {
                Some(key.clone())
            } else {
                None
            }
        }
        Value::Vector(v) => match key {
            Value::Int(i) if *i >= 0 => v.get(*i as usize).cloned(),
            _ => None,
        },
        Value::Str(s) => match key {
            Value::Int(i) if *i >= 0 => s.chars().nth(*i as usize).map(Value::Char),
            _ => None,
        },
        _ => None,
    };
    Ok(found.unwrap_or_else(|| default.clone()))
}

/// `assoc` on maps (by key) and vectors (by index). The array map
/// converts to a hash map when an enlarging assoc crosses the threshold.
pub fn assoc(coll: &Value, key: Value, value: Value) -> Result<Value, Error> {
    match coll {
        Value::Nil => Ok(Value::array_map(vec![(key, value)])),
        Value::Map(m) => {
            if !m.contains_key(&key) && m.len() >= map::HASHMAP_THRESHOLD {
                Ok(Value::HashMap(m.to_hash_map().assoc(key, value)))
            } else {
                Ok(Value::Map(m.assoc_flat(key, value)))
            }
        }
        Value::HashMap(m) => Ok(Value::HashMap(m.assoc(key, value))),
        Value::Vector(v) => match key {
            Value::Int(i) => Ok(Value::Vector(v.assoc(i, value)?)),
            other => Err(Error::cast(other.type_name(), "integer", 1)),
        },
        other => Err(Error::type_err(format!(
            "assoc expects a map or vector, got {}",
            other.type_name()
        ))),
    }
}

pub fn dissoc(coll: &Value, key: &Value) -> Result<Value, Error> {
    match coll {
        Value::Nil => Ok(Value::Nil),
        Value::Map(m) => Ok(Value::Map(m.dissoc(key))),
        Value::HashMap(m) => Ok(Value::HashMap(m.dissoc(key))),
        other => Err(Error::type_err(format!(
            "dissoc expects a map, got {}",
            other.type_name()
        ))),
    }
}

pub fn disj(coll: &Value, v: &Value) -> Result<Value, Error> {
    match coll {
        Value::Nil => Ok(Value::Nil),
        Value::Set(s) => Ok(Value::Set(s.disj(v))),
        other => Err(Error::type_err(format!(
            "disj expects a set, got {}",
            other.type_name()
        ))),
    }
}

/// Indexed access; raises on out-of-range, walks seqs when needed.
pub fn nth(coll: &Value, index: i64) -> Result<Value, Error> {
    match coll {
        Value::Vector(v) => v.nth(index),
        Value::Str(s) => {
            if index >= 0 {
                if let Some(c) = s.chars().nth(index as usize) {
                    return Ok(Value::Char(c));
                }
            }
            Err(Error::index(format!(
                "Index {} out of bounds for string of length {}",
                index,
                s.chars().count()
            )))
        }
        Value::Array(a) => a.aget(index),
        _ if coll.is_seq() || coll.is_nil() => {
            if index >= 0 {
                let mut cur = seq::seq(coll)?;
                let mut remaining = index;
                while !cur.is_nil() {
                    if remaining == 0 {
                        return seq::first(&cur);
                    }
                    remaining -= 1;
                    cur = seq::next(&cur)?;
                }
            }
            Err(Error::index(format!("Index {} out of bounds", index)))
        }
        other => Err(Error::type_err(format!(
            "nth not supported on {}",
            other.type_name()
        ))),
    }
}

/// `contains?`: key membership for maps/sets, index range for vectors.
pub fn contains(coll: &Value, key: &Value) -> Result<bool, Error> {
    match coll {
        Value::Nil => Ok(false),
        Value::Map(m) => Ok(m.contains_key(key)),
        Value::HashMap(m) => Ok(m.contains_key(key)),
        Value::Set(s) => Ok(s.contains(key)),
        Value::Vector(v) => Ok(matches!(key, Value::Int(i) if *i >= 0 && (*i as usize) < v.len())),
        other => Err(Error::type_err(format!(
            "contains? not supported on {}",
            other.type_name()
        ))),
    }
}

/// `peek`: vector tail, list head.
pub fn peek(coll: &Value) -> Result<Value, Error> {
    match coll {
        Value::Nil => Ok(Value::Nil),
        Value::Vector(v) => Ok(v.peek().cloned().unwrap_or(Value::Nil)),
        Value::List(l) => Ok(l.first().cloned().unwrap_or(Value::Nil)),
        other => Err(Error::type_err(format!(
            "peek expects a vector or list, got {}",
            other.type_name()
        ))),
    }
}

/// `pop`: vector drops its tail, list drops its head.
pub fn pop(coll: &Value) -> Result<Value, Error> {
    match coll {
        Value::Vector(v) => Ok(Value::Vector(v.pop()?)),
        Value::List(l) => {
            if l.is_empty() {
                Err(Error::value_err("Can't pop empty list"))
            } else {
                Ok(Value::List(l.rest()))
            }
        }
        other => Err(Error::type_err(format!(
            "pop expects a vector or list, got {}",
            other.type_name()
        ))),
    }
}

/// Realizing equality over two seqable values.
pub fn seq_equiv(a: &Value, b: &Value) -> bool {
    let mut sa = match seq::seq(a) {
        Ok(s) => s,
        Err(_) => return false,
    };
    let mut sb = match seq::seq(b) {
        Ok(s) => s,
        Err(_) => return false,
    };
    loop {
        match (&sa, &sb) {
            (Value::Nil, Value::Nil) => return true,
            (Value::Nil, _) | (_, Value::Nil) => return false,
            _ => {
                let fa = match seq::first(&sa) {
                    Ok(v) => v,
                    Err(_) => return false,
                };
                let fb = match seq::first(&sb) {
                    Ok(v) => v,
                    Err(_) => return false,
                };
                if !eql(&fa, &fb) {
                    return false;
                }
                sa = match seq::next(&sa) {
                    Ok(v) => v,
                    Err(_) => return false,
                };
                sb = match seq::next(&sb) {
                    Ok(v) => v,
                    Err(_) => return false,
                };
            }
        }
    }
}
