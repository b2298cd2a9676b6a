//! The seq protocol
//!
//! `seq` produces a sequence view of any ordered collection: nil when
//! empty, otherwise a value whose first/rest operations are defined
//! (list, cons, or chunked cons). Vectors get a chunked view over their
//! shared buffer without copying; maps and sets materialize their
//! entries at seq time, which fixes the iteration order for the life of
//! that seq instance. Lazy seqs are forced one step.

use crate::coll::lazy::ChunkedCons;
use crate::coll::list::PersistentList;
use crate::error::Error;
use crate::value::Value;
use std::sync::Arc;

/// A sequence view of `v`: nil when empty, else a seq value.
pub fn seq(v: &Value) -> Result<Value, Error> {
    match v {
        Value::Nil => Ok(Value::Nil),
        Value::List(l) => {
            if l.is_empty() {
                Ok(Value::Nil)
            } else {
                Ok(v.clone())
            }
        }
        Value::Cons(_) | Value::ChunkedCons(_) => Ok(v.clone()),
        Value::LazySeq(ls) => {
            // Forcing may yield another lazy seq; unwrap until concrete.
            let mut realized = ls.force()?;
            while let Value::LazySeq(inner) = &realized {
                let next = inner.force()?;
                realized = next;
            }
            seq(&realized)
        }
        Value::Vector(vec) => {
            if vec.is_empty() {
                Ok(Value::Nil)
            } else {
                Ok(Value::ChunkedCons(Arc::new(ChunkedCons::new(
                    Arc::clone(vec.items()),
                    0,
                    Value::Nil,
                ))))
            }
        }
        Value::Map(m) => {
            let entries: Vec<Value> = m
                .iter()
                .map(|(k, val)| Value::vector(vec![k.clone(), val.clone()]))
                .collect();
            Ok(list_or_nil(entries))
        }
        Value::HashMap(m) => {
            let entries: Vec<Value> = m
                .iter()
                .map(|(k, val)| Value::vector(vec![k.clone(), val.clone()]))
                .collect();
            Ok(list_or_nil(entries))
        }
        Value::Set(s) => Ok(list_or_nil(s.iter().cloned().collect())),
        Value::Str(s) => Ok(list_or_nil(s.chars().map(Value::Char).collect())),
        Value::Array(a) => Ok(list_or_nil(a.to_vec())),
        other => Err(Error::type_err(format!(
            "Don't know how to create ISeq from: {}",
            other.type_name()
        ))),
    }
}

fn list_or_nil(items: Vec<Value>) -> Value {
    if items.is_empty() {
        Value::Nil
    } else {
        Value::List(PersistentList::from_vec(items))
    }
}

pub fn first(v: &Value) -> Result<Value, Error> {
    match seq(v)? {
        Value::Nil => Ok(Value::Nil),
        Value::List(l) => Ok(l.first().cloned().unwrap_or(Value::Nil)),
        Value::Cons(c) => Ok(c.first.clone()),
        Value::ChunkedCons(cc) => Ok(cc.first().clone()),
        other => Err(Error::internal(format!(
            "seq produced a non-seq value: {}",
            other.type_name()
        ))),
    }
}

/// The sequence after the first element; an empty list at the end.
/// Does not force a lazy tail.
pub fn rest(v: &Value) -> Result<Value, Error> {
    let tail = match seq(v)? {
        Value::Nil => Value::Nil,
        Value::List(l) => Value::List(l.rest()),
        Value::Cons(c) => c.rest.clone(),
        Value::ChunkedCons(cc) => cc.advance(),
        other => {
            return Err(Error::internal(format!(
                "seq produced a non-seq value: {}",
                other.type_name()
            )))
        }
    };
    match tail {
        Value::Nil => Ok(Value::empty_list()),
        Value::List(l) if l.is_empty() => Ok(Value::empty_list()),
        other => Ok(other),
    }
}

/// Like `rest` but realizes one step: nil at the end instead of `()`.
pub fn next(v: &Value) -> Result<Value, Error> {
    seq(&rest(v)?)
}

/// Element count; realizes lazy sequences.
pub fn count(v: &Value) -> Result<i64, Error> {
    match v {
        Value::Nil => Ok(0),
        Value::List(l) => Ok(l.len() as i64),
        Value::Vector(vec) => Ok(vec.len() as i64),
        Value::Map(m) => Ok(m.len() as i64),
        Value::HashMap(m) => Ok(m.len() as i64),
        Value::Set(s) => Ok(s.len() as i64),
        Value::Str(s) => Ok(s.chars().count() as i64),
        Value::Array(a) => Ok(a.len() as i64),
        _ => {
            let mut n: i64 = 0;
            let mut cur = seq(v)?;
            loop {
                match cur {
                    Value::Nil => return Ok(n),
                    Value::ChunkedCons(cc) => {
                        n += cc.chunk_count() as i64;
                        cur = seq(&cc.advance_chunk())?;
                    }
                    other => {
                        n += 1;
                        cur = next(&other)?;
                    }
                }
            }
        }
    }
}

/// Fully realize a seqable value into a vector of elements.
pub fn to_vec(v: &Value) -> Result<Vec<Value>, Error> {
    let mut out = Vec::new();
    let mut cur = seq(v)?;
    loop {
        match cur {
            Value::Nil => return Ok(out),
            Value::ChunkedCons(cc) => {
                for i in 0..cc.chunk_count() {
                    out.push(cc.chunk_nth(i).cloned().unwrap_or(Value::Nil));
                }
                cur = seq(&cc.advance_chunk())?;
            }
            other => {
                out.push(first(&other)?);
                cur = next(&other)?;
            }
        }
    }
}
