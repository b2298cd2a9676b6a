//! Volatiles
//!
//! A single cell with plain store/load semantics: no validators, no
//! watchers. Intended for single-thread iteration state; the lock here
//! only keeps the payload swap itself sound, it promises nothing about
//! cross-thread ordering.

use crate::error::Error;
use crate::value::{apply, Value};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug)]
pub struct Volatile {
    value: RwLock<Value>,
}

impl Volatile {
    pub fn new(v: Value) -> Volatile {
        Volatile {
            value: RwLock::new(v),
        }
    }

    pub fn new_value(v: Value) -> Value {
        Value::Volatile(Arc::new(Volatile::new(v)))
    }

    pub fn deref(&self) -> Value {
        self.value.read().clone()
    }

    pub fn reset(&self, v: Value) -> Value {
        *self.value.write() = v.clone();
        v
    }
}

fn as_volatile<'a>(v: &'a Value, op: &str) -> Result<&'a Arc<Volatile>, Error> {
    match v {
        Value::Volatile(inner) => Ok(inner),
        other => Err(Error::type_err(format!(
            "{op} expects a volatile, got {}",
            other.type_name()
        ))),
    }
}

/// `vreset!`
pub fn vreset(handle: &Value, v: Value) -> Result<Value, Error> {
    Ok(as_volatile(handle, "vreset!")?.reset(v))
}

/// `vswap!`
pub fn vswap(handle: &Value, f: &Value, args: &[Value]) -> Result<Value, Error> {
    let vol = as_volatile(handle, "vswap!")?;
    let mut call_args = Vec::with_capacity(args.len() + 1);
    call_args.push(vol.deref());
    call_args.extend_from_slice(args);
    Ok(vol.reset(apply(f, &call_args)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vreset_and_deref() {
        let v = Volatile::new_value(Value::Int(1));
        assert_eq!(vreset(&v, Value::Int(2)).unwrap(), Value::Int(2));
        assert_eq!(crate::refs::deref(&v).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_vswap() {
        let v = Volatile::new_value(Value::Int(41));
        let inc = Value::fn_val(None, |args| crate::num::arith::add(&args[0], &Value::Int(1)));
        assert_eq!(vswap(&v, &inc, &[]).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_vreset_on_non_volatile() {
        let err = vreset(&Value::Int(1), Value::Nil).unwrap_err();
        assert!(err.message.starts_with("vreset! expects a volatile"));
    }
}
