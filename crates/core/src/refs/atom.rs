//! Atoms
//!
//! A single value under exclusive write, with an optional validator and
//! up to [`MAX_WATCHERS`] watchers fired in insertion order after every
//! transition. Writers serialize on the state lock and the update
//! function runs once per `swap!`; watcher notification happens after
//! the lock is released, so notifications for distinct updates may
//! interleave while the notifications for one update stay ordered.

use crate::error::Error;
use crate::value::{apply, Value};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Watcher capacity per atom.
pub const MAX_WATCHERS: usize = 16;

#[derive(Debug)]
pub struct Atom {
    state: RwLock<Value>,
    validator: RwLock<Option<Value>>,
    watchers: Mutex<Vec<(Value, Value)>>,
}

/// The catchable rejection raised when a validator refuses a value.
pub fn invalid_state_error() -> Error {
    let info = Value::array_map(vec![(
        Value::keyword(None, "message"),
        Value::string("Invalid reference state"),
    )]);
    Error::user("Invalid reference state", info)
}

impl Atom {
    pub fn new(v: Value) -> Atom {
        Atom {
            state: RwLock::new(v),
            validator: RwLock::new(None),
            watchers: Mutex::new(Vec::new()),
        }
    }

    /// Construct the atom as a language value.
    pub fn new_value(v: Value) -> Value {
        Value::Atom(Arc::new(Atom::new(v)))
    }

    pub fn deref(&self) -> Value {
        self.state.read().clone()
    }

    /// Check a candidate value against the validator: falsey or a thrown
    /// error rejects.
    fn validate(&self, candidate: &Value) -> Result<(), Error> {
        let validator = self.validator.read().clone();
        if let Some(f) = validator {
            match apply(&f, &[candidate.clone()]) {
                Ok(v) if v.is_truthy() => {}
                _ => return Err(invalid_state_error()),
            }
        }
        Ok(())
    }

    /// Install a validator; the current value must satisfy it.
    pub fn set_validator(&self, f: Option<Value>) -> Result<(), Error> {
        if let Some(validator) = &f {
            let current = self.deref();
            match apply(validator, &[current]) {
                Ok(v) if v.is_truthy() => {}
                _ => return Err(invalid_state_error()),
            }
        }
        *self.validator.write() = f;
        Ok(())
    }

    pub fn get_validator(&self) -> Option<Value> {
        self.validator.read().clone()
    }

    /// Register a watcher, replacing any existing watcher with an equal
    /// key.
    pub fn add_watch(&self, key: Value, f: Value) -> Result<(), Error> {
        let mut watchers = self.watchers.lock();
        if let Some(slot) = watchers
            .iter_mut()
            .find(|(k, _)| crate::equality::eql(k, &key))
        {
            slot.1 = f;
            return Ok(());
        }
        if watchers.len() >= MAX_WATCHERS {
            return Err(Error::value_err(format!(
                "Watcher limit exceeded ({MAX_WATCHERS})"
            )));
        }
        watchers.push((key, f));
        Ok(())
    }

    pub fn remove_watch(&self, key: &Value) {
        self.watchers
            .lock()
            .retain(|(k, _)| !crate::equality::eql(k, key));
    }

    fn watcher_snapshot(&self) -> Vec<(Value, Value)> {
        self.watchers.lock().clone()
    }
}

fn as_atom<'a>(v: &'a Value, op: &str) -> Result<&'a Arc<Atom>, Error> {
    match v {
        Value::Atom(a) => Ok(a),
        other => Err(Error::type_err(format!(
            "{op} expects an atom, got {}",
            other.type_name()
        ))),
    }
}

/// Validate, install, and notify; returns `(old, new)`.
fn transition<F>(handle: &Value, atom: &Arc<Atom>, compute: F) -> Result<(Value, Value), Error>
where
    F: FnOnce(&Value) -> Result<Value, Error>,
{
    let (old, new) = {
        let mut guard = atom.state.write();
        let old = (*guard).clone();
        let new = compute(&old)?;
        atom.validate(&new)?;
        *guard = new.clone();
        (old, new)
    };
    for (key, watcher) in atom.watcher_snapshot() {
        apply(&watcher, &[key, handle.clone(), old.clone(), new.clone()])?;
    }
    Ok((old, new))
}

/// `reset!`
pub fn reset(handle: &Value, v: Value) -> Result<Value, Error> {
    let atom = as_atom(handle, "reset!")?;
    let (_, new) = transition(handle, atom, |_| Ok(v))?;
    Ok(new)
}

/// `reset-vals!`: `[old new]`.
pub fn reset_vals(handle: &Value, v: Value) -> Result<Value, Error> {
    let atom = as_atom(handle, "reset-vals!")?;
    let (old, new) = transition(handle, atom, |_| Ok(v))?;
    Ok(Value::vector(vec![old, new]))
}

/// `swap!`: apply `f` to the current value (and extra args).
pub fn swap(handle: &Value, f: &Value, args: &[Value]) -> Result<Value, Error> {
    let atom = as_atom(handle, "swap!")?;
    let (_, new) = transition(handle, atom, |old| {
        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(old.clone());
        call_args.extend_from_slice(args);
        apply(f, &call_args)
    })?;
    Ok(new)
}

/// `swap-vals!`: `[old new]`.
pub fn swap_vals(handle: &Value, f: &Value, args: &[Value]) -> Result<Value, Error> {
    let atom = as_atom(handle, "swap-vals!")?;
    let (old, new) = transition(handle, atom, |old| {
        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(old.clone());
        call_args.extend_from_slice(args);
        apply(f, &call_args)
    })?;
    Ok(Value::vector(vec![old, new]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PMutex;

    fn pos_pred() -> Value {
        Value::fn_val(None, |args| match &args[0] {
            Value::Int(i) => Ok(Value::Bool(*i > 0)),
            _ => Ok(Value::Bool(false)),
        })
    }

    #[test]
    fn test_reset_and_deref() {
        let a = Atom::new_value(Value::Int(0));
        assert_eq!(reset(&a, Value::Int(5)).unwrap(), Value::Int(5));
        assert_eq!(crate::refs::deref(&a).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_swap_applies_with_extra_args() {
        let a = Atom::new_value(Value::Int(10));
        let add = Value::fn_val(None, |args| crate::num::arith::add(&args[0], &args[1]));
        let new = swap(&a, &add, &[Value::Int(32)]).unwrap();
        assert_eq!(new, Value::Int(42));
    }

    #[test]
    fn test_vals_variants_return_old_and_new() {
        let a = Atom::new_value(Value::Int(1));
        let pair = reset_vals(&a, Value::Int(2)).unwrap();
        assert_eq!(pair, Value::vector(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn test_validator_rejects_with_invalid_reference_state() {
        let a = Atom::new_value(Value::Int(0));
        // 0 fails pos? so installing must reject
        assert!(match &a {
            Value::Atom(inner) => inner.set_validator(Some(pos_pred())).is_err(),
            _ => false,
        });

        reset(&a, Value::Int(1)).unwrap();
        if let Value::Atom(inner) = &a {
            inner.set_validator(Some(pos_pred())).unwrap();
        }
        assert_eq!(reset(&a, Value::Int(5)).unwrap(), Value::Int(5));
        let err = reset(&a, Value::Int(-1)).unwrap_err();
        assert_eq!(err.message, "Invalid reference state");
        // State unchanged after rejection.
        assert_eq!(crate::refs::deref(&a).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_watchers_fire_in_insertion_order_with_old_and_new() {
        let log: Arc<PMutex<Vec<(Value, Value, Value)>>> = Arc::new(PMutex::new(Vec::new()));
        let a = Atom::new_value(Value::Int(0));

        for name in ["w1", "w2"] {
            let log = Arc::clone(&log);
            let watcher = Value::fn_val(None, move |args: &[Value]| {
                log.lock()
                    .push((args[0].clone(), args[2].clone(), args[3].clone()));
                Ok(Value::Nil)
            });
            if let Value::Atom(inner) = &a {
                inner
                    .add_watch(Value::keyword(None, name), watcher)
                    .unwrap();
            }
        }

        reset(&a, Value::Int(1)).unwrap();
        let entries = log.lock().clone();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, Value::keyword(None, "w1"));
        assert_eq!(entries[1].0, Value::keyword(None, "w2"));
        assert_eq!(entries[0].1, Value::Int(0));
        assert_eq!(entries[0].2, Value::Int(1));
    }

    #[test]
    fn test_watcher_cap() {
        let a = Atom::new(Value::Nil);
        let noop = Value::fn_val(None, |_| Ok(Value::Nil));
        for i in 0..MAX_WATCHERS as i64 {
            a.add_watch(Value::Int(i), noop.clone()).unwrap();
        }
        let err = a.add_watch(Value::Int(99), noop).unwrap_err();
        assert!(err.message.contains("Watcher limit exceeded"));
    }

    #[test]
    fn test_remove_watch_and_key_dedup() {
        let a = Atom::new(Value::Nil);
        let noop = Value::fn_val(None, |_| Ok(Value::Nil));
        a.add_watch(Value::keyword(None, "k"), noop.clone()).unwrap();
        // Same key replaces, does not grow.
        a.add_watch(Value::keyword(None, "k"), noop).unwrap();
        assert_eq!(a.watcher_snapshot().len(), 1);
        a.remove_watch(&Value::keyword(None, "k"));
        assert!(a.watcher_snapshot().is_empty());
    }
}
