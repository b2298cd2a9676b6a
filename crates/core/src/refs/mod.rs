//! Reference types
//!
//! The cells themselves (atom, volatile, delay, future, promise, agent)
//! plus the unified `deref` dispatch. Operations that need the shared
//! worker pool (submitting futures, agent sends, await) live in the
//! runtime crate; everything here blocks only on the cell's own lock or
//! condition variable.

pub mod agent;
pub mod atom;
pub mod delay;
pub mod future;
pub mod volatile;

use crate::error::Error;
use crate::value::Value;

/// `deref` / `@`: dispatch on the reference tag. Blocks for unfinished
/// futures, undelivered promises, and unforced delays.
pub fn deref(v: &Value) -> Result<Value, Error> {
    match v {
        Value::Atom(a) => Ok(a.deref()),
        Value::Volatile(vol) => Ok(vol.deref()),
        Value::Var(var) => Ok(var.get()),
        Value::Delay(d) => d.force(),
        Value::Future(f) => f.cell.wait(),
        Value::Promise(p) => p.wait(),
        Value::Agent(a) => Ok(a.deref()),
        other => Err(Error::type_err(format!(
            "Cannot deref {}",
            other.type_name()
        ))),
    }
}

/// `deref` with a timeout; only blocking references support it.
pub fn deref_timeout(v: &Value, timeout_ms: u64, timeout_val: &Value) -> Result<Value, Error> {
    match v {
        Value::Future(f) => f.cell.wait_timeout(timeout_ms, timeout_val),
        Value::Promise(p) => p.wait_timeout(timeout_ms, timeout_val),
        other => Err(Error::type_err(format!(
            "Timed deref expects a future or promise, got {}",
            other.type_name()
        ))),
    }
}

/// `realized?` for delays, lazy seqs, futures, and promises.
pub fn is_realized(v: &Value) -> Result<bool, Error> {
    match v {
        Value::Delay(d) => Ok(d.is_realized()),
        Value::LazySeq(ls) => Ok(ls.is_realized()),
        Value::Future(f) => Ok(f.is_done()),
        Value::Promise(p) => Ok(p.is_realized()),
        other => Err(Error::type_err(format!(
            "realized? expects a delay, lazy seq, future, or promise, got {}",
            other.type_name()
        ))),
    }
}
