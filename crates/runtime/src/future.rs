//! Futures on the shared pool
//!
//! `future_call` submits a nullary function and returns the future
//! handle. The worker stores the outcome (value, error, or formatted
//! panic) in the shared cell; cancellation only wins while the task is
//! still pending, and a cancelled task's body is skipped if the worker
//! has not started it yet.

use crate::pool;
use clove_core::error::{format_panic_payload, Error};
use clove_core::refs::future::Future;
use clove_core::value::{apply, Value};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// `future-call`: run `f` on the pool, returning a future.
pub fn future_call(f: Value) -> Result<Value, Error> {
    let fut = Arc::new(Future::new(f.clone()));
    let cell = Arc::clone(&fut.cell);
    pool::submit(move || {
        // Cancelled before we got scheduled: nothing to run.
        if !cell.should_run() {
            return;
        }
        let result = match catch_unwind(AssertUnwindSafe(|| apply(&f, &[]))) {
            Ok(r) => r,
            Err(payload) => Err(Error::internal(format_panic_payload(&payload))),
        };
        if let Err(e) = &result {
            tracing::debug!(error = %e, "future completed with error");
        }
        cell.complete(result);
    })?;
    Ok(Value::Future(fut))
}

fn as_future<'a>(v: &'a Value, op: &str) -> Result<&'a Arc<Future>, Error> {
    match v {
        Value::Future(f) => Ok(f),
        other => Err(Error::type_err(format!(
            "{op} expects a future, got {}",
            other.type_name()
        ))),
    }
}

/// `future-cancel`: true when the cancellation won.
pub fn future_cancel(v: &Value) -> Result<Value, Error> {
    Ok(Value::Bool(as_future(v, "future-cancel")?.cancel()))
}

/// `future-done?`
pub fn future_done(v: &Value) -> Result<Value, Error> {
    Ok(Value::Bool(as_future(v, "future-done?")?.is_done()))
}

/// `future-cancelled?`
pub fn future_cancelled(v: &Value) -> Result<Value, Error> {
    Ok(Value::Bool(as_future(v, "future-cancelled?")?.is_cancelled()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clove_core::refs::{deref, deref_timeout};
    use serial_test::serial;
    use std::time::Duration;

    #[test]
    #[serial]
    fn test_future_computes_and_derefs() {
        let f = future_call(Value::fn_val(None, |_| Ok(Value::Int(21)))).unwrap();
        assert_eq!(deref(&f).unwrap(), Value::Int(21));
        assert_eq!(future_done(&f).unwrap(), Value::Bool(true));
        assert_eq!(future_cancelled(&f).unwrap(), Value::Bool(false));
    }

    #[test]
    #[serial]
    fn test_future_stores_error() {
        let f = future_call(Value::fn_val(None, |_| {
            Err(Error::value_err("worker boom"))
        }))
        .unwrap();
        let err = deref(&f).unwrap_err();
        assert_eq!(err.message, "worker boom");
    }

    #[test]
    #[serial]
    fn test_future_timeout_then_completion() {
        let f = future_call(Value::fn_val(None, |_| {
            std::thread::sleep(Duration::from_millis(50));
            Ok(Value::Int(1))
        }))
        .unwrap();
        let timeout = Value::keyword(None, "timeout");
        assert_eq!(deref_timeout(&f, 5, &timeout).unwrap(), timeout);
        assert_eq!(deref(&f).unwrap(), Value::Int(1));
    }

    #[test]
    #[serial]
    fn test_cancel_pending_future() {
        // A slow job occupies the cell; cancel while pending wins only
        // if the worker has not completed it.
        let f = future_call(Value::fn_val(None, |_| {
            std::thread::sleep(Duration::from_millis(30));
            Ok(Value::Int(1))
        }))
        .unwrap();
        let won = matches!(future_cancel(&f).unwrap(), Value::Bool(true));
        if won {
            assert_eq!(future_cancelled(&f).unwrap(), Value::Bool(true));
            assert_eq!(future_done(&f).unwrap(), Value::Bool(true));
            assert!(deref(&f).is_err());
        }
        // Cancelling a finished future never succeeds.
        let done = future_call(Value::fn_val(None, |_| Ok(Value::Int(2)))).unwrap();
        let _ = deref(&done).unwrap();
        assert_eq!(future_cancel(&done).unwrap(), Value::Bool(false));
    }
}
