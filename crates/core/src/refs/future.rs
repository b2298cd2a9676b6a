//! Futures and promises
//!
//! Both are views over a shared `FutureCell`: a state slot plus a
//! condition variable. A future's cell is completed by a pool worker (or
//! cancelled while still pending); a promise's cell is completed
//! explicitly by `deliver`, first writer wins. `deref` blocks on the
//! condition variable, with an optional timeout returning a caller-
//! supplied value.

use crate::error::Error;
use crate::value::Value;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug)]
enum CellState {
    Pending,
    Done(Result<Value, Error>),
    Cancelled,
}

#[derive(Debug)]
pub struct FutureCell {
    state: Mutex<CellState>,
    cond: Condvar,
}

fn cancelled_error() -> Error {
    Error::value_err("Future was cancelled")
}

impl FutureCell {
    pub fn new() -> FutureCell {
        FutureCell {
            state: Mutex::new(CellState::Pending),
            cond: Condvar::new(),
        }
    }

    /// Complete the cell. The first writer wins; later completions are
    /// ignored (a worker racing a cancellation, a second deliver).
    pub fn complete(&self, result: Result<Value, Error>) -> bool {
        let mut guard = self.state.lock();
        if matches!(&*guard, CellState::Pending) {
            *guard = CellState::Done(result);
            self.cond.notify_all();
            true
        } else {
            false
        }
    }

    /// Cancel iff still pending.
    pub fn cancel(&self) -> bool {
        let mut guard = self.state.lock();
        if matches!(&*guard, CellState::Pending) {
            *guard = CellState::Cancelled;
            self.cond.notify_all();
            true
        } else {
            false
        }
    }

    pub fn is_done(&self) -> bool {
        !matches!(&*self.state.lock(), CellState::Pending)
    }

    /// Worker-side check before running the task body.
    pub fn should_run(&self) -> bool {
        matches!(&*self.state.lock(), CellState::Pending)
    }

    /// Block until completion.
    pub fn wait(&self) -> Result<Value, Error> {
        let mut guard = self.state.lock();
        loop {
            match &*guard {
                CellState::Pending => self.cond.wait(&mut guard),
                CellState::Done(result) => return result.clone(),
                CellState::Cancelled => return Err(cancelled_error()),
            }
        }
    }

    /// Block up to `timeout_ms`; on timeout return `timeout_val`.
    pub fn wait_timeout(&self, timeout_ms: u64, timeout_val: &Value) -> Result<Value, Error> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut guard = self.state.lock();
        loop {
            match &*guard {
                CellState::Done(result) => return result.clone(),
                CellState::Cancelled => return Err(cancelled_error()),
                CellState::Pending => {
                    if self.cond.wait_until(&mut guard, deadline).timed_out() {
                        return match &*guard {
                            CellState::Done(result) => result.clone(),
                            CellState::Cancelled => Err(cancelled_error()),
                            CellState::Pending => Ok(timeout_val.clone()),
                        };
                    }
                }
            }
        }
    }
}

impl Default for FutureCell {
    fn default() -> Self {
        FutureCell::new()
    }
}

/// Handle for a task submitted to the shared pool.
#[derive(Debug)]
pub struct Future {
    pub cell: Arc<FutureCell>,
    pub func: Value,
    cancelled: AtomicBool,
}

impl Future {
    pub fn new(func: Value) -> Future {
        Future {
            cell: Arc::new(FutureCell::new()),
            func,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Cancel succeeds only while the task is still pending.
    pub fn cancel(&self) -> bool {
        if self.cell.cancel() {
            self.cancelled.store(true, Ordering::Release);
            true
        } else {
            false
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn is_done(&self) -> bool {
        self.cell.is_done()
    }
}

/// Explicitly delivered single-assignment cell.
#[derive(Debug)]
pub struct Promise {
    cell: Arc<FutureCell>,
}

impl Promise {
    pub fn new() -> Promise {
        Promise {
            cell: Arc::new(FutureCell::new()),
        }
    }

    pub fn new_value() -> Value {
        Value::Promise(Arc::new(Promise::new()))
    }

    /// Set the value at most once; a repeat delivery is silently
    /// ignored.
    pub fn deliver(&self, v: Value) -> bool {
        self.cell.complete(Ok(v))
    }

    pub fn is_realized(&self) -> bool {
        self.cell.is_done()
    }

    pub fn wait(&self) -> Result<Value, Error> {
        self.cell.wait()
    }

    pub fn wait_timeout(&self, timeout_ms: u64, timeout_val: &Value) -> Result<Value, Error> {
        self.cell.wait_timeout(timeout_ms, timeout_val)
    }
}

impl Default for Promise {
    fn default() -> Self {
        Promise::new()
    }
}

/// `deliver`
pub fn deliver(handle: &Value, v: Value) -> Result<Value, Error> {
    match handle {
        Value::Promise(p) => {
            p.deliver(v);
            Ok(handle.clone())
        }
        other => Err(Error::type_err(format!(
            "deliver expects a promise, got {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promise_deliver_then_deref() {
        let p = Promise::new();
        assert!(!p.is_realized());
        assert!(p.deliver(Value::Int(5)));
        assert!(p.is_realized());
        assert_eq!(p.wait().unwrap(), Value::Int(5));
    }

    #[test]
    fn test_promise_first_writer_wins() {
        let p = Promise::new();
        assert!(p.deliver(Value::Int(1)));
        assert!(!p.deliver(Value::Int(2)));
        assert_eq!(p.wait().unwrap(), Value::Int(1));
    }

    #[test]
    fn test_deref_timeout_returns_timeout_val() {
        let p = Promise::new();
        let start = Instant::now();
        let v = p
            .wait_timeout(10, &Value::keyword(None, "timeout"))
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(10));
        assert_eq!(v, Value::keyword(None, "timeout"));
    }

    #[test]
    fn test_deliver_unblocks_waiter() {
        let p = Arc::new(Promise::new());
        let p2 = Arc::clone(&p);
        let waiter = std::thread::spawn(move || p2.wait().unwrap());
        std::thread::sleep(Duration::from_millis(5));
        p.deliver(Value::Int(99));
        assert_eq!(waiter.join().unwrap(), Value::Int(99));
    }

    #[test]
    fn test_cancel_only_while_pending() {
        let f = Future::new(Value::Nil);
        assert!(f.cancel());
        assert!(f.is_cancelled());
        assert!(f.is_done());
        assert!(!f.cancel());
        assert!(f.cell.wait().is_err());

        let done = Future::new(Value::Nil);
        done.cell.complete(Ok(Value::Int(1)));
        assert!(!done.cancel());
        assert!(!done.is_cancelled());
    }

    #[test]
    fn test_completed_cell_ignores_late_worker_result() {
        let cell = FutureCell::new();
        assert!(cell.cancel());
        assert!(!cell.complete(Ok(Value::Int(1))));
        assert!(cell.wait().is_err());
    }
}
