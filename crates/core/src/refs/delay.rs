//! Delays
//!
//! A memoized nullary thunk. The first force runs the thunk exactly
//! once and caches the outcome, success or failure; later forces replay
//! the cached value or re-raise the cached error without re-running
//! anything. Concurrent forcers serialize on the cell lock, so exactly
//! one invocation occurs.

use crate::error::Error;
use crate::value::{apply, Value};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
enum DelayState {
    Pending(Value),
    Value(Value),
    Error(Error),
}

#[derive(Debug)]
pub struct Delay {
    cell: Mutex<DelayState>,
}

impl Delay {
    pub fn new(thunk: Value) -> Delay {
        Delay {
            cell: Mutex::new(DelayState::Pending(thunk)),
        }
    }

    pub fn new_value(thunk: Value) -> Value {
        Value::Delay(Arc::new(Delay::new(thunk)))
    }

    pub fn force(&self) -> Result<Value, Error> {
        let mut guard = self.cell.lock();
        match &*guard {
            DelayState::Value(v) => Ok(v.clone()),
            DelayState::Error(e) => Err(e.clone()),
            DelayState::Pending(_) => {
                // Take the thunk out; whatever happens it is released.
                let thunk = match std::mem::replace(&mut *guard, DelayState::Value(Value::Nil)) {
                    DelayState::Pending(t) => t,
                    _ => unreachable!(),
                };
                match apply(&thunk, &[]) {
                    Ok(v) => {
                        *guard = DelayState::Value(v.clone());
                        Ok(v)
                    }
                    Err(e) => {
                        *guard = DelayState::Error(e.clone());
                        Err(e)
                    }
                }
            }
        }
    }

    pub fn is_realized(&self) -> bool {
        !matches!(&*self.cell.lock(), DelayState::Pending(_))
    }
}
