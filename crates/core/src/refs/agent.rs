//! Agents
//!
//! An agent owns a FIFO action queue served by the shared worker pool.
//! The inner record mixes a mutex (state + queue), a condition variable
//! (await), and an atomic processing flag; this is the one place where
//! shared interior mutability is unavoidable, so it lives behind the
//! handle's `Arc` and is never treated as a plain value.
//!
//! Invariants:
//! - At most one worker drains an agent at a time (the processing flag
//!   is claimed and released only under the mutex).
//! - Actions observe states in enqueue order: the single drain worker
//!   pops, applies, installs, then pops the next.
//! - A failed agent (error mode `fail` with an error set) refuses new
//!   sends until restarted.

use crate::error::Error;
use crate::value::{apply, Value};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    Continue,
    Fail,
}

/// One queued `(f, args...)` pair.
#[derive(Debug)]
pub struct AgentAction {
    pub func: Value,
    pub args: Vec<Value>,
}

#[derive(Debug)]
struct AgentState {
    state: Value,
    error: Option<Value>,
    error_handler: Option<Value>,
    error_mode: ErrorMode,
    queue: VecDeque<AgentAction>,
}

#[derive(Debug)]
pub struct Agent {
    mu: Mutex<AgentState>,
    await_cond: Condvar,
    processing: AtomicBool,
}

impl Agent {
    pub fn new(initial: Value) -> Agent {
        Agent {
            mu: Mutex::new(AgentState {
                state: initial,
                error: None,
                error_handler: None,
                error_mode: ErrorMode::Fail,
                queue: VecDeque::new(),
            }),
            await_cond: Condvar::new(),
            processing: AtomicBool::new(false),
        }
    }

    pub fn new_value(initial: Value) -> Value {
        Value::Agent(Arc::new(Agent::new(initial)))
    }

    pub fn deref(&self) -> Value {
        self.mu.lock().state.clone()
    }

    pub fn error(&self) -> Option<Value> {
        self.mu.lock().error.clone()
    }

    pub fn error_mode(&self) -> ErrorMode {
        self.mu.lock().error_mode
    }

    pub fn set_error_mode(&self, mode: ErrorMode) {
        self.mu.lock().error_mode = mode;
    }

    pub fn error_handler(&self) -> Option<Value> {
        self.mu.lock().error_handler.clone()
    }

    pub fn set_error_handler(&self, handler: Option<Value>) {
        self.mu.lock().error_handler = handler;
    }

    fn failed(st: &AgentState) -> bool {
        st.error.is_some() && st.error_mode == ErrorMode::Fail
    }

    /// Enqueue an action. Returns `true` when the caller must schedule a
    /// drain worker (the processing flag transitioned false -> true).
    pub fn enqueue(&self, action: AgentAction) -> Result<bool, Error> {
        let mut st = self.mu.lock();
        if Self::failed(&st) {
            return Err(Error::value_err("Agent is failed, needs restart"));
        }
        st.queue.push_back(action);
        Ok(!self.processing.swap(true, Ordering::AcqRel))
    }

    /// Drain the queue; runs on a pool worker. `handle` is the agent as
    /// a language value, passed to error handlers.
    pub fn drain(handle: &Value) {
        let agent = match handle {
            Value::Agent(a) => a,
            _ => return,
        };
        loop {
            let (action, current) = {
                let mut st = agent.mu.lock();
                if Self::failed(&st) || st.queue.is_empty() {
                    agent.processing.store(false, Ordering::Release);
                    agent.await_cond.notify_all();
                    return;
                }
                let action = st.queue.pop_front().expect("queue checked non-empty");
                (action, st.state.clone())
            };

            let mut call_args = Vec::with_capacity(action.args.len() + 1);
            call_args.push(current);
            call_args.extend(action.args);

            match apply(&action.func, &call_args) {
                Ok(new_state) => {
                    agent.mu.lock().state = new_state;
                }
                Err(e) => {
                    let err_val = e.to_value();
                    let handler = {
                        let mut st = agent.mu.lock();
                        match st.error_mode {
                            ErrorMode::Fail => {
                                st.error = Some(err_val.clone());
                                None
                            }
                            ErrorMode::Continue => st.error_handler.clone(),
                        }
                    };
                    if let Some(h) = handler {
                        // A failing handler is ignored; the agent keeps
                        // draining.
                        let _ = apply(&h, &[handle.clone(), err_val]);
                    }
                }
            }
        }
    }

    fn quiesced(&self, st: &AgentState) -> bool {
        st.queue.is_empty() && !self.processing.load(Ordering::Acquire)
    }

    /// Block until the queue is empty and no worker is processing.
    pub fn await_quiesced(&self) {
        let mut st = self.mu.lock();
        while !self.quiesced(&st) {
            self.await_cond.wait(&mut st);
        }
    }

    /// Bounded wait; `false` on timeout.
    pub fn await_quiesced_until(&self, deadline: Instant) -> bool {
        let mut st = self.mu.lock();
        while !self.quiesced(&st) {
            if self.await_cond.wait_until(&mut st, deadline).timed_out() {
                return self.quiesced(&st);
            }
        }
        true
    }

    /// Clear the error and install a new state. Returns `true` when the
    /// caller must schedule a drain for actions queued before the
    /// failure.
    pub fn restart(&self, new_state: Value, clear_actions: bool) -> Result<bool, Error> {
        let mut st = self.mu.lock();
        if st.error.is_none() {
            return Err(Error::value_err("Agent does not need a restart"));
        }
        st.error = None;
        st.state = new_state;
        if clear_actions {
            st.queue.clear();
        }
        Ok(!st.queue.is_empty() && !self.processing.swap(true, Ordering::AcqRel))
    }
}

/// Convenience used by tests and the runtime's bounded await.
pub fn await_for_deadline(ms: u64) -> Instant {
    Instant::now() + Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_claims_processing_once() {
        let a = Agent::new(Value::Int(0));
        let noop = Value::fn_val(None, |args| Ok(args[0].clone()));
        assert!(a
            .enqueue(AgentAction {
                func: noop.clone(),
                args: vec![],
            })
            .unwrap());
        // Second enqueue while "processing": no new worker needed.
        assert!(!a
            .enqueue(AgentAction {
                func: noop,
                args: vec![],
            })
            .unwrap());
    }

    #[test]
    fn test_drain_applies_actions_in_order() {
        let handle = Agent::new_value(Value::vector(vec![]));
        if let Value::Agent(a) = &handle {
            for i in 0..3 {
                let claim = a
                    .enqueue(AgentAction {
                        func: Value::fn_val(None, |args| {
                            crate::coll::conj(&args[0], args[1].clone())
                        }),
                        args: vec![Value::Int(i)],
                    })
                    .unwrap();
                let _ = claim;
            }
            Agent::drain(&handle);
            assert_eq!(
                a.deref(),
                Value::vector(vec![Value::Int(0), Value::Int(1), Value::Int(2)])
            );
            a.await_quiesced();
        }
    }

    #[test]
    fn test_fail_mode_stops_and_refuses_sends() {
        let handle = Agent::new_value(Value::Int(0));
        let a = match &handle {
            Value::Agent(a) => a,
            _ => unreachable!(),
        };
        a.enqueue(AgentAction {
            func: Value::fn_val(None, |_| Err(Error::value_err("boom"))),
            args: vec![],
        })
        .unwrap();
        a.enqueue(AgentAction {
            func: Value::fn_val(None, |args| crate::num::arith::add(&args[0], &Value::Int(1))),
            args: vec![],
        })
        .unwrap();
        Agent::drain(&handle);

        assert!(a.error().is_some());
        let err = a
            .enqueue(AgentAction {
                func: Value::fn_val(None, |args| Ok(args[0].clone())),
                args: vec![],
            })
            .unwrap_err();
        assert_eq!(err.message, "Agent is failed, needs restart");
        // The queued increment never ran.
        assert_eq!(a.deref(), Value::Int(0));
    }

    #[test]
    fn test_restart_resumes_queued_actions() {
        let handle = Agent::new_value(Value::Int(0));
        let a = match &handle {
            Value::Agent(a) => a,
            _ => unreachable!(),
        };
        a.enqueue(AgentAction {
            func: Value::fn_val(None, |_| Err(Error::value_err("boom"))),
            args: vec![],
        })
        .unwrap();
        a.enqueue(AgentAction {
            func: Value::fn_val(None, |args| crate::num::arith::add(&args[0], &Value::Int(5))),
            args: vec![],
        })
        .unwrap();
        Agent::drain(&handle);
        assert!(a.error().is_some());

        // Restart keeps the queued action and asks for a new drain.
        assert!(a.restart(Value::Int(100), false).unwrap());
        Agent::drain(&handle);
        assert_eq!(a.deref(), Value::Int(105));
        assert!(a.error().is_none());
        assert!(a.restart(Value::Int(0), false).is_err());
    }

    #[test]
    fn test_continue_mode_calls_handler_and_keeps_going() {
        let handle = Agent::new_value(Value::Int(0));
        let a = match &handle {
            Value::Agent(a) => a,
            _ => unreachable!(),
        };
        a.set_error_mode(ErrorMode::Continue);
        let seen = Arc::new(Mutex::new(Vec::<Value>::new()));
        let seen2 = Arc::clone(&seen);
        a.set_error_handler(Some(Value::fn_val(None, move |args: &[Value]| {
            seen2.lock().push(args[1].clone());
            Ok(Value::Nil)
        })));

        a.enqueue(AgentAction {
            func: Value::fn_val(None, |_| Err(Error::value_err("oops"))),
            args: vec![],
        })
        .unwrap();
        a.enqueue(AgentAction {
            func: Value::fn_val(None, |args| crate::num::arith::add(&args[0], &Value::Int(3))),
            args: vec![],
        })
        .unwrap();
        Agent::drain(&handle);

        assert_eq!(a.deref(), Value::Int(3));
        assert!(a.error().is_none());
        assert_eq!(seen.lock().len(), 1);
    }
}
