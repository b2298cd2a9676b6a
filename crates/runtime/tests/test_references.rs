//! Reference-type contracts driven through the shared pool
//!
//! Atom validators and watcher logs, delay exception memoization,
//! promise/future timeout deref, agent failure and restart cycles.

use clove_runtime::core::refs::atom::Atom;
use clove_runtime::core::refs::delay::Delay;
use clove_runtime::core::refs::future::Promise;
use clove_runtime::core::refs::{self, agent::Agent};
use clove_runtime::{deref, deref_timeout, eql, Error, Value};
use parking_lot::Mutex;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn pos_pred() -> Value {
    Value::fn_val(None, |args| {
        clove_runtime::core::num::compare::gt(&args[0], &Value::Int(0)).map(Value::Bool)
    })
}

fn inc_fn() -> Value {
    Value::fn_val(None, |args| {
        clove_runtime::core::num::arith::add(&args[0], &Value::Int(1))
    })
}

#[test]
fn atom_with_validator_scenario() {
    let a = Atom::new_value(Value::Int(0));
    // Install pos? while the value is 0: rejected.
    if let Value::Atom(inner) = &a {
        assert!(inner.set_validator(Some(pos_pred())).is_err());
    }
    clove_runtime::core::refs::atom::reset(&a, Value::Int(1)).unwrap();
    if let Value::Atom(inner) = &a {
        inner.set_validator(Some(pos_pred())).unwrap();
    }

    assert_eq!(
        clove_runtime::core::refs::atom::reset(&a, Value::Int(5)).unwrap(),
        Value::Int(5)
    );
    assert_eq!(deref(&a).unwrap(), Value::Int(5));

    let err = clove_runtime::core::refs::atom::reset(&a, Value::Int(-1)).unwrap_err();
    assert_eq!(err.message, "Invalid reference state");
    assert!(err.thrown.is_some());
    assert_eq!(deref(&a).unwrap(), Value::Int(5));
}

#[test]
fn watcher_log_is_a_prefix_correct_update_history() {
    let a = Atom::new_value(Value::Int(0));
    let log: Arc<Mutex<Vec<(Value, Value)>>> = Arc::new(Mutex::new(Vec::new()));
    let log2 = Arc::clone(&log);
    if let Value::Atom(inner) = &a {
        inner
            .add_watch(
                Value::keyword(None, "log"),
                Value::fn_val(None, move |args: &[Value]| {
                    log2.lock().push((args[2].clone(), args[3].clone()));
                    Ok(Value::Nil)
                }),
            )
            .unwrap();
    }

    for _ in 0..5 {
        clove_runtime::core::refs::atom::swap(&a, &inc_fn(), &[]).unwrap();
    }

    let entries = log.lock().clone();
    assert_eq!(entries.len(), 5);
    // Each notification's old state is the previous notification's new
    // state: a prefix-correct log.
    for (i, (old, new)) in entries.iter().enumerate() {
        assert!(eql(old, &Value::Int(i as i64)));
        assert!(eql(new, &Value::Int(i as i64 + 1)));
    }
}

#[test]
fn delay_memoizes_exception_without_rerunning() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    let d = Delay::new_value(Value::fn_val(None, |_| {
        CALLS.fetch_add(1, Ordering::SeqCst);
        Err(Error::value_err("boom"))
    }));

    assert_eq!(deref(&d).unwrap_err().message, "boom");
    assert_eq!(deref(&d).unwrap_err().message, "boom");
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    assert!(refs::is_realized(&d).unwrap());
}

#[test]
fn promise_timeout_scenario() {
    // (deref (promise) 10 :timeout) => :timeout after >= 10 ms
    let p = Promise::new_value();
    let start = Instant::now();
    let v = deref_timeout(&p, 10, &Value::keyword(None, "timeout")).unwrap();
    assert!(start.elapsed() >= Duration::from_millis(10));
    assert_eq!(v, Value::keyword(None, "timeout"));
}

#[test]
#[serial]
fn future_runs_on_pool_and_supports_timeout() {
    let f = clove_runtime::future_call(Value::fn_val(None, |_| {
        std::thread::sleep(Duration::from_millis(40));
        Ok(Value::Int(7))
    }))
    .unwrap();
    let miss = deref_timeout(&f, 5, &Value::keyword(None, "late")).unwrap();
    assert_eq!(miss, Value::keyword(None, "late"));
    assert_eq!(deref(&f).unwrap(), Value::Int(7));
    assert_eq!(
        clove_runtime::future_done(&f).unwrap(),
        Value::Bool(true)
    );
}

#[test]
#[serial]
fn agent_error_mode_fail_scenario() {
    let a = Agent::new_value(Value::Int(0));
    clove_runtime::send(
        &a,
        Value::fn_val(None, |_| Err(Error::value_err("agent action failed"))),
        vec![],
    )
    .unwrap();
    clove_runtime::await_agents(std::slice::from_ref(&a)).unwrap();

    // (send a inc) now raises.
    let err = clove_runtime::send(&a, inc_fn(), vec![]).unwrap_err();
    assert_eq!(err.message, "Agent is failed, needs restart");

    // After (restart-agent a 0), sends succeed again.
    clove_runtime::restart_agent(&a, Value::Int(0), true).unwrap();
    clove_runtime::send(&a, inc_fn(), vec![]).unwrap();
    clove_runtime::await_agents(std::slice::from_ref(&a)).unwrap();
    assert_eq!(deref(&a).unwrap(), Value::Int(1));
}

#[test]
#[serial]
fn agent_actions_observe_sequential_states() {
    let a = Agent::new_value(Value::vector(vec![]));
    // Each action conjes the count it observed; a correct FIFO yields
    // [0 1 2 ... n-1].
    for _ in 0..20 {
        clove_runtime::send(
            &a,
            Value::fn_val(None, |args| {
                let n = clove_runtime::core::coll::seq::count(&args[0])?;
                clove_runtime::core::coll::conj(&args[0], Value::Int(n))
            }),
            vec![],
        )
        .unwrap();
    }
    clove_runtime::await_agents(std::slice::from_ref(&a)).unwrap();
    let expected = Value::vector((0..20).map(Value::Int).collect());
    assert!(eql(&deref(&a).unwrap(), &expected));
}

#[test]
#[serial]
fn concurrent_swaps_are_linearizable() {
    let a = Atom::new_value(Value::Int(0));
    let threads: Vec<_> = (0..8)
        .map(|_| {
            let a = a.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    clove_runtime::core::refs::atom::swap(
                        &a,
                        &Value::fn_val(None, |args| {
                            clove_runtime::core::num::arith::add(&args[0], &Value::Int(1))
                        }),
                        &[],
                    )
                    .unwrap();
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }
    assert_eq!(deref(&a).unwrap(), Value::Int(800));
}
