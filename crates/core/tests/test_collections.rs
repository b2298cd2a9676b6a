//! Collection layer contracts
//!
//! Persistent-update visibility, transient round trips and
//! use-after-freeze, cross-representation equality, and lazy seq
//! single-realization.

use clove_core::coll::{self, seq, transient};
use clove_core::{eql, hash_value, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn k(name: &str) -> Value {
    Value::keyword(None, name)
}

#[test]
fn persistent_update_leaves_input_observable_unchanged() {
    let v1 = Value::vector(vec![Value::Int(1), Value::Int(2)]);
    let v2 = coll::conj(&v1, Value::Int(3)).unwrap();
    assert_eq!(seq::count(&v1).unwrap(), 2);
    assert_eq!(seq::count(&v2).unwrap(), 3);

    let m1 = Value::array_map(vec![(k("a"), Value::Int(1))]);
    let m2 = coll::assoc(&m1, k("b"), Value::Int(2)).unwrap();
    assert_eq!(coll::get(&m1, &k("b"), &Value::Nil).unwrap(), Value::Nil);
    assert_eq!(coll::get(&m2, &k("b"), &Value::Nil).unwrap(), Value::Int(2));
}

#[test]
fn transient_round_trip_preserves_value() {
    for coll_value in [
        Value::vector(vec![Value::Int(1), Value::Int(2)]),
        Value::array_map(vec![(k("a"), Value::Int(1))]),
        Value::set(vec![Value::Int(1), Value::Int(2)]),
    ] {
        let t = transient::transient(&coll_value).unwrap();
        let back = transient::persistent_bang(&t).unwrap();
        assert!(eql(&back, &coll_value), "round trip of {coll_value}");
    }
}

#[test]
fn transient_finalization_scenario() {
    // (persistent! (assoc! (transient {}) :a 1)) => {:a 1}
    let t = transient::transient(&Value::array_map(vec![])).unwrap();
    let t = transient::assoc_bang(&t, k("a"), Value::Int(1)).unwrap();
    let m = transient::persistent_bang(&t).unwrap();
    assert!(eql(&m, &Value::array_map(vec![(k("a"), Value::Int(1))])));

    // Reusing the transient raises.
    let err = transient::conj_bang(&t, Value::vector(vec![k("b"), Value::Int(2)])).unwrap_err();
    assert_eq!(err.message, "Transient used after persistent!");
}

#[test]
fn cross_type_sequential_equality() {
    let v = Value::vector(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    let l = Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    let s = Value::set(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    assert!(eql(&v, &l));
    assert!(!eql(&v, &s));

    // Cons chains participate in sequential equality too.
    let c = Value::cons(
        Value::Int(1),
        Value::cons(Value::Int(2), Value::list(vec![Value::Int(3)])),
    );
    assert!(eql(&c, &v));
}

#[test]
fn collection_self_equality_and_hash_stability() {
    for v in [
        Value::vector(vec![Value::Int(1), Value::string("two")]),
        Value::array_map(vec![(k("x"), Value::Int(1)), (k("y"), Value::Int(2))]),
        Value::set(vec![k("a"), k("b")]),
    ] {
        assert!(eql(&v, &v));
        assert_eq!(hash_value(&v), hash_value(&v));
    }
}

#[test]
fn lazy_seq_realizes_once_and_is_stable() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    let ls = Value::lazy_seq(Value::fn_val(None, |_| {
        CALLS.fetch_add(1, Ordering::SeqCst);
        Ok(Value::list(vec![Value::Int(1), Value::Int(2)]))
    }));
    let first_pass = seq::to_vec(&ls).unwrap();
    let second_pass = seq::to_vec(&ls).unwrap();
    assert_eq!(first_pass, second_pass);
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_forces_realize_exactly_once() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    let ls = match Value::lazy_seq(Value::fn_val(None, |_| {
        CALLS.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(5));
        Ok(Value::list(vec![Value::Int(9)]))
    })) {
        Value::LazySeq(inner) => inner,
        _ => unreachable!(),
    };
    let threads: Vec<_> = (0..4)
        .map(|_| {
            let ls = Arc::clone(&ls);
            std::thread::spawn(move || ls.force().unwrap())
        })
        .collect();
    let mut results = Vec::new();
    for t in threads {
        results.push(t.join().unwrap());
    }
    assert!(results.windows(2).all(|w| eql(&w[0], &w[1])));
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn chunked_vector_seq_counts_by_chunk() {
    let v = Value::vector((0..100).map(Value::Int).collect());
    let s = seq::seq(&v).unwrap();
    assert!(matches!(s, Value::ChunkedCons(_)));
    assert_eq!(seq::count(&s).unwrap(), 100);
    assert_eq!(seq::first(&s).unwrap(), Value::Int(0));
}

#[test]
fn map_seq_order_is_stable_within_one_instance() {
    let m = Value::hash_map(
        (0..20)
            .map(|i| (Value::Int(i), Value::Int(i * 10)))
            .collect(),
    );
    let s = seq::seq(&m).unwrap();
    let once = seq::to_vec(&s).unwrap();
    let twice = seq::to_vec(&s).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once.len(), 20);
}

#[test]
fn mixed_type_keys_behave_in_maps_and_sets() {
    // 1, 1N, and 1.0 are one key under the numeric equality rule.
    let m = Value::hash_map(vec![
        (Value::Int(1), k("int")),
        (Value::Float(1.0), k("float")),
    ]);
    assert_eq!(seq::count(&m).unwrap(), 1);
    let got = coll::get(
        &m,
        &Value::big_int(num_bigint::BigInt::from(1)),
        &Value::Nil,
    )
    .unwrap();
    assert!(!got.is_nil());
}
