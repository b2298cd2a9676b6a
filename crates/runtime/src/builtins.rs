//! Builtin metadata and native dispatch
//!
//! Every builtin is one `BuiltinDef` entry: name, namespace, docs,
//! arglists, the release it appeared in, and the native function —
//! absent for special forms, which the compiler handles itself. The
//! per-area tables are aggregated into one registry at startup;
//! duplicate names are a build-time bug and panic immediately.

use crate::agent as agent_ops;
use crate::future as future_ops;
use crate::namespace::{Environment, CORE_NS};
use clove_core::coll::array::{ArrayData, ArrayKind};
use clove_core::coll::{self, seq, transient};
use clove_core::error::Error;
use clove_core::num::{arith, compare, div, math};
use clove_core::refs::{self, agent::Agent, atom, delay::Delay, future::Promise, volatile};
use clove_core::value::{NativeFn, Value};
use clove_core::var::VarMeta;
use clove_core::{eql, hash_value, pr_str};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// The math namespace.
pub const MATH_NS: &str = "clojure.math";

#[derive(Debug, Clone, Copy)]
pub struct BuiltinDef {
    pub ns: &'static str,
    pub name: &'static str,
    pub doc: Option<&'static str>,
    pub arglists: Option<&'static str>,
    pub added: Option<&'static str>,
    pub func: Option<NativeFn>,
}

fn def(
    name: &'static str,
    doc: &'static str,
    arglists: &'static str,
    func: NativeFn,
) -> BuiltinDef {
    BuiltinDef {
        ns: CORE_NS,
        name,
        doc: Some(doc),
        arglists: Some(arglists),
        added: Some("1.0"),
        func: Some(func),
    }
}

fn mdef(
    name: &'static str,
    doc: &'static str,
    arglists: &'static str,
    func: NativeFn,
) -> BuiltinDef {
    BuiltinDef {
        ns: MATH_NS,
        name,
        doc: Some(doc),
        arglists: Some(arglists),
        added: Some("1.11"),
        func: Some(func),
    }
}

/// A special form entry: compiler-handled, no function.
fn special(name: &'static str, doc: &'static str) -> BuiltinDef {
    BuiltinDef {
        ns: CORE_NS,
        name,
        doc: Some(doc),
        arglists: None,
        added: Some("1.0"),
        func: None,
    }
}

// ---------------------------------------------------------------------
// Arity helpers
// ---------------------------------------------------------------------

fn exactly(args: &[Value], n: usize, name: &str) -> Result<(), Error> {
    if args.len() == n {
        Ok(())
    } else {
        Err(Error::arity(args.len(), name))
    }
}

fn at_least(args: &[Value], n: usize, name: &str) -> Result<(), Error> {
    if args.len() >= n {
        Ok(())
    } else {
        Err(Error::arity(args.len(), name))
    }
}

fn ms_arg(v: &Value, pos: usize) -> Result<u64, Error> {
    match v {
        Value::Int(i) => Ok((*i).max(0) as u64),
        other => Err(Error::cast(other.type_name(), "integer", pos)),
    }
}

// ---------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------

fn fold_from(
    args: &[Value],
    op: fn(&Value, &Value) -> Result<Value, Error>,
) -> Result<Value, Error> {
    let mut acc = args[0].clone();
    for v in &args[1..] {
        acc = op(&acc, v)?;
    }
    Ok(acc)
}

fn n_add(args: &[Value]) -> Result<Value, Error> {
    match args {
        [] => Ok(Value::Int(0)),
        [x] => arith::add(x, &Value::Int(0)),
        _ => fold_from(args, arith::add),
    }
}

fn n_add_p(args: &[Value]) -> Result<Value, Error> {
    match args {
        [] => Ok(Value::Int(0)),
        [x] => arith::add_p(x, &Value::Int(0)),
        _ => fold_from(args, arith::add_p),
    }
}

fn n_sub(args: &[Value]) -> Result<Value, Error> {
    match args {
        [] => Err(Error::arity(0, "-")),
        [x] => arith::negate(x),
        _ => fold_from(args, arith::sub),
    }
}

fn n_sub_p(args: &[Value]) -> Result<Value, Error> {
    match args {
        [] => Err(Error::arity(0, "-'")),
        [x] => arith::negate_p(x),
        _ => fold_from(args, arith::sub_p),
    }
}

fn n_mul(args: &[Value]) -> Result<Value, Error> {
    match args {
        [] => Ok(Value::Int(1)),
        [x] => arith::mul(x, &Value::Int(1)),
        _ => fold_from(args, arith::mul),
    }
}

fn n_mul_p(args: &[Value]) -> Result<Value, Error> {
    match args {
        [] => Ok(Value::Int(1)),
        [x] => arith::mul_p(x, &Value::Int(1)),
        _ => fold_from(args, arith::mul_p),
    }
}

fn n_div(args: &[Value]) -> Result<Value, Error> {
    match args {
        [] => Err(Error::arity(0, "/")),
        [x] => div::div(&Value::Int(1), x),
        _ => fold_from(args, div::div),
    }
}

fn n_quot(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 2, "quot")?;
    div::quot(&args[0], &args[1])
}

fn n_mod(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 2, "mod")?;
    div::modulo(&args[0], &args[1])
}

fn n_rem(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 2, "rem")?;
    div::rem(&args[0], &args[1])
}

fn n_inc(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "inc")?;
    arith::add(&args[0], &Value::Int(1))
}

fn n_dec(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "dec")?;
    arith::sub(&args[0], &Value::Int(1))
}

fn chain(
    args: &[Value],
    name: &str,
    rel: fn(&Value, &Value) -> Result<bool, Error>,
) -> Result<Value, Error> {
    at_least(args, 1, name)?;
    for pair in args.windows(2) {
        if !rel(&pair[0], &pair[1])? {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

fn n_lt(args: &[Value]) -> Result<Value, Error> {
    chain(args, "<", compare::lt)
}

fn n_le(args: &[Value]) -> Result<Value, Error> {
    chain(args, "<=", compare::le)
}

fn n_gt(args: &[Value]) -> Result<Value, Error> {
    chain(args, ">", compare::gt)
}

fn n_ge(args: &[Value]) -> Result<Value, Error> {
    chain(args, ">=", compare::ge)
}

fn n_max(args: &[Value]) -> Result<Value, Error> {
    at_least(args, 1, "max")?;
    fold_from(args, |a, b| {
        Ok(if compare::gt(a, b)? { a.clone() } else { b.clone() })
    })
}

fn n_min(args: &[Value]) -> Result<Value, Error> {
    at_least(args, 1, "min")?;
    fold_from(args, |a, b| {
        Ok(if compare::lt(a, b)? { a.clone() } else { b.clone() })
    })
}

fn v_eq(args: &[Value]) -> Result<Value, Error> {
    at_least(args, 1, "=")?;
    Ok(Value::Bool(args.windows(2).all(|p| eql(&p[0], &p[1]))))
}

fn v_not_eq(args: &[Value]) -> Result<Value, Error> {
    at_least(args, 1, "not=")?;
    Ok(Value::Bool(!args.windows(2).all(|p| eql(&p[0], &p[1]))))
}

fn v_hash(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "hash")?;
    Ok(Value::Int(hash_value(&args[0]) as i64))
}

fn require_integer(v: &Value) -> Result<(), Error> {
    if v.is_integer() {
        Ok(())
    } else {
        Err(Error::type_err(format!(
            "Argument must be an integer: {}",
            pr_str(v, true)
        ))
        .at_arg(0))
    }
}

fn p_zero(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "zero?")?;
    Ok(Value::Bool(compare::num_eq(&args[0], &Value::Int(0))))
}

fn p_pos(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "pos?")?;
    Ok(Value::Bool(compare::gt(&args[0], &Value::Int(0))?))
}

fn p_neg(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "neg?")?;
    Ok(Value::Bool(compare::lt(&args[0], &Value::Int(0))?))
}

fn p_even(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "even?")?;
    require_integer(&args[0])?;
    let r = div::rem(&args[0], &Value::Int(2))?;
    Ok(Value::Bool(compare::num_eq(&r, &Value::Int(0))))
}

fn p_odd(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "odd?")?;
    require_integer(&args[0])?;
    let r = div::rem(&args[0], &Value::Int(2))?;
    Ok(Value::Bool(!compare::num_eq(&r, &Value::Int(0))))
}

// ---------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------

macro_rules! predicate {
    ($($fname:ident, $name:literal, $test:expr);+ $(;)?) => {
        $(
            fn $fname(args: &[Value]) -> Result<Value, Error> {
                exactly(args, 1, $name)?;
                let test: fn(&Value) -> bool = $test;
                Ok(Value::Bool(test(&args[0])))
            }
        )+
    };
}

predicate! {
    p_nil, "nil?", |v| v.is_nil();
    p_some, "some?", |v| !v.is_nil();
    p_number, "number?", |v| v.is_number();
    p_integer, "integer?", |v| v.is_integer();
    p_float, "float?", |v| matches!(v, Value::Float(_));
    p_ratio, "ratio?", |v| matches!(v, Value::Ratio(_));
    p_decimal, "decimal?", |v| matches!(v, Value::BigDec(_));
    p_string, "string?", |v| matches!(v, Value::Str(_));
    p_keyword, "keyword?", |v| matches!(v, Value::Keyword(_));
    p_symbol, "symbol?", |v| matches!(v, Value::Symbol(_));
    p_char, "char?", |v| matches!(v, Value::Char(_));
    p_boolean, "boolean?", |v| matches!(v, Value::Bool(_));
    p_fn, "fn?", |v| v.is_fn();
    p_coll, "coll?", |v| v.is_coll();
    p_seq_pred, "seq?", |v| v.is_seq();
    p_sequential, "sequential?", |v| v.is_sequential();
    p_vector, "vector?", |v| matches!(v, Value::Vector(_));
    p_map_pred, "map?", |v| matches!(v, Value::Map(_) | Value::HashMap(_));
    p_set_pred, "set?", |v| matches!(v, Value::Set(_));
    p_list, "list?", |v| matches!(v, Value::List(_));
    p_bytes, "bytes?", |v| v.is_bytes();
    p_reduced, "reduced?", |v| v.is_reduced();
    p_atom, "atom?", |v| matches!(v, Value::Atom(_));
    p_volatile, "volatile?", |v| matches!(v, Value::Volatile(_));
    p_delay, "delay?", |v| matches!(v, Value::Delay(_));
    p_future_pred, "future?", |v| matches!(v, Value::Future(_));
    p_agent, "agent?", |v| matches!(v, Value::Agent(_));
    p_var, "var?", |v| matches!(v, Value::Var(_));
}

fn p_not(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "not")?;
    Ok(Value::Bool(!args[0].is_truthy()))
}

// ---------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------

fn c_vector(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::vector(args.to_vec()))
}

fn c_list(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::list(args.to_vec()))
}

fn c_vec(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "vec")?;
    Ok(Value::vector(seq::to_vec(&args[0])?))
}

fn c_hash_map(args: &[Value]) -> Result<Value, Error> {
    if args.len() % 2 != 0 {
        return Err(Error::value_err(format!(
            "No value supplied for key: {}",
            pr_str(&args[args.len() - 1], true)
        )));
    }
    Ok(Value::hash_map(
        args.chunks(2).map(|p| (p[0].clone(), p[1].clone())).collect(),
    ))
}

fn c_array_map(args: &[Value]) -> Result<Value, Error> {
    if args.len() % 2 != 0 {
        return Err(Error::value_err(format!(
            "No value supplied for key: {}",
            pr_str(&args[args.len() - 1], true)
        )));
    }
    Ok(Value::array_map(
        args.chunks(2).map(|p| (p[0].clone(), p[1].clone())).collect(),
    ))
}

fn c_hash_set(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::set(args.to_vec()))
}

fn c_set(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "set")?;
    Ok(Value::set(seq::to_vec(&args[0])?))
}

fn c_conj(args: &[Value]) -> Result<Value, Error> {
    match args {
        [] => Ok(Value::vector(vec![])),
        [coll] => Ok(coll.clone()),
        _ => {
            let mut acc = args[0].clone();
            for v in &args[1..] {
                acc = coll::conj(&acc, v.clone())?;
            }
            Ok(acc)
        }
    }
}

fn c_cons(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 2, "cons")?;
    Ok(Value::cons(args[0].clone(), args[1].clone()))
}

fn c_assoc(args: &[Value]) -> Result<Value, Error> {
    at_least(args, 3, "assoc")?;
    if (args.len() - 1) % 2 != 0 {
        return Err(Error::arity(args.len(), "assoc"));
    }
    let mut acc = args[0].clone();
    for pair in args[1..].chunks(2) {
        acc = coll::assoc(&acc, pair[0].clone(), pair[1].clone())?;
    }
    Ok(acc)
}

fn c_dissoc(args: &[Value]) -> Result<Value, Error> {
    at_least(args, 1, "dissoc")?;
    let mut acc = args[0].clone();
    for k in &args[1..] {
        acc = coll::dissoc(&acc, k)?;
    }
    Ok(acc)
}

fn c_disj(args: &[Value]) -> Result<Value, Error> {
    at_least(args, 1, "disj")?;
    let mut acc = args[0].clone();
    for v in &args[1..] {
        acc = coll::disj(&acc, v)?;
    }
    Ok(acc)
}

fn c_get(args: &[Value]) -> Result<Value, Error> {
    match args {
        [coll, k] => coll::get(coll, k, &Value::Nil),
        [coll, k, default] => coll::get(coll, k, default),
        _ => Err(Error::arity(args.len(), "get")),
    }
}

fn c_nth(args: &[Value]) -> Result<Value, Error> {
    match args {
        [coll, Value::Int(i)] => coll::nth(coll, *i),
        [coll, Value::Int(i), default] => {
            coll::nth(coll, *i).or_else(|_| Ok(default.clone()))
        }
        [_, other, ..] => Err(Error::cast(other.type_name(), "integer", 1)),
        _ => Err(Error::arity(args.len(), "nth")),
    }
}

fn c_count(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "count")?;
    Ok(Value::Int(seq::count(&args[0])?))
}

fn c_first(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "first")?;
    seq::first(&args[0])
}

fn c_rest(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "rest")?;
    seq::rest(&args[0])
}

fn c_next(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "next")?;
    seq::next(&args[0])
}

fn c_seq(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "seq")?;
    seq::seq(&args[0])
}

fn c_empty(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "empty?")?;
    Ok(Value::Bool(seq::seq(&args[0])?.is_nil()))
}

fn c_peek(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "peek")?;
    coll::peek(&args[0])
}

fn c_pop(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "pop")?;
    coll::pop(&args[0])
}

fn c_contains(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 2, "contains?")?;
    Ok(Value::Bool(coll::contains(&args[0], &args[1])?))
}

fn c_transient(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "transient")?;
    transient::transient(&args[0])
}

fn c_persistent_bang(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "persistent!")?;
    transient::persistent_bang(&args[0])
}

fn c_conj_bang(args: &[Value]) -> Result<Value, Error> {
    at_least(args, 1, "conj!")?;
    let mut acc = args[0].clone();
    for v in &args[1..] {
        acc = transient::conj_bang(&acc, v.clone())?;
    }
    Ok(acc)
}

fn c_assoc_bang(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 3, "assoc!")?;
    transient::assoc_bang(&args[0], args[1].clone(), args[2].clone())
}

fn c_dissoc_bang(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 2, "dissoc!")?;
    transient::dissoc_bang(&args[0], &args[1])
}

fn c_disj_bang(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 2, "disj!")?;
    transient::disj_bang(&args[0], &args[1])
}

fn c_pop_bang(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "pop!")?;
    transient::pop_bang(&args[0])
}

fn c_reduced(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "reduced")?;
    Ok(Value::reduced(args[0].clone()))
}

fn c_unreduced(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "unreduced")?;
    Ok(args[0].unreduced())
}

fn c_make_array(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "make-array")?;
    match &args[0] {
        Value::Int(n) if *n >= 0 => Ok(Value::Array(Arc::new(ArrayData::new(
            ArrayKind::Object,
            *n as usize,
        )))),
        other => Err(Error::cast(other.type_name(), "integer", 0)),
    }
}

fn c_byte_array(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "byte-array")?;
    match &args[0] {
        Value::Int(n) if *n >= 0 => Ok(Value::Array(Arc::new(ArrayData::new(
            ArrayKind::Byte,
            *n as usize,
        )))),
        other => Err(Error::cast(other.type_name(), "integer", 0)),
    }
}

fn as_array<'a>(v: &'a Value, op: &str) -> Result<&'a Arc<ArrayData>, Error> {
    match v {
        Value::Array(a) => Ok(a),
        other => Err(Error::type_err(format!(
            "{op} expects an array, got {}",
            other.type_name()
        ))),
    }
}

fn c_aget(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 2, "aget")?;
    match &args[1] {
        Value::Int(i) => as_array(&args[0], "aget")?.aget(*i),
        other => Err(Error::cast(other.type_name(), "integer", 1)),
    }
}

fn c_aset(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 3, "aset")?;
    match &args[1] {
        Value::Int(i) => as_array(&args[0], "aset")?.aset(*i, args[2].clone()),
        other => Err(Error::cast(other.type_name(), "integer", 1)),
    }
}

fn c_alength(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "alength")?;
    Ok(Value::Int(as_array(&args[0], "alength")?.len() as i64))
}

fn s_str(args: &[Value]) -> Result<Value, Error> {
    let mut out = String::new();
    for v in args {
        if !v.is_nil() {
            out.push_str(&pr_str(v, false));
        }
    }
    Ok(Value::string(out))
}

fn s_pr_str(args: &[Value]) -> Result<Value, Error> {
    let rendered: Vec<String> = args.iter().map(|v| pr_str(v, true)).collect();
    Ok(Value::string(rendered.join(" ")))
}

// ---------------------------------------------------------------------
// References
// ---------------------------------------------------------------------

fn r_atom(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "atom")?;
    Ok(atom::Atom::new_value(args[0].clone()))
}

fn r_deref(args: &[Value]) -> Result<Value, Error> {
    match args {
        [v] => refs::deref(v),
        [v, timeout, fallback] => refs::deref_timeout(v, ms_arg(timeout, 1)?, fallback),
        _ => Err(Error::arity(args.len(), "deref")),
    }
}

fn r_reset(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 2, "reset!")?;
    atom::reset(&args[0], args[1].clone())
}

fn r_reset_vals(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 2, "reset-vals!")?;
    atom::reset_vals(&args[0], args[1].clone())
}

fn r_swap(args: &[Value]) -> Result<Value, Error> {
    at_least(args, 2, "swap!")?;
    atom::swap(&args[0], &args[1], &args[2..])
}

fn r_swap_vals(args: &[Value]) -> Result<Value, Error> {
    at_least(args, 2, "swap-vals!")?;
    atom::swap_vals(&args[0], &args[1], &args[2..])
}

fn with_atom<'a>(v: &'a Value, op: &str) -> Result<&'a Arc<atom::Atom>, Error> {
    match v {
        Value::Atom(a) => Ok(a),
        other => Err(Error::type_err(format!(
            "{op} expects an atom, got {}",
            other.type_name()
        ))),
    }
}

fn r_add_watch(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 3, "add-watch")?;
    with_atom(&args[0], "add-watch")?.add_watch(args[1].clone(), args[2].clone())?;
    Ok(args[0].clone())
}

fn r_remove_watch(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 2, "remove-watch")?;
    with_atom(&args[0], "remove-watch")?.remove_watch(&args[1]);
    Ok(args[0].clone())
}

fn r_set_validator(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 2, "set-validator!")?;
    let validator = if args[1].is_nil() {
        None
    } else {
        Some(args[1].clone())
    };
    with_atom(&args[0], "set-validator!")?.set_validator(validator)?;
    Ok(Value::Nil)
}

fn r_get_validator(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "get-validator")?;
    Ok(with_atom(&args[0], "get-validator")?
        .get_validator()
        .unwrap_or(Value::Nil))
}

fn r_volatile(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "volatile!")?;
    Ok(volatile::Volatile::new_value(args[0].clone()))
}

fn r_vreset(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 2, "vreset!")?;
    volatile::vreset(&args[0], args[1].clone())
}

fn r_vswap(args: &[Value]) -> Result<Value, Error> {
    at_least(args, 2, "vswap!")?;
    volatile::vswap(&args[0], &args[1], &args[2..])
}

fn r_delay_create(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "delay-create")?;
    Ok(Delay::new_value(args[0].clone()))
}

fn r_force(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "force")?;
    match &args[0] {
        Value::Delay(d) => d.force(),
        other => Ok(other.clone()),
    }
}

fn r_realized(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "realized?")?;
    Ok(Value::Bool(refs::is_realized(&args[0])?))
}

fn r_future_call(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "future-call")?;
    future_ops::future_call(args[0].clone())
}

fn r_future_cancel(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "future-cancel")?;
    future_ops::future_cancel(&args[0])
}

fn r_future_done(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "future-done?")?;
    future_ops::future_done(&args[0])
}

fn r_future_cancelled(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "future-cancelled?")?;
    future_ops::future_cancelled(&args[0])
}

fn r_promise(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 0, "promise")?;
    Ok(Promise::new_value())
}

fn r_deliver(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 2, "deliver")?;
    clove_core::refs::future::deliver(&args[0], args[1].clone())
}

fn r_agent(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "agent")?;
    Ok(Agent::new_value(args[0].clone()))
}

fn r_send(args: &[Value]) -> Result<Value, Error> {
    at_least(args, 2, "send")?;
    agent_ops::send(&args[0], args[1].clone(), args[2..].to_vec())
}

fn r_send_off(args: &[Value]) -> Result<Value, Error> {
    at_least(args, 2, "send-off")?;
    agent_ops::send_off(&args[0], args[1].clone(), args[2..].to_vec())
}

fn r_await(args: &[Value]) -> Result<Value, Error> {
    at_least(args, 1, "await")?;
    agent_ops::await_agents(args)
}

fn r_await_for(args: &[Value]) -> Result<Value, Error> {
    at_least(args, 2, "await-for")?;
    agent_ops::await_for(ms_arg(&args[0], 0)?, &args[1..])
}

fn r_restart_agent(args: &[Value]) -> Result<Value, Error> {
    at_least(args, 2, "restart-agent")?;
    // Trailing options: :clear-actions true
    let mut clear_actions = false;
    for pair in args[2..].chunks(2) {
        match pair {
            [Value::Keyword(k), v] if k.name() == "clear-actions" => {
                clear_actions = v.is_truthy();
            }
            _ => return Err(Error::value_err("Unknown restart-agent option")),
        }
    }
    agent_ops::restart_agent(&args[0], args[1].clone(), clear_actions)
}

fn r_agent_error(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "agent-error")?;
    agent_ops::agent_error(&args[0])
}

fn r_set_error_handler(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 2, "set-error-handler!")?;
    agent_ops::set_error_handler(&args[0], args[1].clone())
}

fn r_set_error_mode(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 2, "set-error-mode!")?;
    agent_ops::set_error_mode(&args[0], &args[1])
}

// ---------------------------------------------------------------------
// Math namespace wrappers
// ---------------------------------------------------------------------

macro_rules! math_unary {
    ($($fname:ident => $target:path, $name:literal);+ $(;)?) => {
        $(
            fn $fname(args: &[Value]) -> Result<Value, Error> {
                exactly(args, 1, $name)?;
                $target(&args[0])
            }
        )+
    };
}

macro_rules! math_binary {
    ($($fname:ident => $target:path, $name:literal);+ $(;)?) => {
        $(
            fn $fname(args: &[Value]) -> Result<Value, Error> {
                exactly(args, 2, $name)?;
                $target(&args[0], &args[1])
            }
        )+
    };
}

math_unary! {
    m_sin => math::sin, "sin";
    m_cos => math::cos, "cos";
    m_tan => math::tan, "tan";
    m_asin => math::asin, "asin";
    m_acos => math::acos, "acos";
    m_atan => math::atan, "atan";
    m_sinh => math::sinh, "sinh";
    m_cosh => math::cosh, "cosh";
    m_tanh => math::tanh, "tanh";
    m_exp => math::exp, "exp";
    m_expm1 => math::expm1, "expm1";
    m_log => math::log, "log";
    m_log10 => math::log10, "log10";
    m_log1p => math::log1p, "log1p";
    m_sqrt => math::sqrt, "sqrt";
    m_cbrt => math::cbrt, "cbrt";
    m_floor => math::floor, "floor";
    m_ceil => math::ceil, "ceil";
    m_rint => math::rint, "rint";
    m_round => math::round, "round";
    m_signum => math::signum, "signum";
    m_to_degrees => math::to_degrees, "to-degrees";
    m_to_radians => math::to_radians, "to-radians";
    m_ulp => math::ulp, "ulp";
    m_next_up => math::next_up, "next-up";
    m_next_down => math::next_down, "next-down";
    m_get_exponent => math::get_exponent, "get-exponent";
    m_negate_exact => math::negate_exact, "negate-exact";
    m_increment_exact => math::increment_exact, "increment-exact";
    m_decrement_exact => math::decrement_exact, "decrement-exact";
}

math_binary! {
    m_pow => math::pow, "pow";
    m_atan2 => math::atan2, "atan2";
    m_hypot => math::hypot, "hypot";
    m_next_after => math::next_after, "next-after";
    m_copy_sign => math::copy_sign, "copy-sign";
}

math_binary! {
    m_ieee_remainder => math::ieee_remainder, "IEEE-remainder";
    m_floor_div => math::floor_div, "floor-div";
    m_floor_mod => math::floor_mod, "floor-mod";
    m_add_exact => math::add_exact, "add-exact";
    m_subtract_exact => math::subtract_exact, "subtract-exact";
    m_multiply_exact => math::multiply_exact, "multiply-exact";
}

fn n_abs(args: &[Value]) -> Result<Value, Error> {
    exactly(args, 1, "abs")?;
    math::abs(&args[0])
}

// ---------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------

fn numeric_builtins() -> Vec<BuiltinDef> {
    vec![
        def("+", "Returns the sum of nums; (+) returns 0.", "([] [x] [x y] [x y & more])", n_add),
        def("+'", "Like + but auto-promotes on overflow.", "([] [x] [x y] [x y & more])", n_add_p),
        def("-", "Subtracts ys from x; (- x) negates.", "([x] [x y] [x y & more])", n_sub),
        def("-'", "Like - but auto-promotes on overflow.", "([x] [x y] [x y & more])", n_sub_p),
        def("*", "Returns the product of nums; (*) returns 1.", "([] [x] [x y] [x y & more])", n_mul),
        def("*'", "Like * but auto-promotes on overflow.", "([] [x] [x y] [x y & more])", n_mul_p),
        def("/", "Divides; exact operands yield an integer or ratio.", "([x] [x y] [x y & more])", n_div),
        def("quot", "Quotient of dividing a by b, truncated.", "([a b])", n_quot),
        def("mod", "Modulus, floored toward negative infinity.", "([a b])", n_mod),
        def("rem", "Remainder, truncated toward zero.", "([a b])", n_rem),
        def("inc", "Returns a number one greater than num.", "([x])", n_inc),
        def("dec", "Returns a number one less than num.", "([x])", n_dec),
        def("<", "Returns true if nums are in strictly increasing order.", "([x] [x y] [x y & more])", n_lt),
        def("<=", "Returns true if nums are in non-decreasing order.", "([x] [x y] [x y & more])", n_le),
        def(">", "Returns true if nums are in strictly decreasing order.", "([x] [x y] [x y & more])", n_gt),
        def(">=", "Returns true if nums are in non-increasing order.", "([x] [x y] [x y & more])", n_ge),
        def("max", "Greatest of the nums.", "([x] [x y] [x y & more])", n_max),
        def("min", "Least of the nums.", "([x] [x y] [x y & more])", n_min),
        def("=", "Equality; works on values of any type.", "([x] [x y] [x y & more])", v_eq),
        def("not=", "Same as (not (= ...)).", "([x] [x y] [x y & more])", v_not_eq),
        def("hash", "Hash consistent with =.", "([x])", v_hash),
        def("abs", "Absolute value; keeps the numeric category.", "([x])", n_abs),
        def("zero?", "True if num is zero.", "([x])", p_zero),
        def("pos?", "True if num is greater than zero.", "([x])", p_pos),
        def("neg?", "True if num is less than zero.", "([x])", p_neg),
        def("even?", "True if n is even; n must be an integer.", "([n])", p_even),
        def("odd?", "True if n is odd; n must be an integer.", "([n])", p_odd),
    ]
}

fn predicate_builtins() -> Vec<BuiltinDef> {
    vec![
        def("nil?", "True if x is nil.", "([x])", p_nil),
        def("some?", "True if x is not nil.", "([x])", p_some),
        def("not", "True if x is logical false.", "([x])", p_not),
        def("number?", "True if x is a number.", "([x])", p_number),
        def("integer?", "True if x is an integer.", "([x])", p_integer),
        def("float?", "True if x is a floating point number.", "([x])", p_float),
        def("ratio?", "True if x is a ratio.", "([x])", p_ratio),
        def("decimal?", "True if x is a big decimal.", "([x])", p_decimal),
        def("string?", "True if x is a string.", "([x])", p_string),
        def("keyword?", "True if x is a keyword.", "([x])", p_keyword),
        def("symbol?", "True if x is a symbol.", "([x])", p_symbol),
        def("char?", "True if x is a character.", "([x])", p_char),
        def("boolean?", "True if x is a boolean.", "([x])", p_boolean),
        def("fn?", "True if x is a function.", "([x])", p_fn),
        def("coll?", "True if x is a collection.", "([x])", p_coll),
        def("seq?", "True if x is a seq.", "([x])", p_seq_pred),
        def("sequential?", "True if x is sequential.", "([x])", p_sequential),
        def("vector?", "True if x is a vector.", "([x])", p_vector),
        def("map?", "True if x is a map.", "([x])", p_map_pred),
        def("set?", "True if x is a set.", "([x])", p_set_pred),
        def("list?", "True if x is a list.", "([x])", p_list),
        def("bytes?", "True if x is a byte array.", "([x])", p_bytes),
        def("reduced?", "True if x is the result of a call to reduced.", "([x])", p_reduced),
        def("atom?", "True if x is an atom.", "([x])", p_atom),
        def("volatile?", "True if x is a volatile.", "([x])", p_volatile),
        def("delay?", "True if x is a delay.", "([x])", p_delay),
        def("future?", "True if x is a future.", "([x])", p_future_pred),
        def("agent?", "True if x is an agent.", "([x])", p_agent),
        def("var?", "True if x is a var.", "([x])", p_var),
    ]
}

fn collection_builtins() -> Vec<BuiltinDef> {
    vec![
        def("vector", "Creates a new vector containing the args.", "([& args])", c_vector),
        def("vec", "Creates a vector from a collection.", "([coll])", c_vec),
        def("list", "Creates a new list containing the args.", "([& args])", c_list),
        def("hash-map", "keyval => key val. Returns a hash map.", "([& keyvals])", c_hash_map),
        def("array-map", "keyval => key val. Returns an array map.", "([& keyvals])", c_array_map),
        def("hash-set", "Returns a set of the args.", "([& args])", c_hash_set),
        def("set", "Returns a set of the distinct elements of coll.", "([coll])", c_set),
        def("conj", "Adds to a collection per its semantics.", "([coll x] [coll x & xs])", c_conj),
        def("cons", "Returns a seq with x prepended.", "([x seq])", c_cons),
        def("assoc", "Associates key with value in a map or vector.", "([coll k v] [coll k v & kvs])", c_assoc),
        def("dissoc", "Removes keys from a map.", "([map] [map k] [map k & ks])", c_dissoc),
        def("disj", "Removes values from a set.", "([set] [set x] [set x & xs])", c_disj),
        def("get", "Returns the value mapped to key, or a default.", "([coll k] [coll k default])", c_get),
        def("nth", "Returns the value at index; raises unless a default is given.", "([coll i] [coll i default])", c_nth),
        def("count", "Number of items; realizes lazy seqs.", "([coll])", c_count),
        def("first", "First item of a seq of coll.", "([coll])", c_first),
        def("rest", "The seq after the first item, possibly empty.", "([coll])", c_rest),
        def("next", "The seq after the first item, or nil.", "([coll])", c_next),
        def("seq", "A seq on the collection, or nil when empty.", "([coll])", c_seq),
        def("empty?", "True when coll has no items.", "([coll])", c_empty),
        def("peek", "Vector tail or list head.", "([coll])", c_peek),
        def("pop", "Vector without its tail, list without its head.", "([coll])", c_pop),
        def("contains?", "True when key is present.", "([coll k])", c_contains),
        def("transient", "Returns a transient sibling of a persistent collection.", "([coll])", c_transient),
        def("persistent!", "Freezes a transient; the transient must not be reused.", "([t])", c_persistent_bang),
        def("conj!", "Adds to a transient collection.", "([t x] [t x & xs])", c_conj_bang),
        def("assoc!", "Associates into a transient map or vector.", "([t k v])", c_assoc_bang),
        def("dissoc!", "Removes a key from a transient map.", "([t k])", c_dissoc_bang),
        def("disj!", "Removes a value from a transient set.", "([t x])", c_disj_bang),
        def("pop!", "Removes the tail of a transient vector.", "([t])", c_pop_bang),
        def("reduced", "Wraps x so reductions terminate with it.", "([x])", c_reduced),
        def("unreduced", "Unwraps a reduced value.", "([x])", c_unreduced),
        def("make-array", "Creates an object array of the given length.", "([n])", c_make_array),
        def("byte-array", "Creates a byte array of the given length.", "([n])", c_byte_array),
        def("aget", "Returns the array element at index.", "([array i])", c_aget),
        def("aset", "Sets the array element at index, returning the value.", "([array i v])", c_aset),
        def("alength", "Length of an array.", "([array])", c_alength),
        def("str", "Concatenates the plain renderings of the args.", "([& args])", s_str),
        def("pr-str", "Readable rendering of the args, space separated.", "([& args])", s_pr_str),
    ]
}

fn reference_builtins() -> Vec<BuiltinDef> {
    vec![
        def("atom", "Creates an atom with an initial value.", "([x])", r_atom),
        def("deref", "Current value of a reference; blocks on futures, promises, and delays.", "([ref] [ref timeout-ms timeout-val])", r_deref),
        def("reset!", "Sets the atom's value without regard for the current value.", "([atom newval])", r_reset),
        def("reset-vals!", "Like reset! but returns [old new].", "([atom newval])", r_reset_vals),
        def("swap!", "Atomically swaps the atom's value with (apply f current args).", "([atom f & args])", r_swap),
        def("swap-vals!", "Like swap! but returns [old new].", "([atom f & args])", r_swap_vals),
        def("add-watch", "Adds a watch fn keyed by key.", "([ref key fn])", r_add_watch),
        def("remove-watch", "Removes the watch with the given key.", "([ref key])", r_remove_watch),
        def("set-validator!", "Sets the validator fn; nil removes it.", "([ref validator-fn])", r_set_validator),
        def("get-validator", "Returns the validator fn, or nil.", "([ref])", r_get_validator),
        def("volatile!", "Creates a volatile with an initial value.", "([x])", r_volatile),
        def("vreset!", "Sets the volatile's value.", "([vol newval])", r_vreset),
        def("vswap!", "Swaps the volatile's value with (apply f current args).", "([vol f & args])", r_vswap),
        def("delay-create", "Wraps a nullary fn as a delay; used by the delay macro.", "([f])", r_delay_create),
        def("force", "Forces a delay; passes any other value through.", "([x])", r_force),
        def("realized?", "True when a delay, lazy seq, future, or promise has a value.", "([x])", r_realized),
        def("future-call", "Runs a nullary fn on the shared pool, returning a future.", "([f])", r_future_call),
        def("future-cancel", "Cancels the future if it is still pending.", "([f])", r_future_cancel),
        def("future-done?", "True when the future has completed or been cancelled.", "([f])", r_future_done),
        def("future-cancelled?", "True when the future was cancelled.", "([f])", r_future_cancelled),
        def("promise", "Creates a promise deliverable exactly once.", "([])", r_promise),
        def("deliver", "Delivers the value to the promise; later deliveries are no-ops.", "([promise val])", r_deliver),
        def("agent", "Creates an agent with an initial state.", "([state])", r_agent),
        def("send", "Dispatches an action to the agent via the shared pool.", "([agent f & args])", r_send),
        def("send-off", "Like send, for potentially blocking actions.", "([agent f & args])", r_send_off),
        def("await", "Blocks until the agents' queued actions have run.", "([& agents])", r_await),
        def("await-for", "Bounded await; nil on timeout, true on success.", "([timeout-ms & agents])", r_await_for),
        def("restart-agent", "Clears a failed agent's error and installs a new state.", "([agent new-state & options])", r_restart_agent),
        def("agent-error", "The error that failed the agent, or nil.", "([agent])", r_agent_error),
        def("set-error-handler!", "Installs the agent's error handler fn.", "([agent handler-fn])", r_set_error_handler),
        def("set-error-mode!", "Sets the agent's error mode, :continue or :fail.", "([agent mode])", r_set_error_mode),
    ]
}

fn math_builtins() -> Vec<BuiltinDef> {
    vec![
        mdef("sin", "Sine of an angle in radians.", "([a])", m_sin),
        mdef("cos", "Cosine of an angle in radians.", "([a])", m_cos),
        mdef("tan", "Tangent of an angle in radians.", "([a])", m_tan),
        mdef("asin", "Arc sine, in the range -pi/2 to pi/2.", "([a])", m_asin),
        mdef("acos", "Arc cosine, in the range 0.0 to pi.", "([a])", m_acos),
        mdef("atan", "Arc tangent, in the range -pi/2 to pi/2.", "([a])", m_atan),
        mdef("atan2", "Angle theta of the polar conversion of (x, y).", "([y x])", m_atan2),
        mdef("sinh", "Hyperbolic sine.", "([x])", m_sinh),
        mdef("cosh", "Hyperbolic cosine.", "([x])", m_cosh),
        mdef("tanh", "Hyperbolic tangent.", "([x])", m_tanh),
        mdef("exp", "Euler's number e raised to the power of a.", "([a])", m_exp),
        mdef("expm1", "e^x - 1, accurate near zero.", "([x])", m_expm1),
        mdef("log", "Natural logarithm.", "([a])", m_log),
        mdef("log10", "Base-10 logarithm.", "([a])", m_log10),
        mdef("log1p", "ln(1 + x), accurate near zero.", "([x])", m_log1p),
        mdef("sqrt", "Positive square root.", "([a])", m_sqrt),
        mdef("cbrt", "Cube root.", "([a])", m_cbrt),
        mdef("pow", "a raised to the power of b.", "([a b])", m_pow),
        mdef("hypot", "sqrt(x^2 + y^2) without intermediate overflow.", "([x y])", m_hypot),
        mdef("floor", "Largest double <= a that is an integer.", "([a])", m_floor),
        mdef("ceil", "Smallest double >= a that is an integer.", "([a])", m_ceil),
        mdef("rint", "Nearest integral double, ties to even.", "([a])", m_rint),
        mdef("round", "Nearest long, ties toward positive infinity.", "([a])", m_round),
        mdef("signum", "Sign of d as a double.", "([d])", m_signum),
        mdef("to-degrees", "Radians to degrees.", "([r])", m_to_degrees),
        mdef("to-radians", "Degrees to radians.", "([d])", m_to_radians),
        mdef("ulp", "Unit in the last place of d.", "([d])", m_ulp),
        mdef("next-after", "Adjacent double of start toward direction.", "([start direction])", m_next_after),
        mdef("next-up", "Adjacent double toward positive infinity.", "([d])", m_next_up),
        mdef("next-down", "Adjacent double toward negative infinity.", "([d])", m_next_down),
        mdef("copy-sign", "Magnitude of m with the sign of s.", "([m s])", m_copy_sign),
        mdef("get-exponent", "Unbiased exponent of d.", "([d])", m_get_exponent),
        mdef("IEEE-remainder", "IEEE 754 remainder of dividend/divisor.", "([dividend divisor])", m_ieee_remainder),
        mdef("floor-div", "Largest long <= the exact quotient.", "([x y])", m_floor_div),
        mdef("floor-mod", "x - (floorDiv(x y) * y).", "([x y])", m_floor_mod),
        mdef("add-exact", "x + y, raising on long overflow.", "([x y])", m_add_exact),
        mdef("subtract-exact", "x - y, raising on long overflow.", "([x y])", m_subtract_exact),
        mdef("multiply-exact", "x * y, raising on long overflow.", "([x y])", m_multiply_exact),
        mdef("negate-exact", "-x, raising on long overflow.", "([x])", m_negate_exact),
        mdef("increment-exact", "x + 1, raising on long overflow.", "([x])", m_increment_exact),
        mdef("decrement-exact", "x - 1, raising on long overflow.", "([x])", m_decrement_exact),
    ]
}

fn special_forms() -> Vec<BuiltinDef> {
    vec![
        special("def", "Creates or locates a var and optionally sets its root."),
        special("if", "Evaluates test, then one of two branches."),
        special("do", "Evaluates expressions in order, returning the last."),
        special("let*", "Binds symbols to values in a lexical scope."),
        special("fn*", "Creates a function."),
        special("loop*", "Like let*, a recur target."),
        special("recur", "Rebinds and jumps to the nearest recur target."),
        special("quote", "Returns the unevaluated form."),
        special("var", "Returns the var itself, not its value."),
        special("throw", "Throws an exception value."),
        special("try", "Establishes catch/finally handlers."),
        special("set!", "Assigns a thread-locally bound var."),
        special("monitor-enter", "Synchronization primitive."),
        special("monitor-exit", "Synchronization primitive."),
    ]
}

// ---------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------

/// All builtin definitions, every area aggregated.
pub fn all_builtins() -> Vec<BuiltinDef> {
    let mut all = Vec::new();
    all.extend(numeric_builtins());
    all.extend(predicate_builtins());
    all.extend(collection_builtins());
    all.extend(reference_builtins());
    all.extend(math_builtins());
    all.extend(special_forms());
    all
}

/// The builtin registry keyed by `(ns, name)`. Duplicate names are a
/// build-time bug: the tables are static, so panicking here surfaces
/// the clash the first time any lookup happens.
pub fn registry() -> &'static HashMap<(&'static str, &'static str), BuiltinDef> {
    static REGISTRY: OnceLock<HashMap<(&'static str, &'static str), BuiltinDef>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut table = HashMap::new();
        for b in all_builtins() {
            if table.insert((b.ns, b.name), b).is_some() {
                panic!("Duplicate builtin definition: {}/{}", b.ns, b.name);
            }
        }
        table
    })
}

/// Intern every builtin into its namespace, with metadata, the function
/// value as the root where one exists.
pub fn install(env: &Environment) {
    for b in registry().values() {
        let ns = env.find_or_create_namespace(b.ns);
        let var = ns.intern(b.name);
        var.set_meta(VarMeta {
            doc: b.doc.map(str::to_string),
            arglists: b.arglists.map(str::to_string),
            added: b.added.map(str::to_string),
        });
        if let Some(f) = b.func {
            var.set_root(Value::builtin(b.name, f));
        }
    }
    // Math constants ride along as plain vars.
    let math = env.find_or_create_namespace(MATH_NS);
    math.intern("PI").set_root(Value::Float(std::f64::consts::PI));
    math.intern("E").set_root(Value::Float(std::f64::consts::E));
}
