//! Value: What the language talks about
//!
//! Every user-visible datum is a `Value`. Small immediates (nil, booleans,
//! integers, floats, chars) are stored inline; everything else lives
//! behind an `Arc` so cloning a value is O(1) regardless of payload size.
//! Reference handles (atoms, delays, futures, agents) are defined beside
//! the value type in `refs/` and shared through the same `Arc`s.
//!
//! # Send/Sync
//!
//! `Value` is `Send + Sync` by construction:
//! - Immediates are `Copy`.
//! - Immutable payloads (strings, collections, function values) have no
//!   interior mutability and are shared via `Arc`.
//! - Reference cells and transients guard their interior state with
//!   `parking_lot` locks.
//!
//! No unsafe impls are required; the compiler derives thread-safety from
//! the payload types themselves.

use crate::coll::array::ArrayData;
use crate::coll::lazy::{ChunkedCons, LazySeq};
use crate::coll::list::{Cons, PersistentList};
use crate::coll::map::{PersistentArrayMap, PersistentHashMap};
use crate::coll::set::PersistentHashSet;
use crate::coll::transient::{TransientMap, TransientSet, TransientVector};
use crate::coll::vector::PersistentVector;
use crate::error::Error;
use crate::intern::{Keyword, Symbol};
use crate::num::bigdec::BigDec;
use crate::refs::agent::Agent;
use crate::refs::atom::Atom;
use crate::refs::delay::Delay;
use crate::refs::future::{Future, Promise};
use crate::refs::volatile::Volatile;
use crate::var::Var;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive};
use parking_lot::RwLock;
use std::sync::Arc;

/// Signature of a native builtin function.
pub type NativeFn = fn(&[Value]) -> Result<Value, Error>;

/// A named native builtin.
#[derive(Debug)]
pub struct BuiltinFn {
    pub name: &'static str,
    pub func: NativeFn,
}

/// A compiled language function, installed by the evaluator.
///
/// The runtime never inspects the body; it only needs a uniform way to
/// invoke it (swap!, futures, agent actions, lazy-seq thunks).
pub struct FnVal {
    pub name: Option<String>,
    func: Arc<dyn Fn(&[Value]) -> Result<Value, Error> + Send + Sync>,
}

impl FnVal {
    pub fn new<F>(name: Option<String>, func: F) -> FnVal
    where
        F: Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        FnVal {
            name,
            func: Arc::new(func),
        }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, Error> {
        (self.func)(args)
    }
}

impl std::fmt::Debug for FnVal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnVal")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A multimethod: a dispatch function plus a method table keyed by
/// dispatch value (global value equality).
#[derive(Debug)]
pub struct MultiFn {
    pub name: String,
    pub dispatch: Value,
    methods: RwLock<Vec<(Value, Value)>>,
}

impl MultiFn {
    pub fn new(name: impl Into<String>, dispatch: Value) -> MultiFn {
        MultiFn {
            name: name.into(),
            dispatch,
            methods: RwLock::new(Vec::new()),
        }
    }

    /// Install (or replace) the method for a dispatch value.
    pub fn add_method(&self, dispatch_val: Value, f: Value) {
        let mut methods = self.methods.write();
        if let Some(slot) = methods.iter_mut().find(|(k, _)| crate::equality::eql(k, &dispatch_val)) {
            slot.1 = f;
        } else {
            methods.push((dispatch_val, f));
        }
    }

    pub fn get_method(&self, dispatch_val: &Value) -> Option<Value> {
        let methods = self.methods.read();
        methods
            .iter()
            .find(|(k, _)| crate::equality::eql(k, dispatch_val))
            .map(|(_, f)| f.clone())
            .or_else(|| {
                let default = Value::keyword(None, "default");
                methods
                    .iter()
                    .find(|(k, _)| crate::equality::eql(k, &default))
                    .map(|(_, f)| f.clone())
            })
    }
}

/// Tag discriminator for a `Value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Nil,
    Bool,
    Int,
    Float,
    Char,
    Keyword,
    Symbol,
    Str,
    BigInt,
    BigDec,
    Ratio,
    List,
    Vector,
    Map,
    HashMap,
    Set,
    Cons,
    LazySeq,
    ChunkedCons,
    Array,
    Atom,
    Volatile,
    Var,
    Delay,
    Future,
    Promise,
    Agent,
    Reduced,
    TransientVector,
    TransientMap,
    TransientSet,
    Fn,
    Builtin,
    MultiFn,
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    /// Signed integer. The compact range is the full `i64`; values that
    /// cannot be represented here are `BigInt` or `Float` per the
    /// promotion rules.
    Int(i64),
    Float(f64),
    Char(char),
    Keyword(Keyword),
    Symbol(Symbol),
    Str(Arc<str>),
    BigInt(Arc<BigInt>),
    BigDec(Arc<BigDec>),
    /// Reduced exact rational. Invariant: denominator > 1 (a ratio that
    /// reduces to an integer is constructed as `Int`/`BigInt` instead).
    Ratio(Arc<BigRational>),
    List(PersistentList),
    Vector(PersistentVector),
    /// Small insertion-ordered map backed by a flat entry array.
    Map(PersistentArrayMap),
    HashMap(PersistentHashMap),
    Set(PersistentHashSet),
    Cons(Arc<Cons>),
    LazySeq(Arc<LazySeq>),
    ChunkedCons(Arc<ChunkedCons>),
    /// Mutable fixed-length buffer with a nominal element kind.
    Array(Arc<ArrayData>),
    Atom(Arc<Atom>),
    Volatile(Arc<Volatile>),
    Var(Arc<Var>),
    Delay(Arc<Delay>),
    Future(Arc<Future>),
    Promise(Arc<Promise>),
    Agent(Arc<Agent>),
    /// Short-circuit sentinel consumed by reducing operations.
    Reduced(Arc<Value>),
    TransientVector(Arc<TransientVector>),
    TransientMap(Arc<TransientMap>),
    TransientSet(Arc<TransientSet>),
    Fn(Arc<FnVal>),
    Builtin(Arc<BuiltinFn>),
    MultiFn(Arc<MultiFn>),
}

impl Value {
    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    pub fn string(s: impl AsRef<str>) -> Value {
        Value::Str(Arc::from(s.as_ref()))
    }

    pub fn keyword(ns: Option<&str>, name: &str) -> Value {
        Value::Keyword(Keyword::intern(ns, name))
    }

    pub fn symbol(ns: Option<&str>, name: &str) -> Value {
        Value::Symbol(Symbol::new(ns, name))
    }

    /// Normalize a `BigInt` into the compact range when it fits.
    pub fn integer(n: BigInt) -> Value {
        match n.to_i64() {
            Some(i) => Value::Int(i),
            None => Value::BigInt(Arc::new(n)),
        }
    }

    /// A `BigInt` value that stays a `BigInt` even when compact
    /// (arithmetic on big integers is contagious).
    pub fn big_int(n: BigInt) -> Value {
        Value::BigInt(Arc::new(n))
    }

    pub fn big_dec(d: BigDec) -> Value {
        Value::BigDec(Arc::new(d))
    }

    /// Build a ratio, enforcing the reduction invariant: a denominator of
    /// one yields an integer value, never a `Ratio`.
    pub fn ratio(r: BigRational) -> Value {
        if r.denom().is_one() {
            Value::integer(r.numer().clone())
        } else {
            Value::Ratio(Arc::new(r))
        }
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(PersistentList::from_vec(items))
    }

    pub fn empty_list() -> Value {
        Value::List(PersistentList::empty())
    }

    pub fn vector(items: Vec<Value>) -> Value {
        Value::Vector(PersistentVector::from_vec(items))
    }

    /// An array-backed map from entry pairs. Duplicate keys keep the last
    /// value, matching repeated `assoc`.
    pub fn array_map(entries: Vec<(Value, Value)>) -> Value {
        let mut m = PersistentArrayMap::new();
        for (k, v) in entries {
            m = m.assoc_flat(k, v);
        }
        Value::Map(m)
    }

    pub fn hash_map(entries: Vec<(Value, Value)>) -> Value {
        Value::HashMap(PersistentHashMap::from_entries(entries))
    }

    pub fn set(items: Vec<Value>) -> Value {
        Value::Set(PersistentHashSet::from_vec(items))
    }

    pub fn cons(first: Value, rest: Value) -> Value {
        Value::Cons(Arc::new(Cons { first, rest }))
    }

    pub fn lazy_seq(thunk: Value) -> Value {
        Value::LazySeq(Arc::new(LazySeq::new(thunk)))
    }

    pub fn reduced(v: Value) -> Value {
        Value::Reduced(Arc::new(v))
    }

    pub fn builtin(name: &'static str, func: NativeFn) -> Value {
        Value::Builtin(Arc::new(BuiltinFn { name, func }))
    }

    /// Wrap a Rust closure as a language function value. Used by the
    /// evaluator to install compiled fns, and by tests in place of one.
    pub fn fn_val<F>(name: Option<String>, func: F) -> Value
    where
        F: Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Value::Fn(Arc::new(FnVal::new(name, func)))
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub fn tag(&self) -> Tag {
        match self {
            Value::Nil => Tag::Nil,
            Value::Bool(_) => Tag::Bool,
            Value::Int(_) => Tag::Int,
            Value::Float(_) => Tag::Float,
            Value::Char(_) => Tag::Char,
            Value::Keyword(_) => Tag::Keyword,
            Value::Symbol(_) => Tag::Symbol,
            Value::Str(_) => Tag::Str,
            Value::BigInt(_) => Tag::BigInt,
            Value::BigDec(_) => Tag::BigDec,
            Value::Ratio(_) => Tag::Ratio,
            Value::List(_) => Tag::List,
            Value::Vector(_) => Tag::Vector,
            Value::Map(_) => Tag::Map,
            Value::HashMap(_) => Tag::HashMap,
            Value::Set(_) => Tag::Set,
            Value::Cons(_) => Tag::Cons,
            Value::LazySeq(_) => Tag::LazySeq,
            Value::ChunkedCons(_) => Tag::ChunkedCons,
            Value::Array(_) => Tag::Array,
            Value::Atom(_) => Tag::Atom,
            Value::Volatile(_) => Tag::Volatile,
            Value::Var(_) => Tag::Var,
            Value::Delay(_) => Tag::Delay,
            Value::Future(_) => Tag::Future,
            Value::Promise(_) => Tag::Promise,
            Value::Agent(_) => Tag::Agent,
            Value::Reduced(_) => Tag::Reduced,
            Value::TransientVector(_) => Tag::TransientVector,
            Value::TransientMap(_) => Tag::TransientMap,
            Value::TransientSet(_) => Tag::TransientSet,
            Value::Fn(_) => Tag::Fn,
            Value::Builtin(_) => Tag::Builtin,
            Value::MultiFn(_) => Tag::MultiFn,
        }
    }

    /// Type name used in error messages ("Cannot cast X to number").
    pub fn type_name(&self) -> &'static str {
        match self.tag() {
            Tag::Nil => "nil",
            Tag::Bool => "boolean",
            Tag::Int => "integer",
            Tag::Float => "float",
            Tag::Char => "char",
            Tag::Keyword => "keyword",
            Tag::Symbol => "symbol",
            Tag::Str => "string",
            Tag::BigInt => "bigint",
            Tag::BigDec => "bigdec",
            Tag::Ratio => "ratio",
            Tag::List => "list",
            Tag::Vector => "vector",
            Tag::Map | Tag::HashMap => "map",
            Tag::Set => "set",
            Tag::Cons | Tag::LazySeq | Tag::ChunkedCons => "seq",
            Tag::Array => "array",
            Tag::Atom => "atom",
            Tag::Volatile => "volatile",
            Tag::Var => "var",
            Tag::Delay => "delay",
            Tag::Future => "future",
            Tag::Promise => "promise",
            Tag::Agent => "agent",
            Tag::Reduced => "reduced",
            Tag::TransientVector => "transient-vector",
            Tag::TransientMap => "transient-map",
            Tag::TransientSet => "transient-set",
            Tag::Fn | Tag::Builtin | Tag::MultiFn => "function",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// nil and false are falsey; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self.tag(),
            Tag::Int | Tag::Float | Tag::BigInt | Tag::BigDec | Tag::Ratio
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.tag(), Tag::Int | Tag::BigInt)
    }

    /// Concrete seq types (already a sequence view).
    pub fn is_seq(&self) -> bool {
        matches!(
            self.tag(),
            Tag::List | Tag::Cons | Tag::LazySeq | Tag::ChunkedCons
        )
    }

    /// Sequentials compare element-wise across representations; vectors
    /// are sequential alongside the concrete seq types.
    pub fn is_sequential(&self) -> bool {
        self.is_seq() || matches!(self.tag(), Tag::Vector)
    }

    pub fn is_coll(&self) -> bool {
        self.is_sequential() || matches!(self.tag(), Tag::Map | Tag::HashMap | Tag::Set)
    }

    pub fn is_fn(&self) -> bool {
        matches!(self.tag(), Tag::Fn | Tag::Builtin | Tag::MultiFn)
    }

    /// True only for byte-kind arrays (the one observable effect of the
    /// array element-kind discriminator).
    pub fn is_bytes(&self) -> bool {
        match self {
            Value::Array(a) => a.is_bytes(),
            _ => false,
        }
    }

    pub fn is_reduced(&self) -> bool {
        matches!(self, Value::Reduced(_))
    }

    /// Unwrap one layer of `Reduced`, or return the value unchanged.
    pub fn unreduced(&self) -> Value {
        match self {
            Value::Reduced(inner) => (**inner).clone(),
            other => other.clone(),
        }
    }
}

/// Invoke a callable value with the given arguments.
///
/// This is the single entry point used by `swap!`, futures, agent
/// actions, lazy-seq thunks, validators, and watchers. Besides function
/// values, the usual collection callables apply: keywords and maps look
/// themselves up, sets test membership, vectors index.
pub fn apply(f: &Value, args: &[Value]) -> Result<Value, Error> {
    match f {
        Value::Builtin(b) => (b.func)(args),
        Value::Fn(fv) => fv.call(args),
        Value::MultiFn(mf) => {
            let dispatch_val = apply(&mf.dispatch, args)?;
            match mf.get_method(&dispatch_val) {
                Some(method) => apply(&method, args),
                None => Err(Error::value_err(format!(
                    "No method in multimethod '{}' for dispatch value: {}",
                    mf.name,
                    crate::printer::pr_str(&dispatch_val, true)
                ))),
            }
        }
        Value::Keyword(_) => match args {
            [coll] => crate::coll::get(coll, f, &Value::Nil),
            [coll, default] => crate::coll::get(coll, f, default),
            _ => Err(Error::arity(args.len(), "keyword")),
        },
        Value::Map(_) | Value::HashMap(_) => match args {
            [k] => crate::coll::get(f, k, &Value::Nil),
            [k, default] => crate::coll::get(f, k, default),
            _ => Err(Error::arity(args.len(), "map")),
        },
        Value::Set(s) => match args {
            [item] => Ok(if s.contains(item) {
                item.clone()
            } else {
                Value::Nil
            }),
            _ => Err(Error::arity(args.len(), "set")),
        },
        Value::Vector(v) => match args {
            [Value::Int(i)] => v.nth(*i),
            [other] => Err(Error::cast(other.type_name(), "integer", 0)),
            _ => Err(Error::arity(args.len(), "vector")),
        },
        Value::Var(var) => apply(&var.get(), args),
        other => Err(Error::type_err(format!(
            "Cannot cast {} to function",
            other.type_name()
        ))),
    }
}
