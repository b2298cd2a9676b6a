//! Clove Core: value, numeric, and collection layer
//!
//! The data half of the Clove runtime. Everything the language touches
//! is a `Value`; this crate defines the representation plus the
//! semantics that every higher layer depends on:
//!
//! - `value`: the tagged value type, predicates, constructors, `apply`
//! - `equality`: global value equality and the hash consistent with it
//! - `num`: the numeric tower with automatic promotion
//! - `coll`: persistent collections, seqs, transients, mutable arrays
//! - `refs`: reference cells (atom, volatile, delay, future, promise,
//!   agent) and the unified `deref`
//! - `var`: vars and thread-local dynamic bindings
//! - `printer`: readable and plain rendering
//! - `error`: the runtime error taxonomy
//!
//! This crate owns no threads. The shared worker pool and the operations
//! that submit to it (futures, agent sends, await) live in
//! `clove-runtime`.

pub mod coll;
pub mod equality;
pub mod error;
pub mod intern;
pub mod num;
pub mod printer;
pub mod refs;
pub mod value;
pub mod var;

// Re-export key types and functions
pub use equality::{eql, hash_value};
pub use error::{Error, ErrorKind};
pub use intern::{Keyword, Symbol};
pub use printer::pr_str;
pub use value::{apply, BuiltinFn, FnVal, MultiFn, NativeFn, Tag, Value};
pub use var::{pop_thread_bindings, push_thread_bindings, Var, VarMeta};

// Collection surface
pub use coll::lazy::{ChunkedCons, LazySeq};
pub use coll::list::{Cons, PersistentList};
pub use coll::map::{PersistentArrayMap, PersistentHashMap};
pub use coll::set::PersistentHashSet;
pub use coll::transient::{TransientMap, TransientSet, TransientVector};
pub use coll::vector::PersistentVector;

// Numeric tower
pub use num::bigdec::BigDec;

// Reference cells
pub use refs::agent::{Agent, AgentAction, ErrorMode};
pub use refs::atom::Atom;
pub use refs::delay::Delay;
pub use refs::future::{Future, FutureCell, Promise};
pub use refs::volatile::Volatile;
pub use refs::{deref, deref_timeout};
