//! Clove Runtime: references, pool, and namespace surface
//!
//! The operational half of the Clove core, layered over `clove-core`:
//!
//! - `pool`: the lazily-created shared worker pool
//! - `future`: future submission, cancellation, timed deref
//! - `agent`: send/send-off, await, restart, error handling
//! - `namespace`: namespaces, var interning, dynamic var defaults
//! - `builtins`: the builtin metadata table and native dispatch
//! - `interop`: platform constant shims
//!
//! `bootstrap` wires a fresh environment: builtins installed, dynamic
//! vars pre-registered, interop shims interned. The evaluator calls it
//! once at startup and owns the returned `Environment`.

pub mod agent;
pub mod builtins;
pub mod future;
pub mod interop;
pub mod namespace;
pub mod pool;

pub use agent::{await_agents, await_for, restart_agent, send, send_off};
pub use builtins::{all_builtins, registry, BuiltinDef};
pub use future::{future_call, future_cancel, future_cancelled, future_done};
pub use namespace::{install_dynamic_vars, Environment, Namespace, CORE_NS};

// Re-export the data layer so embedders depend on one crate.
pub use clove_core as core;
pub use clove_core::{apply, deref, deref_timeout, eql, pr_str, Error, ErrorKind, Value};

/// Build a fully-wired environment: builtins, dynamic vars, interop
/// shims.
pub fn bootstrap() -> Environment {
    let env = Environment::new();
    builtins::install(&env);
    namespace::install_dynamic_vars(&env);
    interop::install(&env);
    tracing::debug!("runtime environment bootstrapped");
    env
}
