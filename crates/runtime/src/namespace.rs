//! Namespaces and var interning
//!
//! The minimal namespace shape the core needs: a registry of namespaces,
//! each interning vars by simple name. The evaluator layers its own
//! refer/alias machinery on top. Pre-registration of the dynamic var
//! set (with host-language defaults) also lives here.

use clove_core::error::Error;
use clove_core::value::Value;
use clove_core::var::Var;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// The namespace builtins are interned into.
pub const CORE_NS: &str = "clojure.core";

#[derive(Debug)]
pub struct Namespace {
    pub name: String,
    vars: RwLock<HashMap<String, Arc<Var>>>,
}

impl Namespace {
    fn new(name: &str) -> Namespace {
        Namespace {
            name: name.to_string(),
            vars: RwLock::new(HashMap::new()),
        }
    }

    /// Intern (or fetch) the var named `name` in this namespace.
    pub fn intern(&self, name: &str) -> Arc<Var> {
        if let Some(var) = self.vars.read().get(name) {
            return Arc::clone(var);
        }
        let mut vars = self.vars.write();
        Arc::clone(
            vars.entry(name.to_string())
                .or_insert_with(|| Arc::new(Var::new(&self.name, name, Value::Nil))),
        )
    }

    pub fn find(&self, name: &str) -> Option<Arc<Var>> {
        self.vars.read().get(name).cloned()
    }

    pub fn var_count(&self) -> usize {
        self.vars.read().len()
    }
}

/// Process-wide namespace registry.
#[derive(Debug, Default)]
pub struct Environment {
    namespaces: RwLock<HashMap<String, Arc<Namespace>>>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment::default()
    }

    pub fn find_or_create_namespace(&self, name: &str) -> Arc<Namespace> {
        if let Some(ns) = self.namespaces.read().get(name) {
            return Arc::clone(ns);
        }
        let mut namespaces = self.namespaces.write();
        Arc::clone(
            namespaces
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Namespace::new(name))),
        )
    }

    pub fn find_namespace(&self, name: &str) -> Option<Arc<Namespace>> {
        self.namespaces.read().get(name).cloned()
    }

    /// Resolve `ns/name` (or `name` in the core namespace).
    pub fn resolve(&self, ns: Option<&str>, name: &str) -> Result<Arc<Var>, Error> {
        let ns_name = ns.unwrap_or(CORE_NS);
        self.find_namespace(ns_name)
            .and_then(|ns| ns.find(name))
            .ok_or_else(|| {
                Error::value_err(format!("Unable to resolve var: {ns_name}/{name}"))
            })
    }
}

/// The pre-registered dynamic var set with its defaults.
///
/// `*in*`/`*out*`/`*err*` default to nil; the embedder installs host
/// streams before the REPL comes up.
fn dynamic_var_defaults() -> Vec<(&'static str, Value)> {
    vec![
        ("*ns*", Value::symbol(None, "user")),
        ("*file*", Value::string("NO_SOURCE_PATH")),
        ("*command-line-args*", Value::Nil),
        ("*e", Value::Nil),
        ("*flush-on-newline*", Value::Bool(true)),
        ("*print-dup*", Value::Bool(false)),
        ("*print-length*", Value::Nil),
        ("*print-level*", Value::Nil),
        ("*print-meta*", Value::Bool(false)),
        ("*print-namespace-maps*", Value::Bool(true)),
        ("*print-readably*", Value::Bool(true)),
        ("*read-eval*", Value::Bool(true)),
        ("*data-readers*", Value::array_map(vec![])),
        ("*default-data-reader-fn*", Value::Nil),
        ("*source-path*", Value::string("NO_SOURCE_FILE")),
        ("*unchecked-math*", Value::Bool(false)),
        ("*verbose-defrecords*", Value::Bool(false)),
        ("*repl*", Value::Bool(false)),
        ("*err*", Value::Nil),
        ("*in*", Value::Nil),
        ("*out*", Value::Nil),
        // pprint
        ("*print-right-margin*", Value::Int(72)),
        ("*print-miser-width*", Value::Int(40)),
        ("*print-pretty*", Value::Bool(true)),
        ("*print-suppress-namespaces*", Value::Bool(false)),
        ("*print-radix*", Value::Bool(false)),
        ("*print-base*", Value::Int(10)),
        ("*print-pprint-dispatch*", Value::Nil),
    ]
}

/// Intern the dynamic vars into the core namespace.
pub fn install_dynamic_vars(env: &Environment) {
    let core = env.find_or_create_namespace(CORE_NS);
    for (name, default) in dynamic_var_defaults() {
        let var = core.intern(name);
        var.set_dynamic(true);
        var.set_root(default);
    }
}
