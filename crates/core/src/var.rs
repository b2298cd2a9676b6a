//! Vars and dynamic bindings
//!
//! A var has a root value plus, when marked dynamic, a stack of
//! thread-local binding frames consulted before the root. The namespace
//! tables that intern vars live in the runtime crate; the var itself is
//! defined here because it is a value tag.

use crate::error::Error;
use crate::value::Value;
use parking_lot::RwLock;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_VAR_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Per-thread dynamic binding frames, innermost last.
    static BINDINGS: RefCell<Vec<HashMap<u64, Value>>> = const { RefCell::new(Vec::new()) };
}

/// Builtin metadata attached at intern time.
#[derive(Debug, Default, Clone)]
pub struct VarMeta {
    pub doc: Option<String>,
    pub arglists: Option<String>,
    pub added: Option<String>,
}

#[derive(Debug)]
pub struct Var {
    pub name: Arc<str>,
    pub ns_name: Arc<str>,
    root: RwLock<Value>,
    dynamic: AtomicBool,
    meta: RwLock<VarMeta>,
    id: u64,
}

impl Var {
    pub fn new(ns_name: &str, name: &str, root: Value) -> Var {
        Var {
            name: Arc::from(name),
            ns_name: Arc::from(ns_name),
            root: RwLock::new(root),
            dynamic: AtomicBool::new(false),
            meta: RwLock::new(VarMeta::default()),
            id: NEXT_VAR_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn new_dynamic(ns_name: &str, name: &str, root: Value) -> Var {
        let var = Var::new(ns_name, name, root);
        var.dynamic.store(true, Ordering::Release);
        var
    }

    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.ns_name, self.name)
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic.load(Ordering::Acquire)
    }

    pub fn set_dynamic(&self, dynamic: bool) {
        self.dynamic.store(dynamic, Ordering::Release);
    }

    pub fn root(&self) -> Value {
        self.root.read().clone()
    }

    pub fn set_root(&self, v: Value) {
        *self.root.write() = v;
    }

    pub fn meta(&self) -> VarMeta {
        self.meta.read().clone()
    }

    pub fn set_meta(&self, meta: VarMeta) {
        *self.meta.write() = meta;
    }

    /// Current value: the innermost thread binding when dynamic, else
    /// the root.
    pub fn get(&self) -> Value {
        if self.is_dynamic() {
            let bound = BINDINGS.with(|frames| {
                frames
                    .borrow()
                    .iter()
                    .rev()
                    .find_map(|frame| frame.get(&self.id).cloned())
            });
            if let Some(v) = bound {
                return v;
            }
        }
        self.root()
    }

    /// `set!`: assign within the innermost frame that binds this var.
    pub fn set(&self, v: Value) -> Result<Value, Error> {
        let assigned = BINDINGS.with(|frames| {
            let mut frames = frames.borrow_mut();
            for frame in frames.iter_mut().rev() {
                if let Some(slot) = frame.get_mut(&self.id) {
                    *slot = v.clone();
                    return true;
                }
            }
            false
        });
        if assigned {
            Ok(v)
        } else {
            Err(Error::value_err(format!(
                "Can't change/establish root binding of: {} with set",
                self.name
            )))
        }
    }
}

/// Push a frame of dynamic bindings for the current thread.
pub fn push_thread_bindings(bindings: Vec<(Arc<Var>, Value)>) -> Result<(), Error> {
    let mut frame = HashMap::with_capacity(bindings.len());
    for (var, v) in bindings {
        if !var.is_dynamic() {
            return Err(Error::value_err(format!(
                "Can't dynamically bind non-dynamic var: {}",
                var.qualified_name()
            )));
        }
        frame.insert(var.id, v);
    }
    BINDINGS.with(|frames| frames.borrow_mut().push(frame));
    Ok(())
}

/// Pop the innermost binding frame.
pub fn pop_thread_bindings() -> Result<(), Error> {
    BINDINGS.with(|frames| {
        if frames.borrow_mut().pop().is_some() {
            Ok(())
        } else {
            Err(Error::value_err("Pop without matching push"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_binding() {
        let v = Var::new("user", "x", Value::Int(1));
        assert_eq!(v.get(), Value::Int(1));
        v.set_root(Value::Int(2));
        assert_eq!(v.get(), Value::Int(2));
    }

    #[test]
    fn test_dynamic_binding_shadows_root() {
        let v = Arc::new(Var::new_dynamic("user", "*depth*", Value::Int(0)));
        push_thread_bindings(vec![(Arc::clone(&v), Value::Int(1))]).unwrap();
        assert_eq!(v.get(), Value::Int(1));
        push_thread_bindings(vec![(Arc::clone(&v), Value::Int(2))]).unwrap();
        assert_eq!(v.get(), Value::Int(2));
        pop_thread_bindings().unwrap();
        assert_eq!(v.get(), Value::Int(1));
        pop_thread_bindings().unwrap();
        assert_eq!(v.get(), Value::Int(0));
    }

    #[test]
    fn test_binding_non_dynamic_var_rejected() {
        let v = Arc::new(Var::new("user", "plain", Value::Nil));
        let err = push_thread_bindings(vec![(v, Value::Int(1))]).unwrap_err();
        assert!(err.message.contains("non-dynamic var"));
    }

    #[test]
    fn test_set_requires_binding_frame() {
        let v = Arc::new(Var::new_dynamic("user", "*out*", Value::Nil));
        assert!(v.set(Value::Int(1)).is_err());
        push_thread_bindings(vec![(Arc::clone(&v), Value::Int(0))]).unwrap();
        assert_eq!(v.set(Value::Int(1)).unwrap(), Value::Int(1));
        assert_eq!(v.get(), Value::Int(1));
        pop_thread_bindings().unwrap();
    }

    #[test]
    fn test_bindings_are_thread_local() {
        let v = Arc::new(Var::new_dynamic("user", "*n*", Value::Int(0)));
        push_thread_bindings(vec![(Arc::clone(&v), Value::Int(5))]).unwrap();
        let v2 = Arc::clone(&v);
        let other = std::thread::spawn(move || v2.get());
        assert_eq!(other.join().unwrap(), Value::Int(0));
        pop_thread_bindings().unwrap();
    }
}
