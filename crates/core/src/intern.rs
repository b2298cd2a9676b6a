//! Keyword and symbol names
//!
//! Keywords are interned in a process-wide registry so that two keywords
//! with the same `(ns, name)` pair share one allocation and compare by
//! pointer on the fast path. Symbols are NOT interned (each construction
//! allocates); they are transient identifiers produced by the reader and
//! rarely compared in bulk.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An optionally namespace-qualified name, shared by keywords and symbols.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SymName {
    pub ns: Option<Arc<str>>,
    pub name: Arc<str>,
}

impl SymName {
    fn new(ns: Option<&str>, name: &str) -> Self {
        SymName {
            ns: ns.map(Arc::from),
            name: Arc::from(name),
        }
    }

    /// "ns/name" or bare "name".
    pub fn qualified(&self) -> String {
        match &self.ns {
            Some(ns) => format!("{}/{}", ns, self.name),
            None => self.name.to_string(),
        }
    }
}

/// Global keyword registry, keyed by `(ns, name)`.
///
/// Initialized lazily on first intern; the table only ever grows (keywords
/// are never un-interned), matching the host-language contract.
static KEYWORD_TABLE: Mutex<Option<HashMap<(Option<String>, String), Arc<SymName>>>> =
    Mutex::new(None);

/// An interned keyword such as `:foo` or `:ns/foo`.
#[derive(Debug, Clone)]
pub struct Keyword(pub Arc<SymName>);

impl Keyword {
    /// Intern (or fetch) the keyword for `(ns, name)`.
    pub fn intern(ns: Option<&str>, name: &str) -> Keyword {
        let mut guard = KEYWORD_TABLE.lock();
        let table = guard.get_or_insert_with(HashMap::new);
        let key = (ns.map(str::to_string), name.to_string());
        let entry = table
            .entry(key)
            .or_insert_with(|| Arc::new(SymName::new(ns, name)));
        Keyword(Arc::clone(entry))
    }

    pub fn ns(&self) -> Option<&str> {
        self.0.ns.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }
}

impl PartialEq for Keyword {
    fn eq(&self, other: &Self) -> bool {
        // Interning makes pointer equality the common case; content
        // comparison is kept as the semantic definition.
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl Eq for Keyword {}

impl Hash for Keyword {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0.qualified())
    }
}

/// A symbol such as `foo` or `ns/foo`. Not interned.
#[derive(Debug, Clone)]
pub struct Symbol(pub Arc<SymName>);

impl Symbol {
    pub fn new(ns: Option<&str>, name: &str) -> Symbol {
        Symbol(Arc::new(SymName::new(ns, name)))
    }

    pub fn ns(&self) -> Option<&str> {
        self.0.ns.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.qualified())
    }
}
