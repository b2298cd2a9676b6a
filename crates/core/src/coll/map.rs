//! Persistent maps
//!
//! Two representations share one surface: a small insertion-ordered
//! array map (flat vector of entries, linear probing by value equality)
//! and a hash map for larger sizes. The array map converts to a hash map
//! when an enlarging operation pushes it past [`HASHMAP_THRESHOLD`]; the
//! conversion decision lives in the generic `coll::assoc`/`coll::conj`
//! layer so both representations stay simple here.

use crate::equality::eql;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Entry count above which an enlarging array-map operation converts to
/// a hash map.
pub const HASHMAP_THRESHOLD: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct PersistentArrayMap {
    entries: Arc<Vec<(Value, Value)>>,
}

impl PersistentArrayMap {
    pub fn new() -> PersistentArrayMap {
        PersistentArrayMap {
            entries: Arc::new(Vec::new()),
        }
    }

    pub fn from_entries(entries: Vec<(Value, Value)>) -> PersistentArrayMap {
        let mut m = PersistentArrayMap::new();
        for (k, v) in entries {
            m = m.assoc_flat(k, v);
        }
        m
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| eql(k, key))
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.iter().any(|(k, _)| eql(k, key))
    }

    /// Replace-or-append without representation conversion. Insertion
    /// order is preserved; replacing a key keeps its position.
    pub fn assoc_flat(&self, key: Value, value: Value) -> PersistentArrayMap {
        let mut entries = (*self.entries).clone();
        match entries.iter_mut().find(|(k, _)| eql(k, &key)) {
            Some(slot) => slot.1 = value,
            None => entries.push((key, value)),
        }
        PersistentArrayMap {
            entries: Arc::new(entries),
        }
    }

    pub fn dissoc(&self, key: &Value) -> PersistentArrayMap {
        if !self.contains_key(key) {
            return self.clone();
        }
        let entries = self
            .entries
            .iter()
            .filter(|(k, _)| !eql(k, key))
            .cloned()
            .collect();
        PersistentArrayMap {
            entries: Arc::new(entries),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (Value, Value)> {
        self.entries.iter()
    }

    pub fn to_hash_map(&self) -> PersistentHashMap {
        PersistentHashMap::from_entries((*self.entries).clone())
    }

    /// Consume into the entry buffer, cloning only when shared.
    pub fn into_entries(self) -> Vec<(Value, Value)> {
        Arc::try_unwrap(self.entries).unwrap_or_else(|arc| (*arc).clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PersistentHashMap {
    entries: Arc<HashMap<Value, Value>>,
}

impl PersistentHashMap {
    pub fn new() -> PersistentHashMap {
        PersistentHashMap {
            entries: Arc::new(HashMap::new()),
        }
    }

    pub fn from_entries(entries: Vec<(Value, Value)>) -> PersistentHashMap {
        PersistentHashMap {
            entries: Arc::new(entries.into_iter().collect()),
        }
    }

    pub fn from_table(table: HashMap<Value, Value>) -> PersistentHashMap {
        PersistentHashMap {
            entries: Arc::new(table),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.contains_key(key)
    }

    pub fn assoc(&self, key: Value, value: Value) -> PersistentHashMap {
        let mut entries = (*self.entries).clone();
        entries.insert(key, value);
        PersistentHashMap {
            entries: Arc::new(entries),
        }
    }

    pub fn dissoc(&self, key: &Value) -> PersistentHashMap {
        if !self.contains_key(key) {
            return self.clone();
        }
        let mut entries = (*self.entries).clone();
        entries.remove(key);
        PersistentHashMap {
            entries: Arc::new(entries),
        }
    }

    pub fn iter(&self) -> std::collections::hash_map::Iter<'_, Value, Value> {
        self.entries.iter()
    }

    /// Consume into the hash table, cloning only when shared.
    pub fn into_table(self) -> HashMap<Value, Value> {
        Arc::try_unwrap(self.entries).unwrap_or_else(|arc| (*arc).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(name: &str) -> Value {
        Value::keyword(None, name)
    }

    #[test]
    fn test_array_map_preserves_insertion_order() {
        let m = PersistentArrayMap::from_entries(vec![
            (k("b"), Value::Int(2)),
            (k("a"), Value::Int(1)),
        ]);
        let keys: Vec<_> = m.iter().map(|(key, _)| key.clone()).collect();
        assert_eq!(keys, vec![k("b"), k("a")]);
    }

    #[test]
    fn test_array_map_assoc_replaces_in_place() {
        let m = PersistentArrayMap::from_entries(vec![(k("a"), Value::Int(1))]);
        let m2 = m.assoc_flat(k("a"), Value::Int(5));
        assert_eq!(m.get(&k("a")), Some(&Value::Int(1)));
        assert_eq!(m2.get(&k("a")), Some(&Value::Int(5)));
        assert_eq!(m2.len(), 1);
    }

    #[test]
    fn test_array_map_no_duplicate_keys_via_numeric_equality() {
        // 1 and 1N denote the same key
        let m = PersistentArrayMap::from_entries(vec![(Value::Int(1), Value::Int(10))]);
        let m = m.assoc_flat(
            Value::big_int(num_bigint::BigInt::from(1)),
            Value::Int(20),
        );
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&Value::Int(1)), Some(&Value::Int(20)));
    }

    #[test]
    fn test_hash_map_assoc_dissoc() {
        let m = PersistentHashMap::from_entries(vec![(k("a"), Value::Int(1))]);
        let m2 = m.assoc(k("b"), Value::Int(2));
        assert_eq!(m2.len(), 2);
        let m3 = m2.dissoc(&k("a"));
        assert_eq!(m3.len(), 1);
        assert!(m2.contains_key(&k("a")));
    }
}
