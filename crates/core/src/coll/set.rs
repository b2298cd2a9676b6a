//! Persistent hash set

use crate::value::Value;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct PersistentHashSet {
    items: Arc<HashSet<Value>>,
}

impl PersistentHashSet {
    pub fn new() -> PersistentHashSet {
        PersistentHashSet {
            items: Arc::new(HashSet::new()),
        }
    }

    pub fn from_vec(items: Vec<Value>) -> PersistentHashSet {
        PersistentHashSet {
            items: Arc::new(items.into_iter().collect()),
        }
    }

    pub fn from_table(table: HashSet<Value>) -> PersistentHashSet {
        PersistentHashSet {
            items: Arc::new(table),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, v: &Value) -> bool {
        self.items.contains(v)
    }

    /// Insert; a no-op when the element is already present.
    pub fn conj(&self, v: Value) -> PersistentHashSet {
        if self.items.contains(&v) {
            return self.clone();
        }
        let mut items = (*self.items).clone();
        items.insert(v);
        PersistentHashSet {
            items: Arc::new(items),
        }
    }

    pub fn disj(&self, v: &Value) -> PersistentHashSet {
        if !self.items.contains(v) {
            return self.clone();
        }
        let mut items = (*self.items).clone();
        items.remove(v);
        PersistentHashSet {
            items: Arc::new(items),
        }
    }

    pub fn iter(&self) -> std::collections::hash_set::Iter<'_, Value> {
        self.items.iter()
    }

    /// Consume into the hash table, cloning only when shared.
    pub fn into_table(self) -> HashSet<Value> {
        Arc::try_unwrap(self.items).unwrap_or_else(|arc| (*arc).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conj_is_noop_when_present() {
        let s = PersistentHashSet::from_vec(vec![Value::Int(1)]);
        let s2 = s.conj(Value::Int(1));
        assert_eq!(s2.len(), 1);
        let s3 = s.conj(Value::Int(2));
        assert_eq!(s3.len(), 2);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_numeric_keys_unify() {
        // 1 and 1N are the same member
        let s = PersistentHashSet::from_vec(vec![
            Value::Int(1),
            Value::big_int(num_bigint::BigInt::from(1)),
        ]);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_disj() {
        let s = PersistentHashSet::from_vec(vec![Value::Int(1), Value::Int(2)]);
        let s2 = s.disj(&Value::Int(1));
        assert_eq!(s2.len(), 1);
        assert!(!s2.contains(&Value::Int(1)));
        assert!(s.contains(&Value::Int(1)));
    }
}
