//! Persistent vector
//!
//! An ordered finite sequence with indexed access, conj-at-tail,
//! pop-from-tail, and replace-at-index. The backing buffer is shared via
//! `Arc`: clones and seq views are O(1), functional update copies the
//! buffer. The transient sibling takes the buffer without copying when
//! it holds the only reference.

use crate::error::Error;
use crate::value::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct PersistentVector {
    items: Arc<Vec<Value>>,
}

impl PersistentVector {
    pub fn new() -> PersistentVector {
        PersistentVector {
            items: Arc::new(Vec::new()),
        }
    }

    pub fn from_vec(items: Vec<Value>) -> PersistentVector {
        PersistentVector {
            items: Arc::new(items),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Indexed access; negative or out-of-range indices raise.
    pub fn nth(&self, index: i64) -> Result<Value, Error> {
        if index >= 0 {
            if let Some(v) = self.items.get(index as usize) {
                return Ok(v.clone());
            }
        }
        Err(Error::index(format!(
            "Index {} out of bounds for vector of length {}",
            index,
            self.items.len()
        )))
    }

    pub fn peek(&self) -> Option<&Value> {
        self.items.last()
    }

    /// Append at the tail.
    pub fn conj(&self, v: Value) -> PersistentVector {
        let mut items = self.shared_buf();
        items.push(v);
        PersistentVector {
            items: Arc::new(items),
        }
    }

    /// Remove the tail element.
    pub fn pop(&self) -> Result<PersistentVector, Error> {
        if self.items.is_empty() {
            return Err(Error::value_err("Can't pop empty vector"));
        }
        let mut items = self.shared_buf();
        items.pop();
        Ok(PersistentVector {
            items: Arc::new(items),
        })
    }

    /// Replace at `index`; `index == len` appends.
    pub fn assoc(&self, index: i64, v: Value) -> Result<PersistentVector, Error> {
        let len = self.items.len();
        if index < 0 || index as usize > len {
            return Err(Error::index(format!(
                "Index {} out of bounds for vector of length {}",
                index, len
            )));
        }
        let mut items = self.shared_buf();
        if index as usize == len {
            items.push(v);
        } else {
            items[index as usize] = v;
        }
        Ok(PersistentVector {
            items: Arc::new(items),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// The shared backing buffer, for non-copying seq views.
    pub fn items(&self) -> &Arc<Vec<Value>> {
        &self.items
    }

    /// Take the buffer if unshared, else clone it.
    fn shared_buf(&self) -> Vec<Value> {
        (*self.items).clone()
    }

    /// Consume into the backing buffer, cloning only when shared.
    /// Used by the transient conversion.
    pub fn into_buf(self) -> Vec<Value> {
        Arc::try_unwrap(self.items).unwrap_or_else(|arc| (*arc).clone())
    }
}
