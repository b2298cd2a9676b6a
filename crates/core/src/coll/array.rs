//! Mutable typed arrays
//!
//! A fixed-length buffer of values tagged with a nominal element kind.
//! The runtime does not enforce element types; the only observable
//! effect of the kind is the byte-array predicate. Arrays are the one
//! collection mutated in place, so the buffer sits behind an `RwLock`.

use crate::error::Error;
use crate::value::Value;
use parking_lot::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    Object,
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
}

impl ArrayKind {
    /// Initial element for a freshly allocated array of this kind.
    fn default_element(self) -> Value {
        match self {
            ArrayKind::Object => Value::Nil,
            ArrayKind::Boolean => Value::Bool(false),
            ArrayKind::Byte | ArrayKind::Short | ArrayKind::Int | ArrayKind::Long => Value::Int(0),
            ArrayKind::Float | ArrayKind::Double => Value::Float(0.0),
            ArrayKind::Char => Value::Char('\0'),
        }
    }
}

#[derive(Debug)]
pub struct ArrayData {
    kind: ArrayKind,
    items: RwLock<Vec<Value>>,
}

impl ArrayData {
    pub fn new(kind: ArrayKind, len: usize) -> ArrayData {
        ArrayData {
            kind,
            items: RwLock::new(vec![kind.default_element(); len]),
        }
    }

    pub fn from_vec(kind: ArrayKind, items: Vec<Value>) -> ArrayData {
        ArrayData {
            kind,
            items: RwLock::new(items),
        }
    }

    pub fn kind(&self) -> ArrayKind {
        self.kind
    }

    pub fn is_bytes(&self) -> bool {
        self.kind == ArrayKind::Byte
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn aget(&self, index: i64) -> Result<Value, Error> {
        let items = self.items.read();
        if index >= 0 {
            if let Some(v) = items.get(index as usize) {
                return Ok(v.clone());
            }
        }
        Err(Error::index(format!(
            "Index {} out of bounds for array of length {}",
            index,
            items.len()
        )))
    }

    pub fn aset(&self, index: i64, v: Value) -> Result<Value, Error> {
        let mut items = self.items.write();
        if index >= 0 {
            if let Some(slot) = items.get_mut(index as usize) {
                *slot = v.clone();
                return Ok(v);
            }
        }
        Err(Error::index(format!(
            "Index {} out of bounds for array of length {}",
            index,
            items.len()
        )))
    }

    /// Snapshot of the current contents, for seq views and printing.
    pub fn to_vec(&self) -> Vec<Value> {
        self.items.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aset_aget() {
        let arr = ArrayData::new(ArrayKind::Object, 3);
        arr.aset(1, Value::Int(7)).unwrap();
        assert_eq!(arr.aget(1).unwrap(), Value::Int(7));
        assert_eq!(arr.aget(0).unwrap(), Value::Nil);
        assert!(arr.aget(3).is_err());
        assert!(arr.aset(-1, Value::Nil).is_err());
    }

    #[test]
    fn test_bytes_predicate() {
        assert!(ArrayData::new(ArrayKind::Byte, 2).is_bytes());
        assert!(!ArrayData::new(ArrayKind::Int, 2).is_bytes());
    }

    #[test]
    fn test_numeric_kind_defaults_to_zero() {
        let arr = ArrayData::new(ArrayKind::Long, 2);
        assert_eq!(arr.aget(0).unwrap(), Value::Int(0));
    }
}
