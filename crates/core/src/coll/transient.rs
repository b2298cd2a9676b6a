//! Transient collections
//!
//! Single-owner mutable builders convertible to and from their
//! persistent siblings. Each transient holds `Option<builder>` behind a
//! mutex: `persistent!` takes the builder out, and any later operation
//! on the emptied cell raises. Mutators return the same handle so
//! callers can thread it exactly as they would the persistent API.

use crate::coll::map::{PersistentArrayMap, PersistentHashMap, HASHMAP_THRESHOLD};
use crate::coll::set::PersistentHashSet;
use crate::coll::vector::PersistentVector;
use crate::equality::eql;
use crate::error::Error;
use crate::value::Value;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

const USED_AFTER: &str = "Transient used after persistent!";

#[derive(Debug)]
pub struct TransientVector {
    cell: Mutex<Option<Vec<Value>>>,
}

impl TransientVector {
    pub fn from_persistent(v: PersistentVector) -> TransientVector {
        TransientVector {
            cell: Mutex::new(Some(v.into_buf())),
        }
    }

    pub fn conj(&self, v: Value) -> Result<(), Error> {
        let mut guard = self.cell.lock();
        let items = guard.as_mut().ok_or_else(|| Error::value_err(USED_AFTER))?;
        items.push(v);
        Ok(())
    }

    pub fn assoc(&self, index: i64, v: Value) -> Result<(), Error> {
        let mut guard = self.cell.lock();
        let items = guard.as_mut().ok_or_else(|| Error::value_err(USED_AFTER))?;
        let len = items.len();
        if index < 0 || index as usize > len {
            return Err(Error::value_err(format!(
                "Index {} out of bounds for transient vector of length {}",
                index, len
            )));
        }
        if index as usize == len {
            items.push(v);
        } else {
            items[index as usize] = v;
        }
        Ok(())
    }

    pub fn pop(&self) -> Result<(), Error> {
        let mut guard = self.cell.lock();
        let items = guard.as_mut().ok_or_else(|| Error::value_err(USED_AFTER))?;
        if items.pop().is_none() {
            return Err(Error::value_err("Can't pop empty vector"));
        }
        Ok(())
    }

    pub fn len(&self) -> Result<usize, Error> {
        let guard = self.cell.lock();
        guard
            .as_ref()
            .map(Vec::len)
            .ok_or_else(|| Error::value_err(USED_AFTER))
    }

    pub fn persistent(&self) -> Result<PersistentVector, Error> {
        let mut guard = self.cell.lock();
        let items = guard.take().ok_or_else(|| Error::value_err(USED_AFTER))?;
        Ok(PersistentVector::from_vec(items))
    }
}

/// Builder representation mirroring the persistent map split: stays an
/// entry array until growth crosses the hash threshold.
#[derive(Debug)]
enum MapRepr {
    Array(Vec<(Value, Value)>),
    Hash(HashMap<Value, Value>),
}

impl MapRepr {
    fn assoc(&mut self, key: Value, value: Value) {
        match self {
            MapRepr::Array(entries) => {
                if let Some(slot) = entries.iter_mut().find(|(k, _)| eql(k, &key)) {
                    slot.1 = value;
                    return;
                }
                if entries.len() >= HASHMAP_THRESHOLD {
                    let mut table: HashMap<Value, Value> = entries.drain(..).collect();
                    table.insert(key, value);
                    *self = MapRepr::Hash(table);
                } else {
                    entries.push((key, value));
                }
            }
            MapRepr::Hash(table) => {
                table.insert(key, value);
            }
        }
    }

    fn dissoc(&mut self, key: &Value) {
        match self {
            MapRepr::Array(entries) => entries.retain(|(k, _)| !eql(k, key)),
            MapRepr::Hash(table) => {
                table.remove(key);
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            MapRepr::Array(entries) => entries.len(),
            MapRepr::Hash(table) => table.len(),
        }
    }
}

#[derive(Debug)]
pub struct TransientMap {
    cell: Mutex<Option<MapRepr>>,
}

impl TransientMap {
    pub fn from_array_map(m: PersistentArrayMap) -> TransientMap {
        TransientMap {
            cell: Mutex::new(Some(MapRepr::Array(m.into_entries()))),
        }
    }

    pub fn from_hash_map(m: PersistentHashMap) -> TransientMap {
        TransientMap {
            cell: Mutex::new(Some(MapRepr::Hash(m.into_table()))),
        }
    }

    pub fn assoc(&self, key: Value, value: Value) -> Result<(), Error> {
        let mut guard = self.cell.lock();
        let repr = guard.as_mut().ok_or_else(|| Error::value_err(USED_AFTER))?;
        repr.assoc(key, value);
        Ok(())
    }

    pub fn dissoc(&self, key: &Value) -> Result<(), Error> {
        let mut guard = self.cell.lock();
        let repr = guard.as_mut().ok_or_else(|| Error::value_err(USED_AFTER))?;
        repr.dissoc(key);
        Ok(())
    }

    pub fn len(&self) -> Result<usize, Error> {
        let guard = self.cell.lock();
        guard
            .as_ref()
            .map(MapRepr::len)
            .ok_or_else(|| Error::value_err(USED_AFTER))
    }

    /// Freeze into the representation the builder ended up in.
    pub fn persistent(&self) -> Result<Value, Error> {
        let mut guard = self.cell.lock();
        let repr = guard.take().ok_or_else(|| Error::value_err(USED_AFTER))?;
        Ok(match repr {
            MapRepr::Array(entries) => Value::Map(PersistentArrayMap::from_entries(entries)),
            MapRepr::Hash(table) => Value::HashMap(PersistentHashMap::from_table(table)),
        })
    }
}

#[derive(Debug)]
pub struct TransientSet {
    cell: Mutex<Option<HashSet<Value>>>,
}

impl TransientSet {
    pub fn from_persistent(s: PersistentHashSet) -> TransientSet {
        TransientSet {
            cell: Mutex::new(Some(s.into_table())),
        }
    }

    pub fn conj(&self, v: Value) -> Result<(), Error> {
        let mut guard = self.cell.lock();
        let items = guard.as_mut().ok_or_else(|| Error::value_err(USED_AFTER))?;
        items.insert(v);
        Ok(())
    }

    pub fn disj(&self, v: &Value) -> Result<(), Error> {
        let mut guard = self.cell.lock();
        let items = guard.as_mut().ok_or_else(|| Error::value_err(USED_AFTER))?;
        items.remove(v);
        Ok(())
    }

    pub fn len(&self) -> Result<usize, Error> {
        let guard = self.cell.lock();
        guard
            .as_ref()
            .map(HashSet::len)
            .ok_or_else(|| Error::value_err(USED_AFTER))
    }

    pub fn persistent(&self) -> Result<PersistentHashSet, Error> {
        let mut guard = self.cell.lock();
        let items = guard.take().ok_or_else(|| Error::value_err(USED_AFTER))?;
        Ok(PersistentHashSet::from_table(items))
    }
}

// ---------------------------------------------------------------------
// Value-level operations
// ---------------------------------------------------------------------

/// O(1) conversion of a persistent collection to its transient sibling.
pub fn transient(coll: &Value) -> Result<Value, Error> {
    match coll {
        Value::Vector(v) => Ok(Value::TransientVector(
            TransientVector::from_persistent(v.clone()).into(),
        )),
        Value::Map(m) => Ok(Value::TransientMap(
            TransientMap::from_array_map(m.clone()).into(),
        )),
        Value::HashMap(m) => Ok(Value::TransientMap(
            TransientMap::from_hash_map(m.clone()).into(),
        )),
        Value::Set(s) => Ok(Value::TransientSet(
            TransientSet::from_persistent(s.clone()).into(),
        )),
        other => Err(Error::type_err(format!(
            "Cannot create a transient of {}",
            other.type_name()
        ))),
    }
}

/// `conj!`: add to a transient, returning the same handle.
pub fn conj_bang(t: &Value, v: Value) -> Result<Value, Error> {
    match t {
        Value::TransientVector(tv) => {
            tv.conj(v)?;
            Ok(t.clone())
        }
        Value::TransientMap(tm) => {
            match v {
                Value::Vector(entry) if entry.len() == 2 => {
                    tm.assoc(entry.nth(0)?, entry.nth(1)?)?;
                }
                Value::Map(m) => {
                    for (k, val) in m.iter() {
                        tm.assoc(k.clone(), val.clone())?;
                    }
                }
                Value::HashMap(m) => {
                    for (k, val) in m.iter() {
                        tm.assoc(k.clone(), val.clone())?;
                    }
                }
                _ => return Err(Error::value_err("Vector arg to map conj must be a pair")),
            }
            Ok(t.clone())
        }
        Value::TransientSet(ts) => {
            ts.conj(v)?;
            Ok(t.clone())
        }
        other => Err(Error::type_err(format!(
            "conj! expects a transient, got {}",
            other.type_name()
        ))),
    }
}

/// `assoc!`: vector index or map key.
pub fn assoc_bang(t: &Value, key: Value, value: Value) -> Result<Value, Error> {
    match t {
        Value::TransientVector(tv) => match key {
            Value::Int(i) => {
                tv.assoc(i, value)?;
                Ok(t.clone())
            }
            other => Err(Error::cast(other.type_name(), "integer", 1)),
        },
        Value::TransientMap(tm) => {
            tm.assoc(key, value)?;
            Ok(t.clone())
        }
        other => Err(Error::type_err(format!(
            "assoc! expects a transient vector or map, got {}",
            other.type_name()
        ))),
    }
}

pub fn dissoc_bang(t: &Value, key: &Value) -> Result<Value, Error> {
    match t {
        Value::TransientMap(tm) => {
            tm.dissoc(key)?;
            Ok(t.clone())
        }
        other => Err(Error::type_err(format!(
            "dissoc! expects a transient map, got {}",
            other.type_name()
        ))),
    }
}

pub fn disj_bang(t: &Value, v: &Value) -> Result<Value, Error> {
    match t {
        Value::TransientSet(ts) => {
            ts.disj(v)?;
            Ok(t.clone())
        }
        other => Err(Error::type_err(format!(
            "disj! expects a transient set, got {}",
            other.type_name()
        ))),
    }
}

pub fn pop_bang(t: &Value) -> Result<Value, Error> {
    match t {
        Value::TransientVector(tv) => {
            tv.pop()?;
            Ok(t.clone())
        }
        other => Err(Error::type_err(format!(
            "pop! expects a transient vector, got {}",
            other.type_name()
        ))),
    }
}

/// `persistent!`: O(1) freeze; the transient must not be used again.
pub fn persistent_bang(t: &Value) -> Result<Value, Error> {
    match t {
        Value::TransientVector(tv) => Ok(Value::Vector(tv.persistent()?)),
        Value::TransientMap(tm) => tm.persistent(),
        Value::TransientSet(ts) => Ok(Value::Set(ts.persistent()?)),
        other => Err(Error::type_err(format!(
            "persistent! expects a transient, got {}",
            other.type_name()
        ))),
    }
}
