//! Lazy and chunked sequences
//!
//! A `LazySeq` wraps a nullary thunk that, when forced, yields nil (end)
//! or a seq value. Forcing memoizes the result and releases the thunk.
//! The realization lock is held across the thunk call, so concurrent
//! forces serialize and the thunk runs exactly once; this is the only
//! suspension point in pure collection code.
//!
//! A `ChunkedCons` is a finite buffered block plus a tail producing the
//! remainder. Advancing off the end of the chunk returns the tail
//! directly so exhausted chunks are not retained.

use crate::error::Error;
use crate::value::{apply, Value};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
enum LazyState {
    Pending(Value),
    Realized(Value),
}

#[derive(Debug)]
pub struct LazySeq {
    cell: Mutex<LazyState>,
}

impl LazySeq {
    pub fn new(thunk: Value) -> LazySeq {
        LazySeq {
            cell: Mutex::new(LazyState::Pending(thunk)),
        }
    }

    /// Force realization, memoizing the result.
    ///
    /// A thunk error is NOT memoized: the thunk is restored so a later
    /// force retries. (Delays memoize errors; lazy seqs do not.)
    pub fn force(&self) -> Result<Value, Error> {
        let mut guard = self.cell.lock();
        match &*guard {
            LazyState::Realized(v) => Ok(v.clone()),
            LazyState::Pending(_) => {
                let thunk = match std::mem::replace(&mut *guard, LazyState::Realized(Value::Nil)) {
                    LazyState::Pending(t) => t,
                    LazyState::Realized(_) => unreachable!(),
                };
                match apply(&thunk, &[]) {
                    Ok(v) => {
                        *guard = LazyState::Realized(v.clone());
                        Ok(v)
                    }
                    Err(e) => {
                        *guard = LazyState::Pending(thunk);
                        Err(e)
                    }
                }
            }
        }
    }

    pub fn is_realized(&self) -> bool {
        matches!(&*self.cell.lock(), LazyState::Realized(_))
    }
}

#[derive(Debug, Clone)]
pub struct ChunkedCons {
    chunk: Arc<Vec<Value>>,
    offset: usize,
    rest: Value,
}

impl ChunkedCons {
    /// `offset` must point at a live element: `offset < chunk.len()`.
    pub fn new(chunk: Arc<Vec<Value>>, offset: usize, rest: Value) -> ChunkedCons {
        debug_assert!(offset < chunk.len());
        ChunkedCons {
            chunk,
            offset,
            rest,
        }
    }

    pub fn first(&self) -> &Value {
        &self.chunk[self.offset]
    }

    /// Remaining elements in the current chunk.
    pub fn chunk_count(&self) -> usize {
        self.chunk.len() - self.offset
    }

    pub fn chunk_nth(&self, i: usize) -> Option<&Value> {
        self.chunk.get(self.offset + i)
    }

    /// The seq after the first element. Shares the chunk while elements
    /// remain, otherwise returns the tail.
    pub fn advance(&self) -> Value {
        if self.offset + 1 < self.chunk.len() {
            Value::ChunkedCons(Arc::new(ChunkedCons {
                chunk: Arc::clone(&self.chunk),
                offset: self.offset + 1,
                rest: self.rest.clone(),
            }))
        } else {
            self.rest.clone()
        }
    }

    /// Skip the entire current chunk.
    pub fn advance_chunk(&self) -> Value {
        self.rest.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_force_memoizes_and_runs_thunk_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let thunk = Value::fn_val(None, |_| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(Value::list(vec![Value::Int(1)]))
        });
        let ls = LazySeq::new(thunk);
        assert!(!ls.is_realized());
        let a = ls.force().unwrap();
        let b = ls.force().unwrap();
        assert_eq!(a, b);
        assert!(ls.is_realized());
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_force_error_is_retried() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let thunk = Value::fn_val(None, |_| {
            if CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::value_err("flaky"))
            } else {
                Ok(Value::Nil)
            }
        });
        let ls = LazySeq::new(thunk);
        assert!(ls.force().is_err());
        assert!(!ls.is_realized());
        assert_eq!(ls.force().unwrap(), Value::Nil);
    }

    #[test]
    fn test_chunked_advance_releases_chunk() {
        let chunk = Arc::new(vec![Value::Int(1), Value::Int(2)]);
        let cc = ChunkedCons::new(chunk, 0, Value::Nil);
        assert_eq!(cc.first(), &Value::Int(1));
        assert_eq!(cc.chunk_count(), 2);

        let next = cc.advance();
        match &next {
            Value::ChunkedCons(inner) => {
                assert_eq!(inner.first(), &Value::Int(2));
                // Advancing off the end yields the rest, not a chunk view.
                assert_eq!(inner.advance(), Value::Nil);
            }
            other => panic!("expected chunked cons, got {:?}", other),
        }
    }
}
