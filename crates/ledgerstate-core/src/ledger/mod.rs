//! Module: ledger
//! Responsibility: the accessor contract the engine is written against.
//! Does not own: replication, commit-time conflict detection, or cursor
//! arithmetic; those belong to the ledger platform.
//! Boundary: every platform call made by `state` goes through [`Ledger`].

mod memory;
mod selector;

pub use memory::{MemoryIter, MemoryLedger};

use crate::key::composite::{self, CompositeKeyError};
use thiserror::Error as ThisError;

///
/// LedgerError
///
/// Failures raised below the accessor boundary. The engine cannot tell these
/// apart any further and wraps all of them as `StateError::UnderlyingIo`.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum LedgerError {
    #[error("ledger io: {0}")]
    Io(String),

    #[error("operation not supported by this ledger: {0}")]
    Unsupported(&'static str),

    #[error("iterator already closed")]
    IteratorClosed,
}

///
/// KeyValue
/// One row yielded by a range, partial-key or rich-query iterator.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

///
/// KeyModification
/// One committed mutation of a single key, as returned by history iteration.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyModification {
    pub tx_id: String,
    pub timestamp: i64,
    pub is_delete: bool,
    pub value: Vec<u8>,
}

///
/// QueryMetadata
/// Paginated-iterator metadata; `bookmark` is opaque and forwarded verbatim.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryMetadata {
    pub fetched_records_count: u32,
    pub bookmark: String,
}

///
/// LedgerIterator
///
/// Platform cursor. `Iterator::next` covers has-next/next; `close` releases the
/// platform-side resource and must be called exactly once.
///

pub trait LedgerIterator<T>: Iterator<Item = Result<T, LedgerError>> {
    fn close(&mut self) -> Result<(), LedgerError>;
}

pub type BoxedIter<'a, T> = Box<dyn LedgerIterator<T> + 'a>;

///
/// Ledger
///
/// Raw per-transaction accessor. Absent keys read as an empty byte vector.
/// Composite-key construction defaults to the platform encoding in
/// `key::composite`; backends only override it when their separator differs.
///

pub trait Ledger {
    fn get_state(&self, key: &str) -> Result<Vec<u8>, LedgerError>;

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;

    fn del_state(&mut self, key: &str) -> Result<(), LedgerError>;

    fn state_by_partial_composite_key(
        &self,
        object_type: &str,
        attributes: &[String],
    ) -> Result<BoxedIter<'_, KeyValue>, LedgerError>;

    fn state_by_partial_composite_key_with_pagination(
        &self,
        object_type: &str,
        attributes: &[String],
        page_size: u32,
        bookmark: &str,
    ) -> Result<(BoxedIter<'_, KeyValue>, QueryMetadata), LedgerError>;

    fn create_composite_key(
        &self,
        object_type: &str,
        attributes: &[String],
    ) -> Result<String, CompositeKeyError> {
        composite::create_composite_key(object_type, attributes)
    }

    fn split_composite_key(&self, key: &str) -> Result<(String, Vec<String>), CompositeKeyError> {
        composite::split_composite_key(key)
    }

    // ------------------------------------------------------------------
    // Private collections
    // ------------------------------------------------------------------

    fn get_private_data(&self, collection: &str, key: &str) -> Result<Vec<u8>, LedgerError>;

    fn put_private_data(
        &mut self,
        collection: &str,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), LedgerError>;

    fn del_private_data(&mut self, collection: &str, key: &str) -> Result<(), LedgerError>;

    fn private_data_by_partial_composite_key(
        &self,
        collection: &str,
        object_type: &str,
        attributes: &[String],
    ) -> Result<BoxedIter<'_, KeyValue>, LedgerError>;

    // ------------------------------------------------------------------
    // History and rich queries
    // ------------------------------------------------------------------

    fn history_for_key(&self, key: &str) -> Result<BoxedIter<'_, KeyModification>, LedgerError>;

    /// Document query; only capable state databases implement it.
    fn query_result(&self, _query: &str) -> Result<BoxedIter<'_, KeyValue>, LedgerError> {
        Err(LedgerError::Unsupported("rich query"))
    }

    fn query_result_with_pagination(
        &self,
        _query: &str,
        _page_size: u32,
        _bookmark: &str,
    ) -> Result<(BoxedIter<'_, KeyValue>, QueryMetadata), LedgerError> {
        Err(LedgerError::Unsupported("paginated rich query"))
    }
}

///
/// ScopedIter
///
/// Owns a platform cursor for the duration of one engine call and closes it on
/// every exit path. `finish` closes eagerly and reports the close result; if
/// the guard is dropped first (early return, `?`, panic) it closes silently.
///

pub(crate) struct ScopedIter<'a, T> {
    inner: BoxedIter<'a, T>,
    closed: bool,
}

impl<'a, T> ScopedIter<'a, T> {
    pub(crate) fn new(inner: BoxedIter<'a, T>) -> Self {
        Self {
            inner,
            closed: false,
        }
    }

    pub(crate) fn finish(mut self) -> Result<(), LedgerError> {
        self.closed = true;
        self.inner.close()
    }
}

impl<T> Iterator for ScopedIter<'_, T> {
    type Item = Result<T, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }

        self.inner.next()
    }
}

impl<T> Drop for ScopedIter<'_, T> {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.inner.close();
        }
    }
}
