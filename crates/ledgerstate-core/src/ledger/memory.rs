use crate::{
    key::composite::{self, partial_key_range},
    ledger::{
        BoxedIter, KeyModification, KeyValue, Ledger, LedgerError, LedgerIterator, QueryMetadata,
        selector::DocumentQuery,
    },
};
use std::{cell::Cell, collections::BTreeMap, rc::Rc};

///
/// MemoryLedger
///
/// In-memory ledger for tests and local tooling. The key space is a
/// `BTreeMap`, so iteration follows byte order of the encoded keys exactly
/// like the platform. Writes apply immediately; every mutation is appended to
/// the key's history under the current transaction id and timestamp.
///
/// Iterators snapshot their rows at creation. Each one counts as open until
/// `close` is called, which lets tests assert that no cursor is leaked.
///

#[derive(Debug)]
pub struct MemoryLedger {
    state: BTreeMap<String, Vec<u8>>,
    private: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    history: BTreeMap<String, Vec<KeyModification>>,
    tx_id: String,
    timestamp: i64,
    rich_queries: bool,
    open_iterators: Rc<Cell<usize>>,
    failing_reads: Cell<u32>,
    failing_row: Cell<Option<usize>>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: BTreeMap::new(),
            private: BTreeMap::new(),
            history: BTreeMap::new(),
            tx_id: "tx-0".to_string(),
            timestamp: 0,
            rich_queries: true,
            open_iterators: Rc::new(Cell::new(0)),
            failing_reads: Cell::new(0),
            failing_row: Cell::new(None),
        }
    }

    /// A ledger whose state database has no document-query support.
    #[must_use]
    pub fn without_rich_queries() -> Self {
        Self {
            rich_queries: false,
            ..Self::new()
        }
    }

    /// Start a new transaction; later mutations are recorded under it.
    pub fn begin_tx(&mut self, tx_id: impl Into<String>, timestamp: i64) {
        self.tx_id = tx_id.into();
        self.timestamp = timestamp;
    }

    #[must_use]
    pub fn open_iterators(&self) -> usize {
        self.open_iterators.get()
    }

    /// Make the next `count` point reads or iterator creations fail.
    pub fn fail_next_reads(&self, count: u32) {
        self.failing_reads.set(count);
    }

    /// Make the next created iterator fail after yielding `rows` rows.
    pub fn fail_iteration_after(&self, rows: usize) {
        self.failing_row.set(Some(rows));
    }

    /// Raw stored bytes, bypassing every engine transformer.
    #[must_use]
    pub fn raw_state(&self, key: &str) -> Option<&[u8]> {
        self.state.get(key).map(Vec::as_slice)
    }

    #[must_use]
    pub fn raw_private(&self, collection: &str, key: &str) -> Option<&[u8]> {
        self.private
            .get(collection)
            .and_then(|c| c.get(key))
            .map(Vec::as_slice)
    }

    /// Number of live public entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    fn check_read(&self) -> Result<(), LedgerError> {
        let remaining = self.failing_reads.get();
        if remaining > 0 {
            self.failing_reads.set(remaining - 1);
            return Err(LedgerError::Io("injected read failure".into()));
        }

        Ok(())
    }

    fn open<T: 'static>(&self, rows: Vec<T>) -> BoxedIter<'static, T> {
        self.open_iterators.set(self.open_iterators.get() + 1);

        Box::new(MemoryIter {
            rows: rows.into_iter(),
            yielded: 0,
            fail_after: self.failing_row.take(),
            open: Rc::clone(&self.open_iterators),
            closed: false,
        })
    }

    fn record(&mut self, key: &str, is_delete: bool, value: Vec<u8>) {
        self.history
            .entry(key.to_string())
            .or_default()
            .push(KeyModification {
                tx_id: self.tx_id.clone(),
                timestamp: self.timestamp,
                is_delete,
                value,
            });
    }

    fn range(
        map: Option<&BTreeMap<String, Vec<u8>>>,
        start: &str,
        end: &str,
    ) -> impl Iterator<Item = KeyValue> {
        map.into_iter().flat_map(move |m| {
            m.range::<str, _>((
                std::ops::Bound::Included(start),
                std::ops::Bound::Excluded(end),
            ))
            .map(|(key, value)| KeyValue {
                key: key.clone(),
                value: value.clone(),
            })
        })
    }

    fn run_query(&self, query: &str) -> Result<(DocumentQuery, Vec<KeyValue>), LedgerError> {
        if !self.rich_queries {
            return Err(LedgerError::Unsupported("rich query"));
        }
        self.check_read()?;

        let query = DocumentQuery::parse(query)?;
        let mut rows: Vec<(KeyValue, serde_json::Value)> = self
            .state
            .iter()
            .filter_map(|(key, value)| {
                let doc = serde_json::from_slice::<serde_json::Value>(value).ok()?;
                doc.is_object().then(|| {
                    (
                        KeyValue {
                            key: key.clone(),
                            value: value.clone(),
                        },
                        doc,
                    )
                })
            })
            .filter(|(_, doc)| query.matches(doc))
            .collect();
        query.sort(&mut rows);

        let rows = rows.into_iter().map(|(kv, _)| kv).skip(query.skip).collect();

        Ok((query, rows))
    }
}

fn validate_key(key: &str) -> Result<(), LedgerError> {
    if key.is_empty() {
        return Err(LedgerError::Io("key must not be empty".into()));
    }

    Ok(())
}

impl Ledger for MemoryLedger {
    fn get_state(&self, key: &str) -> Result<Vec<u8>, LedgerError> {
        self.check_read()?;

        Ok(self.state.get(key).cloned().unwrap_or_default())
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        validate_key(key)?;
        self.record(key, false, value.clone());
        self.state.insert(key.to_string(), value);

        Ok(())
    }

    fn del_state(&mut self, key: &str) -> Result<(), LedgerError> {
        validate_key(key)?;
        self.record(key, true, Vec::new());
        self.state.remove(key);

        Ok(())
    }

    fn state_by_partial_composite_key(
        &self,
        object_type: &str,
        attributes: &[String],
    ) -> Result<BoxedIter<'_, KeyValue>, LedgerError> {
        self.check_read()?;
        let (start, end) = partial_key_range(object_type, attributes)
            .map_err(|err| LedgerError::Io(err.to_string()))?;

        Ok(self.open(Self::range(Some(&self.state), &start, &end).collect()))
    }

    fn state_by_partial_composite_key_with_pagination(
        &self,
        object_type: &str,
        attributes: &[String],
        page_size: u32,
        bookmark: &str,
    ) -> Result<(BoxedIter<'_, KeyValue>, QueryMetadata), LedgerError> {
        self.check_read()?;
        let (start, end) = partial_key_range(object_type, attributes)
            .map_err(|err| LedgerError::Io(err.to_string()))?;

        let start = if bookmark.is_empty() {
            start
        } else if composite::is_composite_key(bookmark)
            && start.as_str() <= bookmark
            && bookmark < end.as_str()
        {
            bookmark.to_string()
        } else {
            return Err(LedgerError::Io(format!("invalid bookmark {bookmark:?}")));
        };

        let mut rows: Vec<KeyValue> = Self::range(Some(&self.state), &start, &end).collect();
        let mut next = String::new();
        if page_size > 0 && rows.len() > page_size as usize {
            next = rows[page_size as usize].key.clone();
            rows.truncate(page_size as usize);
        }

        let metadata = QueryMetadata {
            fetched_records_count: u32::try_from(rows.len()).unwrap_or(u32::MAX),
            bookmark: next,
        };

        Ok((self.open(rows), metadata))
    }

    fn get_private_data(&self, collection: &str, key: &str) -> Result<Vec<u8>, LedgerError> {
        self.check_read()?;

        Ok(self
            .private
            .get(collection)
            .and_then(|c| c.get(key))
            .cloned()
            .unwrap_or_default())
    }

    fn put_private_data(
        &mut self,
        collection: &str,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), LedgerError> {
        validate_key(key)?;
        self.private
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), value);

        Ok(())
    }

    fn del_private_data(&mut self, collection: &str, key: &str) -> Result<(), LedgerError> {
        validate_key(key)?;
        if let Some(c) = self.private.get_mut(collection) {
            c.remove(key);
        }

        Ok(())
    }

    fn private_data_by_partial_composite_key(
        &self,
        collection: &str,
        object_type: &str,
        attributes: &[String],
    ) -> Result<BoxedIter<'_, KeyValue>, LedgerError> {
        self.check_read()?;
        let (start, end) = partial_key_range(object_type, attributes)
            .map_err(|err| LedgerError::Io(err.to_string()))?;

        Ok(self.open(Self::range(self.private.get(collection), &start, &end).collect()))
    }

    fn history_for_key(&self, key: &str) -> Result<BoxedIter<'_, KeyModification>, LedgerError> {
        self.check_read()?;
        let rows = self
            .history
            .get(key)
            .map(|mods| mods.iter().rev().cloned().collect())
            .unwrap_or_default();

        Ok(self.open(rows))
    }

    fn query_result(&self, query: &str) -> Result<BoxedIter<'_, KeyValue>, LedgerError> {
        let (query, rows) = self.run_query(query)?;
        let rows = match query.limit {
            Some(limit) => rows.into_iter().take(limit).collect(),
            None => rows,
        };

        Ok(self.open(rows))
    }

    fn query_result_with_pagination(
        &self,
        query: &str,
        page_size: u32,
        bookmark: &str,
    ) -> Result<(BoxedIter<'_, KeyValue>, QueryMetadata), LedgerError> {
        let (_, rows) = self.run_query(query)?;

        let offset = if bookmark.is_empty() {
            0
        } else {
            bookmark
                .parse::<usize>()
                .map_err(|_| LedgerError::Io(format!("invalid bookmark {bookmark:?}")))?
        };

        let total = rows.len();
        let page: Vec<KeyValue> = rows
            .into_iter()
            .skip(offset)
            .take(if page_size == 0 { usize::MAX } else { page_size as usize })
            .collect();

        let consumed = offset + page.len();
        let metadata = QueryMetadata {
            fetched_records_count: u32::try_from(page.len()).unwrap_or(u32::MAX),
            bookmark: if consumed < total {
                consumed.to_string()
            } else {
                String::new()
            },
        };

        Ok((self.open(page), metadata))
    }
}

///
/// MemoryIter
///

#[derive(Debug)]
pub struct MemoryIter<T> {
    rows: std::vec::IntoIter<T>,
    yielded: usize,
    fail_after: Option<usize>,
    open: Rc<Cell<usize>>,
    closed: bool,
}

impl<T> Iterator for MemoryIter<T> {
    type Item = Result<T, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return Some(Err(LedgerError::IteratorClosed));
        }
        if self.fail_after == Some(self.yielded) {
            return Some(Err(LedgerError::Io("injected iteration failure".into())));
        }

        let row = self.rows.next()?;
        self.yielded += 1;

        Some(Ok(row))
    }
}

impl<T> LedgerIterator<T> for MemoryIter<T> {
    fn close(&mut self) -> Result<(), LedgerError> {
        if self.closed {
            return Err(LedgerError::IteratorClosed);
        }

        self.closed = true;
        self.open.set(self.open.get().saturating_sub(1));

        Ok(())
    }
}
