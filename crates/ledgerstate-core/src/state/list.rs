use crate::{
    codec::FromBytes,
    config::PrivateListing,
    error::StateError,
    key::{KeyInput, composite::create_composite_key},
    ledger::{BoxedIter, KeyValue, Ledger, ScopedIter},
    obs::{OpKind, StateEvent},
    query::QueryBuilder,
    state::{HistoryEntry, Page, State},
};

impl<L: Ledger + ?Sized> State<'_, L> {
    /// Every entry under `namespace`, in composite-key byte order.
    ///
    /// A row that fails to decode aborts the listing; partial results are
    /// never returned.
    pub fn list<'k, T: FromBytes>(
        &self,
        namespace: impl Into<KeyInput<'k>>,
    ) -> Result<Vec<T>, StateError> {
        let result = self.list_public(namespace.into());

        self.observe(OpKind::List, result)
    }

    /// One page of `namespace`; pass the returned bookmark to continue.
    pub fn paginate_list<'k, T: FromBytes>(
        &self,
        namespace: impl Into<KeyInput<'k>>,
        page_size: u32,
        bookmark: &str,
    ) -> Result<Page<T>, StateError> {
        let result = self.paginate_public(namespace.into(), page_size, bookmark);

        self.observe(OpKind::Paginate, result)
    }

    /// Committed mutations of `key`, newest first, tombstones included.
    pub fn history<'k, T: FromBytes>(
        &self,
        key: impl Into<KeyInput<'k>>,
    ) -> Result<Vec<HistoryEntry<T>>, StateError> {
        let result = self.history_of(key.into());

        self.observe(OpKind::History, result)
    }

    /// Private listing with the configured strategy.
    pub fn list_private<'k, T: FromBytes>(
        &self,
        collection: &str,
        namespace: impl Into<KeyInput<'k>>,
    ) -> Result<Vec<T>, StateError> {
        self.list_private_with(collection, self.config.private_listing, namespace)
    }

    pub fn list_private_with<'k, T: FromBytes>(
        &self,
        collection: &str,
        strategy: PrivateListing,
        namespace: impl Into<KeyInput<'k>>,
    ) -> Result<Vec<T>, StateError> {
        let result = self.scan_private(collection, strategy, namespace.into());

        self.observe(OpKind::List, result)
    }

    /// Run a document query, reading at most `limit` rows.
    pub fn rich_query<T: FromBytes>(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<T>, StateError> {
        let result = self.run_rich_query(query, limit);

        self.observe(OpKind::Query, result)
    }

    /// Paginated document query.
    pub fn rich_list_query<T: FromBytes>(
        &self,
        query: &str,
        page_size: u32,
        bookmark: &str,
    ) -> Result<Page<T>, StateError> {
        let result = self.run_rich_list_query(query, page_size, bookmark);

        self.observe(OpKind::Query, result)
    }

    /// Compile `builder` and run it; the builder's limit, or the configured
    /// page size, caps the rows read.
    pub fn query<T: FromBytes>(&self, builder: &QueryBuilder) -> Result<Vec<T>, StateError> {
        let result = builder.build().and_then(|query| {
            let limit = builder
                .limit()
                .unwrap_or(self.config.query_page_size as usize);
            self.run_rich_query(&query, limit)
        });

        self.observe(OpKind::Query, result)
    }
}

impl<L: Ledger + ?Sized> State<'_, L> {
    /// Transformed listing prefix split into `(object_type, attributes)`.
    ///
    /// Parts are validated here so a malformed prefix never reaches the
    /// ledger and always surfaces as `InvalidKeyPart`.
    fn prefix(&self, input: KeyInput<'_>) -> Result<(String, Vec<String>), StateError> {
        let mut parts = self
            .key_transformer
            .transform(input.normalize()?)?
            .into_parts();
        if parts.is_empty() {
            return Err(StateError::EmptyKey);
        }
        let object_type = parts.remove(0);
        create_composite_key(&object_type, &parts)?;

        Ok((object_type, parts))
    }

    fn list_public<T: FromBytes>(&self, input: KeyInput<'_>) -> Result<Vec<T>, StateError> {
        let (object_type, attributes) = self.prefix(input)?;

        let iter = self
            .ledger
            .state_by_partial_composite_key(&object_type, &attributes)?;
        let items = self.decode_rows(iter, usize::MAX)?;

        self.emit(StateEvent::Scan {
            op: OpKind::List,
            target: &object_type,
            collection: None,
            rows: items.len(),
        });

        Ok(items)
    }

    fn paginate_public<T: FromBytes>(
        &self,
        input: KeyInput<'_>,
        page_size: u32,
        bookmark: &str,
    ) -> Result<Page<T>, StateError> {
        let (object_type, attributes) = self.prefix(input)?;

        let (iter, metadata) = self.ledger.state_by_partial_composite_key_with_pagination(
            &object_type,
            &attributes,
            page_size,
            bookmark,
        )?;
        let items = self.decode_rows(iter, usize::MAX)?;

        self.emit(StateEvent::Scan {
            op: OpKind::Paginate,
            target: &object_type,
            collection: None,
            rows: items.len(),
        });

        Ok(Page {
            items,
            bookmark: metadata.bookmark,
            fetched: metadata.fetched_records_count,
        })
    }

    fn history_of<T: FromBytes>(
        &self,
        input: KeyInput<'_>,
    ) -> Result<Vec<HistoryEntry<T>>, StateError> {
        let key = self.key(input)?;
        let mut rows = ScopedIter::new(self.ledger.history_for_key(&key.string)?);

        let mut entries = Vec::new();
        for row in rows.by_ref() {
            let modification = row?;
            let value = if modification.value.is_empty() {
                None
            } else {
                let value = self.codec.decode(modification.value).map_err(|err| {
                    StateError::unexpected(format_args!(
                        "history of {} at tx {}: {err}",
                        key.origin, modification.tx_id
                    ))
                })?;
                Some(value)
            };

            entries.push(HistoryEntry {
                tx_id: modification.tx_id,
                timestamp: modification.timestamp,
                is_deleted: modification.is_delete,
                value,
            });
        }
        rows.finish()?;

        self.emit(StateEvent::Scan {
            op: OpKind::History,
            target: &key.string,
            collection: None,
            rows: entries.len(),
        });

        Ok(entries)
    }

    fn scan_private<T: FromBytes>(
        &self,
        collection: &str,
        strategy: PrivateListing,
        input: KeyInput<'_>,
    ) -> Result<Vec<T>, StateError> {
        let (object_type, attributes) = self.prefix(input)?;

        let items = match strategy {
            PrivateListing::PrivateIterator => {
                let iter = self.ledger.private_data_by_partial_composite_key(
                    collection,
                    &object_type,
                    &attributes,
                )?;
                self.decode_rows(iter, usize::MAX)?
            }
            PrivateListing::PublicKeys => {
                let iter = self
                    .ledger
                    .state_by_partial_composite_key(&object_type, &attributes)?;
                let mut rows = ScopedIter::new(iter);

                let mut items = Vec::new();
                for row in rows.by_ref() {
                    let KeyValue { key, .. } = row?;
                    let bytes = self.ledger.get_private_data(collection, &key)?;
                    if bytes.is_empty() {
                        return Err(StateError::not_found(key));
                    }
                    items.push(self.decode_row(&key, bytes)?);
                }
                rows.finish()?;

                items
            }
        };

        self.emit(StateEvent::Scan {
            op: OpKind::List,
            target: &object_type,
            collection: Some(collection),
            rows: items.len(),
        });

        Ok(items)
    }

    fn run_rich_query<T: FromBytes>(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<T>, StateError> {
        let iter = self.ledger.query_result(query)?;
        let items = self.decode_rows(iter, limit)?;

        self.emit(StateEvent::Scan {
            op: OpKind::Query,
            target: query,
            collection: None,
            rows: items.len(),
        });

        Ok(items)
    }

    fn run_rich_list_query<T: FromBytes>(
        &self,
        query: &str,
        page_size: u32,
        bookmark: &str,
    ) -> Result<Page<T>, StateError> {
        let (iter, metadata) = self
            .ledger
            .query_result_with_pagination(query, page_size, bookmark)?;
        let items = self.decode_rows(iter, usize::MAX)?;

        self.emit(StateEvent::Scan {
            op: OpKind::Query,
            target: query,
            collection: None,
            rows: items.len(),
        });

        Ok(Page {
            items,
            bookmark: metadata.bookmark,
            fetched: metadata.fetched_records_count,
        })
    }

    /// Rows under `namespace` as `(ledger key, value)` pairs.
    pub(crate) fn list_entries<T: FromBytes>(
        &self,
        input: KeyInput<'_>,
    ) -> Result<Vec<(String, T)>, StateError> {
        let (object_type, attributes) = self.prefix(input)?;
        let mut rows = ScopedIter::new(
            self.ledger
                .state_by_partial_composite_key(&object_type, &attributes)?,
        );

        let mut entries = Vec::new();
        for row in rows.by_ref() {
            let KeyValue { key, value } = row?;
            let value = self.decode_row(&key, value)?;
            entries.push((key, value));
        }
        rows.finish()?;

        self.emit(StateEvent::Scan {
            op: OpKind::KeyRef,
            target: &object_type,
            collection: None,
            rows: entries.len(),
        });

        Ok(entries)
    }

    /// Drain at most `limit` rows and close the cursor.
    pub(crate) fn decode_rows<T: FromBytes>(
        &self,
        iter: BoxedIter<'_, KeyValue>,
        limit: usize,
    ) -> Result<Vec<T>, StateError> {
        let mut rows = ScopedIter::new(iter);

        let mut items = Vec::new();
        for row in rows.by_ref().take(limit) {
            let KeyValue { key, value } = row?;
            items.push(self.decode_row(&key, value)?);
        }
        rows.finish()?;

        Ok(items)
    }

    fn decode_row<T: FromBytes>(&self, key: &str, bytes: Vec<u8>) -> Result<T, StateError> {
        self.codec
            .decode(bytes)
            .map_err(|err| StateError::unexpected(format_args!("row {key:?}: {err}")))
    }
}
