use crate::{
    codec::{FromBytes, ToBytes},
    error::StateError,
    key::{KeyInput, Keyer, TransformedKey},
    ledger::Ledger,
    obs::{OpKind, StateEvent},
    state::{Partition, State, guard_namespace},
};

///
/// Public world-state operations
///

impl<L: Ledger + ?Sized> State<'_, L> {
    /// Decode the entry under `key`; a missing entry fails with `NotFound`.
    pub fn get<'k, T: FromBytes>(&self, key: impl Into<KeyInput<'k>>) -> Result<T, StateError> {
        let result = self
            .fetch(Partition::Public, key.into())
            .and_then(|(key, value)| {
                value.ok_or_else(|| StateError::not_found(key.origin.to_string()))
            });

        self.observe(OpKind::Get, result)
    }

    /// Decode the entry under `key`, or return `default` when it is missing.
    pub fn get_or<'k, T: FromBytes>(
        &self,
        key: impl Into<KeyInput<'k>>,
        default: T,
    ) -> Result<T, StateError> {
        let result = self
            .fetch(Partition::Public, key.into())
            .map(|(_, value)| value.unwrap_or(default));

        self.observe(OpKind::Get, result)
    }

    pub fn get_opt<'k, T: FromBytes>(
        &self,
        key: impl Into<KeyInput<'k>>,
    ) -> Result<Option<T>, StateError> {
        let result = self.fetch(Partition::Public, key.into()).map(|(_, value)| value);

        self.observe(OpKind::Get, result)
    }

    /// Integer stored in text form, or `default` when missing.
    pub fn get_int<'k>(
        &self,
        key: impl Into<KeyInput<'k>>,
        default: i64,
    ) -> Result<i64, StateError> {
        self.get_or(key, default)
    }

    /// True iff the stored payload is non-empty.
    pub fn exists<'k>(&self, key: impl Into<KeyInput<'k>>) -> Result<bool, StateError> {
        let result = self.presence(Partition::Public, key.into());

        self.observe(OpKind::Exists, result)
    }

    /// Unconditional overwrite of `key` with `value`.
    pub fn put<'k, V: ToBytes + ?Sized>(
        &mut self,
        key: impl Into<KeyInput<'k>>,
        value: &V,
    ) -> Result<(), StateError> {
        let result = self.write(Partition::Public, key.into(), value, OpKind::Put);

        self.observe(OpKind::Put, result)
    }

    /// Store an entity under its own key.
    pub fn put_entity<E: Keyer + ToBytes>(&mut self, entity: &E) -> Result<(), StateError> {
        self.put(entity, entity)
    }

    /// Store under the entity's key, with at most one payload override.
    pub fn put_with_values<E, V>(&mut self, entity: &E, values: &[V]) -> Result<(), StateError>
    where
        E: Keyer + ToBytes,
        V: ToBytes,
    {
        match values {
            [] => self.put(entity, entity),
            [value] => self.put(entity, value),
            _ => self.observe(
                OpKind::Put,
                Err(StateError::TooManyValues {
                    count: values.len(),
                }),
            ),
        }
    }

    /// `put` that fails with `AlreadyExists` when the key is taken.
    ///
    /// The check is advisory; concurrent writers are arbitrated by the
    /// platform at commit.
    pub fn insert<'k, V: ToBytes + ?Sized>(
        &mut self,
        key: impl Into<KeyInput<'k>>,
        value: &V,
    ) -> Result<(), StateError> {
        let result = self.write(Partition::Public, key.into(), value, OpKind::Insert);

        self.observe(OpKind::Insert, result)
    }

    pub fn insert_entity<E: Keyer + ToBytes>(&mut self, entity: &E) -> Result<(), StateError> {
        self.insert(entity, entity)
    }

    pub fn insert_with_values<E, V>(&mut self, entity: &E, values: &[V]) -> Result<(), StateError>
    where
        E: Keyer + ToBytes,
        V: ToBytes,
    {
        match values {
            [] => self.insert(entity, entity),
            [value] => self.insert(entity, value),
            _ => self.observe(
                OpKind::Insert,
                Err(StateError::TooManyValues {
                    count: values.len(),
                }),
            ),
        }
    }

    /// Remove `key`; succeeds whether or not it was present.
    pub fn delete<'k>(&mut self, key: impl Into<KeyInput<'k>>) -> Result<(), StateError> {
        let result = self.remove(Partition::Public, key.into());

        self.observe(OpKind::Delete, result)
    }
}

// ----------------------------------------------------------------------
// Partition-generic primitives shared with the private and index paths
// ----------------------------------------------------------------------

impl<L: Ledger + ?Sized> State<'_, L> {
    pub(crate) fn read_raw(
        &self,
        partition: Partition<'_>,
        key: &str,
    ) -> Result<Vec<u8>, StateError> {
        let bytes = match partition {
            Partition::Public => self.ledger.get_state(key)?,
            Partition::Private(collection) => self.ledger.get_private_data(collection, key)?,
        };

        Ok(bytes)
    }

    pub(crate) fn fetch<T: FromBytes>(
        &self,
        partition: Partition<'_>,
        input: KeyInput<'_>,
    ) -> Result<(TransformedKey, Option<T>), StateError> {
        let key = self.key(input)?;
        let bytes = self.read_raw(partition, &key.string)?;

        self.emit(StateEvent::Read {
            op: OpKind::Get,
            target: &key.string,
            collection: partition.collection(),
            found: !bytes.is_empty(),
        });

        if bytes.is_empty() {
            return Ok((key, None));
        }
        let value = self.codec.decode(bytes)?;

        Ok((key, Some(value)))
    }

    pub(crate) fn presence(
        &self,
        partition: Partition<'_>,
        input: KeyInput<'_>,
    ) -> Result<bool, StateError> {
        let key = self.key(input)?;
        let found = !self.read_raw(partition, &key.string)?.is_empty();

        self.emit(StateEvent::Read {
            op: OpKind::Exists,
            target: &key.string,
            collection: partition.collection(),
            found,
        });

        Ok(found)
    }

    pub(crate) fn write<V: ToBytes + ?Sized>(
        &mut self,
        partition: Partition<'_>,
        input: KeyInput<'_>,
        value: &V,
        op: OpKind,
    ) -> Result<(), StateError> {
        let key = self.key(input)?;
        guard_namespace(&key)?;

        self.store(partition, &key, value, op)
    }

    /// Encode and write under an already-resolved key. `Insert` checks for an
    /// existing payload first.
    pub(crate) fn store<V: ToBytes + ?Sized>(
        &mut self,
        partition: Partition<'_>,
        key: &TransformedKey,
        value: &V,
        op: OpKind,
    ) -> Result<(), StateError> {
        if op == OpKind::Insert && !self.read_raw(partition, &key.string)?.is_empty() {
            self.emit(StateEvent::Conflict {
                op,
                target: &key.string,
            });
            return Err(StateError::already_exists(key.origin.to_string()));
        }

        let bytes = self.codec.encode(value)?;
        let len = bytes.len();
        match partition {
            Partition::Public => self.ledger.put_state(&key.string, bytes)?,
            Partition::Private(collection) => {
                self.ledger.put_private_data(collection, &key.string, bytes)?;
            }
        }

        self.emit(StateEvent::Write {
            op,
            target: &key.string,
            collection: partition.collection(),
            bytes: len,
        });

        Ok(())
    }

    pub(crate) fn remove(
        &mut self,
        partition: Partition<'_>,
        input: KeyInput<'_>,
    ) -> Result<(), StateError> {
        let key = self.key(input)?;
        guard_namespace(&key)?;

        self.erase(partition, &key)
    }

    pub(crate) fn erase(
        &mut self,
        partition: Partition<'_>,
        key: &TransformedKey,
    ) -> Result<(), StateError> {
        match partition {
            Partition::Public => self.ledger.del_state(&key.string)?,
            Partition::Private(collection) => {
                self.ledger.del_private_data(collection, &key.string)?;
            }
        }

        self.emit(StateEvent::Write {
            op: OpKind::Delete,
            target: &key.string,
            collection: partition.collection(),
            bytes: 0,
        });

        Ok(())
    }
}
