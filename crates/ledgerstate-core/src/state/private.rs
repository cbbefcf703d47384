//! Private-collection variants of the CRUD operations.
//!
//! Keys resolve exactly like public keys; only the accessor calls differ.

use crate::{
    codec::{FromBytes, ToBytes},
    error::StateError,
    key::{KeyInput, Keyer},
    ledger::Ledger,
    obs::OpKind,
    state::{Partition, State},
};

impl<L: Ledger + ?Sized> State<'_, L> {
    pub fn get_private<'k, T: FromBytes>(
        &self,
        collection: &str,
        key: impl Into<KeyInput<'k>>,
    ) -> Result<T, StateError> {
        let result = self
            .fetch(Partition::Private(collection), key.into())
            .and_then(|(key, value)| {
                value.ok_or_else(|| StateError::not_found(key.origin.to_string()))
            });

        self.observe(OpKind::Get, result)
    }

    pub fn get_private_or<'k, T: FromBytes>(
        &self,
        collection: &str,
        key: impl Into<KeyInput<'k>>,
        default: T,
    ) -> Result<T, StateError> {
        let result = self
            .fetch(Partition::Private(collection), key.into())
            .map(|(_, value)| value.unwrap_or(default));

        self.observe(OpKind::Get, result)
    }

    pub fn exists_private<'k>(
        &self,
        collection: &str,
        key: impl Into<KeyInput<'k>>,
    ) -> Result<bool, StateError> {
        let result = self.presence(Partition::Private(collection), key.into());

        self.observe(OpKind::Exists, result)
    }

    pub fn put_private<'k, V: ToBytes + ?Sized>(
        &mut self,
        collection: &str,
        key: impl Into<KeyInput<'k>>,
        value: &V,
    ) -> Result<(), StateError> {
        let result = self.write(Partition::Private(collection), key.into(), value, OpKind::Put);

        self.observe(OpKind::Put, result)
    }

    pub fn put_private_entity<E: Keyer + ToBytes>(
        &mut self,
        collection: &str,
        entity: &E,
    ) -> Result<(), StateError> {
        self.put_private(collection, entity, entity)
    }

    pub fn insert_private<'k, V: ToBytes + ?Sized>(
        &mut self,
        collection: &str,
        key: impl Into<KeyInput<'k>>,
        value: &V,
    ) -> Result<(), StateError> {
        let result = self.write(Partition::Private(collection), key.into(), value, OpKind::Insert);

        self.observe(OpKind::Insert, result)
    }

    pub fn insert_private_entity<E: Keyer + ToBytes>(
        &mut self,
        collection: &str,
        entity: &E,
    ) -> Result<(), StateError> {
        self.insert_private(collection, entity, entity)
    }

    pub fn delete_private<'k>(
        &mut self,
        collection: &str,
        key: impl Into<KeyInput<'k>>,
    ) -> Result<(), StateError> {
        let result = self.remove(Partition::Private(collection), key.into());

        self.observe(OpKind::Delete, result)
    }
}
