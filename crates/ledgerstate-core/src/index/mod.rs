//! Module: index
//! Responsibility: key-reference rows that map a secondary attribute to a
//! primary key.
//! Does not own: keeping references in step with entity updates; callers
//! re-point or delete references when an indexed attribute changes.
//! Boundary: the only writer of the reserved `_idx` namespace.

#[cfg(test)]
mod tests;

use crate::{
    codec::{FromBytes, Record},
    error::StateError,
    key::{Key, Keyer, Namespaced},
    ledger::Ledger,
    obs::OpKind,
    state::{Partition, State},
};
use serde::{Deserialize, Serialize};

/// Namespace shared by every key reference.
pub const KEY_REF_NAMESPACE: &str = "_idx";

///
/// KeyRefId
///
/// Identity of a key reference: `[_idx, schema, idx, ref_key...]`.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct KeyRefId {
    pub schema: String,
    pub idx: String,
    pub ref_key: Key,
}

impl KeyRefId {
    pub fn new(schema: impl Into<String>, idx: impl Into<String>, ref_key: impl Into<Key>) -> Self {
        Self {
            schema: schema.into(),
            idx: idx.into(),
            ref_key: ref_key.into(),
        }
    }

    /// Reference id scoped to entity type `E`.
    pub fn for_entity<E: Namespaced>(idx: impl Into<String>, ref_key: impl Into<Key>) -> Self {
        Self::new(E::schema_tag(), idx, ref_key)
    }
}

impl Keyer for KeyRefId {
    fn key(&self) -> Result<Key, StateError> {
        if self.ref_key.is_empty() {
            return Err(StateError::EmptyKey);
        }

        let prefix = Key::new([KEY_REF_NAMESPACE, self.schema.as_str(), self.idx.as_str()]);

        Ok(prefix.append(self.ref_key.clone()))
    }
}

///
/// KeyRef
///
/// Stored key reference. The payload is the primary key it points at.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct KeyRef {
    pub schema: String,
    pub idx: String,
    pub ref_key: Key,
    pub pkey: Key,
}

impl KeyRef {
    pub fn new(
        schema: impl Into<String>,
        idx: impl Into<String>,
        ref_key: impl Into<Key>,
        pkey: impl Into<Key>,
    ) -> Self {
        Self {
            schema: schema.into(),
            idx: idx.into(),
            ref_key: ref_key.into(),
            pkey: pkey.into(),
        }
    }

    pub fn for_entity<E: Namespaced>(
        idx: impl Into<String>,
        ref_key: impl Into<Key>,
        pkey: impl Into<Key>,
    ) -> Self {
        Self::new(E::schema_tag(), idx, ref_key, pkey)
    }

    #[must_use]
    pub fn id(&self) -> KeyRefId {
        KeyRefId {
            schema: self.schema.clone(),
            idx: self.idx.clone(),
            ref_key: self.ref_key.clone(),
        }
    }
}

impl Keyer for KeyRef {
    fn key(&self) -> Result<Key, StateError> {
        self.id().key()
    }
}

impl Record for KeyRef {}

///
/// Key-reference operations
///

impl<L: Ledger + ?Sized> State<'_, L> {
    /// Create a unique reference; fails with `AlreadyExists` when another
    /// primary key already claims `ref_key`.
    pub fn build_key_ref(
        &mut self,
        schema: impl Into<String>,
        idx: impl Into<String>,
        ref_key: impl Into<Key>,
        pkey: impl Into<Key>,
    ) -> Result<KeyRef, StateError> {
        let key_ref = KeyRef::new(schema, idx, ref_key, pkey);
        self.insert_key_ref(&key_ref)?;

        Ok(key_ref)
    }

    pub fn insert_key_ref(&mut self, key_ref: &KeyRef) -> Result<(), StateError> {
        let result = self.store_key_ref(key_ref, OpKind::Insert);

        self.observe(OpKind::KeyRef, result)
    }

    /// Overwrite a reference, e.g. to re-point it after the entity's primary
    /// key changed.
    pub fn put_key_ref(&mut self, key_ref: &KeyRef) -> Result<(), StateError> {
        let result = self.store_key_ref(key_ref, OpKind::Put);

        self.observe(OpKind::KeyRef, result)
    }

    /// Primary key currently claiming `id`, if any.
    pub fn lookup_key_ref(&self, id: &KeyRefId) -> Result<Option<Key>, StateError> {
        let result = self
            .fetch::<Key>(Partition::Public, id.into())
            .map(|(_, pkey)| pkey);

        self.observe(OpKind::KeyRef, result)
    }

    /// Resolve `id` and fetch the entity it points at.
    pub fn get_by_key_ref<T: FromBytes>(&self, id: &KeyRefId) -> Result<T, StateError> {
        match self.lookup_key_ref(id)? {
            Some(pkey) => self.get(pkey),
            None => self.observe(
                OpKind::KeyRef,
                Err(StateError::not_found(id.key()?.to_string())),
            ),
        }
    }

    pub fn delete_key_ref(&mut self, id: &KeyRefId) -> Result<(), StateError> {
        let result = self
            .key(id)
            .and_then(|key| self.erase(Partition::Public, &key));

        self.observe(OpKind::KeyRef, result)
    }

    /// Every reference of one index, in encoded reference-key order.
    ///
    /// Reference keys are rebuilt from the stored ledger keys, so under a
    /// hashing key transformer they come back in their transformed form.
    pub fn list_key_refs(&self, schema: &str, idx: &str) -> Result<Vec<KeyRef>, StateError> {
        let result = self.collect_key_refs(schema, idx);

        self.observe(OpKind::KeyRef, result)
    }

    fn collect_key_refs(&self, schema: &str, idx: &str) -> Result<Vec<KeyRef>, StateError> {
        let rows = self.list_entries::<Key>([KEY_REF_NAMESPACE, schema, idx].into())?;

        rows.into_iter()
            .map(|(ledger_key, pkey)| {
                let (_, mut parts) = self.ledger().split_composite_key(&ledger_key)?;
                if parts.len() < 3 {
                    return Err(StateError::unexpected(format_args!(
                        "malformed key reference {ledger_key:?}"
                    )));
                }
                let ref_key = parts.split_off(2);

                Ok(KeyRef {
                    schema: schema.to_string(),
                    idx: idx.to_string(),
                    ref_key: Key::from(ref_key),
                    pkey,
                })
            })
            .collect()
    }

    fn store_key_ref(&mut self, key_ref: &KeyRef, op: OpKind) -> Result<(), StateError> {
        let key = self.key(key_ref)?;

        self.store(Partition::Public, &key, &key_ref.pkey, op)
    }
}
