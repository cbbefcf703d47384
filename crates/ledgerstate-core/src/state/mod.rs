//! Module: state
//! Responsibility: typed CRUD, listing, history and rich queries over one
//! ledger accessor.
//! Does not own: key encoding (`key`), payload encoding (`codec`) or cursor
//! arithmetic (`ledger`).
//! Boundary: one `State` per transaction invocation; instances are never
//! shared across invocations.

mod crud;
mod entry;
mod list;
mod private;

pub use entry::{HistoryEntry, Page};

use crate::{
    codec::{AsIs, ValueCodec, ValueTransformer},
    config::StateConfig,
    error::StateError,
    index::KEY_REF_NAMESPACE,
    key::{KeyAsIs, KeyInput, KeyTransformer, TransformedKey, encode_key},
    ledger::Ledger,
    obs::{OpKind, StateEvent, StateSink, TracingSink},
};
use std::rc::Rc;

///
/// State
///
/// Typed access engine bound to a single ledger accessor.
///
/// Reads take `&self`; writes take `&mut self` because they mutate the
/// accessor. Key and value transformers are injected per instance and
/// default to identity.
///

pub struct State<'a, L: Ledger + ?Sized> {
    ledger: &'a mut L,
    key_transformer: Box<dyn KeyTransformer>,
    codec: ValueCodec,
    sink: Rc<dyn StateSink>,
    config: StateConfig,
}

impl<'a, L: Ledger + ?Sized> State<'a, L> {
    /// Engine with identity transformers, default config and `TracingSink`.
    pub fn new(ledger: &'a mut L) -> Self {
        Self::with_sink(ledger, Rc::new(TracingSink))
    }

    pub fn with_sink(ledger: &'a mut L, sink: Rc<dyn StateSink>) -> Self {
        let config = StateConfig::default();

        Self {
            ledger,
            key_transformer: Box::new(KeyAsIs),
            codec: ValueCodec::new(Box::new(AsIs), config.max_value_bytes),
            sink,
            config,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: StateConfig) -> Self {
        self.codec.set_max_value_bytes(config.max_value_bytes);
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_key_transformer(mut self, transformer: impl KeyTransformer + 'static) -> Self {
        self.key_transformer = Box::new(transformer);
        self
    }

    #[must_use]
    pub fn with_value_transformer(mut self, transformer: impl ValueTransformer + 'static) -> Self {
        self.codec.set_transformer(Box::new(transformer));
        self
    }

    #[must_use]
    pub const fn config(&self) -> &StateConfig {
        &self.config
    }

    /// Read-only view of the accessor, e.g. for composite-key splitting.
    #[must_use]
    pub fn ledger(&self) -> &L {
        &*self.ledger
    }

    /// Run a key source through normalize, transform and encode.
    pub fn key<'k>(&self, input: impl Into<KeyInput<'k>>) -> Result<TransformedKey, StateError> {
        let origin = input.into().normalize()?;
        let parts = self.key_transformer.transform(origin.clone())?;
        let string = encode_key(&*self.ledger, &parts)?;

        Ok(TransformedKey {
            origin,
            parts,
            string,
        })
    }

    pub(crate) fn emit(&self, event: StateEvent<'_>) {
        self.sink.record(event);
    }

    /// Report a failed result to the sink and hand it back unchanged.
    pub(crate) fn observe<T>(
        &self,
        op: OpKind,
        result: Result<T, StateError>,
    ) -> Result<T, StateError> {
        if let Err(error) = &result {
            self.sink.record(StateEvent::Failure { op, error });
        }

        result
    }
}

///
/// Partition
/// Public world state or one named private collection.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Partition<'c> {
    Public,
    Private(&'c str),
}

impl<'c> Partition<'c> {
    pub(crate) const fn collection(self) -> Option<&'c str> {
        match self {
            Self::Public => None,
            Self::Private(collection) => Some(collection),
        }
    }
}

// Entity writes may not land in the key-reference namespace.
fn guard_namespace(key: &TransformedKey) -> Result<(), StateError> {
    match key.origin.namespace() {
        Some(namespace) if namespace == KEY_REF_NAMESPACE => Err(StateError::ReservedNamespace {
            namespace: namespace.to_string(),
        }),
        _ => Ok(()),
    }
}
