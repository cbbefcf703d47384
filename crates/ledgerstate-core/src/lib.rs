//! Typed state access over a ledger's raw key-value accessor: key derivation,
//! payload encoding, CRUD over public and private partitions, listings and
//! history, key-reference indexes and a document-query compiler.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod codec;
pub mod config;
pub mod error;
pub mod index;
pub mod key;
pub mod ledger;
pub mod obs;
pub mod query;
pub mod state;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Domain vocabulary only. Sinks, transformers and the in-memory ledger are
/// imported from their modules.
///

pub mod prelude {
    pub use crate::{
        codec::{Cbor, FromBytes, Record, ToBytes},
        error::StateError,
        index::{KeyRef, KeyRefId},
        key::{Key, Keyer, Namespaced},
        ledger::Ledger,
        query::{Combination, CombinationType, Filter, QueryBuilder, SortDirection},
        state::{HistoryEntry, Page, State},
    };
}
