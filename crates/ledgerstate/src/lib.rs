//! ## Crate layout
//! - `core`: the state-access engine (keys, codecs, CRUD, listings,
//!   key references, query compiler, observability and config).
//!
//! The `prelude` module mirrors the surface used inside transaction handlers.

pub use ledgerstate_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Re-exports
//

pub use crate::core::{error::StateError, ledger::MemoryLedger, state::State};

///
/// Handler Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        codec::{Cbor, FromBytes as _, Record, ToBytes as _},
        config::{PrivateListing, StateConfig},
        error::StateError,
        index::{KeyRef, KeyRefId},
        key::{Key, Keyer, Namespaced},
        ledger::Ledger as _,
        query::{Combination, CombinationType, Filter, QueryBuilder, SortDirection},
        state::{HistoryEntry, Page, State},
    };
    pub use serde::{Deserialize, Serialize};
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use super::{MemoryLedger, VERSION};

    #[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
    struct Car {
        id: String,
        make: String,
    }

    impl Namespaced for Car {
        const NAMESPACE: &'static [&'static str] = &["CAR"];
    }

    impl Keyer for Car {
        fn key(&self) -> Result<Key, StateError> {
            Ok(Self::namespace().append(self.id.as_str()))
        }
    }

    impl Record for Car {}

    #[test]
    fn version_matches_manifest() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn prelude_covers_a_handler() {
        let mut ledger = MemoryLedger::new();
        let mut state = State::new(&mut ledger);
        let car = Car {
            id: "1".into(),
            make: "vw".into(),
        };

        state.insert_entity(&car).unwrap();
        state
            .build_key_ref(Car::schema_tag(), "make", "vw", car.key().unwrap())
            .unwrap();

        let found: Car = state
            .get_by_key_ref(&KeyRefId::for_entity::<Car>("make", "vw"))
            .unwrap();
        assert_eq!(found, car);
        assert_eq!(state.list::<Car>(Car::namespace()).unwrap(), vec![car]);
    }
}
