use crate::{
    codec::Record,
    error::StateError,
    key::{Key, Keyer, Namespaced},
    ledger::MemoryLedger,
    obs::MetricsSink,
    state::State,
};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

///
/// Book
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Book {
    pub(crate) isbn: String,
    pub(crate) title: String,
    pub(crate) pages: u32,
}

impl Book {
    pub(crate) fn new(isbn: &str, title: &str, pages: u32) -> Self {
        Self {
            isbn: isbn.to_string(),
            title: title.to_string(),
            pages,
        }
    }
}

impl Namespaced for Book {
    const NAMESPACE: &'static [&'static str] = &["BOOK"];
}

impl Keyer for Book {
    fn key(&self) -> Result<Key, StateError> {
        Ok(Self::namespace().append(self.isbn.as_str()))
    }
}

impl Record for Book {}

/// Engine over `ledger` recording into a fresh metrics sink.
pub(crate) fn metered(ledger: &mut MemoryLedger) -> (State<'_, MemoryLedger>, Rc<MetricsSink>) {
    let sink = Rc::new(MetricsSink::new());
    let state = State::with_sink(ledger, sink.clone());

    (state, sink)
}
