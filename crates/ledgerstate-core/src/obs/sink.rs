//! Event sink boundary.
//!
//! Core state logic MUST NOT call a logger directly.
//! All instrumentation flows through StateEvent and StateSink.
use crate::error::StateError;
use std::fmt;
use tracing::{debug, warn};

///
/// OpKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OpKind {
    Get,
    Exists,
    Put,
    Insert,
    Delete,
    List,
    Paginate,
    History,
    Query,
    KeyRef,
}

impl OpKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Exists => "exists",
            Self::Put => "put",
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::List => "list",
            Self::Paginate => "paginate",
            Self::History => "history",
            Self::Query => "query",
            Self::KeyRef => "key_ref",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// StateEvent
///
/// `target` is the encoded ledger key, the listing namespace or the query
/// text; `collection` is set for private-collection calls.
///

#[derive(Clone, Copy, Debug)]
pub enum StateEvent<'a> {
    Read {
        op: OpKind,
        target: &'a str,
        collection: Option<&'a str>,
        found: bool,
    },
    Write {
        op: OpKind,
        target: &'a str,
        collection: Option<&'a str>,
        bytes: usize,
    },
    Scan {
        op: OpKind,
        target: &'a str,
        collection: Option<&'a str>,
        rows: usize,
    },
    Conflict {
        op: OpKind,
        target: &'a str,
    },
    Failure {
        op: OpKind,
        error: &'a StateError,
    },
}

///
/// StateSink
///

pub trait StateSink {
    fn record(&self, event: StateEvent<'_>);
}

///
/// TracingSink
/// Default sink: renders events as `tracing` records.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl StateSink for TracingSink {
    fn record(&self, event: StateEvent<'_>) {
        match event {
            StateEvent::Read {
                op,
                target,
                collection,
                found,
            } => {
                debug!(%op, key = ?target, ?collection, found, "state read");
            }
            StateEvent::Write {
                op,
                target,
                collection,
                bytes,
            } => {
                debug!(%op, key = ?target, ?collection, bytes, "state write");
            }
            StateEvent::Scan {
                op,
                target,
                collection,
                rows,
            } => {
                debug!(%op, target = ?target, ?collection, rows, "state scan");
            }
            StateEvent::Conflict { op, target } => {
                debug!(%op, key = ?target, "state key already exists");
            }
            StateEvent::Failure { op, error } => {
                warn!(%op, kind = %error.kind(), %error, "state operation failed");
            }
        }
    }
}

///
/// NoopSink
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl StateSink for NoopSink {
    fn record(&self, _event: StateEvent<'_>) {}
}
