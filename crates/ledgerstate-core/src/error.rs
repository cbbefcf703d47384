use crate::ledger::LedgerError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// StateError
///
/// Every failure surfaced by the engine.
/// Accessor and codec failures are wrapped here before they leave the crate;
/// callers never observe a backend-native error type.
///

#[derive(Debug, ThisError)]
pub enum StateError {
    #[error("unable to create state key: {0}")]
    InvalidKeyShape(String),

    #[error("key parts length must be greater than zero")]
    EmptyKey,

    #[error("invalid composite key part {part:?}: {reason}")]
    InvalidKeyPart { part: String, reason: &'static str },

    #[error("namespace '{namespace}' is reserved for key references")]
    ReservedNamespace { namespace: String },

    #[error("value encode failed: {0}")]
    Encode(String),

    #[error("value decode failed: {0}")]
    Decode(String),

    #[error("state entry not found: {key}")]
    NotFound { key: String },

    #[error("state key already exists: {key}")]
    AlreadyExists { key: String },

    #[error("allow only one value, got {count}")]
    TooManyValues { count: usize },

    #[error("no selector provided for rich query")]
    NoSelector,

    #[error("invalid syntax for sort query: '{token}'")]
    InvalidSortSyntax { token: String },

    #[error("set/get error: {0}")]
    UnderlyingIo(#[from] LedgerError),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl StateError {
    pub(crate) fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub(crate) fn already_exists(key: impl Into<String>) -> Self {
        Self::AlreadyExists { key: key.into() }
    }

    pub(crate) fn unexpected(message: impl fmt::Display) -> Self {
        Self::Unexpected(message.to_string())
    }

    /// Stable kind, independent of any message text.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidKeyShape(_) => ErrorKind::InvalidKeyShape,
            Self::EmptyKey => ErrorKind::EmptyKey,
            Self::InvalidKeyPart { .. } => ErrorKind::InvalidKeyPart,
            Self::ReservedNamespace { .. } => ErrorKind::ReservedNamespace,
            Self::Encode(_) => ErrorKind::Encode,
            Self::Decode(_) => ErrorKind::Decode,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::TooManyValues { .. } => ErrorKind::TooManyValues,
            Self::NoSelector => ErrorKind::NoSelector,
            Self::InvalidSortSyntax { .. } => ErrorKind::InvalidSortSyntax,
            Self::UnderlyingIo(_) => ErrorKind::UnderlyingIo,
            Self::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// Subsystem the failure was raised in.
    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::InvalidKeyShape(_)
            | Self::EmptyKey
            | Self::InvalidKeyPart { .. }
            | Self::TooManyValues { .. } => ErrorOrigin::Key,
            Self::ReservedNamespace { .. } => ErrorOrigin::Index,
            Self::Encode(_) | Self::Decode(_) => ErrorOrigin::Codec,
            Self::NotFound { .. } | Self::AlreadyExists { .. } | Self::Unexpected(_) => {
                ErrorOrigin::Store
            }
            Self::NoSelector | Self::InvalidSortSyntax { .. } => ErrorOrigin::Query,
            Self::UnderlyingIo(_) => ErrorOrigin::Ledger,
        }
    }

    /// Wire-level status rendered by the invocation boundary.
    #[must_use]
    pub const fn status_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::AlreadyExists => 401,
            ErrorKind::NotFound => 402,
            ErrorKind::UnderlyingIo => 500,
            ErrorKind::NoSelector | ErrorKind::InvalidSortSyntax => 400,
            _ => 599,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn display_with_kind(&self) -> String {
        format!("{}:{}: {self}", self.origin(), self.kind())
    }
}

///
/// ErrorKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    InvalidKeyShape,
    EmptyKey,
    InvalidKeyPart,
    ReservedNamespace,
    Encode,
    Decode,
    NotFound,
    AlreadyExists,
    TooManyValues,
    NoSelector,
    InvalidSortSyntax,
    UnderlyingIo,
    Unexpected,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidKeyShape => "invalid_key_shape",
            Self::EmptyKey => "empty_key",
            Self::InvalidKeyPart => "invalid_key_part",
            Self::ReservedNamespace => "reserved_namespace",
            Self::Encode => "encode",
            Self::Decode => "decode",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::TooManyValues => "too_many_values",
            Self::NoSelector => "no_selector",
            Self::InvalidSortSyntax => "invalid_sort_syntax",
            Self::UnderlyingIo => "underlying_io",
            Self::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Key,
    Codec,
    Store,
    Index,
    Query,
    Ledger,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Key => "key",
            Self::Codec => "codec",
            Self::Store => "store",
            Self::Index => "index",
            Self::Query => "query",
            Self::Ledger => "ledger",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///
