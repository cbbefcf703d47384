//! Module: key
//! Responsibility: normalize heterogeneous key sources into ordered parts and
//! encode them into ledger key strings.
//! Does not own: key obfuscation policy (see `transform`) or storage.
//! Boundary: every engine call resolves its key here exactly once.

pub mod composite;
mod transform;
#[cfg(test)]
mod tests;

pub use transform::{HashedKeyTransformer, KeyAsIs, KeyTransformer};

use crate::{error::StateError, ledger::Ledger};
use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Key
///
/// Ordered key parts; part 0 is the namespace (type discriminator).
/// Encoding is a pure, order-preserving function of the parts.
///

#[derive(
    Clone,
    Debug,
    Default,
    Deref,
    Deserialize,
    Eq,
    Hash,
    IntoIterator,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[into_iterator(owned, ref)]
pub struct Key(Vec<String>);

impl Key {
    #[must_use]
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Namespace part, if the key is non-empty.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn into_parts(self) -> Vec<String> {
        self.0
    }

    /// Concatenate `other` after this key's parts.
    #[must_use]
    pub fn append(mut self, other: impl Into<Self>) -> Self {
        self.0.extend(other.into().0);
        self
    }

    pub fn push(&mut self, part: impl Into<String>) {
        self.0.push(part.into());
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" | "))
    }
}

impl From<Vec<String>> for Key {
    fn from(parts: Vec<String>) -> Self {
        Self(parts)
    }
}

impl From<Vec<&str>> for Key {
    fn from(parts: Vec<&str>) -> Self {
        Self::new(parts)
    }
}

impl From<&[&str]> for Key {
    fn from(parts: &[&str]) -> Self {
        Self::new(parts.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Key {
    fn from(parts: [&str; N]) -> Self {
        Self::new(parts)
    }
}

impl From<&str> for Key {
    fn from(part: &str) -> Self {
        Self(vec![part.to_string()])
    }
}

impl From<String> for Key {
    fn from(part: String) -> Self {
        Self(vec![part])
    }
}

///
/// Keyer
///
/// Capability of a domain value to supply its own key.
///

pub trait Keyer {
    fn key(&self) -> Result<Key, StateError>;
}

impl Keyer for Key {
    fn key(&self) -> Result<Key, StateError> {
        Ok(self.clone())
    }
}

///
/// Namespaced
///
/// Static namespace of an entity type. Used as the listing prefix and, joined
/// with `-`, as the schema tag of its key references.
///

pub trait Namespaced {
    const NAMESPACE: &'static [&'static str];

    #[must_use]
    fn namespace() -> Key {
        Key::new(Self::NAMESPACE.iter().copied())
    }

    #[must_use]
    fn schema_tag() -> String {
        Self::NAMESPACE.join("-")
    }
}

///
/// StringKeyer
/// Pairs a string with the function that turns it into a key.
///

pub struct StringKeyer<F> {
    value: String,
    keyer: F,
}

impl<F> StringKeyer<F>
where
    F: Fn(&str) -> Result<Key, StateError>,
{
    pub fn new(value: impl Into<String>, keyer: F) -> Self {
        Self {
            value: value.into(),
            keyer,
        }
    }
}

impl<F> Keyer for StringKeyer<F>
where
    F: Fn(&str) -> Result<Key, StateError>,
{
    fn key(&self) -> Result<Key, StateError> {
        (self.keyer)(&self.value)
    }
}

///
/// KeyInput
///
/// Every accepted key source, resolved once by [`KeyInput::normalize`].
///

pub enum KeyInput<'a> {
    Key(Key),
    Parts(Vec<String>),
    Single(String),
    Keyer(&'a dyn Keyer),
}

impl KeyInput<'_> {
    /// Resolve this input into ordered key parts.
    pub fn normalize(self) -> Result<Key, StateError> {
        match self {
            Self::Key(key) => Ok(key),
            Self::Parts(parts) => Ok(Key(parts)),
            Self::Single(part) => Ok(Key(vec![part])),
            Self::Keyer(keyer) => keyer.key().map_err(|err| match err {
                StateError::InvalidKeyShape(_)
                | StateError::EmptyKey
                | StateError::InvalidKeyPart { .. } => err,
                other => StateError::InvalidKeyShape(other.to_string()),
            }),
        }
    }
}

impl From<Key> for KeyInput<'_> {
    fn from(key: Key) -> Self {
        Self::Key(key)
    }
}

impl From<Vec<String>> for KeyInput<'_> {
    fn from(parts: Vec<String>) -> Self {
        Self::Parts(parts)
    }
}

impl From<Vec<&str>> for KeyInput<'_> {
    fn from(parts: Vec<&str>) -> Self {
        Self::Parts(parts.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for KeyInput<'_> {
    fn from(parts: &[&str]) -> Self {
        Self::Parts(parts.iter().map(|p| (*p).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for KeyInput<'_> {
    fn from(parts: [&str; N]) -> Self {
        Self::Parts(parts.iter().map(|p| (*p).to_string()).collect())
    }
}

impl From<&str> for KeyInput<'_> {
    fn from(part: &str) -> Self {
        Self::Single(part.to_string())
    }
}

impl From<String> for KeyInput<'_> {
    fn from(part: String) -> Self {
        Self::Single(part)
    }
}

impl<'a, K: Keyer> From<&'a K> for KeyInput<'a> {
    fn from(keyer: &'a K) -> Self {
        Self::Keyer(keyer)
    }
}

impl<'a> From<&'a dyn Keyer> for KeyInput<'a> {
    fn from(keyer: &'a dyn Keyer) -> Self {
        Self::Keyer(keyer)
    }
}

///
/// TransformedKey
///
/// Output of the two-stage key pipeline: the caller's parts, the parts after
/// the key transformer, and the final encoded ledger key.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransformedKey {
    pub origin: Key,
    pub parts: Key,
    pub string: String,
}

/// Encode key parts into a ledger key string.
///
/// One part is used as-is (a simple key); more parts go through the ledger's
/// composite-key construction.
pub fn encode_key<L>(ledger: &L, key: &Key) -> Result<String, StateError>
where
    L: Ledger + ?Sized,
{
    match key.parts() {
        [] => Err(StateError::EmptyKey),
        [single] => {
            if single.starts_with(composite::COMPOSITE_KEY_NAMESPACE) {
                return Err(StateError::InvalidKeyPart {
                    part: single.clone(),
                    reason: "simple key may not start with U+0000",
                });
            }

            Ok(single.clone())
        }
        [object_type, attributes @ ..] => Ok(ledger.create_composite_key(object_type, attributes)?),
    }
}
