use crate::{error::StateError, key::Key};
use sha2::{Digest, Sha256};

///
/// KeyTransformer
///
/// Rewrites key shape between normalization and encoding. Applied to point
/// keys and to listing prefixes alike, so a transformer must map a prefix of
/// parts to a prefix of transformed parts or prefix scans stop matching.
///

pub trait KeyTransformer {
    fn transform(&self, key: Key) -> Result<Key, StateError>;
}

impl<F> KeyTransformer for F
where
    F: Fn(Key) -> Result<Key, StateError>,
{
    fn transform(&self, key: Key) -> Result<Key, StateError> {
        self(key)
    }
}

///
/// KeyAsIs
/// Default transformer: parts pass through untouched.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct KeyAsIs;

impl KeyTransformer for KeyAsIs {
    fn transform(&self, key: Key) -> Result<Key, StateError> {
        Ok(key)
    }
}

///
/// HashedKeyTransformer
///
/// Replaces every part after the namespace with its lowercase SHA-256 hex
/// digest. The namespace is kept readable so namespace listings still work.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct HashedKeyTransformer;

impl HashedKeyTransformer {
    #[must_use]
    pub fn digest(part: &str) -> String {
        format!("{:x}", Sha256::digest(part.as_bytes()))
    }
}

impl KeyTransformer for HashedKeyTransformer {
    fn transform(&self, key: Key) -> Result<Key, StateError> {
        let mut parts = key.into_parts().into_iter();
        let Some(namespace) = parts.next() else {
            return Err(StateError::EmptyKey);
        };

        let mut out = Vec::with_capacity(parts.len() + 1);
        out.push(namespace);
        out.extend(parts.map(|part| Self::digest(&part)));

        Ok(Key::from(out))
    }
}
