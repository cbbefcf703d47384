//! Platform composite-key encoding.
//!
//! `\u{0}` + object type + `\u{0}` + (attribute + `\u{0}`)*.
//! Parts may not contain the minimum or maximum unicode rune: the first is
//! the separator, the second closes partial-key ranges.

use crate::error::StateError;
use thiserror::Error as ThisError;

/// Leading byte of every composite key; keeps them disjoint from simple keys.
pub const COMPOSITE_KEY_NAMESPACE: char = '\u{0}';

/// Separator between parts.
pub const MIN_UNICODE_RUNE: char = '\u{0}';

/// Upper bound appended to a partial key to close a prefix range.
pub const MAX_UNICODE_RUNE: char = char::MAX;

///
/// CompositeKeyError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CompositeKeyError {
    #[error("key part {part:?} contains reserved rune U+{rune:04X}")]
    ReservedRune { part: String, rune: u32 },

    #[error("key {key:?} is not a composite key")]
    NotComposite { key: String },
}

impl From<CompositeKeyError> for StateError {
    fn from(err: CompositeKeyError) -> Self {
        match err {
            CompositeKeyError::ReservedRune { part, rune } => Self::InvalidKeyPart {
                part,
                reason: if rune == 0 {
                    "contains the composite separator U+0000"
                } else {
                    "contains the range terminator U+10FFFF"
                },
            },
            CompositeKeyError::NotComposite { key } => Self::InvalidKeyPart {
                part: key,
                reason: "not a composite key",
            },
        }
    }
}

/// Build a composite key from an object type and ordered attributes.
pub fn create_composite_key(
    object_type: &str,
    attributes: &[String],
) -> Result<String, CompositeKeyError> {
    validate_part(object_type)?;

    let capacity = 2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>();
    let mut key = String::with_capacity(capacity);
    key.push(COMPOSITE_KEY_NAMESPACE);
    key.push_str(object_type);
    key.push(MIN_UNICODE_RUNE);

    for attribute in attributes {
        validate_part(attribute)?;
        key.push_str(attribute);
        key.push(MIN_UNICODE_RUNE);
    }

    Ok(key)
}

/// Split a composite key back into `(object_type, attributes)`.
pub fn split_composite_key(key: &str) -> Result<(String, Vec<String>), CompositeKeyError> {
    let body = key
        .strip_prefix(COMPOSITE_KEY_NAMESPACE)
        .and_then(|rest| rest.strip_suffix(MIN_UNICODE_RUNE))
        .ok_or_else(|| CompositeKeyError::NotComposite {
            key: key.to_string(),
        })?;

    let mut parts = body.split(MIN_UNICODE_RUNE).map(str::to_string);
    let object_type = parts.next().unwrap_or_default();

    Ok((object_type, parts.collect()))
}

/// Half-open `[start, end)` range covering every key under a partial key.
pub fn partial_key_range(
    object_type: &str,
    attributes: &[String],
) -> Result<(String, String), CompositeKeyError> {
    let start = create_composite_key(object_type, attributes)?;
    let mut end = start.clone();
    end.push(MAX_UNICODE_RUNE);

    Ok((start, end))
}

/// True when `key` was produced by [`create_composite_key`].
#[must_use]
pub fn is_composite_key(key: &str) -> bool {
    key.starts_with(COMPOSITE_KEY_NAMESPACE)
}

fn validate_part(part: &str) -> Result<(), CompositeKeyError> {
    match part
        .chars()
        .find(|c| *c == MIN_UNICODE_RUNE || *c == MAX_UNICODE_RUNE)
    {
        Some(rune) => Err(CompositeKeyError::ReservedRune {
            part: part.to_string(),
            rune: u32::from(rune),
        }),
        None => Ok(()),
    }
}
