//! Module: codec
//! Responsibility: typed value <-> payload byte conversion.
//! Does not own: key encoding, or the distinction between a missing entry and
//! an empty payload (the state engine decides that before decoding).
//! Boundary: the only place payload bytes become typed values.

mod transform;
#[cfg(test)]
mod tests;

pub use transform::{AsIs, DigestEnvelope, ValueTransformer};

use crate::error::StateError;
use serde::{Serialize, de::DeserializeOwned};

/// Default upper bound on a single stored payload.
pub const DEFAULT_MAX_VALUE_BYTES: usize = 4 * 1024 * 1024;

///
/// ToBytes
/// Encodes a value into its stored payload.
///

pub trait ToBytes {
    fn to_bytes(&self) -> Result<Vec<u8>, StateError>;
}

///
/// FromBytes
/// Decodes a stored payload; the implementing type is the target shape.
///

pub trait FromBytes: Sized {
    fn from_bytes(bytes: &[u8]) -> Result<Self, StateError>;
}

///
/// Record
///
/// Declared structured record shape, stored as a JSON document so rich
/// queries can select on its fields.
///

pub trait Record: Serialize + DeserializeOwned {}

impl<T: Record> ToBytes for T {
    fn to_bytes(&self) -> Result<Vec<u8>, StateError> {
        serde_json::to_vec(self).map_err(|err| StateError::Encode(err.to_string()))
    }
}

impl<T: Record> FromBytes for T {
    fn from_bytes(bytes: &[u8]) -> Result<Self, StateError> {
        serde_json::from_slice(bytes).map_err(|err| StateError::Decode(err.to_string()))
    }
}

impl Record for serde_json::Value {}

// Primary keys are stored as payloads by key references.
impl Record for crate::key::Key {}

///
/// Cbor
/// Record stored in compact CBOR instead of JSON; invisible to rich queries.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Cbor<T>(pub T);

impl<T: Serialize> ToBytes for Cbor<T> {
    fn to_bytes(&self) -> Result<Vec<u8>, StateError> {
        serde_cbor::to_vec(&self.0).map_err(|err| StateError::Encode(err.to_string()))
    }
}

impl<T: DeserializeOwned> FromBytes for Cbor<T> {
    fn from_bytes(bytes: &[u8]) -> Result<Self, StateError> {
        serde_cbor::from_slice(bytes)
            .map(Cbor)
            .map_err(|err| StateError::Decode(err.to_string()))
    }
}

// ----------------------------------------------------------------------
// Raw bytes pass through untouched
// ----------------------------------------------------------------------

impl ToBytes for [u8] {
    fn to_bytes(&self) -> Result<Vec<u8>, StateError> {
        Ok(self.to_vec())
    }
}

impl ToBytes for Vec<u8> {
    fn to_bytes(&self) -> Result<Vec<u8>, StateError> {
        Ok(self.clone())
    }
}

impl FromBytes for Vec<u8> {
    fn from_bytes(bytes: &[u8]) -> Result<Self, StateError> {
        Ok(bytes.to_vec())
    }
}

// ----------------------------------------------------------------------
// Scalars are stored as their text form
// ----------------------------------------------------------------------

impl ToBytes for str {
    fn to_bytes(&self) -> Result<Vec<u8>, StateError> {
        Ok(self.as_bytes().to_vec())
    }
}

impl ToBytes for String {
    fn to_bytes(&self) -> Result<Vec<u8>, StateError> {
        Ok(self.as_bytes().to_vec())
    }
}

impl FromBytes for String {
    fn from_bytes(bytes: &[u8]) -> Result<Self, StateError> {
        Self::from_utf8(bytes.to_vec()).map_err(|err| StateError::Decode(err.to_string()))
    }
}

macro_rules! impl_text_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToBytes for $ty {
                fn to_bytes(&self) -> Result<Vec<u8>, StateError> {
                    Ok(self.to_string().into_bytes())
                }
            }

            impl FromBytes for $ty {
                fn from_bytes(bytes: &[u8]) -> Result<Self, StateError> {
                    let text = std::str::from_utf8(bytes)
                        .map_err(|err| StateError::Decode(err.to_string()))?;

                    text.trim().parse::<$ty>().map_err(|err| {
                        StateError::Decode(format!(
                            "'{text}' is not a valid {}: {err}",
                            stringify!($ty)
                        ))
                    })
                }
            }
        )*
    };
}

impl_text_scalar!(bool, i32, i64, u32, u64, f64);

///
/// ValueCodec
///
/// Per-instance composition of typed conversion, the pluggable transformer
/// and the payload size bound.
///

pub(crate) struct ValueCodec {
    transformer: Box<dyn ValueTransformer>,
    max_value_bytes: usize,
}

impl ValueCodec {
    pub(crate) fn new(transformer: Box<dyn ValueTransformer>, max_value_bytes: usize) -> Self {
        Self {
            transformer,
            max_value_bytes,
        }
    }

    pub(crate) fn set_transformer(&mut self, transformer: Box<dyn ValueTransformer>) {
        self.transformer = transformer;
    }

    pub(crate) const fn set_max_value_bytes(&mut self, max_value_bytes: usize) {
        self.max_value_bytes = max_value_bytes;
    }

    pub(crate) fn encode<V>(&self, value: &V) -> Result<Vec<u8>, StateError>
    where
        V: ToBytes + ?Sized,
    {
        let bytes = self.transformer.encode(value.to_bytes()?)?;
        if bytes.len() > self.max_value_bytes {
            return Err(StateError::Encode(format!(
                "payload size {} exceeds limit {}",
                bytes.len(),
                self.max_value_bytes
            )));
        }

        Ok(bytes)
    }

    pub(crate) fn decode<T>(&self, bytes: Vec<u8>) -> Result<T, StateError>
    where
        T: FromBytes,
    {
        if bytes.len() > self.max_value_bytes {
            return Err(StateError::Decode(format!(
                "payload size {} exceeds limit {}",
                bytes.len(),
                self.max_value_bytes
            )));
        }

        T::from_bytes(&self.transformer.decode(bytes)?)
    }
}
