use crate::error::StateError;
use sha2::{Digest, Sha256};

///
/// ValueTransformer
///
/// Byte-level stage applied after typed encoding and before typed decoding,
/// e.g. to add an envelope, compression or encryption transparently.
///

pub trait ValueTransformer {
    fn encode(&self, bytes: Vec<u8>) -> Result<Vec<u8>, StateError>;

    fn decode(&self, bytes: Vec<u8>) -> Result<Vec<u8>, StateError>;
}

///
/// AsIs
/// Default transformer.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct AsIs;

impl ValueTransformer for AsIs {
    fn encode(&self, bytes: Vec<u8>) -> Result<Vec<u8>, StateError> {
        Ok(bytes)
    }

    fn decode(&self, bytes: Vec<u8>) -> Result<Vec<u8>, StateError> {
        Ok(bytes)
    }
}

///
/// DigestEnvelope
///
/// Prefixes each payload with its SHA-256 digest and verifies it on read.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct DigestEnvelope;

impl DigestEnvelope {
    const DIGEST_LEN: usize = 32;
}

impl ValueTransformer for DigestEnvelope {
    fn encode(&self, bytes: Vec<u8>) -> Result<Vec<u8>, StateError> {
        let mut out = Vec::with_capacity(Self::DIGEST_LEN + bytes.len());
        out.extend_from_slice(&Sha256::digest(&bytes));
        out.extend_from_slice(&bytes);

        Ok(out)
    }

    fn decode(&self, mut bytes: Vec<u8>) -> Result<Vec<u8>, StateError> {
        if bytes.len() < Self::DIGEST_LEN {
            return Err(StateError::Decode(format!(
                "envelope too short: {} bytes",
                bytes.len()
            )));
        }

        let payload = bytes.split_off(Self::DIGEST_LEN);
        if Sha256::digest(&payload).as_slice() != bytes.as_slice() {
            return Err(StateError::Decode("envelope digest mismatch".into()));
        }

        Ok(payload)
    }
}
