use super::*;
use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
struct Chapter {
    pos: u32,
    title: String,
}

impl Record for Chapter {}

fn codec() -> ValueCodec {
    ValueCodec::new(Box::new(AsIs), DEFAULT_MAX_VALUE_BYTES)
}

#[test]
fn scalars_use_text_form() {
    assert_eq!(42_i64.to_bytes().unwrap(), b"42");
    assert_eq!(true.to_bytes().unwrap(), b"true");
    assert_eq!("abc".to_bytes().unwrap(), b"abc");

    assert_eq!(i64::from_bytes(b"-7").unwrap(), -7);
    assert_eq!(u32::from_bytes(b" 12 ").unwrap(), 12);
    assert!(bool::from_bytes(b"false").is_ok_and(|b| !b));
}

#[test]
fn scalar_decode_failure_is_decode_error() {
    let err = i64::from_bytes(b"forty-two").expect_err("not a number");

    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn raw_bytes_pass_through() {
    let raw = vec![0_u8, 159, 146, 150];

    assert_eq!(raw.to_bytes().unwrap(), raw);
    assert_eq!(Vec::<u8>::from_bytes(&raw).unwrap(), raw);
}

#[test]
fn records_are_json_documents() {
    let chapter = Chapter {
        pos: 1,
        title: "intro".into(),
    };

    let bytes = chapter.to_bytes().unwrap();
    assert_eq!(bytes, br#"{"pos":1,"title":"intro"}"#);
    assert_eq!(Chapter::from_bytes(&bytes).unwrap(), chapter);
}

#[test]
fn cbor_wrapper_is_not_json() {
    let chapter = Chapter {
        pos: 2,
        title: "body".into(),
    };

    let bytes = Cbor(chapter.clone()).to_bytes().unwrap();
    assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_err());
    assert_eq!(Cbor::<Chapter>::from_bytes(&bytes).unwrap().0, chapter);
}

#[test]
fn codec_enforces_size_limit_both_ways() {
    let codec = ValueCodec::new(Box::new(AsIs), 4);

    let err = codec.encode("12345").expect_err("oversized encode");
    assert_eq!(err.kind(), ErrorKind::Encode);

    let err = codec
        .decode::<String>(b"12345".to_vec())
        .expect_err("oversized decode");
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn digest_envelope_detects_tampering() {
    let mut codec = codec();
    codec.set_transformer(Box::new(DigestEnvelope));

    let mut bytes = codec.encode("payload").unwrap();
    assert_eq!(bytes.len(), 32 + 7);
    assert_eq!(codec.decode::<String>(bytes.clone()).unwrap(), "payload");

    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    let err = codec.decode::<String>(bytes).expect_err("tampered payload");
    assert_eq!(err.kind(), ErrorKind::Decode);
}
