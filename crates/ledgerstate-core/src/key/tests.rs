use super::*;
use crate::{
    error::ErrorKind,
    key::composite::{create_composite_key, partial_key_range, split_composite_key},
    ledger::MemoryLedger,
};
use proptest::prelude::*;

struct Book {
    id: String,
}

impl Keyer for Book {
    fn key(&self) -> Result<Key, StateError> {
        Ok(Key::from(["BOOK", self.id.as_str()]))
    }
}

struct Broken;

impl Keyer for Broken {
    fn key(&self) -> Result<Key, StateError> {
        Err(StateError::Decode("no id".into()))
    }
}

#[test]
fn normalize_accepts_every_key_source() {
    let book = Book { id: "1".into() };
    let expected = Key::from(["BOOK", "1"]);

    assert_eq!(KeyInput::from(expected.clone()).normalize().unwrap(), expected);
    assert_eq!(KeyInput::from(["BOOK", "1"]).normalize().unwrap(), expected);
    assert_eq!(KeyInput::from(vec!["BOOK", "1"]).normalize().unwrap(), expected);
    assert_eq!(
        KeyInput::from(vec!["BOOK".to_string(), "1".to_string()])
            .normalize()
            .unwrap(),
        expected
    );
    assert_eq!(KeyInput::from(&book).normalize().unwrap(), expected);
    assert_eq!(
        KeyInput::from("BOOK").normalize().unwrap(),
        Key::from("BOOK")
    );
}

#[test]
fn normalize_wraps_keyer_failures_as_invalid_shape() {
    let err = KeyInput::from(&Broken).normalize().expect_err("keyer failure");

    assert_eq!(err.kind(), ErrorKind::InvalidKeyShape);
}

#[test]
fn encode_rejects_empty_key() {
    let ledger = MemoryLedger::new();
    let err = encode_key(&ledger, &Key::default()).expect_err("empty key");

    assert!(matches!(err, StateError::EmptyKey));
}

#[test]
fn encode_single_part_is_unchanged() {
    let ledger = MemoryLedger::new();

    assert_eq!(encode_key(&ledger, &Key::from("owner")).unwrap(), "owner");
}

#[test]
fn encode_single_part_rejects_leading_separator() {
    let ledger = MemoryLedger::new();
    let err = encode_key(&ledger, &Key::from("\u{0}owner")).expect_err("leading nul");

    assert_eq!(err.kind(), ErrorKind::InvalidKeyPart);
}

#[test]
fn encode_multi_part_uses_composite_construction() {
    let ledger = MemoryLedger::new();
    let encoded = encode_key(&ledger, &Key::from(["BOOK", "ISBN-1", "ch1"])).unwrap();

    assert_eq!(encoded, "\u{0}BOOK\u{0}ISBN-1\u{0}ch1\u{0}");
}

#[test]
fn composite_key_rejects_reserved_runes() {
    let err = create_composite_key("BOOK", &["a\u{0}b".to_string()]).expect_err("nul part");
    assert_eq!(StateError::from(err).kind(), ErrorKind::InvalidKeyPart);

    let err = create_composite_key("BOOK", &[format!("a{}", char::MAX)]).expect_err("max rune");
    assert_eq!(StateError::from(err).kind(), ErrorKind::InvalidKeyPart);
}

#[test]
fn split_rejects_simple_keys() {
    assert!(split_composite_key("plain").is_err());
}

#[test]
fn partial_range_brackets_children_only() {
    let (start, end) = partial_key_range("BOOK", &[]).unwrap();
    let child = create_composite_key("BOOK", &["x".to_string()]).unwrap();
    let other = create_composite_key("BOOKS", &["x".to_string()]).unwrap();

    assert!(start <= child && child < end);
    assert!(!(start <= other && other < end));
}

#[test]
fn append_and_display() {
    let key = Key::from("BOOK").append(["a", "b"]);

    assert_eq!(key.len(), 3);
    assert_eq!(key.namespace(), Some("BOOK"));
    assert_eq!(key.to_string(), "BOOK | a | b");
}

#[test]
fn string_keyer_applies_function() {
    let keyer = StringKeyer::new("42", |id: &str| Ok(Key::from(["CAR", id])));

    assert_eq!(keyer.key().unwrap(), Key::from(["CAR", "42"]));
}

#[test]
fn hashed_transformer_keeps_namespace() {
    let key = HashedKeyTransformer
        .transform(Key::from(["BOOK", "ISBN-1"]))
        .unwrap();

    assert_eq!(key.namespace(), Some("BOOK"));
    assert_eq!(key[1], HashedKeyTransformer::digest("ISBN-1"));
    assert_eq!(key[1].len(), 64);

    let namespace_only = HashedKeyTransformer.transform(Key::from("BOOK")).unwrap();
    assert_eq!(namespace_only, Key::from("BOOK"));
}

#[test]
fn closures_are_key_transformers() {
    let upper = |key: Key| -> Result<Key, StateError> {
        Ok(Key::new(key.iter().map(|p| p.to_uppercase())))
    };

    assert_eq!(
        upper.transform(Key::from(["book", "a"])).unwrap(),
        Key::from(["BOOK", "A"])
    );
}

fn part() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        any::<char>().prop_filter("reserved rune", |c| *c != '\u{0}' && *c != char::MAX),
        0..12,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    #[test]
    fn composite_key_round_trips(
        object_type in part(),
        attributes in proptest::collection::vec(part(), 0..6),
    ) {
        let encoded = create_composite_key(&object_type, &attributes).unwrap();
        let (split_type, split_attributes) = split_composite_key(&encoded).unwrap();

        prop_assert_eq!(split_type, object_type);
        prop_assert_eq!(split_attributes, attributes);
    }

    #[test]
    fn composite_key_encoding_is_deterministic(
        attributes in proptest::collection::vec(part(), 1..6),
    ) {
        let first = create_composite_key("NS", &attributes).unwrap();
        let second = create_composite_key("NS", &attributes).unwrap();

        prop_assert_eq!(first, second);
    }
}
