use super::*;
use crate::{
    error::ErrorKind,
    key::HashedKeyTransformer,
    ledger::MemoryLedger,
    test_support::Book,
};

#[test]
fn key_ref_lives_in_reserved_namespace() {
    let id = KeyRefId::for_entity::<Book>("title", "alpha");

    assert_eq!(id.schema, "BOOK");
    assert_eq!(
        id.key().unwrap(),
        Key::new(["_idx", "BOOK", "title", "alpha"])
    );
    assert!(matches!(
        KeyRefId::new("BOOK", "title", Key::default()).key(),
        Err(StateError::EmptyKey)
    ));
}

#[test]
fn schema_tag_joins_multi_part_namespaces() {
    struct Chapter;
    impl Namespaced for Chapter {
        const NAMESPACE: &'static [&'static str] = &["BOOK", "CHAPTER"];
    }

    assert_eq!(KeyRef::for_entity::<Chapter>("pos", "1", "x").schema, "BOOK-CHAPTER");
}

#[test]
fn build_enforces_uniqueness() {
    let mut ledger = MemoryLedger::new();
    let mut state = State::new(&mut ledger);

    let first = state
        .build_key_ref("BOOK", "title", "alpha", ["BOOK", "1"])
        .unwrap();
    assert_eq!(first.pkey, Key::new(["BOOK", "1"]));

    let err = state
        .build_key_ref("BOOK", "title", "alpha", ["BOOK", "2"])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    let id = KeyRefId::new("BOOK", "title", "alpha");
    assert_eq!(
        state.lookup_key_ref(&id).unwrap(),
        Some(Key::new(["BOOK", "1"]))
    );
}

#[test]
fn lookup_and_fetch_through_reference() {
    let mut ledger = MemoryLedger::new();
    let mut state = State::new(&mut ledger);
    let book = Book::new("1", "alpha", 10);

    state.insert_entity(&book).unwrap();
    state
        .insert_key_ref(&KeyRef::for_entity::<Book>("title", "alpha", book.key().unwrap()))
        .unwrap();

    let id = KeyRefId::for_entity::<Book>("title", "alpha");
    assert_eq!(state.get_by_key_ref::<Book>(&id).unwrap(), book);

    let missing = KeyRefId::for_entity::<Book>("title", "omega");
    assert_eq!(state.lookup_key_ref(&missing).unwrap(), None);
    assert!(
        state
            .get_by_key_ref::<Book>(&missing)
            .unwrap_err()
            .is_not_found()
    );
}

#[test]
fn re_point_and_delete() {
    let mut ledger = MemoryLedger::new();
    let mut state = State::new(&mut ledger);
    let id = KeyRefId::new("BOOK", "title", "alpha");

    state
        .build_key_ref("BOOK", "title", "alpha", ["BOOK", "1"])
        .unwrap();
    state
        .put_key_ref(&KeyRef::new("BOOK", "title", "alpha", ["BOOK", "2"]))
        .unwrap();
    assert_eq!(
        state.lookup_key_ref(&id).unwrap(),
        Some(Key::new(["BOOK", "2"]))
    );

    state.delete_key_ref(&id).unwrap();
    assert_eq!(state.lookup_key_ref(&id).unwrap(), None);

    // the claim is free again
    state
        .build_key_ref("BOOK", "title", "alpha", ["BOOK", "3"])
        .unwrap();
}

#[test]
fn list_key_refs_of_one_index() {
    let mut ledger = MemoryLedger::new();
    let mut state = State::new(&mut ledger);

    state
        .build_key_ref("BOOK", "title", "beta", ["BOOK", "2"])
        .unwrap();
    state
        .build_key_ref("BOOK", "title", "alpha", ["BOOK", "1"])
        .unwrap();
    state
        .build_key_ref("BOOK", "author", "ann", ["BOOK", "1"])
        .unwrap();

    let refs = state.list_key_refs("BOOK", "title").unwrap();

    assert_eq!(
        refs,
        vec![
            KeyRef::new("BOOK", "title", "alpha", ["BOOK", "1"]),
            KeyRef::new("BOOK", "title", "beta", ["BOOK", "2"]),
        ]
    );
    assert_eq!(state.ledger().open_iterators(), 0);
}

#[test]
fn references_follow_key_transformer() {
    let mut ledger = MemoryLedger::new();
    let mut state = State::new(&mut ledger).with_key_transformer(HashedKeyTransformer);

    state
        .build_key_ref("BOOK", "title", "alpha", ["BOOK", "1"])
        .unwrap();

    let id = KeyRefId::new("BOOK", "title", "alpha");
    assert_eq!(
        state.lookup_key_ref(&id).unwrap(),
        Some(Key::new(["BOOK", "1"]))
    );

    let refs = state.list_key_refs("BOOK", "title").unwrap();
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].ref_key, Key::from(HashedKeyTransformer::digest("alpha")));
}
