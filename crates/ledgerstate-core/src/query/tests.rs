use super::*;
use crate::error::ErrorKind;

#[test]
fn empty_builder_has_no_selector() {
    let err = QueryBuilder::new().build().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NoSelector);
}

#[test]
fn paging_alone_is_not_a_selector() {
    let builder = QueryBuilder::new()
        .add_field("name")
        .set_limit(5)
        .use_index("idx-name");

    assert!(matches!(builder.build(), Err(StateError::NoSelector)));
}

#[test]
fn single_filter_compiles_to_selector() {
    let query = QueryBuilder::new().add_filter("name", "x").build().unwrap();

    assert_eq!(query, r#"{"selector":{"name":"x"}}"#);
}

#[test]
fn doc_type_and_or_combination() {
    let query = QueryBuilder::new()
        .set_doc_type("T")
        .add_combination(Combination::or([Filter::new("a", 1), Filter::new("b", 2)]))
        .build()
        .unwrap();

    let parsed: Value = serde_json::from_str(&query).unwrap();
    assert_eq!(
        parsed,
        json!({"selector": {"docType": "T", "$or": [{"a": 1}, {"b": 2}]}})
    );
}

#[test]
fn nested_combinations_render_recursively() {
    let combination = Combination::and([Filter::new("color", "red")])
        .with_condition(json!({"size": {"$gt": 3}}))
        .nest(Combination::nor([Filter::new("owner", "bob")]));

    let value = QueryBuilder::new()
        .add_combination(combination)
        .build_value()
        .unwrap();

    assert_eq!(
        value["selector"]["$and"],
        json!([
            {"color": "red"},
            {"size": {"$gt": 3}},
            {"$nor": [{"owner": "bob"}]}
        ])
    );
}

#[test]
fn top_level_combinations_of_one_type_merge() {
    let value = QueryBuilder::new()
        .add_combination(Combination::or([Filter::new("a", 1)]))
        .add_combination(Combination::or([Filter::new("b", 2)]))
        .build_value()
        .unwrap();

    assert_eq!(value["selector"]["$or"], json!([{"a": 1}, {"b": 2}]));
}

#[test]
fn full_query_shape() {
    let value = QueryBuilder::new()
        .add_field("make")
        .add_field("year")
        .set_doc_type("car")
        .add_condition("year", json!({"$gte": 2019}))
        .add_sort("year", SortDirection::Desc)
        .set_limit(10)
        .set_skip(20)
        .use_index("year-idx")
        .build_value()
        .unwrap();

    assert_eq!(
        value,
        json!({
            "fields": ["make", "year"],
            "selector": {"docType": "car", "year": {"$gte": 2019}},
            "sort": [{"year": "desc"}],
            "limit": 10,
            "skip": 20,
            "use_index": "year-idx"
        })
    );
}

#[test]
fn sort_tokens_keep_order() {
    let value = QueryBuilder::new()
        .set_doc_type("person")
        .add_sorts(&["name:asc", "age:DESC"])
        .unwrap()
        .build_value()
        .unwrap();

    assert_eq!(value["sort"], json!([{"name": "asc"}, {"age": "desc"}]));
}

#[test]
fn malformed_sort_tokens_are_rejected() {
    for token in ["name:upward", "name", ":asc", "a:b:asc"] {
        let err = QueryBuilder::new().add_sorts(&[token]).unwrap_err();

        assert!(
            matches!(&err, StateError::InvalidSortSyntax { token: t } if t == token),
            "{token} -> {err:?}"
        );
    }
}

#[test]
fn output_is_deterministic() {
    let build = || {
        QueryBuilder::new()
            .add_filter("z", 1)
            .add_filter("a", 2)
            .add_condition("m", json!({"$in": [1, 2]}))
            .build()
            .unwrap()
    };

    assert_eq!(build(), build());
    assert_eq!(build(), r#"{"selector":{"a":2,"m":{"$in":[1,2]},"z":1}}"#);
}
