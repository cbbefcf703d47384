//! Minimal document-query evaluator backing `MemoryLedger` rich queries.
//!
//! Supports the subset the query compiler emits: field equality, the
//! comparison operators, `$in`/`$nin`/`$exists`/`$all`, and nested
//! `$and`/`$or`/`$nor`/`$not` combinations, plus `sort`, `skip` and `limit`.
//! Field projection is ignored; rows are returned whole.

use crate::ledger::LedgerError;
use serde_json::{Map, Value};
use std::cmp::Ordering;

///
/// DocumentQuery
///

#[derive(Debug)]
pub(crate) struct DocumentQuery {
    selector: Map<String, Value>,
    sort: Vec<(String, bool)>,
    pub(crate) limit: Option<usize>,
    pub(crate) skip: usize,
}

impl DocumentQuery {
    pub(crate) fn parse(text: &str) -> Result<Self, LedgerError> {
        let invalid = |message: &str| LedgerError::Io(format!("invalid rich query: {message}"));

        let root: Value = serde_json::from_str(text).map_err(|err| invalid(&err.to_string()))?;
        let Value::Object(mut root) = root else {
            return Err(invalid("query must be a JSON object"));
        };

        let selector = match root.remove("selector") {
            Some(Value::Object(selector)) => selector,
            _ => return Err(invalid("missing selector object")),
        };

        let mut sort = Vec::new();
        if let Some(Value::Array(specs)) = root.remove("sort") {
            for spec in specs {
                match spec {
                    Value::String(field) => sort.push((field, false)),
                    Value::Object(map) => {
                        for (field, direction) in map {
                            sort.push((field, direction.as_str() == Some("desc")));
                        }
                    }
                    _ => return Err(invalid("sort entries must be strings or objects")),
                }
            }
        }

        let as_usize = |value: Option<Value>| value.and_then(|v| v.as_u64()).map(|n| n as usize);

        Ok(Self {
            selector,
            sort,
            limit: as_usize(root.remove("limit")),
            skip: as_usize(root.remove("skip")).unwrap_or(0),
        })
    }

    pub(crate) fn matches(&self, doc: &Value) -> bool {
        matches_selector(doc, &self.selector)
    }

    /// Stable sort, so equal rows keep key order.
    pub(crate) fn sort<T>(&self, rows: &mut [(T, Value)]) {
        if self.sort.is_empty() {
            return;
        }

        rows.sort_by(|(_, a), (_, b)| {
            for (field, desc) in &self.sort {
                let ordering = match (lookup(a, field), lookup(b, field)) {
                    (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                let ordering = if *desc { ordering.reverse() } else { ordering };

                if ordering != Ordering::Equal {
                    return ordering;
                }
            }

            Ordering::Equal
        });
    }
}

fn matches_selector(doc: &Value, selector: &Map<String, Value>) -> bool {
    selector.iter().all(|(key, condition)| match key.as_str() {
        "$and" | "$all" => each_selector(condition).all(|s| matches_selector(doc, s)),
        "$or" => each_selector(condition).any(|s| matches_selector(doc, s)),
        "$nor" => !each_selector(condition).any(|s| matches_selector(doc, s)),
        "$not" => condition
            .as_object()
            .is_some_and(|s| !matches_selector(doc, s)),
        field => matches_field(lookup(doc, field), condition),
    })
}

fn each_selector(condition: &Value) -> impl Iterator<Item = &Map<String, Value>> {
    condition
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn matches_field(value: Option<&Value>, condition: &Value) -> bool {
    let operators = condition
        .as_object()
        .filter(|map| !map.is_empty() && map.keys().all(|k| k.starts_with('$')));

    let Some(operators) = operators else {
        return value == Some(condition);
    };

    operators.iter().all(|(op, arg)| match op.as_str() {
        "$eq" => value == Some(arg),
        "$ne" => value != Some(arg),
        "$gt" => ordered(value, arg).is_some_and(Ordering::is_gt),
        "$gte" => ordered(value, arg).is_some_and(Ordering::is_ge),
        "$lt" => ordered(value, arg).is_some_and(Ordering::is_lt),
        "$lte" => ordered(value, arg).is_some_and(Ordering::is_le),
        "$in" => arg
            .as_array()
            .is_some_and(|options| value.is_some_and(|v| options.contains(v))),
        "$nin" => arg
            .as_array()
            .is_some_and(|options| !value.is_some_and(|v| options.contains(v))),
        "$exists" => arg.as_bool() == Some(value.is_some()),
        "$all" => match (value.and_then(Value::as_array), arg.as_array()) {
            (Some(have), Some(want)) => want.iter().all(|w| have.contains(w)),
            _ => false,
        },
        _ => false,
    })
}

fn ordered(value: Option<&Value>, arg: &Value) -> Option<Ordering> {
    compare(value?, arg)
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(doc, |current, segment| current.as_object()?.get(segment))
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(selector: Value) -> DocumentQuery {
        DocumentQuery::parse(&json!({ "selector": selector }).to_string()).expect("query parses")
    }

    #[test]
    fn equality_and_operators() {
        let doc = json!({"docType": "car", "make": "vw", "year": 2019, "owner": {"name": "ann"}});

        assert!(query(json!({"docType": "car", "make": "vw"})).matches(&doc));
        assert!(!query(json!({"make": "bmw"})).matches(&doc));
        assert!(query(json!({"year": {"$gte": 2019, "$lt": 2020}})).matches(&doc));
        assert!(query(json!({"owner.name": "ann"})).matches(&doc));
        assert!(query(json!({"make": {"$in": ["vw", "audi"]}})).matches(&doc));
        assert!(query(json!({"color": {"$exists": false}})).matches(&doc));
    }

    #[test]
    fn nested_combinations() {
        let doc = json!({"a": 1, "b": 2});

        assert!(query(json!({"$or": [{"a": 5}, {"$and": [{"a": 1}, {"b": 2}]}]})).matches(&doc));
        assert!(!query(json!({"$nor": [{"a": 1}]})).matches(&doc));
    }

    #[test]
    fn missing_selector_is_rejected() {
        assert!(DocumentQuery::parse(r#"{"limit": 1}"#).is_err());
        assert!(DocumentQuery::parse("not json").is_err());
    }

    #[test]
    fn sort_orders_rows() {
        let q = DocumentQuery::parse(r#"{"selector":{},"sort":[{"n":"desc"}]}"#).unwrap();
        let mut rows = vec![(1, json!({"n": 1})), (2, json!({"n": 3})), (3, json!({"n": 2}))];
        q.sort(&mut rows);

        let order: Vec<_> = rows.iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }
}
