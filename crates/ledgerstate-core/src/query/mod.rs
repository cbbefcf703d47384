//! Module: query
//! Responsibility: compile document queries (selector, projection, sort,
//! paging and index hint) into their JSON text.
//! Does not own: query execution (`State::query`) or validation of operator
//! payloads, which pass through verbatim.
//! Boundary: pure; output depends only on the builder's contents.

#[cfg(test)]
mod tests;

use crate::error::StateError;
use serde_json::{Map, Value, json};
use std::fmt;

///
/// CombinationType
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CombinationType {
    /// Every selector in the array matches.
    And,
    /// At least one selector in the array matches.
    Or,
    /// An array field contains every element of the argument.
    All,
    /// No selector in the array matches.
    Nor,
}

impl CombinationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "$and",
            Self::Or => "$or",
            Self::All => "$all",
            Self::Nor => "$nor",
        }
    }
}

impl fmt::Display for CombinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// Filter
/// Equality on one field.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    fn render(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.field.clone(), self.value.clone());

        Value::Object(map)
    }
}

///
/// Clause
/// One member of a combination: a field filter or an opaque condition document.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Clause {
    Filter(Filter),
    Condition(Value),
}

impl From<Filter> for Clause {
    fn from(filter: Filter) -> Self {
        Self::Filter(filter)
    }
}

impl From<Value> for Clause {
    fn from(condition: Value) -> Self {
        Self::Condition(condition)
    }
}

///
/// Combination
///
/// Boolean combination node. Renders as `{"$op": [filters.., conditions..,
/// children..]}`, recursively.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Combination {
    pub kind: CombinationType,
    filters: Vec<Filter>,
    conditions: Vec<Value>,
    children: Vec<Self>,
}

impl Combination {
    pub fn new<I, C>(kind: CombinationType, clauses: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Clause>,
    {
        let mut combination = Self {
            kind,
            filters: Vec::new(),
            conditions: Vec::new(),
            children: Vec::new(),
        };
        for clause in clauses {
            match clause.into() {
                Clause::Filter(filter) => combination.filters.push(filter),
                Clause::Condition(condition) => combination.conditions.push(condition),
            }
        }

        combination
    }

    pub fn and<I: IntoIterator<Item = C>, C: Into<Clause>>(clauses: I) -> Self {
        Self::new(CombinationType::And, clauses)
    }

    pub fn or<I: IntoIterator<Item = C>, C: Into<Clause>>(clauses: I) -> Self {
        Self::new(CombinationType::Or, clauses)
    }

    pub fn all<I: IntoIterator<Item = C>, C: Into<Clause>>(clauses: I) -> Self {
        Self::new(CombinationType::All, clauses)
    }

    pub fn nor<I: IntoIterator<Item = C>, C: Into<Clause>>(clauses: I) -> Self {
        Self::new(CombinationType::Nor, clauses)
    }

    /// Append a nested combination.
    #[must_use]
    pub fn nest(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Value) -> Self {
        self.conditions.push(condition);
        self
    }

    fn members(&self) -> Vec<Value> {
        self.filters
            .iter()
            .map(Filter::render)
            .chain(self.conditions.iter().cloned())
            .chain(self.children.iter().map(Self::render))
            .collect()
    }

    fn render(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.kind.as_str().to_string(), Value::Array(self.members()));

        Value::Object(map)
    }
}

///
/// SortDirection
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Case-insensitive `asc` / `desc`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        if text.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if text.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }
}

///
/// QueryBuilder
///
/// Consuming builder for document queries. `build` refuses a query without
/// any selector contribution so an accidental full scan cannot be compiled.
///
/// A builder is a plain value; share it across callers only by cloning.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryBuilder {
    fields: Vec<String>,
    doc_type: Option<String>,
    filters: Map<String, Value>,
    conditions: Map<String, Value>,
    combinations: Vec<Combination>,
    sort: Vec<(String, SortDirection)>,
    limit: Option<usize>,
    skip: Option<usize>,
    index: Option<String>,
}

impl QueryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Project `field` into the result documents.
    #[must_use]
    pub fn add_field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    #[must_use]
    pub fn set_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    #[must_use]
    pub fn add_filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Operator condition on `field`, e.g. `{"$gt": 10}`; the payload is
    /// emitted as given.
    #[must_use]
    pub fn add_condition(mut self, field: impl Into<String>, condition: Value) -> Self {
        self.conditions.insert(field.into(), condition);
        self
    }

    #[must_use]
    pub fn add_combination(mut self, combination: Combination) -> Self {
        self.combinations.push(combination);
        self
    }

    #[must_use]
    pub fn add_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push((field.into(), direction));
        self
    }

    /// Parse `field:asc` / `field:desc` tokens, keeping their order.
    pub fn add_sorts<S: AsRef<str>>(mut self, tokens: &[S]) -> Result<Self, StateError> {
        for token in tokens {
            let token = token.as_ref();
            let invalid = || StateError::InvalidSortSyntax {
                token: token.to_string(),
            };

            let (field, direction) = token.split_once(':').ok_or_else(invalid)?;
            if field.is_empty() || direction.contains(':') {
                return Err(invalid());
            }
            let direction = SortDirection::parse(direction).ok_or_else(invalid)?;

            self.sort.push((field.to_string(), direction));
        }

        Ok(self)
    }

    #[must_use]
    pub const fn set_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn set_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    #[must_use]
    pub fn use_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }

    #[must_use]
    pub fn has_selector(&self) -> bool {
        self.doc_type.is_some()
            || !self.filters.is_empty()
            || !self.conditions.is_empty()
            || !self.combinations.is_empty()
    }

    /// Compile to a JSON value.
    pub fn build_value(&self) -> Result<Value, StateError> {
        if !self.has_selector() {
            return Err(StateError::NoSelector);
        }

        let mut query = Map::new();
        if !self.fields.is_empty() {
            query.insert("fields".into(), json!(self.fields));
        }
        query.insert("selector".into(), Value::Object(self.selector()));
        if !self.sort.is_empty() {
            let sort = self
                .sort
                .iter()
                .map(|(field, direction)| json!({ field.as_str(): direction.as_str() }))
                .collect();
            query.insert("sort".into(), Value::Array(sort));
        }
        if let Some(limit) = self.limit {
            query.insert("limit".into(), json!(limit));
        }
        if let Some(skip) = self.skip {
            query.insert("skip".into(), json!(skip));
        }
        if let Some(index) = &self.index {
            query.insert("use_index".into(), json!(index));
        }

        Ok(Value::Object(query))
    }

    /// Compile to JSON text.
    pub fn build(&self) -> Result<String, StateError> {
        let query = self.build_value()?;

        serde_json::to_string(&query).map_err(StateError::unexpected)
    }

    fn selector(&self) -> Map<String, Value> {
        let mut selector = Map::new();
        if let Some(doc_type) = &self.doc_type {
            selector.insert("docType".into(), json!(doc_type));
        }
        selector.extend(self.filters.clone());
        selector.extend(self.conditions.clone());

        // Top-level combinations of one type share a single array.
        for combination in &self.combinations {
            let members = combination.members();
            match selector.get_mut(combination.kind.as_str()) {
                Some(Value::Array(existing)) => existing.extend(members),
                _ => {
                    selector.insert(combination.kind.as_str().into(), Value::Array(members));
                }
            }
        }

        selector
    }
}
