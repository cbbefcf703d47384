use serde::Serialize;

///
/// Page
///
/// One page of a paginated listing. `bookmark` is the platform's opaque
/// continuation token, empty once the scan is exhausted.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub bookmark: String,
    pub fetched: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.bookmark.is_empty()
    }
}

///
/// HistoryEntry
///
/// One committed mutation. Tombstones carry no value.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry<T> {
    pub tx_id: String,
    pub timestamp: i64,
    pub is_deleted: bool,
    pub value: Option<T>,
}
