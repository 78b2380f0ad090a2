use futures::Stream;
use serde_json::Value;

use crate::error::DiffResult;
use crate::types::Record;

/// Default field records are sorted by.
pub const DEFAULT_SORT_FIELD: &str = "_id";

/// Field and direction a producer sorts its records by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub ascending: bool,
}

impl SortField {
    /// Parses a sort expression where a leading `-` selects descending order.
    ///
    /// An empty expression yields the default ascending sort on `_id`.
    pub fn parse(expression: &str) -> Self {
        let expression = expression.trim();
        if expression.is_empty() {
            return Self::default();
        }

        match expression.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_owned(),
                ascending: false,
            },
            None => Self {
                field: expression.to_owned(),
                ascending: true,
            },
        }
    }
}

impl Default for SortField {
    fn default() -> Self {
        Self {
            field: DEFAULT_SORT_FIELD.to_owned(),
            ascending: true,
        }
    }
}

/// Description of the records a producer should yield.
///
/// The request is opaque to the engine, only the resulting record sequence matters.
#[derive(Debug, Clone, PartialEq)]
pub struct IterateRequest {
    /// Backend-specific filter query.
    pub query: Option<Value>,
    pub sort: SortField,
    /// Content fields to keep, empty keeps every field.
    pub includes: Vec<String>,
    /// Content fields to drop.
    pub excludes: Vec<String>,
    /// Number of records fetched per round trip.
    pub batch_size: usize,
}

impl Default for IterateRequest {
    fn default() -> Self {
        Self {
            query: None,
            sort: SortField::default(),
            includes: Vec::new(),
            excludes: Vec::new(),
            batch_size: 100,
        }
    }
}

/// Trait for systems that supply the records of one side of a diff.
///
/// [`Producer`] implementations yield records sorted ascending by id without duplicates. A
/// producer that cannot continue yields a single `Err` item and then ends, so a fault is never
/// confused with the end of the sequence. Faults are not retried by the engine.
///
/// The returned stream must stop promptly when dropped, which is how cancellation reaches any
/// pending request.
pub trait Producer {
    /// Returns the name of the producer.
    fn name() -> &'static str;

    /// Starts a lazy, non-restartable sequence of records matching `request`.
    fn records(
        &self,
        request: IterateRequest,
    ) -> impl Stream<Item = DiffResult<Record>> + Send + 'static;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sort_field() {
        assert_eq!(SortField::parse(""), SortField::default());
        assert_eq!(
            SortField::parse("name"),
            SortField {
                field: "name".to_owned(),
                ascending: true
            }
        );
        assert_eq!(
            SortField::parse("-_id"),
            SortField {
                field: "_id".to_owned(),
                ascending: false
            }
        );
    }
}
