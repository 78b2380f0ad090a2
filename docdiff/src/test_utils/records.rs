use serde_json::{Value, json};

use crate::types::Record;

/// Creates a record.
pub fn record(id: &str, content: Value) -> Record {
    Record::new(id, content)
}

/// Creates records from `(id, content)` pairs, keeping their order.
pub fn records(entries: &[(&str, Value)]) -> Vec<Record> {
    entries
        .iter()
        .map(|(id, content)| Record::new(*id, content.clone()))
        .collect()
}

/// Creates `count` records with zero-padded ids starting at `start`, so they sort ascending.
///
/// Each record has `{"n": <number>}` as content.
pub fn numbered_records(start: u64, count: u64) -> Vec<Record> {
    (start..start + count)
        .map(|n| Record::new(format!("{n:08}"), json!({ "n": n })))
        .collect()
}
