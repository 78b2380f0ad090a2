use std::sync::Arc;

use futures::{Stream, stream};
use tracing::debug;

use crate::error::DiffResult;
use crate::producer::{IterateRequest, Producer};
use crate::types::Record;

/// In-memory producer for testing and embedding.
///
/// [`MemoryProducer`] yields its records exactly in the order they were given, ignoring the
/// request. It is cheap to clone and every call to [`Producer::records`] starts a new pass.
#[derive(Debug, Clone, Default)]
pub struct MemoryProducer {
    records: Arc<Vec<Record>>,
}

impl MemoryProducer {
    /// Creates a new producer over `records`.
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: Arc::new(records),
        }
    }

    /// Returns the records this producer yields.
    pub fn records_ref(&self) -> &[Record] {
        &self.records
    }
}

impl Producer for MemoryProducer {
    fn name() -> &'static str {
        "memory"
    }

    fn records(
        &self,
        _request: IterateRequest,
    ) -> impl Stream<Item = DiffResult<Record>> + Send + 'static {
        debug!(count = self.records.len(), "producing records from memory");

        let records = Arc::clone(&self.records);
        stream::iter((0..records.len()).map(move |index| Ok(records[index].clone())))
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn yields_records_in_given_order() {
        let producer = MemoryProducer::new(vec![
            Record::new("1", json!("a")),
            Record::new("2", json!("b")),
        ]);

        let ids: Vec<_> = producer
            .records(IterateRequest::default())
            .map(|record| record.unwrap().id)
            .collect()
            .await;

        assert_eq!(ids, vec!["1", "2"]);
    }
}
