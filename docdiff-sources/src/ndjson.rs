//! Producer reading records from newline-delimited JSON files.
//!
//! Every non-blank line holds one record as `{"_id": ..., "_source": ...}`, the shape of an
//! Elasticsearch hit. Lines must already be sorted ascending by `_id`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docdiff::diff_error;
use docdiff::error::{DiffError, DiffResult, ErrorKind};
use docdiff::producer::{IterateRequest, Producer};
use docdiff::types::Record;
use futures::{Stream, stream};
use metrics::counter;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, warn};

use crate::metrics::{DOCDIFF_NDJSON_LINES_READ_TOTAL, register_metrics};

enum ReaderState {
    Closed(Arc<PathBuf>),
    Open {
        path: Arc<PathBuf>,
        lines: Lines<BufReader<File>>,
        line_number: u64,
    },
}

/// Producer yielding the records of an NDJSON file in file order.
///
/// The file is opened anew for every call to [`Producer::records`]. Queries, sort fields and
/// source filters of the request are not applied.
#[derive(Debug, Clone)]
pub struct NdjsonProducer {
    path: Arc<PathBuf>,
}

impl NdjsonProducer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        register_metrics();

        Self {
            path: Arc::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Producer for NdjsonProducer {
    fn name() -> &'static str {
        "ndjson"
    }

    fn records(
        &self,
        request: IterateRequest,
    ) -> impl Stream<Item = DiffResult<Record>> + Send + 'static {
        if request.query.is_some() || !request.includes.is_empty() || !request.excludes.is_empty()
        {
            warn!(
                path = %self.path.display(),
                "ndjson producer ignores queries and source filters"
            );
        }

        debug!(path = %self.path.display(), "reading ndjson records");

        stream::try_unfold(ReaderState::Closed(Arc::clone(&self.path)), next_record)
    }
}

/// Reads lines until the next record, skipping blank lines.
async fn next_record(state: ReaderState) -> DiffResult<Option<(Record, ReaderState)>> {
    let (path, mut lines, mut line_number) = match state {
        ReaderState::Closed(path) => {
            let file = File::open(path.as_path())
                .await
                .map_err(|err| read_error(&path, err))?;

            (path, BufReader::new(file).lines(), 0)
        }
        ReaderState::Open {
            path,
            lines,
            line_number,
        } => (path, lines, line_number),
    };

    loop {
        let Some(line) = lines
            .next_line()
            .await
            .map_err(|err| read_error(&path, err))?
        else {
            debug!(path = %path.display(), lines = line_number, "ndjson file exhausted");

            return Ok(None);
        };

        line_number += 1;
        counter!(DOCDIFF_NDJSON_LINES_READ_TOTAL).increment(1);

        if line.trim().is_empty() {
            continue;
        }

        let record = serde_json::from_str::<Record>(&line).map_err(|err| {
            diff_error!(
                ErrorKind::ProducerMalformedRecord,
                "Malformed NDJSON record",
                format!("{}:{line_number}: {err}", path.display()),
                source: err
            )
        })?;

        return Ok(Some((
            record,
            ReaderState::Open {
                path,
                lines,
                line_number,
            },
        )));
    }
}

fn read_error(path: &Path, err: std::io::Error) -> DiffError {
    diff_error!(
        ErrorKind::ProducerConnectionFailed,
        "Failed to read NDJSON file",
        format!("{}: {err}", path.display()),
        source: err
    )
}
