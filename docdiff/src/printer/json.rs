use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::config::DiffModes;
use crate::diff_error;
use crate::error::{DiffResult, ErrorKind};
use crate::printer::base::{Printer, mode_enabled, printer_io_error};
use crate::types::{Diff, Record};

#[derive(Debug, Serialize)]
struct JsonDiff<'a> {
    mode: &'static str,
    #[serde(rename = "_id")]
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    src: Option<&'a Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dst: Option<&'a Record>,
}

/// Printer writing one JSON object per line.
///
/// Each object has the lower-case `mode`, the relevant `_id` and the full `src` and `dst`
/// records when present.
#[derive(Debug)]
pub struct JsonPrinter<W> {
    writer: W,
    modes: DiffModes,
}

impl<W> JsonPrinter<W> {
    pub fn new(writer: W, modes: DiffModes) -> Self {
        Self { writer, modes }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W> Printer for JsonPrinter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn name() -> &'static str {
        "json"
    }

    async fn print(&mut self, diff: &Diff) -> DiffResult<()> {
        if !mode_enabled(&self.modes, diff.mode()) {
            return Ok(());
        }

        let json_diff = JsonDiff {
            mode: diff.mode().as_str(),
            id: diff.id(),
            src: diff.src(),
            dst: diff.dst(),
        };

        let mut line = serde_json::to_vec(&json_diff).map_err(|err| {
            diff_error!(
                ErrorKind::SerializationError,
                "Failed to serialize diff",
                source: err
            )
        })?;
        line.push(b'\n');

        self.writer
            .write_all(&line)
            .await
            .map_err(printer_io_error)
    }

    async fn flush(&mut self) -> DiffResult<()> {
        self.writer.flush().await.map_err(printer_io_error)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn renders_one_object_per_line() {
        let modes = DiffModes {
            unchanged: true,
            created: true,
            updated: true,
            deleted: true,
        };
        let mut printer = JsonPrinter::new(Vec::new(), modes);

        let diffs = [
            Diff::Created {
                dst: Record::new("1", json!({"name": "One"})),
            },
            Diff::Deleted {
                src: Record::new("2", json!("Two")),
            },
            Diff::Updated {
                src: Record::new("4", json!({"Value": 3})),
                dst: Record::new("4", json!({"Value": 4})),
            },
        ];
        for diff in &diffs {
            printer.print(diff).await.unwrap();
        }

        let output = String::from_utf8(printer.into_inner()).unwrap();
        insta::assert_snapshot!(output, @r###"
        {"mode":"created","_id":"1","dst":{"_id":"1","_source":{"name":"One"}}}
        {"mode":"deleted","_id":"2","src":{"_id":"2","_source":"Two"}}
        {"mode":"updated","_id":"4","src":{"_id":"4","_source":{"Value":3}},"dst":{"_id":"4","_source":{"Value":4}}}
        "###);
    }

    #[tokio::test]
    async fn filtered_modes_write_nothing() {
        let mut printer = JsonPrinter::new(Vec::new(), DiffModes::default());
        printer
            .print(&Diff::Unchanged {
                src: Record::new("1", json!(1)),
                dst: Record::new("1", json!(1)),
            })
            .await
            .unwrap();

        assert!(printer.into_inner().is_empty());
    }
}
