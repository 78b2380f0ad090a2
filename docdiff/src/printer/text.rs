use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::config::DiffModes;
use crate::error::DiffResult;
use crate::printer::base::{Printer, mode_enabled, printer_io_error};
use crate::printer::changes::describe_changes;
use crate::types::Diff;

/// Printer writing one human-readable line per diff.
///
/// Lines are tab-separated: the classification label, the relevant id and, except for deleted
/// records, a description of the structural changes between the source and the destination.
#[derive(Debug)]
pub struct TextPrinter<W> {
    writer: W,
    modes: DiffModes,
}

impl<W> TextPrinter<W> {
    pub fn new(writer: W, modes: DiffModes) -> Self {
        Self { writer, modes }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Renders the text line of a diff, without the trailing newline.
pub fn format_line(diff: &Diff) -> String {
    let mode = diff.mode();
    match diff {
        Diff::Deleted { src } => format!("{mode}\t{}", src.id),
        _ => format!(
            "{mode}\t{}\t{}",
            diff.id(),
            describe_changes(
                diff.src().map(|record| &record.content),
                diff.dst().map(|record| &record.content)
            )
        ),
    }
}

impl<W> Printer for TextPrinter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn name() -> &'static str {
        "text"
    }

    async fn print(&mut self, diff: &Diff) -> DiffResult<()> {
        if !mode_enabled(&self.modes, diff.mode()) {
            return Ok(());
        }

        let mut line = format_line(diff);
        line.push('\n');

        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(printer_io_error)
    }

    async fn flush(&mut self) -> DiffResult<()> {
        self.writer.flush().await.map_err(printer_io_error)
    }
}
