use std::future::Future;

use crate::config::DiffModes;
use crate::diff_error;
use crate::error::{DiffError, DiffResult, ErrorKind};
use crate::types::{Diff, DiffMode};

/// Trait for consumers that render the diffs emitted by the engine.
///
/// [`Printer`] implementations receive every diff exactly once, in ascending id order, and
/// decide through their [`DiffModes`] whether to render it. A printer must not retain the diff
/// beyond the call. A failing sink is reported as [`ErrorKind::PrinterIoError`] and stops the
/// whole run.
///
/// The optional [`Printer::flush`] method is called once after the last diff.
pub trait Printer {
    /// Returns the name of the printer.
    fn name() -> &'static str;

    /// Renders a single diff.
    fn print(&mut self, diff: &Diff) -> impl Future<Output = DiffResult<()>> + Send;

    /// Flushes any buffered output.
    ///
    /// The default implementation is a no-op.
    fn flush(&mut self) -> impl Future<Output = DiffResult<()>> + Send {
        async { Ok(()) }
    }
}

/// Fans every diff out to each printer, in order.
impl<P> Printer for Vec<P>
where
    P: Printer + Send,
{
    fn name() -> &'static str {
        "fan_out"
    }

    async fn print(&mut self, diff: &Diff) -> DiffResult<()> {
        for printer in self.iter_mut() {
            printer.print(diff).await?;
        }

        Ok(())
    }

    async fn flush(&mut self) -> DiffResult<()> {
        for printer in self.iter_mut() {
            printer.flush().await?;
        }

        Ok(())
    }
}

/// Returns `true` if `modes` enables rendering diffs of `mode`.
pub fn mode_enabled(modes: &DiffModes, mode: DiffMode) -> bool {
    match mode {
        DiffMode::Unchanged => modes.unchanged,
        DiffMode::Created => modes.created,
        DiffMode::Updated => modes.updated,
        DiffMode::Deleted => modes.deleted,
    }
}

pub(crate) fn printer_io_error(err: std::io::Error) -> DiffError {
    diff_error!(
        ErrorKind::PrinterIoError,
        "Failed to write diff to the output",
        source: err
    )
}
