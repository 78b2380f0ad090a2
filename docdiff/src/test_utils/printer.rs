use crate::diff_error;
use crate::error::{DiffResult, ErrorKind};
use crate::printer::Printer;
use crate::printer::memory::MemoryPrinter;
use crate::types::Diff;

/// Printer that stores diffs like [`MemoryPrinter`] and fails on the diff at `fail_at`.
///
/// Diffs before `fail_at` (zero-based) are stored, the failing diff is not.
#[derive(Debug, Clone)]
pub struct FailingPrinter {
    inner: MemoryPrinter,
    fail_at: usize,
    printed: usize,
}

impl FailingPrinter {
    pub fn new(fail_at: usize) -> Self {
        Self {
            inner: MemoryPrinter::new(),
            fail_at,
            printed: 0,
        }
    }

    /// Returns the printer holding the diffs printed before the failure.
    pub fn memory(&self) -> MemoryPrinter {
        self.inner.clone()
    }
}

impl Printer for FailingPrinter {
    fn name() -> &'static str {
        "failing"
    }

    async fn print(&mut self, diff: &Diff) -> DiffResult<()> {
        if self.printed == self.fail_at {
            return Err(diff_error!(
                ErrorKind::PrinterIoError,
                "Injected printer fault",
                format!("failed on diff '{}'", diff.id())
            ));
        }

        self.printed += 1;
        self.inner.print(diff).await
    }
}
