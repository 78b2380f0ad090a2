//! Error types and result definitions for diff operations.
//!
//! Provides an error system with classification and captured diagnostic metadata for the diff
//! pipeline. A run reports a single root fault, the faults of other workers are only logged.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for diff operations using [`DiffError`] as the error type.
pub type DiffResult<T> = Result<T, DiffError>;

/// Detailed payload stored for single [`DiffError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

impl ErrorPayload {
    /// Creates a new payload with optional dynamic detail.
    fn new(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
        location: &'static Location<'static>,
        backtrace: Arc<Backtrace>,
    ) -> Self {
        Self {
            kind,
            description,
            detail,
            source,
            location,
            backtrace,
        }
    }
}

/// Main error type for diff operations.
///
/// Errors are cheap to clone, which lets a producer fault travel both through the record
/// channel into the engine and out of the producer worker's join handle.
#[derive(Debug, Clone)]
pub struct DiffError {
    payload: ErrorPayload,
}

/// Specific categories of errors that can occur while diffing.
///
/// Kinds are grouped by the component that raises them, so callers can tell a producer fault
/// from a consumer fault or a cancellation.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Producer Errors
    ProducerConnectionFailed,
    ProducerMalformedRecord,
    ProducerProtocolError,

    // Merge Errors
    UnsortedRecords,
    DiffChannelClosed,

    // Cancellation
    OperationCanceled,

    // Printer Errors
    PrinterIoError,

    // Worker Errors
    ProducerWorkerPanic,
    DiffWorkerPanic,
    PrinterWorkerPanic,

    // Configuration Errors
    ConfigError,

    // Serialization Errors
    SerializationError,

    // Data Errors
    InvalidData,

    // Unknown / Uncategorized
    Unknown,
}

impl DiffError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.payload.kind
    }

    /// Returns the static description of this error.
    pub fn description(&self) -> &str {
        self.payload.description.as_ref()
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        self.payload.detail.as_deref()
    }

    /// Returns `true` when this error only reports that the run was cancelled.
    pub fn is_cancellation(&self) -> bool {
        self.payload.kind == ErrorKind::OperationCanceled
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        Some(self.payload.backtrace.as_ref())
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.payload.location
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.payload.source = Some(Arc::new(source));
        self
    }

    /// Creates a [`DiffError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        let location = Location::caller();
        let backtrace = Arc::new(Backtrace::capture());

        DiffError {
            payload: ErrorPayload::new(kind, description, detail, source, location, backtrace),
        }
    }
}

impl PartialEq for DiffError {
    fn eq(&self, other: &DiffError) -> bool {
        self.payload.kind == other.payload.kind
    }
}

impl fmt::Display for DiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        let payload = &self.payload;
        let location = payload.location;
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            payload.kind,
            payload.description,
            location.file(),
            location.line(),
            location.column()
        )?;

        write_detail(payload.detail.as_deref(), f, 1)?;
        write_backtrace(payload.backtrace.as_ref(), f, 1)?;

        Ok(())
    }
}

impl error::Error for DiffError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.payload
            .source
            .as_ref()
            .map(|source| source as &(dyn error::Error + 'static))
    }
}

/// Writes the captured backtrace with indentation.
fn write_backtrace(
    backtrace: &Backtrace,
    f: &mut fmt::Formatter<'_>,
    indent: usize,
) -> fmt::Result {
    let indent_str = "  ".repeat(indent);

    let rendered_backtrace = format!("{backtrace}");
    if !rendered_backtrace.trim().is_empty() {
        write!(f, "\n{indent_str}Backtrace:")?;
        for line in rendered_backtrace.lines() {
            if line.trim().is_empty() {
                write!(f, "\n{indent_str}  ")?;
            } else {
                write!(f, "\n{indent_str}  {line}")?;
            }
        }
    }

    Ok(())
}

/// Writes the detail block with indentation.
fn write_detail(detail: Option<&str>, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    if let Some(detail) = detail {
        let indent_str = "  ".repeat(indent);
        if detail.trim().is_empty() {
            write!(f, "\n{indent_str}Detail: <empty>")?;
        } else {
            write!(f, "\n{indent_str}Detail:")?;
            for line in detail.lines() {
                if line.trim().is_empty() {
                    write!(f, "\n{indent_str}  ")?;
                } else {
                    write!(f, "\n{indent_str}  {line}")?;
                }
            }
        }
    }

    Ok(())
}

/// Creates a [`DiffError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for DiffError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> DiffError {
        DiffError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`DiffError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for DiffError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> DiffError {
        DiffError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}
