use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

use docdiff::error::DiffError;

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

/// Result type for the `docdiff` binary.
pub type CliResult<T> = Result<T, CliError>;

/// Captured backtrace wrapper for the non-diff variants.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type of the `docdiff` binary.
///
/// Wraps [`DiffError`] for faults of the diff run and provides variants for setup failures.
#[derive(Debug)]
pub enum CliError {
    /// Fault raised while connecting or diffing.
    Diff(DiffError),
    /// Invalid configuration, flags or URLs.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// I/O error, e.g. while building the runtime.
    Io(std::io::Error, CapturedBacktrace),
}

impl CliError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            CliError::Diff(err) if err.is_cancellation() => "diff cancelled",
            CliError::Diff(_) => "diff error",
            CliError::Config(_, _) => "configuration error",
            CliError::Io(_, _) => "i/o error",
        }
    }

    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            CliError::Diff(err) => err.backtrace(),
            CliError::Config(_, captured) => Some(&captured.0),
            CliError::Io(_, captured) => Some(&captured.0),
        }
    }

    /// Creates a configuration error from any error.
    pub fn config<E: Into<Box<dyn Error + Send + Sync>>>(err: E) -> Self {
        CliError::Config(err.into(), CapturedBacktrace::capture())
    }

    /// Returns a user-oriented report for terminal output.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("docdiff failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {self}\n"));

        let mut source = Error::source(self);
        let mut index = 1usize;
        while let Some(err) = source {
            out.push_str(&format!("cause {index}: {err}\n"));
            source = err.source();
            index += 1;
        }

        if should_render_backtrace()
            && let Some(backtrace) = self.backtrace()
        {
            out.push_str("backtrace:\n");
            out.push_str(&backtrace.to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Diff(err) => match err.detail() {
                Some(detail) => write!(f, "{}: {detail}", err.description()),
                None => write!(f, "{}", err.description()),
            },
            CliError::Config(source, _) => write!(f, "configuration error: {source}"),
            CliError::Io(source, _) => write!(f, "i/o error: {source}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CliError::Diff(err) => err.source(),
            CliError::Config(source, _) => Some(source.as_ref()),
            CliError::Io(source, _) => Some(source),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err, CapturedBacktrace::capture())
    }
}

impl From<DiffError> for CliError {
    fn from(err: DiffError) -> Self {
        CliError::Diff(err)
    }
}

#[cfg(test)]
mod tests {
    use docdiff::diff_error;
    use docdiff::error::ErrorKind;

    use super::*;

    #[test]
    fn diff_errors_render_description_and_detail() {
        let err = CliError::from(diff_error!(
            ErrorKind::UnsortedRecords,
            "Records are not sorted by id",
            "source record '1' follows '2'"
        ));

        assert_eq!(err.category(), "diff error");
        assert_eq!(
            err.to_string(),
            "Records are not sorted by id: source record '1' follows '2'"
        );
    }

    #[test]
    fn cancellations_have_their_own_category() {
        let err = CliError::from(diff_error!(
            ErrorKind::OperationCanceled,
            "Diff was cancelled"
        ));

        assert_eq!(err.category(), "diff cancelled");
        assert!(err.render_report().starts_with("docdiff failed\ncategory: diff cancelled\n"));
    }

    #[test]
    fn config_errors_accept_plain_messages() {
        let err = CliError::config("invalid --sf query");

        assert_eq!(err.to_string(), "configuration error: invalid --sf query");
    }
}
