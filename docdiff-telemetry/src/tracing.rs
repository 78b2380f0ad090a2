//! Tracing subscriber initialization.
//!
//! Logs are written to stderr so that stdout stays reserved for diff output.

use std::io;
use std::sync::Once;

use docdiff_config::environment::Environment;
use thiserror::Error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Directive used when `RUST_LOG` is not set.
const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// Environment variable enabling log output in tests.
const ENABLE_TRACING_ENV_NAME: &str = "ENABLE_TRACING";

/// Errors that can occur while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to determine runtime environment: {0}")]
    Environment(#[from] io::Error),

    #[error("failed to install the `log` bridge: {0}")]
    LogTracer(#[from] tracing_log::log::SetLoggerError),

    #[error("failed to install the tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Flushes buffered log lines when dropped.
///
/// Keep it alive for the whole lifetime of the binary.
#[must_use = "dropping the flusher stops log output"]
#[derive(Debug)]
pub struct LogFlusher {
    _guard: WorkerGuard,
}

/// Installs the global tracing subscriber for a binary.
///
/// Uses `RUST_LOG` as filter, defaulting to `info`. The `dev` environment gets human-readable
/// output and `prod` gets one JSON object per line. Records emitted through the `log` crate are
/// forwarded to tracing.
pub fn init_tracing(app_name: &str) -> Result<LogFlusher, TracingError> {
    let environment = Environment::load()?;

    LogTracer::init()?;

    let (writer, guard) = tracing_appender::non_blocking(io::stderr());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));

    let registry = tracing_subscriber::registry().with(filter);
    match environment {
        Environment::Dev => registry
            .with(fmt::layer().with_writer(writer).with_target(false))
            .try_init()?,
        Environment::Prod => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(writer),
            )
            .try_init()?,
    }

    info!(app_name, %environment, "tracing initialized");

    Ok(LogFlusher { _guard: guard })
}

static INIT_TEST_TRACING: Once = Once::new();

/// Installs a tracing subscriber for tests when `ENABLE_TRACING` is set.
///
/// Safe to call from every test, only the first call has an effect.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        if std::env::var(ENABLE_TRACING_ENV_NAME).is_err() {
            return;
        }

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}
