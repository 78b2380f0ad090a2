use std::path::PathBuf;

use docdiff::error::{DiffError, DiffResult};
use docdiff::pipeline::Pipeline;
use docdiff::printer::Printer;
use docdiff::printer::json::JsonPrinter;
use docdiff::printer::text::TextPrinter;
use docdiff::producer::{IterateRequest, Producer, SortField};
use docdiff::types::{Diff, DiffSummary, Record};
use docdiff_config::shared::{DiffConfig, OutputConfig, OutputFormat};
use docdiff_sources::elastic::{ElasticConfig, ElasticOptions, ElasticProducer};
use docdiff_sources::ndjson::NdjsonProducer;
use futures::{Stream, StreamExt};
use serde_json::Value;
use tokio::io::Stdout;
use tracing::{debug, info, warn};

use crate::args::Args;
use crate::error::{CliError, CliResult};

/// Location of the records of one side.
#[derive(Debug)]
pub enum SourceUrl {
    Elastic(ElasticConfig),
    Ndjson(PathBuf),
}

impl SourceUrl {
    /// Parses a side URL, `http(s)://` URLs address Elasticsearch and anything else a file.
    pub fn parse(url: &str) -> DiffResult<Self> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Ok(SourceUrl::Elastic(ElasticConfig::parse(url)?));
        }

        let path = url.strip_prefix("file://").unwrap_or(url);

        Ok(SourceUrl::Ndjson(PathBuf::from(path)))
    }

    /// Connects to the backend addressed by this URL.
    pub async fn connect(self, options: ElasticOptions) -> DiffResult<ProducerBackend> {
        match self {
            SourceUrl::Elastic(config) => {
                let producer = ElasticProducer::connect(config, options).await?;
                Ok(ProducerBackend::Elastic(producer))
            }
            SourceUrl::Ndjson(path) => Ok(ProducerBackend::Ndjson(NdjsonProducer::new(path))),
        }
    }
}

/// Producer backends selectable from the command line.
///
/// An enum keeps dispatch static, the pipeline is generic over its producers.
#[derive(Debug, Clone)]
pub enum ProducerBackend {
    Elastic(ElasticProducer),
    Ndjson(NdjsonProducer),
}

impl Producer for ProducerBackend {
    fn name() -> &'static str {
        "backend"
    }

    fn records(
        &self,
        request: IterateRequest,
    ) -> impl Stream<Item = DiffResult<Record>> + Send + 'static {
        match self {
            ProducerBackend::Elastic(producer) => producer.records(request).left_stream(),
            ProducerBackend::Ndjson(producer) => producer.records(request).right_stream(),
        }
    }
}

/// Printers selectable from the command line, writing to stdout.
#[derive(Debug)]
pub enum OutputPrinter {
    Text(TextPrinter<Stdout>),
    Json(JsonPrinter<Stdout>),
}

impl OutputPrinter {
    pub fn new(config: &OutputConfig) -> Self {
        let stdout = tokio::io::stdout();

        match config.format {
            OutputFormat::Text => OutputPrinter::Text(TextPrinter::new(stdout, config.modes)),
            OutputFormat::Json => OutputPrinter::Json(JsonPrinter::new(stdout, config.modes)),
        }
    }
}

impl Printer for OutputPrinter {
    fn name() -> &'static str {
        "output"
    }

    async fn print(&mut self, diff: &Diff) -> DiffResult<()> {
        match self {
            OutputPrinter::Text(printer) => printer.print(diff).await,
            OutputPrinter::Json(printer) => printer.print(diff).await,
        }
    }

    async fn flush(&mut self) -> DiffResult<()> {
        match self {
            OutputPrinter::Text(printer) => printer.flush().await,
            OutputPrinter::Json(printer) => printer.flush().await,
        }
    }
}

/// Builds the request of one side from the command line flags.
pub fn build_request(
    args: &Args,
    config: &DiffConfig,
    query: Option<&str>,
    sort: &str,
) -> CliResult<IterateRequest> {
    let query = match query.map(str::trim).filter(|query| !query.is_empty()) {
        Some(query) => Some(
            serde_json::from_str::<Value>(query)
                .map_err(|err| CliError::config(format!("invalid raw query '{query}': {err}")))?,
        ),
        None => None,
    };

    Ok(IterateRequest {
        query,
        sort: SortField::parse(sort),
        includes: args.include.clone(),
        excludes: args.exclude.clone(),
        batch_size: config.producer.batch_size,
    })
}

/// Runs a diff between the two URLs given on the command line.
pub async fn start_diff_with_config(args: Args, config: DiffConfig) -> CliResult<DiffSummary> {
    info!("starting docdiff");

    log_config(&config);

    let source_request = build_request(
        &args,
        &config,
        args.source_query.as_deref(),
        &args.source_sort,
    )?;
    let destination_request = build_request(
        &args,
        &config,
        args.destination_query.as_deref(),
        &args.destination_sort,
    )?;

    let options = ElasticOptions::from(&config.producer);
    let source_url = SourceUrl::parse(&args.source)?;
    let destination_url = SourceUrl::parse(&args.destination)?;

    let (source, destination) = tokio::try_join!(
        source_url.connect(options),
        destination_url.connect(options)
    )?;

    let printer = OutputPrinter::new(&config.output);
    let pipeline = Pipeline::new(config.pipeline, Some(source), Some(destination), printer)
        .with_source_request(source_request)
        .with_destination_request(destination_request);

    let summary = start_pipeline(pipeline).await?;

    info!(
        unchanged = summary.unchanged,
        created = summary.created,
        updated = summary.updated,
        deleted = summary.deleted,
        "docdiff completed"
    );

    Ok(summary)
}

fn log_config(config: &DiffConfig) {
    debug!(
        channel_capacity = config.pipeline.channel_capacity,
        check_order = config.pipeline.check_order,
        "pipeline config"
    );
    debug!(
        batch_size = config.producer.batch_size,
        scroll_keepalive_secs = config.producer.scroll_keepalive_secs,
        request_timeout_secs = config.producer.request_timeout_secs,
        "producer config"
    );
    debug!(
        format = %config.output.format,
        unchanged = config.output.modes.unchanged,
        created = config.output.modes.created,
        updated = config.output.modes.updated,
        deleted = config.output.modes.deleted,
        "output config"
    );
}

/// Starts a pipeline and shuts it down on SIGINT or SIGTERM.
#[tracing::instrument(skip(pipeline))]
async fn start_pipeline<P, Q, W>(mut pipeline: Pipeline<P, Q, W>) -> Result<DiffSummary, DiffError>
where
    P: Producer,
    Q: Producer,
    W: Printer + Send + 'static,
{
    pipeline.start()?;

    let shutdown_tx = pipeline.shutdown_tx();
    let shutdown_handle = tokio::spawn(async move {
        wait_for_signal().await;

        shutdown_tx.shutdown();
        info!("shut down signal sent to the diff pipeline");
    });

    let result = pipeline.wait().await;

    // The signal task is still waiting when the diff completed on its own.
    shutdown_handle.abort();
    let _ = shutdown_handle.await;

    result
}

/// Resolves on the first SIGINT (ctrl+c) or SIGTERM.
///
/// Never resolves when no signal handler could be installed.
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(err) = result {
                            warn!(error = %err, "failed to listen for ctrl+c");
                            sigterm.recv().await;
                        }
                        info!("sigint (ctrl+c) received, shutting down diff");
                    }
                    _ = sigterm.recv() => {
                        info!("sigterm received, shutting down diff");
                    }
                }

                return;
            }
            Err(err) => warn!(error = %err, "failed to register SIGTERM handler"),
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("sigint (ctrl+c) received, shutting down diff"),
        Err(err) => {
            warn!(error = %err, "failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use docdiff::error::ErrorKind;
    use serde_json::json;

    use super::*;

    #[test]
    fn http_urls_address_elasticsearch() {
        let url = SourceUrl::parse("http://localhost:9200/index").unwrap();

        assert!(matches!(url, SourceUrl::Elastic(config) if config.index == "index"));
    }

    #[test]
    fn other_urls_address_files() {
        let url = SourceUrl::parse("file:///tmp/records.ndjson").unwrap();
        assert!(matches!(url, SourceUrl::Ndjson(path) if path == PathBuf::from("/tmp/records.ndjson")));

        let url = SourceUrl::parse("records.ndjson").unwrap();
        assert!(matches!(url, SourceUrl::Ndjson(path) if path == PathBuf::from("records.ndjson")));
    }

    #[test]
    fn elastic_urls_without_index_are_rejected() {
        let err = SourceUrl::parse("https://localhost:9200").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigError);
    }

    #[test]
    fn requests_carry_flags() {
        let args = Args::try_parse_from([
            "docdiff",
            "--size",
            "10",
            "--exclude",
            "hash_value",
            "a.ndjson",
            "b.ndjson",
        ])
        .unwrap();
        let mut config = DiffConfig::default();
        args.apply(&mut config);

        let request = build_request(&args, &config, Some(r#"{"term":{"user":"olivere"}}"#), "-id")
            .unwrap();

        assert_eq!(request.query, Some(json!({ "term": { "user": "olivere" } })));
        assert_eq!(request.sort, SortField::parse("-id"));
        assert_eq!(request.excludes, vec!["hash_value"]);
        assert_eq!(request.batch_size, 10);
    }

    #[test]
    fn invalid_raw_queries_are_rejected() {
        let args = Args::try_parse_from(["docdiff", "a.ndjson", "b.ndjson"]).unwrap();

        let err = build_request(&args, &DiffConfig::default(), Some("{term"), "").unwrap_err();

        assert!(matches!(err, CliError::Config(_, _)));
    }
}
