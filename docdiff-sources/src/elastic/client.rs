use std::sync::Arc;
use std::time::{Duration, Instant};

use docdiff::bail;
use docdiff::diff_error;
use docdiff::error::{DiffError, DiffResult, ErrorKind};
use docdiff::types::Record;
use metrics::histogram;
use reqwest::{Method, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::elastic::config::ElasticConfig;
use crate::elastic::core::ElasticOptions;
use crate::metrics::{DOCDIFF_ES_REQUEST_DURATION_SECONDS, OPERATION_LABEL, register_metrics};

/// Oldest supported major version.
const MIN_SUPPORTED_MAJOR: u64 = 5;

/// Newest supported major version.
const MAX_SUPPORTED_MAJOR: u64 = 7;

/// First major version without document types in search paths.
const TYPELESS_MAJOR: u64 = 7;

/// Maximum number of body bytes quoted in protocol errors.
const MAX_ERROR_BODY_LEN: usize = 512;

/// Version reported by the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElasticVersion {
    pub number: String,
    pub major: u64,
}

impl ElasticVersion {
    /// Parses a version number such as `7.10.2`.
    pub fn parse(number: &str) -> DiffResult<Self> {
        let major = number
            .split('.')
            .next()
            .and_then(|major| major.parse::<u64>().ok());

        match major {
            Some(major) => Ok(Self {
                number: number.to_owned(),
                major,
            }),
            None => Err(diff_error!(
                ErrorKind::ProducerProtocolError,
                "Invalid Elasticsearch version",
                format!("cannot read a major version from '{number}'")
            )),
        }
    }

    /// Returns `true` when search paths may contain a document type.
    pub fn supports_types(&self) -> bool {
        self.major < TYPELESS_MAJOR
    }
}

/// One page of a scroll.
#[derive(Debug)]
pub(crate) struct ScrollPage {
    pub(crate) scroll_id: Option<String>,
    pub(crate) records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct ClusterInfo {
    version: ClusterVersion,
}

#[derive(Debug, Deserialize)]
struct ClusterVersion {
    number: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "_scroll_id")]
    scroll_id: Option<String>,
    hits: Option<SearchHits>,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<Value>,
}

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    config: ElasticConfig,
    version: ElasticVersion,
    options: ElasticOptions,
}

/// HTTP client bound to one index of a cluster with a negotiated version.
///
/// Cheap to clone, clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ElasticClient {
    inner: Arc<Inner>,
}

impl ElasticClient {
    /// Connects to the cluster and negotiates its version.
    ///
    /// Fails with [`ErrorKind::ProducerConnectionFailed`] when the cluster cannot be reached and
    /// with [`ErrorKind::ProducerProtocolError`] when its version is not supported.
    pub async fn connect(config: ElasticConfig, options: ElasticOptions) -> DiffResult<Self> {
        register_metrics();

        let http = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|err| {
                diff_error!(
                    ErrorKind::ProducerConnectionFailed,
                    "Failed to build the Elasticsearch HTTP client",
                    source: err
                )
            })?;

        let info: ClusterInfo = {
            let request = authenticate(http.get(format!("{}/", config.url)), &config);
            let response = send(request, "info").await?;
            decode(response, "info").await?
        };

        let version = ElasticVersion::parse(&info.version.number)?;
        if !(MIN_SUPPORTED_MAJOR..=MAX_SUPPORTED_MAJOR).contains(&version.major) {
            bail!(
                ErrorKind::ProducerProtocolError,
                "Unsupported Elasticsearch version",
                format!(
                    "cluster at {} runs {}, supported majors are {MIN_SUPPORTED_MAJOR} to {MAX_SUPPORTED_MAJOR}",
                    config.url, version.number
                )
            );
        }

        if config.doc_type.is_some() && !version.supports_types() {
            warn!(
                index = %config.index,
                version = %version.number,
                "ignoring document type, the cluster does not support types"
            );
        }

        info!(
            url = %config.url,
            index = %config.index,
            version = %version.number,
            "connected to elasticsearch"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                config,
                version,
                options,
            }),
        })
    }

    pub fn version(&self) -> &ElasticVersion {
        &self.inner.version
    }

    pub fn config(&self) -> &ElasticConfig {
        &self.inner.config
    }

    /// Returns the search path of the index, with the document type when the cluster uses types.
    pub fn search_path(&self) -> String {
        let config = &self.inner.config;
        match &config.doc_type {
            Some(doc_type) if self.inner.version.supports_types() => {
                format!("{}/{}/{doc_type}/_search", config.url, config.index)
            }
            _ => format!("{}/{}/_search", config.url, config.index),
        }
    }

    /// Opens a scroll with the given search body and returns its first page.
    pub(crate) async fn open_scroll(&self, body: &Value) -> DiffResult<ScrollPage> {
        let url = format!("{}?scroll={}", self.search_path(), self.keepalive());
        debug!(%url, "opening scroll");

        let request = self.request(Method::POST, url).json(body);
        let response = send(request, "search").await?;

        decode_page(response, "search").await
    }

    /// Fetches the next page of an open scroll.
    pub(crate) async fn continue_scroll(&self, scroll_id: &str) -> DiffResult<ScrollPage> {
        let url = format!("{}/_search/scroll", self.inner.config.url);
        let body = json!({
            "scroll": self.keepalive(),
            "scroll_id": scroll_id,
        });

        let request = self.request(Method::POST, url).json(&body);
        let response = send(request, "scroll").await?;

        decode_page(response, "scroll").await
    }

    /// Releases the resources of a scroll on the cluster.
    ///
    /// Failures are logged and otherwise ignored, the scroll expires after its keepalive anyway.
    pub(crate) async fn clear_scroll(&self, scroll_id: &str) {
        let url = format!("{}/_search/scroll", self.inner.config.url);
        let body = json!({ "scroll_id": [scroll_id] });

        let request = self.request(Method::DELETE, url).json(&body);
        match send(request, "clear_scroll").await {
            Ok(response) if response.status().is_success() => debug!("cleared scroll"),
            Ok(response) => warn!(status = %response.status(), "failed to clear scroll"),
            Err(err) => warn!(error = %err, "failed to clear scroll"),
        }
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        authenticate(self.inner.http.request(method, url), &self.inner.config)
    }

    fn keepalive(&self) -> String {
        format!("{}s", self.inner.options.scroll_keepalive.as_secs().max(1))
    }
}

fn authenticate(request: RequestBuilder, config: &ElasticConfig) -> RequestBuilder {
    match (&config.username, &config.password) {
        (None, None) => request,
        (username, password) => request.basic_auth(
            username.as_deref().unwrap_or_default(),
            password.as_ref().map(|password| password.expose_secret()),
        ),
    }
}

/// Sends a request and records its duration.
async fn send(request: RequestBuilder, operation: &'static str) -> DiffResult<Response> {
    let started = Instant::now();
    let result = request.send().await;
    record_duration(operation, started.elapsed());

    result.map_err(|err| transport_error(err, operation))
}

fn record_duration(operation: &'static str, elapsed: Duration) {
    histogram!(DOCDIFF_ES_REQUEST_DURATION_SECONDS, OPERATION_LABEL => operation)
        .record(elapsed.as_secs_f64());
}

/// Reads a successful response body into `T`.
async fn decode<T>(response: Response, operation: &'static str) -> DiffResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|err| transport_error(err, operation))?;

    if !status.is_success() {
        let text = String::from_utf8_lossy(&body);
        let quoted: String = text.chars().take(MAX_ERROR_BODY_LEN).collect();

        bail!(
            ErrorKind::ProducerProtocolError,
            "Elasticsearch rejected the request",
            format!("{operation} returned {status}: {quoted}")
        );
    }

    serde_json::from_slice(&body).map_err(|err| {
        diff_error!(
            ErrorKind::ProducerMalformedRecord,
            "Failed to decode Elasticsearch response",
            format!("{operation} response could not be decoded: {err}"),
            source: err
        )
    })
}

async fn decode_page(response: Response, operation: &'static str) -> DiffResult<ScrollPage> {
    let response: SearchResponse = decode(response, operation).await?;

    let Some(hits) = response.hits else {
        bail!(
            ErrorKind::ProducerProtocolError,
            "Elasticsearch response has no hits",
            format!("{operation} response is missing the 'hits' object")
        );
    };

    let records = hits
        .hits
        .into_iter()
        .enumerate()
        .map(|(position, hit)| decode_hit(hit, position))
        .collect::<DiffResult<Vec<_>>>()?;

    Ok(ScrollPage {
        scroll_id: response.scroll_id,
        records,
    })
}

fn decode_hit(hit: Value, position: usize) -> DiffResult<Record> {
    serde_json::from_value(hit).map_err(|err| {
        diff_error!(
            ErrorKind::ProducerMalformedRecord,
            "Malformed Elasticsearch hit",
            format!("hit {position} of the page could not be decoded: {err}"),
            source: err
        )
    })
}

fn transport_error(err: reqwest::Error, operation: &'static str) -> DiffError {
    let kind = if err.is_decode() {
        ErrorKind::ProducerMalformedRecord
    } else {
        ErrorKind::ProducerConnectionFailed
    };

    diff_error!(
        kind,
        "Elasticsearch request failed",
        format!("{operation} request failed: {err}"),
        source: err
    )
}
