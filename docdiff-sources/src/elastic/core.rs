use std::time::Duration;

use docdiff::config::ProducerConfig;
use docdiff::error::{DiffError, DiffResult};
use docdiff::producer::{IterateRequest, Producer};
use docdiff::types::Record;
use futures::{Stream, TryStreamExt, stream};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::elastic::client::{ElasticClient, ScrollPage};
use crate::elastic::config::ElasticConfig;

/// Request settings of an [`ElasticClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElasticOptions {
    /// How long the cluster keeps a scroll context alive between two pages.
    pub scroll_keepalive: Duration,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
}

impl Default for ElasticOptions {
    fn default() -> Self {
        Self::from(&ProducerConfig::default())
    }
}

impl From<&ProducerConfig> for ElasticOptions {
    fn from(config: &ProducerConfig) -> Self {
        Self {
            scroll_keepalive: config.scroll_keepalive(),
            request_timeout: config.request_timeout(),
        }
    }
}

/// Position of a running scroll.
enum ScrollState {
    Open(Value),
    Continue(OpenScroll),
    Finished,
}

/// Scroll context held on the cluster.
///
/// A scroll dropped before it was exhausted, because the stream was cancelled or failed, is
/// cleared in the background. Without a runtime it expires after its keepalive.
struct OpenScroll {
    client: ElasticClient,
    scroll_id: Option<String>,
}

impl OpenScroll {
    /// Clears the scroll now and disarms the background clear.
    async fn clear(mut self) {
        if let Some(scroll_id) = self.scroll_id.take() {
            self.client.clear_scroll(&scroll_id).await;
        }
    }
}

impl Drop for OpenScroll {
    fn drop(&mut self) {
        let Some(scroll_id) = self.scroll_id.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("clearing abandoned scroll");

                let client = self.client.clone();
                handle.spawn(async move { client.clear_scroll(&scroll_id).await });
            }
            Err(_) => debug!("no runtime to clear abandoned scroll, it expires after its keepalive"),
        }
    }
}

/// Producer reading every document of an index through the scroll API.
#[derive(Debug, Clone)]
pub struct ElasticProducer {
    client: ElasticClient,
}

impl ElasticProducer {
    pub fn new(client: ElasticClient) -> Self {
        Self { client }
    }

    /// Connects to the cluster described by `config`.
    pub async fn connect(config: ElasticConfig, options: ElasticOptions) -> DiffResult<Self> {
        let client = ElasticClient::connect(config, options).await?;

        Ok(Self::new(client))
    }

    pub fn client(&self) -> &ElasticClient {
        &self.client
    }
}

impl Producer for ElasticProducer {
    fn name() -> &'static str {
        "elasticsearch"
    }

    fn records(
        &self,
        request: IterateRequest,
    ) -> impl Stream<Item = DiffResult<Record>> + Send + 'static {
        let client = self.client.clone();
        let body = build_search_body(&request);

        info!(
            index = %client.config().index,
            sort = %request.sort.field,
            batch_size = request.batch_size,
            "starting scroll"
        );

        stream::try_unfold(ScrollState::Open(body), move |state| {
            let client = client.clone();

            async move {
                let (page, scroll) = match state {
                    ScrollState::Open(body) => {
                        let page = client.open_scroll(&body).await?;
                        let scroll = OpenScroll {
                            client,
                            scroll_id: None,
                        };

                        (page, scroll)
                    }
                    ScrollState::Continue(scroll) => {
                        let Some(scroll_id) = scroll.scroll_id.as_deref() else {
                            return Ok(None);
                        };
                        let page = scroll.client.continue_scroll(scroll_id).await?;

                        (page, scroll)
                    }
                    ScrollState::Finished => return Ok(None),
                };

                Ok::<_, DiffError>(next_state(scroll, page).await)
            }
        })
        .map_ok(|records| stream::iter(records.into_iter().map(Ok::<Record, DiffError>)))
        .try_flatten()
    }
}

/// Decides how to continue after a page.
///
/// An empty page ends the scroll and clears it. A page without scroll id is the last one.
async fn next_state(
    mut scroll: OpenScroll,
    page: ScrollPage,
) -> Option<(Vec<Record>, ScrollState)> {
    let last = page.scroll_id.is_none();
    if let Some(scroll_id) = page.scroll_id {
        scroll.scroll_id = Some(scroll_id);
    }

    if page.records.is_empty() {
        scroll.clear().await;
        debug!("scroll exhausted");

        return None;
    }

    debug!(count = page.records.len(), "received scroll page");

    let state = if last {
        ScrollState::Finished
    } else {
        ScrollState::Continue(scroll)
    };

    Some((page.records, state))
}

/// Builds the body of the initial search request.
pub(crate) fn build_search_body(request: &IterateRequest) -> Value {
    let order = if request.sort.ascending { "asc" } else { "desc" };

    let mut sort = Map::new();
    sort.insert(request.sort.field.clone(), json!({ "order": order }));

    let mut body = Map::new();
    body.insert("size".to_owned(), json!(request.batch_size.max(1)));
    body.insert("sort".to_owned(), json!([sort]));

    if let Some(query) = &request.query {
        body.insert("query".to_owned(), query.clone());
    }

    if !request.includes.is_empty() || !request.excludes.is_empty() {
        body.insert(
            "_source".to_owned(),
            json!({
                "includes": request.includes,
                "excludes": request.excludes,
            }),
        );
    }

    Value::Object(body)
}
