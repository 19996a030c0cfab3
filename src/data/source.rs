//! Where station data comes from: a URL fetched once, or features handed in.

use crate::{
    data::feature::{Feature, FeatureCollection},
    Result,
};
use async_trait::async_trait;
use once_cell::sync::Lazy;

/// Built once so every fetcher shares one connection pool
static SHARED_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

/// Origin of a view's feature collection
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// GeoJSON document fetched with a single GET
    Url(String),
    /// Preloaded features
    Inline(Vec<Feature>),
}

impl DataSource {
    pub fn url(&self) -> Option<&str> {
        match self {
            DataSource::Url(url) => Some(url),
            DataSource::Inline(_) => None,
        }
    }
}

impl Default for DataSource {
    fn default() -> Self {
        DataSource::Inline(Vec::new())
    }
}

/// Fetches a document body. Injected so views can be tested without a network.
#[async_trait]
pub trait DataFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// `reqwest`-backed fetcher. No retry and no timeout beyond the client defaults.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: SHARED_CLIENT.clone(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetches `url` and parses the body as a feature collection
pub async fn fetch_features(fetcher: &dyn DataFetcher, url: &str) -> Result<Vec<Feature>> {
    let body = fetcher.fetch(url).await?;
    let collection = FeatureCollection::from_body(&body)?;
    log::info!("loaded {} feature(s) from {}", collection.len(), url);
    Ok(collection.into_features())
}

/// Runs [`fetch_features`] on the tokio runtime and delivers the outcome over
/// a channel, so a UI thread can poll for it without blocking.
#[cfg(feature = "tokio-runtime")]
pub fn spawn_fetch(
    fetcher: std::sync::Arc<dyn DataFetcher>,
    url: String,
) -> crossbeam_channel::Receiver<Result<Vec<Feature>>> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    tokio::spawn(async move {
        let result = fetch_features(fetcher.as_ref(), &url).await;
        if tx.send(result).is_err() {
            log::debug!("fetch of {} finished after its receiver was dropped", url);
        }
    });
    rx
}
