//! Polled data feeds
//!
//! Shared plumbing for the weather and transport feeds: the error taxonomy
//! of a poll cycle, the HTTP fetch seam, endpoint derivation from the page
//! URL, and the loop that fetches, parses and renders on a fixed cadence.

pub mod transport;
pub mod weather;

pub use transport::{DepartureRecord, TransportPoller, TransportSnapshot};
pub use weather::{WeatherPoller, WeatherSnapshot};

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use log::{debug, error};
use reqwest::{Client, Url};
use thiserror::Error;

use crate::document::Document;
use crate::scheduler::{task, Scheduler};

/// Errors that end a poll cycle without rendering
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request failed before a body arrived
    #[error("HTTP request failed: {0}")]
    Network(String),

    /// Response body is not the expected JSON
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Server answered with an error payload
    #[error("Upstream reported error: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Network(err.to_string())
    }
}

/// Retrieves the body of a GET request
pub trait Fetch: Send + Sync {
    fn get(&self, url: Url) -> BoxFuture<'static, Result<String, FeedError>>;
}

/// [`Fetch`] over a shared reqwest client
#[derive(Debug, Clone, Default)]
pub struct HttpFetch {
    client: Client,
}

impl HttpFetch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an HttpFetch with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetch {
    fn get(&self, url: Url) -> BoxFuture<'static, Result<String, FeedError>> {
        let client = self.client.clone();
        async move {
            // Error statuses still carry a JSON body worth parsing
            let response = client.get(url).send().await?;
            Ok(response.text().await?)
        }
        .boxed()
    }
}

/// Failure to build an endpoint URL from the page URL
#[derive(Debug, Error)]
#[error("Cannot derive endpoint {path} from page URL: {reason}")]
pub struct EndpointError {
    path: String,
    reason: String,
}

/// Locations of the two JSON endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    weather: Url,
    transport: Url,
}

impl Endpoints {
    /// Derives both endpoints from the page URL.
    ///
    /// Endpoints live at the root of the page's origin. The page's query
    /// string is forwarded to the transport endpoint unmodified.
    pub fn from_page(page: &Url) -> Result<Self, EndpointError> {
        let join = |path: String| {
            page.join(&path).map_err(|e| EndpointError {
                path,
                reason: e.to_string(),
            })
        };
        let search = page
            .query()
            .filter(|q| !q.is_empty())
            .map(|q| format!("?{}", q))
            .unwrap_or_default();

        Ok(Self {
            weather: join("/weather_data".to_string())?,
            transport: join(format!("/transport_data{}", search))?,
        })
    }

    pub fn weather(&self) -> &Url {
        &self.weather
    }

    pub fn transport(&self) -> &Url {
        &self.transport
    }
}

/// One polled feed: how to fetch a snapshot and how to show it
pub trait Poller: Send + Sync + 'static {
    type Snapshot: Send + 'static;

    /// Feed name used in log lines
    const FEED: &'static str;

    /// Fetches and parses one snapshot
    fn poll(&self) -> BoxFuture<'static, Result<Self::Snapshot, FeedError>>;

    /// Writes a snapshot into the document, replacing what the feed showed before
    fn render(&self, snapshot: &Self::Snapshot, doc: &Document);
}

/// Applies the outcome of one poll cycle.
///
/// A snapshot is rendered; an error is logged and the document is left
/// showing the last good values. The outcome is returned for callers that
/// want to inspect it.
pub fn reconcile<P: Poller>(
    poller: &P,
    result: Result<P::Snapshot, FeedError>,
    doc: &Document,
) -> Result<(), FeedError> {
    match result {
        Ok(snapshot) => {
            poller.render(&snapshot, doc);
            debug!("Rendered {} snapshot", P::FEED);
            Ok(())
        }
        Err(err) => {
            error!("Error fetching {} data: {}", P::FEED, err);
            Err(err)
        }
    }
}

/// Runs one cycle: fetch, then render or log
pub async fn run_cycle<P: Poller>(poller: &P, doc: &Document) -> Result<(), FeedError> {
    let result = poller.poll().await;
    reconcile(poller, result, doc)
}

/// Starts a feed loop: one cycle right away, then one every `interval`.
///
/// There is no retry or backoff; a failed cycle simply waits for the next
/// tick.
pub fn start_polling<P: Poller>(
    poller: Arc<P>,
    interval: Duration,
    scheduler: &dyn Scheduler,
    doc: Document,
) {
    let cycle = task(move || {
        let poller = poller.clone();
        let doc = doc.clone();
        async move {
            // Already logged
            let _ = run_cycle(&*poller, &doc).await;
        }
    });
    scheduler.run_after(Duration::ZERO, cycle.clone());
    scheduler.run_every(interval, cycle);
    debug!("{} polling every {}s", P::FEED, interval.as_secs());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn test_endpoints_at_origin_root() {
        let endpoints = Endpoints::from_page(&page("http://127.0.0.1:5000/")).unwrap();
        assert_eq!(endpoints.weather().as_str(), "http://127.0.0.1:5000/weather_data");
        assert_eq!(
            endpoints.transport().as_str(),
            "http://127.0.0.1:5000/transport_data"
        );
    }

    #[test]
    fn test_endpoints_ignore_page_path() {
        let endpoints =
            Endpoints::from_page(&page("http://board.local/kiosk/index.html")).unwrap();
        assert_eq!(endpoints.weather().as_str(), "http://board.local/weather_data");
    }

    #[test]
    fn test_transport_forwards_query_string() {
        let endpoints = Endpoints::from_page(&page(
            "http://board.local/?station=Garching&types=UBAHN,BUS",
        ))
        .unwrap();
        assert_eq!(
            endpoints.transport().as_str(),
            "http://board.local/transport_data?station=Garching&types=UBAHN,BUS"
        );
        assert_eq!(endpoints.weather().query(), None);
    }

    #[test]
    fn test_empty_query_is_not_forwarded() {
        let endpoints = Endpoints::from_page(&page("http://board.local/?")).unwrap();
        assert_eq!(
            endpoints.transport().as_str(),
            "http://board.local/transport_data"
        );
    }

    #[test]
    fn test_feed_error_messages() {
        let err = FeedError::Upstream("upstream down".to_string());
        assert_eq!(err.to_string(), "Upstream reported error: upstream down");

        let parse = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let err = FeedError::from(parse);
        assert!(err.to_string().starts_with("Failed to parse JSON response"));
    }
}
