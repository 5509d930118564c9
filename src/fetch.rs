//! Page fetching, either directly or through a remote rendering proxy.
//!
//! # Strategies
//!
//! - **Direct**: plain `GET` with the run's header set.
//! - **Proxied**: `POST` a job descriptor to the rendering proxy, which
//!   fetches the page on our behalf and returns the raw body as JSON.
//!
//! No retries or custom timeouts; a failure goes straight back to the caller.

use crate::error::{Result, ScrapeError};
use crate::headers::HeaderSet;
use crate::utils::truncate_for_log;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};
use url::Url;

/// Public rendering proxy endpoint.
pub const DEFAULT_PROXY_ENDPOINT: &str = "https://scrapeninja.p.rapidapi.com/scrape";

/// Characters of response body kept in error messages.
const ERROR_EXCERPT_CHARS: usize = 200;

/// Anything that can turn a URL into a page body.
///
/// The aggregator and batch runner are generic over this so tests can
/// script page responses without a network.
pub trait PageFetcher {
    async fn fetch_body(&self, url: &str, headers: &HeaderSet) -> Result<String>;
}

/// How pages are retrieved for the whole run.
#[derive(Clone)]
pub enum FetchStrategy {
    Direct,
    Proxied { endpoint: String, api_key: String },
}

impl std::fmt::Debug for FetchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStrategy::Direct => f.write_str("Direct"),
            FetchStrategy::Proxied { endpoint, .. } => f
                .debug_struct("Proxied")
                .field("endpoint", endpoint)
                .field("api_key", &"<redacted>")
                .finish(),
        }
    }
}

/// Job descriptor sent to the rendering proxy.
#[derive(Debug, Serialize)]
struct ProxyJob<'a> {
    url: &'a str,
    method: &'static str,
    headers: &'a BTreeMap<String, String>,
    autoparse: bool,
}

#[derive(Debug, Deserialize)]
struct ProxyPayload {
    body: Option<serde_json::Value>,
}

/// `reqwest`-backed fetcher shared across the run.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    strategy: FetchStrategy,
}

impl HttpFetcher {
    pub fn new(strategy: FetchStrategy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ScrapeError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, strategy })
    }

    pub fn strategy(&self) -> &FetchStrategy {
        &self.strategy
    }

    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch_direct(&self, url: &str, headers: &HeaderSet) -> Result<String> {
        let response = self
            .client
            .get(url)
            .headers(headers.to_header_map())
            .send()
            .await
            .map_err(|e| ScrapeError::transport(url, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ScrapeError::transport(url, e))?;

        if !status.is_success() {
            return Err(ScrapeError::Fetch {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: truncate_for_log(&text, ERROR_EXCERPT_CHARS),
            });
        }

        debug!(bytes = text.len(), "Fetched page directly");
        Ok(text)
    }

    #[instrument(level = "debug", skip_all, fields(%url, %endpoint))]
    async fn fetch_proxied(
        &self,
        url: &str,
        headers: &HeaderSet,
        endpoint: &str,
        api_key: &str,
    ) -> Result<String> {
        let job = ProxyJob {
            url,
            method: "GET",
            headers: headers.as_map(),
            autoparse: false,
        };

        let mut request = self
            .client
            .post(endpoint)
            .header("content-type", "application/json")
            .header("x-rapidapi-key", api_key)
            .json(&job);
        if let Some(host) = proxy_host(endpoint) {
            request = request.header("x-rapidapi-host", host);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ScrapeError::transport(url, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ScrapeError::transport(url, e))?;

        if !status.is_success() {
            return Err(ScrapeError::Fetch {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: format!(
                    "rendering proxy rejected the job: {}",
                    truncate_for_log(&text, ERROR_EXCERPT_CHARS)
                ),
            });
        }

        let body = proxy_body(url, &text)?;
        debug!(bytes = body.len(), "Fetched page through rendering proxy");
        Ok(body)
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch_body(&self, url: &str, headers: &HeaderSet) -> Result<String> {
        match &self.strategy {
            FetchStrategy::Direct => self.fetch_direct(url, headers).await,
            FetchStrategy::Proxied { endpoint, api_key } => {
                self.fetch_proxied(url, headers, endpoint, api_key).await
            }
        }
    }
}

/// Pull the page body out of a proxy response payload.
///
/// The payload must be a JSON object with a string `body`.
fn proxy_body(url: &str, payload: &str) -> Result<String> {
    let malformed = |reason: String| ScrapeError::MalformedResponse {
        url: url.to_string(),
        reason,
    };

    let parsed: ProxyPayload =
        serde_json::from_str(payload).map_err(|e| malformed(format!("invalid JSON: {e}")))?;

    match parsed.body {
        Some(serde_json::Value::String(body)) => Ok(body),
        Some(_) => Err(malformed("`body` is not a string".to_string())),
        None => Err(malformed("missing `body` field".to_string())),
    }
}

fn proxy_host(endpoint: &str) -> Option<String> {
    Url::parse(endpoint)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}
