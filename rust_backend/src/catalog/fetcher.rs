//! Text retrieval over HTTP with a per-attempt timeout, bounded retries and
//! cooperative cancellation. Only transient failures are retried.

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::CatalogSettings;
use crate::error::{CatalogError, CatalogResult};

/// Pause between failed attempts, multiplied by the attempt number.
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// A request for a text payload.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchRequest {
    /// GET with URL-encoded query parameters
    Get {
        url: String,
        query: Vec<(String, String)>,
    },
    /// POST of an URL-encoded form
    PostForm {
        url: String,
        form: Vec<(String, String)>,
    },
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        FetchRequest::Get {
            url: url.into(),
            query: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            FetchRequest::Get { url, .. } | FetchRequest::PostForm { url, .. } => url,
        }
    }

    /// Value of a query or form parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        let pairs = match self {
            FetchRequest::Get { query, .. } => query,
            FetchRequest::PostForm { form, .. } => form,
        };
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Source of raw catalog text.
///
/// Implementations must be `Send + Sync` so that several sources can share
/// one fetcher across concurrent retrievals.
#[async_trait]
pub trait TextFetcher: Send + Sync {
    /// Retrieves the payload for `request`, giving up when `cancel` fires.
    async fn fetch_text(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> CatalogResult<String>;
}

/// `reqwest` backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
    attempts: u32,
}

impl HttpFetcher {
    /// # Arguments
    /// * `timeout` - limit for a single attempt
    /// * `attempts` - total attempts, at least one
    pub fn new(timeout: Duration, attempts: u32) -> CatalogResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            timeout,
            attempts: attempts.max(1),
        })
    }

    pub fn from_settings(settings: &CatalogSettings) -> CatalogResult<Self> {
        Self::new(Duration::from_secs(settings.timeout_secs), settings.attempts)
    }

    async fn send_once(&self, request: &FetchRequest) -> CatalogResult<String> {
        let builder = match request {
            FetchRequest::Get { url, query } => self.client.get(url).query(query),
            FetchRequest::PostForm { url, form } => self.client.post(url).form(form),
        };
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                url: request.url().to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl TextFetcher for HttpFetcher {
    async fn fetch_text(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> CatalogResult<String> {
        let mut last_error = CatalogError::Http("no attempt made".to_string());

        for attempt in 1..=self.attempts {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CatalogError::Cancelled),
                outcome = tokio::time::timeout(self.timeout, self.send_once(request)) => outcome,
            };

            match outcome {
                Ok(Ok(text)) => {
                    log::debug!("Fetched {} bytes from {}", text.len(), request.url());
                    return Ok(text);
                }
                Ok(Err(e)) => last_error = e,
                Err(_) => last_error = CatalogError::Timeout(self.timeout.as_secs()),
            }

            if !last_error.is_transient() {
                log::warn!("Request to {} failed: {}", request.url(), last_error);
                return Err(last_error);
            }

            log::warn!(
                "Attempt {}/{} for {} failed: {}",
                attempt,
                self.attempts,
                request.url(),
                last_error
            );

            if attempt < self.attempts {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(CatalogError::Cancelled),
                    _ = tokio::time::sleep(RETRY_DELAY * attempt) => {}
                }
            }
        }

        Err(last_error)
    }
}
