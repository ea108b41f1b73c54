//! Retrying HTTP transport shared by the platform adapters.

use std::time::Duration;

use adsync_common::resilience::BackoffStrategy;
use adsync_core::limiter::RemoteError;
use adsync_domain::{AdSyncError, Result};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::{debug, warn};

use crate::errors::{remote_error_from_http, InfraError};

/// Transport that re-sends a request after a connect failure, a timeout or
/// a 5xx answer.
///
/// Throttling is passed through: a 429 or an error body comes
/// back to the caller untouched so the limiter can classify it.
#[derive(Clone)]
pub struct HttpClient {
    inner: ReqwestClient,
    attempts: u32,
    backoff: BackoffStrategy,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.inner.request(method, url)
    }

    /// Sends `builder`, retrying transient failures up to the configured
    /// attempt count.
    pub async fn send(&self, builder: RequestBuilder) -> std::result::Result<Response, RemoteError> {
        let mut attempt: u32 = 1;

        loop {
            let request = builder
                .try_clone()
                .ok_or_else(|| RemoteError::other("streaming request body cannot be retried"))?
                .build()
                .map_err(|err| remote_error_from_http(&err))?;
            let method = request.method().clone();
            let url = redact_query(request.url());
            let last = attempt >= self.attempts;

            let retry_reason = match self.inner.execute(request).await {
                Ok(response) if response.status().is_server_error() && !last => {
                    format!("status {}", response.status())
                }
                Ok(response) => {
                    debug!(attempt, %method, %url, status = %response.status(), "response received");
                    return Ok(response);
                }
                Err(err) if is_transient(&err) && !last => err.to_string(),
                Err(err) => {
                    debug!(attempt, %method, %url, error = %err, "request failed");
                    return Err(remote_error_from_http(&err));
                }
            };

            let delay = self.backoff.delay_for(attempt - 1);
            warn!(attempt, %method, %url, reason = %retry_reason, ?delay, "transient HTTP failure, retrying");
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    attempts: u32,
    backoff: BackoffStrategy,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            attempts: 3,
            backoff: BackoffStrategy::doubling(Duration::from_millis(200)),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    /// Per-request timeout, covering connect and body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total tries including the first one. Zero is treated as one.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        self.backoff
            .validate()
            .map_err(|err| AdSyncError::Config(format!("http backoff: {err}")))?;

        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        let inner = builder.build().map_err(|err| AdSyncError::from(InfraError::from(err)))?;

        Ok(HttpClient { inner, attempts: self.attempts.max(1), backoff: self.backoff })
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// URL for log fields with the query string dropped (paging links carry
/// access tokens).
fn redact_query(url: &reqwest::Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}
