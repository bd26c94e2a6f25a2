//! Page sources
//!
//! Defines the `PageSource` trait the fetch engine pulls pages from, and
//! the HTTP implementation that talks to the contact API.

use crate::auth::{AuthConfig, Credential};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::pagination::{PageExtractor, PageResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

// ============================================================================
// Request Outcome
// ============================================================================

/// Tagged result of a single page request
#[derive(Debug)]
pub enum RequestOutcome {
    /// The page was fetched and decoded
    Success(PageResponse),
    /// The API answered 429
    RateLimited {
        /// Seconds the server asked us to wait, if it said
        retry_after_seconds: Option<u64>,
    },
    /// Anything else: network error, timeout, non-2xx status, bad body
    TransportFailure(Error),
}

impl From<Result<PageResponse>> for RequestOutcome {
    fn from(result: Result<PageResponse>) -> Self {
        match result {
            Ok(page) => Self::Success(page),
            Err(Error::RateLimited {
                retry_after_seconds,
            }) => Self::RateLimited {
                retry_after_seconds,
            },
            Err(e) if e.is_rate_limited() => Self::RateLimited {
                retry_after_seconds: None,
            },
            Err(e) => Self::TransportFailure(e),
        }
    }
}

// ============================================================================
// Page Source Trait
// ============================================================================

/// Something the fetch engine can request pages from
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Request one page
    ///
    /// `cursor` is `None` for the first page. `limit` is the page size
    /// asked for; the source may return fewer records.
    async fn fetch_page(&self, cursor: Option<&str>, limit: u32) -> RequestOutcome;
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for &T {
    async fn fetch_page(&self, cursor: Option<&str>, limit: u32) -> RequestOutcome {
        (**self).fetch_page(cursor, limit).await
    }
}

// ============================================================================
// HTTP Page Source
// ============================================================================

/// Page source backed by the contact API over HTTP
#[derive(Debug)]
pub struct HttpPageSource {
    client: HttpClient,
    endpoint: String,
    limit_param: String,
    cursor_param: String,
    extra_query: Vec<(String, String)>,
    extractor: PageExtractor,
}

impl HttpPageSource {
    /// Build a source from API settings and a credential
    pub fn new(api: &ApiConfig, credential: Credential) -> Result<Self> {
        let mut builder = crate::http::HttpClientConfig::builder()
            .base_url(api.base_url.clone())
            .timeout(Duration::from_secs(api.timeout_secs));
        builder = match api.requests_per_second {
            Some(rps) => builder.rate_limit(crate::http::RateLimiterConfig::per_second(rps)),
            None => builder.no_rate_limit(),
        };
        if let Some(agent) = &api.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        for (name, value) in &api.headers {
            builder = builder.header(name, value);
        }

        let auth = if credential.is_empty() {
            AuthConfig::None
        } else {
            AuthConfig::api_key(credential)
        };
        let client = HttpClient::with_auth(builder.build(), auth)?;

        Ok(Self::with_client(client, api))
    }

    /// Build a source around an existing client
    pub fn with_client(client: HttpClient, api: &ApiConfig) -> Self {
        Self {
            client,
            endpoint: api.endpoint.clone(),
            limit_param: api.limit_param.clone(),
            cursor_param: api.cursor_param.clone(),
            extra_query: api
                .extra_query
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            extractor: PageExtractor::new(api.records_path.clone(), api.cursor_path.clone()),
        }
    }

    /// Build the query for one page request
    pub fn request_config(&self, cursor: Option<&str>, limit: u32) -> RequestConfig {
        let mut config = RequestConfig::new().query(&self.limit_param, limit.to_string());
        for (key, value) in &self.extra_query {
            config = config.query(key, value);
        }
        if let Some(cursor) = cursor {
            config = config.query(&self.cursor_param, cursor);
        }
        config
    }

    async fn request_page(&self, cursor: Option<&str>, limit: u32) -> Result<PageResponse> {
        let body: Value = self
            .client
            .get_json_with_config(&self.endpoint, self.request_config(cursor, limit))
            .await?;
        let page = self.extractor.extract(&body)?;
        debug!(
            records = page.len(),
            has_next = page.next_cursor.is_some(),
            "Decoded page"
        );
        Ok(page)
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, cursor: Option<&str>, limit: u32) -> RequestOutcome {
        self.request_page(cursor, limit).await.into()
    }
}
