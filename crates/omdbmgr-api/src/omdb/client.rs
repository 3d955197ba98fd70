//! `OmdbClient` - OMDb search API client implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::instrument;
use url::Url;

use super::api::LocalOmdbApi;
use super::error::OmdbError;
use super::params::SearchTerm;
use super::types::SearchPage;
use super::xml::parse_search_response;

/// Default search endpoint.
pub const DEFAULT_BASE_URL: &str = "http://www.omdbapi.com/";

/// Connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(4);

/// Read timeout.
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum number of body characters kept in a status error.
const ERROR_BODY_PREVIEW: usize = 500;

/// Endpoint and timeouts used by `OmdbClient`.
///
/// Defaults match the public OMDb endpoint with a 4s connect timeout and a
/// 60s read timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Search endpoint (`None` = [`DEFAULT_BASE_URL`]).
    pub base_url: Option<Url>,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Read timeout.
    pub read_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
        }
    }
}

/// OMDb search API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct OmdbClient {
    /// HTTP client (reqwest, gzip enabled).
    http_client: Client,
    /// Search endpoint.
    base_url: Url,
}

/// Builder for `OmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct OmdbClientBuilder {
    config: FetchConfig,
    user_agent: Option<String>,
}

impl OmdbClientBuilder {
    /// Creates a new builder.
    fn new() -> Self {
        Self {
            config: FetchConfig::default(),
            user_agent: None,
        }
    }

    /// Replaces the whole fetch configuration.
    #[must_use]
    pub fn config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.config.base_url = Some(url);
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<OmdbClient> {
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.config.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .connect_timeout(self.config.connect_timeout)
            .read_timeout(self.config.read_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(OmdbClient {
            http_client,
            base_url,
        })
    }
}

/// Wraps a reqwest error for `url`.
fn transport_error(url: &Url, source: reqwest::Error) -> OmdbError {
    OmdbError::Transport {
        url: url.to_string(),
        source,
    }
}

impl OmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> OmdbClientBuilder {
        OmdbClientBuilder::new()
    }

    /// Builds the search URL for `term`.
    ///
    /// `page == 0` omits the `page` parameter:
    /// `{base}?s={term}&r=xml` or `{base}?s={term}&r=xml&page={page}`.
    #[must_use]
    pub fn request_url(&self, term: &SearchTerm, page: u32) -> Url {
        let mut query = format!("s={}&r=xml", term.query_value());
        if page != 0 {
            query.push_str("&page=");
            query.push_str(&page.to_string());
        }

        let mut url = self.base_url.clone();
        url.set_query(Some(&query));
        url
    }

    /// Performs one search request and returns the raw response body.
    ///
    /// The connection is released before this returns, whether the request
    /// succeeded or not.
    ///
    /// # Errors
    ///
    /// - [`OmdbError::Transport`] on connection, timeout or body read errors.
    /// - [`OmdbError::Status`] if the server answers with a non-success code.
    #[instrument(skip_all, fields(page = page))]
    pub async fn fetch(&self, term: &SearchTerm, page: u32) -> Result<Vec<u8>, OmdbError> {
        let url = self.request_url(term, page);
        tracing::info!("searching movies: URL:[{url}]");

        let send_result = self.http_client.get(url.clone()).send().await;
        let response = send_result.map_err(|e| transport_error(&url, e))?;

        let status = response.status();
        tracing::trace!(%status, headers = ?response.headers(), "Response headers");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            return Err(OmdbError::Status {
                code: status.as_u16(),
                reason: String::from(status.canonical_reason().unwrap_or("Unknown")),
                body: body.chars().take(ERROR_BODY_PREVIEW).collect(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&url, e))?;
        tracing::debug!(body_len = body.len(), "Response body received");

        Ok(body.to_vec())
    }
}

impl LocalOmdbApi for OmdbClient {
    #[instrument(skip_all)]
    async fn search_page(&self, term: &SearchTerm, page: u32) -> Result<SearchPage, OmdbError> {
        let body = self.fetch(term, page).await?;
        parse_search_response(body.as_slice())
    }
}
