//! Page fetcher
//!
//! Sends one query page request and turns the response into a
//! [`ResponsePage`]:
//! - Bearer token from the [`TokenProvider`] before every attempt
//! - HTTP 429 is waited out and retried with no attempt cap
//! - 401/403 and every other non-200 status fail without retry
//! - The body is read in full, then handed to the [`ResponseParser`]

use super::cancel::CancelScope;
use super::dump::Diagnostics;
use super::retry::{retry_after, RetryContext, Sleeper, TokioSleeper};
use crate::auth::TokenProvider;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::query::QueryDescriptor;
use crate::response::{QuotaInfo, ResponsePage, ResponseParser};
use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Request, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const APPLICATION_JSON: &str = "application/json";

/// Fetches single result pages from the query endpoint
pub struct PageFetcher {
    client: Client,
    url: Url,
    token_provider: Arc<dyn TokenProvider>,
    sleeper: Arc<dyn Sleeper>,
    parser: ResponseParser,
    default_retry_after: Duration,
    diagnostics: Diagnostics,
}

impl PageFetcher {
    /// Create a fetcher from config
    ///
    /// Builds the HTTP client and validates the endpoint up front.
    pub fn new(config: &ClientConfig, token_provider: Arc<dyn TokenProvider>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Self::with_client(config, token_provider, client)
    }

    /// Create a fetcher with a caller-supplied HTTP client
    pub fn with_client(
        config: &ClientConfig,
        token_provider: Arc<dyn TokenProvider>,
        client: Client,
    ) -> Result<Self> {
        Ok(Self {
            client,
            url: config.query_url()?,
            token_provider,
            sleeper: Arc::new(TokioSleeper),
            parser: ResponseParser::new(),
            default_retry_after: config.default_retry_after(),
            diagnostics: config.diagnostics,
        })
    }

    /// Replace the sleeper used for rate-limit waits
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Replace the response parser
    #[must_use]
    pub fn with_parser(mut self, parser: ResponseParser) -> Self {
        self.parser = parser;
        self
    }

    /// The query operation URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch one page
    ///
    /// `skip_token` is `None` (or empty) for the first page and the previous
    /// page's token afterwards.
    pub async fn fetch(
        &self,
        descriptor: &QueryDescriptor,
        skip_token: Option<&str>,
        scope: &CancelScope,
    ) -> Result<ResponsePage> {
        descriptor.validate()?;
        let body = Bytes::from(serde_json::to_vec(&descriptor.request_body(skip_token))?);

        let mut retry = RetryContext::new();
        loop {
            scope.check()?;

            let token = self.bearer_token(scope).await?;
            let request = self.build_request(&token, body.clone())?;
            self.diagnostics.request(&request);

            let response = scope.run(self.client.execute(request)).await??;
            let status = response.status();
            self.diagnostics.response(status, response.headers());

            if status == StatusCode::TOO_MANY_REQUESTS {
                let delay = retry_after(response.headers(), self.default_retry_after);
                // Drain and discard; a broken throttle body is not worth failing over
                let _ = scope.run(response.bytes()).await?;

                retry.record(delay);
                warn!(
                    "Rate limited (429), attempt {}, retrying in {:?}",
                    retry.attempt, delay
                );
                scope.run(self.sleeper.sleep(delay)).await?;
                continue;
            }

            let quota = QuotaInfo::from_headers(response.headers());
            let body = match scope.run(response.bytes()).await? {
                Ok(body) => body,
                Err(e) if status == StatusCode::OK => return Err(e.into()),
                // The status is the error; keep it even if the body is lost
                Err(e) => {
                    warn!(status = status.as_u16(), "Failed to read error body: {e}");
                    Bytes::new()
                }
            };
            self.diagnostics.response_body(&body);

            return match status {
                StatusCode::OK => {
                    let mut page = self.parser.parse(body)?;
                    page.quota = quota;
                    debug!(
                        count = page.count,
                        total_records = page.total_records,
                        has_next = page.has_next(),
                        rate_limited = retry.attempt,
                        "Fetched page"
                    );
                    Ok(page)
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Unauthorized {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                }),
                _ => Err(Error::http_status(
                    status.as_u16(),
                    String::from_utf8_lossy(&body),
                )),
            };
        }
    }

    /// Get a non-empty token, reporting any failure as an auth error
    async fn bearer_token(&self, scope: &CancelScope) -> Result<String> {
        let token = match scope.run(self.token_provider.get_token()).await? {
            Ok(token) => token,
            Err(e @ Error::Auth { .. }) => return Err(e),
            Err(e) => return Err(Error::auth(e.to_string())),
        };
        if token.token.is_empty() {
            return Err(Error::auth("token provider returned an empty token"));
        }
        Ok(token.token)
    }

    fn build_request(&self, token: &str, body: Bytes) -> Result<Request> {
        Ok(self
            .client
            .post(self.url.clone())
            .bearer_auth(token)
            .header(ACCEPT, APPLICATION_JSON)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .body(body)
            .build()?)
    }
}

impl fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageFetcher")
            .field("url", &self.url.as_str())
            .field("parser", &self.parser)
            .field("default_retry_after", &self.default_retry_after)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}
