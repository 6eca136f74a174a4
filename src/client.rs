//! Query session client
//!
//! [`QueryClient`] is the caller-owned entry point: it holds the HTTP client,
//! endpoint, token provider and diagnostics for every query sent through it.
//! Everything is built and validated in [`QueryClientBuilder::build`], so a
//! bad endpoint or TLS setup fails there rather than on the first query.

use crate::accumulate::{self, Partial};
use crate::auth::{EnvTokenProvider, TokenProvider};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{CancelScope, PageFetcher, Sleeper};
use crate::pager::Pager;
use crate::query::QueryDescriptor;
use crate::response::{ResponsePage, ResponseParser};
use bytes::Bytes;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// Resource Graph query client
///
/// Cheap to clone; clones share the same HTTP connection pool and token
/// provider.
#[derive(Debug, Clone)]
pub struct QueryClient {
    fetcher: Arc<PageFetcher>,
}

impl QueryClient {
    /// Create a new client builder
    pub fn builder() -> QueryClientBuilder {
        QueryClientBuilder::default()
    }

    /// Client with default config and a token from `AZURE_ACCESS_TOKEN`
    pub fn from_env() -> Result<Self> {
        Self::builder()
            .token_provider(Arc::new(EnvTokenProvider::new()))
            .build()
    }

    /// The query operation URL
    pub fn url(&self) -> &url::Url {
        self.fetcher.url()
    }

    /// Start paging through a query
    pub fn pager(&self, descriptor: &QueryDescriptor) -> Result<Pager> {
        Pager::new(Arc::clone(&self.fetcher), descriptor.clone())
    }

    /// Fetch a single page
    pub async fn fetch_page(
        &self,
        descriptor: &QueryDescriptor,
        skip_token: Option<&str>,
        scope: &CancelScope,
    ) -> Result<ResponsePage> {
        self.fetcher.fetch(descriptor, skip_token, scope).await
    }

    /// Fetch every page and return the raw `data` arrays
    pub async fn collect_all(&self, descriptor: &QueryDescriptor) -> Result<Vec<Bytes>> {
        accumulate::collect_all(self, descriptor).await
    }

    /// Fetch every page and deserialize all records into `T`
    pub async fn collect_records<T: DeserializeOwned>(
        &self,
        descriptor: &QueryDescriptor,
    ) -> std::result::Result<Vec<T>, Partial<T>> {
        accumulate::collect_records(self, descriptor).await
    }
}

/// Builder for [`QueryClient`]
#[derive(Default)]
pub struct QueryClientBuilder {
    config: ClientConfig,
    token_provider: Option<Arc<dyn TokenProvider>>,
    http_client: Option<Client>,
    sleeper: Option<Arc<dyn Sleeper>>,
    parser: Option<ResponseParser>,
}

impl QueryClientBuilder {
    /// Set the client config
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the token provider
    pub fn token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Use a caller-built HTTP client instead of one built from config
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Replace the sleeper used for rate-limit waits
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Replace the response parser
    pub fn parser(mut self, parser: ResponseParser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Build the client
    ///
    /// Without an explicit token provider the token is read from
    /// `AZURE_ACCESS_TOKEN` on each request.
    pub fn build(self) -> Result<QueryClient> {
        let provider = self
            .token_provider
            .unwrap_or_else(|| Arc::new(EnvTokenProvider::new()));

        let mut fetcher = match self.http_client {
            Some(client) => PageFetcher::with_client(&self.config, provider, client)?,
            None => PageFetcher::new(&self.config, provider)?,
        };
        if let Some(sleeper) = self.sleeper {
            fetcher = fetcher.with_sleeper(sleeper);
        }
        if let Some(parser) = self.parser {
            fetcher = fetcher.with_parser(parser);
        }

        debug!(url = %fetcher.url(), "Built query client");
        Ok(QueryClient {
            fetcher: Arc::new(fetcher),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;
    use crate::error::Error;

    #[test]
    fn test_build_default() {
        let client = QueryClient::builder()
            .token_provider(Arc::new(StaticTokenProvider::new("t")))
            .build()
            .unwrap();
        assert_eq!(
            client.url().as_str(),
            "https://management.azure.com/providers/Microsoft.ResourceGraph/resources?api-version=2021-06-01-preview"
        );
    }

    #[test]
    fn test_build_reports_bad_config() {
        let err = QueryClient::builder()
            .config(ClientConfig::builder().api_version("").build())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let err = QueryClient::builder()
            .config(ClientConfig::builder().endpoint("no scheme here").build())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_pager_validates_descriptor() {
        let client = QueryClient::from_env().unwrap();
        let err = client.pager(&QueryDescriptor::new(" ")).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery { .. }));

        let pager = client.pager(&QueryDescriptor::new("resources")).unwrap();
        assert!(pager.has_next());
    }
}
