//! Client configuration
//!
//! [`ClientConfig`] holds everything a [`QueryClient`](crate::QueryClient)
//! needs apart from credentials. [`ConfigFile`] is the on-disk form (YAML or
//! JSON) and adds a credentials section.

use crate::auth::{ClientSecretCredential, EnvTokenProvider, StaticTokenProvider, TokenProvider};
use crate::error::{Error, Result};
use crate::http::Diagnostics;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Azure Resource Manager endpoint for the public cloud
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Resource Graph API version
pub const DEFAULT_API_VERSION: &str = "2021-06-01-preview";

/// Path of the query operation under the endpoint
pub const QUERY_PATH: &str = "providers/Microsoft.ResourceGraph/resources";

// ============================================================================
// Client Config
// ============================================================================

/// Configuration for the query client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Resource Manager endpoint
    pub endpoint: String,
    /// API version query parameter
    pub api_version: String,
    /// Per-request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
    /// Wait before retrying a throttled request without `Retry-After`
    pub default_retry_after_secs: u64,
    /// Request/response dumps
    pub diagnostics: Diagnostics,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: 60,
            user_agent: format!("resource-graph-client/{}", env!("CARGO_PKG_VERSION")),
            default_retry_after_secs: 2,
            diagnostics: Diagnostics::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Request timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Default rate-limit wait
    pub fn default_retry_after(&self) -> Duration {
        Duration::from_secs(self.default_retry_after_secs)
    }

    /// Full URL of the query operation
    pub fn query_url(&self) -> Result<url::Url> {
        let base = self.endpoint.trim_end_matches('/');
        if base.is_empty() {
            return Err(Error::config("endpoint must not be empty"));
        }
        if self.api_version.trim().is_empty() {
            return Err(Error::config("api_version must not be empty"));
        }

        let mut url = url::Url::parse(&format!("{base}/{QUERY_PATH}"))?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

/// Builder for client config
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Set the API version
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_secs = timeout.as_secs();
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Set the default rate-limit wait
    pub fn default_retry_after(mut self, wait: Duration) -> Self {
        self.config.default_retry_after_secs = wait.as_secs();
        self
    }

    /// Set the dump flags
    pub fn diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.config.diagnostics = diagnostics;
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Credential source declared in a config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialsConfig {
    /// Fixed bearer token
    Static { token: String },
    /// Token read from an environment variable
    Env {
        #[serde(default)]
        variable: Option<String>,
    },
    /// Service principal with a client secret
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
        #[serde(default)]
        authority: Option<String>,
    },
}

impl CredentialsConfig {
    /// Build the token provider
    pub fn into_provider(self) -> Result<Arc<dyn TokenProvider>> {
        let provider: Arc<dyn TokenProvider> = match self {
            Self::Static { token } => Arc::new(StaticTokenProvider::new(token)),
            Self::Env { variable } => Arc::new(
                variable.map_or_else(EnvTokenProvider::new, EnvTokenProvider::from_var),
            ),
            Self::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
                authority,
            } => {
                let credential = ClientSecretCredential::new(tenant_id, client_id, client_secret)?;
                Arc::new(match authority {
                    Some(authority) => credential.with_authority(authority),
                    None => credential,
                })
            }
        };
        Ok(provider)
    }
}

// ============================================================================
// Config File
// ============================================================================

/// On-disk configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(flatten)]
    pub client: ClientConfig,
    #[serde(default)]
    pub credentials: Option<CredentialsConfig>,
}

impl ConfigFile {
    /// Parse a YAML (or JSON) document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from a file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup
    ///
    /// `RGQ_ENDPOINT` and `RGQ_API_VERSION` override the endpoint settings.
    /// When no credentials are configured and `AZURE_TENANT_ID`,
    /// `AZURE_CLIENT_ID` and `AZURE_CLIENT_SECRET` are all set, they are used
    /// as client-secret credentials.
    #[must_use]
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = lookup("RGQ_ENDPOINT") {
            self.client.endpoint = endpoint;
        }
        if let Some(version) = lookup("RGQ_API_VERSION") {
            self.client.api_version = version;
        }

        if self.credentials.is_none() {
            if let (Some(tenant_id), Some(client_id), Some(client_secret)) = (
                lookup("AZURE_TENANT_ID"),
                lookup("AZURE_CLIENT_ID"),
                lookup("AZURE_CLIENT_SECRET"),
            ) {
                self.credentials = Some(CredentialsConfig::ClientSecret {
                    tenant_id,
                    client_id,
                    client_secret,
                    authority: lookup("AZURE_AUTHORITY_HOST"),
                });
            }
        }
        self
    }
}
