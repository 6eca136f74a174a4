//! Token provider trait and simple providers

use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

/// Environment variable read by [`EnvTokenProvider::new`]
pub const DEFAULT_TOKEN_VAR: &str = "AZURE_ACCESS_TOKEN";

/// A bearer token with optional expiration
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The bearer token
    pub token: String,
    /// When the token expires, if known
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Create a token without a known expiry
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    /// Create a token that expires in the given number of seconds
    pub fn expires_in(token: impl Into<String>, seconds: i64) -> Self {
        Self {
            token: token.into(),
            expires_at: Some(Utc::now() + chrono::Duration::seconds(seconds)),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Supplies the bearer token for query requests
///
/// Called before every request attempt. Implementations should cache and
/// refresh tokens themselves; any error is reported to the caller as
/// [`Error::Auth`] and no request is sent.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get a currently valid token
    async fn get_token(&self) -> Result<AccessToken>;
}

/// Provider that always returns the same token
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    /// Create a provider for a fixed token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> Result<AccessToken> {
        if self.token.token.is_empty() {
            return Err(Error::auth("static token is empty"));
        }
        Ok(self.token.clone())
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider").finish_non_exhaustive()
    }
}

/// Provider that reads the token from an environment variable on every call
///
/// Lets an external process (for example `az account get-access-token`)
/// rotate the token without restarting the client.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    variable: String,
}

impl EnvTokenProvider {
    /// Read from `AZURE_ACCESS_TOKEN`
    pub fn new() -> Self {
        Self::from_var(DEFAULT_TOKEN_VAR)
    }

    /// Read from the given variable
    pub fn from_var(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }

    /// The variable this provider reads
    pub fn variable(&self) -> &str {
        &self.variable
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn get_token(&self) -> Result<AccessToken> {
        match std::env::var(&self.variable) {
            Ok(token) if !token.trim().is_empty() => Ok(AccessToken::new(token.trim())),
            _ => Err(Error::auth(format!(
                "environment variable {} is not set",
                self.variable
            ))),
        }
    }
}
