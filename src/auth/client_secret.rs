//! Azure AD client-credentials provider
//!
//! Exchanges a service principal's client id and secret for an ARM access
//! token, caching it until shortly before expiry.

use super::token::{AccessToken, TokenProvider};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use tokio::sync::RwLock;
use tracing::debug;

/// Azure AD authority for the public cloud
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Scope granting access to Azure Resource Manager
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

/// Token provider using the OAuth2 client credentials flow
pub struct ClientSecretCredential {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    authority: String,
    scope: String,
    http_client: Client,
    cached_token: RwLock<Option<AccessToken>>,
}

impl ClientSecretCredential {
    /// Create a credential for the given service principal
    ///
    /// Fails immediately if any of the identifiers is blank.
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        let tenant_id = tenant_id.into();
        let client_id = client_id.into();
        let client_secret = client_secret.into();

        for (name, value) in [
            ("tenant_id", &tenant_id),
            ("client_id", &client_id),
            ("client_secret", &client_secret),
        ] {
            if value.trim().is_empty() {
                return Err(Error::auth(format!("{name} must not be empty")));
            }
        }

        Ok(Self {
            tenant_id,
            client_id,
            client_secret,
            authority: DEFAULT_AUTHORITY.to_string(),
            scope: MANAGEMENT_SCOPE.to_string(),
            http_client: Client::new(),
            cached_token: RwLock::new(None),
        })
    }

    /// Use a different authority host (sovereign clouds, tests)
    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    /// Request a different scope
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Use a custom HTTP client for token requests
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Token endpoint for this tenant
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority.trim_end_matches('/'),
            self.tenant_id
        )
    }

    async fn fetch_token(&self) -> Result<AccessToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];

        let response = self
            .http_client
            .post(self.token_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::auth(format!("Token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::auth(format!(
                "Token request failed with status {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::auth(format!("Invalid token response: {e}")))?;
        debug!(expires_in = ?token.expires_in, "Acquired access token");
        Ok(token.into_access_token())
    }
}

#[async_trait]
impl TokenProvider for ClientSecretCredential {
    async fn get_token(&self) -> Result<AccessToken> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        // Another task may have refreshed while we waited for the write lock
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.clone());
            }
        }

        let token = self.fetch_token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}

impl fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("authority", &self.authority)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_access_token(self) -> AccessToken {
        match self.expires_in {
            Some(seconds) => AccessToken::expires_in(self.access_token, seconds),
            None => AccessToken::new(self.access_token),
        }
    }
}
