//! Authentication module
//!
//! Supplies bearer tokens to the page fetcher through the [`TokenProvider`]
//! trait. Providers: a static token, a token read from an environment
//! variable, and the Azure AD client-credentials flow.
//!
//! Providers are shared read-only across fetches and sessions; refreshing a
//! token is the provider's job, never the fetcher's.

mod client_secret;
mod token;

pub use client_secret::{ClientSecretCredential, DEFAULT_AUTHORITY, MANAGEMENT_SCOPE};
pub use token::{
    AccessToken, EnvTokenProvider, StaticTokenProvider, TokenProvider, DEFAULT_TOKEN_VAR,
};
