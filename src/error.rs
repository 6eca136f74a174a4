//! Error types for the Resource Graph client
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! HTTP 429 never appears here: rate limiting is resolved inside the page
//! fetcher by waiting and retrying.

use thiserror::Error;

/// The main error type for the Resource Graph client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Not authorized (HTTP {status}): {body}")]
    Unauthorized { status: u16, body: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Response Errors
    // ============================================================================
    #[error("Malformed response field '{field}': {message}")]
    MalformedField { field: String, message: String },

    #[error("Failed to parse response ({field}): {message}")]
    ResponseParse { field: String, message: String },

    #[error("Failed to unmarshal page data: {message}")]
    Unmarshal { message: String },

    // ============================================================================
    // Paging Errors
    // ============================================================================
    #[error("Query pager: no more pages")]
    NoMorePages,

    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a malformed field error
    pub fn malformed(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a response parse error
    pub fn parse(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResponseParse {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an unmarshal error
    pub fn unmarshal(message: impl Into<String>) -> Self {
        Self::Unmarshal {
            message: message.into(),
        }
    }

    /// Name of the response field this error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::MalformedField { field, .. } | Error::ResponseParse { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } | Error::Unauthorized { status, .. } => Some(*status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if the credential is missing, stale or insufficient
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Error::Auth { .. } | Error::Unauthorized { .. })
    }

    /// Check if the operation was aborted by its cancellation scope
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}

/// Result type alias for the Resource Graph client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyhow_is_transparent() {
        let err: Error = anyhow::anyhow!("custom provider failed").into();
        assert_eq!(err.to_string(), "custom provider failed");
    }

    #[test]
    fn test_error_display() {
        let err = Error::auth("no token");
        assert_eq!(err.to_string(), "Authentication failed: no token");

        let err = Error::http_status(500, r#"{"error":"boom"}"#);
        assert_eq!(err.to_string(), r#"HTTP 500: {"error":"boom"}"#);

        let err = Error::malformed("count", "not a number");
        assert_eq!(
            err.to_string(),
            "Malformed response field 'count': not a number"
        );

        assert_eq!(Error::NoMorePages.to_string(), "Query pager: no more pages");
    }

    #[test]
    fn test_error_field() {
        assert_eq!(Error::malformed("count", "x").field(), Some("count"));
        assert_eq!(Error::parse("data", "missing").field(), Some("data"));
        assert_eq!(Error::NoMorePages.field(), None);
    }

    #[test]
    fn test_error_status() {
        assert_eq!(Error::http_status(500, "").status(), Some(500));
        assert_eq!(
            Error::Unauthorized {
                status: 401,
                body: String::new()
            }
            .status(),
            Some(401)
        );
        assert_eq!(Error::Cancelled.status(), None);
    }

    #[test]
    fn test_auth_failure_classification() {
        assert!(Error::auth("expired").is_auth_failure());
        assert!(Error::Unauthorized {
            status: 403,
            body: String::new()
        }
        .is_auth_failure());
        assert!(!Error::http_status(500, "").is_auth_failure());
    }

    #[test]
    fn test_cancellation_classification() {
        assert!(Error::Cancelled.is_cancellation());
        assert!(Error::DeadlineExceeded.is_cancellation());
        assert!(!Error::NoMorePages.is_cancellation());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
