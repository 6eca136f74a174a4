//! Response page types

use crate::error::{Error, Result};
use bytes::Bytes;
use chrono::{NaiveTime, Timelike};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Header carrying the remaining request quota for the caller
pub const HEADER_QUOTA_REMAINING: &str = "x-ms-user-quota-remaining";
/// Header carrying the time until the quota window resets (`HH:MM:SS`)
pub const HEADER_QUOTA_RESETS_AFTER: &str = "x-ms-user-quota-resets-after";
/// Header set when the tenant subscription limit was hit
pub const HEADER_TENANT_LIMIT_HIT: &str = "x-ms-tenant-subscription-limit-hit";
/// Header carrying the server-side query duration
pub const HEADER_REQUEST_DURATION: &str = "x-ms-resource-graph-request-duration";

const DEFAULT_QUOTA_REMAINING: i64 = 15;
const DEFAULT_QUOTA_RESETS_AFTER: Duration = Duration::from_secs(5);

/// One fetched page of query results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponsePage {
    /// Number of records matching the whole query
    pub total_records: u64,
    /// Number of records in this page
    pub count: u64,
    /// Raw JSON array of this page's records
    pub data: Bytes,
    /// Whether the service truncated the result set
    pub truncated: bool,
    /// Continuation token for the next page, absent on the last page
    pub skip_token: Option<String>,
    /// Throttling headers returned with this page
    pub quota: QuotaInfo,
}

impl ResponsePage {
    /// Whether another page follows this one
    pub fn has_next(&self) -> bool {
        self.skip_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Continuation token, if any
    pub fn skip_token(&self) -> Option<&str> {
        self.skip_token.as_deref()
    }

    /// Raw `data` bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take ownership of the raw `data` bytes
    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// Deserialize the page's records into a caller-defined type
    pub fn deserialize_data<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        serde_json::from_slice(&self.data).map_err(|e| Error::unmarshal(e.to_string()))
    }
}

/// Throttling information reported by the service
///
/// See <https://learn.microsoft.com/azure/governance/resource-graph/concepts/guidance-for-throttled-requests>.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaInfo {
    pub user_quota_remaining: i64,
    pub user_quota_resets_after: Duration,
    pub tenant_subscription_limit_hit: bool,
    pub request_duration: Option<String>,
}

impl Default for QuotaInfo {
    fn default() -> Self {
        Self {
            user_quota_remaining: DEFAULT_QUOTA_REMAINING,
            user_quota_resets_after: DEFAULT_QUOTA_RESETS_AFTER,
            tenant_subscription_limit_hit: false,
            request_duration: None,
        }
    }
}

impl QuotaInfo {
    /// Read quota headers, falling back to defaults for missing or bad values
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        Self {
            user_quota_remaining: get(HEADER_QUOTA_REMAINING)
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_QUOTA_REMAINING),
            user_quota_resets_after: get(HEADER_QUOTA_RESETS_AFTER)
                .and_then(parse_clock_duration)
                .unwrap_or(DEFAULT_QUOTA_RESETS_AFTER),
            tenant_subscription_limit_hit: get(HEADER_TENANT_LIMIT_HIT)
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
            request_duration: get(HEADER_REQUEST_DURATION).map(str::to_string),
        }
    }
}

/// Parse an `HH:MM:SS` clock value into a duration
fn parse_clock_duration(value: &str) -> Option<Duration> {
    let time = NaiveTime::parse_from_str(value, "%H:%M:%S").ok()?;
    Some(Duration::from_secs(u64::from(time.num_seconds_from_midnight())))
}

#[cfg(test)]
mod type_tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_quota_defaults() {
        let quota = QuotaInfo::from_headers(&HeaderMap::new());
        assert_eq!(quota, QuotaInfo::default());
        assert_eq!(quota.user_quota_remaining, 15);
        assert_eq!(quota.user_quota_resets_after, Duration::from_secs(5));
    }

    #[test]
    fn test_quota_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_QUOTA_REMAINING, HeaderValue::from_static("3"));
        headers.insert(HEADER_QUOTA_RESETS_AFTER, HeaderValue::from_static("00:01:05"));
        headers.insert(HEADER_TENANT_LIMIT_HIT, HeaderValue::from_static("True"));
        headers.insert(
            HEADER_REQUEST_DURATION,
            HeaderValue::from_static("0:00:00:00.0138132"),
        );

        let quota = QuotaInfo::from_headers(&headers);
        assert_eq!(quota.user_quota_remaining, 3);
        assert_eq!(quota.user_quota_resets_after, Duration::from_secs(65));
        assert!(quota.tenant_subscription_limit_hit);
        assert_eq!(quota.request_duration.as_deref(), Some("0:00:00:00.0138132"));
    }

    #[test]
    fn test_quota_invalid_values_fall_back() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_QUOTA_REMAINING, HeaderValue::from_static("lots"));
        headers.insert(HEADER_QUOTA_RESETS_AFTER, HeaderValue::from_static("soon"));

        let quota = QuotaInfo::from_headers(&headers);
        assert_eq!(quota.user_quota_remaining, 15);
        assert_eq!(quota.user_quota_resets_after, Duration::from_secs(5));
    }

    #[test]
    fn test_page_has_next() {
        let mut page = ResponsePage::default();
        assert!(!page.has_next());

        page.skip_token = Some(String::new());
        assert!(!page.has_next());

        page.skip_token = Some("abc".to_string());
        assert!(page.has_next());
        assert_eq!(page.skip_token(), Some("abc"));
    }
}
