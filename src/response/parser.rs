//! Selective response body parser
//!
//! The body is scanned once. Only the five top-level keys below are captured,
//! each as a borrowed [`RawValue`]; every other key is skipped and `data` is
//! sliced out of the original buffer without being decoded.
//!
//! ```text
//! {
//!   "totalRecords": 3456,
//!   "count": 1,
//!   "data": [{"foo": "bar"}],
//!   "facets": [],
//!   "resultTruncated": "false",
//!   "$skipToken": "some value"
//! }
//! ```

use super::types::ResponsePage;
use crate::error::{Error, Result};
use bytes::Bytes;
use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;
use tracing::trace;

/// UTF-8 byte order mark some gateways prepend to the body
pub const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

const FIELD_BODY: &str = "body";
const FIELD_TOTAL_RECORDS: &str = "totalRecords";
const FIELD_COUNT: &str = "count";
const FIELD_DATA: &str = "data";
const FIELD_RESULT_TRUNCATED: &str = "resultTruncated";
const FIELD_SKIP_TOKEN: &str = "$skipToken";

/// Which error to report when several fields are bad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldErrorPolicy {
    /// Stop at the first bad field, in key order
    #[default]
    FirstError,
    /// Check every field and report the last bad one
    LastError,
}

/// The five captured keys; a literal `null` is kept as a present value
#[derive(Deserialize)]
struct Envelope<'a> {
    #[serde(rename = "totalRecords", borrow, default, deserialize_with = "present")]
    total_records: Option<&'a RawValue>,
    #[serde(borrow, default, deserialize_with = "present")]
    count: Option<&'a RawValue>,
    #[serde(borrow, default, deserialize_with = "present")]
    data: Option<&'a RawValue>,
    #[serde(rename = "resultTruncated", borrow, default, deserialize_with = "present")]
    result_truncated: Option<&'a RawValue>,
    #[serde(rename = "$skipToken", borrow, default, deserialize_with = "present")]
    skip_token: Option<&'a RawValue>,
}

/// Capture a key's raw value, `null` included; absent keys fall back to `None`
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<&'de RawValue>, D::Error>
where
    D: Deserializer<'de>,
{
    <&'de RawValue>::deserialize(deserializer).map(Some)
}

/// Parser for query response bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser {
    policy: FieldErrorPolicy,
}

impl ResponseParser {
    /// Create a parser with the default (first error) policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with the given error policy
    pub fn with_policy(policy: FieldErrorPolicy) -> Self {
        Self { policy }
    }

    /// The error policy in use
    pub fn policy(&self) -> FieldErrorPolicy {
        self.policy
    }

    /// Parse a response body into a page
    ///
    /// Quota information is left at its defaults; the fetcher fills it in
    /// from the response headers.
    pub fn parse(&self, body: Bytes) -> Result<ResponsePage> {
        let body = strip_bom(body);
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(Error::parse(FIELD_BODY, "response body is empty"));
        }

        let envelope: Envelope<'_> =
            serde_json::from_slice(&body).map_err(|e| Error::parse(FIELD_BODY, e.to_string()))?;

        let mut last_error = None;

        let total_records = self.check(
            &mut last_error,
            parse_count(FIELD_TOTAL_RECORDS, envelope.total_records),
        )?;
        let count = self.check(&mut last_error, parse_count(FIELD_COUNT, envelope.count))?;
        let data = self.check(&mut last_error, parse_data(envelope.data))?;
        let truncated = self.check(
            &mut last_error,
            parse_truncated(envelope.result_truncated),
        )?;
        let skip_token = self.check(&mut last_error, parse_skip_token(envelope.skip_token))?;

        if let Some(err) = last_error {
            return Err(err);
        }

        let data = data.map(|raw| body.slice_ref(raw.as_bytes())).unwrap_or_default();
        trace!(
            total_records = ?total_records,
            count = ?count,
            data_len = data.len(),
            "Parsed response page"
        );

        Ok(ResponsePage {
            total_records: total_records.unwrap_or_default(),
            count: count.unwrap_or_default(),
            data,
            truncated: truncated.unwrap_or_default(),
            skip_token: skip_token.flatten(),
            ..Default::default()
        })
    }

    /// Apply the error policy to one field result
    fn check<T>(&self, last_error: &mut Option<Error>, result: Result<T>) -> Result<Option<T>> {
        match (result, self.policy) {
            (Ok(value), _) => Ok(Some(value)),
            (Err(err), FieldErrorPolicy::FirstError) => Err(err),
            (Err(err), FieldErrorPolicy::LastError) => {
                *last_error = Some(err);
                Ok(None)
            }
        }
    }
}

fn strip_bom(body: Bytes) -> Bytes {
    if body.starts_with(UTF8_BOM) {
        body.slice(UTF8_BOM.len()..)
    } else {
        body
    }
}

/// JSON type name of a raw value, from its first byte
fn kind(raw: &RawValue) -> &'static str {
    match raw.get().trim_start().as_bytes().first() {
        Some(b'{') => "object",
        Some(b'[') => "array",
        Some(b'"') => "string",
        Some(b't' | b'f') => "boolean",
        Some(b'n') => "null",
        _ => "number",
    }
}

fn required<'a>(field: &str, raw: Option<&'a RawValue>) -> Result<&'a RawValue> {
    raw.ok_or_else(|| Error::parse(field, "field is missing"))
}

fn parse_count(field: &str, raw: Option<&RawValue>) -> Result<u64> {
    let raw = required(field, raw)?;
    match kind(raw) {
        "number" => raw.get().trim().parse::<u64>().map_err(|_| {
            Error::malformed(
                field,
                format!("expected a non-negative integer, value is {}", raw.get()),
            )
        }),
        other => Err(Error::malformed(
            field,
            format!("expected a number, found {other}"),
        )),
    }
}

fn parse_data(raw: Option<&RawValue>) -> Result<&str> {
    let raw = required(FIELD_DATA, raw)?;
    match kind(raw) {
        "array" => Ok(raw.get()),
        other => Err(Error::malformed(
            FIELD_DATA,
            format!("expected an array, found {other}"),
        )),
    }
}

fn parse_truncated(raw: Option<&RawValue>) -> Result<bool> {
    let raw = required(FIELD_RESULT_TRUNCATED, raw)?;
    match kind(raw) {
        "string" => {
            let value: String = serde_json::from_str(raw.get())
                .map_err(|e| Error::malformed(FIELD_RESULT_TRUNCATED, e.to_string()))?;
            Ok(value.eq_ignore_ascii_case("true"))
        }
        "boolean" => Ok(raw.get().trim() == "true"),
        other => Err(Error::malformed(
            FIELD_RESULT_TRUNCATED,
            format!("expected a string, found {other}"),
        )),
    }
}

fn parse_skip_token(raw: Option<&RawValue>) -> Result<Option<String>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match kind(raw) {
        "string" => {
            let token: String = serde_json::from_str(raw.get())
                .map_err(|e| Error::malformed(FIELD_SKIP_TOKEN, e.to_string()))?;
            Ok(Some(token).filter(|t| !t.is_empty()))
        }
        "null" => Ok(None),
        other => Err(Error::malformed(
            FIELD_SKIP_TOKEN,
            format!("expected a string, found {other}"),
        )),
    }
}
