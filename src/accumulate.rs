//! Page accumulation
//!
//! Drives a [`Pager`] to exhaustion and gathers what it returns, either as
//! raw `data` arrays or as caller-typed records.

use crate::client::QueryClient;
use crate::error::{Error, Result};
use crate::pager::Pager;
use crate::query::QueryDescriptor;
use bytes::{BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::debug;

/// Records gathered before a failure, together with that failure
pub struct Partial<T> {
    /// Every record from the pages that succeeded
    pub records: Vec<T>,
    /// The error that stopped accumulation
    pub error: Error,
}

impl<T> Partial<T> {
    /// Split into records and error
    pub fn into_parts(self) -> (Vec<T>, Error) {
        (self.records, self.error)
    }
}

impl<T> fmt::Debug for Partial<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partial")
            .field("records", &self.records.len())
            .field("error", &self.error)
            .finish()
    }
}

impl<T> fmt::Display for Partial<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (after {} records)", self.error, self.records.len())
    }
}

impl<T> std::error::Error for Partial<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<Partial<T>> for Error {
    fn from(partial: Partial<T>) -> Self {
        partial.error
    }
}

/// Fetch every page of a query and return the raw `data` arrays
///
/// Stops at the first error; pages fetched before it are dropped.
pub async fn collect_all(client: &QueryClient, descriptor: &QueryDescriptor) -> Result<Vec<Bytes>> {
    collect_pages(client.pager(descriptor)?).await
}

/// Drain an existing pager into raw `data` arrays
pub async fn collect_pages(mut pager: Pager) -> Result<Vec<Bytes>> {
    let mut pages = Vec::new();
    while pager.has_next() {
        pages.push(pager.next().await?.into_data());
    }
    debug!(pages = pages.len(), "Collected all pages");
    Ok(pages)
}

/// Fetch every page of a query and deserialize the records into `T`
///
/// On failure the records gathered so far are returned with the error.
pub async fn collect_records<T: DeserializeOwned>(
    client: &QueryClient,
    descriptor: &QueryDescriptor,
) -> std::result::Result<Vec<T>, Partial<T>> {
    match client.pager(descriptor) {
        Ok(pager) => collect_pager_records(pager).await,
        Err(error) => Err(Partial {
            records: Vec::new(),
            error,
        }),
    }
}

/// Drain an existing pager, deserializing each page's records into `T`
pub async fn collect_pager_records<T: DeserializeOwned>(
    mut pager: Pager,
) -> std::result::Result<Vec<T>, Partial<T>> {
    let mut records = Vec::new();
    while pager.has_next() {
        let page = match pager.next().await {
            Ok(page) => page,
            Err(error) => return Err(Partial { records, error }),
        };
        match page.deserialize_data::<T>() {
            Ok(batch) => records.extend(batch),
            Err(error) => return Err(Partial { records, error }),
        }
    }
    debug!(
        pages = pager.pages_fetched(),
        records = records.len(),
        "Collected all records"
    );
    Ok(records)
}

/// Join page arrays into one JSON array without parsing the elements
///
/// Each input must be a JSON array, as returned in
/// [`ResponsePage::data`](crate::response::ResponsePage::data).
pub fn merge_pages(pages: &[Bytes]) -> Bytes {
    let mut out = BytesMut::with_capacity(pages.iter().map(Bytes::len).sum::<usize>() + 2);
    out.put_u8(b'[');

    let mut first = true;
    for page in pages {
        let inner = array_contents(page);
        if inner.is_empty() {
            continue;
        }
        if !first {
            out.put_u8(b',');
        }
        out.put_slice(inner);
        first = false;
    }

    out.put_u8(b']');
    out.freeze()
}

/// The bytes between the outer brackets of a JSON array, trimmed
fn array_contents(array: &[u8]) -> &[u8] {
    let trimmed = trim_whitespace(array);
    let inner = trimmed
        .strip_prefix(b"[")
        .and_then(|rest| rest.strip_suffix(b"]"))
        .unwrap_or(trimmed);
    trim_whitespace(inner)
}

fn trim_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(&[], "[]" ; "no pages")]
    #[test_case(&["[]"], "[]" ; "one empty page")]
    #[test_case(&["[1,2]"], "[1,2]" ; "one page")]
    #[test_case(&["[1,2]", "[3]"], "[1,2,3]" ; "two pages")]
    #[test_case(&["[1]", "[]", " [ 2 ] "], "[1,2]" ; "empty and padded pages")]
    #[test_case(&[r#"[{"a":"]"}]"#, r#"[{"b":[1]}]"#], r#"[{"a":"]"},{"b":[1]}]"# ; "nested brackets")]
    fn test_merge_pages(pages: &[&str], expected: &str) {
        let pages: Vec<Bytes> = pages
            .iter()
            .map(|p| Bytes::copy_from_slice(p.as_bytes()))
            .collect();
        assert_eq!(
            std::str::from_utf8(&merge_pages(&pages)).unwrap(),
            expected
        );
    }

    #[test]
    fn test_merged_pages_are_valid_json() {
        let pages = vec![
            Bytes::from_static(br#"[{"id":"a"},{"id":"b"}]"#),
            Bytes::from_static(br#"[{"id":"c"}]"#),
        ];
        let merged: serde_json::Value = serde_json::from_slice(&merge_pages(&pages)).unwrap();
        assert_eq!(merged.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_partial_into_error() {
        let partial = Partial {
            records: vec![1, 2],
            error: Error::NoMorePages,
        };
        assert_eq!(partial.to_string(), "Query pager: no more pages (after 2 records)");

        let error: Error = partial.into();
        assert!(matches!(error, Error::NoMorePages));
    }
}
