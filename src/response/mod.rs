//! Response parsing module
//!
//! Turns a query response body into a [`ResponsePage`] by extracting the five
//! top-level fields the pager needs. The `data` array is passed through as raw
//! bytes and never decoded into a JSON tree here; callers decide what record
//! shape to deserialize it into.
//!
//! Throttling headers returned with each page are exposed as [`QuotaInfo`].

mod parser;
mod types;

pub use parser::{FieldErrorPolicy, ResponseParser, UTF8_BOM};
pub use types::{QuotaInfo, ResponsePage};
