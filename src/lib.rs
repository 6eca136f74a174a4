// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Resource Graph Client
//!
//! A paginated client for the Azure Resource Graph query API.
//!
//! ## Features
//!
//! - **Paging**: Follows `$skipToken` continuation tokens page by page
//! - **Throttling**: Waits out HTTP 429 using `Retry-After`, with no attempt cap
//! - **Raw Pages**: Each page's `data` array is kept as raw bytes, sliced out of the response
//! - **Typed Records**: Deserialize every page into your own record type
//! - **Cancellation**: Cancellation tokens and deadlines stop paging between and during requests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use resource_graph_client::{QueryClient, QueryDescriptor, Result};
//! use resource_graph_client::auth::EnvTokenProvider;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = QueryClient::builder()
//!         .token_provider(Arc::new(EnvTokenProvider::new()))
//!         .build()?;
//!
//!     let query = QueryDescriptor::new("resources | project id, type")
//!         .subscription("00000000-0000-0000-0000-000000000000");
//!
//!     let mut pager = client.pager(&query)?;
//!     while pager.has_next() {
//!         let page = pager.next().await?;
//!         println!("{} of {} records", page.count, page.total_records);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          QueryClient                            │
//! │  pager(q) → Pager   collect_all(q) → Vec<Bytes>                 │
//! │  collect_records::<T>(q) → Vec<T> | Partial<T>                  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────────────┴─────┬───────────────┬───────────┐
//! │   Auth   │       PageFetcher       │    Parser     │   Pager   │
//! ├──────────┼─────────────────────────┼───────────────┼───────────┤
//! │ Static   │ POST + bearer token     │ BOM strip     │ NotStarted│
//! │ Env      │ 429 → Retry-After wait  │ 5 fields      │ HasPage   │
//! │ Client   │ Cancel / deadline       │ raw `data`    │ Exhausted │
//! │ secret   │ Request dumps           │ field errors  │ Stream    │
//! └──────────┴─────────────────────────┴───────────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Credential providers
pub mod auth;

/// Page fetcher with rate-limit handling and cancellation
pub mod http;

/// Query descriptors and request bodies
pub mod query;

/// Response page parsing
pub mod response;

/// Pager state machine
pub mod pager;

/// Accumulating pages and records
pub mod accumulate;

/// Client configuration and config files
pub mod config;

/// Query session client
pub mod client;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

// Re-export commonly used types
pub use accumulate::{merge_pages, Partial};
pub use client::{QueryClient, QueryClientBuilder};
pub use config::ClientConfig;
pub use http::CancelScope;
pub use pager::{Pager, PagerState};
pub use query::QueryDescriptor;
pub use response::{QuotaInfo, ResponsePage};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
