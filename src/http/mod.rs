//! HTTP module
//!
//! Sends query page requests and handles rate limiting.
//!
//! # Features
//!
//! - **Page fetcher**: one POST per page, bearer auth, full body capture
//! - **Rate limiting**: HTTP 429 is waited out using `Retry-After`
//! - **Cancellation**: every wait races a cancellation token and deadline
//! - **Dumps**: optional request/response dumps for troubleshooting

mod cancel;
mod dump;
mod fetcher;
mod retry;

pub use cancel::CancelScope;
pub use dump::{Diagnostics, DUMP_TARGET};
pub use fetcher::PageFetcher;
pub use retry::{
    retry_after, RecordingSleeper, RetryContext, Sleeper, TokioSleeper, DEFAULT_RETRY_AFTER,
};
