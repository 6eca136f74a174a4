//! Pager module
//!
//! # Overview
//!
//! A [`Pager`] drives the page fetcher across continuation tokens for one
//! query. It owns its own [`PagerState`]; several pagers may run against the
//! same client at once and share nothing but the read-only fetcher.

mod paging;
mod types;

pub use paging::Pager;
pub use types::PagerState;

#[cfg(test)]
mod tests;
