//! Pager implementation

use super::types::PagerState;
use crate::error::{Error, Result};
use crate::http::{CancelScope, PageFetcher};
use crate::query::QueryDescriptor;
use crate::response::ResponsePage;
use futures::stream::{self, Stream};
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Walks the pages of one query in order
///
/// A pager starts in [`PagerState::NotStarted`], moves through
/// [`PagerState::HasPage`] while the service keeps returning continuation
/// tokens, and ends in [`PagerState::Exhausted`]. A failed fetch leaves the
/// state untouched, so `next()` may be called again to retry the same page.
#[derive(Debug)]
pub struct Pager {
    fetcher: Arc<PageFetcher>,
    descriptor: QueryDescriptor,
    state: PagerState,
    scope: CancelScope,
    pages_fetched: u64,
    records_fetched: u64,
}

impl Pager {
    /// Create a pager over a validated descriptor
    pub fn new(fetcher: Arc<PageFetcher>, descriptor: QueryDescriptor) -> Result<Self> {
        descriptor.validate()?;
        Ok(Self {
            fetcher,
            descriptor,
            state: PagerState::NotStarted,
            scope: CancelScope::new(),
            pages_fetched: 0,
            records_fetched: 0,
        })
    }

    /// Stop fetching when this token is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        let deadline = self.scope.deadline_at();
        self.scope = CancelScope::with_token(token);
        if let Some(deadline) = deadline {
            self.scope = self.scope.deadline(deadline);
        }
        self
    }

    /// Stop fetching once this instant has passed
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.scope = self.scope.deadline(deadline);
        self
    }

    /// Replace the whole cancellation scope
    #[must_use]
    pub fn with_scope(mut self, scope: CancelScope) -> Self {
        self.scope = scope;
        self
    }

    /// The cancellation scope checked before each fetch
    pub fn scope(&self) -> &CancelScope {
        &self.scope
    }

    /// The descriptor being paged
    pub fn descriptor(&self) -> &QueryDescriptor {
        &self.descriptor
    }

    /// Current state
    pub fn state(&self) -> &PagerState {
        &self.state
    }

    /// Whether `next()` would fetch another page
    pub fn has_next(&self) -> bool {
        self.state.has_next()
    }

    /// Pages returned so far
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// Sum of the `count` of every page returned so far
    pub fn records_fetched(&self) -> u64 {
        self.records_fetched
    }

    /// Fetch the next page
    ///
    /// Returns [`Error::NoMorePages`] once the pager is exhausted, without
    /// touching the network.
    pub async fn next(&mut self) -> Result<ResponsePage> {
        if !self.state.has_next() {
            return Err(Error::NoMorePages);
        }
        self.scope.check()?;

        let page = self
            .fetcher
            .fetch(&self.descriptor, self.state.skip_token(), &self.scope)
            .await?;

        self.state = PagerState::advance(page.skip_token());
        self.pages_fetched += 1;
        self.records_fetched += page.count;
        debug!(
            page = self.pages_fetched,
            records = self.records_fetched,
            total_records = page.total_records,
            state = %self.state,
            "Pager advanced"
        );
        Ok(page)
    }

    /// Turn the pager into a stream of pages
    ///
    /// The stream ends after the last page, or right after yielding the
    /// first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<ResponsePage>> + Send {
        stream::unfold(Some(self), |pager| async move {
            let mut pager = pager?;
            if !pager.has_next() {
                return None;
            }
            match pager.next().await {
                Ok(page) => Some((Ok(page), Some(pager))),
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}
