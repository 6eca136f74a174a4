//! Pager state

use std::fmt;

/// Where a pager stands in the page sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PagerState {
    /// No page fetched yet
    #[default]
    NotStarted,
    /// At least one page fetched; the next one is addressed by this token
    HasPage(String),
    /// The last page has been returned
    Exhausted,
}

impl PagerState {
    /// Whether another fetch would do network work
    pub fn has_next(&self) -> bool {
        !matches!(self, Self::Exhausted)
    }

    /// Token to send with the next fetch
    pub fn skip_token(&self) -> Option<&str> {
        match self {
            Self::HasPage(token) => Some(token),
            _ => None,
        }
    }

    /// State after a page carrying `next_token` was fetched
    pub fn advance(next_token: Option<&str>) -> Self {
        match next_token {
            Some(token) if !token.is_empty() => Self::HasPage(token.to_string()),
            _ => Self::Exhausted,
        }
    }
}

impl fmt::Display for PagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::HasPage(_) => write!(f, "has page"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}
