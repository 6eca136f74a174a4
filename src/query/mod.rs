//! Query descriptor module
//!
//! A [`QueryDescriptor`] describes one logical Resource Graph query: the query
//! text, its scopes and the paging hints. It is immutable once handed to a
//! pager and is turned into the wire body by [`QueryRequestBody`].

mod types;

pub use types::{QueryDescriptor, QueryRequestBody, QueryRequestOptions, RESULT_FORMAT};

#[cfg(test)]
mod tests;
