//! Query descriptor and request body types

use crate::error::{Error, Result};
use serde::Serialize;

/// Result format requested from the service; rows come back as JSON objects
pub const RESULT_FORMAT: &str = "objectArray";

/// One logical Resource Graph query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDescriptor {
    /// Kusto query text
    pub query: String,
    /// Management groups to evaluate the query against
    pub management_groups: Vec<String>,
    /// Subscriptions to evaluate the query against
    pub subscriptions: Vec<String>,
    /// Allow the query to run on a subset of scopes when the full set
    /// exceeds the service limit
    pub allow_partial_scopes: bool,
    /// Requested page size (0 = service default)
    pub top: u32,
    /// Rows to skip from the start of the result set (0 = none)
    pub skip: u32,
}

impl QueryDescriptor {
    /// Create a descriptor for the given query text
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Add a subscription scope
    #[must_use]
    pub fn subscription(mut self, id: impl Into<String>) -> Self {
        self.subscriptions.push(id.into());
        self
    }

    /// Replace the subscription scopes
    #[must_use]
    pub fn subscriptions<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subscriptions = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Add a management group scope
    #[must_use]
    pub fn management_group(mut self, id: impl Into<String>) -> Self {
        self.management_groups.push(id.into());
        self
    }

    /// Replace the management group scopes
    #[must_use]
    pub fn management_groups<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.management_groups = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Allow partial scopes
    #[must_use]
    pub fn allow_partial_scopes(mut self, allow: bool) -> Self {
        self.allow_partial_scopes = allow;
        self
    }

    /// Set the requested page size
    #[must_use]
    pub fn top(mut self, top: u32) -> Self {
        self.top = top;
        self
    }

    /// Set the number of rows to skip
    #[must_use]
    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }

    /// Check the descriptor can be sent
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::invalid_query("query text must not be empty"));
        }
        if let Some(blank) = self
            .subscriptions
            .iter()
            .chain(&self.management_groups)
            .find(|s| s.trim().is_empty())
        {
            return Err(Error::invalid_query(format!(
                "scope identifiers must not be blank (got {blank:?})"
            )));
        }
        Ok(())
    }

    /// Build the wire body for one page request
    ///
    /// `skip_token` is only embedded when non-empty. When present the service
    /// lets it override `$top`/`$skip` for that call.
    pub fn request_body<'a>(&'a self, skip_token: Option<&'a str>) -> QueryRequestBody<'a> {
        QueryRequestBody {
            query: &self.query,
            management_groups: &self.management_groups,
            subscriptions: &self.subscriptions,
            options: QueryRequestOptions {
                allow_partial_scopes: self.allow_partial_scopes,
                result_format: RESULT_FORMAT,
                top: (self.top > 0).then_some(self.top),
                skip: (self.skip > 0).then_some(self.skip),
                skip_token: skip_token.filter(|t| !t.is_empty()),
            },
        }
    }
}

/// Serialized request body of a Resource Graph query
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequestBody<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    pub management_groups: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    pub subscriptions: &'a [String],
    pub options: QueryRequestOptions<'a>,
}

/// The `options` object of a query request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequestOptions<'a> {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub allow_partial_scopes: bool,
    pub result_format: &'static str,
    #[serde(rename = "$top", skip_serializing_if = "Option::is_none")]
    pub top: Option<u32>,
    #[serde(rename = "$skip", skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(rename = "$skipToken", skip_serializing_if = "Option::is_none")]
    pub skip_token: Option<&'a str>,
}

fn is_empty(scopes: &&[String]) -> bool {
    scopes.is_empty()
}
