//! Request/response dumps for troubleshooting
//!
//! Dumps go to the `resource_graph_client::dump` tracing target, so they can
//! be enabled with `RUST_LOG=resource_graph_client::dump=info` in addition to
//! the flags below. The bearer token is never written out.

use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{Request, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::info;

/// Tracing target used for dumps
pub const DUMP_TARGET: &str = "resource_graph_client::dump";

/// Which parts of the exchange to dump
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Diagnostics {
    /// Dump outgoing requests (headers and body)
    pub dump_requests: bool,
    /// Dump response status and headers
    pub dump_responses: bool,
    /// Also dump response bodies
    pub dump_response_bodies: bool,
}

impl Diagnostics {
    /// Dump everything
    pub fn all() -> Self {
        Self {
            dump_requests: true,
            dump_responses: true,
            dump_response_bodies: true,
        }
    }

    pub(crate) fn request(&self, request: &Request) {
        if !self.dump_requests {
            return;
        }
        let mut out = format!("{} {}\n", request.method(), request.url());
        write_headers(&mut out, request.headers());
        if let Some(body) = request.body().and_then(|b| b.as_bytes()) {
            out.push('\n');
            out.push_str(&String::from_utf8_lossy(body));
        }
        info!(target: DUMP_TARGET, "request:\n{out}");
    }

    pub(crate) fn response(&self, status: StatusCode, headers: &HeaderMap) {
        if !self.dump_responses {
            return;
        }
        let mut out = format!("{status}\n");
        write_headers(&mut out, headers);
        info!(target: DUMP_TARGET, "response:\n{out}");
    }

    pub(crate) fn response_body(&self, body: &[u8]) {
        if !(self.dump_responses && self.dump_response_bodies) {
            return;
        }
        info!(
            target: DUMP_TARGET,
            "response body:\n{}",
            String::from_utf8_lossy(body)
        );
    }
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let value = if name == AUTHORIZATION {
            "Bearer <redacted>"
        } else {
            value.to_str().unwrap_or("<binary>")
        };
        let _ = writeln!(out, "{name}: {value}");
    }
}
