//! Tests for the pager module

use super::*;
use crate::auth::StaticTokenProvider;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::http::{PageFetcher, RecordingSleeper};
use crate::query::QueryDescriptor;
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches requests by the `$skipToken` in their body
struct SkipTokenIs(Option<&'static str>);

impl Match for SkipTokenIs {
    fn matches(&self, request: &Request) -> bool {
        let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
            return false;
        };
        body["options"].get("$skipToken").and_then(Value::as_str) == self.0
    }
}

fn page(n: u64, next: Option<&str>) -> ResponseTemplate {
    let mut body = json!({
        "totalRecords": 10,
        "count": 1,
        "data": [{"page": n}],
        "resultTruncated": "false"
    });
    if let Some(token) = next {
        body["$skipToken"] = json!(token);
    }
    ResponseTemplate::new(200).set_body_json(body)
}

async fn mount_chain(server: &MockServer, tokens: &[&'static str]) {
    let mut previous = None;
    for (i, token) in tokens.iter().enumerate() {
        Mock::given(method("POST"))
            .and(SkipTokenIs(previous))
            .respond_with(page(i as u64, Some(token)))
            .expect(1)
            .mount(server)
            .await;
        previous = Some(*token);
    }
    Mock::given(method("POST"))
        .and(SkipTokenIs(previous))
        .respond_with(page(tokens.len() as u64, None))
        .expect(1)
        .mount(server)
        .await;
}

fn fetcher(server: &MockServer) -> Arc<PageFetcher> {
    let config = ClientConfig::builder().endpoint(server.uri()).build();
    Arc::new(
        PageFetcher::new(&config, Arc::new(StaticTokenProvider::new("test-token")))
            .unwrap()
            .with_sleeper(Arc::new(RecordingSleeper::new())),
    )
}

// ============================================================================
// PagerState Tests
// ============================================================================

#[test]
fn test_state_default() {
    let state = PagerState::default();
    assert_eq!(state, PagerState::NotStarted);
    assert!(state.has_next());
    assert!(state.skip_token().is_none());
}

#[test]
fn test_state_advance() {
    assert_eq!(
        PagerState::advance(Some("abc")),
        PagerState::HasPage("abc".to_string())
    );
    assert_eq!(PagerState::advance(Some("")), PagerState::Exhausted);
    assert_eq!(PagerState::advance(None), PagerState::Exhausted);
    assert!(!PagerState::Exhausted.has_next());
    assert_eq!(PagerState::HasPage("t".into()).skip_token(), Some("t"));
}

// ============================================================================
// Pager Tests
// ============================================================================

#[test]
fn test_pager_rejects_invalid_descriptor() {
    let config = ClientConfig::default();
    let fetcher = Arc::new(
        PageFetcher::new(&config, Arc::new(StaticTokenProvider::new("t"))).unwrap(),
    );
    let err = Pager::new(fetcher, QueryDescriptor::new("")).unwrap_err();
    assert!(matches!(err, Error::InvalidQuery { .. }));
}

#[tokio::test]
async fn test_pager_single_page() {
    let mock_server = MockServer::start().await;
    mount_chain(&mock_server, &[]).await;

    let mut pager = Pager::new(fetcher(&mock_server), QueryDescriptor::new("resources")).unwrap();
    assert!(pager.has_next());
    assert_eq!(pager.state(), &PagerState::NotStarted);

    let page = pager.next().await.unwrap();
    assert_eq!(page.data(), br#"[{"page":0}]"#);
    assert!(!pager.has_next());
    assert_eq!(pager.state(), &PagerState::Exhausted);
    assert_eq!(pager.pages_fetched(), 1);
}

#[tokio::test]
async fn test_pager_follows_tokens_then_stops() {
    let mock_server = MockServer::start().await;
    mount_chain(&mock_server, &["t1", "t2", "t3"]).await;

    let mut pager = Pager::new(fetcher(&mock_server), QueryDescriptor::new("resources")).unwrap();

    for n in 0..4u64 {
        assert!(pager.has_next());
        let page = pager.next().await.unwrap();
        assert_eq!(page.data(), format!(r#"[{{"page":{n}}}]"#).as_bytes());
    }

    assert!(!pager.has_next());
    assert_eq!(pager.pages_fetched(), 4);
    assert_eq!(pager.records_fetched(), 4);

    // Exhausted pagers answer without network traffic; the mocks expect one call each
    let err = pager.next().await.unwrap_err();
    assert!(matches!(err, Error::NoMorePages));
    assert!(matches!(pager.next().await, Err(Error::NoMorePages)));
}

#[tokio::test]
async fn test_pager_failure_keeps_state() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(SkipTokenIs(None))
        .respond_with(page(0, Some("t1")))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(SkipTokenIs(Some("t1")))
        .respond_with(ResponseTemplate::new(500).set_body_string("transient"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(SkipTokenIs(Some("t1")))
        .respond_with(page(1, None))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut pager = Pager::new(fetcher(&mock_server), QueryDescriptor::new("resources")).unwrap();
    pager.next().await.unwrap();

    let err = pager.next().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(pager.has_next());
    assert_eq!(pager.state(), &PagerState::HasPage("t1".to_string()));
    assert_eq!(pager.pages_fetched(), 1);

    // Retrying the same page resumes from the same token
    let page = pager.next().await.unwrap();
    assert_eq!(page.data(), br#"[{"page":1}]"#);
    assert!(!pager.has_next());
}

#[tokio::test]
async fn test_pager_cancelled_before_fetch() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(page(0, None))
        .expect(0)
        .mount(&mock_server)
        .await;

    let token = tokio_util::sync::CancellationToken::new();
    let mut pager = Pager::new(fetcher(&mock_server), QueryDescriptor::new("resources"))
        .unwrap()
        .with_cancellation(token.clone());
    token.cancel();

    assert!(matches!(pager.next().await, Err(Error::Cancelled)));
    assert_eq!(pager.state(), &PagerState::NotStarted);
}

#[tokio::test]
async fn test_pager_deadline_passed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(page(0, None))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut pager = Pager::new(fetcher(&mock_server), QueryDescriptor::new("resources"))
        .unwrap()
        .with_deadline(tokio::time::Instant::now() - Duration::from_millis(1));

    assert!(matches!(pager.next().await, Err(Error::DeadlineExceeded)));
}

#[test]
fn test_pager_cancellation_keeps_deadline() {
    let config = ClientConfig::default();
    let fetcher = Arc::new(
        PageFetcher::new(&config, Arc::new(StaticTokenProvider::new("t"))).unwrap(),
    );
    let deadline = tokio::time::Instant::now() + Duration::from_secs(60);
    let pager = Pager::new(fetcher, QueryDescriptor::new("resources"))
        .unwrap()
        .with_deadline(deadline)
        .with_cancellation(tokio_util::sync::CancellationToken::new());

    assert_eq!(pager.scope().deadline_at(), Some(deadline));
}

// ============================================================================
// Stream Tests
// ============================================================================

#[tokio::test]
async fn test_stream_yields_every_page() {
    let mock_server = MockServer::start().await;
    mount_chain(&mock_server, &["a", "b"]).await;

    let pager = Pager::new(fetcher(&mock_server), QueryDescriptor::new("resources")).unwrap();
    let pages: Vec<_> = pager.into_stream().collect().await;

    assert_eq!(pages.len(), 3);
    assert!(pages.iter().all(Result::is_ok));
}

#[tokio::test]
async fn test_stream_ends_after_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(SkipTokenIs(None))
        .respond_with(page(0, Some("next")))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(SkipTokenIs(Some("next")))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pager = Pager::new(fetcher(&mock_server), QueryDescriptor::new("resources")).unwrap();
    let pages: Vec<_> = pager.into_stream().collect().await;

    assert_eq!(pages.len(), 2);
    assert!(pages[0].is_ok());
    assert!(matches!(pages[1], Err(Error::HttpStatus { status: 400, .. })));
}
