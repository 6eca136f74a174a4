//! Tests for the query module

use super::*;
use crate::error::Error;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_descriptor_builder() {
    let descriptor = QueryDescriptor::new("resources | project id")
        .subscription("sub-1")
        .subscription("sub-2")
        .management_group("mg-1")
        .allow_partial_scopes(true)
        .top(100)
        .skip(10);

    assert_eq!(descriptor.query, "resources | project id");
    assert_eq!(descriptor.subscriptions, vec!["sub-1", "sub-2"]);
    assert_eq!(descriptor.management_groups, vec!["mg-1"]);
    assert!(descriptor.allow_partial_scopes);
    assert_eq!(descriptor.top, 100);
    assert_eq!(descriptor.skip, 10);
}

#[test]
fn test_descriptor_replace_scopes() {
    let descriptor = QueryDescriptor::new("resources")
        .subscription("old")
        .subscriptions(["a", "b"])
        .management_groups(vec!["mg".to_string()]);

    assert_eq!(descriptor.subscriptions, vec!["a", "b"]);
    assert_eq!(descriptor.management_groups, vec!["mg"]);
}

#[test]
fn test_validate_rejects_blank_query() {
    for query in ["", "   ", "\n\t"] {
        let err = QueryDescriptor::new(query).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidQuery { .. }), "query {query:?}");
    }
}

#[test]
fn test_validate_rejects_blank_scope() {
    let err = QueryDescriptor::new("resources")
        .subscription(" ")
        .validate()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidQuery { .. }));
}

#[test]
fn test_validate_accepts_minimal_query() {
    assert!(QueryDescriptor::new("resources").validate().is_ok());
}

#[test]
fn test_first_page_body_omits_optional_fields() {
    let descriptor = QueryDescriptor::new("resources");
    let body = serde_json::to_value(descriptor.request_body(None)).unwrap();

    assert_eq!(
        body,
        json!({
            "query": "resources",
            "options": { "resultFormat": "objectArray" }
        })
    );
}

#[test]
fn test_body_includes_scopes_and_paging_hints() {
    let descriptor = QueryDescriptor::new("resources")
        .subscription("sub-1")
        .management_group("mg-1")
        .allow_partial_scopes(true)
        .top(5)
        .skip(2);
    let body = serde_json::to_value(descriptor.request_body(None)).unwrap();

    assert_eq!(
        body,
        json!({
            "query": "resources",
            "managementGroups": ["mg-1"],
            "subscriptions": ["sub-1"],
            "options": {
                "allowPartialScopes": true,
                "resultFormat": "objectArray",
                "$top": 5,
                "$skip": 2
            }
        })
    );
}

#[test]
fn test_body_includes_skip_token_only_when_non_empty() {
    let descriptor = QueryDescriptor::new("resources").top(5);

    let body = serde_json::to_value(descriptor.request_body(Some("tok-1"))).unwrap();
    assert_eq!(body["options"]["$skipToken"], "tok-1");
    assert_eq!(body["options"]["$top"], 5);

    let body = serde_json::to_value(descriptor.request_body(Some(""))).unwrap();
    assert!(body["options"].get("$skipToken").is_none());
}
