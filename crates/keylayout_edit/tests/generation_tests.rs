use std::time::{Duration, Instant};

use keylayout_edit::{EditorOptions, GenerationCoordinator, GenerationResponse, Layout, LayoutError};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_request_waits_for_debounce() {
    let mut coordinator = GenerationCoordinator::new(Duration::from_millis(300));
    let start = Instant::now();
    let version = coordinator.submit("{}", false, start);

    assert_eq!(version, 1);
    assert!(coordinator.take_ready(start + Duration::from_millis(100)).is_none());
    assert_eq!(coordinator.remaining(start + Duration::from_millis(100)), Some(Duration::from_millis(200)));

    let request = coordinator.take_ready(start + Duration::from_millis(300)).unwrap();
    assert_eq!(request.version, 1);
    assert_eq!(request.document, "{}");
    assert!(!coordinator.has_pending());
}

#[test]
fn test_later_submit_supersedes_pending() {
    let mut coordinator = GenerationCoordinator::new(Duration::from_millis(300));
    let start = Instant::now();
    coordinator.submit("first", false, start);
    coordinator.submit("second", true, start + Duration::from_millis(200));

    assert!(coordinator.take_ready(start + Duration::from_millis(400)).is_none());
    let request = coordinator.take_ready(start + Duration::from_millis(500)).unwrap();
    assert_eq!(request.version, 2);
    assert_eq!(request.document, "second");
    assert!(request.debug);
}

#[test]
fn test_stale_response_is_discarded() {
    let mut coordinator = GenerationCoordinator::new(Duration::ZERO);
    let now = Instant::now();
    let first = coordinator.submit("a", false, now);
    coordinator.take_ready(now);
    let second = coordinator.submit("b", false, now);

    let stale = GenerationResponse {
        version: first,
        outcome: Ok(json!({ "points": {} })),
    };
    assert_eq!(coordinator.accept(stale).unwrap(), None);

    let current = GenerationResponse {
        version: second,
        outcome: Ok(json!({ "points": { "k": {} } })),
    };
    assert_eq!(coordinator.accept(current).unwrap(), Some(json!({ "points": { "k": {} } })));
}

#[test]
fn test_engine_failure_is_reported() {
    let mut coordinator = GenerationCoordinator::default();
    let version = coordinator.submit("bad", false, Instant::now());
    let err = coordinator
        .accept(GenerationResponse {
            version,
            outcome: Err("unexpected token".to_string()),
        })
        .unwrap_err();
    assert!(matches!(err, LayoutError::Engine(message) if message == "unexpected token"));
}

#[test]
fn test_submit_layout_serializes_document() {
    let options = EditorOptions {
        debounce_ms: 0,
        ..Default::default()
    };
    let mut coordinator = GenerationCoordinator::from_options(&options);
    let now = Instant::now();
    coordinator.submit_layout(&Layout::new(), false, now).unwrap();

    let request = coordinator.take_ready(now).unwrap();
    let document: serde_json::Value = serde_json::from_str(&request.document).unwrap();
    assert_eq!(document["meta"]["engine"], json!("4.1.0"));
    assert_eq!(document["points"]["zones"], json!({}));
}
