//! Tests for pagination module

use super::*;
use crate::config::Order;
use crate::error::Error;
use crate::http::PageRequest;
use crate::stream::{collect, RecordStream};
use crate::test_support::{executor, MockTransport};
use crate::types::StringMap;
use serde_json::{json, Value};
use std::sync::Arc;

fn params(pairs: &[(&str, &str)]) -> StringMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn continue_params(next: NextPage) -> StringMap {
    match next {
        NextPage::Continue { query_params } => query_params,
        NextPage::Done => panic!("Expected Continue"),
    }
}

/// Three pages chained through `data.after`: t1 -> t2 -> end
fn listing_transport() -> Arc<MockTransport> {
    Arc::new(MockTransport::new(|request| {
        let page = match request.query.get("after").map(String::as_str) {
            None => json!({"data": {"after": "t1", "children": [{"id": 1}, {"id": 2}]}}),
            Some("t1") => json!({"data": {"after": "t2", "children": [{"id": 3}, {"id": 4}]}}),
            Some("t2") => json!({"data": {"after": null, "children": [{"id": 5}]}}),
            Some(other) => return Err(Error::http_status(404, other)),
        };
        Ok(page)
    }))
}

fn listing_paginator(transport: &Arc<MockTransport>) -> SourcePaginator {
    SourcePaginator::new(
        executor(transport, 1),
        PageRequest::new("/r/rust/new.json").query("limit", "2"),
        PaginationConfig::envelope_cursor("after", "data.after").build(Order::Natural),
    )
    .records_path("data.children")
}

fn ids(records: &[Value]) -> Vec<i64> {
    records.iter().filter_map(|r| r["id"].as_i64()).collect()
}

// ============================================================================
// NextPage / State Tests
// ============================================================================

#[test]
fn test_next_page_with_param() {
    let next = NextPage::with_param("after", "abc");
    assert!(next.is_continue());
    assert!(!next.is_done());
    assert_eq!(continue_params(next), params(&[("after", "abc")]));
}

#[test]
fn test_continuation_would_repeat() {
    let mut state = ContinuationState::new();
    let next = params(&[("after", "x")]);

    // Nothing fetched yet, so nothing can repeat
    assert!(!state.would_repeat(&next));

    state.apply(next.clone());
    state.fetched_first = true;
    assert!(state.would_repeat(&next));
    assert!(!state.would_repeat(&params(&[("after", "y")])));
}

#[test]
fn test_page_size_resolve() {
    let capped = PageSizeConfig::new("limit", Some(100));
    assert_eq!(capped.resolve(0), Some(100));
    assert_eq!(capped.resolve(25), Some(25));
    assert_eq!(capped.resolve(500), Some(100));

    let uncapped = PageSizeConfig::new("count", None);
    assert_eq!(uncapped.resolve(0), None);
    assert_eq!(uncapped.resolve(50), Some(50));
}

#[test]
fn test_extract_records() {
    let body = json!({"data": [{"id": 1}, {"id": 2}], "single": {"id": 3}, "none": null});

    assert_eq!(extract_records(&body, "data").len(), 2);
    assert_eq!(extract_records(&body, "single"), vec![json!({"id": 3})]);
    assert!(extract_records(&body, "none").is_empty());
    assert!(extract_records(&body, "missing").is_empty());
    assert_eq!(extract_records(&json!([1, 2, 3]), "").len(), 3);
}

// ============================================================================
// Strategy Tests
// ============================================================================

#[test]
fn test_cursor_token_follows_next_link() {
    let strategy = CursorTokenPaginator::new("paging", Order::Natural);
    let body = json!({
        "data": [],
        "paging": {
            "next": "https://graph.example.com/v2.9/123/feed?limit=25&after=QVFI&access_token=tok",
            "cursors": {"after": "ignored"}
        }
    });

    let next = continue_params(strategy.next_page(&body, &[], &mut ContinuationState::new()));
    assert_eq!(next.get("after"), Some(&"QVFI".to_string()));
    assert_eq!(next.get("limit"), Some(&"25".to_string()));
}

#[test]
fn test_cursor_token_falls_back_to_cursors() {
    let strategy = CursorTokenPaginator::new("paging", Order::Natural);
    let body = json!({"paging": {"cursors": {"after": "A1", "before": "B1"}}});

    let next = continue_params(strategy.next_page(&body, &[], &mut ContinuationState::new()));
    assert_eq!(next, params(&[("after", "A1")]));
}

#[test]
fn test_cursor_token_reverse_order() {
    let strategy = CursorTokenPaginator::new("paging", Order::Reverse);
    let body = json!({"paging": {
        "next": "https://graph.example.com/feed?after=A1",
        "cursors": {"after": "A1", "before": "B1"}
    }});

    let next = continue_params(strategy.next_page(&body, &[], &mut ContinuationState::new()));
    assert_eq!(next, params(&[("before", "B1")]));
}

#[test]
fn test_cursor_token_without_paging_is_done() {
    let strategy = CursorTokenPaginator::new("paging", Order::Natural);
    let mut state = ContinuationState::new();

    assert!(strategy
        .next_page(&json!({"data": [{"id": 1}]}), &[], &mut state)
        .is_done());
    assert!(state.done);
}

#[test]
fn test_page_token() {
    let strategy = PageTokenPaginator::new("pageToken", "nextPageToken");
    let mut state = ContinuationState::new();

    let next = continue_params(strategy.next_page(
        &json!({"nextPageToken": "CAUQAA"}),
        &[],
        &mut state,
    ));
    assert_eq!(next, params(&[("pageToken", "CAUQAA")]));

    assert!(strategy
        .next_page(&json!({"items": []}), &[], &mut state)
        .is_done());
}

#[test]
fn test_max_id_uses_lowest_id_minus_one() {
    let strategy = MaxIdPaginator::new("max_id", "id_str");
    let records = vec![
        json!({"id_str": "900"}),
        json!({"id_str": "850"}),
        json!({"id_str": "875"}),
    ];

    let next = continue_params(strategy.next_page(
        &json!([]),
        &records,
        &mut ContinuationState::new(),
    ));
    assert_eq!(next, params(&[("max_id", "849")]));
}

#[test]
fn test_max_id_empty_page_is_done() {
    let strategy = MaxIdPaginator::new("max_id", "id");
    assert!(strategy
        .next_page(&json!([]), &[], &mut ContinuationState::new())
        .is_done());
}

#[test]
fn test_offset_advances_by_page_length() {
    let strategy = OffsetPaginator::new("offset").with_total_path("total");
    let mut state = ContinuationState::new();
    let page = vec![json!(1), json!(2)];

    let next = continue_params(strategy.next_page(&json!({"total": 5}), &page, &mut state));
    assert_eq!(next, params(&[("offset", "2")]));

    strategy.next_page(&json!({"total": 5}), &page, &mut state);
    assert_eq!(state.offset, 4);

    // Offset 5 reaches the total
    assert!(strategy
        .next_page(&json!({"total": 5}), &[json!(3)], &mut state)
        .is_done());
}

#[test]
fn test_offset_empty_page_is_done() {
    let strategy = OffsetPaginator::new("offset");
    assert!(strategy
        .next_page(&json!({}), &[], &mut ContinuationState::new())
        .is_done());
}

#[test]
fn test_timestamp_uses_last_record() {
    let strategy = TimestampPaginator::new("before", "created_utc");
    let records = vec![
        json!({"created_utc": 1500000200}),
        json!({"created_utc": 1500000100}),
    ];

    let next = continue_params(strategy.next_page(
        &json!({}),
        &records,
        &mut ContinuationState::new(),
    ));
    assert_eq!(next, params(&[("before", "1500000100")]));
}

#[test]
fn test_envelope_cursor() {
    let strategy = EnvelopeCursorPaginator::new("cursor", "page.cursor");
    let mut state = ContinuationState::new();

    let next = continue_params(strategy.next_page(
        &json!({"page": {"cursor": "c2"}}),
        &[],
        &mut state,
    ));
    assert_eq!(next, params(&[("cursor", "c2")]));

    assert!(strategy
        .next_page(&json!({"page": {"cursor": ""}}), &[], &mut state)
        .is_done());
}

#[test]
fn test_no_paginator() {
    let mut state = ContinuationState::new();
    assert!(NoPaginator
        .next_page(&json!({"data": [1]}), &[json!(1)], &mut state)
        .is_done());
    assert!(state.done);
}

#[test]
fn test_pagination_config_from_yaml() {
    let config: PaginationConfig = serde_yaml::from_str("type: page_token").unwrap();
    assert_eq!(
        config,
        PaginationConfig::page_token("pageToken", "nextPageToken")
    );

    let config: PaginationConfig =
        serde_yaml::from_str("type: envelope_cursor\nparam: after\npath: data.after").unwrap();
    assert_eq!(config, PaginationConfig::envelope_cursor("after", "data.after"));

    let config: PaginationConfig = serde_yaml::from_str("type: cursor_token").unwrap();
    assert_eq!(config, PaginationConfig::cursor_token());
}

// ============================================================================
// Paginator Tests
// ============================================================================

#[tokio::test]
async fn test_paginator_walks_all_pages() {
    let transport = listing_transport();
    let mut paginator = listing_paginator(&transport);

    let records = collect(&mut paginator).await.unwrap();

    assert_eq!(ids(&records), vec![1, 2, 3, 4, 5]);
    assert_eq!(paginator.page_count(), 3);
    assert_eq!(paginator.total_yielded(), 5);
    assert_eq!(paginator.state(), PaginatorState::Exhausted);
    assert_eq!(transport.calls(), 3);

    // Ended streams stay ended
    assert!(paginator.next().await.unwrap().is_none());
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn test_paginator_is_lazy() {
    let transport = listing_transport();
    let mut paginator = listing_paginator(&transport);

    assert_eq!(transport.calls(), 0);
    assert_eq!(paginator.state(), PaginatorState::Fresh);

    paginator.next().await.unwrap();
    paginator.next().await.unwrap();
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_paginator_respects_max_count() {
    let transport = listing_transport();
    let mut paginator = listing_paginator(&transport).max_count(3);

    let records = collect(&mut paginator).await.unwrap();

    assert_eq!(ids(&records), vec![1, 2, 3]);
    // The third page is never requested
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_paginator_keeps_base_query() {
    let transport = listing_transport();
    let mut paginator = listing_paginator(&transport);
    collect(&mut paginator).await.unwrap();

    let requests = transport.requests();
    assert!(requests
        .iter()
        .all(|r| r.query.get("limit") == Some(&"2".to_string())));
    assert_eq!(requests[2].query.get("after"), Some(&"t2".to_string()));
}

#[tokio::test]
async fn test_jump_resumes_at_same_record() {
    let transport = listing_transport();
    let full = collect(&mut listing_paginator(&transport)).await.unwrap();

    let mut resumed = listing_paginator(&transport);
    resumed.jump(1).await.unwrap();
    assert_eq!(resumed.page_count(), 1);
    assert_eq!(resumed.total_yielded(), 0);

    let rest = collect(&mut resumed).await.unwrap();
    assert_eq!(rest, full[2..].to_vec());
}

#[tokio::test]
async fn test_jump_past_end_yields_nothing() {
    let transport = listing_transport();
    let mut paginator = listing_paginator(&transport);

    paginator.jump(10).await.unwrap();

    assert_eq!(paginator.page_count(), 3);
    assert!(paginator.next().await.unwrap().is_none());
}

#[tokio::test]
async fn test_first_page_fetched_without_token() {
    let transport = Arc::new(MockTransport::new(|request| {
        Ok(match request.query.get("pageToken").map(String::as_str) {
            None => json!({"items": [{"id": "a"}], "nextPageToken": "p2"}),
            Some(_) => json!({"items": [{"id": "b"}]}),
        })
    }));
    let mut paginator = SourcePaginator::new(
        executor(&transport, 1),
        PageRequest::new("/commentThreads"),
        PaginationConfig::page_token("pageToken", "nextPageToken").build(Order::Natural),
    )
    .records_path("items");

    let records = collect(&mut paginator).await.unwrap();

    assert_eq!(records.len(), 2);
    assert!(transport.requests()[0].query.get("pageToken").is_none());
}

#[tokio::test]
async fn test_repeated_cursor_stops() {
    let transport = Arc::new(MockTransport::new(|_| {
        Ok(json!({"data": {"after": "same", "children": [{"id": 1}]}}))
    }));
    let mut paginator = listing_paginator(&transport);

    let records = collect(&mut paginator).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_failed_paginator_is_terminal() {
    let transport = Arc::new(MockTransport::new(|_| Err(Error::http_status(500, "down"))));
    let mut paginator = listing_paginator(&transport);

    let err = paginator.next().await.unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(paginator.state(), PaginatorState::Failed);

    assert!(paginator.next().await.unwrap().is_none());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_single_request_source() {
    let transport = Arc::new(MockTransport::new(|_| {
        Ok(json!({"id": "123", "name": "Example Page"}))
    }));
    let mut paginator = SourcePaginator::new(
        executor(&transport, 1),
        PageRequest::new("/123"),
        PaginationConfig::None.build(Order::Natural),
    );

    let records = collect(&mut paginator).await.unwrap();

    assert_eq!(records, vec![json!({"id": "123", "name": "Example Page"})]);
}

#[tokio::test]
async fn test_pages_consumed_waits_for_buffer() {
    let transport = listing_transport();
    let mut paginator = listing_paginator(&transport);

    paginator.next().await.unwrap();
    assert_eq!(paginator.pages_fetched(), 1);
    assert_eq!(paginator.pages_consumed(), 0);

    paginator.next().await.unwrap();
    assert_eq!(paginator.pages_consumed(), 1);

    paginator.jump(1).await.unwrap();
    assert_eq!(paginator.pages_consumed(), 2);
}
