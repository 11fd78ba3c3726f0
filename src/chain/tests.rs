//! Tests for chained iteration

use super::*;
use crate::error::Error;
use crate::http::PageRequest;
use crate::pagination::{PaginationConfig, SourcePaginator};
use crate::config::Order;
use crate::stream::{collect, RecordList};
use crate::test_support::{executor, MockTransport};
use serde_json::json;
use std::sync::Arc;

/// Stream that fails with the given error on its first pull
struct FailingStream(Option<Error>);

#[async_trait]
impl RecordStream for FailingStream {
    async fn next(&mut self) -> Result<Option<Record>> {
        match self.0.take() {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

fn parents(ids: &[&str]) -> BoxedRecordStream {
    Box::new(RecordList::new(ids.iter().map(|id| json!({"id": id}))))
}

/// Two children per parent, none for "empty"; "broken" fails with a
/// recoverable error, "fatal" with a fatal one
fn child_factory() -> StreamFactory<usize> {
    Box::new(|key: &str, per_parent: &usize| {
        let stream: BoxedRecordStream = match key {
            "empty" => Box::new(RecordList::default()),
            "broken" => Box::new(FailingStream(Some(Error::recoverable(
                Error::http_status(500, "down"),
            )))),
            "fatal" => Box::new(FailingStream(Some(Error::fatal(Error::http_status(
                401, "denied",
            ))))),
            _ => Box::new(RecordList::new(
                (1..=*per_parent).map(|n| json!({"child": format!("{key}{n}")})),
            )),
        };
        Ok(stream)
    })
}

fn children(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r["child"].as_str().map(String::from))
        .collect()
}

#[tokio::test]
async fn test_chain_preserves_order() {
    let mut chain = ChainedIterator::new(parents(&["a", "b", "c"]), "id", child_factory(), 2);

    let records = collect(&mut chain).await.unwrap();

    assert_eq!(children(&records), vec!["a1", "a2", "b1", "b2", "c1", "c2"]);
    assert_eq!(chain.total_yielded(), 6);
}

#[tokio::test]
async fn test_chain_passes_through_empty_children() {
    let mut chain =
        ChainedIterator::new(parents(&["a", "empty", "c"]), "id", child_factory(), 1);

    let records = collect(&mut chain).await.unwrap();

    assert_eq!(children(&records), vec!["a1", "c1"]);
}

#[tokio::test]
async fn test_chain_skips_parent_without_key() {
    let outer: BoxedRecordStream = Box::new(RecordList::new(vec![
        json!({"id": "a"}),
        json!({"name": "no id"}),
        json!({"id": "b"}),
    ]));
    let mut chain = ChainedIterator::new(outer, "id", child_factory(), 1);

    let records = collect(&mut chain).await.unwrap();

    assert_eq!(children(&records), vec!["a1", "b1"]);
}

#[tokio::test]
async fn test_chain_numeric_key() {
    let outer: BoxedRecordStream = Box::new(RecordList::new(vec![json!({"data": {"id": 42}})]));
    let mut chain = ChainedIterator::new(outer, "data.id", child_factory(), 1);

    let records = collect(&mut chain).await.unwrap();

    assert_eq!(children(&records), vec!["421"]);
}

#[tokio::test]
async fn test_chain_skips_recoverable_inner_error() {
    let mut chain = ChainedIterator::new(parents(&["a", "broken", "c"]), "id", child_factory(), 2)
        .skip_inner_errors(true);

    let records = collect(&mut chain).await.unwrap();

    assert_eq!(children(&records), vec!["a1", "a2", "c1", "c2"]);
}

#[tokio::test]
async fn test_chain_propagates_inner_error_without_skip() {
    let mut chain = ChainedIterator::new(parents(&["a", "broken", "c"]), "id", child_factory(), 1);

    assert!(chain.next().await.unwrap().is_some());
    let err = chain.next().await.unwrap_err();
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_chain_never_skips_fatal_error() {
    let mut chain = ChainedIterator::new(parents(&["fatal", "c"]), "id", child_factory(), 1)
        .skip_inner_errors(true);

    let err = chain.next().await.unwrap_err();
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_chain_propagates_outer_error() {
    let outer: BoxedRecordStream = Box::new(FailingStream(Some(Error::recoverable(
        Error::http_status(503, "busy"),
    ))));
    let mut chain = ChainedIterator::new(outer, "id", child_factory(), 1).skip_inner_errors(true);

    assert!(chain.next().await.is_err());
}

#[tokio::test]
async fn test_chain_tags_parent() {
    let mut chain =
        ChainedIterator::new(parents(&["a"]), "id", child_factory(), 1).tag_parent(true);

    let records = collect(&mut chain).await.unwrap();

    assert_eq!(records, vec![json!({"child": "a1", "parent_key": "a"})]);
}

#[tokio::test]
async fn test_chain_custom_parent_field() {
    let mut chain = ChainedIterator::new(parents(&["a"]), "id", child_factory(), 1)
        .tag_parent(true)
        .parent_field("post_id");

    let records = collect(&mut chain).await.unwrap();

    assert_eq!(records[0]["post_id"], "a");
}

#[tokio::test]
async fn test_chain_max_count() {
    let config = IterateConfig::new().with_count(3);
    let mut chain = ChainedIterator::new(parents(&["a", "b", "c"]), "id", child_factory(), 2)
        .configure(&config);

    let records = collect(&mut chain).await.unwrap();

    assert_eq!(children(&records), vec!["a1", "a2", "b1"]);
}

#[tokio::test]
async fn test_nested_chains() {
    // pages -> posts -> comments
    let posts_factory: StreamFactory<()> = Box::new(|page: &str, _: &()| {
        let posts = RecordList::new(vec![
            json!({"id": format!("{page}_p1")}),
            json!({"id": format!("{page}_p2")}),
        ]);
        let stream: BoxedRecordStream = Box::new(ChainedIterator::new(
            Box::new(posts),
            "id",
            child_factory(),
            1,
        ));
        Ok(stream)
    });
    let mut chain = ChainedIterator::new(parents(&["x", "y"]), "id", posts_factory, ());

    let records = collect(&mut chain).await.unwrap();

    assert_eq!(
        children(&records),
        vec!["x_p11", "x_p21", "y_p11", "y_p21"]
    );
}

#[tokio::test]
async fn test_chain_over_paginated_children() {
    // Children of "bad" fail every attempt; the shared executor forgives one
    let transport = Arc::new(MockTransport::new(|request| {
        if request.url.contains("bad") {
            Err(Error::http_status(500, "down"))
        } else {
            Ok(json!({"data": [{"from": request.url}]}))
        }
    }));
    let shared = executor(&transport, 2);

    let factory: StreamFactory<()> = Box::new(move |key: &str, _: &()| {
        let stream: BoxedRecordStream = Box::new(
            SourcePaginator::new(
                shared.clone(),
                PageRequest::new(format!("/{key}/comments")),
                PaginationConfig::None.build(Order::Natural),
            )
            .records_path("data"),
        );
        Ok(stream)
    });
    let mut chain = ChainedIterator::new(parents(&["p1", "bad", "p2"]), "id", factory, ())
        .skip_inner_errors(true);

    let records = collect(&mut chain).await.unwrap();

    assert_eq!(
        records,
        vec![json!({"from": "/p1/comments"}), json!({"from": "/p2/comments"})]
    );
}

#[tokio::test]
async fn test_chain_two_failures_in_a_row_are_fatal() {
    let transport = Arc::new(MockTransport::new(|request| {
        if request.url.contains("bad") {
            Err(Error::http_status(500, "down"))
        } else {
            Ok(json!({"data": [{"ok": true}]}))
        }
    }));
    let shared = executor(&transport, 1);

    let factory: StreamFactory<()> = Box::new(move |key: &str, _: &()| {
        let stream: BoxedRecordStream = Box::new(
            SourcePaginator::new(
                shared.clone(),
                PageRequest::new(format!("/{key}")),
                PaginationConfig::None.build(Order::Natural),
            )
            .records_path("data"),
        );
        Ok(stream)
    });
    let mut chain =
        ChainedIterator::new(parents(&["bad1", "bad2", "ok"]), "id", factory, ())
            .skip_inner_errors(true);

    let err = chain.next().await.unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(err.status(), Some(500));
}

/// Posts in two pages: [a, fatal] then [c, d]
fn paged_posts(transport: &Arc<MockTransport>) -> SourcePaginator {
    SourcePaginator::new(
        executor(transport, 1),
        PageRequest::new("/feed"),
        PaginationConfig::page_token("pageToken", "nextPageToken").build(Order::Natural),
    )
    .records_path("data")
}

fn posts_transport(first: &'static str) -> Arc<MockTransport> {
    Arc::new(MockTransport::new(move |request| {
        let page = match request.query.get("pageToken") {
            None => json!({"data": [{"id": "a"}, {"id": first}], "nextPageToken": "p2"}),
            Some(_) => json!({"data": [{"id": "c"}, {"id": "d"}]}),
        };
        Ok(page)
    }))
}

#[tokio::test]
async fn test_pages_consumed_excludes_page_of_failed_parent() {
    let transport = posts_transport("fatal");
    let mut chain =
        ChainedIterator::new(Box::new(paged_posts(&transport)), "id", child_factory(), 1);

    assert_eq!(chain.next().await.unwrap(), Some(json!({"child": "a1"})));
    assert!(chain.next().await.is_err());
    assert_eq!(chain.pages_fetched(), 1);
    assert_eq!(chain.pages_consumed(), 0);

    // Resuming from the reported page replays the failed parent
    let mut resumed = paged_posts(&transport);
    resumed.jump(chain.pages_consumed()).await.unwrap();
    let posts = collect(&mut resumed).await.unwrap();
    assert_eq!(posts[1], json!({"id": "fatal"}));
}

#[tokio::test]
async fn test_pages_consumed_counts_finished_pages() {
    let transport = posts_transport("b");
    let factory: StreamFactory<usize> = Box::new(|key: &str, _: &usize| {
        let stream: BoxedRecordStream = if key == "d" {
            Box::new(FailingStream(Some(Error::fatal(Error::http_status(
                401, "denied",
            )))))
        } else {
            Box::new(RecordList::new(vec![json!({"child": key})]))
        };
        Ok(stream)
    });
    let mut chain = ChainedIterator::new(Box::new(paged_posts(&transport)), "id", factory, 0);

    let mut seen = Vec::new();
    let err = loop {
        match chain.next().await {
            Ok(Some(record)) => seen.push(record),
            Ok(None) => panic!("expected the child of d to fail"),
            Err(e) => break e,
        }
    };

    assert!(err.is_fatal());
    assert_eq!(children(&seen), vec!["a", "b", "c"]);
    assert_eq!(chain.pages_consumed(), 1);

    let mut resumed = paged_posts(&transport);
    resumed.jump(chain.pages_consumed()).await.unwrap();
    let posts = collect(&mut resumed).await.unwrap();
    assert_eq!(posts, vec![json!({"id": "c"}), json!({"id": "d"})]);
}

#[tokio::test]
async fn test_pages_consumed_between_parents() {
    let transport = posts_transport("b");
    let mut chain =
        ChainedIterator::new(Box::new(paged_posts(&transport)), "id", child_factory(), 1);

    // a1 is out; parent a stays open until its stream reports the end
    chain.next().await.unwrap();
    assert_eq!(chain.pages_consumed(), 0);

    let records = collect(&mut chain).await.unwrap();
    assert_eq!(children(&records), vec!["b1", "c1", "d1"]);
    assert_eq!(chain.pages_consumed(), 2);
}
