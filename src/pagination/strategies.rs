//! Pagination strategy implementations
//!
//! Each strategy handles one continuation convention.

use super::types::{ContinuationState, NextPage, PaginationStrategy};
use crate::config::Order;
use crate::types::{lookup, lookup_string, Record, StringMap};
use serde_json::Value;
use url::Url;

// ============================================================================
// Cursor Token Pagination
// ============================================================================

/// Graph-style pagination
///
/// Follows the query string of `paging.next` when present, otherwise
/// `paging.cursors.after`. Reverse order walks `previous`/`before` instead.
#[derive(Debug, Clone)]
pub struct CursorTokenPaginator {
    /// Path of the paging envelope
    pub paging_path: String,
    /// Link field to follow (`next` or `previous`)
    pub link_field: &'static str,
    /// Cursor field and query parameter (`after` or `before`)
    pub cursor_field: &'static str,
}

impl CursorTokenPaginator {
    /// Create a new cursor-token paginator
    pub fn new(paging_path: impl Into<String>, order: Order) -> Self {
        let (link_field, cursor_field) = match order {
            Order::Natural => ("next", "after"),
            Order::Reverse => ("previous", "before"),
        };
        Self {
            paging_path: paging_path.into(),
            link_field,
            cursor_field,
        }
    }
}

impl PaginationStrategy for CursorTokenPaginator {
    fn next_page(
        &self,
        body: &Value,
        _records: &[Record],
        state: &mut ContinuationState,
    ) -> NextPage {
        let Some(paging) = lookup(body, &self.paging_path) else {
            state.mark_done();
            return NextPage::Done;
        };

        if let Some(params) = lookup_string(paging, self.link_field)
            .as_deref()
            .and_then(link_query_params)
        {
            return NextPage::with_params(params);
        }

        let cursor_path = format!("cursors.{}", self.cursor_field);
        match lookup_string(paging, &cursor_path) {
            Some(cursor) => NextPage::with_param(self.cursor_field, cursor),
            None => {
                state.mark_done();
                NextPage::Done
            }
        }
    }
}

/// Extract the query parameters of a continuation link
fn link_query_params(link: &str) -> Option<StringMap> {
    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse("http://localhost/").ok()?.join(link).ok()?
        }
        Err(_) => return None,
    };

    let params: StringMap = url.query_pairs().into_owned().collect();
    if params.is_empty() {
        None
    } else {
        Some(params)
    }
}

// ============================================================================
// Page Token Pagination
// ============================================================================

/// Opaque page token pagination (e.g., YouTube `nextPageToken`)
#[derive(Debug, Clone)]
pub struct PageTokenPaginator {
    /// Query parameter for the token
    pub param: String,
    /// Path of the token in the response
    pub path: String,
}

impl PageTokenPaginator {
    /// Create a new page-token paginator
    pub fn new(param: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            path: path.into(),
        }
    }
}

impl PaginationStrategy for PageTokenPaginator {
    fn next_page(
        &self,
        body: &Value,
        _records: &[Record],
        state: &mut ContinuationState,
    ) -> NextPage {
        match lookup_string(body, &self.path) {
            Some(token) => NextPage::with_param(&self.param, token),
            None => {
                state.mark_done();
                NextPage::Done
            }
        }
    }
}

// ============================================================================
// Max Id Pagination
// ============================================================================

/// Watermark pagination over descending numeric ids
///
/// The next request asks for ids at most `min(id) - 1` of the last page.
#[derive(Debug, Clone)]
pub struct MaxIdPaginator {
    /// Query parameter for the watermark
    pub param: String,
    /// Path of the id inside each record
    pub id_field: String,
}

impl MaxIdPaginator {
    /// Create a new max-id paginator
    pub fn new(param: impl Into<String>, id_field: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            id_field: id_field.into(),
        }
    }

    fn record_id(&self, record: &Record) -> Option<u64> {
        match lookup(record, &self.id_field)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl PaginationStrategy for MaxIdPaginator {
    fn next_page(
        &self,
        _body: &Value,
        records: &[Record],
        state: &mut ContinuationState,
    ) -> NextPage {
        let lowest = records.iter().filter_map(|r| self.record_id(r)).min();

        match lowest {
            Some(id) if id > 0 => NextPage::with_param(&self.param, (id - 1).to_string()),
            _ => {
                state.mark_done();
                NextPage::Done
            }
        }
    }
}

// ============================================================================
// Offset Pagination
// ============================================================================

/// Offset-based pagination
///
/// `offset += len(records)`; an empty page or reaching the total hint ends it.
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    /// Query parameter for the offset
    pub param: String,
    /// Optional path of a total-size hint
    pub total_path: Option<String>,
}

impl OffsetPaginator {
    /// Create a new offset paginator
    pub fn new(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            total_path: None,
        }
    }

    /// Stop once the offset reaches the total found at this path
    pub fn with_total_path(mut self, path: impl Into<String>) -> Self {
        self.total_path = Some(path.into());
        self
    }
}

impl PaginationStrategy for OffsetPaginator {
    fn next_page(
        &self,
        body: &Value,
        records: &[Record],
        state: &mut ContinuationState,
    ) -> NextPage {
        if records.is_empty() {
            state.mark_done();
            return NextPage::Done;
        }

        state.offset += records.len() as u64;

        let total = self
            .total_path
            .as_deref()
            .and_then(|path| lookup(body, path))
            .and_then(Value::as_u64);
        if total.is_some_and(|total| state.offset >= total) {
            state.mark_done();
            return NextPage::Done;
        }

        NextPage::with_param(&self.param, state.offset.to_string())
    }
}

// ============================================================================
// Timestamp Pagination
// ============================================================================

/// Watermark pagination on the timestamp of the last record
#[derive(Debug, Clone)]
pub struct TimestampPaginator {
    /// Query parameter for the watermark
    pub param: String,
    /// Path of the timestamp inside each record
    pub field: String,
}

impl TimestampPaginator {
    /// Create a new timestamp paginator
    pub fn new(param: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            field: field.into(),
        }
    }
}

impl PaginationStrategy for TimestampPaginator {
    fn next_page(
        &self,
        _body: &Value,
        records: &[Record],
        state: &mut ContinuationState,
    ) -> NextPage {
        match records.last().and_then(|r| lookup_string(r, &self.field)) {
            Some(timestamp) => NextPage::with_param(&self.param, timestamp),
            None => {
                state.mark_done();
                NextPage::Done
            }
        }
    }
}

// ============================================================================
// Envelope Cursor Pagination
// ============================================================================

/// Cursor read from an envelope field (e.g., Reddit `data.after`)
#[derive(Debug, Clone)]
pub struct EnvelopeCursorPaginator {
    /// Query parameter for the cursor
    pub param: String,
    /// Path of the cursor in the response
    pub path: String,
}

impl EnvelopeCursorPaginator {
    /// Create a new envelope-cursor paginator
    pub fn new(param: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            path: path.into(),
        }
    }
}

impl PaginationStrategy for EnvelopeCursorPaginator {
    fn next_page(
        &self,
        body: &Value,
        _records: &[Record],
        state: &mut ContinuationState,
    ) -> NextPage {
        match lookup_string(body, &self.path) {
            Some(cursor) => NextPage::with_param(&self.param, cursor),
            None => {
                state.mark_done();
                NextPage::Done
            }
        }
    }
}

// ============================================================================
// No Pagination
// ============================================================================

/// No pagination - single request
#[derive(Debug, Clone, Default)]
pub struct NoPaginator;

impl PaginationStrategy for NoPaginator {
    fn next_page(
        &self,
        _body: &Value,
        _records: &[Record],
        state: &mut ContinuationState,
    ) -> NextPage {
        state.mark_done();
        NextPage::Done
    }
}
