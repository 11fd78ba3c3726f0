//! Pagination module
//!
//! Supports: Cursor Token, Page Token, Max Id, Offset, Timestamp, Envelope Cursor
//!
//! # Overview
//!
//! A [`PaginationStrategy`] reads one decoded page and produces the query
//! parameters of the next request. A [`SourcePaginator`] drives a strategy
//! over a [`RetryingExecutor`](crate::http::RetryingExecutor), buffering one
//! page at a time and yielding its records through
//! [`RecordStream`](crate::stream::RecordStream).

mod paginator;
mod strategies;
mod types;

pub use paginator::{IterationCursor, PaginatorState, SourcePaginator};
pub use strategies::{
    CursorTokenPaginator, EnvelopeCursorPaginator, MaxIdPaginator, NoPaginator, OffsetPaginator,
    PageTokenPaginator, TimestampPaginator,
};
pub use types::{
    extract_records, ContinuationState, NextPage, PageSizeConfig, PaginationConfig,
    PaginationStrategy,
};

#[cfg(test)]
mod tests;
