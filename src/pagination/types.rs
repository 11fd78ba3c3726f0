//! Pagination types and traits
//!
//! Defines the continuation state, the strategy trait and the declarative
//! strategy configuration used by the source catalog.

use super::strategies::{
    CursorTokenPaginator, EnvelopeCursorPaginator, MaxIdPaginator, NoPaginator, OffsetPaginator,
    PageTokenPaginator, TimestampPaginator,
};
use crate::config::Order;
use crate::types::{lookup, Record, StringMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available with these parameters
    Continue {
        /// Query parameters to add/replace
        query_params: StringMap,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Create a continuation with query parameters
    pub fn with_params(params: StringMap) -> Self {
        Self::Continue {
            query_params: params,
        }
    }

    /// Create a continuation with a single parameter
    pub fn with_param(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut params = HashMap::new();
        params.insert(key.into(), value.into());
        Self::with_params(params)
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// The minimal state needed to request the next page
#[derive(Debug, Clone, Default)]
pub struct ContinuationState {
    /// Parameters merged into the next request
    pub params: StringMap,
    /// Running offset (offset strategy)
    pub offset: u64,
    /// Has the first page been fetched?
    pub fetched_first: bool,
    /// Has the source signalled its end?
    pub done: bool,
}

impl ContinuationState {
    /// Create a fresh state
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Check if applying these parameters would change nothing
    pub fn would_repeat(&self, params: &StringMap) -> bool {
        self.fetched_first
            && !params.is_empty()
            && params
                .iter()
                .all(|(key, value)| self.params.get(key) == Some(value))
    }

    /// Merge the parameters of a continuation
    pub fn apply(&mut self, params: StringMap) {
        self.params.extend(params);
    }
}

/// Core trait for pagination strategies
///
/// A strategy looks at one decoded page and decides how to ask for the next
/// one. It must not assume it will be called again after returning `Done`.
pub trait PaginationStrategy: Send + Sync + std::fmt::Debug {
    /// Process a page and determine if there's a next one
    fn next_page(&self, body: &Value, records: &[Record], state: &mut ContinuationState)
        -> NextPage;
}

/// Declarative pagination configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationConfig {
    /// Single request
    #[default]
    None,

    /// `paging.next` link or `paging.cursors.after` (graph-style APIs)
    CursorToken {
        /// Envelope field holding `next`/`previous` and `cursors`
        #[serde(default = "default_paging_path")]
        paging_path: String,
    },

    /// Opaque `nextPageToken`-style field
    PageToken {
        /// Query parameter for the token
        #[serde(default = "default_page_token_param")]
        param: String,
        /// Path of the token in the response
        #[serde(default = "default_page_token_path")]
        path: String,
    },

    /// Minimum id of the last page minus one
    MaxId {
        /// Query parameter for the watermark
        #[serde(default = "default_max_id_param")]
        param: String,
        /// Path of the id inside each record
        #[serde(default = "default_id_field")]
        id_field: String,
    },

    /// `offset += len(records)`
    Offset {
        /// Query parameter for the offset
        #[serde(default = "default_offset_param")]
        param: String,
        /// Optional path of a total-size hint
        #[serde(default)]
        total_path: Option<String>,
    },

    /// Timestamp of the last record
    Timestamp {
        /// Query parameter for the watermark
        #[serde(default = "default_timestamp_param")]
        param: String,
        /// Path of the timestamp inside each record
        field: String,
    },

    /// Cursor carried in an envelope field such as `page.cursor`
    EnvelopeCursor {
        /// Query parameter for the cursor
        #[serde(default = "default_cursor_param")]
        param: String,
        /// Path of the cursor in the response
        path: String,
    },
}

fn default_paging_path() -> String {
    "paging".to_string()
}

fn default_page_token_param() -> String {
    "pageToken".to_string()
}

fn default_page_token_path() -> String {
    "nextPageToken".to_string()
}

fn default_max_id_param() -> String {
    "max_id".to_string()
}

fn default_id_field() -> String {
    "id".to_string()
}

fn default_offset_param() -> String {
    "offset".to_string()
}

fn default_timestamp_param() -> String {
    "before".to_string()
}

fn default_cursor_param() -> String {
    "cursor".to_string()
}

impl PaginationConfig {
    /// Create cursor-token pagination config
    pub fn cursor_token() -> Self {
        Self::CursorToken {
            paging_path: default_paging_path(),
        }
    }

    /// Create page-token pagination config
    pub fn page_token(param: impl Into<String>, path: impl Into<String>) -> Self {
        Self::PageToken {
            param: param.into(),
            path: path.into(),
        }
    }

    /// Create max-id pagination config
    pub fn max_id(param: impl Into<String>, id_field: impl Into<String>) -> Self {
        Self::MaxId {
            param: param.into(),
            id_field: id_field.into(),
        }
    }

    /// Create offset pagination config
    pub fn offset(param: impl Into<String>) -> Self {
        Self::Offset {
            param: param.into(),
            total_path: None,
        }
    }

    /// Create timestamp pagination config
    pub fn timestamp(param: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Timestamp {
            param: param.into(),
            field: field.into(),
        }
    }

    /// Create envelope-cursor pagination config
    pub fn envelope_cursor(param: impl Into<String>, path: impl Into<String>) -> Self {
        Self::EnvelopeCursor {
            param: param.into(),
            path: path.into(),
        }
    }

    /// Build the strategy for a traversal order
    pub fn build(&self, order: Order) -> Box<dyn PaginationStrategy> {
        match self {
            Self::None => Box::new(NoPaginator),
            Self::CursorToken { paging_path } => {
                Box::new(CursorTokenPaginator::new(paging_path, order))
            }
            Self::PageToken { param, path } => Box::new(PageTokenPaginator::new(param, path)),
            Self::MaxId { param, id_field } => Box::new(MaxIdPaginator::new(param, id_field)),
            Self::Offset { param, total_path } => {
                let mut paginator = OffsetPaginator::new(param);
                if let Some(path) = total_path {
                    paginator = paginator.with_total_path(path);
                }
                Box::new(paginator)
            }
            Self::Timestamp { param, field } => Box::new(TimestampPaginator::new(param, field)),
            Self::EnvelopeCursor { param, path } => {
                Box::new(EnvelopeCursorPaginator::new(param, path))
            }
        }
    }
}

/// Page size parameter and the source's declared cap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSizeConfig {
    /// Query parameter name (`limit`, `count`, `maxResults`)
    pub param: String,
    /// Largest page the source accepts
    #[serde(default)]
    pub cap: Option<u32>,
}

impl PageSizeConfig {
    /// Create a page size config
    pub fn new(param: impl Into<String>, cap: Option<u32>) -> Self {
        Self {
            param: param.into(),
            cap,
        }
    }

    /// Clamp a requested size. Zero asks for the cap; `None` means the
    /// parameter is left out.
    pub fn resolve(&self, requested: u32) -> Option<u32> {
        match (requested, self.cap) {
            (0, cap) => cap,
            (size, Some(cap)) => Some(size.min(cap)),
            (size, None) => Some(size),
        }
    }
}

/// Pull the record list out of a page
///
/// An empty path means the body itself. A missing path or `null` is an empty
/// page; a single object is a one-record page.
pub fn extract_records(body: &Value, records_path: &str) -> Vec<Record> {
    match lookup(body, records_path) {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other.clone()],
    }
}
