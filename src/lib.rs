//! # pagereaper
//!
//! A resumable, failure-tolerant pagination engine for read-only HTTP data
//! sources. Large remote collections are exposed as lazy record streams that
//! fetch one page at a time, retry transient failures, chain parent records
//! into child collections and expand deferred branches of comment trees.
//!
//! ## Features
//!
//! - **Pull-based streams**: a page is only requested when its records are needed
//! - **Five continuation styles**: cursor links, page tokens, max-id, offset, timestamp
//! - **Failure escalation**: one exhausted request is recoverable, two in a row are fatal
//! - **Chaining**: `feed -> comments -> replies` with optional parent tagging
//! - **Deferred expansion**: "load more" placeholders fetched after the visible tree
//! - **Resume**: skip the pages an interrupted run already consumed
//! - **Catalogs**: endpoints declared in YAML, with built-ins for common APIs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pagereaper::{Catalog, IterateConfig, RecordStream, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let catalog = Catalog::load("graph")?.auth("access_token", "...");
//!
//!     let config = IterateConfig::new().with_count(100).with_tag_parent(true);
//!     let mut stream = catalog
//!         .iterate(&["page_feed", "comments"], "1234567890", &config)
//!         .await?;
//!
//!     while let Some(record) = stream.next().await? {
//!         println!("{record}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Catalog::iterate(path, locator)                 │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───────┬─────────────────────────┐
//! │   Paginate   │        Chain          │    Deferred Expansion   │
//! ├──────────────┼───────────────────────┼─────────────────────────┤
//! │ Cursor token │ outer x inner factory │ tree walk, stub queue   │
//! │ Page token   │ skip inner errors     │ chunked expansion       │
//! │ Max id       │ parent tagging        │ dedup by stub identity  │
//! │ Offset, Time │                       │                         │
//! └──────────────┴───────────────────────┴─────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │        RetryingExecutor -> RequestPacer -> HttpTransport        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types and failure classification
pub mod error;

/// Common types and type aliases
pub mod types;

/// Iteration options
pub mod config;

/// HTTP transport, retrying executor and pacing
pub mod http;

/// Pull-based record streams
pub mod stream;

/// Paginated sources and continuation strategies
pub mod pagination;

/// Chained iteration over parent records
pub mod chain;

/// Deferred expansion of tree-shaped sources
pub mod expand;

/// Template interpolation
pub mod template;

/// YAML source catalogs
pub mod catalog;

/// Command-line interface
pub mod cli;

#[cfg(test)]
mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result, Severity};
pub use types::*;

// Re-export commonly used types
pub use catalog::{load_catalog, parse_catalog, Catalog, CatalogDefinition};
pub use chain::ChainedIterator;
pub use config::{IterateConfig, Order};
pub use expand::DeferredExpansion;
pub use http::{HttpTransport, PageRequest, RetryingExecutor, Transport};
pub use pagination::{PaginationConfig, SourcePaginator};
pub use stream::{collect, into_stream, BoxedRecordStream, RecordList, RecordStream};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
