//! Source catalogs
//!
//! A catalog is a YAML table of endpoints for one API: paths, parameters,
//! continuation conventions and the child sources reachable from each
//! record. It replaces hand-written per-endpoint methods.
//!
//! # Overview
//!
//! The catalog module provides:
//! - `CatalogDefinition` - the parsed, validated table
//! - `Catalog` - a definition bound to a transport and credentials, which
//!   opens traversals
//! - Built-in tables for `graph`, `reddit`, `youtube` and `twitter`

mod builtin;
mod parser;
mod traversal;
mod types;

pub use builtin::{get_builtin, is_builtin, list_builtin, list_builtin_info, CatalogInfo};
pub use parser::{load_catalog, parse_catalog, validate_catalog};
pub use traversal::{iterate, Catalog};
pub use types::{CatalogDefinition, ChildDefinition, OrderDefinition, SourceDefinition};
