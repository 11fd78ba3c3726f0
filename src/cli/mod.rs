//! CLI module
//!
//! Command-line interface for reading catalog sources.
//!
//! # Commands
//!
//! - `list` - List built-in catalogs
//! - `sources` - List the sources of a catalog and their children
//! - `validate` - Validate a catalog definition
//! - `read` - Stream records of a traversal path as JSON lines

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{parse_pairs, Runner};
