//! Catalog types
//!
//! Declarative source table types for YAML parsing.

use crate::error::{Error, Result};
use crate::expand::TreeConfig;
use crate::pagination::{PageSizeConfig, PaginationConfig};
use crate::types::StringMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// Catalog Definition
// ============================================================================

/// Top-level catalog definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CatalogDefinition {
    /// Catalog name
    pub name: String,
    /// Base URL for all requests
    pub base_url: String,
    /// Minimum interval between two requests of one paginator (0 = none)
    #[serde(default)]
    pub request_rate_ms: u64,
    /// Total attempts per request
    #[serde(default)]
    pub num_retries: Option<u32>,
    /// Base backoff delay between attempts
    #[serde(default)]
    pub retry_rate_ms: Option<u64>,
    /// Request timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Query parameters sent with every request (usually credentials)
    #[serde(default)]
    pub params: StringMap,
    /// Headers sent with every request
    #[serde(default)]
    pub headers: StringMap,
    /// Source definitions
    pub sources: Vec<SourceDefinition>,
}

impl CatalogDefinition {
    /// Find a source by name
    pub fn source(&self, name: &str) -> Result<&SourceDefinition> {
        self.sources
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::source_not_found(name))
    }

    /// All source names
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name.as_str()).collect()
    }
}

// ============================================================================
// Source Definition
// ============================================================================

/// One endpoint of a catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceDefinition {
    /// Source name
    pub name: String,
    /// Human readable description
    #[serde(default)]
    pub description: Option<String>,
    /// URL path relative to the base URL (template)
    pub path: String,
    /// Query parameters (templates)
    #[serde(default)]
    pub params: StringMap,
    /// Where the record list lives in a page (empty = the page itself)
    #[serde(default)]
    pub records_path: String,
    /// Continuation convention
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Page size parameter and cap
    #[serde(default)]
    pub page_size: Option<PageSizeConfig>,
    /// Parameter expressing traversal order
    #[serde(default)]
    pub order: Option<OrderDefinition>,
    /// Partial-tree layout; makes this a deferred-expansion source
    #[serde(default)]
    pub tree: Option<TreeConfig>,
    /// Sources reachable from each record of this one
    #[serde(default)]
    pub children: Vec<ChildDefinition>,
}

impl SourceDefinition {
    /// Find a child by name
    pub fn child(&self, name: &str) -> Result<&ChildDefinition> {
        self.children.iter().find(|c| c.name == name).ok_or_else(|| {
            Error::config(format!(
                "Source '{}' has no child '{}'",
                self.name, name
            ))
        })
    }

    /// Is this a deferred-expansion source?
    pub fn is_tree(&self) -> bool {
        self.tree.is_some()
    }
}

/// Order parameter values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDefinition {
    /// Query parameter name
    pub param: String,
    /// Value for natural order
    pub natural: String,
    /// Value for reverse order
    pub reverse: String,
}

/// Link from a parent source to a child source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildDefinition {
    /// Name used in traversal paths
    pub name: String,
    /// Path of the parent field passed as the child's locator
    #[serde(default = "default_child_key")]
    pub key: String,
    /// Source the child records come from
    pub source: String,
}

fn default_child_key() -> String {
    "id".to_string()
}
