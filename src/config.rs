//! Iteration configuration
//!
//! The options a caller passes when asking for a record sequence.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Traversal direction for sources that support it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    /// The source's default order
    #[default]
    Natural,
    /// Walk the source backwards (`previous` links, `before` cursors)
    Reverse,
}

impl FromStr for Order {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "natural" | "forward" => Ok(Self::Natural),
            "reverse" | "backward" => Ok(Self::Reverse),
            other => Err(crate::Error::invalid_value(
                "order",
                format!("expected 'natural' or 'reverse', got '{other}'"),
            )),
        }
    }
}

/// Options recognised by every record sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterateConfig {
    /// Maximum records to yield (0 = until the source ends)
    pub count: usize,
    /// Traversal direction
    pub order: Order,
    /// Requested page size (0 = source maximum), clamped to the source cap
    pub page_size: u32,
    /// Skip a failed child branch instead of aborting the traversal
    pub skip_inner_errors: bool,
    /// Attach the parent key to every child record
    pub tag_parent: bool,
    /// Pages of the outermost source to skip before yielding
    pub resume_pages: usize,
}

impl Default for IterateConfig {
    fn default() -> Self {
        Self {
            count: 0,
            order: Order::Natural,
            page_size: 0,
            skip_inner_errors: false,
            tag_parent: false,
            resume_pages: 0,
        }
    }
}

impl IterateConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum record count
    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Set the traversal order
    #[must_use]
    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Set the requested page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Skip failed child branches
    #[must_use]
    pub fn with_skip_inner_errors(mut self, skip: bool) -> Self {
        self.skip_inner_errors = skip;
        self
    }

    /// Tag child records with their parent key
    #[must_use]
    pub fn with_tag_parent(mut self, tag: bool) -> Self {
        self.tag_parent = tag;
        self
    }

    /// Skip pages already consumed by an earlier run
    #[must_use]
    pub fn with_resume_pages(mut self, pages: usize) -> Self {
        self.resume_pages = pages;
        self
    }

    /// The same options for a nested level: no resume, no count bound
    pub fn for_child(&self) -> Self {
        Self {
            count: 0,
            resume_pages: 0,
            ..self.clone()
        }
    }
}
