//! Common types used throughout pagereaper
//!
//! This module contains shared type definitions, type aliases,
//! and the dotted-path helpers used to look into records and pages.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// A single record returned by a source
pub type Record = Value;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

// ============================================================================
// Backoff Type
// ============================================================================

/// Backoff strategy between retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Delay grows with the attempt number (`attempt * base`)
    #[default]
    Linear,
    /// Delay doubles each attempt
    Exponential,
}

// ============================================================================
// Path Lookup
// ============================================================================

/// Look up a dotted path (`paging.cursors.after`, `data.0.id`) in a JSON value.
///
/// A leading `$.` is ignored. Numeric segments index into arrays. An empty
/// path returns the value itself.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() {
        return Some(value);
    }

    // Flattened records may carry the full dotted key directly
    if let Some(found) = value.as_object().and_then(|map| map.get(path)) {
        return Some(found);
    }

    let mut current = value;
    for part in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Look up a dotted path and render a scalar as a string.
///
/// Null, arrays and objects give `None`, as do empty strings.
pub fn lookup_string(value: &Value, path: &str) -> Option<String> {
    scalar_to_string(lookup(value, path)?)
}

/// Render a scalar JSON value as a string
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
