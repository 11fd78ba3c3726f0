//! Built-in catalogs embedded in the binary
//!
//! Lets users write `--catalog reddit` instead of a file path.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Built-in catalog YAML definitions
pub static BUILTIN_CATALOGS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut m = HashMap::new();

        m.insert("graph", include_str!("../../sources/graph.yaml"));
        m.insert("facebook", include_str!("../../sources/graph.yaml"));
        m.insert("reddit", include_str!("../../sources/reddit.yaml"));
        m.insert("youtube", include_str!("../../sources/youtube.yaml"));
        m.insert("twitter", include_str!("../../sources/twitter.yaml"));

        m
    });

/// Get a built-in catalog by name
pub fn get_builtin(name: &str) -> Option<&'static str> {
    BUILTIN_CATALOGS.get(name).copied()
}

/// Check if a name is a built-in catalog
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_CATALOGS.contains_key(name)
}

/// List built-in catalog names (primary names only)
pub fn list_builtin() -> Vec<&'static str> {
    list_builtin_info().iter().map(|info| info.name).collect()
}

/// Catalog metadata for display
#[derive(Debug, Clone)]
pub struct CatalogInfo {
    /// Primary name
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Other names accepted for this catalog
    pub aliases: &'static [&'static str],
    /// Credentials the catalog's templates expect (`auth.<name>`)
    pub auth: &'static [&'static str],
}

/// Get detailed info about all built-in catalogs
pub fn list_builtin_info() -> Vec<CatalogInfo> {
    vec![
        CatalogInfo {
            name: "graph",
            description: "Facebook Graph API pages, posts, comments and reactions",
            aliases: &["facebook"],
            auth: &["access_token"],
        },
        CatalogInfo {
            name: "reddit",
            description: "Reddit listings, searches and full comment trees",
            aliases: &[],
            auth: &["access_token"],
        },
        CatalogInfo {
            name: "youtube",
            description: "YouTube searches, channels, videos and comment threads",
            aliases: &[],
            auth: &["api_key"],
        },
        CatalogInfo {
            name: "twitter",
            description: "Twitter searches and user timelines",
            aliases: &[],
            auth: &["bearer_token"],
        },
    ]
}
