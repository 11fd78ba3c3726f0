//! Tree adapters
//!
//! A [`TreeAdapter`] knows the shape of a partial-tree source: where the
//! nodes are, which nodes are placeholders, and how to ask for the subtree
//! a placeholder stands for.

use crate::http::PageRequest;
use crate::types::{lookup, lookup_string, Record, StringMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder for an omitted subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stub {
    /// Id of the node the omitted children hang from
    pub parent: String,
    /// Ids of the omitted children
    pub children: Vec<String>,
}

impl Stub {
    /// Create a stub
    pub fn new(parent: impl Into<String>, children: Vec<String>) -> Self {
        Self {
            parent: parent.into(),
            children,
        }
    }

    /// Identity used to expand each stub only once
    pub fn identity(&self) -> Vec<String> {
        let mut ids = self.children.clone();
        ids.sort();
        ids
    }

    /// Split into stubs of at most `size` children
    pub fn chunks(&self, size: usize) -> Vec<Stub> {
        self.children
            .chunks(size.max(1))
            .map(|chunk| Stub::new(self.parent.clone(), chunk.to_vec()))
            .collect()
    }
}

/// One classified node of a page
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A real record, with its nested children detached
    Record {
        /// The record without its nested children
        record: Record,
        /// Nested child nodes, in order
        children: Vec<Value>,
    },
    /// A placeholder to expand
    Stub(Stub),
    /// Nothing to yield or expand
    Empty,
}

/// Shape of a partial-tree source
pub trait TreeAdapter: Send + Sync {
    /// Request for the root page
    fn root_request(&self) -> PageRequest;

    /// Name of the traversal root, from the root page
    fn root_name(&self, body: &Value) -> Option<String>;

    /// Top-level nodes of the root page
    fn root_nodes(&self, body: &Value) -> Vec<Value>;

    /// Request expanding a stub against the root
    fn expand_request(&self, root: &str, stub: &Stub) -> PageRequest;

    /// Nodes returned by an expansion
    fn expansion_nodes(&self, body: &Value) -> Vec<Value>;

    /// Classify one node
    fn classify(&self, node: Value) -> Node;
}

/// Layout of a reddit-style listing tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Path of the root name in the root page
    pub root_name_path: String,
    /// Path of the top-level nodes in the root page
    pub nodes_path: String,
    /// Field holding the node kind
    pub kind_field: String,
    /// Field holding the node payload
    pub data_field: String,
    /// Kind marking a placeholder
    pub stub_kind: String,
    /// Payload field of a placeholder's parent id
    pub parent_field: String,
    /// Payload field of a placeholder's child ids
    pub children_field: String,
    /// Payload field holding nested replies
    pub replies_field: String,
    /// Path of the reply nodes inside the replies field
    pub replies_path: String,
    /// Path of the expansion endpoint
    pub expand_path: String,
    /// Fixed parameters of expansion requests
    pub expand_params: StringMap,
    /// Parameter carrying the comma-joined child ids
    pub children_param: String,
    /// Parameter carrying the root name
    pub root_param: String,
    /// Path of the nodes in an expansion response
    pub expand_nodes_path: String,
    /// Largest number of children per expansion request
    pub chunk_size: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            root_name_path: "0.data.children.0.data.name".to_string(),
            nodes_path: "1.data.children".to_string(),
            kind_field: "kind".to_string(),
            data_field: "data".to_string(),
            stub_kind: "more".to_string(),
            parent_field: "parent_id".to_string(),
            children_field: "children".to_string(),
            replies_field: "replies".to_string(),
            replies_path: "data.children".to_string(),
            expand_path: "api/morechildren".to_string(),
            expand_params: StringMap::from([("api_type".to_string(), "json".to_string())]),
            children_param: "children".to_string(),
            root_param: "link_id".to_string(),
            expand_nodes_path: "json.data.things".to_string(),
            chunk_size: 20,
        }
    }
}

/// Data-driven adapter for `kind`/`data` listings with `more` placeholders
#[derive(Debug, Clone)]
pub struct ListingTree {
    config: TreeConfig,
    root: PageRequest,
    expand: PageRequest,
}

impl ListingTree {
    /// Create an adapter for a root request
    ///
    /// Expansion requests carry the root request's headers.
    pub fn new(config: TreeConfig, root: PageRequest) -> Self {
        let mut expand =
            PageRequest::new(config.expand_path.clone()).with_params(&config.expand_params);
        expand.headers = root.headers.clone();
        Self {
            config,
            root,
            expand,
        }
    }

    /// Add parameters every expansion request carries (credentials)
    pub fn shared_params(mut self, params: &StringMap) -> Self {
        self.expand = self.expand.with_params(params);
        self
    }

    /// The layout
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    fn nodes_at(body: &Value, path: &str) -> Vec<Value> {
        lookup(body, path)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }
}

impl TreeAdapter for ListingTree {
    fn root_request(&self) -> PageRequest {
        self.root.clone()
    }

    fn root_name(&self, body: &Value) -> Option<String> {
        lookup_string(body, &self.config.root_name_path)
    }

    fn root_nodes(&self, body: &Value) -> Vec<Value> {
        Self::nodes_at(body, &self.config.nodes_path)
    }

    fn expand_request(&self, root: &str, stub: &Stub) -> PageRequest {
        self.expand
            .clone()
            .query(&self.config.children_param, stub.children.join(","))
            .query(&self.config.root_param, root)
    }

    fn expansion_nodes(&self, body: &Value) -> Vec<Value> {
        Self::nodes_at(body, &self.config.expand_nodes_path)
    }

    fn classify(&self, mut node: Value) -> Node {
        let kind = node.get(&self.config.kind_field).and_then(Value::as_str);

        if kind == Some(self.config.stub_kind.as_str()) {
            let Some(data) = node.get(&self.config.data_field) else {
                return Node::Empty;
            };
            let children: Vec<String> = data
                .get(&self.config.children_field)
                .and_then(Value::as_array)
                .map(|ids| ids.iter().filter_map(|id| id.as_str().map(String::from)).collect())
                .unwrap_or_default();
            if children.is_empty() {
                return Node::Empty;
            }
            let parent = lookup_string(data, &self.config.parent_field).unwrap_or_default();
            return Node::Stub(Stub::new(parent, children));
        }

        // Replies are detached so every record is yielded flat
        let replies = node
            .get_mut(&self.config.data_field)
            .and_then(Value::as_object_mut)
            .and_then(|data| data.remove(&self.config.replies_field));
        let children = replies
            .map(|replies| Self::nodes_at(&replies, &self.config.replies_path))
            .unwrap_or_default();

        Node::Record {
            record: node,
            children,
        }
    }
}
