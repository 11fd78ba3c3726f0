//! Deferred-expansion traversal
//!
//! Level 0 fetches the root page and walks it. Level 1 pops one queued stub
//! at a time, expands it against the root and walks the result. Stubs whose
//! parent is not the root cannot be expanded later, so they are expanded
//! while walking.

use super::tree::{Node, Stub, TreeAdapter};
use crate::config::IterateConfig;
use crate::error::{Error, Result};
use crate::http::{RequestPacer, RetryingExecutor};
use crate::stream::RecordStream;
use crate::types::Record;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default number of children per expansion request
pub const DEFAULT_CHUNK_SIZE: usize = 20;

/// Where a traversal is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionPhase {
    /// Root page not fetched yet
    Root,
    /// Expanding queued stubs
    Expanding,
    /// Queue empty; the buffer may still hold records
    Exhausted,
    /// An error was returned; nothing more is yielded
    Failed,
}

/// Yields every record of a partial tree, expanding placeholders
pub struct DeferredExpansion<A> {
    adapter: A,
    executor: Arc<RetryingExecutor>,
    pacer: RequestPacer,
    phase: ExpansionPhase,
    root: String,
    buffer: VecDeque<Record>,
    queue: VecDeque<Stub>,
    expanded: HashSet<Vec<String>>,
    chunk_size: usize,
    skip_inner_errors: bool,
    maximum: usize,
    yielded: usize,
    requests: usize,
}

impl<A: TreeAdapter> DeferredExpansion<A> {
    /// Create a traversal
    pub fn new(adapter: A, executor: Arc<RetryingExecutor>) -> Self {
        Self {
            adapter,
            executor,
            pacer: RequestPacer::unlimited(),
            phase: ExpansionPhase::Root,
            root: String::new(),
            buffer: VecDeque::new(),
            queue: VecDeque::new(),
            expanded: HashSet::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            skip_inner_errors: false,
            maximum: 0,
            yielded: 0,
            requests: 0,
        }
    }

    /// Apply count and skip options
    pub fn configure(self, config: &IterateConfig) -> Self {
        self.max_count(config.count)
            .skip_inner_errors(config.skip_inner_errors)
    }

    /// Pace requests
    pub fn pacer(mut self, pacer: RequestPacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// Children per expansion request
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Skip a stub whose expansion fails recoverably
    pub fn skip_inner_errors(mut self, skip: bool) -> Self {
        self.skip_inner_errors = skip;
        self
    }

    /// Stop after this many records (0 = unbounded)
    pub fn max_count(mut self, count: usize) -> Self {
        self.maximum = count;
        self
    }

    /// Current phase
    pub fn phase(&self) -> ExpansionPhase {
        self.phase
    }

    /// Stubs waiting for expansion
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Requests issued so far, root included
    pub fn request_count(&self) -> usize {
        self.requests
    }

    async fn fetch_root(&mut self) -> Result<()> {
        let request = self.adapter.root_request();
        self.pacer.wait().await;
        self.requests += 1;
        let body = self.executor.fetch(&request).await?;

        self.root = self.adapter.root_name(&body).ok_or_else(|| {
            Error::fatal(Error::extraction(
                request.url.clone(),
                "root page does not name its root",
            ))
        })?;
        debug!("Walking tree of {}", self.root);

        let nodes = self.adapter.root_nodes(&body);
        self.walk(nodes).await
    }

    async fn expand_next(&mut self) -> Result<()> {
        let Some(stub) = self.queue.pop_front() else {
            self.phase = ExpansionPhase::Exhausted;
            return Ok(());
        };
        if let Some(nodes) = self.expand(&stub).await? {
            self.walk(nodes).await?;
        }
        Ok(())
    }

    /// Fetch a stub's subtree. `None` when the failure was skipped.
    async fn expand(&mut self, stub: &Stub) -> Result<Option<Vec<Value>>> {
        let request = self.adapter.expand_request(&self.root, stub);
        self.pacer.wait().await;
        self.requests += 1;

        match self.executor.fetch(&request).await {
            Ok(body) => Ok(Some(self.adapter.expansion_nodes(&body))),
            Err(e) if self.skip_inner_errors && e.is_recoverable() => {
                warn!(
                    "Skipping {} children of {}: {}",
                    stub.children.len(),
                    stub.parent,
                    e
                );
                Ok(None)
            }
            Err(e) => Err(Error::fatal(e)),
        }
    }

    /// Classify nodes depth first: buffer records, queue root stubs, expand
    /// the others in place
    async fn walk(&mut self, nodes: Vec<Value>) -> Result<()> {
        let mut pending: Vec<Value> = nodes.into_iter().rev().collect();

        while let Some(node) = pending.pop() {
            match self.adapter.classify(node) {
                Node::Record { record, children } => {
                    self.buffer.push_back(record);
                    pending.extend(children.into_iter().rev());
                }
                Node::Stub(stub) => {
                    for chunk in stub.chunks(self.chunk_size) {
                        if !self.expanded.insert(chunk.identity()) {
                            continue;
                        }
                        if chunk.parent == self.root {
                            self.queue.push_back(chunk);
                        } else if let Some(nodes) = self.expand(&chunk).await? {
                            pending.extend(nodes.into_iter().rev());
                        }
                    }
                }
                Node::Empty => {}
            }
        }

        Ok(())
    }
}

#[async_trait]
impl<A: TreeAdapter> RecordStream for DeferredExpansion<A> {
    async fn next(&mut self) -> Result<Option<Record>> {
        loop {
            if self.maximum > 0 && self.yielded >= self.maximum {
                return Ok(None);
            }
            if let Some(record) = self.buffer.pop_front() {
                self.yielded += 1;
                return Ok(Some(record));
            }

            let step = match self.phase {
                ExpansionPhase::Root => {
                    let fetched = self.fetch_root().await;
                    if fetched.is_ok() {
                        self.phase = ExpansionPhase::Expanding;
                    }
                    fetched
                }
                ExpansionPhase::Expanding => self.expand_next().await,
                ExpansionPhase::Exhausted | ExpansionPhase::Failed => return Ok(None),
            };

            if let Err(e) = step {
                self.phase = ExpansionPhase::Failed;
                self.buffer.clear();
                return Err(e);
            }
        }
    }
}

impl<A> std::fmt::Debug for DeferredExpansion<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredExpansion")
            .field("root", &self.root)
            .field("phase", &self.phase)
            .field("buffered", &self.buffer.len())
            .field("queued", &self.queue.len())
            .field("yielded", &self.yielded)
            .finish_non_exhaustive()
    }
}
