//! Chained iteration
//!
//! Flat-maps an outer record stream into inner streams built from a key of
//! each outer record: `I(o1) ++ I(o2) ++ ...`, depth first. At most one outer
//! record and one inner stream are alive at a time.

use crate::config::IterateConfig;
use crate::error::Result;
use crate::stream::{BoxedRecordStream, RecordStream};
use crate::types::{lookup_string, Record};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

/// Field used to tag child records with their parent key
pub const DEFAULT_PARENT_FIELD: &str = "parent_key";

/// Builds the inner stream for one parent key
pub type StreamFactory<A> = Box<dyn Fn(&str, &A) -> Result<BoxedRecordStream> + Send + Sync>;

/// Flat-map combinator over parent records
pub struct ChainedIterator<A> {
    outer: BoxedRecordStream,
    key: String,
    factory: StreamFactory<A>,
    inner_args: A,
    /// Current parent key and its stream; `None` means the outer must advance
    inner: Option<(String, BoxedRecordStream)>,
    /// A parent was pulled and its children are not finished yet
    parent_open: bool,
    skip_inner_errors: bool,
    tag_parent: bool,
    parent_field: String,
    maximum: usize,
    yielded: usize,
}

impl<A: Send> ChainedIterator<A> {
    /// Create a chain over `outer`, keyed by the dotted path `key`
    pub fn new(
        outer: BoxedRecordStream,
        key: impl Into<String>,
        factory: StreamFactory<A>,
        inner_args: A,
    ) -> Self {
        Self {
            outer,
            key: key.into(),
            factory,
            inner_args,
            inner: None,
            parent_open: false,
            skip_inner_errors: false,
            tag_parent: false,
            parent_field: DEFAULT_PARENT_FIELD.to_string(),
            maximum: 0,
            yielded: 0,
        }
    }

    /// Apply the chain-related options of an iteration config
    pub fn configure(self, config: &IterateConfig) -> Self {
        self.skip_inner_errors(config.skip_inner_errors)
            .tag_parent(config.tag_parent)
            .max_count(config.count)
    }

    /// Treat a recoverable inner failure as the end of that inner stream
    pub fn skip_inner_errors(mut self, skip: bool) -> Self {
        self.skip_inner_errors = skip;
        self
    }

    /// Attach the parent key to every child record
    pub fn tag_parent(mut self, tag: bool) -> Self {
        self.tag_parent = tag;
        self
    }

    /// Field the parent key is written to
    pub fn parent_field(mut self, field: impl Into<String>) -> Self {
        self.parent_field = field.into();
        self
    }

    /// Stop after this many records (0 = unbounded)
    pub fn max_count(mut self, count: usize) -> Self {
        self.maximum = count;
        self
    }

    /// Records yielded so far
    pub fn total_yielded(&self) -> usize {
        self.yielded
    }
}

#[async_trait]
impl<A: Send> RecordStream for ChainedIterator<A> {
    async fn next(&mut self) -> Result<Option<Record>> {
        if self.maximum > 0 && self.yielded >= self.maximum {
            return Ok(None);
        }

        loop {
            if self.inner.is_none() {
                let Some(parent) = self.outer.next().await? else {
                    return Ok(None);
                };
                let Some(key) = lookup_string(&parent, &self.key) else {
                    warn!("Parent record has no '{}', skipping it", self.key);
                    continue;
                };
                debug!("Opening child stream for {}", key);
                self.parent_open = true;
                let stream = (self.factory)(&key, &self.inner_args)?;
                self.inner = Some((key, stream));
            }
            let Some((key, inner)) = self.inner.as_mut() else {
                continue;
            };

            match inner.next().await {
                Ok(Some(mut record)) => {
                    if self.tag_parent {
                        // Nested chains tag first, so the nearest parent wins
                        if let Value::Object(map) = &mut record {
                            map.entry(self.parent_field.clone())
                                .or_insert_with(|| Value::String(key.clone()));
                        }
                    }
                    self.yielded += 1;
                    return Ok(Some(record));
                }
                Ok(None) => {
                    self.inner = None;
                    self.parent_open = false;
                }
                Err(e) if self.skip_inner_errors && e.is_recoverable() => {
                    warn!("Skipping child stream of {}: {}", key, e);
                    self.inner = None;
                    self.parent_open = false;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn pages_fetched(&self) -> usize {
        self.outer.pages_fetched()
    }

    fn pages_consumed(&self) -> usize {
        if self.parent_open {
            // The open parent came from the latest outer page
            self.outer.pages_fetched().saturating_sub(1)
        } else {
            self.outer.pages_consumed()
        }
    }
}

impl<A> std::fmt::Debug for ChainedIterator<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainedIterator")
            .field("key", &self.key)
            .field("current_parent", &self.inner.as_ref().map(|(key, _)| key))
            .field("yielded", &self.yielded)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
