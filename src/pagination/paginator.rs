//! The source paginator
//!
//! Owns one endpoint's traversal: continuation state, the current page
//! buffer, counters and pacing. Pages are fetched lazily, one at a time.

use super::types::{extract_records, ContinuationState, NextPage, PaginationStrategy};
use crate::error::Result;
use crate::http::{PageRequest, RequestPacer, RetryingExecutor};
use crate::stream::RecordStream;
use crate::types::Record;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lifecycle of a paginator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginatorState {
    /// Nothing fetched yet
    Fresh,
    /// A page is buffered and more may follow
    HasBuffer,
    /// The source has no more pages; the buffer may still hold records
    Exhausted,
    /// A fetch failed; the paginator yields nothing more
    Failed,
}

/// Read position and counters of one traversal
#[derive(Debug, Clone, Default)]
pub struct IterationCursor {
    buffer: Vec<Record>,
    read: usize,
    yielded: usize,
    maximum: usize,
    pages: usize,
}

impl IterationCursor {
    /// Create a cursor; `maximum` 0 means unbounded
    pub fn new(maximum: usize) -> Self {
        Self {
            maximum,
            ..Self::default()
        }
    }

    /// Has the record budget been spent?
    pub fn is_full(&self) -> bool {
        self.maximum > 0 && self.yielded >= self.maximum
    }

    /// Records left in the buffer
    pub fn buffered(&self) -> usize {
        self.buffer.len() - self.read
    }

    /// Take the next buffered record
    fn take(&mut self) -> Option<Record> {
        let record = self.buffer.get_mut(self.read).map(std::mem::take)?;
        self.read += 1;
        self.yielded += 1;
        Some(record)
    }

    /// Replace the buffer with a freshly fetched page
    fn refill(&mut self, records: Vec<Record>) {
        self.buffer = records;
        self.read = 0;
        self.pages += 1;
    }

    /// Drop the buffered page without yielding it
    fn discard(&mut self) {
        self.buffer.clear();
        self.read = 0;
    }
}

/// Lazily walks the pages of one endpoint
pub struct SourcePaginator {
    executor: Arc<RetryingExecutor>,
    request: PageRequest,
    records_path: String,
    strategy: Box<dyn PaginationStrategy>,
    continuation: ContinuationState,
    cursor: IterationCursor,
    pacer: RequestPacer,
    state: PaginatorState,
}

impl SourcePaginator {
    /// Create a paginator for a request
    pub fn new(
        executor: Arc<RetryingExecutor>,
        request: PageRequest,
        strategy: Box<dyn PaginationStrategy>,
    ) -> Self {
        Self {
            executor,
            request,
            records_path: String::new(),
            strategy,
            continuation: ContinuationState::new(),
            cursor: IterationCursor::new(0),
            pacer: RequestPacer::unlimited(),
            state: PaginatorState::Fresh,
        }
    }

    /// Set where the record list lives in each page
    pub fn records_path(mut self, path: impl Into<String>) -> Self {
        self.records_path = path.into();
        self
    }

    /// Stop after this many records (0 = unbounded)
    pub fn max_count(mut self, count: usize) -> Self {
        self.cursor.maximum = count;
        self
    }

    /// Pace page requests
    pub fn pacer(mut self, pacer: RequestPacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> PaginatorState {
        self.state
    }

    /// Pages fetched so far
    pub fn page_count(&self) -> usize {
        self.cursor.pages
    }

    /// Records yielded so far
    pub fn total_yielded(&self) -> usize {
        self.cursor.yielded
    }

    /// Pages with no unread records left in the buffer
    pub fn pages_done(&self) -> usize {
        if self.cursor.buffered() > 0 {
            self.cursor.pages - 1
        } else {
            self.cursor.pages
        }
    }

    /// The continuation parameters for the next page
    pub fn continuation(&self) -> &ContinuationState {
        &self.continuation
    }

    /// Skip the first `pages` pages without yielding their records
    ///
    /// Counts toward [`page_count`](Self::page_count) but not
    /// [`total_yielded`](Self::total_yielded).
    pub async fn jump(&mut self, pages: usize) -> Result<()> {
        for _ in 0..pages {
            if matches!(self.state, PaginatorState::Exhausted | PaginatorState::Failed) {
                break;
            }
            self.fetch_page().await?;
            self.cursor.discard();
        }
        debug!(
            "Skipped {} pages of {}",
            self.cursor.pages,
            self.request.display_url()
        );
        Ok(())
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let request = self.request.clone().with_params(&self.continuation.params);
        self.pacer.wait().await;

        let body = match self.executor.fetch(&request).await {
            Ok(body) => body,
            Err(e) => {
                self.state = PaginatorState::Failed;
                return Err(e);
            }
        };

        let records = extract_records(&body, &self.records_path);
        let next = self
            .strategy
            .next_page(&body, &records, &mut self.continuation);

        let more = match next {
            NextPage::Continue { query_params } => {
                if self.continuation.would_repeat(&query_params) {
                    warn!(
                        "Continuation did not advance, stopping: {}",
                        request.display_url()
                    );
                    self.continuation.mark_done();
                    false
                } else {
                    self.continuation.apply(query_params);
                    true
                }
            }
            NextPage::Done => false,
        };
        self.continuation.fetched_first = true;

        debug!(
            "Fetched page {} ({} records): {}",
            self.cursor.pages + 1,
            records.len(),
            request.display_url()
        );

        self.cursor.refill(records);
        self.state = if more {
            PaginatorState::HasBuffer
        } else {
            PaginatorState::Exhausted
        };
        Ok(())
    }
}

#[async_trait]
impl RecordStream for SourcePaginator {
    async fn next(&mut self) -> Result<Option<Record>> {
        loop {
            if self.cursor.is_full() {
                return Ok(None);
            }
            if let Some(record) = self.cursor.take() {
                return Ok(Some(record));
            }
            match self.state {
                PaginatorState::Fresh | PaginatorState::HasBuffer => self.fetch_page().await?,
                PaginatorState::Exhausted | PaginatorState::Failed => return Ok(None),
            }
        }
    }

    fn pages_fetched(&self) -> usize {
        self.cursor.pages
    }

    fn pages_consumed(&self) -> usize {
        self.pages_done()
    }
}

impl std::fmt::Debug for SourcePaginator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourcePaginator")
            .field("url", &self.request.display_url())
            .field("strategy", &self.strategy)
            .field("state", &self.state)
            .field("pages", &self.cursor.pages)
            .field("yielded", &self.cursor.yielded)
            .finish_non_exhaustive()
    }
}
