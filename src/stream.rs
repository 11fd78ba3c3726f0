//! Pull-based record streams
//!
//! Every iterator in the crate (paginator, chain, deferred expansion) yields
//! records through [`RecordStream::next`]:
//! - `Ok(Some(record))`: one more record
//! - `Ok(None)`: the stream ended
//! - `Err(e)`: the stream failed, check [`Error::severity`](crate::Error::severity)

use crate::error::Result;
use crate::types::Record;
use async_trait::async_trait;
use futures::Stream;
use std::collections::VecDeque;

/// A lazily evaluated, finite sequence of records
#[async_trait]
pub trait RecordStream: Send {
    /// Pull the next record
    async fn next(&mut self) -> Result<Option<Record>>;

    /// Pages fetched so far by the outermost paginator, for resuming
    fn pages_fetched(&self) -> usize {
        0
    }

    /// Outer pages whose records and chained children were all consumed
    ///
    /// This is the `resume_pages` value that continues after a failure
    /// without losing records.
    fn pages_consumed(&self) -> usize {
        self.pages_fetched()
    }
}

/// Boxed record stream
pub type BoxedRecordStream = Box<dyn RecordStream>;

#[async_trait]
impl RecordStream for BoxedRecordStream {
    async fn next(&mut self) -> Result<Option<Record>> {
        (**self).next().await
    }

    fn pages_fetched(&self) -> usize {
        (**self).pages_fetched()
    }

    fn pages_consumed(&self) -> usize {
        (**self).pages_consumed()
    }
}

/// A stream over records already in memory (explicit id lists, fixtures)
#[derive(Debug, Clone, Default)]
pub struct RecordList {
    records: VecDeque<Record>,
}

impl RecordList {
    /// Create a stream over the given records
    pub fn new(records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    /// Records not yet pulled
    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl RecordStream for RecordList {
    async fn next(&mut self) -> Result<Option<Record>> {
        Ok(self.records.pop_front())
    }
}

/// Drain a stream into a vector, stopping at the first error
pub async fn collect<S: RecordStream + ?Sized>(stream: &mut S) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    while let Some(record) = stream.next().await? {
        records.push(record);
    }
    Ok(records)
}

/// Adapt a record stream to a [`futures::Stream`]
///
/// The adapted stream ends after yielding the first error.
pub fn into_stream(stream: BoxedRecordStream) -> impl Stream<Item = Result<Record>> + Send {
    futures::stream::unfold(Some(stream), |state| async move {
        let mut stream = state?;
        match stream.next().await {
            Ok(Some(record)) => Some((Ok(record), Some(stream))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    })
}
