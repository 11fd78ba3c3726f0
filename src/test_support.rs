//! Scripted transports for unit tests

use crate::error::{Error, Result};
use crate::http::{ExecutorConfig, PageRequest, RetryingExecutor, Transport};
use crate::types::BackoffType;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = Box<dyn Fn(&PageRequest) -> Result<Value> + Send + Sync>;

/// Transport answering from a closure and recording every request
pub struct MockTransport {
    responder: Responder,
    requests: Mutex<Vec<PageRequest>>,
}

impl MockTransport {
    /// Answer every request with the closure
    pub fn new(responder: impl Fn(&PageRequest) -> Result<Value> + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer requests with the given results in order, then with 500s
    pub fn sequence(responses: Vec<Result<Value>>) -> Self {
        let queue = Mutex::new(VecDeque::from(responses));
        Self::new(move |_| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::http_status(500, "script exhausted")))
        })
    }

    /// Fail the first `failures` calls with a 503, then answer with `body`
    pub fn flaky(failures: usize, body: Value) -> Self {
        let calls = AtomicUsize::new(0);
        Self::new(move |_| {
            if calls.fetch_add(1, Ordering::SeqCst) < failures {
                Err(Error::http_status(503, "unavailable"))
            } else {
                Ok(body.clone())
            }
        })
    }

    /// Every request recorded so far
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests recorded so far
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, request: &PageRequest) -> Result<Value> {
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(request)
    }
}

/// Executor config with millisecond backoff so tests stay fast
pub fn fast_config(num_retries: u32) -> ExecutorConfig {
    ExecutorConfig::builder()
        .num_retries(num_retries)
        .retry_rate(Duration::from_millis(1))
        .backoff(BackoffType::Linear, Duration::from_millis(10))
        .build()
}

/// Shared executor over a mock transport
pub fn executor(transport: &Arc<MockTransport>, num_retries: u32) -> Arc<RetryingExecutor> {
    let transport: Arc<dyn Transport> = transport.clone();
    Arc::new(RetryingExecutor::with_config(
        transport,
        fast_config(num_retries),
    ))
}
