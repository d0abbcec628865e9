//! Mock provider for testing
//!
//! Returns scripted responses without making real API calls, and records how
//! many calls were in flight at once so tests can check the concurrency cap.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{InferRequest, Provider};
use crate::error::{BatchError, Result};

type Responder = Arc<dyn Fn(&InferRequest) -> Result<Option<String>> + Send + Sync>;
type Latency = Arc<dyn Fn(&InferRequest) -> Duration + Send + Sync>;

/// Mock provider with configurable responses and latency
pub struct MockProvider {
    responder: Responder,
    latency: Option<Latency>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    /// Track all requests made (for assertions)
    requests: Mutex<Vec<InferRequest>>,
}

impl MockProvider {
    /// Always answers "Mock response"
    pub fn new() -> Self {
        Self::with_response("Mock response")
    }

    /// Always answers `response`
    pub fn with_response(response: impl Into<String>) -> Self {
        let response = response.into();
        Self::from_fn(move |_| Ok(response.clone()))
    }

    /// Answers with the prompt it was given
    pub fn echo() -> Self {
        Self::from_fn(|request| Ok(request.prompt.clone()))
    }

    /// Every call fails with a service error carrying `message`
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_fn(move |_| {
            Err(BatchError::Service {
                status: 500,
                body: message.clone(),
            })
        })
    }

    /// Answers with a message that has no content (`"content": null`)
    pub fn without_content() -> Self {
        Self::from_responder(Arc::new(|_| Ok(None)))
    }

    /// Compute each response (or error) from the request
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&InferRequest) -> Result<String> + Send + Sync + 'static,
    {
        Self::from_responder(Arc::new(move |request| responder(request).map(Some)))
    }

    fn from_responder(responder: Responder) -> Self {
        Self {
            responder,
            latency: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sleep for a fixed duration inside every call
    pub fn with_latency(self, latency: Duration) -> Self {
        self.with_latency_fn(move |_| latency)
    }

    /// Sleep for a per-request duration inside every call
    pub fn with_latency_fn<F>(mut self, latency: F) -> Self
    where
        F: Fn(&InferRequest) -> Duration + Send + Sync + 'static,
    {
        self.latency = Some(Arc::new(latency));
        self
    }

    /// Number of `infer` calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed in flight at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// All requests received, in arrival order
    pub fn requests(&self) -> Vec<InferRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight counter even if the call future is dropped
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn infer(&self, request: &InferRequest) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        match &self.latency {
            Some(latency) => tokio::time::sleep(latency(request)).await,
            None => tokio::task::yield_now().await,
        }

        (self.responder)(request)
    }
}
