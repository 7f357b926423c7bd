//! What the server has seen.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

/// The request line and headers of a request the server received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Path and query.
    pub path: String,
    /// Headers, names lowercased.
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Returns the header value, looked up case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Server-side record shared with the bridge.
#[derive(Debug)]
pub struct ExchangeLog {
    last: Mutex<Option<RecordedRequest>>,
    count: AtomicUsize,
    open: AtomicBool,
}

impl Default for ExchangeLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeLog {
    /// Creates an empty, open log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: Mutex::new(None),
            count: AtomicUsize::new(0),
            open: AtomicBool::new(true),
        }
    }

    fn last(&self) -> MutexGuard<'_, Option<RecordedRequest>> {
        self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a received request.
    pub fn record(&self, request: RecordedRequest) {
        self.count.fetch_add(1, Ordering::SeqCst);
        *self.last() = Some(request);
    }

    /// Returns the last request received since the previous reset.
    #[must_use]
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.last().clone()
    }

    /// Returns how many requests the server has received in total.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Forgets the last request.
    pub fn reset(&self) {
        *self.last() = None;
    }

    /// Marks the server as shut down.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Returns whether the server still accepts requests.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Middleware that records every request before it reaches the handler.
pub(crate) async fn record_request(
    State(log): State<Arc<ExchangeLog>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_string(), ToString::to_string);
    let headers = request
        .headers()
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                String::from_utf8_lossy(v.as_bytes()).into_owned(),
            )
        })
        .collect();

    log.record(RecordedRequest {
        method: request.method().as_str().to_string(),
        path,
        headers,
    });
    next.run(request).await
}
