//! Ordered buffer of network exchanges observed in a browser session.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// One observed request; `status_code` stays `None` until (unless) a response arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRequest {
    pub method: String,
    pub url: String,
    pub status_code: Option<u16>,
}

impl CapturedRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            status_code,
        }
    }
}

/// `METHOD URL -> STATUS` or `METHOD URL -> NO_RESP`.
impl fmt::Display for CapturedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} {} -> {}", self.method, self.url, code),
            None => write!(f, "{} {} -> NO_RESP", self.method, self.url),
        }
    }
}

/// Requests in arrival order, plus an index from protocol request id to the
/// latest entry carrying that id (redirects reuse the id).
#[derive(Debug, Default)]
pub struct CaptureLog {
    entries: Vec<CapturedRequest>,
    by_id: HashMap<String, usize>,
}

impl CaptureLog {
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_id.clear();
    }

    /// Records a new outgoing request. `redirect_status` is the status of the
    /// redirect response that produced it, and completes the previous entry
    /// with the same id.
    pub fn on_request(&mut self, id: &str, method: &str, url: &str, redirect_status: Option<u16>) {
        if let (Some(status), Some(&prev)) = (redirect_status, self.by_id.get(id)) {
            self.entries[prev].status_code = Some(status);
        }
        self.entries.push(CapturedRequest::new(method, url, None));
        self.by_id.insert(id.to_string(), self.entries.len() - 1);
    }

    /// Completes the latest request with this id; unknown ids are ignored.
    pub fn on_response(&mut self, id: &str, status: u16) {
        if let Some(&idx) = self.by_id.get(id) {
            self.entries[idx].status_code = Some(status);
        }
    }

    pub fn entries(&self) -> &[CapturedRequest] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Capture buffer shared between a session and its protocol event handlers.
#[derive(Debug, Clone, Default)]
pub struct SharedCapture(Arc<Mutex<CaptureLog>>);

impl SharedCapture {
    /// Locks the log; a poisoned lock still yields the data (handlers only append).
    pub fn lock(&self) -> MutexGuard<'_, CaptureLog> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> Vec<CapturedRequest> {
        self.lock().entries().to_vec()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
