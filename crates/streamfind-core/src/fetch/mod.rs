//! Plain HTTP over libcurl.
//!
//! A bounded GET for page and embed bodies and a HEAD check for derived
//! manifest candidates. Every request carries a browser-like header set so
//! trivial bot filters answer the way they would answer a real visitor.
//! All calls block the current thread; call from `spawn_blocking` in async code.

mod get;
mod head;

pub use get::{get_prefix, get_text, Fetched};
pub use head::head_status;

use std::time::Duration;
use thiserror::Error;

/// Cap on the connect phase; the overall timeout still bounds the whole exchange.
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "es-ES,es;q=0.9,en;q=0.8";

/// Per-request settings shared by GET and HEAD.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub user_agent: String,
    pub referer: Option<String>,
    pub timeout: Duration,
}

impl RequestOptions {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            referer: None,
            timeout,
        }
    }

    pub fn with_referer(mut self, referer: Option<&str>) -> Self {
        self.referer = referer.map(String::from);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Failure of a single HTTP exchange.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, timeout, bad URL).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// The timeout was zero before the request could be made.
    #[error("no time left for request")]
    NoTimeLeft,
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        match self {
            FetchError::Curl(e) => e.is_operation_timedout(),
            FetchError::NoTimeLeft => true,
        }
    }
}

/// Header lines sent with every request (User-Agent is set separately).
fn header_lines(opts: &RequestOptions) -> Vec<String> {
    let mut lines = vec![
        format!("Accept: {ACCEPT}"),
        format!("Accept-Language: {ACCEPT_LANGUAGE}"),
    ];
    if let Some(referer) = opts.referer.as_deref().filter(|r| !r.trim().is_empty()) {
        lines.push(format!("Referer: {}", referer.trim()));
    }
    lines
}

/// Builds a configured easy handle: URL, redirects, timeouts, headers, compression.
fn prepare(url: &str, opts: &RequestOptions) -> Result<curl::easy::Easy, FetchError> {
    if opts.timeout.is_zero() {
        return Err(FetchError::NoTimeLeft);
    }
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.timeout.min(MAX_CONNECT_TIMEOUT))?;
    easy.timeout(opts.timeout)?;
    easy.useragent(&opts.user_agent)?;
    // Empty string: accept every encoding libcurl can decode.
    easy.accept_encoding("")?;

    let mut list = curl::easy::List::new();
    for line in header_lines(opts) {
        list.append(&line)?;
    }
    easy.http_headers(list)?;
    Ok(easy)
}
