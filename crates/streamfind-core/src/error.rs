//! Resolution error taxonomy and per-step probe results.

use std::fmt;
use thiserror::Error;

/// Pipeline stage a resolution was in; used in logs and timeout errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchingPage,
    LocatingEmbed,
    StaticScan,
    TrafficSniff,
    FormatReconcile,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::FetchingPage => "fetching page",
            Stage::LocatingEmbed => "locating embed",
            Stage::StaticScan => "static scan",
            Stage::TrafficSniff => "traffic sniff",
            Stage::FormatReconcile => "format reconcile",
        };
        f.write_str(name)
    }
}

/// Terminal failure of one resolution. Every non-success outcome carries one.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Landing page could not be fetched (DNS, connect, timeout, HTTP error status).
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    /// Landing page had no usable iframe/frame.
    #[error("no embedded frame found")]
    NoEmbedFound,

    /// Neither the static scan nor the traffic sniff produced a manifest URL.
    #[error("no stream manifest found")]
    NoStreamFound,

    /// Browser session could not be started or crashed irrecoverably.
    #[error("browser session failed: {0}")]
    Browser(String),

    /// The resolution budget ran out (or the run was aborted) before a result.
    #[error("resolution abandoned during {stage}")]
    TimedOut { stage: Stage },
}

impl ResolveError {
    /// Short machine-friendly label for each failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::Network { .. } => "network",
            ResolveError::NoEmbedFound => "no-embed",
            ResolveError::NoStreamFound => "no-stream",
            ResolveError::Browser(_) => "browser",
            ResolveError::TimedOut { .. } => "timed-out",
        }
    }
}

/// Result of one best-effort step.
///
/// Keeps "nothing there" apart from "the probe itself broke" so the latter can
/// be logged, while callers that only care about a hit treat both as a miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    Found(T),
    NotFound,
    Failed(String),
}

impl<T> Probe<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Probe::Found(v) => Some(v),
            Probe::NotFound | Probe::Failed(_) => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Probe<U> {
        match self {
            Probe::Found(v) => Probe::Found(f(v)),
            Probe::NotFound => Probe::NotFound,
            Probe::Failed(reason) => Probe::Failed(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct() {
        let errors = [
            ResolveError::Network {
                url: "https://x".into(),
                reason: "timeout".into(),
            },
            ResolveError::NoEmbedFound,
            ResolveError::NoStreamFound,
            ResolveError::Browser("launch".into()),
            ResolveError::TimedOut {
                stage: Stage::TrafficSniff,
            },
        ];
        let mut kinds: Vec<_> = errors.iter().map(|e| e.kind()).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn timed_out_names_stage() {
        let e = ResolveError::TimedOut {
            stage: Stage::StaticScan,
        };
        assert_eq!(e.to_string(), "resolution abandoned during static scan");
    }

    #[test]
    fn probe_found_and_map() {
        assert_eq!(Probe::Found(2).map(|v| v * 2).found(), Some(4));
        assert_eq!(Probe::<u8>::NotFound.found(), None);
        assert_eq!(Probe::<u8>::Failed("boom".into()).map(|v| v + 1).found(), None);
    }
}
