//! Resolution orchestrator: landing page in, playable manifest URL out.
//!
//! Stages run in a fixed order, cheapest first:
//! fetch page → locate embed → static scan → traffic sniff → format reconcile.
//! The browser is only started when the static scan misses.

mod parallel;
mod run;

pub use parallel::resolve_all;

use anyhow::Result;
use std::fmt;
use std::sync::Arc;

use crate::budget::Budget;
use crate::config::StreamfindConfig;
use crate::diagnostics::{DiagnosticsSink, FileRecorder};
use crate::error::ResolveError;
use crate::sniff::{ChromeLauncher, PoolMode, SessionFactory, SessionPool};
use crate::url_model::{ManifestFormat, NormalizedUrl};

/// A named landing page whose embedded player should be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub page_url: String,
}

impl Target {
    pub fn new(name: impl Into<String>, page_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            page_url: page_url.into(),
        }
    }
}

/// Strategy that produced a [`ResolvedStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOrigin {
    StaticScan,
    TrafficSniff,
    FormatDerived,
}

impl fmt::Display for StreamOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StreamOrigin::StaticScan => "static-scan",
            StreamOrigin::TrafficSniff => "traffic-sniff",
            StreamOrigin::FormatDerived => "format-derived",
        };
        f.write_str(s)
    }
}

/// A resolved manifest. `format` always agrees with the URL's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    pub url: NormalizedUrl,
    pub format: ManifestFormat,
    pub origin: StreamOrigin,
}

impl ResolvedStream {
    /// Builds a stream from a discovered URL; `None` when the URL does not
    /// normalize or carries no manifest signature.
    pub fn from_url(url: &str, origin: StreamOrigin) -> Option<Self> {
        let url = crate::url_model::normalize(url)?;
        let format = ManifestFormat::from_url(url.as_str())?;
        Some(Self { url, format, origin })
    }
}

/// Exactly one per target per invocation.
pub type ResolutionOutcome = std::result::Result<ResolvedStream, ResolveError>;

/// Owns what resolutions share: configuration, the browser session pool and
/// the diagnostics sink. Cheap to share behind an `Arc`.
pub struct Resolver {
    cfg: Arc<StreamfindConfig>,
    sessions: Arc<SessionPool>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl Resolver {
    pub fn new(
        cfg: StreamfindConfig,
        sessions: Arc<SessionPool>,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Self {
        Self {
            cfg: Arc::new(cfg),
            sessions,
            diagnostics,
        }
    }

    /// Production wiring: headless Chrome sessions and file diagnostics in the
    /// configured directory (XDG state dir by default).
    pub fn from_config(cfg: StreamfindConfig) -> Result<Self> {
        let launcher: Arc<dyn SessionFactory> =
            Arc::new(ChromeLauncher::from_config(&cfg.sniff, cfg.resolution_budget()));
        let mode = if cfg.sniff.reuse_sessions {
            PoolMode::Reuse {
                max_idle: cfg.sniff.max_idle_sessions,
            }
        } else {
            PoolMode::Isolated
        };
        let dir = match &cfg.diagnostics.dir {
            Some(dir) => dir.clone(),
            None => crate::config::state_dir()?,
        };
        let diagnostics = Arc::new(FileRecorder::new(dir, cfg.diagnostics.per_target));
        Ok(Self::new(cfg, SessionPool::new(launcher, mode), diagnostics))
    }

    /// Resolves one target under a fresh budget of `resolution_budget_secs`.
    pub async fn resolve(&self, target: &Target) -> ResolutionOutcome {
        let budget = Budget::new(self.cfg.resolution_budget());
        self.resolve_with_budget(target, &budget).await
    }

    /// Resolves one target under `budget`; setting the budget's abort token
    /// abandons the resolution at its next check.
    pub async fn resolve_with_budget(&self, target: &Target, budget: &Budget) -> ResolutionOutcome {
        let outcome = run::resolve_target(self, target, budget).await;
        match &outcome {
            Ok(stream) => tracing::info!(
                "resolved '{}' via {}: {} {}",
                target.name,
                stream.origin,
                stream.format,
                stream.url
            ),
            Err(e) => tracing::info!("could not resolve '{}' ({}): {}", target.name, e.kind(), e),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_format_follows_url() {
        let s = ResolvedStream::from_url("https://cdn.example.com/a/index.mpd?t=1", StreamOrigin::TrafficSniff)
            .unwrap();
        assert_eq!(s.format, ManifestFormat::Dash);
        let s = ResolvedStream::from_url("//cdn.example.com/a/ch.m3u8", StreamOrigin::StaticScan).unwrap();
        assert_eq!(s.format, ManifestFormat::Hls);
        assert_eq!(s.url.as_str(), "https://cdn.example.com/a/ch.m3u8");
    }

    #[test]
    fn url_without_signature_is_rejected() {
        assert!(ResolvedStream::from_url("https://cdn.example.com/a/video.mp4", StreamOrigin::StaticScan).is_none());
        assert!(ResolvedStream::from_url("#", StreamOrigin::StaticScan).is_none());
    }

    #[test]
    fn origin_labels() {
        assert_eq!(StreamOrigin::StaticScan.to_string(), "static-scan");
        assert_eq!(StreamOrigin::FormatDerived.to_string(), "format-derived");
    }
}
