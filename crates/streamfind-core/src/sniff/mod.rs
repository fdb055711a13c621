//! Traffic sniffer: render the embed in a headless browser, poke the player,
//! and pick the manifest request out of the captured traffic.
//!
//! Sweep:
//! 1. clear the capture buffer and load the page (a slow load is not fatal)
//! 2. settle until a variant manifest shows up or the initial budget runs out
//! 3. click play controls in the page, then in nested frames (bounded depth
//!    and fan-out), returning to the parent after each frame
//! 4. settle again, then select from the capture in arrival order
//!
//! Step failures are logged and skipped; they never end the sweep. The full
//! capture goes to the diagnostics sink whatever the outcome.

mod capture;
mod chrome;
mod pool;
mod select;
mod session;

pub use capture::{CaptureLog, CapturedRequest, SharedCapture};
pub use chrome::{ChromeLauncher, ChromeSession};
pub use pool::{PoolMode, SessionLease, SessionPool};
pub use select::ManifestPolicy;
pub use session::{BrowserSession, SessionFactory};

use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::budget::Budget;
use crate::config::SniffConfig;
use crate::diagnostics::DiagnosticsSink;
use crate::error::Probe;
use crate::url_model::{host_of, normalize};

/// What one sweep produced.
#[derive(Debug, Clone)]
pub struct SniffReport {
    /// Selected manifest URL; `Failed` only when the page could not be loaded at all.
    pub outcome: Probe<String>,
    /// Every captured exchange, in arrival order.
    pub captured: Vec<CapturedRequest>,
    /// Steps that errored and were skipped.
    pub failed_steps: usize,
    /// The resolution budget ran out (or was aborted) during the sweep.
    pub budget_exhausted: bool,
    /// The top-level navigation errored, whether or not a manifest was seen.
    pub navigation_failed: bool,
}

impl SniffReport {
    /// Whether the session ended in a known state and may be pooled again.
    pub fn session_healthy(&self) -> bool {
        !self.budget_exhausted && !self.navigation_failed && !matches!(self.outcome, Probe::Failed(_))
    }
}

pub struct Sniffer<'a> {
    cfg: &'a SniffConfig,
    policy: ManifestPolicy,
    budget: &'a Budget,
    diagnostics: &'a dyn DiagnosticsSink,
}

impl<'a> Sniffer<'a> {
    pub fn new(cfg: &'a SniffConfig, budget: &'a Budget, diagnostics: &'a dyn DiagnosticsSink) -> Self {
        Self {
            cfg,
            policy: ManifestPolicy::new(&cfg.root_manifest_markers),
            budget,
            diagnostics,
        }
    }

    /// Runs one sweep of `url` on `session` and hands the capture to the
    /// diagnostics sink under `target_name`.
    pub fn run(&self, session: &mut dyn BrowserSession, target_name: &str, url: &str) -> SniffReport {
        let mut sweep = Sweep {
            sniffer: self,
            failed_steps: 0,
        };
        let loaded = sweep.run(session, url);

        let captured = session.captured();
        self.diagnostics.record(target_name, &captured);

        let budget_exhausted = self.budget.is_exhausted();
        let navigation_failed = loaded.is_err();
        let outcome = match self.policy.select(&captured) {
            Some(hit) => Probe::Found(hit.url.clone()),
            None => match loaded {
                Err(reason) => Probe::Failed(reason),
                Ok(()) => Probe::NotFound,
            },
        };
        debug!(
            "sniff of {} done: {} requests captured, {} failed steps, outcome {:?}",
            url,
            captured.len(),
            sweep.failed_steps,
            outcome
        );
        SniffReport {
            outcome,
            captured,
            failed_steps: sweep.failed_steps,
            budget_exhausted,
            navigation_failed,
        }
    }
}

/// Mutable state of one sweep.
struct Sweep<'s, 'a> {
    sniffer: &'s Sniffer<'a>,
    failed_steps: usize,
}

impl Sweep<'_, '_> {
    fn cfg(&self) -> &SniffConfig {
        self.sniffer.cfg
    }

    fn budget(&self) -> &Budget {
        self.sniffer.budget
    }

    fn step_failed(&mut self, step: &str, err: &anyhow::Error) {
        self.failed_steps += 1;
        warn!("sniff step '{}' failed: {:#}", step, err);
    }

    /// Err only when the top-level navigation itself failed.
    fn run(&mut self, session: &mut dyn BrowserSession, url: &str) -> Result<(), String> {
        session.clear_captured();

        let nav_timeout = self.budget().clip(self.cfg().navigation_timeout());
        let mut loaded = Ok(());
        if let Err(e) = session.navigate(url, nav_timeout) {
            self.step_failed("navigate", &e);
            loaded = Err(format!("navigate to {url}: {e:#}"));
        }

        if self.settle(session, self.cfg().initial_settle()) {
            debug!("variant manifest seen before any interaction");
            return loaded;
        }

        self.trigger_play(session, "top");
        self.sweep_frames(session, 0);

        // Whatever frame work happened, end up back in the top-level document.
        session.reset_context();
        self.settle(session, self.cfg().final_settle());
        loaded
    }

    /// Polls the capture until a preferred manifest appears, `wait` elapses,
    /// or the budget runs out. Returns true on a preferred hit.
    fn settle(&self, session: &dyn BrowserSession, wait: Duration) -> bool {
        let policy = &self.sniffer.policy;
        let started = Instant::now();
        let wait = self.budget().clip(wait);
        loop {
            if policy.has_preferred(&session.captured()) {
                return true;
            }
            let elapsed = started.elapsed();
            if elapsed >= wait || self.budget().is_exhausted() {
                return false;
            }
            std::thread::sleep(self.cfg().poll_interval().min(wait - elapsed));
        }
    }

    fn trigger_play(&mut self, session: &mut dyn BrowserSession, context: &str) {
        if self.budget().is_exhausted() {
            return;
        }
        let cfg = self.sniffer.cfg;
        match session.click_play_controls(&cfg.play_selectors, cfg.max_play_clicks) {
            Ok(n) => debug!("clicked {} play control(s) in {} context", n, context),
            Err(e) => self.step_failed("click play", &e),
        }
    }

    fn skip_frame(&self, url: &str) -> bool {
        let Some(host) = host_of(url) else {
            return true;
        };
        self.cfg().skip_frame_hosts.iter().any(|skip| {
            let skip = skip.trim().to_ascii_lowercase();
            !skip.is_empty() && (host == skip || host.ends_with(&format!(".{skip}")))
        })
    }

    fn frame_targets(&self, sources: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        sources
            .iter()
            .filter_map(|s| normalize(s))
            .map(|u| u.into_string())
            .filter(|u| !self.skip_frame(u))
            .filter(|u| seen.insert(u.clone()))
            .take(self.cfg().max_frames_per_level)
            .collect()
    }

    fn sweep_frames(&mut self, session: &mut dyn BrowserSession, depth: usize) {
        if depth >= self.cfg().max_frame_depth || self.budget().is_exhausted() {
            return;
        }
        let sources = match session.frame_sources() {
            Ok(sources) => sources,
            Err(e) => {
                self.step_failed("list frames", &e);
                return;
            }
        };
        for frame_url in self.frame_targets(sources) {
            if self.budget().is_exhausted() {
                return;
            }
            let timeout = self.budget().clip(self.cfg().navigation_timeout());
            if let Err(e) = session.enter_frame(&frame_url, timeout) {
                self.step_failed("enter frame", &e);
                continue;
            }
            debug!("entered frame {} at depth {}", frame_url, depth + 1);
            self.trigger_play(session, &frame_url);
            self.sweep_frames(session, depth + 1);
            if let Err(e) = session.leave_frame() {
                self.step_failed("leave frame", &e);
            }
        }
    }
}
