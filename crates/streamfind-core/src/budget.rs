//! Wall-clock budget and abort token for one resolution.
//!
//! Every wait and every network timeout inside a resolution is clipped to the
//! remaining budget. Setting the abort token makes the budget read as exhausted
//! immediately, so blocking steps notice at their next check.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{ResolveError, Stage};

#[derive(Debug, Clone)]
pub struct Budget {
    ends_at: Instant,
    aborted: Arc<AtomicBool>,
}

impl Budget {
    pub fn new(total: Duration) -> Self {
        Self::with_abort(total, Arc::new(AtomicBool::new(false)))
    }

    /// Budget sharing an externally owned abort token (e.g. one per run).
    pub fn with_abort(total: Duration, aborted: Arc<AtomicBool>) -> Self {
        Self {
            ends_at: Instant::now() + total,
            aborted,
        }
    }

    /// Token that, when set, exhausts this budget.
    pub fn abort_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.aborted)
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Relaxed);
    }

    pub fn remaining(&self) -> Duration {
        if self.aborted.load(Ordering::Relaxed) {
            return Duration::ZERO;
        }
        self.ends_at.saturating_duration_since(Instant::now())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining().is_zero()
    }

    /// `d`, shortened to what is left of the budget.
    pub fn clip(&self, d: Duration) -> Duration {
        d.min(self.remaining())
    }

    /// Err(TimedOut) if the budget is gone before entering `stage`.
    pub fn check(&self, stage: Stage) -> Result<(), ResolveError> {
        if self.is_exhausted() {
            tracing::warn!("resolution budget exhausted before {}", stage);
            return Err(ResolveError::TimedOut { stage });
        }
        Ok(())
    }
}
