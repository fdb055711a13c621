//! Browser session pool with scoped, single-writer leases.
//!
//! A [`SessionLease`] owns its session outright until it is dropped, so only
//! one resolution can drive a session at a time. On drop the session is either
//! torn down or, in reuse mode, reset and returned to the idle list.

use anyhow::Result;
use std::sync::{Arc, Mutex};

use super::session::{BrowserSession, SessionFactory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolMode {
    /// Every lease launches its own session and tears it down afterwards.
    Isolated,
    /// Cleanly finished sessions are kept (up to `max_idle`) for later leases.
    Reuse { max_idle: usize },
}

pub struct SessionPool {
    factory: Arc<dyn SessionFactory>,
    mode: PoolMode,
    idle: Mutex<Vec<Box<dyn BrowserSession>>>,
}

impl SessionPool {
    pub fn new(factory: Arc<dyn SessionFactory>, mode: PoolMode) -> Arc<Self> {
        Arc::new(Self {
            factory,
            mode,
            idle: Mutex::new(Vec::new()),
        })
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Hands out an exclusively owned session with an empty capture buffer,
    /// reusing an idle one when allowed. Launch failures are returned as-is.
    pub fn acquire(self: &Arc<Self>) -> Result<SessionLease> {
        let reused = match self.mode {
            PoolMode::Isolated => None,
            PoolMode::Reuse { .. } => self.idle.lock().unwrap_or_else(|p| p.into_inner()).pop(),
        };
        let mut session = match reused {
            Some(session) => {
                tracing::debug!("reusing pooled browser session");
                session
            }
            None => self.factory.launch()?,
        };
        session.clear_captured();
        Ok(SessionLease {
            session: Some(session),
            pool: Arc::clone(self),
            discard: false,
        })
    }

    fn release(&self, mut session: Box<dyn BrowserSession>) {
        let PoolMode::Reuse { max_idle } = self.mode else {
            return;
        };
        session.reset_context();
        session.clear_captured();
        let mut idle = self.idle.lock().unwrap_or_else(|p| p.into_inner());
        if idle.len() < max_idle {
            idle.push(session);
        }
    }
}

/// Exclusive use of one session for the duration of one resolution.
pub struct SessionLease {
    /// `Some` until drop.
    session: Option<Box<dyn BrowserSession>>,
    pool: Arc<SessionPool>,
    discard: bool,
}

impl SessionLease {
    pub fn session(&mut self) -> &mut dyn BrowserSession {
        self.session
            .as_deref_mut()
            .expect("lease holds its session until dropped")
    }

    /// Tear the session down on release even in reuse mode (e.g. after an
    /// abandoned resolution left it in an unknown state).
    pub fn discard(&mut self) {
        self.discard = true;
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        if self.discard {
            tracing::debug!("tearing down discarded browser session");
            drop(session);
        } else {
            self.pool.release(session);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sniff::capture::CapturedRequest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Counters {
        launched: AtomicUsize,
        dropped: AtomicUsize,
    }

    struct StubSession {
        counters: Arc<Counters>,
        captured: Vec<CapturedRequest>,
        depth: usize,
    }

    impl Drop for StubSession {
        fn drop(&mut self) {
            self.counters.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl BrowserSession for StubSession {
        fn clear_captured(&mut self) {
            self.captured.clear();
        }
        fn captured(&self) -> Vec<CapturedRequest> {
            self.captured.clone()
        }
        fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<()> {
            self.captured.push(CapturedRequest::new("GET", url, Some(200)));
            Ok(())
        }
        fn click_play_controls(&mut self, _selectors: &[String], _max: usize) -> Result<usize> {
            Ok(0)
        }
        fn frame_sources(&mut self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        fn enter_frame(&mut self, _url: &str, _timeout: Duration) -> Result<()> {
            self.depth += 1;
            Ok(())
        }
        fn leave_frame(&mut self) -> Result<()> {
            self.depth = self.depth.saturating_sub(1);
            Ok(())
        }
        fn reset_context(&mut self) {
            self.depth = 0;
        }
    }

    struct StubFactory {
        counters: Arc<Counters>,
        fail: bool,
    }

    impl SessionFactory for StubFactory {
        fn launch(&self) -> Result<Box<dyn BrowserSession>> {
            if self.fail {
                anyhow::bail!("no browser binary");
            }
            self.counters.launched.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StubSession {
                counters: Arc::clone(&self.counters),
                captured: Vec::new(),
                depth: 0,
            }))
        }
    }

    fn pool(mode: PoolMode) -> (Arc<SessionPool>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let factory = Arc::new(StubFactory {
            counters: Arc::clone(&counters),
            fail: false,
        });
        (SessionPool::new(factory, mode), counters)
    }

    #[test]
    fn isolated_mode_tears_down_every_session() {
        let (pool, counters) = pool(PoolMode::Isolated);
        for _ in 0..3 {
            let mut lease = pool.acquire().unwrap();
            lease.session().navigate("https://x/", Duration::from_secs(1)).unwrap();
        }
        assert_eq!(counters.launched.load(Ordering::SeqCst), 3);
        assert_eq!(counters.dropped.load(Ordering::SeqCst), 3);
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn reuse_mode_returns_clean_session() {
        let (pool, counters) = pool(PoolMode::Reuse { max_idle: 1 });
        {
            let mut lease = pool.acquire().unwrap();
            let s = lease.session();
            s.navigate("https://x/", Duration::from_secs(1)).unwrap();
            s.enter_frame("https://x/frame", Duration::from_secs(1)).unwrap();
        }
        assert_eq!(pool.idle_count(), 1);

        let mut lease = pool.acquire().unwrap();
        assert!(lease.session().captured().is_empty());
        assert_eq!(counters.launched.load(Ordering::SeqCst), 1);
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn discarded_lease_is_not_pooled() {
        let (pool, counters) = pool(PoolMode::Reuse { max_idle: 2 });
        {
            let mut lease = pool.acquire().unwrap();
            lease.discard();
        }
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(counters.dropped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn idle_list_is_bounded() {
        let (pool, counters) = pool(PoolMode::Reuse { max_idle: 1 });
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        drop(a);
        drop(b);
        assert_eq!(pool.idle_count(), 1);
        assert_eq!(counters.launched.load(Ordering::SeqCst), 2);
        assert_eq!(counters.dropped.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn launch_failure_is_returned() {
        let factory = Arc::new(StubFactory {
            counters: Arc::new(Counters::default()),
            fail: true,
        });
        let pool = SessionPool::new(factory, PoolMode::Isolated);
        let err = pool.acquire().err().unwrap();
        assert!(err.to_string().contains("no browser binary"));
    }
}
