//! Browser session seam.
//!
//! The sniffing algorithm only talks to [`BrowserSession`]; the headless Chrome
//! backend lives in `chrome`, and tests drive the algorithm with scripted fakes.

use std::time::Duration;

use super::capture::CapturedRequest;

/// A live browser with a capture buffer and a stack of browsing contexts.
///
/// The bottom of the stack is the top-level document. `enter_frame` pushes a
/// context for a frame's URL and `leave_frame` pops it. A session is driven by
/// one resolution at a time.
pub trait BrowserSession: Send {
    /// Empties the captured-request buffer.
    fn clear_captured(&mut self);

    /// Snapshot of the captured requests, in arrival order.
    fn captured(&self) -> Vec<CapturedRequest>;

    /// Loads `url` in the current context. A load that is still running when
    /// `timeout` expires is not an error.
    fn navigate(&mut self, url: &str, timeout: Duration) -> anyhow::Result<()>;

    /// Clicks up to `max` visible elements matching `selectors` (tried in
    /// order) in the current context. Returns how many were clicked.
    fn click_play_controls(&mut self, selectors: &[String], max: usize) -> anyhow::Result<usize>;

    /// Absolute `src` values of the frames in the current context, in document order.
    fn frame_sources(&mut self) -> anyhow::Result<Vec<String>>;

    /// Pushes a context for `url` and loads it. On error the stack is unchanged.
    fn enter_frame(&mut self, url: &str, timeout: Duration) -> anyhow::Result<()>;

    /// Pops the current frame context. Leaving the top-level context is a no-op.
    fn leave_frame(&mut self) -> anyhow::Result<()>;

    /// Drops every frame context, back to the top-level document.
    fn reset_context(&mut self);
}

/// Starts new browser sessions.
pub trait SessionFactory: Send + Sync {
    fn launch(&self) -> anyhow::Result<Box<dyn BrowserSession>>;
}
