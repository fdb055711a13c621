//! Headless Chrome backend for [`BrowserSession`].
//!
//! Each browsing context is a tab. Entering a frame opens the frame's URL in a
//! new tab so cross-origin frame traffic lands in the same capture buffer; every
//! tab reports `Network.requestWillBeSent` and `Network.responseReceived` into it.
//! All calls block; run them from `spawn_blocking`.

use anyhow::{Context, Result};
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SniffConfig;

use super::capture::{CapturedRequest, SharedCapture};
use super::session::{BrowserSession, SessionFactory};

const CAPTURE_HANDLER: &str = "streamfind-capture";

/// Automation flags: no GPU, quiet audio, small shared memory, no images.
const LAUNCH_ARGS: [&str; 4] = [
    "--disable-gpu",
    "--mute-audio",
    "--disable-dev-shm-usage",
    "--blink-settings=imagesEnabled=false",
];

/// Clicks visible play controls; `__SELECTORS__` and `__MAX__` are substituted.
/// Also nudges any `<video>` element directly, muted so autoplay policy allows it.
const CLICK_SCRIPT: &str = r#"(() => {
  const selectors = __SELECTORS__;
  const max = __MAX__;
  let clicked = 0;
  const visible = (el) => {
    const r = el.getBoundingClientRect();
    const s = window.getComputedStyle(el);
    return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';
  };
  try { if (document.body) document.body.click(); } catch (e) {}
  for (const sel of selectors) {
    let nodes;
    try { nodes = document.querySelectorAll(sel); } catch (e) { continue; }
    for (const el of nodes) {
      if (clicked >= max) break;
      if (!visible(el)) continue;
      try { el.scrollIntoView({block: 'center'}); el.click(); clicked++; } catch (e) {}
    }
    if (clicked >= max) break;
  }
  for (const v of document.querySelectorAll('video')) {
    try { v.muted = true; const p = v.play(); if (p && p.catch) p.catch(() => {}); } catch (e) {}
  }
  return clicked;
})()"#;

const FRAME_SOURCES_SCRIPT: &str =
    "JSON.stringify(Array.from(document.querySelectorAll('iframe[src], frame[src]')).map(f => f.src))";

/// Launches a fresh headless Chrome per session.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    chrome_path: Option<PathBuf>,
    idle_timeout: Duration,
}

impl ChromeLauncher {
    /// `idle_timeout` bounds how long the browser process survives without
    /// protocol traffic; it should exceed the resolution budget.
    pub fn new(chrome_path: Option<PathBuf>, idle_timeout: Duration) -> Self {
        Self {
            chrome_path,
            idle_timeout,
        }
    }

    pub fn from_config(cfg: &SniffConfig, resolution_budget: Duration) -> Self {
        Self::new(cfg.chrome_path.clone(), resolution_budget + Duration::from_secs(30))
    }
}

impl SessionFactory for ChromeLauncher {
    fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        let args: Vec<&OsStr> = LAUNCH_ARGS.iter().map(OsStr::new).collect();
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .window_size(Some((1280, 720)))
            .path(self.chrome_path.clone())
            .idle_browser_timeout(self.idle_timeout)
            .args(args)
            .build()
            .map_err(|e| anyhow::anyhow!("invalid browser launch options: {e}"))?;

        let browser = Browser::new(options).context("launch headless Chrome")?;
        let capture = SharedCapture::default();
        let top = browser.new_tab().context("open top-level tab")?;
        attach_capture(&top, &capture)?;
        tracing::debug!("headless Chrome session started");

        Ok(Box::new(ChromeSession {
            browser,
            contexts: vec![top],
            capture,
        }))
    }
}

/// A running browser plus its context stack. Dropping it kills the browser.
pub struct ChromeSession {
    browser: Browser,
    /// Never empty: index 0 is the top-level tab.
    contexts: Vec<Arc<Tab>>,
    capture: SharedCapture,
}

impl ChromeSession {
    fn current(&self) -> &Arc<Tab> {
        // contexts[0] is never popped.
        &self.contexts[self.contexts.len() - 1]
    }
}

/// Feeds a tab's network events into the shared capture, keyed per tab so
/// request ids from different tabs cannot collide.
fn attach_capture(tab: &Arc<Tab>, capture: &SharedCapture) -> Result<()> {
    let scope = tab.get_target_id().to_string();

    // Registering a response handler also enables the Network domain for the tab.
    let on_response = capture.clone();
    let response_scope = scope.clone();
    tab.register_response_handling(
        CAPTURE_HANDLER,
        Box::new(move |params, _fetch_body| {
            let key = format!("{}:{}", response_scope, params.request_id);
            on_response.lock().on_response(&key, params.response.status as u16);
        }),
    )
    .context("enable network capture")?;

    let on_request = capture.clone();
    tab.add_event_listener(Arc::new(move |event: &Event| {
        if let Event::NetworkRequestWillBeSent(sent) = event {
            let params = &sent.params;
            let key = format!("{}:{}", scope, params.request_id);
            let redirect_status = params.redirect_response.as_ref().map(|r| r.status as u16);
            on_request.lock().on_request(
                &key,
                &params.request.method,
                &params.request.url,
                redirect_status,
            );
        }
    }))
    .context("subscribe to network events")?;
    Ok(())
}

fn load(tab: &Tab, url: &str, timeout: Duration) -> Result<()> {
    tab.set_default_timeout(timeout);
    tab.navigate_to(url)
        .with_context(|| format!("navigate to {url}"))?;
    if let Err(e) = tab.wait_until_navigated() {
        tracing::debug!("load of {} still running after {:?}: {}", url, timeout, e);
    }
    Ok(())
}

impl BrowserSession for ChromeSession {
    fn clear_captured(&mut self) {
        self.capture.clear();
    }

    fn captured(&self) -> Vec<CapturedRequest> {
        self.capture.snapshot()
    }

    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()> {
        load(self.current(), url, timeout)
    }

    fn click_play_controls(&mut self, selectors: &[String], max: usize) -> Result<usize> {
        let script = CLICK_SCRIPT
            .replace("__SELECTORS__", &serde_json::to_string(selectors)?)
            .replace("__MAX__", &max.to_string());
        let result = self
            .current()
            .evaluate(&script, false)
            .context("run play-control script")?;
        let clicked = result.value.and_then(|v| v.as_u64()).unwrap_or(0);
        Ok(clicked as usize)
    }

    fn frame_sources(&mut self) -> Result<Vec<String>> {
        let result = self
            .current()
            .evaluate(FRAME_SOURCES_SCRIPT, false)
            .context("list frame sources")?;
        let json = result
            .value
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| "[]".to_string());
        let sources: Vec<String> = serde_json::from_str(&json).context("parse frame sources")?;
        Ok(sources)
    }

    fn enter_frame(&mut self, url: &str, timeout: Duration) -> Result<()> {
        let tab = self.browser.new_tab().context("open frame tab")?;
        attach_capture(&tab, &self.capture)?;
        if let Err(e) = load(&tab, url, timeout) {
            let _ = tab.close(false);
            return Err(e);
        }
        self.contexts.push(tab);
        Ok(())
    }

    fn leave_frame(&mut self) -> Result<()> {
        if self.contexts.len() <= 1 {
            return Ok(());
        }
        if let Some(tab) = self.contexts.pop() {
            tab.close(false).context("close frame tab")?;
        }
        Ok(())
    }

    fn reset_context(&mut self) {
        while self.contexts.len() > 1 {
            if let Some(tab) = self.contexts.pop() {
                let _ = tab.close(false);
            }
        }
    }
}
