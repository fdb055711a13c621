//! The per-target stage pipeline.
//!
//! Every blocking step (libcurl, the browser) runs on the blocking pool and is
//! bounded by the resolution budget.

use std::sync::Arc;
use std::time::Duration;

use crate::budget::Budget;
use crate::derive;
use crate::embed::locate_embed;
use crate::error::{Probe, ResolveError, Stage};
use crate::fetch::{self, Fetched, RequestOptions};
use crate::scan;
use crate::sniff::{SniffReport, Sniffer};
use crate::url_model::{normalize, ManifestFormat};

use super::{ResolutionOutcome, ResolvedStream, Resolver, StreamOrigin, Target};

pub(super) async fn resolve_target(resolver: &Resolver, target: &Target, budget: &Budget) -> ResolutionOutcome {
    let cfg = &resolver.cfg;

    // Fetching page
    budget.check(Stage::FetchingPage)?;
    let page_url = normalize(&target.page_url).ok_or_else(|| ResolveError::Network {
        url: target.page_url.clone(),
        reason: "page URL is empty".to_string(),
    })?;
    tracing::debug!("[{}] {}: {}", target.name, Stage::FetchingPage, page_url);
    let page = fetch_page(page_url.as_str(), cfg.page_timeout(), &cfg.user_agent, budget).await?;

    // Locating embed
    budget.check(Stage::LocatingEmbed)?;
    let embed = locate_embed(&page.body).ok_or(ResolveError::NoEmbedFound)?;
    let embed_url = embed.source_url.into_string();
    tracing::debug!("[{}] {}: {}", target.name, Stage::LocatingEmbed, embed_url);

    let referer = cfg.send_referer.then(|| page_url.as_str().to_string());

    // Static scan
    budget.check(Stage::StaticScan)?;
    let scan_opts = RequestOptions::new(cfg.user_agent.clone(), budget.clip(cfg.scan_timeout()))
        .with_referer(referer.as_deref());
    let scanned = {
        let url = embed_url.clone();
        tokio::task::spawn_blocking(move || scan::scan_url(&url, &scan_opts))
            .await
            .unwrap_or_else(|e| Probe::Failed(format!("scan task: {e}")))
    };
    let static_hit = match scanned {
        Probe::Found(url) => {
            let stream = ResolvedStream::from_url(&url, StreamOrigin::StaticScan);
            if stream.is_none() {
                tracing::debug!("[{}] scanned URL {} has no usable format", target.name, url);
            }
            stream
        }
        Probe::NotFound => None,
        Probe::Failed(reason) => {
            tracing::debug!("[{}] static scan failed: {}", target.name, reason);
            None
        }
    };

    let stream = match static_hit {
        Some(stream) => stream,
        None => sniff_stream(resolver, target, &embed_url, budget).await?,
    };

    Ok(reconcile(stream, &cfg.user_agent, cfg.probe_timeout(), referer, budget, &target.name).await)
}

async fn fetch_page(
    url: &str,
    timeout: Duration,
    user_agent: &str,
    budget: &Budget,
) -> Result<Fetched, ResolveError> {
    let opts = RequestOptions::new(user_agent, budget.clip(timeout));
    let fetched = {
        let url = url.to_string();
        tokio::task::spawn_blocking(move || fetch::get_text(&url, &opts)).await
    };
    let network = |reason: String| ResolveError::Network {
        url: url.to_string(),
        reason,
    };
    match fetched {
        Ok(Ok(page)) if page.status >= 400 => Err(network(format!("HTTP {}", page.status))),
        Ok(Ok(page)) => Ok(page),
        Ok(Err(e)) if e.is_timeout() && budget.is_exhausted() => Err(ResolveError::TimedOut {
            stage: Stage::FetchingPage,
        }),
        Ok(Err(e)) => Err(network(e.to_string())),
        Err(e) => Err(network(format!("fetch task: {e}"))),
    }
}

/// Runs the browser sweep on a leased session. Launch failures are
/// `Browser` errors; a sweep that outlives the budget is abandoned and its
/// session discarded.
async fn sniff_stream(
    resolver: &Resolver,
    target: &Target,
    embed_url: &str,
    budget: &Budget,
) -> Result<ResolvedStream, ResolveError> {
    budget.check(Stage::TrafficSniff)?;
    tracing::debug!("[{}] {}: {}", target.name, Stage::TrafficSniff, embed_url);

    let task = {
        let cfg = Arc::clone(&resolver.cfg);
        let pool = Arc::clone(&resolver.sessions);
        let diagnostics = Arc::clone(&resolver.diagnostics);
        let budget = budget.clone();
        let name = target.name.clone();
        let url = embed_url.to_string();
        tokio::task::spawn_blocking(move || -> Result<SniffReport, ResolveError> {
            let mut lease = pool
                .acquire()
                .map_err(|e| ResolveError::Browser(format!("{e:#}")))?;
            let report = Sniffer::new(&cfg.sniff, &budget, diagnostics.as_ref()).run(lease.session(), &name, &url);
            if !report.session_healthy() {
                lease.discard();
            }
            Ok(report)
        })
    };

    // The sweep clips its own waits; the outer timeout only catches a
    // browser call that hangs past the budget.
    let hang_limit = budget.remaining() + resolver.cfg.sniff.hang_grace();
    let report = match tokio::time::timeout(hang_limit, task).await {
        Ok(Ok(report)) => report?,
        Ok(Err(e)) => return Err(ResolveError::Browser(format!("sniff task: {e}"))),
        Err(_) => {
            tracing::warn!("[{}] browser sweep hung past the budget, abandoning it", target.name);
            budget.abort();
            return Err(ResolveError::TimedOut {
                stage: Stage::TrafficSniff,
            });
        }
    };

    match report.outcome {
        Probe::Found(url) => ResolvedStream::from_url(&url, StreamOrigin::TrafficSniff).ok_or(ResolveError::NoStreamFound),
        _ if report.budget_exhausted => Err(ResolveError::TimedOut {
            stage: Stage::TrafficSniff,
        }),
        Probe::NotFound => Err(ResolveError::NoStreamFound),
        Probe::Failed(reason) => {
            tracing::debug!("[{}] sniff found nothing: {}", target.name, reason);
            Err(ResolveError::NoStreamFound)
        }
    }
}

/// DASH results get an HLS derivation attempt; anything else passes through.
/// Running out of budget here keeps the DASH result rather than failing.
async fn reconcile(
    stream: ResolvedStream,
    user_agent: &str,
    probe_timeout: Duration,
    referer: Option<String>,
    budget: &Budget,
    name: &str,
) -> ResolvedStream {
    if stream.format != ManifestFormat::Dash {
        return stream;
    }
    if budget.is_exhausted() {
        tracing::warn!("[{}] no budget left for {}, keeping DASH", name, Stage::FormatReconcile);
        return stream;
    }
    tracing::debug!("[{}] {}: {}", name, Stage::FormatReconcile, stream.url);

    let opts = RequestOptions::new(user_agent, probe_timeout).with_referer(referer.as_deref());
    let dash_url = stream.url.as_str().to_string();
    let budget = budget.clone();
    let derived = tokio::task::spawn_blocking(move || derive::derive_hls(&dash_url, &opts, &budget))
        .await
        .unwrap_or_else(|e| Probe::Failed(format!("derive task: {e}")));

    match derived {
        Probe::Found(url) => match ResolvedStream::from_url(&url, StreamOrigin::FormatDerived) {
            Some(hls) if hls.format == ManifestFormat::Hls => hls,
            _ => stream,
        },
        Probe::NotFound => stream,
        Probe::Failed(reason) => {
            tracing::warn!("[{}] HLS derivation checks failed: {}", name, reason);
            stream
        }
    }
}
