//! HLS derivation for DASH manifests.
//!
//! Many CDNs publish the same live channel under both packagings with
//! predictable path differences. Candidates are built by plain string
//! substitution and only returned once one answers with an HTTP success.

use crate::budget::Budget;
use crate::error::Probe;
use crate::fetch::{self, RequestOptions};
use crate::url_model::ManifestFormat;

/// Bytes read from a candidate when HEAD is refused and GET has to confirm it.
const PLAYLIST_SNIFF_BYTES: usize = 512;

const HLS_MAGIC: &str = "#EXTM3U";

/// HLS candidates for `dash_url`, highest priority first:
/// 1. `_dash_enc` → `_hls_enc` plus `.mpd` → `.m3u8`
/// 2. `.mpd` → `.m3u8`
/// 3. `/dash/` → `/hls/` plus `.mpd` → `.m3u8`
///
/// Markers match regardless of ASCII case, like format detection does.
/// Candidates may repeat when a substitution does not apply.
pub fn hls_candidates(dash_url: &str) -> Vec<String> {
    let swap_ext = |s: &str| {
        replace_ignore_case(
            s,
            ManifestFormat::Dash.extension(),
            ManifestFormat::Hls.extension(),
        )
    };
    vec![
        swap_ext(&replace_ignore_case(dash_url, "_dash_enc", "_hls_enc")),
        swap_ext(dash_url),
        swap_ext(&replace_ignore_case(dash_url, "/dash/", "/hls/")),
    ]
}

/// `s` with every ASCII-case-insensitive occurrence of `from` (lowercase
/// ASCII) replaced by `to`.
fn replace_ignore_case(s: &str, from: &str, to: &str) -> String {
    let lower = s.to_ascii_lowercase();
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for (start, _) in lower.match_indices(from) {
        out.push_str(&s[last..start]);
        out.push_str(to);
        last = start + from.len();
    }
    out.push_str(&s[last..]);
    out
}

/// Probes candidates in priority order with `check` and returns the first
/// found. Each distinct candidate is checked at most once.
///
/// `Failed` only when every check errored; a mix of misses and errors is a
/// clean `NotFound`, since the DASH URL stays usable either way.
pub fn derive_hls_with<F>(dash_url: &str, mut check: F) -> Probe<String>
where
    F: FnMut(&str) -> Probe<()>,
{
    let mut tried: Vec<String> = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    for candidate in hls_candidates(dash_url) {
        if candidate == dash_url || tried.contains(&candidate) {
            continue;
        }
        match check(&candidate) {
            Probe::Found(()) => {
                tracing::debug!("derived HLS candidate {} is reachable", candidate);
                return Probe::Found(candidate);
            }
            Probe::NotFound => tracing::debug!("HLS candidate {} not reachable", candidate),
            Probe::Failed(reason) => {
                tracing::debug!("HLS candidate check failed: {}", reason);
                errors.push(reason);
            }
        }
        tried.push(candidate);
    }

    if !tried.is_empty() && errors.len() == tried.len() {
        Probe::Failed(errors.join("; "))
    } else {
        Probe::NotFound
    }
}

/// Checks one candidate over HTTP.
///
/// HEAD 2xx is a hit. Servers that refuse HEAD (405/501) get a short GET
/// instead, and the body must start like an HLS playlist. Each request's
/// timeout is `opts.timeout` clipped to what is left of `budget`.
pub fn check_candidate(url: &str, opts: &RequestOptions, budget: &Budget) -> Probe<()> {
    let head_opts = opts.clone().with_timeout(budget.clip(opts.timeout));
    let status = match fetch::head_status(url, &head_opts) {
        Ok(status) => status,
        Err(e) => return Probe::Failed(format!("HEAD {url}: {e}")),
    };
    if (200..300).contains(&status) {
        return Probe::Found(());
    }
    if status != 405 && status != 501 {
        return Probe::NotFound;
    }
    if budget.is_exhausted() {
        return Probe::Failed(format!("GET {url}: no budget left"));
    }

    let get_opts = opts.clone().with_timeout(budget.clip(opts.timeout));
    match fetch::get_prefix(url, &get_opts, PLAYLIST_SNIFF_BYTES) {
        Ok((status, body)) if (200..300).contains(&status) && looks_like_playlist(&body) => {
            Probe::Found(())
        }
        Ok(_) => Probe::NotFound,
        Err(e) => Probe::Failed(format!("GET {url}: {e}")),
    }
}

fn looks_like_playlist(prefix: &[u8]) -> bool {
    let text = String::from_utf8_lossy(prefix);
    text.trim_start_matches('\u{feff}')
        .trim_start()
        .starts_with(HLS_MAGIC)
}

/// [`derive_hls_with`] over [`check_candidate`]. Once `budget` runs out the
/// remaining candidates are not contacted and count as failed checks.
pub fn derive_hls(dash_url: &str, opts: &RequestOptions, budget: &Budget) -> Probe<String> {
    derive_hls_with(dash_url, |candidate| {
        if budget.is_exhausted() {
            return Probe::Failed(format!("{candidate}: no budget left"));
        }
        check_candidate(candidate, opts, budget)
    })
}
