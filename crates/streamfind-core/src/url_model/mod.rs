//! URL modeling: normalization of scraped `src`/`href` values and manifest
//! format inference.
//!
//! Everything here is pure string work; no I/O.

mod format;
mod path;
mod sanitize;

pub use format::ManifestFormat;
pub use path::last_path_segment;
pub use sanitize::sanitize_file_stem;

use std::fmt;

/// A URL carrying an explicit `http://` or `https://` scheme.
///
/// Only [`normalize`] constructs one, so holding a `NormalizedUrl` means the
/// normalization rules have already been applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// True if `s` starts with `http://` or `https://` (ASCII case-insensitive).
fn has_http_scheme(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Canonicalizes a raw URL as found in markup.
///
/// - surrounding whitespace is trimmed
/// - empty and anchor-only (`#...`) references yield `None`
/// - protocol-relative `//host/x` becomes `https://host/x`
/// - schemeless `host/x` or `/host/x` becomes `https://host/x`
/// - anything already carrying `http(s)://` is returned unchanged
///
/// `normalize(normalize(u).as_str()) == normalize(u)` for every input.
pub fn normalize(raw: &str) -> Option<NormalizedUrl> {
    let url = raw.trim();
    if url.is_empty() || url.starts_with('#') {
        return None;
    }
    if has_http_scheme(url) {
        return Some(NormalizedUrl(url.to_string()));
    }
    if let Some(rest) = url.strip_prefix("//") {
        let rest = rest.trim_start_matches('/');
        if rest.is_empty() {
            return None;
        }
        return Some(NormalizedUrl(format!("https://{rest}")));
    }
    let rest = url.trim_start_matches('/');
    if rest.is_empty() {
        return None;
    }
    Some(NormalizedUrl(format!("https://{rest}")))
}

/// Host of a normalized URL, if it parses.
pub fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}
