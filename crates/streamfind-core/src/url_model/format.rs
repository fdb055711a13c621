//! Manifest format inference from a URL's path signature.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Adaptive streaming manifest flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestFormat {
    Hls,
    Dash,
}

impl ManifestFormat {
    /// File extension (with leading dot) that identifies this format.
    pub fn extension(self) -> &'static str {
        match self {
            ManifestFormat::Hls => ".m3u8",
            ManifestFormat::Dash => ".mpd",
        }
    }

    /// Infers the format from the URL alone.
    ///
    /// The path's trailing extension decides when the URL parses; otherwise
    /// (or when the path carries no manifest extension) the first signature
    /// found anywhere in the URL decides. `None` if neither signature occurs.
    pub fn from_url(url: &str) -> Option<ManifestFormat> {
        if let Ok(parsed) = url::Url::parse(url) {
            let path = parsed.path().to_ascii_lowercase();
            if path.ends_with(".m3u8") {
                return Some(ManifestFormat::Hls);
            }
            if path.ends_with(".mpd") {
                return Some(ManifestFormat::Dash);
            }
        }
        let lower = url.to_ascii_lowercase();
        match (lower.find(".m3u8"), lower.find(".mpd")) {
            (Some(h), Some(d)) if d < h => Some(ManifestFormat::Dash),
            (Some(_), _) => Some(ManifestFormat::Hls),
            (None, Some(_)) => Some(ManifestFormat::Dash),
            (None, None) => None,
        }
    }
}

impl fmt::Display for ManifestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestFormat::Hls => f.write_str("HLS"),
            ManifestFormat::Dash => f.write_str("DASH"),
        }
    }
}
