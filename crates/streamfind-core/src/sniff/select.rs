//! Manifest selection over captured traffic.
//!
//! Walks the capture in arrival order and prefers a variant playlist over a
//! root/"master" one: root manifests sometimes 404 or point at DRM-gated
//! renditions while a resolved variant is directly playable.

use crate::url_model::last_path_segment;

use super::capture::CapturedRequest;

const SIGNATURES: [&str; 2] = [".m3u8", ".mpd"];

/// Which captured URLs count as manifests, and which of those are root manifests.
#[derive(Debug, Clone)]
pub struct ManifestPolicy {
    root_markers: Vec<String>,
}

impl ManifestPolicy {
    /// `root_markers` are matched case-insensitively against the URL's file name.
    pub fn new(root_markers: &[String]) -> Self {
        Self {
            root_markers: root_markers
                .iter()
                .map(|m| m.trim().to_ascii_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// http(s) URL containing a manifest signature anywhere.
    pub fn is_manifest(&self, url: &str) -> bool {
        let lower = url.to_ascii_lowercase();
        (lower.starts_with("http://") || lower.starts_with("https://"))
            && SIGNATURES.iter().any(|sig| lower.contains(sig))
    }

    /// Manifest whose file name carries a root marker (e.g. `master.m3u8`).
    pub fn is_root(&self, url: &str) -> bool {
        let name = last_path_segment(url)
            .unwrap_or_else(|| url.to_string())
            .to_ascii_lowercase();
        self.root_markers.iter().any(|m| name.contains(m.as_str()))
    }

    fn is_preferred(&self, url: &str) -> bool {
        self.is_manifest(url) && !self.is_root(url)
    }

    /// True once a non-root manifest has been captured.
    pub fn has_preferred(&self, captured: &[CapturedRequest]) -> bool {
        captured.iter().any(|r| self.is_preferred(&r.url))
    }

    /// First non-root manifest in arrival order, else the first manifest at all.
    pub fn select<'a>(&self, captured: &'a [CapturedRequest]) -> Option<&'a CapturedRequest> {
        captured
            .iter()
            .find(|r| self.is_preferred(&r.url))
            .or_else(|| captured.iter().find(|r| self.is_manifest(&r.url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(url: &str) -> CapturedRequest {
        CapturedRequest::new("GET", url, Some(200))
    }

    fn policy() -> ManifestPolicy {
        ManifestPolicy::new(&["master".to_string()])
    }

    #[test]
    fn variant_preferred_over_master() {
        let captured = [
            req("https://a.example/live/master.m3u8"),
            req("https://b.example/live/variant_720.m3u8"),
        ];
        let chosen = policy().select(&captured).unwrap();
        assert_eq!(chosen.url, "https://b.example/live/variant_720.m3u8");

        let reversed = [captured[1].clone(), captured[0].clone()];
        let chosen = policy().select(&reversed).unwrap();
        assert_eq!(chosen.url, "https://b.example/live/variant_720.m3u8");
    }

    #[test]
    fn master_used_when_alone() {
        let captured = [
            req("https://a.example/player.js"),
            req("https://a.example/live/Master.m3u8?token=1"),
        ];
        let chosen = policy().select(&captured).unwrap();
        assert_eq!(chosen.url, "https://a.example/live/Master.m3u8?token=1");
    }

    #[test]
    fn marker_only_checked_in_file_name() {
        let captured = [req("https://master.cdn.example/live/index.m3u8")];
        assert!(policy().has_preferred(&captured));
    }

    #[test]
    fn non_http_and_non_manifest_ignored() {
        let captured = [
            req("blob:https://a.example/1234"),
            req("data:application/x-mpegurl;base64,x.m3u8"),
            req("https://a.example/seg_001.ts"),
        ];
        assert!(policy().select(&captured).is_none());
        assert!(!policy().has_preferred(&captured));
    }

    #[test]
    fn configurable_markers() {
        let p = ManifestPolicy::new(&["master".to_string(), " Playlist ".to_string(), "".to_string()]);
        assert!(p.is_root("https://x/playlist.m3u8"));
        assert!(!p.is_root("https://x/chunklist_b800.m3u8"));
        let none = ManifestPolicy::new(&[]);
        assert!(!none.is_root("https://x/master.m3u8"));
    }

    #[test]
    fn dash_manifest_selected() {
        let captured = [req("https://cdn.example/live/SA_Live_dash_enc/ch.mpd")];
        assert_eq!(
            policy().select(&captured).map(|r| r.url.as_str()),
            Some("https://cdn.example/live/SA_Live_dash_enc/ch.mpd")
        );
    }
}
