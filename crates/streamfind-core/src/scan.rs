//! Static manifest scanner: fetch a page and regex-search its raw text.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::Probe;
use crate::fetch::{self, RequestOptions};

/// An absolute http(s) URL ending in a manifest extension, plus any query/tail
/// up to the next quote or whitespace.
static MANIFEST_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^'"\s]+\.(?:m3u8|mpd)[^'"\s]*"#).expect("manifest regex is valid")
});

/// Returns the first manifest URL in `text`.
///
/// Inline player configs often carry JSON-escaped URLs (`https:\/\/...`); if
/// the raw text has no match, it is searched once more with `\/` unescaped.
pub fn find_manifest_url(text: &str) -> Option<String> {
    if let Some(m) = MANIFEST_URL.find(text) {
        return Some(m.as_str().to_string());
    }
    if !text.contains("\\/") {
        return None;
    }
    let unescaped = text.replace("\\/", "/");
    MANIFEST_URL.find(&unescaped).map(|m| m.as_str().to_string())
}

/// Fetches `url` and scans the body for a manifest URL.
///
/// Never fails: transport errors come back as `Probe::Failed`, which callers
/// treat exactly like `Probe::NotFound`.
pub fn scan_url(url: &str, opts: &RequestOptions) -> Probe<String> {
    match fetch::get_text(url, opts) {
        Ok(page) => {
            tracing::debug!(
                "static scan {} -> HTTP {} ({} bytes)",
                url,
                page.status,
                page.body.len()
            );
            match find_manifest_url(&page.body) {
                Some(found) => Probe::Found(found),
                None => Probe::NotFound,
            }
        }
        Err(e) => Probe::Failed(format!("GET {url}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_whitespace() {
        let text = "var src = https://cdn.example.com/live/ch1.m3u8?tok=abc def";
        assert_eq!(
            find_manifest_url(text).as_deref(),
            Some("https://cdn.example.com/live/ch1.m3u8?tok=abc")
        );
    }

    #[test]
    fn stops_at_quotes() {
        let text = r#"player.setup({file:"https://cdn.example.com/a/index.mpd?x=1",autostart:true})"#;
        assert_eq!(
            find_manifest_url(text).as_deref(),
            Some("https://cdn.example.com/a/index.mpd?x=1")
        );
        let single = "source='http://edge.example.net/hls/ch.m3u8'";
        assert_eq!(
            find_manifest_url(single).as_deref(),
            Some("http://edge.example.net/hls/ch.m3u8")
        );
    }

    #[test]
    fn first_match_wins() {
        let text = "a https://x.example/one.mpd b https://x.example/two.m3u8";
        assert_eq!(find_manifest_url(text).as_deref(), Some("https://x.example/one.mpd"));
    }

    #[test]
    fn json_escaped_urls() {
        let text = r#"{"hls":"https:\/\/cdn.example.com\/live\/ch2.m3u8?t=9"}"#;
        assert_eq!(
            find_manifest_url(text).as_deref(),
            Some("https://cdn.example.com/live/ch2.m3u8?t=9")
        );
    }

    #[test]
    fn no_manifest() {
        assert_eq!(find_manifest_url("<video src='https://x/y.mp4'></video>"), None);
        assert_eq!(find_manifest_url("see ch1.m3u8 (relative)"), None);
        assert_eq!(find_manifest_url(""), None);
    }

    #[test]
    fn unreachable_host_is_failed_probe() {
        let opts = RequestOptions::new("test", std::time::Duration::from_secs(2));
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let probe = scan_url(&format!("http://127.0.0.1:{port}/embed"), &opts);
        assert!(matches!(probe, Probe::Failed(_)));
    }
}
