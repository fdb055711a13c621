//! Path segment extraction.

/// Returns the last non-empty path segment of `url` (query and fragment excluded).
///
/// Returns `None` if the URL cannot be parsed or the path is empty/root.
pub fn last_path_segment(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path().split('/').filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_file_name() {
        assert_eq!(
            last_path_segment("https://cdn.example.com/live/ch/master.m3u8").as_deref(),
            Some("master.m3u8")
        );
        assert_eq!(
            last_path_segment("https://cdn.example.com/v/index_720.m3u8?token=abc").as_deref(),
            Some("index_720.m3u8")
        );
    }

    #[test]
    fn root_or_unparseable() {
        assert_eq!(last_path_segment("https://example.com/"), None);
        assert_eq!(last_path_segment("https://example.com"), None);
        assert_eq!(last_path_segment("cdn/x.m3u8"), None);
    }
}
