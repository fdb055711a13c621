//! M3U playlist output for resolved channels.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::resolver::ResolvedStream;

/// Renders `#EXTM3U` followed by one `#EXTINF` line and one URL line per
/// entry, entries separated by a blank line.
pub fn render(entries: &[(String, ResolvedStream)], group_title: &str) -> String {
    let group = attr_value(group_title);
    let blocks: Vec<String> = entries
        .iter()
        .map(|(name, stream)| {
            format!(
                "#EXTINF:-1 tvg-name=\"{}\" group-title=\"{}\", {}\n{}",
                attr_value(name),
                group,
                display_name(name),
                stream.url
            )
        })
        .collect();
    format!("#EXTM3U\n{}\n", blocks.join("\n\n"))
}

/// Attribute values cannot carry quotes or line breaks.
fn attr_value(s: &str) -> String {
    display_name(s).replace('"', "'")
}

fn display_name(s: &str) -> String {
    s.split(['\r', '\n']).collect::<Vec<_>>().join(" ").trim().to_string()
}

/// Writes the playlist atomically: temp file in the same directory, then rename.
pub fn write_playlist(path: &Path, entries: &[(String, ResolvedStream)], group_title: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).context("create temp playlist")?;
    tmp.write_all(render(entries, group_title).as_bytes())
        .context("write playlist")?;
    tmp.persist(path)
        .map_err(|e| anyhow::anyhow!("persist {}: {}", path.display(), e.error))?;
    tracing::info!("wrote {} entries to {}", entries.len(), path.display());
    Ok(())
}
