//! `streamfind run` – resolve every configured channel and write the playlist.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use streamfind_core::config::StreamfindConfig;
use streamfind_core::playlist;
use streamfind_core::resolver::resolve_all;
use streamfind_core::Resolver;

const DEFAULT_PLAYLIST: &str = "streams.m3u";

pub async fn run_run(cfg: StreamfindConfig, jobs: Option<usize>, output: Option<PathBuf>) -> Result<()> {
    let targets = cfg.targets();
    if targets.is_empty() {
        println!("No channels configured; nothing to resolve.");
        return Ok(());
    }
    let jobs = jobs.unwrap_or(cfg.max_concurrent).max(1);
    let output = match output.or_else(|| cfg.playlist.path.clone()) {
        Some(path) => path,
        None => std::env::current_dir()?.join(DEFAULT_PLAYLIST),
    };
    let group_title = cfg.playlist.group_title.clone();

    tracing::info!("resolving {} channel(s), {} at a time", targets.len(), jobs);
    let resolver = Arc::new(Resolver::from_config(cfg)?);
    let results = resolve_all(resolver, targets, jobs).await;

    let mut entries = Vec::new();
    for (target, outcome) in results {
        match outcome {
            Ok(stream) => {
                println!("{:<28} ok    {} {}", target.name, stream.format, stream.url);
                entries.push((target.name, stream));
            }
            Err(e) => println!("{:<28} fail  {}: {}", target.name, e.kind(), e),
        }
    }

    if entries.is_empty() {
        anyhow::bail!("no channel resolved; playlist not written");
    }
    playlist::write_playlist(&output, &entries, &group_title)?;
    println!("Wrote {} entries to {}", entries.len(), output.display());
    Ok(())
}
