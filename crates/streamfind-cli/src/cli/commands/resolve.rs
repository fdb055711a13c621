//! `streamfind resolve <page_url>` – resolve a single page.

use anyhow::Result;
use streamfind_core::config::StreamfindConfig;
use streamfind_core::{Resolver, Target};

/// Prints `ORIGIN FORMAT URL` on success; failures become the command's error.
pub async fn run_resolve(cfg: StreamfindConfig, name: &str, page_url: &str) -> Result<()> {
    let resolver = Resolver::from_config(cfg)?;
    let target = Target::new(name, page_url);
    match resolver.resolve(&target).await {
        Ok(stream) => {
            println!("{} {} {}", stream.origin, stream.format, stream.url);
            Ok(())
        }
        Err(e) => anyhow::bail!("{}: {}", e.kind(), e),
    }
}
