//! `streamfind channels` – list configured channels.

use streamfind_core::config::{self, StreamfindConfig};

pub fn run_channels(cfg: &StreamfindConfig) {
    if cfg.channels.is_empty() {
        match config::config_path() {
            Ok(path) => println!("No channels configured. Add [[channels]] entries to {}.", path.display()),
            Err(_) => println!("No channels configured."),
        }
        return;
    }
    println!("{:<4} {:<28} {}", "#", "NAME", "PAGE");
    for (i, c) in cfg.channels.iter().enumerate() {
        println!("{:<4} {:<28} {}", i + 1, c.name, c.page_url);
    }
}
