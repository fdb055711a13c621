//! CLI for the streamfind resolution engine.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use streamfind_core::{config, logging};

use commands::{run_channels, run_resolve, run_run};

/// Top-level CLI for streamfind.
#[derive(Debug, Parser)]
#[command(name = "streamfind")]
#[command(about = "Find the live HLS/DASH manifest behind a channel page", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Resolve one landing page and print the manifest URL.
    Resolve {
        /// Page that embeds the player.
        page_url: String,

        /// Name used in logs and diagnostics file names.
        #[arg(long, default_value = "cli")]
        name: String,
    },

    /// Resolve every configured channel and write the playlist.
    Run {
        /// Resolve up to N channels concurrently (default: `max_concurrent` from config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,

        /// Playlist path (default: `[playlist].path` from config, else ./streams.m3u).
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// List configured channels.
    Channels,
}

impl CliCommand {
    /// Parses the command line, loads the config, installs logging as the
    /// `[logging]` section asks, then dispatches.
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;

        if let Err(e) = logging::init_logging(&cfg.logging) {
            logging::init_logging_stderr(&cfg.logging);
            tracing::warn!("file logging unavailable, using stderr: {:#}", e);
        }
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Resolve { page_url, name } => run_resolve(cfg, &name, &page_url).await?,
            CliCommand::Run { jobs, output } => run_run(cfg, jobs, output).await?,
            CliCommand::Channels => run_channels(&cfg),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
