use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::resolver::Target;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135 Safari/537.36";

/// Browser-driven traffic sniffing parameters (`[sniff]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SniffConfig {
    /// Page-load timeout for each navigation, in seconds. Expiry is not fatal.
    pub navigation_timeout_secs: u64,
    /// Upper bound on the wait after the first navigation, in seconds.
    pub initial_settle_secs: u64,
    /// Upper bound on the wait after play was triggered, in seconds.
    pub final_settle_secs: u64,
    /// How often the captured-request buffer is polled while settling.
    pub poll_interval_ms: u64,
    /// How many levels of nested frames are entered below the top document.
    pub max_frame_depth: usize,
    /// How many sibling frames are entered per level.
    pub max_frames_per_level: usize,
    /// How many visible play controls are clicked per document.
    pub max_play_clicks: usize,
    /// CSS selectors tried, in order, when looking for a play control.
    pub play_selectors: Vec<String>,
    /// Manifest file-name substrings that mark a root/master playlist (lower priority).
    pub root_manifest_markers: Vec<String>,
    /// Frames hosted on these domains (or their subdomains) are not entered.
    pub skip_frame_hosts: Vec<String>,
    /// Explicit Chrome/Chromium binary; autodetected when absent.
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,
    /// Return finished sessions to a pool instead of tearing them down.
    pub reuse_sessions: bool,
    /// Maximum idle sessions kept when `reuse_sessions` is on.
    pub max_idle_sessions: usize,
    /// How long past the budget a browser call may hang before the sweep is
    /// abandoned, in milliseconds.
    pub hang_grace_ms: u64,
}

impl Default for SniffConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_secs: 20,
            initial_settle_secs: 5,
            final_settle_secs: 12,
            poll_interval_ms: 250,
            max_frame_depth: 2,
            max_frames_per_level: 4,
            max_play_clicks: 2,
            play_selectors: [
                "button[aria-label*='play' i]",
                ".vjs-big-play-button",
                ".vjs-play-control",
                ".jw-icon-play",
                ".jw-display-icon-container",
                ".plyr__control--overlaid",
                ".play-button",
                "[data-testid*='play']",
                ".play",
                ".start",
                ".iniciar",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            root_manifest_markers: vec!["master".to_string()],
            skip_frame_hosts: vec!["blogger.com".to_string(), "google.com".to_string()],
            chrome_path: None,
            reuse_sessions: false,
            max_idle_sessions: 1,
            hang_grace_ms: 5_000,
        }
    }
}

impl SniffConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn initial_settle(&self) -> Duration {
        Duration::from_secs(self.initial_settle_secs)
    }

    pub fn final_settle(&self) -> Duration {
        Duration::from_secs(self.final_settle_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }

    pub fn hang_grace(&self) -> Duration {
        Duration::from_millis(self.hang_grace_ms)
    }
}

/// Where the captured-request log goes (`[diagnostics]` section).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Directory for request logs; XDG state dir when absent.
    pub dir: Option<PathBuf>,
    /// One file per target (`debug_requests-<name>.log`) instead of a single shared file.
    pub per_target: bool,
}

/// Log output (`[logging]` section). `RUST_LOG` still wins over `filter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for the log file; XDG state dir when absent.
    pub dir: Option<PathBuf>,
    /// Log file name inside `dir`.
    pub file_name: String,
    /// `tracing` filter directives, e.g. `"warn,streamfind_core=debug"`.
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            file_name: "streamfind.log".to_string(),
            filter: None,
        }
    }
}

/// Playlist output (`[playlist]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    /// Output path; `<current dir>/streams.m3u` when absent.
    pub path: Option<PathBuf>,
    /// Value written to each entry's `group-title` attribute.
    pub group_title: String,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            path: None,
            group_title: "Varios".to_string(),
        }
    }
}

/// A configured channel: the landing page that embeds its player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    pub page_url: String,
}

impl From<&ChannelConfig> for Target {
    fn from(c: &ChannelConfig) -> Self {
        Target::new(c.name.clone(), c.page_url.clone())
    }
}

/// Global configuration loaded from `~/.config/streamfind/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamfindConfig {
    /// User-Agent sent on every plain HTTP request.
    pub user_agent: String,
    /// Timeout for the landing-page GET, in seconds.
    pub page_timeout_secs: u64,
    /// Timeout for the embed-page GET used by the static scan, in seconds.
    pub scan_timeout_secs: u64,
    /// Timeout for each HLS candidate check, in seconds.
    pub probe_timeout_secs: u64,
    /// Wall-clock budget for one whole resolution, in seconds.
    pub resolution_budget_secs: u64,
    /// Send the landing page as `Referer` when fetching the embed and probing candidates.
    pub send_referer: bool,
    /// Targets resolved concurrently by `run`.
    pub max_concurrent: usize,
    pub sniff: SniffConfig,
    pub diagnostics: DiagnosticsConfig,
    pub logging: LoggingConfig,
    pub playlist: PlaylistConfig,
    pub channels: Vec<ChannelConfig>,
}

impl Default for StreamfindConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_timeout_secs: 15,
            scan_timeout_secs: 10,
            probe_timeout_secs: 5,
            resolution_budget_secs: 90,
            send_referer: true,
            max_concurrent: 2,
            sniff: SniffConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            logging: LoggingConfig::default(),
            playlist: PlaylistConfig::default(),
            channels: Vec::new(),
        }
    }
}

impl StreamfindConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn resolution_budget(&self) -> Duration {
        Duration::from_secs(self.resolution_budget_secs)
    }

    pub fn targets(&self) -> Vec<Target> {
        self.channels.iter().map(Target::from).collect()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("streamfind")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Default state directory (`~/.local/state/streamfind`), used for logs.
pub fn state_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("streamfind")?;
    Ok(xdg_dirs.get_state_home())
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<StreamfindConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = StreamfindConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: StreamfindConfig = toml::from_str(&data)?;
    Ok(cfg)
}
