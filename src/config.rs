use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_store_dir() -> PathBuf {
    home_dir().join(".canvas-chat").join("store")
}

/// Scripted chat that drives image previews into a canvas.
#[derive(Debug, Parser)]
#[command(name = "canvas-chat", version)]
pub struct Cli {
    /// Directory holding the persisted conversation.
    #[arg(long, env = "CANVAS_CHAT_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// Directory that image references such as `/images/01.png` resolve against.
    #[arg(long, env = "CANVAS_CHAT_ASSETS_DIR", default_value = "assets")]
    pub assets_dir: PathBuf,

    /// Delay before a scripted reply appears.
    #[arg(long, env = "CANVAS_CHAT_REPLY_DELAY_MS", default_value_t = 500)]
    pub reply_delay_ms: u64,

    /// Clear the persisted conversation before opening the window.
    #[arg(long)]
    pub reset: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub reply_delay: Duration,
    pub reset_on_start: bool,
}

impl AppConfig {
    pub fn from_cli(cli: Cli, workspace: &Path) -> Self {
        let assets_dir = if cli.assets_dir.is_absolute() {
            cli.assets_dir
        } else {
            workspace.join(cli.assets_dir)
        };

        Self {
            store_dir: cli.store_dir.unwrap_or_else(default_store_dir),
            assets_dir,
            reply_delay: Duration::from_millis(cli.reply_delay_ms),
            reset_on_start: cli.reset,
        }
    }

    /// Turns an image reference into a URI the egui loaders understand.
    pub fn image_uri(&self, reference: &str) -> String {
        if reference.contains("://") {
            return reference.to_string();
        }
        let relative = reference.trim_start_matches('/');
        format!("file://{}", self.assets_dir.join(relative).display())
    }
}
