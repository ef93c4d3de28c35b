//! CLI argument parsing using clap.

use clap::Parser;
use std::path::PathBuf;

/// flockbot - Messenger bot for crowd-sourced bird flock reports
#[derive(Parser, Debug, Clone)]
#[command(name = "flockbot")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Settings file (default: ~/.flockbot/settings.toml)
    #[arg(short = 'c', long, env = "FLOCKBOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the listen address from settings
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port from settings
    #[arg(short = 'p', long, env = "PORT")]
    pub port: Option<u16>,

    /// Write the settings template and exit
    #[arg(long)]
    pub init_config: bool,

    /// Show verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Args {
    /// Settings file to load.
    pub fn settings_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::settings::settings_path)
    }
}
