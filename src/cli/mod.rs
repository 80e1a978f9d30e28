// CLI module for gemextract
// Author: kelexine (https://github.com/kelexine)

use clap::Parser;
use std::path::PathBuf;

/// gemextract - schema-driven document extraction with implicit cache cost accounting
#[derive(Parser, Debug)]
#[command(name = "gemextract", version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file (default: ~/.gemextract/config.toml)
    #[arg(short, long, env = "GEMEXTRACT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Apply CLI overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut crate::config::AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}
