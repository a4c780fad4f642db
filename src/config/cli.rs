use clap::Parser;
use std::path::{Path, PathBuf};

use crate::config::ServerConfig;
use crate::utils::error::Result;

const DEFAULT_CONFIG_FILE: &str = "confluence.toml";

#[derive(Debug, Clone, Parser)]
#[command(name = "confluence")]
#[command(about = "HTTP gateway for the sonification transform scripts")]
pub struct CliArgs {
    /// Path to TOML configuration file (defaults to ./confluence.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override [server].bind from the config
    #[arg(long)]
    pub bind: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl CliArgs {
    /// 載入配置並套用命令列覆蓋設定
    pub fn load_config(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                ServerConfig::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => ServerConfig::default(),
        };

        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }

        Ok(config)
    }
}
