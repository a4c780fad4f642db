use std::sync::Arc;

use clap::Parser;
use confluence::utils::{logger, validation::Validate};
use confluence::{CliArgs, TokioScriptRunner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_logger(args.verbose);
    }

    tracing::info!("Starting Confluence API");

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    if args.verbose {
        tracing::debug!("Server config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let scripts = config.script_paths();
    for (name, path) in [
        ("iris", &scripts.iris),
        ("spectrum", &scripts.spectrum),
        ("loom", &scripts.loom),
    ] {
        if !path.is_file() {
            tracing::warn!("⚠️ {} script not found at {}", name, path.display());
        }
    }

    confluence::serve(config, Arc::new(TokioScriptRunner)).await?;

    Ok(())
}
