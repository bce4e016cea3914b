mod args;
mod run;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use args::CliArgs;

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();
    crate::telemetry::init_logging(&cli.log_level, cli.debug)?;

    info!("Starting wayrunner v{}", env!("CARGO_PKG_VERSION"));

    match run::dispatch(&cli.command, cli.config.as_deref()).await {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {}", err);
            Err(err)
        }
    }
}
