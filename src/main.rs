use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use npc_harvest_lib::infrastructure::config::defaults;
use npc_harvest_lib::infrastructure::logging::{init_logging_with_config, log_system_info};
use npc_harvest_lib::{HarvestConfig, HarvestUseCase, PatchGameDataUseCase};

#[derive(Parser, Debug)]
#[command(name = "npc-harvest", version, about = "Harvest NPC portraits and attributes from a Fandom wiki")]
struct Cli {
    /// Configuration file (TOML or JSON); missing file means built-in defaults
    #[arg(short, long, default_value = defaults::CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Harvest every incomplete NPC from the name lists (default)
    Harvest,
    /// Insert harvested attributes into the game data file
    PatchGameData {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = HarvestConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;

    init_logging_with_config(&config.logging)?;
    log_system_info();

    let result = match cli.command.unwrap_or(Command::Harvest) {
        Command::Harvest => run_harvest(config).await,
        Command::PatchGameData { dry_run } => run_patch(&config, dry_run).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn run_harvest(config: HarvestConfig) -> Result<()> {
    let report = HarvestUseCase::new(config)?.execute().await?;
    for line in report.to_string().lines() {
        info!("{}", line);
    }
    Ok(())
}

async fn run_patch(config: &HarvestConfig, dry_run: bool) -> Result<()> {
    let summary = PatchGameDataUseCase::new(config).execute(dry_run).await?;
    info!("Done! {} entries updated", summary.lines_updated);
    Ok(())
}
