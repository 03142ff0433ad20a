//! Application use cases for the NPC harvester
//!
//! `HarvestUseCase` runs one harvesting pass; `PatchGameDataUseCase` feeds the
//! harvested attribute back into the game data source.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::NpcDatabase;
use crate::harvesting::{HarvestOrchestrator, HarvestReport, NpcHarvestWorker, OrchestratorConfig};
use crate::infrastructure::config::HarvestConfig;
use crate::infrastructure::gamedata_patch::{GameDataPatcher, PatchSummary};
use crate::infrastructure::image_store::ImageStore;
use crate::infrastructure::infobox_parser::{InfoboxParserConfig, NpcInfoboxParser};
use crate::infrastructure::name_catalog::load_name_catalog;
use crate::infrastructure::npc_store::JsonDatabaseStore;
use crate::infrastructure::wiki_source::{FandomSource, WikiSource};

// ============================================================================
// Harvest
// ============================================================================

pub struct HarvestUseCase {
    config: HarvestConfig,
    source: Arc<dyn WikiSource>,
}

impl HarvestUseCase {
    /// Build against the live wiki described by `config.source`
    pub fn new(config: HarvestConfig) -> Result<Self> {
        let source = FandomSource::from_config(&config.source)
            .context("Failed to create wiki HTTP client")?;
        Ok(Self::with_source(config, Arc::new(source)))
    }

    pub fn with_source(config: HarvestConfig, source: Arc<dyn WikiSource>) -> Self {
        Self { config, source }
    }

    /// Run one pass, stopping early (with a final save) on Ctrl-C
    pub async fn execute(&self) -> Result<HarvestReport> {
        let token = CancellationToken::new();
        let signal_token = token.clone();
        let signal_task = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, finishing in-flight NPCs and saving");
                signal_token.cancel();
            }
        });

        let result = self.execute_with_cancellation(token).await;
        signal_task.abort();
        result
    }

    pub async fn execute_with_cancellation(&self, token: CancellationToken) -> Result<HarvestReport> {
        let paths = &self.config.paths;
        let store = JsonDatabaseStore::new(&paths.database_file);

        let mut database: NpcDatabase = store
            .load()
            .await
            .with_context(|| format!("Refusing to run with unreadable database {:?}", paths.database_file))?;

        let catalog = load_name_catalog(&paths.name_lists)
            .await
            .context("Failed to load NPC name lists")?;
        info!("Total unique NPCs: {}", catalog.len());

        let parser_config = InfoboxParserConfig::from_config(&self.config.source, &self.config.harvest);
        let parser = NpcInfoboxParser::with_config(&parser_config)
            .context("Failed to compile infobox parser")?;

        let worker = NpcHarvestWorker::new(
            Arc::clone(&self.source),
            Arc::new(parser),
            ImageStore::new(&paths.images_dir),
        );

        let orchestrator = HarvestOrchestrator::new(
            Arc::new(worker),
            store,
            OrchestratorConfig::from_settings(&self.config.harvest),
        )
        .with_cancellation_token(token);

        let report = orchestrator
            .run(&mut database, &catalog)
            .await
            .context("Harvest run failed")?;

        info!(
            "Database now holds {} records ({} complete)",
            database.len(),
            database.complete_count()
        );
        info!("Data saved to: {:?}", paths.database_file);
        info!("Images saved to: {:?}", paths.images_dir);

        Ok(report)
    }
}

// ============================================================================
// Game data patch
// ============================================================================

pub struct PatchGameDataUseCase {
    database_file: PathBuf,
    game_data_file: PathBuf,
}

impl PatchGameDataUseCase {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            database_file: config.paths.database_file.clone(),
            game_data_file: config.paths.game_data_file.clone(),
        }
    }

    /// Patch the game data file in place; with `dry_run` only report
    pub async fn execute(&self, dry_run: bool) -> Result<PatchSummary> {
        let database = JsonDatabaseStore::new(&self.database_file)
            .load()
            .await
            .with_context(|| format!("Failed to load database {:?}", self.database_file))?;
        info!("Loaded {} NPCs with sex data", database.complete_count());

        let content = tokio::fs::read_to_string(&self.game_data_file)
            .await
            .with_context(|| format!("Failed to read game data {:?}", self.game_data_file))?;

        let patcher = GameDataPatcher::new().context("Failed to compile game data patterns")?;
        let (patched, summary) = patcher.patch(&content, &database);

        info!("Updated {} NPCs with sex field", summary.lines_updated);
        info!("Already patched: {}", summary.lines_already_patched);
        info!("Without data: {}", summary.lines_without_data);

        if dry_run {
            info!("Dry run, {:?} left unchanged", self.game_data_file);
        } else if summary.lines_updated > 0 {
            tokio::fs::write(&self.game_data_file, patched)
                .await
                .with_context(|| format!("Failed to write game data {:?}", self.game_data_file))?;
            info!("Wrote {:?}", self.game_data_file);
        }

        Ok(summary)
    }
}
