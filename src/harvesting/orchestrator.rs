//! # Harvest Orchestrator
//!
//! Fans the pending NPCs out to a bounded pool of spawned workers and
//! consumes their completions, in arrival order, on a single coordinator.
//! The coordinator is the only writer of the database, so merges and
//! checkpoints need no locking.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::workers::{HarvestedNpc, NpcHarvestWorker, WorkerError};
use crate::domain::NpcDatabase;
use crate::infrastructure::config::{HarvestSettings, defaults};
use crate::infrastructure::npc_store::{CheckpointStore, StoreError};

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Failed to persist database: {0}")]
    Persist(#[from] StoreError),
}

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum number of NPC pipelines in flight
    pub max_concurrency: usize,

    /// Save the database every N completions
    pub checkpoint_interval: usize,
}

impl OrchestratorConfig {
    pub fn from_settings(settings: &HarvestSettings) -> Self {
        Self {
            max_concurrency: settings.max_concurrency.max(1),
            checkpoint_interval: settings.checkpoint_interval.max(1),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: defaults::MAX_CONCURRENCY,
            checkpoint_interval: defaults::CHECKPOINT_INTERVAL,
        }
    }
}

/// End-of-run summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvestReport {
    /// NPCs in the catalog
    pub catalog_size: usize,
    /// Catalog NPCs skipped because their record is complete
    pub already_complete: usize,
    /// NPCs attempted this run
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_names: Vec<String>,
    /// NPCs never started because the run was interrupted
    pub cancelled_names: Vec<String>,
    pub checkpoints: usize,
    pub duration: Duration,
}

impl HarvestReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.cancelled_names.is_empty()
    }
}

impl fmt::Display for HarvestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processing complete!")?;
        writeln!(f, "  Success: {}", self.succeeded)?;
        writeln!(f, "  Failed:  {}", self.failed)?;
        writeln!(f, "  Total:   {}", self.total)?;
        if !self.cancelled_names.is_empty() {
            writeln!(f, "  Cancelled: {}", self.cancelled_names.len())?;
        }
        if !self.failed_names.is_empty() {
            writeln!(f, "Failed NPCs:")?;
            for name in &self.failed_names {
                writeln!(f, "  - {name}")?;
            }
        }
        Ok(())
    }
}

/// One finished pipeline, as seen by the coordinator
struct WorkerCompletion {
    npc_name: String,
    outcome: Result<HarvestedNpc, WorkerError>,
}

/// Main orchestrator that coordinates the harvesting run
pub struct HarvestOrchestrator<S: CheckpointStore> {
    worker: Arc<NpcHarvestWorker>,
    store: S,
    config: OrchestratorConfig,
    cancellation_token: CancellationToken,
}

impl<S: CheckpointStore> HarvestOrchestrator<S> {
    pub fn new(worker: Arc<NpcHarvestWorker>, store: S, config: OrchestratorConfig) -> Self {
        Self {
            worker,
            store,
            config,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Use an externally owned token, e.g. one cancelled on Ctrl-C
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Harvest every catalog NPC whose record is missing or incomplete,
    /// merging results into `database`.
    pub async fn run(
        &self,
        database: &mut NpcDatabase,
        catalog: &[String],
    ) -> Result<HarvestReport, OrchestratorError> {
        let start_time = Instant::now();
        let work_set = database.pending_names(catalog);

        let mut report = HarvestReport {
            catalog_size: catalog.len(),
            already_complete: catalog.len() - work_set.len(),
            total: work_set.len(),
            ..Default::default()
        };

        info!("Already processed: {}", report.already_complete);
        info!("To process: {}", report.total);

        if work_set.is_empty() {
            info!("All NPCs already processed!");
            return Ok(report);
        }

        info!(
            "🚀 Processing with {} parallel workers (checkpoint every {})",
            self.config.max_concurrency, self.config.checkpoint_interval
        );

        let mut completions = self.spawn_workers(work_set);
        let mut completed = 0usize;

        while let Some(WorkerCompletion { npc_name, outcome }) = completions.recv().await {
            completed += 1;
            let progress = format!("[{}/{}]", completed, report.total);

            match outcome {
                Ok(harvested) => {
                    database.merge(&npc_name, harvested.record);
                    report.succeeded += 1;
                    info!("{} ✓ {}", progress, npc_name);
                }
                Err(WorkerError::Cancelled) => {
                    report.cancelled_names.push(npc_name.clone());
                    debug!("{} - {} (cancelled)", progress, npc_name);
                }
                Err(e) => {
                    report.failed += 1;
                    warn!("{} ✗ {}: {}", progress, npc_name, e);
                    report.failed_names.push(npc_name);
                }
            }

            if completed % self.config.checkpoint_interval == 0 {
                match self.store.save(database).await {
                    Ok(()) => {
                        report.checkpoints += 1;
                        info!("  → Progress saved ({}/{})", completed, report.total);
                    }
                    Err(e) => error!("Checkpoint at {} completions failed: {}", completed, e),
                }
            }
        }

        self.store.save(database).await?;
        report.checkpoints += 1;
        report.duration = start_time.elapsed();

        if !report.cancelled_names.is_empty() {
            warn!(
                "Run interrupted, {} NPCs were not started",
                report.cancelled_names.len()
            );
        }

        Ok(report)
    }

    /// Spawn one task per NPC, gated by the concurrency semaphore. Every task
    /// sends exactly one completion; the channel closes when all are done.
    fn spawn_workers(&self, work_set: Vec<String>) -> mpsc::UnboundedReceiver<WorkerCompletion> {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));

        for npc_name in work_set {
            let worker = Arc::clone(&self.worker);
            let semaphore = Arc::clone(&semaphore);
            let completion_tx = completion_tx.clone();
            let token = self.cancellation_token.clone();

            tokio::spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) if token.is_cancelled() => Err(WorkerError::Cancelled),
                    Ok(_permit) => AssertUnwindSafe(worker.harvest(&npc_name))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| Err(WorkerError::Panicked(panic_message(panic.as_ref())))),
                    Err(e) => Err(WorkerError::PoolClosed(e.to_string())),
                };

                // The coordinator only stops receiving once every sender is gone.
                let _ = completion_tx.send(WorkerCompletion { npc_name, outcome });
            });
        }

        completion_rx
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
