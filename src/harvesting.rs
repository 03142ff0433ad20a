//! Harvesting pipeline
//!
//! Per-NPC workers and the orchestrator that runs them against the database.

pub mod orchestrator;
pub mod workers;

pub use orchestrator::{HarvestOrchestrator, HarvestReport, OrchestratorConfig, OrchestratorError};
pub use workers::{HarvestedNpc, ImageOutcome, NpcHarvestWorker, WorkerError};
