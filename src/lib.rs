//! NPC Harvest - Fandom wiki NPC harvester
//!
//! Crawls the wiki page of every NPC in the configured name lists, extracts
//! the infobox portrait and attribute, downloads portraits, and keeps a
//! resumable JSON database that can be patched back into the game data.

// Module declarations
pub mod application;
pub mod domain;
pub mod harvesting;
pub mod infrastructure;

pub use application::{HarvestUseCase, PatchGameDataUseCase};
pub use domain::{NpcDatabase, NpcRecord};
pub use infrastructure::config::HarvestConfig;
