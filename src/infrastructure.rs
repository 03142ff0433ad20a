//! Infrastructure layer for remote access, parsing, and persistence
//!
//! This module provides the wiki HTTP client, infobox parsing, image and
//! database storage, name lists, the game-data patch, configuration and logging.

pub mod config; // Configuration loading and defaults
pub mod gamedata_patch;
pub mod http_client; // Rate-limited HTTP client
pub mod image_store;
pub mod infobox_parser;
pub mod logging; // Logging infrastructure
pub mod name_catalog;
pub mod npc_store;
pub mod parsing_error;
pub mod wiki_source;

// Re-export commonly used items
pub use config::{HarvestConfig, fandom};
pub use gamedata_patch::{GameDataPatcher, PatchSummary};
pub use http_client::{FetchError, HttpClient, HttpClientConfig};
pub use image_store::{ImageError, ImageStatus, ImageStore};
pub use infobox_parser::{InfoboxParserConfig, NpcInfoboxParser};
pub use logging::{init_logging_with_config, log_system_info};
pub use name_catalog::{CatalogError, load_name_catalog};
pub use npc_store::{CheckpointStore, JsonDatabaseStore, StoreError};
pub use parsing_error::{ParsingError, ParsingResult};
pub use wiki_source::{FandomSource, WikiSource};
