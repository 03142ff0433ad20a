//! Configuration infrastructure
//!
//! Contains configuration loading and validation for the NPC harvester.
//!
//! Configuration is layered:
//! 1. Built-in defaults (see [`defaults`])
//! 2. Optional TOML/JSON file (`harvest.toml` unless overridden)
//! 3. Environment variables prefixed with `NPC_HARVEST_`
//!    (nested keys separated by `__`, e.g. `NPC_HARVEST_HARVEST__MAX_CONCURRENCY=4`)

#![allow(clippy::uninlined_format_args)]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {field} - {message}")]
    Validation { field: String, message: String },
}

impl ConfigError {
    fn validation(field: &str, message: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Complete harvester configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Input and output locations
    pub paths: PathsConfig,

    /// Remote wiki settings
    pub source: SourceConfig,

    /// Worker pool and checkpoint settings
    pub harvest: HarvestSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Tab-separated NPC name lists (first column, header skipped)
    pub name_lists: Vec<PathBuf>,

    /// Harvest database (JSON)
    pub database_file: PathBuf,

    /// Directory receiving `<name>.jpg` portraits
    pub images_dir: PathBuf,

    /// Game data source patched with the harvested attribute
    pub game_data_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Page URL prefix; the encoded NPC name is appended verbatim
    pub base_url: String,

    /// Static asset host whose image URLs get canonicalized
    pub image_host: String,

    /// Wiki slug in the asset path (`https://<host>/<slug>/images/...`)
    pub wiki_slug: String,

    pub user_agent: String,

    /// Timeout for each page and image request
    pub request_timeout_seconds: u64,

    /// Outbound request budget shared by all workers
    pub max_requests_per_second: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestSettings {
    /// Number of NPCs processed concurrently
    pub max_concurrency: usize,

    /// Persist the database every N completions
    pub checkpoint_interval: usize,

    /// Infobox row label holding the attribute (compared case-insensitively)
    pub attribute_label: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for log files
    pub log_dir: PathBuf,

    /// Log file name inside `log_dir`
    pub file_name: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            name_lists: defaults::NAME_LISTS.iter().map(PathBuf::from).collect(),
            database_file: PathBuf::from(defaults::DATABASE_FILE),
            images_dir: PathBuf::from(defaults::IMAGES_DIR),
            game_data_file: PathBuf::from(defaults::GAME_DATA_FILE),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: fandom::BASE_URL.to_string(),
            image_host: fandom::IMAGE_HOST.to_string(),
            wiki_slug: fandom::WIKI_SLUG.to_string(),
            user_agent: defaults::USER_AGENT.to_string(),
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
        }
    }
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            max_concurrency: defaults::MAX_CONCURRENCY,
            checkpoint_interval: defaults::CHECKPOINT_INTERVAL,
            attribute_label: fandom::ATTRIBUTE_LABEL.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: PathBuf::from(defaults::LOG_DIR),
            file_name: defaults::LOG_FILE_NAME.to_string(),
        }
    }
}

impl HarvestConfig {
    /// Load configuration from an optional file plus `NPC_HARVEST_*` environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("NPC_HARVEST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;

        if path.exists() {
            info!("Loaded configuration from: {:?}", path);
        } else {
            info!("Configuration file {:?} not found, using defaults", path);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.harvest.max_concurrency == 0 {
            return Err(ConfigError::validation(
                "harvest.max_concurrency",
                "must be greater than 0",
            ));
        }

        if self.harvest.checkpoint_interval == 0 {
            return Err(ConfigError::validation(
                "harvest.checkpoint_interval",
                "must be greater than 0",
            ));
        }

        if self.harvest.attribute_label.trim().is_empty() {
            return Err(ConfigError::validation(
                "harvest.attribute_label",
                "must not be empty",
            ));
        }

        if self.source.request_timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "source.request_timeout_seconds",
                "must be greater than 0",
            ));
        }

        if self.source.max_requests_per_second == 0 {
            return Err(ConfigError::validation(
                "source.max_requests_per_second",
                "must be greater than 0",
            ));
        }

        if let Err(e) = url::Url::parse(&self.source.base_url) {
            return Err(ConfigError::validation("source.base_url", &e.to_string()));
        }

        Ok(())
    }
}

/// Regnum Fandom wiki constants
pub mod fandom {
    /// Page URL prefix for NPC articles
    pub const BASE_URL: &str = "https://regnum.fandom.com/wiki/";

    /// Host serving wiki images (thumbnails and originals)
    pub const IMAGE_HOST: &str = "static.wikia.nocookie.net";

    /// Wiki slug in image asset paths
    pub const WIKI_SLUG: &str = "regnum";

    /// Infobox row label for the NPC's sex
    pub const ATTRIBUTE_LABEL: &str = "sex:";
}

/// Default harvesting configuration values
pub mod defaults {
    pub const NAME_LISTS: &[&str] = &[
        "rodata/alsius_fandom_npcs.txt",
        "rodata/ignis_fandom_npcs.txt",
        "rodata/syrtis_fandom_npcs.txt",
    ];

    pub const DATABASE_FILE: &str = "data/npc_fandom_data.json";

    pub const IMAGES_DIR: &str = "data/npc_images";

    pub const GAME_DATA_FILE: &str = "data/gameData.js";

    pub const CONFIG_FILE: &str = "harvest.toml";

    pub const USER_AGENT: &str = "npc-harvest/0.1 (Fandom NPC harvester)";

    /// Default request timeout in seconds (page and image requests)
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 10;

    pub const MAX_REQUESTS_PER_SECOND: u32 = 20;

    /// Default number of concurrent workers
    pub const MAX_CONCURRENCY: usize = 10;

    /// Default checkpoint cadence, in completions
    pub const CHECKPOINT_INTERVAL: usize = 10;

    pub const LOG_LEVEL: &str = "info";

    pub const LOG_JSON_FORMAT: bool = false;

    pub const LOG_CONSOLE_OUTPUT: bool = true;

    pub const LOG_FILE_OUTPUT: bool = false;

    pub const LOG_DIR: &str = "logs";

    pub const LOG_FILE_NAME: &str = "npc-harvest.log";
}

/// URL building helper functions
pub mod utils {
    /// Encode an NPC name as a wiki page path segment.
    ///
    /// Spaces become underscores first; every byte outside the unreserved
    /// set (`A-Z a-z 0-9 - _ . ~`) is then percent-encoded.
    pub fn encode_page_segment(name: &str) -> String {
        urlencoding::encode(&name.replace(' ', "_")).into_owned()
    }

    /// Build the wiki page URL for an NPC
    pub fn npc_page_url(base_url: &str, name: &str) -> String {
        format!("{}{}", base_url, encode_page_segment(name))
    }
}
