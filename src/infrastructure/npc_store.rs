//! JSON persistence for the harvest database
//!
//! The whole database is rewritten on every save (pretty-printed, non-ASCII
//! kept literal). There is no journaling: records merged after the last
//! save are lost if the process dies.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::domain::NpcDatabase;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read database {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database {path:?} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize database: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to write database {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Destination for database checkpoints
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn save(&self, database: &NpcDatabase) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct JsonDatabaseStore {
    path: PathBuf,
}

impl JsonDatabaseStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the database. A missing file is an empty database; an unreadable
    /// or malformed file is an error and must stop the run.
    pub async fn load(&self) -> Result<NpcDatabase, StoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No database at {:?}, starting empty", self.path);
                return Ok(NpcDatabase::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let mut database: NpcDatabase =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;

        let repaired = database.normalize_names();
        if repaired > 0 {
            warn!("Repaired {} record names in {:?}", repaired, self.path);
        }

        info!("Loaded {} NPC records from {:?}", database.len(), self.path);
        Ok(database)
    }
}

#[async_trait]
impl CheckpointStore for JsonDatabaseStore {
    async fn save(&self, database: &NpcDatabase) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Write {
                    path: self.path.clone(),
                    source,
                })?;
        }

        let content = serde_json::to_string_pretty(database).map_err(StoreError::Serialize)?;

        fs::write(&self.path, content)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!("Saved {} NPC records to {:?}", database.len(), self.path);
        Ok(())
    }
}
