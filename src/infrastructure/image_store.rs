//! Portrait image store
//!
//! One `<sanitized name>.jpg` per NPC. An existing file is never re-fetched
//! or overwritten, even if the source URL has changed since.

use std::path::PathBuf;

use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use super::http_client::FetchError;
use super::wiki_source::WikiSource;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to write image {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of materializing one portrait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageStatus {
    Downloaded(PathBuf),
    AlreadyPresent(PathBuf),
}

/// Replace filename-hostile characters and spaces with underscores
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' | ' ' => '_',
            other => other,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Deterministic image path for an NPC
    pub fn path_for(&self, npc_name: &str) -> PathBuf {
        self.dir.join(format!("{}.jpg", sanitize_file_name(npc_name)))
    }

    /// Download `image_url` for `npc_name` unless its file already exists.
    ///
    /// The body is written to a `.part` sibling and renamed into place, so an
    /// interrupted write never leaves a file the existence check would trust.
    pub async fn materialize(
        &self,
        source: &dyn WikiSource,
        image_url: &str,
        npc_name: &str,
    ) -> Result<ImageStatus, ImageError> {
        let path = self.path_for(npc_name);
        let write_err = |source: std::io::Error| ImageError::Write {
            path: path.clone(),
            source,
        };

        if fs::try_exists(&path).await.map_err(write_err)? {
            debug!("Image already exists: {:?}", path);
            return Ok(ImageStatus::AlreadyPresent(path));
        }

        let bytes = source.fetch_bytes(image_url).await?;

        fs::create_dir_all(&self.dir).await.map_err(write_err)?;

        let partial = path.with_extension("jpg.part");
        fs::write(&partial, &bytes).await.map_err(write_err)?;
        fs::rename(&partial, &path).await.map_err(write_err)?;

        info!("Downloaded image: {:?} ({} bytes)", path, bytes.len());
        Ok(ImageStatus::Downloaded(path))
    }
}
