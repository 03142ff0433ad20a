//! # NPC Harvest Worker
//!
//! Runs the per-NPC pipeline: fetch page → extract infobox → materialize
//! portrait. Steps for one NPC are strictly sequential; workers never share
//! state beyond the read-only parser and the image directory, where each one
//! only writes the file named after its own NPC.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::NpcRecord;
use crate::infrastructure::http_client::FetchError;
use crate::infrastructure::image_store::{ImageError, ImageStatus, ImageStore};
use crate::infrastructure::infobox_parser::NpcInfoboxParser;
use crate::infrastructure::parsing_error::ParsingError;
use crate::infrastructure::wiki_source::WikiSource;

/// Failure that keeps an NPC out of the database for this run
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Content mismatch: {0}")]
    NotFound(#[from] ParsingError),

    #[error("Worker panicked: {0}")]
    Panicked(String),

    #[error("Cancelled before start")]
    Cancelled,

    #[error("Worker pool closed: {0}")]
    PoolClosed(String),
}

/// Portrait outcome; never fails the record
#[derive(Debug)]
pub enum ImageOutcome {
    Stored(ImageStatus),
    Failed(ImageError),
    NoImageUrl,
}

/// Successful pipeline result for one NPC
#[derive(Debug)]
pub struct HarvestedNpc {
    /// Keyed by the expected name
    pub record: NpcRecord,
    pub image: ImageOutcome,
}

pub struct NpcHarvestWorker {
    source: Arc<dyn WikiSource>,
    parser: Arc<NpcInfoboxParser>,
    images: ImageStore,
}

impl NpcHarvestWorker {
    pub fn new(source: Arc<dyn WikiSource>, parser: Arc<NpcInfoboxParser>, images: ImageStore) -> Self {
        Self {
            source,
            parser,
            images,
        }
    }

    /// Run the full pipeline for one NPC
    pub async fn harvest(&self, npc_name: &str) -> Result<HarvestedNpc, WorkerError> {
        let start_time = Instant::now();

        let html = self.source.fetch_page(npc_name).await?;

        let mut record = self.parser.extract(&html, npc_name)?;
        if record.name != npc_name {
            warn!(
                "{}: name mismatch, expected '{}', found '{}'",
                npc_name, npc_name, record.name
            );
            record.name = npc_name.to_string();
        }

        if let Some(sex) = record.sex() {
            info!("  {}: Sex: {}", npc_name, sex);
        }

        let image = match record.image_url.as_deref() {
            Some(url) => match self.images.materialize(self.source.as_ref(), url, npc_name).await {
                Ok(status) => ImageOutcome::Stored(status),
                Err(e) => {
                    warn!("  {}: image download failed: {}", npc_name, e);
                    ImageOutcome::Failed(e)
                }
            },
            None => {
                info!("  {}: No image URL found", npc_name);
                ImageOutcome::NoImageUrl
            }
        };

        debug!("{} harvested in {:?}", npc_name, start_time.elapsed());
        Ok(HarvestedNpc { record, image })
    }
}
