//! NPC record harvested from a wiki infobox

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single NPC entry as stored in the harvest database.
///
/// Field names are part of the on-disk format consumed by the game-data
/// patch, so they are serialized verbatim (`null` when unknown). Keys added
/// to the file by hand are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcRecord {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NpcRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_url: None,
            sex: None,
            extra: Map::new(),
        }
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_sex(mut self, sex: impl Into<String>) -> Self {
        self.sex = Some(sex.into());
        self
    }

    /// A record is complete once its attribute is known. Incomplete records
    /// are harvested again on the next run.
    pub fn is_complete(&self) -> bool {
        self.sex().is_some()
    }

    /// Non-empty attribute value, if any.
    pub fn sex(&self) -> Option<&str> {
        self.sex.as_deref().filter(|s| !s.is_empty())
    }
}
