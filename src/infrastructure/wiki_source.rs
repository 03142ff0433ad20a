//! Remote wiki access
//!
//! Workers talk to the wiki through [`WikiSource`] so the pipeline can be
//! driven by an in-memory source in tests.

use async_trait::async_trait;

use super::config::{SourceConfig, utils};
use super::http_client::{FetchError, HttpClient, HttpClientConfig};

#[async_trait]
pub trait WikiSource: Send + Sync + 'static {
    /// Raw markup of the NPC's wiki page
    async fn fetch_page(&self, npc_name: &str) -> Result<String, FetchError>;

    /// Raw bytes of an image
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fandom wiki reached over HTTP
pub struct FandomSource {
    http_client: HttpClient,
    base_url: String,
}

impl FandomSource {
    pub fn new(http_client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(source: &SourceConfig) -> anyhow::Result<Self> {
        let http_client = HttpClient::new(HttpClientConfig::from_source_config(source))?;
        Ok(Self::new(http_client, source.base_url.clone()))
    }

    pub fn page_url(&self, npc_name: &str) -> String {
        utils::npc_page_url(&self.base_url, npc_name)
    }
}

#[async_trait]
impl WikiSource for FandomSource {
    async fn fetch_page(&self, npc_name: &str) -> Result<String, FetchError> {
        self.http_client.get_text(&self.page_url(npc_name)).await
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.http_client.get_bytes(url).await
    }
}
