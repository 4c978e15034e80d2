// src/ingest/types.rs
use anyhow::Result;

/// Label attached to every 100%-discounted catalog entry.
pub const FREE_TO_KEEP: &str = "Free to Keep!";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct OfferRecord {
    pub name: String,              // display title, also the dedup key
    pub image_url: Option<String>, // capsule image
    pub status: String,            // e.g. "Free to Keep!"
    pub store_url: String,         // {store}/app/{id}
    pub original_price: f64,       // major units (minor / 100)
    pub discount_end: Option<i64>, // unix seconds
}

impl OfferRecord {
    /// Key used for diffing consecutive snapshots: `"<name> - <status>"`.
    pub fn identity_key(&self) -> String {
        format!("{} - {}", self.name, self.status)
    }
}

#[async_trait::async_trait]
pub trait OfferSource: Send + Sync {
    /// `client` lives for one catalog fetch only.
    async fn fetch_offers(&self, client: &reqwest::Client) -> Result<Vec<OfferRecord>>;
    fn name(&self) -> &'static str;

    /// Placeholder sources never fail, so they say nothing about store health.
    fn is_inert(&self) -> bool {
        false
    }
}
