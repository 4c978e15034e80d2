// src/ingest/providers/steam_specials.rs
use anyhow::Result;
use async_trait::async_trait;

use crate::ingest::types::{OfferRecord, OfferSource};

/// Slot for the HTML specials listing. Scraping it is not supported, so this
/// source always reports no offers; it is kept so a real parser can be plugged
/// in without touching the fetch pipeline.
pub struct SteamSpecialsProvider {
    pub page_url: String,
}

impl SteamSpecialsProvider {
    pub fn new(store_url: &str) -> Self {
        Self {
            page_url: format!("{}/specials", store_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl OfferSource for SteamSpecialsProvider {
    async fn fetch_offers(&self, _client: &reqwest::Client) -> Result<Vec<OfferRecord>> {
        tracing::trace!(url = %self.page_url, "specials page source is inert");
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "steam-specials"
    }

    fn is_inert(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_empty() {
        let p = SteamSpecialsProvider::new("https://store.steampowered.com/");
        assert_eq!(p.page_url, "https://store.steampowered.com/specials");
        let out = p.fetch_offers(&reqwest::Client::new()).await.unwrap();
        assert!(out.is_empty());
        assert!(p.is_inert());
    }
}
