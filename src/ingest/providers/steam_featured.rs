// src/ingest/providers/steam_featured.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::Deserialize;

use crate::ingest::types::{OfferRecord, OfferSource, FREE_TO_KEEP};

pub const DEFAULT_STORE_URL: &str = "https://store.steampowered.com";

#[derive(Debug, Deserialize)]
struct FeaturedCategories {
    #[serde(default)]
    specials: Option<Specials>,
}

#[derive(Debug, Deserialize)]
struct Specials {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    discount_percent: Option<i64>,
    #[serde(default)]
    original_price: Option<u64>,
    #[serde(default)]
    large_capsule_image: Option<String>,
    #[serde(default)]
    discount_expiration: Option<i64>,
}

/// Featured-categories endpoint of the Steam storefront API.
pub struct SteamFeaturedProvider {
    store_url: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http,
}

impl SteamFeaturedProvider {
    pub fn from_url(store_url: impl Into<String>) -> Self {
        Self {
            store_url: trim_store_url(store_url.into()),
            mode: Mode::Http,
        }
    }

    /// Parses a canned `featuredcategories` body instead of calling the store.
    pub fn from_fixture(body: &str) -> Self {
        Self {
            store_url: DEFAULT_STORE_URL.to_string(),
            mode: Mode::Fixture(body.to_string()),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/featuredcategories", self.store_url)
    }

    /// Keeps exactly-100% specials and normalizes them into offer records.
    pub fn parse_featured(body: &str, store_url: &str) -> Result<Vec<OfferRecord>> {
        let t0 = std::time::Instant::now();
        let doc: FeaturedCategories =
            serde_json::from_str(body).context("parsing featuredcategories json")?;
        let items = doc.specials.map(|s| s.items).unwrap_or_default();
        counter!("catalog_entries_total").increment(items.len() as u64);

        let mut out = Vec::new();
        for it in items {
            if it.discount_percent != Some(100) {
                continue;
            }
            let Some(name) = it.name.filter(|n| !n.trim().is_empty()) else {
                tracing::debug!(app_id = ?it.id, "skipping free special without a name");
                continue;
            };
            out.push(OfferRecord {
                name,
                image_url: it.large_capsule_image.filter(|u| !u.is_empty()),
                status: FREE_TO_KEEP.to_string(),
                store_url: format!("{}/app/{}", store_url, it.id.unwrap_or_default()),
                original_price: minor_to_major(it.original_price),
                discount_end: it.discount_expiration.filter(|ts| *ts > 0),
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("catalog_parse_ms").record(ms);
        counter!("catalog_free_offers_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl OfferSource for SteamFeaturedProvider {
    async fn fetch_offers(&self, client: &reqwest::Client) -> Result<Vec<OfferRecord>> {
        match &self.mode {
            Mode::Fixture(body) => Self::parse_featured(body, &self.store_url),
            Mode::Http => {
                let url = self.endpoint();
                let resp = client
                    .get(&url)
                    .send()
                    .await
                    .with_context(|| format!("GET {url}"))?
                    .error_for_status()
                    .context("featuredcategories non-2xx")?;
                let body = resp.text().await.context("featuredcategories .text()")?;
                Self::parse_featured(&body, &self.store_url)
            }
        }
    }

    fn name(&self) -> &'static str {
        "steam-featured"
    }
}

fn minor_to_major(minor: Option<u64>) -> f64 {
    minor.map(|p| p as f64 / 100.0).unwrap_or(0.0)
}

fn trim_store_url(mut s: String) -> String {
    while s.ends_with('/') {
        s.pop();
    }
    s
}
