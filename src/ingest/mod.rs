// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::providers::{
    steam_featured::SteamFeaturedProvider, steam_specials::SteamSpecialsProvider,
};
use crate::ingest::types::{OfferRecord, OfferSource};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("free-games-notifier/", env!("CARGO_PKG_VERSION"));

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("catalog_entries_total", "Specials entries parsed from the catalog.");
        describe_counter!(
            "catalog_free_offers_total",
            "Entries kept because they are 100% discounted."
        );
        describe_counter!(
            "catalog_dedup_total",
            "Offers removed because an earlier one had the same name."
        );
        describe_counter!(
            "catalog_source_errors_total",
            "Offer source fetch/parse errors."
        );
        describe_histogram!("catalog_fetch_ms", "Full catalog fetch time in milliseconds.");
        describe_histogram!("catalog_parse_ms", "Catalog parse time in milliseconds.");
    });
}

/// Result of one catalog fetch across all sources.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub offers: Vec<OfferRecord>,
    /// Live sources only; inert placeholders are not counted.
    pub sources_total: usize,
    pub sources_failed: usize,
}

impl FetchReport {
    /// True when there were live sources and none of them answered.
    pub fn all_sources_failed(&self) -> bool {
        self.sources_total > 0 && self.sources_failed == self.sources_total
    }
}

/// Drops later offers whose name was already seen, keeping encounter order.
/// Returns (kept, dedup_count).
pub fn dedup_by_name(offers: Vec<OfferRecord>) -> (Vec<OfferRecord>, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(offers.len());
    let mut dedup_out = 0usize;
    for offer in offers {
        if !seen.insert(offer.name.clone()) {
            dedup_out += 1;
            continue;
        }
        keep.push(offer);
    }
    (keep, dedup_out)
}

/// Run every source once against `client`, merge and dedup.
/// Source errors are logged and counted, never returned.
pub async fn run_once(sources: &[Box<dyn OfferSource>], client: &reqwest::Client) -> FetchReport {
    ensure_metrics_described();

    let mut raw = Vec::new();
    let mut failed = 0usize;
    let live = sources.iter().filter(|s| !s.is_inert()).count();
    for s in sources {
        match s.fetch_offers(client).await {
            Ok(mut v) => raw.append(&mut v),
            Err(e) => {
                tracing::error!(error = ?e, source = s.name(), "offer source error");
                counter!("catalog_source_errors_total").increment(1);
                if !s.is_inert() {
                    failed += 1;
                }
            }
        }
    }

    let (offers, dedup_cnt) = dedup_by_name(raw);
    counter!("catalog_dedup_total").increment(dedup_cnt as u64);

    let names: Vec<&str> = offers.iter().map(|o| o.name.as_str()).collect();
    tracing::info!(count = offers.len(), ?names, "unique free offers found");

    FetchReport {
        offers,
        sources_total: live,
        sources_failed: failed,
    }
}

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Owns the offer sources; builds a fresh HTTP client for every fetch.
pub struct CatalogFetcher {
    sources: Vec<Box<dyn OfferSource>>,
    http: HttpSettings,
}

impl CatalogFetcher {
    pub fn new(sources: Vec<Box<dyn OfferSource>>, http: HttpSettings) -> Self {
        Self { sources, http }
    }

    /// Featured-categories API plus the (inert) specials page.
    pub fn steam(store_url: &str, http: HttpSettings) -> Self {
        let sources: Vec<Box<dyn OfferSource>> = vec![
            Box::new(SteamFeaturedProvider::from_url(store_url)),
            Box::new(SteamSpecialsProvider::new(store_url)),
        ];
        Self::new(sources, http)
    }

    pub async fn fetch_free_offers(&self) -> FetchReport {
        let t0 = std::time::Instant::now();
        let client = match reqwest::Client::builder()
            .timeout(self.http.timeout)
            .user_agent(self.http.user_agent.clone())
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = ?e, "could not build catalog http client");
                let live = self.sources.iter().filter(|s| !s.is_inert()).count();
                counter!("catalog_source_errors_total").increment(live as u64);
                return FetchReport {
                    offers: Vec::new(),
                    sources_total: live,
                    sources_failed: live,
                };
            }
        };

        let report = run_once(&self.sources, &client).await;
        // client (and its pool) is dropped here
        drop(client);

        histogram!("catalog_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::FREE_TO_KEEP;

    fn offer(name: &str, price: f64) -> OfferRecord {
        OfferRecord {
            name: name.into(),
            image_url: None,
            status: FREE_TO_KEEP.into(),
            store_url: format!("https://store.steampowered.com/app/{name}"),
            original_price: price,
            discount_end: None,
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let raw = vec![offer("A", 1.0), offer("B", 2.0), offer("A", 3.0), offer("C", 4.0)];
        let (kept, dedup) = dedup_by_name(raw);
        let names: Vec<_> = kept.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(kept[0].original_price, 1.0);
        assert_eq!(dedup, 1);
    }

    #[test]
    fn all_failed_needs_at_least_one_source() {
        assert!(!FetchReport::default().all_sources_failed());
        let r = FetchReport {
            offers: vec![],
            sources_total: 2,
            sources_failed: 2,
        };
        assert!(r.all_sources_failed());
    }
}
