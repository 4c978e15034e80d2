//! Fetches the catalog once and prints the free offers. Never talks to Discord.

use free_games_notifier::ingest::providers::steam_featured::DEFAULT_STORE_URL;
use free_games_notifier::ingest::{CatalogFetcher, HttpSettings};
use free_games_notifier::notify::format_offer_end;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let store_url = std::env::var("STORE_URL").unwrap_or_else(|_| DEFAULT_STORE_URL.to_string());
    let fetcher = CatalogFetcher::steam(&store_url, HttpSettings::default());
    let report = fetcher.fetch_free_offers().await;

    if report.offers.is_empty() {
        println!(
            "no free games right now ({} of {} sources failed)",
            report.sources_failed, report.sources_total
        );
        return;
    }

    for offer in &report.offers {
        let ends = offer
            .discount_end
            .and_then(format_offer_end)
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "{} | was ${:.2} | ends {} | {}",
            offer.name, offer.original_price, ends, offer.store_url
        );
    }
}
