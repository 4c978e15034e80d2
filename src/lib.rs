// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod change_detector;
pub mod chat;
pub mod commands;
pub mod config;
pub mod delta;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod scheduler;

// ---- Re-exports for stable public API ----
pub use crate::api::create_router;
pub use crate::change_detector::{CycleDriver, CycleOutcome, Target};
pub use crate::delta::{compute_delta, Delta, Snapshot};
pub use crate::ingest::types::OfferRecord;
pub use crate::ingest::CatalogFetcher;

use std::sync::Arc;

use crate::chat::ChatPlatform;
use crate::config::BotConfig;
use crate::ingest::HttpSettings;

/// Wire a cycle driver for the real Steam catalog from `cfg`.
pub fn build_driver(cfg: &BotConfig, platform: Arc<dyn ChatPlatform>) -> CycleDriver {
    let fetcher = CatalogFetcher::steam(
        &cfg.store_url,
        HttpSettings {
            timeout: cfg.http_timeout,
            ..HttpSettings::default()
        },
    );
    let target = Target {
        channel: cfg.channel_id,
        role_name: cfg.role_name.clone(),
    };
    CycleDriver::new(fetcher, platform, target)
        .keep_snapshot_on_fetch_failure(cfg.keep_snapshot_on_fetch_failure)
}
