use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::chat::{ChannelId, ChatPlatform, GuildId, Role};
use crate::delta::{compute_delta, Snapshot};
use crate::ingest::CatalogFetcher;
use crate::notify::{announce, AnnounceReport};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("cycle_runs_total", "Fetch/diff/notify cycles started.");
        describe_counter!(
            "cycle_aborted_total",
            "Cycles aborted because the channel or role was unavailable."
        );
        describe_counter!("cycle_new_offers_total", "Offers seen for the first time.");
        describe_counter!("notify_sent_total", "Announcements delivered.");
        describe_counter!("notify_failed_total", "Announcements that failed to send.");
        describe_gauge!("snapshot_size", "Offers remembered after the last cycle.");
        describe_gauge!("cycle_last_run_ts", "Unix ts when the last cycle completed.");
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    ChannelNotFound(ChannelId),
    RoleNotFound(String),
    Platform(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed {
        fetched: usize,
        new_offers: usize,
        report: AnnounceReport,
        snapshot_kept: bool,
    },
    Aborted(AbortReason),
}

/// Where announcements go.
#[derive(Debug, Clone)]
pub struct Target {
    pub channel: ChannelId,
    pub role_name: String,
}

/// Owns the snapshot and runs one cycle at a time. The timer and the manual
/// command both go through [`CycleDriver::run_cycle`].
pub struct CycleDriver {
    fetcher: CatalogFetcher,
    platform: Arc<dyn ChatPlatform>,
    target: Target,
    keep_snapshot_on_fetch_failure: bool,
    // held for the whole cycle, which serializes overlapping triggers
    snapshot: Mutex<Snapshot>,
}

impl CycleDriver {
    pub fn new(fetcher: CatalogFetcher, platform: Arc<dyn ChatPlatform>, target: Target) -> Self {
        Self {
            fetcher,
            platform,
            target,
            keep_snapshot_on_fetch_failure: false,
            snapshot: Mutex::new(Snapshot::new()),
        }
    }

    pub fn keep_snapshot_on_fetch_failure(mut self, keep: bool) -> Self {
        self.keep_snapshot_on_fetch_failure = keep;
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn platform(&self) -> Arc<dyn ChatPlatform> {
        Arc::clone(&self.platform)
    }

    /// Copy of the keys remembered after the last completed cycle.
    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.lock().await.clone()
    }

    pub async fn run_cycle(&self) -> CycleOutcome {
        ensure_metrics_described();
        let mut previous = self.snapshot.lock().await;
        counter!("cycle_runs_total").increment(1);
        tracing::info!("checking for new free games");

        let fetch = self.fetcher.fetch_free_offers().await;

        let (_guild, role) = match self.resolve_target().await {
            Ok(v) => v,
            Err(reason) => {
                counter!("cycle_aborted_total").increment(1);
                tracing::error!(?reason, "cycle aborted");
                return CycleOutcome::Aborted(reason);
            }
        };

        let delta = compute_delta(&fetch.offers, &previous);
        let new_names: Vec<&str> = delta.added.iter().map(|o| o.name.as_str()).collect();
        tracing::info!(
            current = ?delta.snapshot,
            new = ?new_names,
            "delta computed"
        );
        counter!("cycle_new_offers_total").increment(delta.added.len() as u64);

        let report = announce(
            self.platform.as_ref(),
            self.target.channel,
            &role,
            &delta.added,
        )
        .await;

        let snapshot_kept = self.keep_snapshot_on_fetch_failure && fetch.all_sources_failed();
        if snapshot_kept {
            tracing::warn!(
                remembered = previous.len(),
                "every catalog source failed; keeping previous snapshot"
            );
        } else {
            *previous = delta.snapshot;
        }

        gauge!("snapshot_size").set(previous.len() as f64);
        gauge!("cycle_last_run_ts").set(Utc::now().timestamp().max(0) as f64);

        CycleOutcome::Completed {
            fetched: fetch.offers.len(),
            new_offers: delta.added.len(),
            report,
            snapshot_kept,
        }
    }

    async fn resolve_target(&self) -> Result<(GuildId, Role), AbortReason> {
        let channel = self.target.channel;
        let guild = match self.platform.channel_guild(channel).await {
            Ok(Some(g)) => g,
            Ok(None) => return Err(AbortReason::ChannelNotFound(channel)),
            Err(e) => return Err(AbortReason::Platform(e.to_string())),
        };
        match self.platform.get_role(guild, &self.target.role_name).await {
            Ok(Some(role)) => Ok((guild, role)),
            Ok(None) => Err(AbortReason::RoleNotFound(self.target.role_name.clone())),
            Err(e) => Err(AbortReason::Platform(e.to_string())),
        }
    }
}
