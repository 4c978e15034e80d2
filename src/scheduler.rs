// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::change_detector::CycleDriver;
use crate::commands::ensure_role_exists;

/// Startup sequence: make sure the role exists, run one cycle right away,
/// then keep running every `period`. Nothing here is fatal.
pub async fn start(driver: Arc<CycleDriver>, period: Duration) -> JoinHandle<()> {
    bootstrap_role(&driver).await;

    let outcome = driver.run_cycle().await;
    tracing::info!(?outcome, "startup check finished");

    spawn_periodic(driver, period)
}

async fn bootstrap_role(driver: &CycleDriver) {
    let platform = driver.platform();
    let target = driver.target();
    match platform.channel_guild(target.channel).await {
        Ok(Some(guild)) => {
            if let Err(e) = ensure_role_exists(platform.as_ref(), guild, &target.role_name).await {
                tracing::error!(error = %e, role = %target.role_name, "could not ensure role");
            }
        }
        Ok(None) => {
            tracing::error!(channel = %target.channel, "channel not found; role not ensured")
        }
        Err(e) => tracing::error!(error = %e, "channel lookup failed; role not ensured"),
    }
}

/// First tick fires one `period` from now.
pub fn spawn_periodic(driver: Arc<CycleDriver>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let outcome = driver.run_cycle().await;
            tracing::info!(target: "scheduler", ?outcome, "periodic check finished");
        }
    })
}
