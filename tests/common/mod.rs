// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use free_games_notifier::chat::mock::MockPlatform;
use free_games_notifier::chat::{ChannelId, ChatPlatform, GuildId, RoleId};
use free_games_notifier::ingest::types::{OfferRecord, OfferSource};
use free_games_notifier::ingest::{CatalogFetcher, HttpSettings};
use free_games_notifier::{CycleDriver, Target};

pub const CHANNEL: ChannelId = ChannelId(111);
pub const GUILD: GuildId = GuildId(222);
pub const ROLE: RoleId = RoleId(333);
pub const ROLE_NAME: &str = "Free Games";

pub fn free(name: &str) -> OfferRecord {
    OfferRecord {
        name: name.to_string(),
        image_url: None,
        status: "Free".to_string(),
        store_url: format!("https://store.steampowered.com/app/{}", name.len()),
        original_price: 0.0,
        discount_end: None,
    }
}

/// Source whose answer the test swaps between cycles; `None` means "fail".
#[derive(Clone, Default)]
pub struct ScriptedSource {
    pub next: Arc<Mutex<Option<Vec<OfferRecord>>>>,
}

impl ScriptedSource {
    pub fn serve(&self, offers: Vec<OfferRecord>) {
        *self.next.lock().unwrap() = Some(offers);
    }

    pub fn fail(&self) {
        *self.next.lock().unwrap() = None;
    }
}

#[async_trait::async_trait]
impl OfferSource for ScriptedSource {
    async fn fetch_offers(&self, _client: &reqwest::Client) -> anyhow::Result<Vec<OfferRecord>> {
        self.next
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("scripted failure"))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Platform with the channel and the role already set up.
pub fn ready_platform() -> Arc<MockPlatform> {
    let p = MockPlatform::with_channel(CHANNEL, GUILD);
    p.add_guild_role(GUILD, ROLE, ROLE_NAME);
    Arc::new(p)
}

pub fn driver_with(source: &ScriptedSource, platform: Arc<MockPlatform>) -> CycleDriver {
    let fetcher = CatalogFetcher::new(vec![Box::new(source.clone())], HttpSettings::default());
    let platform: Arc<dyn ChatPlatform> = platform;
    CycleDriver::new(
        fetcher,
        platform,
        Target {
            channel: CHANNEL,
            role_name: ROLE_NAME.to_string(),
        },
    )
}
