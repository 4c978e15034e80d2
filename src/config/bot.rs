// src/config/bot.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chat::ChannelId;
use crate::ingest::providers::steam_featured::DEFAULT_STORE_URL;

pub const ENV_CONFIG_PATH: &str = "FREE_GAMES_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/bot.toml";
pub const DEFAULT_ROLE_NAME: &str = "Free Games";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30 * 60;

fn default_role_name() -> String {
    DEFAULT_ROLE_NAME.to_string()
}
fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}
fn default_http_timeout_secs() -> u64 {
    10
}
fn default_store_url() -> String {
    DEFAULT_STORE_URL.to_string()
}

/// Non-secret settings; every field may come from `config/bot.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    #[serde(default = "default_role_name")]
    pub role_name: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_store_url")]
    pub store_url: String,
    /// Leave the snapshot alone when every catalog source failed.
    #[serde(default)]
    pub keep_snapshot_on_fetch_failure: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            channel_id: None,
            role_name: default_role_name(),
            poll_interval_secs: default_poll_interval_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            store_url: default_store_url(),
            keep_snapshot_on_fetch_failure: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub channel_id: ChannelId,
    pub role_name: String,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub store_url: String,
    pub keep_snapshot_on_fetch_failure: bool,
    /// Bearer token required on `/commands/*` when set.
    pub command_api_token: Option<String>,
}

pub fn load_file_config_from(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading bot config from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// 1) $FREE_GAMES_CONFIG_PATH (must exist)
/// 2) config/bot.toml
/// 3) built-in defaults
pub fn load_file_config_default() -> Result<FileConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_file_config_from(&pb);
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default_p.exists() {
        return load_file_config_from(&default_p);
    }
    Ok(FileConfig::default())
}

impl BotConfig {
    /// File config overlaid with env vars. `BOT_TOKEN` is required, and so is a
    /// channel (`BOT_CHANNEL` or `channel_id` in the file).
    pub fn from_env() -> Result<Self> {
        let file = load_file_config_default()?;
        Self::from_parts(file, |k| std::env::var(k).ok())
    }

    pub fn from_parts<F>(file: FileConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| env(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token = get("BOT_TOKEN").ok_or_else(|| anyhow!("Missing BOT_TOKEN env var"))?;

        let channel_id = match get("BOT_CHANNEL") {
            Some(raw) => raw
                .parse::<ChannelId>()
                .with_context(|| format!("BOT_CHANNEL is not a channel id: {raw}"))?,
            None => file
                .channel_id
                .ok_or_else(|| anyhow!("Missing BOT_CHANNEL env var or channel_id in config"))?,
        };

        let poll_interval_secs = match get("POLL_INTERVAL_SECS") {
            Some(v) => v.parse().context("POLL_INTERVAL_SECS")?,
            None => file.poll_interval_secs,
        };
        let http_timeout_secs = match get("HTTP_TIMEOUT_SECS") {
            Some(v) => v.parse().context("HTTP_TIMEOUT_SECS")?,
            None => file.http_timeout_secs,
        };
        let keep_snapshot_on_fetch_failure = match get("KEEP_SNAPSHOT_ON_FETCH_FAILURE") {
            Some(v) => parse_bool(&v).context("KEEP_SNAPSHOT_ON_FETCH_FAILURE")?,
            None => file.keep_snapshot_on_fetch_failure,
        };

        Ok(Self {
            token,
            channel_id,
            role_name: get("FREE_GAMES_ROLE").unwrap_or(file.role_name),
            // zero would spin the ticker
            poll_interval: Duration::from_secs(poll_interval_secs.max(1)),
            http_timeout: Duration::from_secs(http_timeout_secs.max(1)),
            store_url: get("STORE_URL").unwrap_or(file.store_url),
            keep_snapshot_on_fetch_failure,
            command_api_token: get("COMMAND_API_TOKEN"),
        })
    }
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("not a boolean: {other}")),
    }
}
