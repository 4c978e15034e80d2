// src/chat/mod.rs
//! Chat-platform seam: everything the bot needs from Discord, behind one trait.

pub mod discord;
pub mod mock;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSnowflake {
    Num(u64),
    Str(String),
}

macro_rules! snowflake {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub u64);

        // Discord sends snowflakes as strings; plain numbers are accepted too.
        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                match RawSnowflake::deserialize(d)? {
                    RawSnowflake::Num(n) => Ok($name(n)),
                    RawSnowflake::Str(s) => s
                        .trim()
                        .parse()
                        .map($name)
                        .map_err(serde::de::Error::custom),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map($name)
            }
        }
    };
}

snowflake!(ChannelId);
snowflake!(GuildId);
snowflake!(RoleId);
snowflake!(UserId);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

impl Role {
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.id)
    }
}

impl UserId {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutgoingMessage {
    pub content: String,
    pub embed: Option<Embed>,
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("platform returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{0} not found")]
    NotFound(String),
}

#[async_trait::async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Guild owning `channel`, or `None` if the channel is unknown/inaccessible.
    async fn channel_guild(&self, channel: ChannelId) -> Result<Option<GuildId>, PlatformError>;

    async fn send_message(
        &self,
        channel: ChannelId,
        message: &OutgoingMessage,
    ) -> Result<(), PlatformError>;

    async fn get_role(&self, guild: GuildId, name: &str) -> Result<Option<Role>, PlatformError>;

    async fn create_role(&self, guild: GuildId, name: &str) -> Result<Role, PlatformError>;

    async fn user_roles(&self, guild: GuildId, user: UserId) -> Result<Vec<RoleId>, PlatformError>;

    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId)
        -> Result<(), PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflakes_parse_and_mention() {
        let r: RoleId = " 42 ".parse().unwrap();
        let role = Role {
            id: r,
            name: "Free Games".into(),
        };
        assert_eq!(role.mention(), "<@&42>");
        assert_eq!(UserId(7).mention(), "<@7>");
        assert!("abc".parse::<ChannelId>().is_err());
    }

    #[test]
    fn snowflakes_deserialize_from_string_or_number() {
        let a: GuildId = serde_json::from_str(r#""1234567890123""#).unwrap();
        let b: GuildId = serde_json::from_str("1234567890123").unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_str::<GuildId>(r#""x1""#).is_err());
    }
}
