use super::{
    ChannelId, ChatPlatform, Embed, GuildId, OutgoingMessage, PlatformError, Role, RoleId, UserId,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const USER_AGENT: &str = concat!(
    "DiscordBot (",
    env!("CARGO_PKG_NAME"),
    ", ",
    env!("CARGO_PKG_VERSION"),
    ")"
);
const MAX_BACKOFF_SHIFT: u8 = 6;
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// 500ms, 1s, 2s ... capped at 32s.
fn backoff_delay(attempt: u8) -> Duration {
    let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
    Duration::from_millis(500u64 << shift)
}

/// Delay asked for by a 429 `Retry-After` header (seconds, may be fractional).
fn retry_after(rsp: &Response) -> Option<Duration> {
    let secs: f64 = rsp
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(secs).min(MAX_RETRY_AFTER))
}

/// Discord REST client authenticated with a bot token.
#[derive(Clone)]
pub struct DiscordClient {
    token: String,
    base_url: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl DiscordClient {
    pub fn new(token: String) -> Self {
        Self {
            token,
            base_url: DISCORD_API_BASE.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(self.timeout)
    }

    /// Retries transport errors, 429 and 5xx with exponential backoff; a 429
    /// with `Retry-After` waits as long as Discord asks instead.
    async fn send<F>(&self, build: F) -> Result<Response, PlatformError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            match build().send().await {
                Ok(rsp) => {
                    let status = rsp.status();
                    if status.is_success() {
                        return Ok(rsp);
                    }
                    let retryable = status.as_u16() == 429 || status.is_server_error();
                    if retryable && attempt < self.max_retries {
                        let delay = match status.as_u16() {
                            429 => retry_after(&rsp).unwrap_or_else(|| backoff_delay(attempt)),
                            _ => backoff_delay(attempt),
                        };
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    let body = rsp.text().await.unwrap_or_default();
                    return Err(PlatformError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(backoff_delay(attempt)).await;
                        continue;
                    }
                    return Err(PlatformError::Transport(e));
                }
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PlatformError> {
        let rsp = self.send(|| self.request(reqwest::Method::GET, path)).await?;
        decode(rsp).await
    }
}

async fn decode<T: DeserializeOwned>(rsp: Response) -> Result<T, PlatformError> {
    rsp.json::<T>()
        .await
        .map_err(|e| PlatformError::Decode(e.to_string()))
}

#[derive(Deserialize)]
struct RawChannel {
    #[serde(default)]
    guild_id: Option<GuildId>,
}

#[derive(Deserialize)]
struct RawRole {
    id: RoleId,
    name: String,
}

#[derive(Deserialize)]
struct RawMember {
    #[serde(default)]
    roles: Vec<RoleId>,
}

#[derive(Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<&'a Embed>,
    allowed_mentions: AllowedMentions,
}

#[derive(Serialize)]
struct AllowedMentions {
    parse: [&'static str; 2],
}

#[derive(Serialize)]
struct CreateRole<'a> {
    name: &'a str,
    mentionable: bool,
}

#[async_trait::async_trait]
impl ChatPlatform for DiscordClient {
    async fn channel_guild(&self, channel: ChannelId) -> Result<Option<GuildId>, PlatformError> {
        match self.get_json::<RawChannel>(&format!("/channels/{channel}")).await {
            Ok(c) => Ok(c.guild_id),
            Err(PlatformError::Status {
                status: 403 | 404, ..
            }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        message: &OutgoingMessage,
    ) -> Result<(), PlatformError> {
        let payload = CreateMessage {
            content: &message.content,
            embeds: message.embed.iter().collect(),
            allowed_mentions: AllowedMentions {
                parse: ["roles", "users"],
            },
        };
        let path = format!("/channels/{channel}/messages");
        self.send(|| self.request(reqwest::Method::POST, &path).json(&payload))
            .await?;
        Ok(())
    }

    async fn get_role(&self, guild: GuildId, name: &str) -> Result<Option<Role>, PlatformError> {
        let roles: Vec<RawRole> = self.get_json(&format!("/guilds/{guild}/roles")).await?;
        Ok(roles
            .into_iter()
            .find(|r| r.name == name)
            .map(|r| Role {
                id: r.id,
                name: r.name,
            }))
    }

    async fn create_role(&self, guild: GuildId, name: &str) -> Result<Role, PlatformError> {
        let payload = CreateRole {
            name,
            mentionable: true,
        };
        let path = format!("/guilds/{guild}/roles");
        let rsp = self
            .send(|| self.request(reqwest::Method::POST, &path).json(&payload))
            .await?;
        let r: RawRole = decode(rsp).await?;
        Ok(Role {
            id: r.id,
            name: r.name,
        })
    }

    async fn user_roles(&self, guild: GuildId, user: UserId) -> Result<Vec<RoleId>, PlatformError> {
        match self
            .get_json::<RawMember>(&format!("/guilds/{guild}/members/{user}"))
            .await
        {
            Ok(m) => Ok(m.roles),
            Err(PlatformError::Status { status: 404, .. }) => {
                Err(PlatformError::NotFound(format!("member {user}")))
            }
            Err(e) => Err(e),
        }
    }

    async fn add_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), PlatformError> {
        let path = format!("/guilds/{guild}/members/{user}/roles/{role}");
        self.send(|| self.request(reqwest::Method::PUT, &path))
            .await?;
        Ok(())
    }
}
