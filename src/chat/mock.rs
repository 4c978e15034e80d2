// src/chat/mock.rs
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{
    ChannelId, ChatPlatform, GuildId, OutgoingMessage, PlatformError, Role, RoleId, UserId,
};

/// In-memory platform for tests and local dry runs.
#[derive(Default)]
pub struct MockPlatform {
    pub channels: Mutex<HashMap<ChannelId, GuildId>>,
    pub roles: Mutex<HashMap<GuildId, Vec<Role>>>,
    pub members: Mutex<HashMap<(GuildId, UserId), Vec<RoleId>>>,
    /// Sends whose embed title is in here fail.
    pub fail_titles: Mutex<HashSet<String>>,
    pub sent: Mutex<Vec<(ChannelId, OutgoingMessage)>>,
    pub add_role_calls: Mutex<Vec<(GuildId, UserId, RoleId)>>,
    pub created_roles: Mutex<Vec<(GuildId, String)>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform with one channel in one guild.
    pub fn with_channel(channel: ChannelId, guild: GuildId) -> Self {
        let p = Self::new();
        p.channels.lock().unwrap().insert(channel, guild);
        p
    }

    pub fn add_guild_role(&self, guild: GuildId, id: RoleId, name: &str) {
        self.roles.lock().unwrap().entry(guild).or_default().push(Role {
            id,
            name: name.to_string(),
        });
    }

    pub fn add_member(&self, guild: GuildId, user: UserId) {
        self.members.lock().unwrap().entry((guild, user)).or_default();
    }

    pub fn fail_on(&self, title: &str) {
        self.fail_titles.lock().unwrap().insert(title.to_string());
    }

    /// Embed titles of every message sent so far, in order.
    pub fn sent_titles(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, m)| m.embed.as_ref().map(|e| e.title.clone()))
            .collect()
    }
}

#[async_trait::async_trait]
impl ChatPlatform for MockPlatform {
    async fn channel_guild(&self, channel: ChannelId) -> Result<Option<GuildId>, PlatformError> {
        Ok(self.channels.lock().unwrap().get(&channel).copied())
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        message: &OutgoingMessage,
    ) -> Result<(), PlatformError> {
        if let Some(embed) = &message.embed {
            if self.fail_titles.lock().unwrap().contains(&embed.title) {
                return Err(PlatformError::Status {
                    status: 500,
                    body: format!("mock failure for {}", embed.title),
                });
            }
        }
        self.sent.lock().unwrap().push((channel, message.clone()));
        Ok(())
    }

    async fn get_role(&self, guild: GuildId, name: &str) -> Result<Option<Role>, PlatformError> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .get(&guild)
            .and_then(|rs| rs.iter().find(|r| r.name == name).cloned()))
    }

    async fn create_role(&self, guild: GuildId, name: &str) -> Result<Role, PlatformError> {
        let mut roles = self.roles.lock().unwrap();
        let list = roles.entry(guild).or_default();
        let role = Role {
            id: RoleId(1_000 + list.len() as u64),
            name: name.to_string(),
        };
        list.push(role.clone());
        self.created_roles
            .lock()
            .unwrap()
            .push((guild, name.to_string()));
        Ok(role)
    }

    async fn user_roles(&self, guild: GuildId, user: UserId) -> Result<Vec<RoleId>, PlatformError> {
        self.members
            .lock()
            .unwrap()
            .get(&(guild, user))
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("member {user}")))
    }

    async fn add_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), PlatformError> {
        self.add_role_calls.lock().unwrap().push((guild, user, role));
        let mut members = self.members.lock().unwrap();
        let roles = members
            .get_mut(&(guild, user))
            .ok_or_else(|| PlatformError::NotFound(format!("member {user}")))?;
        if !roles.contains(&role) {
            roles.push(role);
        }
        Ok(())
    }
}
