//! Handlers behind `joinfreegames` / `checkfreegames`, plus role bootstrap.

use serde::Serialize;
use std::sync::Arc;

use crate::change_detector::CycleDriver;
use crate::chat::{ChatPlatform, GuildId, PlatformError, Role, UserId};

pub const JOIN_COMMAND: &str = "joinfreegames";
pub const CHECK_COMMAND: &str = "checkfreegames";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyOutcome {
    Granted,
    AlreadyHeld,
    CheckStarted,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandReply {
    pub content: String,
    pub outcome: ReplyOutcome,
}

impl CommandReply {
    fn new(outcome: ReplyOutcome, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            outcome,
        }
    }
}

/// Creates the role (mentionable) if the guild does not have it yet.
pub async fn ensure_role_exists(
    platform: &dyn ChatPlatform,
    guild: GuildId,
    role_name: &str,
) -> Result<Role, PlatformError> {
    if let Some(role) = platform.get_role(guild, role_name).await? {
        tracing::info!(role = role_name, "role already exists");
        return Ok(role);
    }
    tracing::info!(role = role_name, "creating role");
    platform.create_role(guild, role_name).await
}

/// Grants `role_name` to `user`; a second call is a no-op with a distinct reply.
pub async fn join_free_games(
    platform: &dyn ChatPlatform,
    guild: GuildId,
    user: UserId,
    role_name: &str,
) -> CommandReply {
    match grant_role(platform, guild, user, role_name).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, %user, "role assignment failed");
            CommandReply::new(
                ReplyOutcome::Failed,
                format!("Sorry, I couldn't assign the {role_name} role right now. Please try again later."),
            )
        }
    }
}

async fn grant_role(
    platform: &dyn ChatPlatform,
    guild: GuildId,
    user: UserId,
    role_name: &str,
) -> Result<CommandReply, PlatformError> {
    let role = platform
        .get_role(guild, role_name)
        .await?
        .ok_or_else(|| PlatformError::NotFound(format!("role {role_name}")))?;

    let held = platform.user_roles(guild, user).await?;
    if held.contains(&role.id) {
        return Ok(CommandReply::new(
            ReplyOutcome::AlreadyHeld,
            format!("You already have the {role_name} role!"),
        ));
    }

    platform.add_role(guild, user, role.id).await?;
    tracing::info!(%user, role = role_name, "assigned role");
    Ok(CommandReply::new(
        ReplyOutcome::Granted,
        format!(
            "{} you have been assigned the {role_name} role!",
            user.mention()
        ),
    ))
}

/// Acknowledges right away; the cycle runs in the background and queues
/// behind any cycle already in flight.
pub fn check_free_games(driver: Arc<CycleDriver>) -> CommandReply {
    tokio::spawn(async move {
        let outcome = driver.run_cycle().await;
        tracing::info!(?outcome, "manual check finished");
    });
    CommandReply::new(
        ReplyOutcome::CheckStarted,
        "Manually checking for free games...",
    )
}
