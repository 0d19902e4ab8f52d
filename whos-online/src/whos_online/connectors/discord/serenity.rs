//! Serenity-based implementation of Discord connectivity.
//!
//! This module provides the concrete implementation of the Discord connector
//! trait using the Serenity Discord library, plus the poise framework types.

use crate::whos_online::connectors::discord::Error::{
    CannotCheckPermissions, CannotFindChannel, CannotFindGuild, CannotSendDirectMessage,
    CannotSendMessage,
};
use crate::whos_online::connectors::discord::{DiscordConnector, Error, GuildRoster, ServerMember};
use crate::whos_online::notifier::PresenceChange;
use crate::whos_online::presence::{PresenceStatus, PresenceTracker};
use crate::whos_online::settings::SettingsStore;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Discord connector implementation using Serenity library.
///
/// Reads rosters and permissions from the gateway cache and sends through
/// the HTTP client. Cheap to create: the context only holds `Arc`s.
pub struct SerenityDiscordConnector {
    context: serenity::Context,
}

impl SerenityDiscordConnector {
    /// Creates a new SerenityDiscordConnector instance.
    ///
    /// # Arguments
    ///
    /// * `context` - Serenity context for Discord interactions
    pub fn new(context: serenity::Context) -> Self {
        Self { context }
    }
}

#[async_trait]
impl DiscordConnector for SerenityDiscordConnector {
    async fn get_guild_roster(&self, guild_id: u64) -> Result<GuildRoster, Error> {
        let roster = {
            let Some(guild) = self.context.cache.guild(serenity::GuildId::new(guild_id)) else {
                return Err(CannotFindGuild(guild_id));
            };
            roster_from_guild(&guild)
        };
        debug!(
            "Read {} members of guild {} from cache",
            roster.members.len(),
            guild_id
        );
        Ok(roster)
    }

    async fn send_message(&self, channel_id: u64, message: &str) -> Result<(), Error> {
        if let Err(e) = serenity::ChannelId::new(channel_id)
            .say(&self.context.http, message)
            .await
        {
            warn!("Discord rejected message to channel {}: {}", channel_id, e);
            return Err(CannotSendMessage(channel_id));
        }
        Ok(())
    }

    async fn send_direct_message(&self, user_id: u64, message: &str) -> Result<(), Error> {
        if let Err(e) = serenity::UserId::new(user_id)
            .direct_message(&self.context, serenity::CreateMessage::new().content(message))
            .await
        {
            warn!("Cannot send direct message to user {}: {}", user_id, e);
            return Err(CannotSendDirectMessage(user_id));
        }
        Ok(())
    }

    async fn can_send_messages(&self, channel_id: u64) -> Result<bool, Error> {
        let cache = &self.context.cache;
        let Some(channel) = cache
            .channel(serenity::ChannelId::new(channel_id))
            .map(|channel| serenity::GuildChannel::clone(&channel))
        else {
            return Err(CannotFindChannel(channel_id));
        };
        let bot_id = cache.current_user().id;
        let Ok(permissions) = channel.permissions_for_user(cache, bot_id) else {
            return Err(CannotCheckPermissions(channel_id));
        };
        Ok(permissions.view_channel() && permissions.send_messages())
    }
}

impl From<serenity::OnlineStatus> for PresenceStatus {
    fn from(status: serenity::OnlineStatus) -> Self {
        match status {
            serenity::OnlineStatus::Online => PresenceStatus::Online,
            serenity::OnlineStatus::Idle => PresenceStatus::Idle,
            serenity::OnlineStatus::DoNotDisturb => PresenceStatus::DoNotDisturb,
            // Invisible members look offline to everyone else
            _ => PresenceStatus::Offline,
        }
    }
}

/// Converts a cached member into a `ServerMember` with the given status.
pub(crate) fn server_member(member: &serenity::Member, status: PresenceStatus) -> ServerMember {
    ServerMember {
        id: member.user.id.get(),
        display_name: member.display_name().to_string(),
        status,
        is_bot: member.user.bot,
        role_ids: member.roles.iter().map(|role| role.get()).collect(),
    }
}

/// Builds a roster from a guild's cached members and presences.
///
/// Members without a presence entry are offline: Discord only sends presences
/// for members that are not. Members are listed in user ID order, the order
/// Discord's member listing uses.
pub(crate) fn roster_from_guild(guild: &serenity::Guild) -> GuildRoster {
    let mut members: Vec<&serenity::Member> = guild.members.values().collect();
    members.sort_by_key(|member| member.user.id);
    let members = members
        .into_iter()
        .map(|member| {
            let status = guild
                .presences
                .get(&member.user.id)
                .map(|presence| PresenceStatus::from(presence.status))
                .unwrap_or_default();
            server_member(member, status)
        })
        .collect();
    GuildRoster {
        guild_name: guild.name.clone(),
        member_count: guild.member_count,
        members,
    }
}

/// Turns a gateway presence update into a `PresenceChange`.
///
/// Returns `None` for presences outside of a guild.
pub(crate) fn presence_change(
    cache: &serenity::Cache,
    presence: &serenity::Presence,
) -> Option<PresenceChange> {
    let guild_id = presence.guild_id?;
    let status = PresenceStatus::from(presence.status);
    let user = &presence.user;
    let cached = cache
        .member(guild_id, user.id)
        .map(|member| server_member(&member, status));
    let mut member = cached.unwrap_or_else(|| {
        debug!(
            "Member {} of guild {} is not cached, their roles are unknown",
            user.id, guild_id
        );
        ServerMember {
            id: user.id.get(),
            display_name: user
                .name
                .clone()
                .unwrap_or_else(|| format!("<@{}>", user.id)),
            status,
            ..Default::default()
        }
    });
    member.is_bot |= user.bot.unwrap_or(false);
    Some(PresenceChange {
        guild_id: guild_id.get(),
        member,
    })
}

/// User data, which is stored and accessible in all command invocations
pub struct Data {
    pub(crate) settings: Arc<Mutex<SettingsStore>>,
    pub(crate) presences: Arc<Mutex<PresenceTracker>>,
    pub(crate) update_interval: Duration,
}

/// Type alias for Poise command context
pub type Context<'a> = poise::Context<'a, Data, anyhow::Error>;
