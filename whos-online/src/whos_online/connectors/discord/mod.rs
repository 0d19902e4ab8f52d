//! Discord connectivity module for the presence notifier.
//!
//! This module provides abstractions for interacting with Discord, including:
//! - Error types for Discord connectivity issues
//! - The `DiscordConnector` trait used by the commands and the notifier
//! - Data structures describing guild rosters and their members
//!
//! The rest of the crate only talks to Discord through `DiscordConnector`,
//! so tests can swap in the generated `MockDiscordConnector`.
//! A concrete implementation using the Serenity library is provided in the `serenity` submodule.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

pub(crate) mod serenity;
pub(crate) mod server_member;

pub use server_member::{GuildRoster, ServerMember};

/// Errors that can occur during Discord connectivity operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The guild is not in the cache, usually because the bot left it
    #[error("Cannot find guild {0}")]
    CannotFindGuild(u64),
    /// The channel does not exist or the bot cannot see it
    #[error("Cannot find channel {0}")]
    CannotFindChannel(u64),
    /// The bot's permissions in the channel could not be computed
    #[error("Cannot check permissions in channel {0}")]
    CannotCheckPermissions(u64),
    /// Discord rejected the message, e.g. missing permission or deleted channel
    #[error("Cannot send message to channel {0}")]
    CannotSendMessage(u64),
    /// The user has DMs from server members disabled or blocked the bot
    #[error("Cannot send direct message to user {0}")]
    CannotSendDirectMessage(u64),
}

/// Trait for abstracting Discord server interactions.
#[automock]
#[async_trait]
pub trait DiscordConnector: Send + Sync {
    /// Retrieves the member roster of a guild, with each member's current presence.
    ///
    /// # Arguments
    ///
    /// * `guild_id` - The guild to read
    ///
    /// # Returns
    ///
    /// * `Result<GuildRoster, Error>` - The roster in Discord's member order, or a Discord error
    async fn get_guild_roster(&self, guild_id: u64) -> Result<GuildRoster, Error>;

    /// Posts a plain message to a channel.
    async fn send_message(&self, channel_id: u64, message: &str) -> Result<(), Error>;

    /// Sends a direct message to a user.
    async fn send_direct_message(&self, user_id: u64, message: &str) -> Result<(), Error>;

    /// Whether the bot itself is allowed to post in the channel.
    async fn can_send_messages(&self, channel_id: u64) -> Result<bool, Error>;
}
