pub(crate) mod commands;
pub(crate) mod config;
pub(crate) mod connectors;
pub(crate) mod messages;
pub(crate) mod notifier;
pub(crate) mod presence;
pub(crate) mod settings;

use async_trait::async_trait;
use chrono::Utc;
use commands::Error;
use commands::Reply;
use commands::channel::ChannelCommands;
use commands::role::RoleCommands;
use connectors::discord::{DiscordConnector, ServerMember};
use settings::SettingsStore;
use std::time::Duration;
use tokio::sync::Mutex;

/// Everything the slash commands can ask of the bot.
#[async_trait]
pub trait WhosOnline {
    async fn online(&self, guild_id: u64) -> Result<Reply, Error>;
    async fn set_channel(&self, guild_id: u64, channel_id: u64) -> Result<Reply, Error>;
    async fn remove_channel(&self, guild_id: u64) -> Result<Reply, Error>;
    async fn set_role(&self, guild_id: u64, role_id: u64) -> Result<Reply, Error>;
    async fn remove_role(&self, guild_id: u64) -> Result<Reply, Error>;
    async fn check_role(&self, guild_id: u64, member: &ServerMember) -> Result<Reply, Error>;
    async fn test_notify(&self, guild_id: u64) -> Result<Reply, Error>;
    async fn test_dm(&self, guild_name: &str, member: &ServerMember) -> Result<Reply, Error>;
}

pub struct WhosOnlineImpl<'a, DISCORD: DiscordConnector> {
    settings: &'a Mutex<SettingsStore>,
    discord_connector: &'a DISCORD,
    update_interval: Duration,
}

impl<'a, DISCORD: DiscordConnector> WhosOnlineImpl<'a, DISCORD> {
    pub fn new(
        settings: &'a Mutex<SettingsStore>,
        discord_connector: &'a DISCORD,
        update_interval: Duration,
    ) -> Self {
        Self {
            settings,
            discord_connector,
            update_interval,
        }
    }

    fn channel_commands(&self) -> ChannelCommands<'a, DISCORD> {
        ChannelCommands::new(self.settings, self.discord_connector, self.update_interval)
    }
}

#[async_trait]
impl<'a, DISCORD: DiscordConnector> WhosOnline for WhosOnlineImpl<'a, DISCORD> {
    async fn online(&self, guild_id: u64) -> Result<Reply, Error> {
        commands::online::online(self.discord_connector, guild_id, Utc::now()).await
    }

    async fn set_channel(&self, guild_id: u64, channel_id: u64) -> Result<Reply, Error> {
        self.channel_commands()
            .set_channel(guild_id, channel_id)
            .await
    }

    async fn remove_channel(&self, guild_id: u64) -> Result<Reply, Error> {
        self.channel_commands().remove_channel(guild_id).await
    }

    async fn set_role(&self, guild_id: u64, role_id: u64) -> Result<Reply, Error> {
        RoleCommands::new(self.settings)
            .set_role(guild_id, role_id)
            .await
    }

    async fn remove_role(&self, guild_id: u64) -> Result<Reply, Error> {
        RoleCommands::new(self.settings).remove_role(guild_id).await
    }

    async fn check_role(&self, guild_id: u64, member: &ServerMember) -> Result<Reply, Error> {
        RoleCommands::new(self.settings)
            .check_role(guild_id, member)
            .await
    }

    async fn test_notify(&self, guild_id: u64) -> Result<Reply, Error> {
        self.channel_commands().test_notify(guild_id).await
    }

    async fn test_dm(&self, guild_name: &str, member: &ServerMember) -> Result<Reply, Error> {
        commands::direct_message::test_dm(self.discord_connector, guild_name, member).await
    }
}
