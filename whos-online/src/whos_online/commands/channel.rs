use crate::whos_online::commands::{Error, Reply, describe_interval};
use crate::whos_online::connectors::discord::DiscordConnector;
use crate::whos_online::messages::SETUP_MESSAGE;
use crate::whos_online::settings::SettingsStore;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Handles `/setchannel`, `/removechannel` and `/testnotify`.
pub struct ChannelCommands<'a, DISCORD: DiscordConnector> {
    settings: &'a Mutex<SettingsStore>,
    discord_connector: &'a DISCORD,
    update_interval: Duration,
}

impl<'a, DISCORD: DiscordConnector> ChannelCommands<'a, DISCORD> {
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

    pub async fn set_channel(&self, guild_id: u64, channel_id: u64) -> Result<Reply, Error> {
        if !self.discord_connector.can_send_messages(channel_id).await? {
            warn!(
                "Refusing channel {} for guild {}: cannot send messages there",
                channel_id, guild_id
            );
            return Ok(Reply::private(format!(
                "❌ I don't have permission to send messages in <#{}>.",
                channel_id
            )));
        }

        self.settings.lock().await.set(guild_id, channel_id)?;
        info!(
            "Notification channel for guild {} set to {}",
            guild_id, channel_id
        );

        // The setting is saved either way, the next tick will retry the channel
        if let Err(e) = self
            .discord_connector
            .send_message(channel_id, SETUP_MESSAGE)
            .await
        {
            warn!("Cannot post setup message in channel {}: {}", channel_id, e);
        }

        Ok(Reply::public(format!(
            "✅ Online member notifications will now be sent to <#{}>\n\
             • Automatic updates every {}\n\
             • Real-time online/offline notifications\n\
             • Use `/online` to check who's online at any time",
            channel_id,
            describe_interval(self.update_interval)
        )))
    }

    pub async fn remove_channel(&self, guild_id: u64) -> Result<Reply, Error> {
        let removed = self.settings.lock().await.remove(guild_id)?;
        if !removed {
            return Ok(Reply::private(
                "❌ No notification channel is currently set for this server.",
            ));
        }
        info!("Notification channel for guild {} removed", guild_id);
        Ok(Reply::public(
            "✅ Automatic online member notifications have been disabled for this server.",
        ))
    }

    pub async fn test_notify(&self, guild_id: u64) -> Result<Reply, Error> {
        let (channel, role) = {
            let settings = self.settings.lock().await;
            (settings.get(guild_id), settings.target_role(guild_id))
        };
        let Some(channel_id) = channel else {
            return Ok(Reply::private(
                "❌ Please set a notification channel first with `/setchannel`.",
            ));
        };

        let audience = match role {
            Some(_) => "Members with the target role trigger notifications when they go online or offline.",
            None => "Every member triggers notifications when they go online or offline.",
        };
        self.discord_connector
            .send_message(
                channel_id,
                &format!(
                    "🧪 **Notification System Test**\n✅ The notification system is working correctly!\n🔔 {}",
                    audience
                ),
            )
            .await?;
        info!("Sent test notification to channel {}", channel_id);

        Ok(Reply::private(format!(
            "✅ Test notification sent to <#{}>!",
            channel_id
        )))
    }
}
