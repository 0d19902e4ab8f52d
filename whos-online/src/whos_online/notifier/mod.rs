//! Automatic output: the periodic summary loop and presence change alerts.

use crate::whos_online::commands::Error;
use crate::whos_online::connectors::discord::{DiscordConnector, GuildRoster, ServerMember};
use crate::whos_online::messages::{Alert, OnlineDirectMessage, Summary};
use crate::whos_online::presence::{PresenceTracker, Snapshot, Transition};
use crate::whos_online::settings::SettingsStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// A member's new presence in one guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceChange {
    pub(crate) guild_id: u64,
    /// The member, with the status they just switched to
    pub(crate) member: ServerMember,
}

/// How many sends of one batch went through and how many failed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
}

pub struct PresenceNotifier<'a, DISCORD: DiscordConnector> {
    settings: &'a Mutex<SettingsStore>,
    presences: &'a Mutex<PresenceTracker>,
    discord_connector: &'a DISCORD,
}

impl<'a, DISCORD: DiscordConnector> PresenceNotifier<'a, DISCORD> {
    pub fn new(
        settings: &'a Mutex<SettingsStore>,
        presences: &'a Mutex<PresenceTracker>,
        discord_connector: &'a DISCORD,
    ) -> Self {
        Self {
            settings,
            presences,
            discord_connector,
        }
    }

    /// Posts one summary to every guild with a notification channel.
    ///
    /// Guilds are handled one after the other with `send_delay` in between.
    /// A failing guild is logged and skipped, its setting stays untouched.
    pub async fn post_summaries(&self, send_delay: Duration) -> DeliveryReport {
        let channels = self.settings.lock().await.configured_channels();
        let mut report = DeliveryReport::default();
        for (index, (guild_id, channel_id)) in channels.into_iter().enumerate() {
            if index > 0 && !send_delay.is_zero() {
                tokio::time::sleep(send_delay).await;
            }
            match self.post_summary(guild_id, channel_id).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    error!(
                        "Skipping summary for guild {} in channel {}: {:?}",
                        guild_id, channel_id, e
                    );
                    report.failed += 1;
                }
            }
        }
        report
    }

    async fn post_summary(&self, guild_id: u64, channel_id: u64) -> Result<(), Error> {
        let roster = self.discord_connector.get_guild_roster(guild_id).await?;
        let snapshot = Snapshot::from_roster(&roster.members);
        let summary = Summary {
            guild_name: &roster.guild_name,
            member_count: roster.member_count,
            snapshot: &snapshot,
            timestamp: Utc::now(),
        };
        self.discord_connector
            .send_message(channel_id, &summary.to_string())
            .await?;
        debug!(
            "Posted summary of {} online members for guild {}",
            snapshot.total_online(),
            guild_id
        );
        Ok(())
    }

    /// Records a member's new status and announces it when they came online
    /// or went offline.
    ///
    /// The guild's channel gets a one-line alert. With a target role set,
    /// only holders of the role are announced, and a member coming online is
    /// also announced by DM to every other human holder of the role.
    ///
    /// # Returns
    ///
    /// * `Result<Option<Transition>, Error>` - The announced transition, `None` if nothing was sent
    pub async fn handle_presence_update(
        &self,
        change: PresenceChange,
    ) -> Result<Option<Transition>, Error> {
        let PresenceChange { guild_id, member } = change;
        if member.is_bot {
            debug!("Ignoring presence of bot {}", member.id);
            return Ok(None);
        }

        let previous = self
            .presences
            .lock()
            .await
            .record(guild_id, member.id, member.status);
        let Some(transition) = Transition::between(previous, member.status) else {
            debug!(
                "{} went from {:?} to {:?}, nothing to announce",
                member.display_name, previous, member.status
            );
            return Ok(None);
        };

        let (channel, target_role) = {
            let settings = self.settings.lock().await;
            (settings.get(guild_id), settings.target_role(guild_id))
        };
        if let Some(role_id) = target_role {
            if !member.has_role(role_id) {
                debug!(
                    "{} does not have target role {}",
                    member.display_name, role_id
                );
                return Ok(None);
            }
        }
        let dm_role = match (transition, target_role) {
            (Transition::CameOnline, Some(role_id)) => Some(role_id),
            _ => None,
        };
        if channel.is_none() && dm_role.is_none() {
            debug!("Guild {} has nowhere to announce presences", guild_id);
            return Ok(None);
        }

        if let Some(role_id) = dm_role {
            let report = self.notify_role_holders(guild_id, role_id, &member).await;
            info!(
                "DMs for {} coming online: {} sent, {} failed",
                member.display_name, report.sent, report.failed
            );
        }
        if let Some(channel_id) = channel {
            let alert = Alert {
                member: &member,
                transition,
            };
            self.discord_connector
                .send_message(channel_id, &alert.to_string())
                .await?;
        }
        info!("{:?}: {} in guild {}", transition, member.display_name, guild_id);
        Ok(Some(transition))
    }

    /// DMs every human holder of the role except the member who came online.
    /// A failed DM is logged and the others are still sent.
    async fn notify_role_holders(
        &self,
        guild_id: u64,
        role_id: u64,
        member: &ServerMember,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let roster = match self.discord_connector.get_guild_roster(guild_id).await {
            Ok(roster) => roster,
            Err(e) => {
                warn!("Cannot list holders of role {}: {}", role_id, e);
                return report;
            }
        };
        let message = OnlineDirectMessage {
            member_name: &member.display_name,
            guild_name: &roster.guild_name,
            is_test: false,
        }
        .to_string();
        let recipients = roster
            .members_with_role(role_id)
            .filter(|holder| holder.id != member.id && !holder.is_bot);
        for recipient in recipients {
            match self
                .discord_connector
                .send_direct_message(recipient.id, &message)
                .await
            {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    warn!("Cannot DM {}: {}", recipient.display_name, e);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Takes the statuses of a guild that just became available as the
    /// baseline for future transitions.
    pub async fn seed_guild(&self, guild_id: u64, roster: &GuildRoster) {
        self.presences.lock().await.seed(guild_id, &roster.members);
        info!(
            "Tracking presences of {} members in {}",
            roster.members.len(),
            roster.guild_name
        );
    }
}

/// Starts the periodic summary task. It runs for the rest of the process.
///
/// The first pass happens right away, the next ones every `update_interval`.
pub fn start<DISCORD: DiscordConnector + 'static>(
    discord_connector: DISCORD,
    settings: Arc<Mutex<SettingsStore>>,
    presences: Arc<Mutex<PresenceTracker>>,
    update_interval: Duration,
    send_delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(update_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Posting summaries every {:?}", update_interval);
        loop {
            ticker.tick().await;
            let notifier = PresenceNotifier::new(&settings, &presences, &discord_connector);
            let report = notifier.post_summaries(send_delay).await;
            info!(
                "Summary pass done: {} sent, {} failed",
                report.sent, report.failed
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::whos_online::connectors::discord;
    use crate::whos_online::connectors::discord::MockDiscordConnector;
    use crate::whos_online::connectors::discord::server_member::ServerMemberBuilder;
    use crate::whos_online::presence::PresenceStatus;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use mockall::predicate::*;

    const GUILD: u64 = 1000;
    const CHANNEL: u64 = 2000;
    const ROLE: u64 = 3000;

    fn settings_in(dir: &TempDir) -> Mutex<SettingsStore> {
        Mutex::new(SettingsStore::load(dir.child("bot_settings.json").path()))
    }

    fn change(id: u64, status: PresenceStatus, is_bot: bool) -> PresenceChange {
        PresenceChange {
            guild_id: GUILD,
            member: ServerMemberBuilder::new()
                .id(id)
                .display_name("Alice")
                .status(status)
                .is_bot(is_bot)
                .build(),
        }
    }

    fn roster(members: Vec<ServerMember>) -> GuildRoster {
        GuildRoster {
            guild_name: "Test Guild".to_string(),
            member_count: members.len() as u64,
            members,
        }
    }

    mod presence_update_tests {
        use super::*;

        #[tokio::test]
        async fn coming_online_sends_exactly_one_alert() {
            // Arrange
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            settings.lock().await.set(GUILD, CHANNEL).unwrap();
            let presences = Mutex::new(PresenceTracker::new());
            let mut mock_discord = MockDiscordConnector::new();
            mock_discord
                .expect_send_message()
                .with(eq(CHANNEL), eq("🟢 **Alice** is now online"))
                .times(1)
                .returning(|_, _| Ok(()));
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);

            // Act
            let result = notifier
                .handle_presence_update(change(1, PresenceStatus::Online, false))
                .await;

            // Assert
            assert_eq!(result.unwrap(), Some(Transition::CameOnline));
        }

        #[tokio::test]
        async fn going_offline_sends_an_alert() {
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            settings.lock().await.set(GUILD, CHANNEL).unwrap();
            let presences = Mutex::new(PresenceTracker::new());
            presences.lock().await.record(GUILD, 1, PresenceStatus::Idle);
            let mut mock_discord = MockDiscordConnector::new();
            mock_discord
                .expect_send_message()
                .with(eq(CHANNEL), eq("🔴 **Alice** went offline"))
                .times(1)
                .returning(|_, _| Ok(()));
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);

            let result = notifier
                .handle_presence_update(change(1, PresenceStatus::Offline, false))
                .await;

            assert_eq!(result.unwrap(), Some(Transition::WentOffline));
        }

        #[tokio::test]
        async fn idle_to_do_not_disturb_sends_nothing() {
            // Arrange
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            settings.lock().await.set(GUILD, CHANNEL).unwrap();
            let presences = Mutex::new(PresenceTracker::new());
            presences.lock().await.record(GUILD, 1, PresenceStatus::Idle);
            // No expectations: any send fails the test
            let mock_discord = MockDiscordConnector::new();
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);

            // Act
            let result = notifier
                .handle_presence_update(change(1, PresenceStatus::DoNotDisturb, false))
                .await;

            // Assert
            assert_eq!(result.unwrap(), None);
        }

        #[tokio::test]
        async fn bots_never_trigger_alerts() {
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            settings.lock().await.set(GUILD, CHANNEL).unwrap();
            let presences = Mutex::new(PresenceTracker::new());
            let mock_discord = MockDiscordConnector::new();
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);

            let result = notifier
                .handle_presence_update(change(1, PresenceStatus::Online, true))
                .await;

            assert_eq!(result.unwrap(), None);
        }

        #[tokio::test]
        async fn unconfigured_guild_gets_no_alert_but_status_is_tracked() {
            // Arrange
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            let presences = Mutex::new(PresenceTracker::new());
            let mock_discord = MockDiscordConnector::new();
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);

            // Act
            let result = notifier
                .handle_presence_update(change(1, PresenceStatus::Online, false))
                .await;

            // Assert
            assert_eq!(result.unwrap(), None);
            assert_eq!(
                presences.lock().await.record(GUILD, 1, PresenceStatus::Online),
                PresenceStatus::Online
            );
        }

        #[tokio::test]
        async fn repeated_online_updates_alert_once() {
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            settings.lock().await.set(GUILD, CHANNEL).unwrap();
            let presences = Mutex::new(PresenceTracker::new());
            let mut mock_discord = MockDiscordConnector::new();
            mock_discord
                .expect_send_message()
                .times(1)
                .returning(|_, _| Ok(()));
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);

            for status in [PresenceStatus::Online, PresenceStatus::Idle, PresenceStatus::Online] {
                notifier
                    .handle_presence_update(change(1, status, false))
                    .await
                    .unwrap();
            }
        }

        #[tokio::test]
        async fn target_role_filters_members_without_it() {
            // Arrange
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            settings.lock().await.set(GUILD, CHANNEL).unwrap();
            settings.lock().await.set_target_role(GUILD, ROLE).unwrap();
            let presences = Mutex::new(PresenceTracker::new());
            let mut mock_discord = MockDiscordConnector::new();
            mock_discord
                .expect_send_message()
                .with(eq(CHANNEL), eq("🟢 **Bob** is now online"))
                .times(1)
                .returning(|_, _| Ok(()));
            mock_discord
                .expect_get_guild_roster()
                .with(eq(GUILD))
                .times(1)
                .returning(|_| Ok(roster(vec![])));
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);
            let with_role = PresenceChange {
                guild_id: GUILD,
                member: ServerMemberBuilder::new()
                    .id(2)
                    .display_name("Bob")
                    .status(PresenceStatus::Online)
                    .role(ROLE)
                    .build(),
            };

            // Act
            let without = notifier
                .handle_presence_update(change(1, PresenceStatus::Online, false))
                .await
                .unwrap();
            let with = notifier.handle_presence_update(with_role).await.unwrap();

            // Assert
            assert_eq!(without, None);
            assert_eq!(with, Some(Transition::CameOnline));
        }

        #[tokio::test]
        async fn send_failure_is_reported() {
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            settings.lock().await.set(GUILD, CHANNEL).unwrap();
            let presences = Mutex::new(PresenceTracker::new());
            let mut mock_discord = MockDiscordConnector::new();
            mock_discord
                .expect_send_message()
                .times(1)
                .returning(|channel_id, _| Err(discord::Error::CannotSendMessage(channel_id)));
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);

            let result = notifier
                .handle_presence_update(change(1, PresenceStatus::Online, false))
                .await;

            assert!(matches!(result, Err(Error::DiscordError(_))));
            assert!(settings.lock().await.get(GUILD).is_some());
        }

        #[tokio::test]
        async fn seeded_members_do_not_alert_when_already_online() {
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            settings.lock().await.set(GUILD, CHANNEL).unwrap();
            let presences = Mutex::new(PresenceTracker::new());
            let mock_discord = MockDiscordConnector::new();
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);
            notifier
                .seed_guild(
                    GUILD,
                    &roster(vec![
                        ServerMemberBuilder::new()
                            .id(1)
                            .status(PresenceStatus::Online)
                            .build(),
                    ]),
                )
                .await;

            let result = notifier
                .handle_presence_update(change(1, PresenceStatus::Idle, false))
                .await;

            assert_eq!(result.unwrap(), None);
        }

        fn holder(id: u64, name: &str, is_bot: bool) -> ServerMember {
            ServerMemberBuilder::new()
                .id(id)
                .display_name(name)
                .status(PresenceStatus::Offline)
                .is_bot(is_bot)
                .role(ROLE)
                .build()
        }

        fn coming_online_with_role(id: u64, name: &str) -> PresenceChange {
            PresenceChange {
                guild_id: GUILD,
                member: ServerMemberBuilder::new()
                    .id(id)
                    .display_name(name)
                    .status(PresenceStatus::Online)
                    .role(ROLE)
                    .build(),
            }
        }

        #[tokio::test]
        async fn role_holders_get_a_dm_when_another_holder_comes_online() {
            // Arrange
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            settings.lock().await.set_target_role(GUILD, ROLE).unwrap();
            let presences = Mutex::new(PresenceTracker::new());
            let mut mock_discord = MockDiscordConnector::new();
            mock_discord
                .expect_get_guild_roster()
                .with(eq(GUILD))
                .times(1)
                .returning(|_| {
                    Ok(roster(vec![
                        holder(1, "Alice", false),
                        holder(2, "Bob", false),
                        holder(3, "Helper Bot", true),
                        holder(4, "Carol", false),
                        ServerMemberBuilder::new().id(5).display_name("Dave").build(),
                    ]))
                });
            mock_discord
                .expect_send_direct_message()
                .with(
                    function(|user_id: &u64| *user_id == 2 || *user_id == 4),
                    function(|message: &str| {
                        message.contains("**Alice** just came online in **Test Guild**!")
                    }),
                )
                .times(2)
                .returning(|_, _| Ok(()));
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);

            // Act
            let result = notifier
                .handle_presence_update(coming_online_with_role(1, "Alice"))
                .await;

            // Assert
            assert_eq!(result.unwrap(), Some(Transition::CameOnline));
        }

        #[tokio::test]
        async fn a_failed_dm_does_not_stop_the_others() {
            // Arrange
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            settings.lock().await.set(GUILD, CHANNEL).unwrap();
            settings.lock().await.set_target_role(GUILD, ROLE).unwrap();
            let presences = Mutex::new(PresenceTracker::new());
            let mut mock_discord = MockDiscordConnector::new();
            mock_discord
                .expect_get_guild_roster()
                .times(1)
                .returning(|_| {
                    Ok(roster(vec![
                        holder(1, "Alice", false),
                        holder(2, "Bob", false),
                        holder(3, "Carol", false),
                    ]))
                });
            mock_discord
                .expect_send_direct_message()
                .with(eq(2), always())
                .times(1)
                .returning(|user_id, _| Err(discord::Error::CannotSendDirectMessage(user_id)));
            mock_discord
                .expect_send_direct_message()
                .with(eq(3), always())
                .times(1)
                .returning(|_, _| Ok(()));
            mock_discord
                .expect_send_message()
                .with(eq(CHANNEL), eq("🟢 **Alice** is now online"))
                .times(1)
                .returning(|_, _| Ok(()));
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);

            // Act
            let result = notifier
                .handle_presence_update(coming_online_with_role(1, "Alice"))
                .await;

            // Assert
            assert_eq!(result.unwrap(), Some(Transition::CameOnline));
        }

        #[tokio::test]
        async fn going_offline_sends_no_dms() {
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            settings.lock().await.set_target_role(GUILD, ROLE).unwrap();
            let presences = Mutex::new(PresenceTracker::new());
            presences.lock().await.record(GUILD, 1, PresenceStatus::Online);
            // No expectations: any roster read or send fails the test
            let mock_discord = MockDiscordConnector::new();
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);
            let going_offline = PresenceChange {
                guild_id: GUILD,
                member: holder(1, "Alice", false),
            };

            let result = notifier.handle_presence_update(going_offline).await;

            assert_eq!(result.unwrap(), None);
        }

        #[tokio::test]
        async fn unreadable_roster_still_posts_the_channel_alert() {
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            settings.lock().await.set(GUILD, CHANNEL).unwrap();
            settings.lock().await.set_target_role(GUILD, ROLE).unwrap();
            let presences = Mutex::new(PresenceTracker::new());
            let mut mock_discord = MockDiscordConnector::new();
            mock_discord
                .expect_get_guild_roster()
                .times(1)
                .returning(|guild_id| Err(discord::Error::CannotFindGuild(guild_id)));
            mock_discord
                .expect_send_message()
                .with(eq(CHANNEL), always())
                .times(1)
                .returning(|_, _| Ok(()));
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);

            let result = notifier
                .handle_presence_update(coming_online_with_role(1, "Alice"))
                .await;

            assert_eq!(result.unwrap(), Some(Transition::CameOnline));
        }
    }

    mod summary_tests {
        use super::*;

        #[tokio::test]
        async fn unconfigured_guilds_get_no_messages() {
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            let presences = Mutex::new(PresenceTracker::new());
            let mock_discord = MockDiscordConnector::new();
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);

            let report = notifier.post_summaries(Duration::ZERO).await;

            assert_eq!(report, DeliveryReport::default());
        }

        #[tokio::test]
        async fn each_configured_guild_gets_one_summary() {
            // Arrange
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            settings.lock().await.set(GUILD, CHANNEL).unwrap();
            settings.lock().await.set(GUILD + 1, CHANNEL + 1).unwrap();
            let presences = Mutex::new(PresenceTracker::new());
            let mut mock_discord = MockDiscordConnector::new();
            mock_discord
                .expect_get_guild_roster()
                .times(2)
                .returning(|_| {
                    Ok(roster(vec![
                        ServerMemberBuilder::new()
                            .id(1)
                            .display_name("Alice")
                            .status(PresenceStatus::Online)
                            .build(),
                        ServerMemberBuilder::new()
                            .id(2)
                            .display_name("RoboBot")
                            .status(PresenceStatus::Online)
                            .is_bot(true)
                            .build(),
                    ]))
                });
            mock_discord
                .expect_send_message()
                .with(
                    function(|channel_id: &u64| {
                        *channel_id == CHANNEL || *channel_id == CHANNEL + 1
                    }),
                    function(|message: &str| {
                        message.contains("• Alice") && !message.contains("RoboBot")
                    }),
                )
                .times(2)
                .returning(|_, _| Ok(()));
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);

            // Act
            let report = notifier.post_summaries(Duration::ZERO).await;

            // Assert
            assert_eq!(report, DeliveryReport { sent: 2, failed: 0 });
        }

        #[tokio::test]
        async fn a_failing_guild_does_not_stop_the_others() {
            // Arrange
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            settings.lock().await.set(GUILD, CHANNEL).unwrap();
            settings.lock().await.set(GUILD + 1, CHANNEL + 1).unwrap();
            let presences = Mutex::new(PresenceTracker::new());
            let mut mock_discord = MockDiscordConnector::new();
            mock_discord
                .expect_get_guild_roster()
                .with(eq(GUILD))
                .times(1)
                .returning(|guild_id| Err(discord::Error::CannotFindGuild(guild_id)));
            mock_discord
                .expect_get_guild_roster()
                .with(eq(GUILD + 1))
                .times(1)
                .returning(|_| Ok(roster(vec![])));
            mock_discord
                .expect_send_message()
                .with(
                    eq(CHANNEL + 1),
                    function(|message: &str| message.contains("Nobody's online")),
                )
                .times(1)
                .returning(|_, _| Ok(()));
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);

            // Act
            let report = notifier.post_summaries(Duration::ZERO).await;

            // Assert
            assert_eq!(report, DeliveryReport { sent: 1, failed: 1 });
            assert_eq!(settings.lock().await.get(GUILD), Some(CHANNEL));
        }

        #[tokio::test(start_paused = true)]
        async fn guilds_are_spaced_by_the_send_delay() {
            let dir = TempDir::new().unwrap();
            let settings = settings_in(&dir);
            settings.lock().await.set(GUILD, CHANNEL).unwrap();
            settings.lock().await.set(GUILD + 1, CHANNEL + 1).unwrap();
            settings.lock().await.set(GUILD + 2, CHANNEL + 2).unwrap();
            let presences = Mutex::new(PresenceTracker::new());
            let mut mock_discord = MockDiscordConnector::new();
            mock_discord
                .expect_get_guild_roster()
                .returning(|_| Ok(roster(vec![])));
            mock_discord.expect_send_message().returning(|_, _| Ok(()));
            let notifier = PresenceNotifier::new(&settings, &presences, &mock_discord);
            let started = tokio::time::Instant::now();

            let report = notifier.post_summaries(Duration::from_secs(1)).await;

            assert_eq!(report.sent, 3);
            assert!(started.elapsed() >= Duration::from_secs(2));
            assert!(started.elapsed() < Duration::from_secs(3));
        }
    }
}
