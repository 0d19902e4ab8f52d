use crate::whos_online::commands::{Error, Reply};
use crate::whos_online::connectors::discord::DiscordConnector;
use crate::whos_online::messages::Summary;
use crate::whos_online::presence::Snapshot;
use chrono::{DateTime, Utc};
use tracing::info;

/// Builds the `/online` answer for a guild. Works whether or not the guild
/// has a notification channel.
pub async fn online<DISCORD: DiscordConnector>(
    discord_connector: &DISCORD,
    guild_id: u64,
    now: DateTime<Utc>,
) -> Result<Reply, Error> {
    let roster = discord_connector.get_guild_roster(guild_id).await?;
    let snapshot = Snapshot::from_roster(&roster.members);
    info!(
        "{} of {} members online in guild {}",
        snapshot.total_online(),
        roster.member_count,
        guild_id
    );
    let summary = Summary {
        guild_name: &roster.guild_name,
        member_count: roster.member_count,
        snapshot: &snapshot,
        timestamp: now,
    };
    Ok(Reply::public(summary.to_string()))
}
