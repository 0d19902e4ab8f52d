use crate::whos_online::commands::{Error, Reply};
use crate::whos_online::connectors::discord;
use crate::whos_online::connectors::discord::{DiscordConnector, ServerMember};
use crate::whos_online::messages::OnlineDirectMessage;
use tracing::{info, warn};

/// Handles `/testdm`: sends the invoking member the DM role holders receive
/// when someone comes online.
pub async fn test_dm<DISCORD: DiscordConnector>(
    discord_connector: &DISCORD,
    guild_name: &str,
    member: &ServerMember,
) -> Result<Reply, Error> {
    let message = OnlineDirectMessage {
        member_name: &member.display_name,
        guild_name,
        is_test: true,
    };
    match discord_connector
        .send_direct_message(member.id, &message.to_string())
        .await
    {
        Ok(()) => {
            info!("Sent test DM to {}", member.display_name);
            Ok(Reply::private(
                "✅ Test DM sent! Check your DMs to see how the notification looks.\n\
                 This is what other members with the target role receive when someone comes online.",
            ))
        }
        Err(discord::Error::CannotSendDirectMessage(_)) => {
            warn!("{} does not accept DMs from the bot", member.display_name);
            Ok(Reply::private(
                "❌ I couldn't send you a DM. Please check that:\n\
                 • You have DMs enabled from server members\n\
                 • You haven't blocked the bot",
            ))
        }
        Err(e) => Err(e.into()),
    }
}
