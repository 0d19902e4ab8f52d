use crate::whos_online::commands::{Error, Reply};
use crate::whos_online::connectors::discord::ServerMember;
use crate::whos_online::settings::SettingsStore;
use tokio::sync::Mutex;
use tracing::info;

/// Handles `/setrole`, `/removerole` and `/checkrole`.
///
/// A target role narrows presence alerts down to the members holding it.
pub struct RoleCommands<'a> {
    settings: &'a Mutex<SettingsStore>,
}

impl<'a> RoleCommands<'a> {
    pub fn new(settings: &'a Mutex<SettingsStore>) -> Self {
        Self { settings }
    }

    pub async fn set_role(&self, guild_id: u64, role_id: u64) -> Result<Reply, Error> {
        self.settings
            .lock()
            .await
            .set_target_role(guild_id, role_id)?;
        info!("Target role for guild {} set to {}", guild_id, role_id);
        Ok(Reply::private(format!(
            "✅ Now monitoring <@&{}> for online/offline status changes.\n\
             Only members with this role will trigger notifications.",
            role_id
        )))
    }

    pub async fn remove_role(&self, guild_id: u64) -> Result<Reply, Error> {
        let removed = self.settings.lock().await.remove_target_role(guild_id)?;
        if !removed {
            return Ok(Reply::private(
                "❌ There's no target role set for this server.",
            ));
        }
        info!("Target role for guild {} removed", guild_id);
        Ok(Reply::private(
            "✅ Role filter removed. Every member's status changes trigger notifications again.",
        ))
    }

    pub async fn check_role(&self, guild_id: u64, member: &ServerMember) -> Result<Reply, Error> {
        let target_role = self.settings.lock().await.target_role(guild_id);
        let content = match target_role {
            None => "⚠️ No target role is set for this server, everyone triggers notifications."
                .to_string(),
            Some(role_id) if member.has_role(role_id) => format!(
                "✅ You have the target role <@&{}>. Your status changes trigger notifications.",
                role_id
            ),
            Some(role_id) => format!(
                "❌ You don't have the target role <@&{}>. Your status changes won't trigger notifications.",
                role_id
            ),
        };
        Ok(Reply::private(content))
    }
}
