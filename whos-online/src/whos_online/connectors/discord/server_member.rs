use crate::whos_online::presence::PresenceStatus;

/// Represents a member of a Discord server as seen at one point in time.
///
/// Contains the member's ID, the name shown in the server, the presence
/// status and the roles held.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ServerMember {
    /// Discord user's unique identifier
    pub(crate) id: u64,
    /// Server nickname, falling back to the global or user name
    pub(crate) display_name: String,
    /// Presence status reported by Discord
    pub(crate) status: PresenceStatus,
    /// Whether the member is a bot
    pub(crate) is_bot: bool,
    pub(crate) role_ids: Vec<u64>,
}

impl ServerMember {
    pub fn has_role(&self, role_id: u64) -> bool {
        self.role_ids.contains(&role_id)
    }
}

/// The members of a guild together with the guild's name and size.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GuildRoster {
    pub(crate) guild_name: String,
    /// Total member count reported by Discord, bots included
    pub(crate) member_count: u64,
    pub(crate) members: Vec<ServerMember>,
}

impl GuildRoster {
    /// Members holding a role, in roster order.
    pub fn members_with_role(&self, role_id: u64) -> impl Iterator<Item = &ServerMember> {
        self.members.iter().filter(move |member| member.has_role(role_id))
    }
}

/// Builder for ServerMember instances.
///
/// This provides a fluent interface for constructing ServerMember objects,
/// making test code more readable and flexible.
#[derive(Debug, Default)]
#[cfg(test)]
pub struct ServerMemberBuilder {
    id: u64,
    display_name: String,
    status: PresenceStatus,
    is_bot: bool,
    role_ids: Vec<u64>,
}

#[cfg(test)]
impl ServerMemberBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Discord user ID.
    pub fn id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Sets the name shown for this server member.
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn status(mut self, status: PresenceStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets whether this server member is a bot.
    #[allow(clippy::wrong_self_convention)]
    pub fn is_bot(mut self, is_bot: bool) -> Self {
        self.is_bot = is_bot;
        self
    }

    /// Adds a role to this server member.
    pub fn role(mut self, role_id: u64) -> Self {
        self.role_ids.push(role_id);
        self
    }

    /// Builds a ServerMember instance with the configured values.
    pub fn build(self) -> ServerMember {
        ServerMember {
            id: self.id,
            display_name: self.display_name,
            status: self.status,
            is_bot: self.is_bot,
            role_ids: self.role_ids,
        }
    }
}
