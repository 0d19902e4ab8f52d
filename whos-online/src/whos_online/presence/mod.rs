//! Presence statuses, per-guild snapshots and the last-seen status tracker.

use crate::whos_online::connectors::discord::ServerMember;
use std::collections::HashMap;

/// Availability of a member as reported by Discord.
///
/// Invisible members are reported as `Offline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PresenceStatus {
    Online,
    Idle,
    DoNotDisturb,
    #[default]
    Offline,
}

impl PresenceStatus {
    /// Whether the member counts as online for notifications.
    pub fn is_active(self) -> bool {
        self != PresenceStatus::Offline
    }
}

/// A change between offline and active that is worth announcing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    CameOnline,
    WentOffline,
}

impl Transition {
    /// Classifies a status change. Changes between two active statuses,
    /// e.g. online to idle, are not transitions.
    pub fn between(before: PresenceStatus, after: PresenceStatus) -> Option<Self> {
        match (before.is_active(), after.is_active()) {
            (false, true) => Some(Transition::CameOnline),
            (true, false) => Some(Transition::WentOffline),
            _ => None,
        }
    }
}

/// Active, non-bot members of a guild grouped by status.
///
/// Each group keeps the roster's order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    online: Vec<ServerMember>,
    idle: Vec<ServerMember>,
    do_not_disturb: Vec<ServerMember>,
}

impl Snapshot {
    pub fn from_roster(members: &[ServerMember]) -> Self {
        let mut snapshot = Self::default();
        for member in members.iter().filter(|member| !member.is_bot) {
            let group = match member.status {
                PresenceStatus::Online => &mut snapshot.online,
                PresenceStatus::Idle => &mut snapshot.idle,
                PresenceStatus::DoNotDisturb => &mut snapshot.do_not_disturb,
                PresenceStatus::Offline => continue,
            };
            group.push(member.clone());
        }
        snapshot
    }

    pub fn online(&self) -> &[ServerMember] {
        &self.online
    }

    pub fn idle(&self) -> &[ServerMember] {
        &self.idle
    }

    pub fn do_not_disturb(&self) -> &[ServerMember] {
        &self.do_not_disturb
    }

    pub fn total_online(&self) -> usize {
        self.online.len() + self.idle.len() + self.do_not_disturb.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_online() == 0
    }
}

/// Last status seen for each member of each guild.
///
/// Gateway presence updates only carry the new status, so the previous one
/// is kept here. Unknown members are offline.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    statuses: HashMap<(u64, u64), PresenceStatus>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces everything known about a guild with its current roster.
    pub fn seed(&mut self, guild_id: u64, members: &[ServerMember]) {
        self.forget_guild(guild_id);
        for member in members.iter().filter(|member| member.status.is_active()) {
            self.statuses.insert((guild_id, member.id), member.status);
        }
    }

    /// Stores a member's new status and returns the previous one.
    pub fn record(
        &mut self,
        guild_id: u64,
        member_id: u64,
        status: PresenceStatus,
    ) -> PresenceStatus {
        let previous = if status.is_active() {
            self.statuses.insert((guild_id, member_id), status)
        } else {
            self.statuses.remove(&(guild_id, member_id))
        };
        previous.unwrap_or_default()
    }

    pub fn forget_guild(&mut self, guild_id: u64) {
        self.statuses.retain(|(guild, _), _| *guild != guild_id);
    }
}
