use crate::whos_online::connectors::discord::ServerMember;
use crate::whos_online::presence::{Snapshot, Transition};
use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};

/// Names listed per status group before the rest are summarised.
pub const MAX_LISTED_PER_GROUP: usize = 6;

/// The periodic and `/online` status summary of one guild.
pub struct Summary<'a> {
    pub(crate) guild_name: &'a str,
    pub(crate) member_count: u64,
    pub(crate) snapshot: &'a Snapshot,
    pub(crate) timestamp: DateTime<Utc>,
}

impl Summary<'_> {
    fn title(&self) -> &'static str {
        match self.snapshot.total_online() {
            0 => "🌙 The server is sleeping...",
            1 => "👋 A Lone Warrior Appears!",
            2..=3 => "🎭 A Small Gathering!",
            4..=8 => "🎉 Party Mode Activated!",
            9..=15 => "🚀 Server Energy Rising!",
            _ => "🌟 MAXIMUM ACTIVITY DETECTED!",
        }
    }

    fn activity_percentage(&self) -> f64 {
        if self.member_count == 0 {
            return 0.0;
        }
        self.snapshot.total_online() as f64 / self.member_count as f64 * 100.0
    }
}

impl Display for Summary<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "**{}**", self.title())?;
        if self.snapshot.is_empty() {
            writeln!(f, "💤 Nobody's online in **{}** right now.", self.guild_name)?;
        } else {
            writeln!(
                f,
                "🎯 **{}** members online in **{}** ({:.1}% of {})",
                self.snapshot.total_online(),
                self.guild_name,
                self.activity_percentage(),
                self.member_count
            )?;
            write_group(f, "🟢 Online", self.snapshot.online())?;
            write_group(f, "🟡 Idle", self.snapshot.idle())?;
            write_group(f, "🔴 Do Not Disturb", self.snapshot.do_not_disturb())?;
        }
        write!(f, "🕒 <t:{}:f>", self.timestamp.timestamp())
    }
}

fn write_group(
    f: &mut Formatter<'_>,
    heading: &str,
    members: &[ServerMember],
) -> std::fmt::Result {
    if members.is_empty() {
        return Ok(());
    }
    writeln!(f, "\n**{} ({})**", heading, members.len())?;
    for member in members.iter().take(MAX_LISTED_PER_GROUP) {
        writeln!(f, "• {}", member.display_name)?;
    }
    if members.len() > MAX_LISTED_PER_GROUP {
        writeln!(f, "*...and {} more*", members.len() - MAX_LISTED_PER_GROUP)?;
    }
    Ok(())
}

/// One-line alert for a member coming online or going offline.
pub struct Alert<'a> {
    pub(crate) member: &'a ServerMember,
    pub(crate) transition: Transition,
}

impl Display for Alert<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.transition {
            Transition::CameOnline => {
                write!(f, "🟢 **{}** is now online", self.member.display_name)
            }
            Transition::WentOffline => {
                write!(f, "🔴 **{}** went offline", self.member.display_name)
            }
        }
    }
}

/// Direct message telling a holder of the target role that someone came online.
pub struct OnlineDirectMessage<'a> {
    pub(crate) member_name: &'a str,
    pub(crate) guild_name: &'a str,
    /// Sent by `/testdm` rather than by a real presence change
    pub(crate) is_test: bool,
}

impl Display for OnlineDirectMessage<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "**🟢 Someone's Online!**")?;
        writeln!(
            f,
            "**{}** just came online in **{}**!",
            self.member_name, self.guild_name
        )?;
        writeln!(f, "💬 Perfect timing to start a conversation!")?;
        write!(f, "*From {}", self.guild_name)?;
        if self.is_test {
            write!(f, " • This is a test DM")?;
        }
        write!(f, "*")
    }
}

pub const SETUP_MESSAGE: &str =
    "🤖 **Bot Setup Complete**\nThis channel will now receive online member notifications!";
