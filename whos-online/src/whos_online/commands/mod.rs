use crate::whos_online::connectors::discord;
use crate::whos_online::settings;
use std::time::Duration;
use thiserror::Error;

pub(crate) mod channel;
pub(crate) mod direct_message;
pub(crate) mod online;
pub(crate) mod role;

/// What a command answers to the member that invoked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    /// Only the invoking member can see the reply
    pub ephemeral: bool,
}

impl Reply {
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    pub fn private(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Something went wrong with Discord")]
    DiscordError(#[from] discord::Error),
    #[error("Something went wrong saving the settings")]
    SettingsError(#[from] settings::Error),
}

/// Human readable form of the summary interval, e.g. "5 minutes".
pub(crate) fn describe_interval(interval: Duration) -> String {
    let seconds = interval.as_secs();
    match seconds {
        60 => "minute".to_string(),
        s if s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "second".to_string(),
        s => format!("{} seconds", s),
    }
}
