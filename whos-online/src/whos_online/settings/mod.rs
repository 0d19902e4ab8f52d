//! Per-guild notification settings, persisted to a JSON file.
//!
//! The whole file is read once at startup and rewritten after every change.
//! A missing or unreadable file is never fatal: the bot starts with no
//! configured guilds instead.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to serialize settings")]
    CannotSerialize(#[from] serde_json::Error),
    #[error("Failed to write settings to {}", path.display())]
    CannotWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything configured per guild.
///
/// Serialized as one flat object per mapping, guild ID string to ID string.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct GuildSettings {
    #[serde(default, with = "id_map")]
    pub(crate) notification_channels: BTreeMap<u64, u64>,
    #[serde(default, with = "id_map")]
    pub(crate) target_roles: BTreeMap<u64, u64>,
}

/// Guild settings backed by a file on disk.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    settings: GuildSettings,
}

impl SettingsStore {
    /// Reads the settings file, falling back to empty settings when the file
    /// is missing or malformed.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<GuildSettings>(&contents) {
                Ok(settings) => {
                    info!(
                        "Loaded settings for {} guilds from {}",
                        settings.notification_channels.len(),
                        path.display()
                    );
                    settings
                }
                Err(e) => {
                    warn!("Ignoring malformed settings file {}: {}", path.display(), e);
                    GuildSettings::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No settings file at {}, starting empty", path.display());
                GuildSettings::default()
            }
            Err(e) => {
                warn!("Cannot read settings file {}: {}", path.display(), e);
                GuildSettings::default()
            }
        };
        Self { path, settings }
    }

    /// Writes every setting to disk, replacing the previous file atomically.
    pub fn persist(&self) -> Result<(), Error> {
        let contents = serde_json::to_string_pretty(&self.settings)?;
        let temporary = temporary_path(&self.path);
        fs::write(&temporary, contents).map_err(|source| Error::CannotWrite {
            path: temporary.clone(),
            source,
        })?;
        fs::rename(&temporary, &self.path).map_err(|source| Error::CannotWrite {
            path: self.path.clone(),
            source,
        })?;
        info!("Settings saved to {}", self.path.display());
        Ok(())
    }

    /// Applies a change and persists it. The change is rolled back when the
    /// file cannot be written.
    fn commit(&mut self, change: impl FnOnce(&mut GuildSettings)) -> Result<(), Error> {
        let mut updated = self.settings.clone();
        change(&mut updated);
        let previous = std::mem::replace(&mut self.settings, updated);
        if let Err(e) = self.persist() {
            self.settings = previous;
            return Err(e);
        }
        Ok(())
    }

    /// The notification channel configured for a guild.
    pub fn get(&self, guild_id: u64) -> Option<u64> {
        self.settings.notification_channels.get(&guild_id).copied()
    }

    pub fn set(&mut self, guild_id: u64, channel_id: u64) -> Result<(), Error> {
        self.commit(|settings| {
            settings.notification_channels.insert(guild_id, channel_id);
        })
    }

    /// Removes a guild's notification channel. Returns whether one was set.
    pub fn remove(&mut self, guild_id: u64) -> Result<bool, Error> {
        if !self.settings.notification_channels.contains_key(&guild_id) {
            return Ok(false);
        }
        self.commit(|settings| {
            settings.notification_channels.remove(&guild_id);
        })?;
        Ok(true)
    }

    /// Every guild with a notification channel, in guild ID order.
    pub fn configured_channels(&self) -> Vec<(u64, u64)> {
        self.settings
            .notification_channels
            .iter()
            .map(|(guild_id, channel_id)| (*guild_id, *channel_id))
            .collect()
    }

    pub fn target_role(&self, guild_id: u64) -> Option<u64> {
        self.settings.target_roles.get(&guild_id).copied()
    }

    pub fn set_target_role(&mut self, guild_id: u64, role_id: u64) -> Result<(), Error> {
        self.commit(|settings| {
            settings.target_roles.insert(guild_id, role_id);
        })
    }

    /// Removes a guild's target role. Returns whether one was set.
    pub fn remove_target_role(&mut self, guild_id: u64) -> Result<bool, Error> {
        if !self.settings.target_roles.contains_key(&guild_id) {
            return Ok(false);
        }
        self.commit(|settings| {
            settings.target_roles.remove(&guild_id);
        })?;
        Ok(true)
    }

    #[cfg(test)]
    pub fn settings(&self) -> &GuildSettings {
        &self.settings
    }
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut file_name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("settings"));
    file_name.push(".tmp");
    path.with_file_name(file_name)
}

/// (De)serializes `u64 -> u64` maps as string-keyed, string-valued objects.
/// Numeric values are accepted when reading.
mod id_map {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<u64, u64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            map.iter()
                .map(|(key, value)| (key.to_string(), value.to_string())),
        )
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<u64, u64>, D::Error> {
        let raw = BTreeMap::<String, Id>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(key, value)| {
                let key = key.parse::<u64>().map_err(D::Error::custom)?;
                let value = match value {
                    Id::Text(text) => text.parse::<u64>().map_err(D::Error::custom)?,
                    Id::Number(number) => number,
                };
                Ok((key, value))
            })
            .collect()
    }
}
