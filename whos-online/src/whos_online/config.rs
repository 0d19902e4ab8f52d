use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SETTINGS_FILE: &str = "bot_settings.json";
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_SEND_DELAY_MILLIS: u64 = 1000;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub discord_token: String,
    #[serde(default = "default_settings_file")]
    pub settings_file: PathBuf,
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,
    #[serde(default = "default_send_delay_millis")]
    pub send_delay_millis: u64,
}

fn default_settings_file() -> PathBuf {
    PathBuf::from(DEFAULT_SETTINGS_FILE)
}

fn default_update_interval_secs() -> u64 {
    DEFAULT_UPDATE_INTERVAL_SECS
}

fn default_send_delay_millis() -> u64 {
    DEFAULT_SEND_DELAY_MILLIS
}

impl Config {
    /// Reads `whos-online/config.toml` when present, then `WHOS_ONLINE_*`
    /// variables, then `DISCORD_TOKEN` (or `BOT_TOKEN`) for the token.
    pub(crate) fn new() -> anyhow::Result<Self> {
        let token = std::env::var("DISCORD_TOKEN")
            .or_else(|_| std::env::var("BOT_TOKEN"))
            .ok();
        Self::from_sources(
            config::File::with_name("whos-online/config").required(false),
            token,
        )
    }

    fn from_sources<S>(file: S, token: Option<String>) -> anyhow::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let s = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("WHOS_ONLINE").try_parsing(true))
            .set_override_option("discord_token", token)?
            .build()?;

        let config: Config = s.try_deserialize()?;
        anyhow::ensure!(
            !config.discord_token.trim().is_empty(),
            "DISCORD_TOKEN is empty"
        );
        anyhow::ensure!(
            config.update_interval_secs > 0,
            "update_interval_secs must be greater than zero"
        );
        Ok(config)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.send_delay_millis)
    }
}
