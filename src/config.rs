//! Bot configuration: a YAML file with defaults, overridden by environment
//! variables for credentials and paths.

use serde::Deserialize;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::commands::DEFAULT_PREFIX;
use crate::core::UnknownRelationPolicy;
use crate::error::{BotError, Result};
use crate::format::COMPACT_PREFIX;
use crate::packer::text_len;
use crate::pipeline::PipelineOptions;
use crate::providers::Region;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub wargaming: WargamingConfig,
    pub discord: DiscordConfig,
    pub monitor: MonitorConfig,
    pub commands: CommandsConfig,
    pub unknown_relation: UnknownRelationPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WargamingConfig {
    pub application_id: String,
    pub region: Region,
    pub max_requests_per_second: u32,
    pub request_timeout_secs: u64,
}

impl Default for WargamingConfig {
    fn default() -> Self {
        Self {
            application_id: String::new(),
            region: Region::default(),
            max_requests_per_second: 10,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub token: String,
    pub channel_id: String,
    pub max_message_length: usize,
    pub compact_format: bool,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel_id: String::new(),
            max_message_length: 2000,
            compact_format: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub enabled: bool,
    pub replay_folder: PathBuf,
    pub working_copy: PathBuf,
    pub quiet_period_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            replay_folder: PathBuf::new(),
            working_copy: PathBuf::from("tempArenaInfo2.json"),
            quiet_period_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    pub prefix: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load `path` (or the default location when it exists), then apply
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml(&std::fs::read_to_string(path)?)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_yaml(&std::fs::read_to_string(DEFAULT_CONFIG_PATH)?)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override credentials and paths from `lookup` (normally the process
    /// environment). Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(id) = var("WG_API_ID") {
            self.wargaming.application_id = id;
        }
        if let Some(token) = var("DISCORD_TOKEN") {
            self.discord.token = token;
        }
        if let Some(channel) = var("DISCORD_CHANNEL_ID") {
            self.discord.channel_id = channel;
        }
        if let Some(folder) = var("WOWS_REPLAY_FOLDER") {
            self.monitor.replay_folder = PathBuf::from(folder);
        }
    }

    /// Settings needed to talk to the Wargaming API
    pub fn validate_api(&self) -> Result<()> {
        if self.wargaming.application_id.trim().is_empty() {
            return Err(BotError::Config(
                "wargaming.application_id is empty (or set WG_API_ID)".into(),
            ));
        }
        if self.wargaming.max_requests_per_second == 0 {
            return Err(BotError::Config(
                "wargaming.max_requests_per_second must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Everything `run` needs. `with_discord` is false for dry runs.
    pub fn validate(&self, with_discord: bool) -> Result<()> {
        self.validate_api()?;

        if with_discord {
            if self.discord.token.trim().is_empty() {
                return Err(BotError::Config("discord.token is empty (or set DISCORD_TOKEN)".into()));
            }
            if self.discord.channel_id.trim().is_empty() {
                return Err(BotError::Config(
                    "discord.channel_id is empty (or set DISCORD_CHANNEL_ID)".into(),
                ));
            }
        }

        if self.discord.max_message_length <= text_len(COMPACT_PREFIX) {
            return Err(BotError::Config(format!(
                "discord.max_message_length must be above {}",
                text_len(COMPACT_PREFIX)
            )));
        }

        if self.monitor.enabled && !self.monitor.replay_folder.is_dir() {
            return Err(BotError::Config(format!(
                "monitor.replay_folder '{}' is not a folder (or set WOWS_REPLAY_FOLDER)",
                self.monitor.replay_folder.display()
            )));
        }

        Ok(())
    }

    pub fn rate_limit(&self) -> Result<NonZeroU32> {
        NonZeroU32::new(self.wargaming.max_requests_per_second).ok_or_else(|| {
            BotError::Config("wargaming.max_requests_per_second must be at least 1".into())
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.wargaming.request_timeout_secs)
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.monitor.quiet_period_ms)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            max_message_length: self.discord.max_message_length,
            compact_format: self.discord.compact_format,
            unknown_relation: self.unknown_relation,
            working_copy: self.monitor.working_copy.clone(),
        }
    }
}
