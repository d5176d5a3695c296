use std::path::{Path, PathBuf};
use std::time::Duration;

use agenda_watch_core::diff::DayGranularity;
use agenda_watch_core::normalize::Normalizer;
use agenda_watch_core::render::{Labels, Language};
use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use url::Url;

use crate::logging::LogFormat;
use crate::source;

/// Raw configuration as written in config.toml.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Calendar feed (https:// or webcal://). Overridden by CALENDAR_URL.
    pub calendar_url: Option<String>,

    /// Discord webhook receiving notifications. Overridden by WEBHOOK_URL.
    pub webhook_url: Option<String>,

    /// Time between two fetches, e.g. "60s" or "5m"
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Upper bound for one feed download or webhook call
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,

    /// IANA timezone events are displayed and compared in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub language: Language,

    #[serde(default)]
    pub day_granularity: DayGranularity,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default)]
    pub description: DescriptionConfig,
}

/// Fixed wrapper text to cut from every description.
#[derive(Debug, Default, Deserialize)]
pub struct DescriptionConfig {
    #[serde(default)]
    pub trim_start: usize,
    #[serde(default)]
    pub trim_end: usize,
}

fn default_interval() -> String {
    "60s".to_string()
}

fn default_request_timeout() -> String {
    "30s".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            calendar_url: None,
            webhook_url: None,
            interval: default_interval(),
            request_timeout: default_request_timeout(),
            timezone: default_timezone(),
            language: Language::default(),
            day_granularity: DayGranularity::default(),
            log_format: LogFormat::default(),
            description: DescriptionConfig::default(),
        }
    }
}

/// Validated configuration, ready to build collaborators from.
#[derive(Debug)]
pub struct Settings {
    pub calendar_url: Option<Url>,
    pub webhook_url: Option<Url>,
    pub interval: Duration,
    pub request_timeout: Duration,
    pub timezone: Tz,
    pub labels: Labels,
    pub day_granularity: DayGranularity,
    pub normalizer: Normalizer,
    pub log_format: LogFormat,
}

/// Get the config file path (~/.config/agenda-watch/config.toml)
pub fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("agenda-watch");
    Ok(dir.join("config.toml"))
}

impl Config {
    /// Load config from `path`, or from the default location when `None`.
    /// A missing default file is not an error: everything required can
    /// come from the environment.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let config = match path {
            Some(path) => Self::read(path)?,
            None => {
                let path = config_path()?;
                if path.exists() {
                    Self::read(&path)?
                } else {
                    Config::default()
                }
            }
        };

        Ok(config.with_overrides(
            std::env::var("CALENDAR_URL").ok(),
            std::env::var("WEBHOOK_URL").ok(),
        ))
    }

    fn read(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Config> {
        Ok(toml::from_str(contents)?)
    }

    /// Environment values win over the file when set and non-empty.
    pub fn with_overrides(
        mut self,
        calendar_url: Option<String>,
        webhook_url: Option<String>,
    ) -> Config {
        if let Some(url) = calendar_url.filter(|u| !u.is_empty()) {
            self.calendar_url = Some(url);
        }
        if let Some(url) = webhook_url.filter(|u| !u.is_empty()) {
            self.webhook_url = Some(url);
        }
        self
    }

    pub fn validate(self) -> Result<Settings> {
        let calendar_url = self
            .calendar_url
            .as_deref()
            .map(source::feed_url)
            .transpose()?;

        let webhook_url = self
            .webhook_url
            .as_deref()
            .map(|u| Url::parse(u).with_context(|| format!("Invalid webhook URL '{}'", u)))
            .transpose()?;

        let interval = humantime::parse_duration(&self.interval)
            .with_context(|| format!("Invalid interval '{}'", self.interval))?;
        if interval.is_zero() {
            anyhow::bail!("Interval must be greater than zero");
        }

        let request_timeout = humantime::parse_duration(&self.request_timeout)
            .with_context(|| format!("Invalid request_timeout '{}'", self.request_timeout))?;

        let timezone: Tz = self
            .timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {}", self.timezone, e))?;

        Ok(Settings {
            calendar_url,
            webhook_url,
            interval,
            request_timeout,
            timezone,
            labels: Labels::for_language(self.language),
            day_granularity: self.day_granularity,
            normalizer: Normalizer::new(self.description.trim_start, self.description.trim_end),
            log_format: self.log_format,
        })
    }
}

impl Settings {
    /// The feed URL, required by every command that downloads it.
    pub fn require_calendar_url(&self) -> Result<&Url> {
        self.calendar_url.as_ref().context(
            "Missing calendar URL.\n\n\
            Set CALENDAR_URL or add it to config.toml:\n\n\
            calendar_url = \"https://example.com/calendar.ics\"",
        )
    }

    /// The webhook URL, required for anything but a dry run.
    pub fn require_webhook(&self) -> Result<&Url> {
        self.webhook_url.as_ref().context(
            "Missing webhook URL.\n\n\
            Set WEBHOOK_URL or add it to config.toml:\n\n\
            webhook_url = \"https://discord.com/api/webhooks/...\"\n\n\
            Or run with --dry-run to print notifications instead.",
        )
    }
}
