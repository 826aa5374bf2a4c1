//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Source;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Notification delivery settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Time-based trigger settings
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Sources used when the store has no enabled sources
    #[serde(default = "defaults::default_sources")]
    pub default_sources: Vec<Source>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Override selected values from `TRACKER_*` environment variables.
    pub fn apply_env(&mut self) {
        if let Ok(timeout) = std::env::var("TRACKER_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                self.crawler.timeout_secs = secs;
            }
        }

        if let Ok(recipient) = std::env::var("TRACKER_RECIPIENT") {
            self.notify.recipient = recipient;
        }

        if let Ok(webhook) = std::env::var("TRACKER_WEBHOOK_URL") {
            self.notify.webhook_url = Some(webhook).filter(|w| !w.trim().is_empty());
        }

        if let Ok(schedule) = std::env::var("TRACKER_SCHEDULE") {
            self.schedule.cron = schedule;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.schedule.cron.trim().is_empty() {
            return Err(AppError::validation("schedule.cron is empty"));
        }
        if let Some(webhook) = &self.notify.webhook_url {
            Url::parse(webhook).map_err(|e| {
                AppError::validation(format!("notify.webhook_url is not a valid URL: {e}"))
            })?;
        }
        for source in &self.default_sources {
            source.validate()?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            notify: NotifyConfig::default(),
            schedule: ScheduleConfig::default(),
            logging: LoggingConfig::default(),
            default_sources: defaults::default_sources(),
        }
    }
}

/// HTTP client settings for career page fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-fetch timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyConfig {
    /// Who receives the messages (channel, phone number, handle...)
    #[serde(default)]
    pub recipient: String,

    /// Chat webhook endpoint; messages are only logged when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

/// Scheduled trigger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Cron expression, seconds first (`sec min hour day month weekday`)
    #[serde(default = "defaults::cron")]
    pub cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: defaults::cron(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use crate::models::Source;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; InternTracker/1.0)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Daily at 09:00
    pub fn cron() -> String {
        "0 0 9 * * *".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }

    pub fn default_sources() -> Vec<Source> {
        vec![
            Source::new(
                "Google",
                "https://www.google.com/about/careers/applications/jobs/results?q=software+intern&location=United+States",
                "intern",
            ),
            Source::new(
                "Amazon",
                "https://www.amazon.jobs/en/search?base_query=software+intern&loc_query=United+States",
                "intern",
            ),
            Source::new(
                "Uber",
                "https://www.uber.com/us/en/careers/list/?query=intern%20software&location=USA",
                "intern",
            ),
            Source::new(
                "DoorDash",
                "https://careers.doordash.com/jobs/search?query=intern",
                "intern",
            ),
        ]
    }
}
