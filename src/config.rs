use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub monitor: MonitorConfig,
    pub smtp: SmtpConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Vendor site root, e.g. "https://www.amazon.com".
    pub base_url: String,
    /// Per-call deadline for page loads, in seconds.
    pub request_timeout: u64,
    /// Pause after loading a results page, letting client-rendered markup
    /// settle and spacing successive vendor requests.
    pub settle_delay_ms: u64,
    /// Hard ceiling on result blocks scanned per search, independent of how
    /// many the page returns.
    pub max_candidates: usize,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Cron expression for the periodic price check.
    pub check_interval: String,
    /// Worker pool bound for per-product checks within a single run.
    pub max_concurrent_checks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub from_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Default lifetime of a login session entry, in seconds.
    pub ttl_seconds: u64,
    pub id_length: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default"))
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix "SENTRY_"
            .add_source(Environment::with_prefix("SENTRY").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.scraper.base_url).is_err() {
            return Err(ConfigError::Message("Invalid scraper base_url".into()));
        }

        if self.scraper.request_timeout == 0 {
            return Err(ConfigError::Message(
                "Scraper request_timeout must be greater than 0".into(),
            ));
        }

        if self.scraper.max_candidates == 0 {
            return Err(ConfigError::Message(
                "Scraper max_candidates must be greater than 0".into(),
            ));
        }

        if !is_valid_cron(&self.monitor.check_interval) {
            return Err(ConfigError::Message(
                "Invalid cron expression in monitor.check_interval".into(),
            ));
        }

        if self.monitor.max_concurrent_checks == 0 {
            return Err(ConfigError::Message(
                "Monitor max_concurrent_checks must be greater than 0".into(),
            ));
        }

        if self.smtp.port == 0 {
            return Err(ConfigError::Message("SMTP port must be greater than 0".into()));
        }

        if !self.smtp.from_address.contains('@') {
            return Err(ConfigError::Message(
                "SMTP from_address must be an email address".into(),
            ));
        }

        if self.session.ttl_seconds == 0 {
            return Err(ConfigError::Message(
                "Session ttl_seconds must be greater than 0".into(),
            ));
        }

        if self.session.id_length < 16 {
            return Err(ConfigError::Message(
                "Session id_length must be at least 16".into(),
            ));
        }

        Ok(())
    }
}

/// Basic cron validation - 6-field expressions with seconds are accepted too.
fn is_valid_cron(cron_expr: &str) -> bool {
    let parts: Vec<&str> = cron_expr.split_whitespace().collect();
    if parts.len() != 5 && parts.len() != 6 {
        return false;
    }

    for part in parts {
        if part.is_empty() {
            return false;
        }
        // Allow numbers, ranges, lists, wildcards, and steps
        if !part
            .chars()
            .all(|c| c.is_ascii_digit() || c == '*' || c == '-' || c == ',' || c == '/')
        {
            return false;
        }
    }

    true
}
