//! Configuration management for Hestia
//!
//! This module handles loading, validation, and management of the adapter
//! configuration from YAML files with support for environment variable
//! overrides of the credentials.

use crate::error::{HestiaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider account credentials
    pub account: AccountConfig,

    /// Provider API connection settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Refresh interval in minutes (bounded by the host)
    #[serde(default = "defaults::scan_interval_minutes")]
    pub scan_interval_minutes: u64,

    /// Timezone for reading windows and off-peak checks
    #[serde(default = "defaults::timezone")]
    pub timezone: String,
}

/// Provider account credentials
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AccountConfig {
    /// Login email
    pub email: String,

    /// Login password
    pub password: String,

    /// Account number; empty selects the first account of the login
    #[serde(default)]
    pub account_number: String,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("email", &self.email)
            .field("password", &"***")
            .field("account_number", &self.account_number)
            .finish()
    }
}

/// Provider API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// GraphQL endpoint
    pub endpoint: String,

    /// Authorization header scheme placed before the token
    pub auth_scheme: String,

    /// Per-attempt request timeout
    pub request_timeout_secs: u64,

    /// Timeout for the whole login call
    pub login_timeout_secs: u64,

    /// Attempts per request before giving up
    pub max_attempts: u32,

    /// Linear backoff unit between attempts
    pub retry_base_delay_ms: u64,

    /// Tokens are treated as expired this long before their real expiry
    pub token_expiry_margin_secs: i64,

    /// Lifetime assumed for tokens whose expiry cannot be decoded
    pub default_token_lifetime_secs: i64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file; empty disables file logging
    pub file: String,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,

    /// Number of rotated files to keep
    pub backup_count: u32,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = [
            "hestia.yaml",
            "/data/hestia.yaml",
            "/etc/hestia/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Replace credentials with HESTIA_EMAIL / HESTIA_PASSWORD / HESTIA_ACCOUNT_NUMBER when set
    pub fn with_env_overrides(mut self) -> Self {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        if let Some(email) = read("HESTIA_EMAIL") {
            self.account.email = email;
        }
        if let Some(password) = read("HESTIA_PASSWORD") {
            self.account.password = password;
        }
        if let Some(number) = read("HESTIA_ACCOUNT_NUMBER") {
            self.account.account_number = number;
        }
        self
    }

    /// Parsed timezone, falling back to UTC when the name is unknown
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.account.email.trim().is_empty() {
            return Err(HestiaError::validation(
                "account.email",
                "Email cannot be empty",
            ));
        }

        if self.account.password.is_empty() {
            return Err(HestiaError::validation(
                "account.password",
                "Password cannot be empty",
            ));
        }

        if self.api.endpoint.trim().is_empty() {
            return Err(HestiaError::validation(
                "api.endpoint",
                "Endpoint cannot be empty",
            ));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(HestiaError::validation(
                "api.request_timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.api.login_timeout_secs == 0 {
            return Err(HestiaError::validation(
                "api.login_timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.api.max_attempts == 0 {
            return Err(HestiaError::validation(
                "api.max_attempts",
                "At least one attempt is required",
            ));
        }

        if self.api.token_expiry_margin_secs < 0 || self.api.default_token_lifetime_secs <= 0 {
            return Err(HestiaError::validation(
                "api.token",
                "Margin must be >= 0 and default lifetime > 0",
            ));
        }

        crate::logging::parse_log_level(&self.logging.level)?;

        if self.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(HestiaError::validation(
                "timezone".to_string(),
                format!("Unknown timezone: {}", self.timezone),
            ));
        }

        Ok(())
    }
}
