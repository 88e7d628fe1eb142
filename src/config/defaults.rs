use super::*;

pub(super) const DEFAULT_ENDPOINT: &str = "https://api.oefr-kraken.energy/v1/graphql/";

pub(super) fn scan_interval_minutes() -> u64 {
    6
}

pub(super) fn timezone() -> String {
    "Europe/Paris".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            auth_scheme: "JWT".to_string(),
            request_timeout_secs: 30,
            login_timeout_secs: 30,
            max_attempts: 3,
            retry_base_delay_ms: 1000,
            token_expiry_margin_secs: 60,
            default_token_lifetime_secs: 3600,
            user_agent: format!("hestia/{}", env!("APP_VERSION")),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: String::new(),
            console_output: true,
            json_format: false,
            backup_count: 5,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account: AccountConfig::default(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
            scan_interval_minutes: scan_interval_minutes(),
            timezone: timezone(),
        }
    }
}
