use crate::errors::{Result, Rule1Error};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Upper bound for `lookback_days`, roughly ten years of calendar days.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

#[derive(Debug, Clone)]
pub struct Config {
    pub lookback_days: i64,
    pub cache_ttl: Duration,
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub min_request_interval: Duration,
    pub data_dir: String,
    pub exchange_suffix: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            lookback_days: 30,
            cache_ttl: Duration::from_secs(600),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            min_request_interval: Duration::from_millis(500),
            data_dir: "data".to_string(),
            exchange_suffix: ".T".to_string(),
        }
    }

    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_api_base_url(mut self, url: &str) -> Self {
        self.api_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    // 测试时设为 0 以跳过频率限制
    pub fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }

    pub fn with_data_dir(mut self, dir: &str) -> Self {
        self.data_dir = dir.to_string();
        self
    }

    /// Rejects settings that cannot produce a request window.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(Rule1Error::ConfigError(format!(
                "lookback_days must be between 1 and {}, got {}",
                MAX_LOOKBACK_DAYS, self.lookback_days
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
