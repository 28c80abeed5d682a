use std::env;
use std::time::Duration;

pub const DEFAULT_INSTANCES_URL: &str = "https://instances.mastodon.xyz/list.json";
pub const DEFAULT_INFLUXDB_CONNECTION: &str = "http://localhost:8086";
pub const DEFAULT_INFLUXDB_DATABASE: &str = "mastidon";

/// Collection cadence. Not configurable.
pub const COLLECTION_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub instances_url: String,
    pub influxdb_connection: String,
    pub influxdb_database: String,
    pub fetch_timeout: Duration,
    pub retry: RetryPolicy,
}

/// Exponential backoff applied to the upstream fetch.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub wait_min: Duration,
    pub wait_max: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based): `wait_min * 2^attempt`, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.wait_min.saturating_mul(factor).min(self.wait_max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 4,
            wait_min: Duration::from_secs(1),
            wait_max: Duration::from_secs(30),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            instances_url: DEFAULT_INSTANCES_URL.to_string(),
            influxdb_connection: DEFAULT_INFLUXDB_CONNECTION.to_string(),
            influxdb_database: DEFAULT_INFLUXDB_DATABASE.to_string(),
            fetch_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            instances_url: non_empty_var("INSTANCES_URL").unwrap_or(defaults.instances_url),
            influxdb_connection: non_empty_var("INFLUXDB_CONNECTION")
                .unwrap_or(defaults.influxdb_connection),
            influxdb_database: non_empty_var("INFLUXDB_DATABASE")
                .unwrap_or(defaults.influxdb_database),
            fetch_timeout: env::var("FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
            retry: RetryPolicy {
                max_retries: env::var("FETCH_MAX_RETRIES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.retry.max_retries),
                ..defaults.retry
            },
        }
    }
}

// An empty INFLUXDB_CONNECTION means "unset", same as the other string vars.
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
