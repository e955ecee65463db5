use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub output: OutputConfig,
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub websocket: ClientConfig,
}

/// Settings for the websocket output, shared read-only by every worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Number of independent connection/publisher instances
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Max number of events handed to a single worker at once
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Max number of retries for a single batch, -1 retries forever
    #[serde(default = "default_retry_limit")]
    pub retry_limit: i64,

    #[serde(default = "default_schema")]
    pub schema: String,

    /// host:port of the remote endpoint
    pub addr: String,

    #[serde(default = "default_path")]
    pub path: String,

    /// Seconds between keepalive pings, 0 disables keepalive
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,

    /// Messages of this length or longer are dropped
    #[serde(default = "default_max_len")]
    pub max_len: usize,
}

fn default_workers() -> usize {
    1
}

fn default_batch_size() -> usize {
    2048
}

fn default_retry_limit() -> i64 {
    3
}

fn default_schema() -> String {
    "ws".to_string()
}

fn default_path() -> String {
    "/".to_string()
}

/// Longest accepted keepalive period, one day.
pub const MAX_PING_INTERVAL_SECS: u64 = 24 * 60 * 60;

fn default_ping_interval() -> u64 {
    30
}

fn default_max_len() -> usize {
    1024 * 1024
}

impl ClientConfig {
    /// Config pointing at `addr` with every other option at its default.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            workers: default_workers(),
            batch_size: default_batch_size(),
            retry_limit: default_retry_limit(),
            schema: default_schema(),
            addr: addr.into(),
            path: default_path(),
            ping_interval: default_ping_interval(),
            max_len: default_max_len(),
        }
    }

    /// Full websocket URL built from schema, addr and path.
    ///
    /// A path without a leading slash gets one, so `path: ws` and
    /// `path: /ws` address the same endpoint.
    pub fn target_url(&self) -> String {
        let path = if self.path.starts_with('/') || self.path.is_empty() {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        format!("{}://{}{}", self.schema, self.addr, path)
    }

    pub fn ping_interval(&self) -> Option<Duration> {
        match self.ping_interval {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn retry_budget(&self) -> RetryBudget {
        if self.retry_limit < 0 {
            RetryBudget::Unlimited
        } else {
            RetryBudget::Limited(self.retry_limit as u64)
        }
    }
}

/// How many times the pipeline resubmits the unsent part of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryBudget {
    Unlimited,
    Limited(u64),
}

impl RetryBudget {
    /// Whether another retry is allowed after `retries` have already happened.
    pub fn allows(&self, retries: u64) -> bool {
        match self {
            RetryBudget::Unlimited => true,
            RetryBudget::Limited(limit) => retries < *limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// NDJSON event file, stdin when absent
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// How long a partially filled batch waits for more events
    #[serde(default = "default_flush_interval", with = "duration_format")]
    pub flush_interval: Duration,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: None,
            flush_interval: default_flush_interval(),
        }
    }
}

fn default_flush_interval() -> Duration {
    Duration::from_secs(1)
}

// Custom serde module for duration parsing
mod duration_format {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty duration string".to_string());
        }

        let (value_str, unit) = if let Some(v) = s.strip_suffix("ms") {
            (v, "ms")
        } else if let Some(v) = s.strip_suffix('s') {
            (v, "s")
        } else if let Some(v) = s.strip_suffix('m') {
            (v, "m")
        } else {
            return Err(format!("invalid duration format: {}", s));
        };

        let value: u64 = value_str
            .parse()
            .map_err(|_| format!("invalid numeric value: {}", value_str))?;

        let duration = match unit {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            _ => {
                let secs = value
                    .checked_mul(60)
                    .ok_or_else(|| format!("duration out of range: {}", s))?;
                Duration::from_secs(secs)
            }
        };

        Ok(duration)
    }

    fn format_duration(d: Duration) -> String {
        let millis = d.as_millis();
        if millis % 60_000 == 0 && millis > 0 {
            format!("{}m", millis / 60_000)
        } else if millis % 1000 == 0 && millis > 0 {
            format!("{}s", millis / 1000)
        } else {
            format!("{}ms", millis)
        }
    }
}
