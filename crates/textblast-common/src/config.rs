//! Configuration for TextBlast

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Bulk sending configuration
    #[serde(default)]
    pub sending: SendingConfig,

    /// Transport configuration
    #[serde(default)]
    pub transport: TransportConfig,

    /// Background worker configuration
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Bulk sending configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendingConfig {
    /// Dispatch mode: "batched" or "sequential"
    #[serde(default = "default_dispatch_mode")]
    pub mode: String,

    /// Number of recipients per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches in milliseconds
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Pause between messages in sequential mode, milliseconds
    #[serde(default = "default_message_delay_ms")]
    pub message_delay_ms: u64,
}

impl Default for SendingConfig {
    fn default() -> Self {
        Self {
            mode: default_dispatch_mode(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            message_delay_ms: default_message_delay_ms(),
        }
    }
}

fn default_dispatch_mode() -> String {
    "batched".to_string()
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_delay_ms() -> u64 {
    2000
}

fn default_message_delay_ms() -> u64 {
    1000
}

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Transport backend: "simulated" or "http"
    #[serde(default = "default_transport_backend")]
    pub backend: String,

    /// Simulated failure rate, 0.0 to 1.0
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,

    /// Minimum simulated latency in milliseconds
    #[serde(default = "default_min_latency_ms")]
    pub min_latency_ms: u64,

    /// Maximum simulated latency in milliseconds
    #[serde(default = "default_max_latency_ms")]
    pub max_latency_ms: u64,

    /// Gateway URL (for the http backend)
    pub gateway_url: Option<String>,

    /// Gateway API key (for the http backend)
    pub gateway_api_key: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            backend: default_transport_backend(),
            failure_rate: default_failure_rate(),
            min_latency_ms: default_min_latency_ms(),
            max_latency_ms: default_max_latency_ms(),
            gateway_url: None,
            gateway_api_key: None,
        }
    }
}

fn default_transport_backend() -> String {
    "simulated".to_string()
}

fn default_failure_rate() -> f64 {
    0.05
}

fn default_min_latency_ms() -> u64 {
    100
}

fn default_max_latency_ms() -> u64 {
    500
}

/// Background worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Interval between processing cycles, seconds
    ///
    /// Must stay well under one hour, the finest follow-up delay unit,
    /// so due follow-ups do not drift.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Run the per-campaign reply sweep on each cycle
    #[serde(default = "default_reply_sweep")]
    pub reply_sweep: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            reply_sweep: default_reply_sweep(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_reply_sweep() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from the default locations
    pub fn load() -> crate::Result<Self> {
        let paths = [
            std::path::PathBuf::from("./textblast.toml"),
            std::path::PathBuf::from("./config.toml"),
            std::path::PathBuf::from("/etc/textblast/config.toml"),
        ];

        for path in paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(crate::Error::Config(
            "No configuration file found".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let sending = SendingConfig::default();
        assert_eq!(sending.mode, "batched");
        assert_eq!(sending.batch_size, 10);

        let transport = TransportConfig::default();
        assert_eq!(transport.backend, "simulated");
        assert!(transport.failure_rate > 0.0 && transport.failure_rate < 1.0);

        let worker = WorkerConfig::default();
        assert!(worker.poll_interval_secs < 3600);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[sending]
mode = "sequential"
batch_size = 25
message_delay_ms = 500

[transport]
backend = "http"
gateway_url = "https://gateway.example.com/send"

[worker]
poll_interval_secs = 30
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.sending.mode, "sequential");
        assert_eq!(config.sending.batch_size, 25);
        assert_eq!(config.transport.backend, "http");
        assert_eq!(
            config.transport.gateway_url.as_deref(),
            Some("https://gateway.example.com/send")
        );
        assert_eq!(config.worker.poll_interval_secs, 30);
    }

    #[test]
    fn test_unknown_sections_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.sending.batch_size, 10);
        assert_eq!(config.logging.level, "info");
    }
}
