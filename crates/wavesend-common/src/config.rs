//! Configuration for Wavesend

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Delivery provider configuration
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Worker loop tunables
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// API port
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (Postgres)
    pub url: String,

    /// Maximum connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

/// Delivery provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Provider send endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Fallback API key, used only when none is stored in settings
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    "https://www.wasenderapi.com/api/send-message".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Worker loop tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Poller tick interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Maximum messages promoted per poller tick
    #[serde(default = "default_poll_batch_size")]
    pub poll_batch_size: i64,

    /// Completion checker tick interval in seconds
    #[serde(default = "default_checker_interval")]
    pub checker_interval_secs: u64,

    /// Maximum delivery attempts per message
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,

    /// Base delay for exponential retry backoff, in seconds
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_secs: i64,

    /// Minimum spacing between consecutive sends, in seconds
    #[serde(default = "default_send_spacing")]
    pub send_spacing_secs: u64,

    /// Remaining-quota threshold below which the worker honors the
    /// provider's reset-after delay
    #[serde(default = "default_low_quota_threshold")]
    pub low_quota_threshold: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            poll_batch_size: default_poll_batch_size(),
            checker_interval_secs: default_checker_interval(),
            max_attempts: default_max_attempts(),
            retry_base_delay_secs: default_retry_base_delay(),
            send_spacing_secs: default_send_spacing(),
            low_quota_threshold: default_low_quota_threshold(),
        }
    }
}

fn default_poll_interval() -> u64 {
    60
}

fn default_poll_batch_size() -> i64 {
    50
}

fn default_checker_interval() -> u64 {
    120
}

fn default_max_attempts() -> i32 {
    3
}

fn default_retry_base_delay() -> i64 {
    60
}

fn default_send_spacing() -> u64 {
    5
}

fn default_low_quota_threshold() -> i64 {
    5
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

    /// Load configuration from default locations
    pub fn load() -> crate::Result<Self> {
        let paths = [
            std::path::PathBuf::from("./wavesend.toml"),
            std::path::PathBuf::from("./config.toml"),
            std::path::PathBuf::from("/etc/wavesend/config.toml"),
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
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_worker_config() {
        let worker = WorkerConfig::default();
        assert_eq!(worker.poll_interval_secs, 60);
        assert_eq!(worker.poll_batch_size, 50);
        assert_eq!(worker.checker_interval_secs, 120);
        assert_eq!(worker.max_attempts, 3);
        assert_eq!(worker.retry_base_delay_secs, 60);
        assert_eq!(worker.send_spacing_secs, 5);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
port = 9090

[database]
url = "postgres://localhost/wavesend"

[delivery]
endpoint = "https://provider.example/send"

[worker]
poll_interval_secs = 10
max_attempts = 5
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.database.url, "postgres://localhost/wavesend");
        assert_eq!(config.delivery.endpoint, "https://provider.example/send");
        assert_eq!(config.worker.poll_interval_secs, 10);
        assert_eq!(config.worker.max_attempts, 5);
        assert_eq!(config.worker.poll_batch_size, 50);
    }
}
