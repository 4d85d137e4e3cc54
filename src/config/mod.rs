//! Configuration management
//!
//! YAML-based configuration with support for:
//! - Environment variable overrides
//! - Multiple configuration file locations
//! - Default values for all settings

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: None,
        }
    }
}

/// Document store connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub base_url: String,
    /// Timeout in seconds (supports both timeout_secs and timeout field names)
    #[serde(default = "default_timeout", alias = "timeout")]
    pub timeout_secs: u64,
    /// Bearer token for the store API (optional)
    #[serde(default)]
    pub api_token: Option<String>,
    /// Maximum ids per profile multi-get round trip
    #[serde(default = "default_profile_batch_limit")]
    pub profile_batch_limit: usize,
}

fn default_timeout() -> u64 {
    30
}

fn default_profile_batch_limit() -> usize {
    10
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Log output target (console or file)
    #[serde(default = "default_log_target")]
    pub target: LogTarget,
    /// Directory for log files (used when target is "file")
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Log file name prefix
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,
    /// Enable daily log rotation
    #[serde(default = "default_log_rotation")]
    pub daily_rotation: bool,
}

/// Log output target
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Log to console (stdout/stderr) - default for development
    #[default]
    Console,
    /// Log to file with optional rotation - recommended for production
    File,
    /// Log to both console and file
    Both,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_log_target() -> LogTarget {
    LogTarget::Console
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/var/log/peak-impact/reports")
}

fn default_log_prefix() -> String {
    "peak-impact-reports".to_string()
}

fn default_log_rotation() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            target: default_log_target(),
            log_dir: default_log_dir(),
            log_prefix: default_log_prefix(),
            daily_rotation: default_log_rotation(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig {
                base_url: "http://localhost:8080".to_string(),
                timeout_secs: default_timeout(),
                api_token: None,
                profile_batch_limit: default_profile_batch_limit(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values
    /// 2. Configuration file (YAML)
    /// 3. Environment variables (prefixed with PEAK_IMPACT_)
    pub fn load() -> Result<Self> {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        // Check for config path override from environment
        let config_path = std::env::var("PEAK_IMPACT_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or_else(Self::find_config_file);

        let mut config = if let Some(ref path) = config_path {
            if path.exists() {
                eprintln!("[CONFIG] Loading configuration from: {:?}", path);
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                serde_norway::from_str(&contents)
                    .with_context(|| format!("Failed to parse config file: {:?}", path))?
            } else {
                eprintln!(
                    "[CONFIG] Config file path exists but file not found: {:?}",
                    path
                );
                AppConfig::default()
            }
        } else {
            eprintln!("[CONFIG] No config file found, using defaults");
            AppConfig::default()
        };

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            // Current directory
            PathBuf::from("config.yaml"),
            PathBuf::from("config/config.yaml"),
            // System config directory
            PathBuf::from("/etc/peak-impact-reports/config.yaml"),
        ];

        paths.into_iter().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(host) = std::env::var("PEAK_IMPACT_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PEAK_IMPACT_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        // Store overrides
        if let Ok(url) = std::env::var("PEAK_IMPACT_STORE_URL") {
            self.store.base_url = url;
        }
        if let Ok(token) = std::env::var("PEAK_IMPACT_STORE_TOKEN") {
            self.store.api_token = Some(token);
        }
        if let Ok(timeout) = std::env::var("PEAK_IMPACT_STORE_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.store.timeout_secs = t;
            }
        }
        if let Ok(limit) = std::env::var("PEAK_IMPACT_PROFILE_BATCH_LIMIT") {
            if let Ok(n) = limit.parse() {
                self.store.profile_batch_limit = n;
            }
        }

        // Logging overrides
        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("PEAK_IMPACT_LOG_FORMAT") {
            self.logging.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "compact" => LogFormat::Compact,
                _ => LogFormat::Pretty,
            };
        }
        if let Ok(target) = std::env::var("PEAK_IMPACT_LOG_TARGET") {
            self.logging.target = match target.to_lowercase().as_str() {
                "file" => LogTarget::File,
                "both" => LogTarget::Both,
                _ => LogTarget::Console,
            };
        }
        if let Ok(dir) = std::env::var("PEAK_IMPACT_LOG_DIR") {
            self.logging.log_dir = PathBuf::from(dir);
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.store.base_url.is_empty() {
            bail!("store.base_url must not be empty");
        }
        if !self.store.base_url.starts_with("http://") && !self.store.base_url.starts_with("https://")
        {
            bail!(
                "store.base_url must be an http(s) URL, got: {}",
                self.store.base_url
            );
        }
        if self.store.timeout_secs == 0 {
            bail!("store.timeout_secs must be greater than zero");
        }
        if self.store.profile_batch_limit == 0 {
            bail!("store.profile_batch_limit must be greater than zero");
        }
        Ok(())
    }
}
