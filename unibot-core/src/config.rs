use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UnibotConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub tui: TuiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,

    #[serde(default)]
    pub file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Where the session token and last account are kept. Empty means the
    /// platform data directory.
    #[serde(default)]
    pub state_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CredentialsConfig {
    /// Command that receives `username=`/`password=` lines on stdin after a
    /// successful start. Empty disables the credential hand-off.
    #[serde(default)]
    pub helper: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuiConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,

    #[serde(default = "default_follow_threshold_rows")]
    pub follow_threshold_rows: usize,

    #[serde(default = "default_true")]
    pub mouse_enabled: bool,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    2000
}

fn default_poll_interval() -> u64 {
    1500
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_rate() -> u64 {
    100
}

fn default_follow_threshold_rows() -> usize {
    2
}

fn default_true() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            connect_timeout_ms: default_connect_timeout(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: String::new(),
        }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
            follow_threshold_rows: default_follow_threshold_rows(),
            mouse_enabled: true,
        }
    }
}

impl UnibotConfig {
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from_paths(get_config_paths())
    }

    pub fn load_from_paths(paths: Vec<PathBuf>) -> Result<Self, ConfigLoadError> {
        load_dotenv_files();

        let mut builder = ConfigBuilder::builder();

        for path in paths {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("UNIBOT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut unibot_config: UnibotConfig = config.try_deserialize()?;

        // VITE_API_URL keeps deployments of the web front end working unchanged.
        if let Ok(url) = std::env::var("UNIBOT_API_URL") {
            unibot_config.api.base_url = url;
        } else if let Ok(url) = std::env::var("VITE_API_URL") {
            unibot_config.api.base_url = url;
        }

        if let Ok(level) = std::env::var("UNIBOT_LOG_LEVEL") {
            unibot_config.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            unibot_config.logging.level = level;
        }

        unibot_config.api.base_url = normalize_base_url(&unibot_config.api.base_url);
        unibot_config.validate()?;

        Ok(unibot_config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigLoadError::MissingRequired("api.base_url".to_string()));
        }

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(ConfigLoadError::InvalidValue {
                key: "api.base_url".to_string(),
                message: "Must start with http:// or https://".to_string(),
            });
        }

        if self.poller.interval_ms == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "poller.interval_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "api.timeout_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        let level_lower = self.logging.level.to_lowercase();
        if !valid_levels.contains(&level_lower.as_str()) && !level_lower.contains('=') {
            return Err(ConfigLoadError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Must be one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poller.interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.api.connect_timeout_ms)
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }

    /// Resolved location of the session state file.
    pub fn state_file_path(&self) -> Option<PathBuf> {
        if self.storage.state_file.trim().is_empty() {
            get_data_dir().map(|d| d.join("state.json"))
        } else {
            Some(PathBuf::from(self.storage.state_file.trim()))
        }
    }

    pub fn credential_helper(&self) -> Option<&str> {
        let helper = self.credentials.helper.trim();
        (!helper.is_empty()).then_some(helper)
    }
}

/// Trim whitespace and trailing slashes so paths can be appended directly.
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config").join("default.toml"));
        paths.push(cwd.join("config").join("local.toml"));
        paths.push(cwd.join("unibot.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("unibot").join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".unibot").join("config.toml"));
    }

    paths
}

fn load_dotenv_files() {
    for path in get_dotenv_paths() {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

fn get_dotenv_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".env"));
        paths.push(cwd.join(".env.local"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".unibot").join(".env"));
    }

    paths
}

pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("unibot"))
}

pub fn get_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("unibot"))
}

pub fn get_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("unibot"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = UnibotConfig::default();

        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.poller.interval_ms, 1500);
        assert_eq!(config.poll_interval(), Duration::from_millis(1500));
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert_eq!(config.tui.follow_threshold_rows, 2);
        assert!(config.tui.mouse_enabled);
        assert!(config.credential_helper().is_none());
    }

    #[test]
    fn test_validation_valid_config() {
        let config = UnibotConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_empty_base_url() {
        let mut config = UnibotConfig::default();
        config.api.base_url = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigLoadError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_validation_invalid_scheme() {
        let mut config = UnibotConfig::default();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_interval() {
        let mut config = UnibotConfig::default();
        config.poller.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_log_levels() {
        let mut config = UnibotConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "unibot_core=debug,reqwest=warn".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("  https://bot.example.kz/// "),
            "https://bot.example.kz"
        );
        assert_eq!(normalize_base_url("http://localhost:8000"), "http://localhost:8000");
    }

    #[test]
    fn test_state_file_override() {
        let mut config = UnibotConfig::default();
        config.storage.state_file = "/tmp/unibot-state.json".to_string();
        assert_eq!(
            config.state_file_path(),
            Some(PathBuf::from("/tmp/unibot-state.json"))
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unibot.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[poller]\ninterval_ms = 750\n\n[tui]\nfollow_threshold_rows = 4").unwrap();

        let config = UnibotConfig::load_from_paths(vec![path]).unwrap();
        assert_eq!(config.poller.interval_ms, 750);
        assert_eq!(config.tui.follow_threshold_rows, 4);
        assert_eq!(config.api.timeout_secs, 10);
    }
}
