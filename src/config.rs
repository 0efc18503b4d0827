//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub csrf: CsrfConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Notification endpoints on the site
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Site origin the endpoint paths are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_count_url")]
    pub count_url: String,

    #[serde(default = "default_list_url")]
    pub list_url: String,

    /// Prefix of the per-item toggle endpoint; the item key is appended
    #[serde(default = "default_toggle_url")]
    pub toggle_url: String,

    #[serde(default = "default_mark_all_url")]
    pub mark_all_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_count_url() -> String {
    "/notifications/api/unread_count/".to_string()
}

fn default_list_url() -> String {
    "/notifications/api/list/".to_string()
}

fn default_toggle_url() -> String {
    "/notifications/mark-toggle".to_string()
}

fn default_mark_all_url() -> String {
    "/notifications/mark-all-as-read/".to_string()
}

fn default_request_timeout() -> u64 {
    10_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            count_url: default_count_url(),
            list_url: default_list_url(),
            toggle_url: default_toggle_url(),
            mark_all_url: default_mark_all_url(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

/// Polling behaviour of a widget instance
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollConfig {
    /// Delay between the end of one count fetch and the start of the next
    #[serde(default = "default_refresh_period")]
    pub refresh_period_ms: u64,

    /// Maximum number of items requested per list page
    #[serde(default = "default_max_items")]
    pub max_items: u32,

    /// Consecutive failures before the widget gives up
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Ask the server to mark the listed items as read when the panel opens
    #[serde(default = "default_mark_as_read_on_open")]
    pub mark_as_read_on_open: bool,
}

fn default_refresh_period() -> u64 {
    60_000 // 1 minute
}

fn default_max_items() -> u32 {
    5
}

fn default_failure_threshold() -> u32 {
    10
}

fn default_mark_as_read_on_open() -> bool {
    true
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            refresh_period_ms: default_refresh_period(),
            max_items: default_max_items(),
            failure_threshold: default_failure_threshold(),
            mark_as_read_on_open: default_mark_as_read_on_open(),
        }
    }
}

impl PollConfig {
    pub fn refresh_period(&self) -> Duration {
        Duration::from_millis(self.refresh_period_ms)
    }
}

/// CSRF token source and header
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CsrfConfig {
    #[serde(default = "default_csrf_header")]
    pub header_name: String,

    #[serde(default = "default_csrf_cookie")]
    pub cookie_name: String,

    /// Token embedded in the page; takes precedence over the cookie
    #[serde(default)]
    pub token: Option<String>,

    /// Raw `Cookie` header of the session (`csrftoken=...; sessionid=...`)
    #[serde(default)]
    pub cookie: Option<String>,
}

fn default_csrf_header() -> String {
    "X-CSRFToken".to_string()
}

fn default_csrf_cookie() -> String {
    "csrftoken".to_string()
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            header_name: default_csrf_header(),
            cookie_name: default_csrf_cookie(),
            token: None,
            cookie: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only.
    ///
    /// Falls back to the defaults when the overrides do not validate.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::warn!("Ignoring environment overrides: {}", e);
                Config::default()
            }
        }
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("live-notify").join("config.toml")),
            Some(PathBuf::from("./live-notify.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Reject settings the widget cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.refresh_period_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll.refresh_period_ms must be greater than zero".to_string(),
            ));
        }
        if self.poll.max_items == 0 {
            return Err(ConfigError::Invalid(
                "poll.max_items must be greater than zero".to_string(),
            ));
        }
        if self.poll.failure_threshold == 0 {
            return Err(ConfigError::Invalid(
                "poll.failure_threshold must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(url) = std::env::var("LIVE_NOTIFY_BASE_URL") {
            self.server.base_url = url;
        }

        // Poll overrides
        if let Ok(period) = std::env::var("LIVE_NOTIFY_REFRESH_MS") {
            if let Ok(p) = period.parse() {
                self.poll.refresh_period_ms = p;
            }
        }
        if let Ok(max) = std::env::var("LIVE_NOTIFY_MAX_ITEMS") {
            if let Ok(m) = max.parse() {
                self.poll.max_items = m;
            }
        }

        // Session overrides
        if let Ok(cookie) = std::env::var("LIVE_NOTIFY_COOKIE") {
            self.csrf.cookie = Some(cookie);
        }
        if let Ok(token) = std::env::var("LIVE_NOTIFY_CSRF_TOKEN") {
            self.csrf.token = Some(token);
        }

        // Logging overrides
        if let Ok(level) = std::env::var("LIVE_NOTIFY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LIVE_NOTIFY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# live-notify Configuration
#
# Environment variables override these settings:
# - LIVE_NOTIFY_BASE_URL
# - LIVE_NOTIFY_REFRESH_MS
# - LIVE_NOTIFY_MAX_ITEMS
# - LIVE_NOTIFY_COOKIE
# - LIVE_NOTIFY_CSRF_TOKEN
# - LIVE_NOTIFY_LOG_LEVEL
# - LIVE_NOTIFY_LOG_FORMAT

[server]
# Site origin; endpoint paths below are resolved against it
base_url = "http://localhost:8000"

count_url = "/notifications/api/unread_count/"
list_url = "/notifications/api/list/"

# The notification key and a trailing slash are appended
toggle_url = "/notifications/mark-toggle"
mark_all_url = "/notifications/mark-all-as-read/"

# Request timeout (ms)
request_timeout_ms = 10000

[poll]
# Delay between badge refreshes (ms)
refresh_period_ms = 60000

# Items per list page
max_items = 5

# Consecutive failures before showing "connection lost"
failure_threshold = 10

# Mark listed notifications as read when the panel opens
mark_as_read_on_open = true

[csrf]
header_name = "X-CSRFToken"
cookie_name = "csrftoken"

# Session cookie, also used to read the CSRF token
# cookie = "csrftoken=...; sessionid=..."

# Token embedded in the page (overrides the cookie value)
# token = "..."

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
