//! SDK configuration: endpoint paths, timeouts, and the TOML/env config layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::CommonInput;

/// Default identity service base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:9111";

/// Default SDK type reported to `/sdk-init`.
pub const DEFAULT_SDK_TYPE: &str = "backend";

/// Grant type sent with refresh requests unless the caller overrides it.
pub const REFRESH_GRANT_TYPE: &str = "refresh_token";

/// Default per-request bound on a refresh call.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(60);

/// Connect timeout for HTTP requests.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for HTTP requests.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// User agent for all HTTP requests.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Endpoint paths
// ---------------------------------------------------------------------------

pub const SDK_INIT_PATH: &str = "/sdk-init";
pub const SIGNIN_PATH: &str = "/auth/signin";
pub const SIGNOUT_PATH: &str = "/auth/signout";
pub const SIGNUP_PATH: &str = "/auth/signup";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const USER_PATH: &str = "/auth/user";
pub const ORGANIZATION_PATH: &str = "/organization";
pub const APPLICATION_PATH: &str = "/application";
pub const CHANGE_PASSWORD_PATH: &str = "/auth/change-password";
pub const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";
pub const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

// ---------------------------------------------------------------------------
// Environment override tracking
// ---------------------------------------------------------------------------

/// Tracks which configuration settings were overridden by environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    overrides: HashMap<String, String>,
}

impl EnvOverrides {
    /// Check whether a setting key (e.g. "refresh.timeout_secs") is overridden.
    pub fn is_overridden(&self, key: &str) -> bool {
        self.overrides.contains_key(key)
    }

    /// Get the env var name that overrides the given setting key.
    pub fn env_var_for(&self, key: &str) -> Option<&str> {
        self.overrides.get(key).map(String::as_str)
    }

    /// Get all overrides as a map of setting key -> env var name.
    pub fn all(&self) -> &HashMap<String, String> {
        &self.overrides
    }

    fn record(&mut self, key: &str, env_var: &str) {
        self.overrides.insert(key.to_string(), env_var.to_string());
    }
}

// ---------------------------------------------------------------------------
// Main configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccessConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_sdk_type")]
    pub sdk_type: String,
    #[serde(default)]
    pub credentials: CommonInput,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Env var overrides are not serialized to TOML.
    #[serde(skip)]
    pub env_overrides: EnvOverrides,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Refresh coordinator settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshConfig {
    /// Upper bound for one refresh call. `0` disables the bound.
    #[serde(default = "default_refresh_timeout_secs")]
    pub timeout_secs: u64,
    /// Lifetime of a cached refresh response. `0` keeps entries forever.
    #[serde(default)]
    pub cache_ttl_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_refresh_timeout_secs(),
            cache_ttl_secs: 0,
        }
    }
}

impl RefreshConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_sdk_type() -> String {
    DEFAULT_SDK_TYPE.to_string()
}
const fn default_connect_timeout_secs() -> u64 {
    CONNECT_TIMEOUT.as_secs()
}
const fn default_request_timeout_secs() -> u64 {
    REQUEST_TIMEOUT.as_secs()
}
fn default_user_agent() -> String {
    USER_AGENT.to_string()
}
const fn default_refresh_timeout_secs() -> u64 {
    DEFAULT_REFRESH_TIMEOUT.as_secs()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            sdk_type: default_sdk_type(),
            credentials: CommonInput::default(),
            http: HttpConfig::default(),
            refresh: RefreshConfig::default(),
            logging: LoggingConfig::default(),
            env_overrides: EnvOverrides::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading and env overrides
// ---------------------------------------------------------------------------

impl AccessConfig {
    /// Load configuration from a TOML file, then apply `ACCESS_*` environment
    /// overrides. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without env overrides or validation. A missing
    /// file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str::<AccessConfig>(&content)?)
    }

    /// Check that the configuration can be used to build a client.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("base_url must not be empty".into()));
        }
        let url = url::Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides using `lookup` to resolve env var names.
    ///
    /// Every supported setting has a corresponding `ACCESS_*` variable. When
    /// one resolves, its value replaces the file/default value and the
    /// setting key is recorded in `env_overrides`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut ov = EnvOverrides::default();

        macro_rules! env_str {
            ($key:expr, $env:expr, $field:expr) => {
                if let Some(val) = lookup($env) {
                    $field = val;
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_bool {
            ($key:expr, $env:expr, $field:expr) => {
                if let Some(val) = lookup($env) {
                    $field = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_parse {
            ($key:expr, $env:expr, $field:expr) => {
                if let Some(val) = lookup($env) {
                    if let Ok(parsed) = val.trim().parse() {
                        $field = parsed;
                        ov.record($key, $env);
                    }
                }
            };
        }

        env_str!("base_url", "ACCESS_BASE_URL", self.base_url);
        env_str!("sdk_type", "ACCESS_SDK_TYPE", self.sdk_type);

        // -- Credentials --
        env_str!("credentials.client_id", "ACCESS_CLIENT_ID", self.credentials.client_id);
        env_str!(
            "credentials.client_secret",
            "ACCESS_CLIENT_SECRET",
            self.credentials.client_secret
        );
        env_str!(
            "credentials.application_id",
            "ACCESS_APPLICATION_ID",
            self.credentials.application_id
        );
        env_str!(
            "credentials.organization_id",
            "ACCESS_ORGANIZATION_ID",
            self.credentials.organization_id
        );

        // -- HTTP --
        env_parse!(
            "http.connect_timeout_secs",
            "ACCESS_CONNECT_TIMEOUT_SECS",
            self.http.connect_timeout_secs
        );
        env_parse!(
            "http.request_timeout_secs",
            "ACCESS_REQUEST_TIMEOUT_SECS",
            self.http.request_timeout_secs
        );

        // -- Refresh --
        env_parse!(
            "refresh.timeout_secs",
            "ACCESS_REFRESH_TIMEOUT_SECS",
            self.refresh.timeout_secs
        );
        env_parse!(
            "refresh.cache_ttl_secs",
            "ACCESS_CACHE_TTL_SECS",
            self.refresh.cache_ttl_secs
        );

        // -- Logging --
        env_str!("logging.level", "ACCESS_LOG_LEVEL", self.logging.level);
        env_bool!("logging.json", "ACCESS_LOG_JSON", self.logging.json);

        self.env_overrides = ov;
    }
}
