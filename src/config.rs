use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Per-user budget of positive vote points.
pub const DEFAULT_VOTE_ALLOWANCE: u32 = 6;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub live: LiveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_vote_allowance")]
    pub vote_allowance: u32,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("movienight-client/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_vote_allowance() -> u32 {
    DEFAULT_VOTE_ALLOWANCE
}

fn default_true() -> bool {
    true
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_refresh_interval_secs() -> u64 {
    300
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            vote_allowance: DEFAULT_VOTE_ALLOWANCE,
            email: None,
            password: None,
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reconnect_delay_secs: default_reconnect_delay_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl LiveConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs.max(1))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

impl Config {
    /// Loads `CONFIG_PATH` (default `config.toml`). A missing file is not an
    /// error: defaults are used. Environment variables always win.
    pub fn from_toml() -> AppResult<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::from_toml_str(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No config file at {config_path}, using defaults and environment");
                Config::default()
            }
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "Unable to read config file {config_path}: {e}"
                )));
            }
        };

        config.apply_overrides(|name| env::var(name).ok());
        config.normalize()?;
        Ok(config)
    }

    pub fn from_toml_str(config_str: &str) -> AppResult<Self> {
        Ok(toml::from_str(config_str)?)
    }

    /// Applies `MOVIENIGHT_*` overrides from `lookup`; unparsable numbers are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MOVIENIGHT_BASE_URL") {
            self.api.base_url = v;
        }
        if let Some(v) = lookup("MOVIENIGHT_TIMEOUT_SECS")
            && let Ok(n) = v.parse()
        {
            self.api.timeout_secs = n;
        }
        if let Some(v) = lookup("MOVIENIGHT_USER_AGENT") {
            self.api.user_agent = v;
        }
        if let Some(v) = lookup("MOVIENIGHT_VOTE_ALLOWANCE")
            && let Ok(n) = v.parse()
        {
            self.session.vote_allowance = n;
        }
        if let Some(v) = lookup("MOVIENIGHT_EMAIL") {
            self.session.email = Some(v);
        }
        if let Some(v) = lookup("MOVIENIGHT_PASSWORD") {
            self.session.password = Some(v);
        }
        if let Some(v) = lookup("MOVIENIGHT_LIVE_ENABLED")
            && let Ok(b) = v.parse()
        {
            self.live.enabled = b;
        }
        if let Some(v) = lookup("MOVIENIGHT_RECONNECT_DELAY_SECS")
            && let Ok(n) = v.parse()
        {
            self.live.reconnect_delay_secs = n;
        }
        if let Some(v) = lookup("MOVIENIGHT_REFRESH_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            self.live.refresh_interval_secs = n;
        }
    }

    /// Relative API paths are joined onto the base URL, which therefore must end with `/`.
    pub fn normalize(&mut self) -> AppResult<()> {
        let base = self.api.base_url.trim();
        if base.is_empty() {
            return Err(AppError::ConfigError("api.base_url must not be empty".into()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(AppError::ConfigError(format!(
                "api.base_url must be an http(s) URL, got {base}"
            )));
        }
        self.api.base_url = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        Ok(())
    }

    /// Both email and password must be set for an automatic login.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.session.email, &self.session.password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email.as_str(), password.as_str()))
            }
            _ => None,
        }
    }
}
