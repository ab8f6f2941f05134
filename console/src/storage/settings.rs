//! Settings file management

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::deploy::StrategyKind;
use crate::errors::{ConsoleError, ConsoleResult};
use crate::logs::LogLevel;

/// Default location of the settings file
pub const DEFAULT_SETTINGS_PATH: &str = "/etc/deployhub/settings.json";

/// Console settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON logs on stdout
    #[serde(default)]
    pub log_json: bool,

    /// Also write logs to daily files in this directory
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// HTTP / WebSocket server
    #[serde(default)]
    pub server: ServerSettings,

    /// Which deployment driver runs deploy requests
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Domain under which simulated deployments are published
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Simulated driver configuration
    #[serde(default)]
    pub simulated: SimulatedSettings,

    /// GitHub API configuration
    #[serde(default)]
    pub github: GitHubSettings,

    /// Vercel API configuration
    #[serde(default)]
    pub vercel: VercelSettings,
}

fn default_domain() -> String {
    "deployhub.app".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_dir: None,
            server: ServerSettings::default(),
            strategy: StrategyKind::default(),
            domain: default_domain(),
            simulated: SimulatedSettings::default(),
            github: GitHubSettings::default(),
            vercel: VercelSettings::default(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file
    pub async fn load(path: &Path) -> ConsoleResult<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            ConsoleError::ConfigError(format!("unable to read {}: {}", path.display(), e))
        })?;
        let settings: Self = serde_json::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the console cannot run with
    pub fn validate(&self) -> ConsoleResult<()> {
        let scale = self.simulated.time_scale;
        if !scale.is_finite() || !(0.0..=MAX_TIME_SCALE).contains(&scale) {
            return Err(ConsoleError::ConfigError(format!(
                "simulated.time_scale must be between 0 and {}, got {}",
                MAX_TIME_SCALE, scale
            )));
        }
        Ok(())
    }

    /// Read settings from `path`, falling back to defaults when the file does
    /// not exist
    pub async fn load_or_default(path: &Path) -> ConsoleResult<Self> {
        match tokio::fs::try_exists(path).await {
            Ok(true) => Self::load(path).await,
            _ => {
                warn!("No settings file at {}, using defaults", path.display());
                Ok(Self::default())
            }
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`. Credentials are only ever taken from
    /// here or from the settings file, never logged.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("DEPLOYHUB_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("DEPLOYHUB_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid DEPLOYHUB_PORT: {}", port),
            }
        }
        if let Some(strategy) = lookup("DEPLOYHUB_STRATEGY") {
            match strategy.parse() {
                Ok(strategy) => self.strategy = strategy,
                Err(e) => warn!("Ignoring DEPLOYHUB_STRATEGY: {}", e),
            }
        }
        if let Some(domain) = lookup("DEPLOYHUB_DOMAIN") {
            self.domain = domain;
        }
        if let Some(level) = lookup("DEPLOYHUB_LOG_LEVEL") {
            match level.parse() {
                Ok(level) => self.log_level = level,
                Err(e) => warn!("Ignoring DEPLOYHUB_LOG_LEVEL: {}", e),
            }
        }
        if let Some(token) = lookup("GITHUB_TOKEN").filter(|t| !t.is_empty()) {
            self.github.token = Some(SecretString::from(token));
        }
        if let Some(token) = lookup("VERCEL_TOKEN").filter(|t| !t.is_empty()) {
            self.vercel.token = Some(SecretString::from(token));
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Largest accepted `simulated.time_scale`
pub const MAX_TIME_SCALE: f64 = 100.0;

/// Simulated driver settings
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatedSettings {
    /// Multiplier applied to every narrated step delay; 0 disables delays
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
}

fn default_time_scale() -> f64 {
    1.0
}

impl Default for SimulatedSettings {
    fn default() -> Self {
        Self {
            time_scale: default_time_scale(),
        }
    }
}

/// GitHub API settings
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubSettings {
    #[serde(default = "default_github_url")]
    pub api_base_url: String,

    /// Access token of the connected account
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub token: Option<SecretString>,
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_github_url(),
            token: None,
        }
    }
}

/// Vercel API settings
#[derive(Debug, Clone, Deserialize)]
pub struct VercelSettings {
    #[serde(default = "default_vercel_url")]
    pub api_base_url: String,

    #[serde(default, deserialize_with = "deserialize_secret")]
    pub token: Option<SecretString>,

    /// Seconds between two status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Polls before the build is declared timed out
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
}

fn default_vercel_url() -> String {
    "https://api.vercel.com".to_string()
}

fn default_poll_interval() -> u64 {
    3
}

fn default_max_poll_attempts() -> u32 {
    60
}

impl Default for VercelSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_vercel_url(),
            token: None,
            poll_interval_secs: default_poll_interval(),
            max_poll_attempts: default_max_poll_attempts(),
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()).map(SecretString::from))
}
