//! Application configuration options

use std::time::Duration;

use secrecy::SecretString;

use crate::deploy::provider::ProviderOptions;
use crate::deploy::StrategyKind;
use crate::storage::settings::Settings;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Server configuration
    pub server: ServerOptions,

    /// Strategy deploy requests run with
    pub strategy: StrategyKind,

    /// Domain simulated deployments are published under
    pub domain: String,

    /// Multiplier for narrated step delays
    pub time_scale: f64,

    pub github: ApiOptions,

    pub vercel: ApiOptions,

    /// Polling schedule of provider builds
    pub provider: ProviderOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for AppOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            strategy: settings.strategy,
            domain: settings.domain.clone(),
            time_scale: settings.simulated.time_scale,
            github: ApiOptions {
                base_url: settings.github.api_base_url.clone(),
                token: settings.github.token.clone(),
            },
            vercel: ApiOptions {
                base_url: settings.vercel.api_base_url.clone(),
                token: settings.vercel.token.clone(),
            },
            provider: ProviderOptions {
                poll_interval: Duration::from_secs(settings.vercel.poll_interval_secs),
                max_attempts: settings.vercel.max_poll_attempts,
            },
        }
    }
}

/// Lifecycle options for the console
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Outbound API endpoint and credentials
#[derive(Debug, Clone)]
pub struct ApiOptions {
    pub base_url: String,
    pub token: Option<SecretString>,
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}
