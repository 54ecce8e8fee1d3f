use std::time::Duration;

use thiserror::Error;

use crate::api::followiz::DEFAULT_FOLLOWIZ_API_URL;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE_PATH: &str = "orders.db";
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_FALLBACK_TARGET_LINK: &str = "https://instagram.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    /// Followiz service used when creating orders from the SellApp webhook.
    pub service_id: Option<String>,
    pub timeout: Duration,
    /// Target link used when a paid order carries none.
    pub fallback_link: String,
}

impl ProviderConfig {
    /// Whether paid webhooks should create Followiz orders on their own.
    pub fn auto_create_enabled(&self) -> bool {
        self.api_key.is_some() && self.service_id.is_some()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_FOLLOWIZ_API_URL.to_string(),
            api_key: None,
            service_id: None,
            timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            fallback_link: DEFAULT_FALLBACK_TARGET_LINK.to_string(),
        }
    }
}

/// Process configuration, built once at startup and shared through the app state.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
}

/// Reads configuration from the process environment.
pub fn load() -> Result<AppConfig, ConfigError> {
    AppConfig::from_lookup(|name| std::env::var(name).ok())
}

impl AppConfig {
    /// Builds the configuration from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match get("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                expected: "port number",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match get("FOLLOWIZ_TIMEOUT_SECS") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "FOLLOWIZ_TIMEOUT_SECS",
                expected: "number of seconds",
                value,
            })?,
            None => DEFAULT_PROVIDER_TIMEOUT_SECS,
        };

        Ok(Self {
            server: ServerConfig {
                host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port,
            },
            database: DatabaseConfig {
                path: get("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            },
            provider: ProviderConfig {
                api_url: get("FOLLOWIZ_API_URL")
                    .unwrap_or_else(|| DEFAULT_FOLLOWIZ_API_URL.to_string()),
                api_key: get("FOLLOWIZ_API_KEY"),
                service_id: get("FOLLOWIZ_SERVICE_ID"),
                timeout: Duration::from_secs(timeout_secs),
                fallback_link: get("FALLBACK_TARGET_LINK")
                    .unwrap_or_else(|| DEFAULT_FALLBACK_TARGET_LINK.to_string()),
            },
        })
    }
}
