//! Application configuration

use std::{env, str::FromStr, time::Duration};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    pub root_domain: String, // e.g., "example.com" for *.example.com tenants
    pub preview_host_suffix: String,
    pub exempt_path_prefixes: Vec<String>,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Identity directory
    pub identity_api_url: String,
    pub identity_secret_key: String,
    pub identity_request_timeout: Duration,
    pub directory_cache_ttl: Duration,

    // Authentication
    pub session_jwt_secret: String,

    // Logging
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            root_domain: env::var("ROOT_DOMAIN")
                .map(|d| d.trim().to_string())
                .ok()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| "localhost:3000".to_string()),
            preview_host_suffix: {
                let suffix = env::var("PREVIEW_HOST_SUFFIX")
                    .unwrap_or_else(|_| crate::routing::DEFAULT_PREVIEW_SUFFIX.to_string());
                if !suffix.starts_with('.') {
                    return Err(ConfigError::Invalid(
                        "PREVIEW_HOST_SUFFIX",
                        "must start with '.'",
                    ));
                }
                suffix
            },
            exempt_path_prefixes: env::var("TENANT_EXEMPT_PREFIXES")
                .map(|prefixes| {
                    prefixes
                        .split(',')
                        .map(str::trim)
                        .filter(|p| p.starts_with('/'))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),

            // Database
            database_url: required("DATABASE_URL")?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5)?,

            // Identity directory
            identity_api_url: required("IDENTITY_API_URL")?,
            identity_secret_key: required("IDENTITY_SECRET_KEY")?,
            identity_request_timeout: Duration::from_millis(parse_or(
                "IDENTITY_REQUEST_TIMEOUT_MS",
                10_000,
            )?),
            directory_cache_ttl: Duration::from_secs(parse_or("DIRECTORY_CACHE_TTL_SECS", 300)?),

            // Authentication
            session_jwt_secret: {
                let secret = required("SESSION_JWT_SECRET")?;
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "SESSION_JWT_SECRET must be at least 32 characters",
                    ));
                }
                secret
            },

            // Logging
            log_format: parse_or("LOG_FORMAT", LogFormat::Pretty)?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Parse an optional variable, failing on values that don't parse
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, "could not be parsed")),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
