//! Startup configuration loaded once from the environment.
//!
//! Every value here is required: a missing or unusable entry is a fatal
//! startup condition, never a runtime fallback.

use std::{env, path::PathBuf};

use thiserror::Error;

/// Environment variable holding the listen port.
const PORT_ENV: &str = "PORT";
/// Environment variable holding the TLS certificate chain path.
const TLS_CERT_ENV: &str = "TLS_CERT_PATH";
/// Environment variable holding the TLS private key path.
const TLS_KEY_ENV: &str = "TLS_KEY_PATH";

/// Errors raised while assembling the startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was absent or empty.
    #[error("missing required environment variable `{0}`")]
    Missing(&'static str),
    /// The port value could not be parsed.
    #[error("`{name}` is not a valid port number: `{value}`")]
    InvalidPort { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Port the HTTPS listener binds to.
    pub port: u16,
    /// Path to the PEM certificate chain presented to clients.
    pub tls_cert_path: PathBuf,
    /// Path to the PEM private key matching the certificate.
    pub tls_key_path: PathBuf,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_raw = require(PORT_ENV)?;
        let port = port_raw.parse().map_err(|_| ConfigError::InvalidPort {
            name: PORT_ENV,
            value: port_raw,
        })?;

        Ok(Self {
            port,
            tls_cert_path: require(TLS_CERT_ENV)?.into(),
            tls_key_path: require(TLS_KEY_ENV)?.into(),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}
