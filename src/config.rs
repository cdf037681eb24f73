//! Configuration from environment variables
//!
//! All configuration is loaded once at startup, a `.env` file is picked up
//! for local development.

use std::net::SocketAddr;

use thiserror::Error;

use crate::utils::env_var_or_default;
use crate::utils::env_var_or_else;

const DEFAULT_ADDRESS: &str = "0.0.0.0:6000";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds a value that can not be parsed
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(&'static str, String),
}

/// Everything the app needs from the environment
#[derive(Clone, Debug)]
pub struct Config {
    /// Address to listen on, `ADDRESS` with an optional `PORT` override
    pub address: SocketAddr,

    /// VAPID private key, base64 (url-safe, no padding)
    pub vapid_private_key: String,

    /// VAPID public key, served to clients as-is
    pub vapid_public_key: String,

    /// VAPID claim subject, e.g. `mailto:someone@example.com`
    pub vapid_subject: String,

    /// Shared secret for the external scheduler hitting `/api/ping`
    pub ping_token: String,

    /// Bearer secret for the test notification endpoint
    pub admin_token: String,

    /// Hosts allowed in the `Host` header, empty allows all
    pub allowed_hosts: Vec<String>,

    /// Lower the default log filter to debug
    pub debug: bool,
}

impl Config {
    /// Load the configuration from environment variables
    ///
    /// The token and VAPID variables may be absent, the endpoints depending
    /// on them refuse to do anything useful until they are set.
    ///
    /// # Errors
    ///
    /// Will return `Err` when `ADDRESS` or `PORT` can not be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        let address = setup_address()?;

        let allowed_hosts = env_var_or_default("ALLOWED_HOSTS")
            .split(',')
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .map(ToString::to_string)
            .collect();

        let debug = matches!(
            env_var_or_default("DEBUG").to_lowercase().as_str(),
            "1" | "true" | "yes"
        );

        Ok(Self {
            address,
            vapid_private_key: env_var_or_default("VAPID_PRIVATE_KEY"),
            vapid_public_key: env_var_or_default("VAPID_PUBLIC_KEY"),
            vapid_subject: env_var_or_default("VAPID_SUBJECT"),
            ping_token: env_var_or_default("PING_TOKEN"),
            admin_token: env_var_or_default("ADMIN_TOKEN"),
            allowed_hosts,
            debug,
        })
    }
}

fn setup_address() -> Result<SocketAddr, ConfigError> {
    let mut address = env_var_or_else("ADDRESS", || String::from(DEFAULT_ADDRESS))
        .parse::<SocketAddr>()
        .map_err(|err| ConfigError::InvalidValue("ADDRESS", err.to_string()))?;

    // optional override of just the port
    if let Ok(port) = std::env::var("PORT") {
        // only check non-empty strings
        if !port.is_empty() {
            let port = port
                .parse::<u16>()
                .map_err(|err| ConfigError::InvalidValue("PORT", err.to_string()))?;

            address.set_port(port);
        }
    }

    Ok(address)
}
