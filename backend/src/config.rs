//! Server settings read from the environment.

use std::net::SocketAddr;

/// Default TCP port.
pub const DEFAULT_PORT: u16 = 5000;
/// Number of records returned by `/history` when no `limit` is given, and its cap.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
/// Largest accepted request body.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub history_limit: usize,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Read `HOST`, `PORT`, `HISTORY_LIMIT` and `MAX_BODY_BYTES`.
    ///
    /// Unset variables take their defaults; set but malformed ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = std::env::var("HOST")
            .ok()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(defaults.host);
        let port = parse_var("PORT", defaults.port)?;
        let history_limit = parse_var("HISTORY_LIMIT", defaults.history_limit)?;
        if history_limit == 0 {
            return Err(ConfigError::InvalidValue {
                name: "HISTORY_LIMIT",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let max_body_bytes = parse_var("MAX_BODY_BYTES", defaults.max_body_bytes)?;

        Ok(Self {
            host,
            port,
            history_limit,
            max_body_bytes,
        })
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
            name: "HOST",
            value: raw.clone(),
            reason: e.to_string(),
        })
    }
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    name,
                    value: raw.clone(),
                    reason: e.to_string(),
                })
        }
        _ => Ok(default),
    }
}
