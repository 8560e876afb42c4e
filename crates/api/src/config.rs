//! Application configuration loaded from environment variables.

use domain::DEFAULT_MAX_WRITE_RETRIES;

const DEFAULT_EMAIL_FROM: &str = "orders@localhost";

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default `"0.0.0.0"`)
/// - `PORT`: listen port (default `3000`)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `DATABASE_URL`: PostgreSQL URL; in-memory stores are used when unset
/// - `MAX_WRITE_RETRIES`: attempts per order write on version conflicts (default `3`)
/// - `EMAIL_FROM`: sender address for notification mail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub max_write_retries: u32,
    pub email_from: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from any key lookup. Unparseable numbers fall
    /// back to their defaults; blank strings count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: get("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: get("DATABASE_URL"),
            max_write_retries: get("MAX_WRITE_RETRIES")
                .and_then(|n| n.trim().parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_write_retries),
            email_from: get("EMAIL_FROM").unwrap_or(defaults.email_from),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            max_write_retries: DEFAULT_MAX_WRITE_RETRIES,
            email_from: DEFAULT_EMAIL_FROM.to_string(),
        }
    }
}
