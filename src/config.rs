//! Service configuration.
//!
//! Read from environment variables (a `.env` file is loaded first by the
//! binary) with defaults for everything but the database URL.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// HTTP listen port
    #[validate(range(min = 1))]
    pub port: u16,

    /// PostgreSQL connection string; `None` runs without a catalog
    pub database_url: Option<String>,

    #[validate(range(min = 1, max = 100))]
    pub db_max_connections: u32,

    /// Seconds between catalog reloads
    #[validate(range(min = 5, max = 86400))]
    pub refresh_interval_secs: u32,

    /// Upper bound for `per_page` on product listings
    #[validate(range(min = 1, max = 1000))]
    pub max_page_size: u32,

    /// Upper bound for products in one resolve request
    #[validate(range(min = 1, max = 100000))]
    pub max_resolve_products: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8083,
            database_url: None,
            db_max_connections: 10,
            refresh_interval_secs: 60,
            max_page_size: 100,
            max_resolve_products: 5000,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = AppConfig {
            port: parse_or(&lookup, "PORT", defaults.port)?,
            database_url: lookup("DATABASE_URL").filter(|s| !s.trim().is_empty()),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            refresh_interval_secs: parse_or(&lookup, "REFRESH_INTERVAL_SECS", defaults.refresh_interval_secs)?,
            max_page_size: parse_or(&lookup, "MAX_PAGE_SIZE", defaults.max_page_size)?,
            max_resolve_products: parse_or(&lookup, "MAX_RESOLVE_PRODUCTS", defaults.max_resolve_products)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn refresh_interval(&self) -> Duration { Duration::from_secs(u64::from(self.refresh_interval_secs)) }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Out of range: {0}")]
    OutOfRange(#[from] validator::ValidationErrors),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let c = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(c.port, 8083);
        assert!(c.database_url.is_none());
        assert_eq!(c.refresh_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_overrides() {
        let c = AppConfig::from_lookup(lookup(&[("PORT", "9000"), ("DATABASE_URL", "postgres://x/y"), ("MAX_PAGE_SIZE", "50")])).unwrap();
        assert_eq!(c.port, 9000);
        assert_eq!(c.database_url.as_deref(), Some("postgres://x/y"));
        assert_eq!(c.max_page_size, 50);
    }

    #[test]
    fn test_invalid_value() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(k) if k == "PORT"));
    }

    #[test]
    fn test_out_of_range() {
        let err = AppConfig::from_lookup(lookup(&[("REFRESH_INTERVAL_SECS", "1")])).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange(_)));
    }

    #[test]
    fn test_blank_database_url_is_none() {
        assert!(AppConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap().database_url.is_none());
    }
}
