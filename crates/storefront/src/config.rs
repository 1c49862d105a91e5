//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PENCRAFT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `PENCRAFT_HOST` - Bind address (default: 127.0.0.1)
//! - `PENCRAFT_PORT` - Listen port (default: 3000)
//! - `PENCRAFT_TOKEN_TTL_HOURS` - Lifetime of issued tokens, at most a year (default: 24)
//! - `PENCRAFT_FREE_SHIPPING_THRESHOLD` - Subtotal for free shipping in rubles (default: 3000)
//! - `PENCRAFT_SHIPPING_FEE` - Shipping fee below the threshold (default: 350)
//! - `PENCRAFT_CORS_ORIGIN` - Allowed browser origin (default: any)
//! - `PENCRAFT_LOG_FORMAT` - `json` for JSON logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0 to 1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use pencraft_core::{Money, ShippingPolicy};
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

/// Upper bound for `PENCRAFT_TOKEN_TTL_HOURS`: one year.
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Lifetime of issued bearer tokens
    pub token_ttl_hours: i64,
    /// Shipping rule applied at checkout
    pub shipping: ShippingPolicy,
    /// Allowed CORS origin; `None` allows any origin
    pub cors_origin: Option<String>,
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Vars(lookup);

        let database_url = env.database_url("PENCRAFT_DATABASE_URL")?;
        let host = env.parsed_or("PENCRAFT_HOST", "127.0.0.1")?;
        let port = env.parsed_or("PENCRAFT_PORT", "3000")?;

        let token_ttl_hours: i64 = env.parsed_or("PENCRAFT_TOKEN_TTL_HOURS", "24")?;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            return Err(ConfigError::InvalidEnvVar(
                "PENCRAFT_TOKEN_TTL_HOURS".to_string(),
                format!("must be between 1 and {MAX_TOKEN_TTL_HOURS}"),
            ));
        }

        let threshold: Decimal = env.parsed_or("PENCRAFT_FREE_SHIPPING_THRESHOLD", "3000")?;
        let fee: Decimal = env.parsed_or("PENCRAFT_SHIPPING_FEE", "350")?;
        let shipping = ShippingPolicy::new(Money::new(threshold), Money::new(fee));
        if shipping.free_threshold.is_negative() || shipping.fee.is_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "PENCRAFT_SHIPPING_FEE".to_string(),
                "shipping amounts cannot be negative".to_string(),
            ));
        }

        let log_format = match env.optional("PENCRAFT_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            database_url,
            host,
            port,
            token_ttl_hours,
            shipping,
            cors_origin: env.optional("PENCRAFT_CORS_ORIGIN"),
            log_format,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parsed_or("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env.parsed_or("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Token lifetime as a duration.
    #[must_use]
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating empty values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value, then parse it.
    fn parsed_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.optional(key).unwrap_or_else(|| default.to_string());
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("PENCRAFT_DATABASE_URL", "postgres://localhost/pencraft")]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.token_ttl(), chrono::Duration::hours(24));
        assert_eq!(config.shipping, ShippingPolicy::default());
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.cors_origin.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fallback/db")]).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fallback/db");
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "PENCRAFT_DATABASE_URL"));
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[
            ("PENCRAFT_DATABASE_URL", "postgres://localhost/db"),
            ("PENCRAFT_PORT", "not-a-port"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "PENCRAFT_PORT"));
    }

    #[test]
    fn test_shipping_overrides() {
        let config = load(&[
            ("PENCRAFT_DATABASE_URL", "postgres://localhost/db"),
            ("PENCRAFT_FREE_SHIPPING_THRESHOLD", "5000"),
            ("PENCRAFT_SHIPPING_FEE", "199.90"),
        ])
        .unwrap();
        assert_eq!(config.shipping.free_threshold, Money::from_rubles(5000));
        assert_eq!(config.shipping.fee, Money::new(Decimal::new(19990, 2)));
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        let err = load(&[
            ("PENCRAFT_DATABASE_URL", "postgres://localhost/db"),
            ("PENCRAFT_TOKEN_TTL_HOURS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_rejects_ttl_over_a_year() {
        let err = load(&[
            ("PENCRAFT_DATABASE_URL", "postgres://localhost/db"),
            ("PENCRAFT_TOKEN_TTL_HOURS", "9223372036854775807"),
        ])
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "PENCRAFT_TOKEN_TTL_HOURS")
        );

        let config = load(&[
            ("PENCRAFT_DATABASE_URL", "postgres://localhost/db"),
            ("PENCRAFT_TOKEN_TTL_HOURS", "8760"),
        ])
        .unwrap();
        assert_eq!(config.token_ttl(), chrono::Duration::days(365));
    }

    #[test]
    fn test_json_log_format() {
        let config = load(&[
            ("PENCRAFT_DATABASE_URL", "postgres://localhost/db"),
            ("PENCRAFT_LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
