//! Checkout configuration.
//!
//! Values come from the constructor or from environment variables with
//! fallback to defaults. Nothing is read from global state at call time.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use shopfront_core::{Money, DEFAULT_PLATFORM_FEE_CENTS};

/// Default deadline for a single service operation.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Checkout service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Fee added once per transaction, in minor units.
    pub platform_fee_cents: i64,

    /// Deadline applied when the caller doesn't pass one.
    pub operation_timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            platform_fee_cents: DEFAULT_PLATFORM_FEE_CENTS,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

impl CheckoutConfig {
    pub fn with_platform_fee_cents(mut self, cents: i64) -> Self {
        self.platform_fee_cents = cents;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Platform fee as Money.
    pub fn platform_fee(&self) -> Money {
        Money::from_cents(self.platform_fee_cents)
    }

    /// Load configuration from environment variables.
    ///
    /// - `SHOPFRONT_PLATFORM_FEE_CENTS` (default 1000)
    /// - `SHOPFRONT_OPERATION_TIMEOUT_MS` (default 10000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let platform_fee_cents = match lookup("SHOPFRONT_PLATFORM_FEE_CENTS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| ConfigError::InvalidValue("SHOPFRONT_PLATFORM_FEE_CENTS".to_string()))?,
            None => defaults.platform_fee_cents,
        };

        let operation_timeout = match lookup("SHOPFRONT_OPERATION_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidValue("SHOPFRONT_OPERATION_TIMEOUT_MS".to_string()))?,
            None => defaults.operation_timeout,
        };

        let config = Self {
            platform_fee_cents,
            operation_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects negative fees and zero deadlines.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.platform_fee_cents < 0 {
            return Err(ConfigError::InvalidValue("SHOPFRONT_PLATFORM_FEE_CENTS".to_string()));
        }
        if self.operation_timeout.is_zero() {
            return Err(ConfigError::InvalidValue("SHOPFRONT_OPERATION_TIMEOUT_MS".to_string()));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = CheckoutConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CheckoutConfig::default());
        assert_eq!(config.platform_fee().cents(), 1_000);
        assert_eq!(config.operation_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let config = CheckoutConfig::from_lookup(lookup(&[
            ("SHOPFRONT_PLATFORM_FEE_CENTS", "250"),
            ("SHOPFRONT_OPERATION_TIMEOUT_MS", "1500"),
        ]))
        .unwrap();
        assert_eq!(config.platform_fee_cents, 250);
        assert_eq!(config.operation_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            CheckoutConfig::from_lookup(lookup(&[("SHOPFRONT_PLATFORM_FEE_CENTS", "ten")])),
            Err(ConfigError::InvalidValue("SHOPFRONT_PLATFORM_FEE_CENTS".to_string()))
        );
        assert!(CheckoutConfig::from_lookup(lookup(&[("SHOPFRONT_PLATFORM_FEE_CENTS", "-1")])).is_err());
        assert!(CheckoutConfig::from_lookup(lookup(&[("SHOPFRONT_OPERATION_TIMEOUT_MS", "0")])).is_err());
    }
}
