//! Configuration management for the Vellum record store

use serde::Deserialize;
use std::time::Duration;

/// Longest lifetime or interval accepted for any `*_secs` setting (ten years)
pub const MAX_DURATION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Lifetimes, sweep intervals and bounds for the record store
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub signing_key_lifetime_secs: u64,
    pub signing_key_sweep_secs: u64,
    pub symmetric_key_ttl_secs: u64,
    pub symmetric_key_sweep_secs: u64,
    pub canary_ttl_secs: u64,
    pub canary_sweep_secs: u64,
    /// Backups retained per identifier
    pub max_backups: usize,
    /// Signing key rotation period for the service binary (0 = never)
    pub rotation_interval_secs: u64,
    /// Seed the default records on startup
    pub seed_defaults: bool,
    pub log_level: String,
    /// `console` or `json`
    pub log_format: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            signing_key_lifetime_secs: 48 * 60 * 60,
            signing_key_sweep_secs: 60 * 60,
            symmetric_key_ttl_secs: 48 * 60 * 60,
            symmetric_key_sweep_secs: 60 * 60,
            canary_ttl_secs: 60 * 60,
            canary_sweep_secs: 60,
            max_backups: 10,
            rotation_interval_secs: 24 * 60 * 60,
            seed_defaults: true,
            log_level: "info".to_string(),
            log_format: "console".to_string(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from `VELLUM_*` environment variables
    ///
    /// A `.env` file is read first if present. Unset variables keep their
    /// defaults, e.g. `VELLUM_MAX_BACKUPS=20` overrides only the backup bound.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config: Self = config::Config::builder()
            .add_source(config::Environment::with_prefix("VELLUM").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the store cannot operate with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let non_zero = [
            ("signing_key_lifetime_secs", self.signing_key_lifetime_secs),
            ("signing_key_sweep_secs", self.signing_key_sweep_secs),
            ("symmetric_key_ttl_secs", self.symmetric_key_ttl_secs),
            ("symmetric_key_sweep_secs", self.symmetric_key_sweep_secs),
            ("canary_ttl_secs", self.canary_ttl_secs),
            ("canary_sweep_secs", self.canary_sweep_secs),
        ];
        for (name, value) in non_zero {
            if value == 0 {
                return Err(config::ConfigError::Message(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }
        let bounded = non_zero
            .into_iter()
            .chain([("rotation_interval_secs", self.rotation_interval_secs)]);
        for (name, value) in bounded {
            if value > MAX_DURATION_SECS {
                return Err(config::ConfigError::Message(format!(
                    "{} must be at most {} seconds",
                    name, MAX_DURATION_SECS
                )));
            }
        }
        if self.max_backups == 0 {
            return Err(config::ConfigError::Message(
                "max_backups must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn signing_key_lifetime(&self) -> Duration {
        Duration::from_secs(self.signing_key_lifetime_secs)
    }

    pub fn signing_key_sweep(&self) -> Duration {
        Duration::from_secs(self.signing_key_sweep_secs)
    }

    pub fn symmetric_key_ttl(&self) -> Duration {
        Duration::from_secs(self.symmetric_key_ttl_secs)
    }

    pub fn symmetric_key_sweep(&self) -> Duration {
        Duration::from_secs(self.symmetric_key_sweep_secs)
    }

    pub fn canary_ttl(&self) -> Duration {
        Duration::from_secs(self.canary_ttl_secs)
    }

    pub fn canary_sweep(&self) -> Duration {
        Duration::from_secs(self.canary_sweep_secs)
    }

    /// Rotation period, or `None` when scheduled rotation is disabled
    pub fn rotation_interval(&self) -> Option<Duration> {
        (self.rotation_interval_secs > 0).then(|| Duration::from_secs(self.rotation_interval_secs))
    }

    /// Get log level, defaulting to "info"
    pub fn log_level(&self) -> &str {
        if self.log_level.is_empty() {
            "info"
        } else {
            &self.log_level
        }
    }
}
