//! Application configuration.
//!
//! Type-safe configuration loaded from environment variables via the
//! `config` and `dotenvy` crates. Variables carry the `TENANT_LEDGER`
//! prefix with `__` separating nested values:
//!
//! - `TENANT_LEDGER__DATABASE__URL=postgres://...`
//! - `TENANT_LEDGER__GATEWAY__KEY_ID=rzp_test_...`
//! - `TENANT_LEDGER__REDIS__URL=redis://...`

mod database;
mod error;
mod gateway;
mod redis;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use gateway::GatewayConfig;
pub use redis::RedisConfig;

use serde::Deserialize;

/// Root configuration for the ledger subsystem.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection.
    pub database: DatabaseConfig,

    /// Redis, used for fire-and-forget cache invalidation.
    pub redis: RedisConfig,

    /// Razorpay credentials.
    pub gateway: GatewayConfig,
}

impl AppConfig {
    /// Loads configuration from the environment, reading `.env` first when
    /// present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when required variables are missing or values
    /// fail to parse.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TENANT_LEDGER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic validation across all sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.redis.validate()?;
        self.gateway.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn validate_walks_every_section() {
        let config = AppConfig {
            database: DatabaseConfig {
                url: "postgres://localhost/ledger".to_string(),
                ..Default::default()
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                ..Default::default()
            },
            gateway: GatewayConfig {
                key_id: "rzp_test_abc".to_string(),
                key_secret: SecretString::new("secret".to_string()),
                webhook_secret: SecretString::new("whsecret".to_string()),
                ..Default::default()
            },
        };
        assert!(config.validate().is_ok());

        let broken = AppConfig {
            redis: RedisConfig::default(),
            ..config
        };
        assert!(broken.validate().is_err());
    }
}
