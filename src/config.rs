use std::{env, fmt::Display, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_JWT_SECRET: &str = "secret";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid { key: &'static str, value: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    pub nats_url: Option<String>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = optional("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set, signing tokens with the development secret");
            DEFAULT_JWT_SECRET.to_string()
        });

        Ok(Self {
            port: try_load("PORT", "5000")?,
            database_url: optional("DATABASE_URL"),
            database_max_connections: try_load("DATABASE_MAX_CONNECTIONS", "10")?,
            jwt_secret,
            jwt_ttl: Duration::from_secs(try_load("JWT_TTL_SECS", "3600")?),
            nats_url: optional("NATS_URL"),
            admin_username: optional("ADMIN_USERNAME"),
            admin_password: optional("ADMIN_PASSWORD"),
        })
    }

    /// Admin account to seed at startup, when both halves are configured.
    pub fn admin_seed(&self) -> Option<(&str, &str)> {
        Some((self.admin_username.as_deref()?, self.admin_password.as_deref()?))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            database_url: None,
            database_max_connections: 10,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_ttl: Duration::from_secs(3600),
            nats_url: None,
            admin_username: None,
            admin_password: None,
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = optional(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_seed_needs_both_values() {
        let mut config = Config { admin_username: Some("boss".into()), ..Config::default() };
        assert!(config.admin_seed().is_none());
        config.admin_password = Some("pw".into());
        assert_eq!(config.admin_seed(), Some(("boss", "pw")));
    }

    #[test]
    fn invalid_numbers_are_reported() {
        env::set_var("SWEETSHOP_TEST_BAD_PORT", "abc");
        let err = try_load::<u16>("SWEETSHOP_TEST_BAD_PORT", "5000").unwrap_err();
        assert!(err.to_string().starts_with("invalid SWEETSHOP_TEST_BAD_PORT value \"abc\""));
    }

    #[test]
    fn unset_values_fall_back_to_default() {
        let port: u16 = try_load("SWEETSHOP_TEST_UNSET_PORT", "5000").unwrap();
        assert_eq!(port, 5000);
    }
}
