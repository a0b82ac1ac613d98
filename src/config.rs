use std::{env, fmt::Display, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub cors_origin: String,
    /// Upper bound for each scoring query.
    pub query_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load("PORT", 8000),
            database_url: var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            cors_origin: try_load("CORS_ORIGIN", "http://localhost:3003".to_string()),
            query_timeout: Duration::from_millis(try_load("QUERY_TIMEOUT_MS", 3000)),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            database_url: String::new(),
            cors_origin: "http://localhost:3003".to_string(),
            query_timeout: Duration::from_secs(3),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = var(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };

    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_values_fall_back() {
        assert_eq!(try_load::<u16>("FAMILYPAW_TEST_UNSET_PORT", 8000), 8000);
    }

    #[test]
    fn invalid_values_fall_back() {
        env::set_var("FAMILYPAW_TEST_BAD_TIMEOUT", "soon");
        assert_eq!(try_load::<u64>("FAMILYPAW_TEST_BAD_TIMEOUT", 3000), 3000);
    }

    #[test]
    fn valid_values_are_parsed() {
        env::set_var("FAMILYPAW_TEST_PORT", " 9100 ");
        assert_eq!(try_load::<u16>("FAMILYPAW_TEST_PORT", 8000), 9100);
    }
}
