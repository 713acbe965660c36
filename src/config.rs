//! Runtime configuration, read once from the environment at startup

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::models::credentials::CredentialSet;
use crate::services::bricklink::BRICKLINK_API_BASE_URL;

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_SERVER_ADDR: &str = "SERVER_ADDR";
pub const ENV_API_BASE_URL: &str = "BRICKLINK_API_BASE_URL";
pub const ENV_HTTP_TIMEOUT: &str = "BRICKLINK_HTTP_TIMEOUT_SECS";
pub const ENV_CACHE_TTL: &str = "CLIENT_CACHE_TTL_SECS";
pub const ENV_CACHE_MAX_CLIENTS: &str = "CLIENT_CACHE_MAX_CLIENTS";
pub const ENV_ALLOW_FALLBACK: &str = "BRICKLINK_ALLOW_FALLBACK_CREDENTIALS";
pub const ENV_FALLBACK_CONSUMER_KEY: &str = "BRICKLINK_FALLBACK_CONSUMER_KEY";
pub const ENV_FALLBACK_CONSUMER_SECRET: &str = "BRICKLINK_FALLBACK_CONSUMER_SECRET";
pub const ENV_FALLBACK_TOKEN: &str = "BRICKLINK_FALLBACK_TOKEN";
pub const ENV_FALLBACK_TOKEN_SECRET: &str = "BRICKLINK_FALLBACK_TOKEN_SECRET";
pub const ENV_ORDER_SYNC_INTERVAL: &str = "ORDER_SYNC_INTERVAL_SECS";
pub const ENV_ITEM_CACHE_TTL: &str = "ITEM_CACHE_TTL_SECS";

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 30 * 60;
const DEFAULT_CACHE_MAX_CLIENTS: usize = 100;
const DEFAULT_ITEM_CACHE_TTL_SECS: u64 = 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("BRICKLINK_ALLOW_FALLBACK_CREDENTIALS is enabled but {0} is not set")]
    IncompleteFallback(&'static str),
}

/// Provider HTTP settings shared by every client the cache builds
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: BRICKLINK_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientCacheConfig {
    pub ttl: Duration,
    pub max_clients: usize,
    /// Used only when a user has no stored credentials and fallback was
    /// explicitly enabled
    pub fallback_credentials: Option<CredentialSet>,
}

impl Default for ClientCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            max_clients: DEFAULT_CACHE_MAX_CLIENTS,
            fallback_credentials: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub server_addr: String,
    pub api: ApiConfig,
    pub client_cache: ClientCacheConfig,
    /// `None` disables the scheduled order sync job
    pub order_sync_interval: Option<Duration>,
    pub item_cache_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any name -> value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = get(ENV_DATABASE_URL).ok_or(ConfigError::Missing(ENV_DATABASE_URL))?;
        let server_addr = get(ENV_SERVER_ADDR).unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string());

        let api = ApiConfig {
            base_url: get(ENV_API_BASE_URL).unwrap_or_else(|| BRICKLINK_API_BASE_URL.to_string()),
            timeout: Duration::from_secs(parse_or(
                ENV_HTTP_TIMEOUT,
                get(ENV_HTTP_TIMEOUT),
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
        };

        let allow_fallback = parse_or(ENV_ALLOW_FALLBACK, get(ENV_ALLOW_FALLBACK), false)?;
        let fallback_credentials = if allow_fallback {
            let part = |name: &'static str| get(name).ok_or(ConfigError::IncompleteFallback(name));
            Some(CredentialSet::new(
                part(ENV_FALLBACK_CONSUMER_KEY)?,
                part(ENV_FALLBACK_CONSUMER_SECRET)?,
                part(ENV_FALLBACK_TOKEN)?,
                part(ENV_FALLBACK_TOKEN_SECRET)?,
            ))
        } else {
            None
        };

        let ttl_secs = parse_or(ENV_CACHE_TTL, get(ENV_CACHE_TTL), DEFAULT_CACHE_TTL_SECS)?;
        if ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                name: ENV_CACHE_TTL,
                value: "0".to_string(),
            });
        }
        let max_clients = parse_or(
            ENV_CACHE_MAX_CLIENTS,
            get(ENV_CACHE_MAX_CLIENTS),
            DEFAULT_CACHE_MAX_CLIENTS,
        )?
        .max(1);

        let sync_secs: u64 = parse_or(ENV_ORDER_SYNC_INTERVAL, get(ENV_ORDER_SYNC_INTERVAL), 0)?;
        let item_ttl_secs = parse_or(
            ENV_ITEM_CACHE_TTL,
            get(ENV_ITEM_CACHE_TTL),
            DEFAULT_ITEM_CACHE_TTL_SECS,
        )?;

        Ok(Self {
            database_url,
            server_addr,
            api,
            client_cache: ClientCacheConfig {
                ttl: Duration::from_secs(ttl_secs),
                max_clients,
                fallback_credentials,
            },
            order_sync_interval: (sync_secs > 0).then(|| Duration::from_secs(sync_secs)),
            item_cache_ttl: Duration::from_secs(item_ttl_secs),
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_env_var_names() {
        assert_eq!(ENV_DATABASE_URL, "DATABASE_URL");
        assert_eq!(ENV_CACHE_TTL, "CLIENT_CACHE_TTL_SECS");
        assert_eq!(ENV_CACHE_MAX_CLIENTS, "CLIENT_CACHE_MAX_CLIENTS");
        assert_eq!(ENV_ALLOW_FALLBACK, "BRICKLINK_ALLOW_FALLBACK_CREDENTIALS");
        assert_eq!(ENV_ORDER_SYNC_INTERVAL, "ORDER_SYNC_INTERVAL_SECS");
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/bricks")]).unwrap();

        assert_eq!(config.server_addr, "0.0.0.0:3000");
        assert_eq!(config.api.base_url, "https://api.bricklink.com/api/store/v1");
        assert_eq!(config.api.timeout, Duration::from_secs(30));
        assert_eq!(config.client_cache.ttl, Duration::from_secs(1800));
        assert_eq!(config.client_cache.max_clients, 100);
        assert!(config.client_cache.fallback_credentials.is_none());
        assert!(config.order_sync_interval.is_none());
    }

    #[test]
    fn test_database_url_required() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("CLIENT_CACHE_TTL_SECS", "60"),
            ("CLIENT_CACHE_MAX_CLIENTS", "5"),
            ("ORDER_SYNC_INTERVAL_SECS", "900"),
        ])
        .unwrap();

        assert_eq!(config.client_cache.ttl, Duration::from_secs(60));
        assert_eq!(config.client_cache.max_clients, 5);
        assert_eq!(config.order_sync_interval, Some(Duration::from_secs(900)));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = config_from(&[("DATABASE_URL", "x"), ("CLIENT_CACHE_TTL_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CLIENT_CACHE_TTL_SECS", .. }));
    }

    #[test]
    fn test_fallback_requires_opt_in_and_all_parts() {
        // Values alone do nothing without the switch
        let config = config_from(&[
            ("DATABASE_URL", "x"),
            ("BRICKLINK_FALLBACK_CONSUMER_KEY", "ck"),
        ])
        .unwrap();
        assert!(config.client_cache.fallback_credentials.is_none());

        let err = config_from(&[
            ("DATABASE_URL", "x"),
            ("BRICKLINK_ALLOW_FALLBACK_CREDENTIALS", "true"),
            ("BRICKLINK_FALLBACK_CONSUMER_KEY", "ck"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::IncompleteFallback("BRICKLINK_FALLBACK_CONSUMER_SECRET")
        ));

        let config = config_from(&[
            ("DATABASE_URL", "x"),
            ("BRICKLINK_ALLOW_FALLBACK_CREDENTIALS", "true"),
            ("BRICKLINK_FALLBACK_CONSUMER_KEY", "ck"),
            ("BRICKLINK_FALLBACK_CONSUMER_SECRET", "cs"),
            ("BRICKLINK_FALLBACK_TOKEN", "t"),
            ("BRICKLINK_FALLBACK_TOKEN_SECRET", "ts"),
        ])
        .unwrap();
        let fallback = config.client_cache.fallback_credentials.unwrap();
        assert_eq!(fallback.consumer_key, "ck");
        assert_eq!(fallback.token_secret, "ts");
    }
}
