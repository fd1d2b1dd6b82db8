// src/config.rs
use crate::error::ConfigError;
use log::LevelFilter;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_JWT_SECRET: &str = "m4capital-dev-secret";
// 30 days, the session lifetime the dashboard has always used.
const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;
// Longest session lifetime accepted from the environment: one year.
const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;
const DEFAULT_QUOTE_REFRESH_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub quote_refresh: Duration,
    pub log_level: LevelFilter,
    /// ScyllaDB node to persist portfolios in. Portfolios stay in memory when unset.
    pub scylla_node: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], 3030).into(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            quote_refresh: Duration::from_secs(DEFAULT_QUOTE_REFRESH_SECS),
            log_level: LevelFilter::Info,
            scylla_node: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr: SocketAddr =
            parse_or(&lookup, "M4_BIND_ADDR", Config::default().bind_addr)?;
        let jwt_secret = lookup("M4_JWT_SECRET")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string());
        let session_ttl_secs: u64 =
            parse_or(&lookup, "M4_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        if session_ttl_secs == 0 || session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::Invalid {
                key: "M4_SESSION_TTL_SECS",
                value: session_ttl_secs.to_string(),
            });
        }
        let quote_refresh_secs: u64 =
            parse_or(&lookup, "M4_QUOTE_REFRESH_SECS", DEFAULT_QUOTE_REFRESH_SECS)?;
        if quote_refresh_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "M4_QUOTE_REFRESH_SECS",
                value: "0".to_string(),
            });
        }
        let log_level = parse_or(&lookup, "M4_LOG_LEVEL", LevelFilter::Info)?;
        let scylla_node = lookup("M4_SCYLLA_NODE").filter(|s| !s.is_empty());

        Ok(Self {
            bind_addr,
            jwt_secret,
            session_ttl: Duration::from_secs(session_ttl_secs),
            quote_refresh: Duration::from_secs(quote_refresh_secs),
            log_level,
            scylla_node,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => {
            let parsed = raw.trim().parse::<T>();
            parsed.map_err(|_| ConfigError::Invalid { key, value: raw })
        }
        None => Ok(default),
    }
}
