use std::{env, str::FromStr, time::Duration};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    /// How long a pending order may stay unpaid before it is deleted.
    pub pending_order_ttl: Duration,
    /// Always non-zero.
    pub expiry_sweep_interval: Duration,
    /// Attempts for a transaction that hits a serialization failure or deadlock.
    pub tx_retry_limit: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source. Unparsable or
    /// out-of-range values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        let host = lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_value(lookup("APP_PORT")).unwrap_or(3000);
        let db_max_connections = parse_value(lookup("DB_MAX_CONNECTIONS"))
            .filter(|n: &u32| *n > 0)
            .unwrap_or(10);
        let pending_order_ttl =
            Duration::from_secs(parse_value(lookup("ORDER_PAY_TIMEOUT_SECS")).unwrap_or(600));
        let expiry_sweep_interval = Duration::from_secs(
            parse_value(lookup("EXPIRY_SWEEP_INTERVAL_SECS"))
                .filter(|secs: &u64| *secs > 0)
                .unwrap_or(60),
        );
        let tx_retry_limit = parse_value(lookup("TX_RETRY_LIMIT")).unwrap_or(3u32).max(1);
        Ok(Self {
            database_url,
            jwt_secret,
            host,
            port,
            db_max_connections,
            pending_order_ttl,
            expiry_sweep_interval,
            tx_retry_limit,
        })
    }
}

fn parse_value<T: FromStr>(raw: Option<String>) -> Option<T> {
    raw.and_then(|v| v.trim().parse::<T>().ok())
}
