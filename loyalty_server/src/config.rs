use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::*;
use loyalty_engine::accrual::{
    config::{
        DEFAULT_ATTEMPT_TIMEOUT,
        DEFAULT_BATCH_SIZE,
        DEFAULT_CONCURRENCY,
        DEFAULT_MAX_ATTEMPTS,
        DEFAULT_POLL_INTERVAL,
        DEFAULT_RETRY_DELAY,
        DEFAULT_SHUTDOWN_GRACE_PERIOD,
    },
    AccrualConfig,
    RetryPolicy,
};

use crate::errors::ServerError;

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    /// Settings for the accrual reconciliation worker, including the oracle's address.
    pub accrual: AccrualConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: String::default(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            accrual: AccrualConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any source of `LPS_*` values. Unparsable values are logged and replaced with
    /// their defaults. Missing mandatory values are left empty for [`ServerConfig::validate`] to catch.
    pub fn from_lookup<F>(lookup: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let database_url = lookup("LPS_DATABASE_URL").unwrap_or_else(|| {
            error!("🪛️ LPS_DATABASE_URL is not set. Please set it to the URL for the loyalty database.");
            String::default()
        });
        let oracle_url = lookup("LPS_ACCRUAL_SYSTEM_ADDRESS").unwrap_or_else(|| {
            error!("🪛️ LPS_ACCRUAL_SYSTEM_ADDRESS is not set. Please set it to the base URL of the accrual service.");
            String::default()
        });
        let db_max_connections = parse_or_default(&lookup, "LPS_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
        let concurrency = parse_or_default(&lookup, "LPS_ACCRUAL_CONCURRENCY", DEFAULT_CONCURRENCY);
        let batch_size = parse_or_default(&lookup, "LPS_ACCRUAL_BATCH_SIZE", DEFAULT_BATCH_SIZE);
        let poll_interval = seconds_or_default(&lookup, "LPS_ACCRUAL_POLL_INTERVAL", DEFAULT_POLL_INTERVAL);
        let max_attempts = parse_or_default(&lookup, "LPS_ACCRUAL_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS);
        let retry_delay = seconds_or_default(&lookup, "LPS_ACCRUAL_RETRY_DELAY", DEFAULT_RETRY_DELAY);
        let attempt_timeout = seconds_or_default(&lookup, "LPS_ACCRUAL_TIMEOUT", DEFAULT_ATTEMPT_TIMEOUT);
        let shutdown_grace_period =
            seconds_or_default(&lookup, "LPS_SHUTDOWN_GRACE_PERIOD", DEFAULT_SHUTDOWN_GRACE_PERIOD);
        let accrual = AccrualConfig {
            oracle_url,
            concurrency,
            batch_size,
            poll_interval,
            retry: RetryPolicy { max_attempts, retry_delay, attempt_timeout },
            shutdown_grace_period,
        };
        Self { database_url, db_max_connections, accrual }
    }

    /// Checks the values that have no sensible default.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.database_url.trim().is_empty() {
            return Err(ServerError::ConfigurationError("LPS_DATABASE_URL must be set".into()));
        }
        if self.accrual.oracle_url.trim().is_empty() {
            return Err(ServerError::ConfigurationError("LPS_ACCRUAL_SYSTEM_ADDRESS must be set".into()));
        }
        if self.db_max_connections == 0 {
            return Err(ServerError::ConfigurationError("LPS_DB_MAX_CONNECTIONS must be at least 1".into()));
        }
        if self.accrual.batch_size == 0 {
            return Err(ServerError::ConfigurationError("LPS_ACCRUAL_BATCH_SIZE must be at least 1".into()));
        }
        if self.accrual.concurrency == 0 {
            warn!("🪛️ LPS_ACCRUAL_CONCURRENCY is 0. Accrual requests will be sent one at a time.");
        }
        if self.accrual.retry.max_attempts == 0 {
            warn!("🪛️ LPS_ACCRUAL_MAX_ATTEMPTS is 0. Each order will still be tried once per cycle.");
        }
        Ok(())
    }

    pub fn accrual_config(&self) -> &AccrualConfig {
        &self.accrual
    }
}

fn parse_or_default<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display + Copy,
    T::Err: Display,
{
    match lookup(name) {
        Some(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        None => {
            debug!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

fn seconds_or_default<F>(lookup: &F, name: &str, default: Duration) -> Duration
where F: Fn(&str) -> Option<String> {
    let secs = parse_or_default(lookup, name, default.as_secs());
    Duration::from_secs(secs)
}
