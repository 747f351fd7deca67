//! Connection pool settings for MySQL.

use std::time::Duration;

use dbhub_core::{HubError, HubResult};
use mysql_async::{Opts, Pool, PoolConstraints, PoolOpts};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::config::MysqlConfig;

/// Configuration for the connection pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool.
    pub max_connections: usize,
    /// Minimum number of connections to keep alive.
    pub min_connections: usize,
    /// Maximum time to wait for a connection.
    pub connection_timeout: Option<Duration>,
    /// Maximum idle time before a connection is closed.
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime of a connection.
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            connection_timeout: Some(Duration::from_secs(30)),
            idle_timeout: Some(Duration::from_secs(600)), // 10 minutes
            max_lifetime: Some(Duration::from_secs(1800)), // 30 minutes
        }
    }
}

/// `driverOptions` keys accepted for MySQL entries.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PoolOptions {
    #[serde(alias = "connectionLimit")]
    max_connections: Option<usize>,
    min_connections: Option<usize>,
    #[serde(alias = "acquireTimeout")]
    connection_timeout_ms: Option<u64>,
    idle_timeout_ms: Option<u64>,
    max_lifetime_ms: Option<u64>,
}

impl PoolConfig {
    /// Overlay a `driverOptions` value on top of this configuration.
    ///
    /// Accepts `maxConnections` (or `connectionLimit`), `minConnections`,
    /// `connectionTimeoutMs` (or `acquireTimeout`), `idleTimeoutMs` and
    /// `maxLifetimeMs`. Other keys are ignored.
    pub fn with_driver_options(&self, value: Option<&Value>) -> HubResult<Self> {
        let options: PoolOptions = match value {
            None | Some(Value::Null) => PoolOptions::default(),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| HubError::config(format!("invalid MySQL driver options: {}", e)))?,
        };
        let ms = Duration::from_millis;

        let config = Self {
            max_connections: options.max_connections.unwrap_or(self.max_connections),
            min_connections: options.min_connections.unwrap_or(self.min_connections),
            connection_timeout: options.connection_timeout_ms.map(ms).or(self.connection_timeout),
            idle_timeout: options.idle_timeout_ms.map(ms).or(self.idle_timeout),
            max_lifetime: options.max_lifetime_ms.map(ms).or(self.max_lifetime),
        };
        config.constraints()?;
        Ok(config)
    }

    fn constraints(&self) -> HubResult<PoolConstraints> {
        PoolConstraints::new(self.min_connections, self.max_connections).ok_or_else(|| {
            HubError::config(format!(
                "invalid MySQL pool bounds: min {} > max {}",
                self.min_connections, self.max_connections
            ))
        })
    }

    /// Pool options for the driver.
    pub fn pool_opts(&self) -> HubResult<PoolOpts> {
        let mut opts = PoolOpts::new()
            .with_constraints(self.constraints()?)
            .with_abs_conn_ttl(self.max_lifetime);
        if let Some(idle) = self.idle_timeout {
            opts = opts.with_inactive_connection_ttl(idle);
        }
        Ok(opts)
    }
}

/// Create a pool. No connection is opened yet.
pub fn create_pool(config: &MysqlConfig, pool_config: &PoolConfig) -> HubResult<Pool> {
    let opts = config.to_opts_builder().pool_opts(pool_config.pool_opts()?);
    let pool = Pool::new(Opts::from(opts));

    info!(
        host = %config.host,
        port = %config.port,
        database = ?config.database,
        max_connections = %pool_config.max_connections,
        "MySQL connection pool created"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_pool_config_default() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 0);
        assert!(config.pool_opts().is_ok());
    }

    #[test]
    fn test_driver_options() {
        let config = PoolConfig::default()
            .with_driver_options(Some(&json!({
                "connectionLimit": 25,
                "minConnections": 2,
                "acquireTimeout": 1500,
                "multipleStatements": true
            })))
            .unwrap();

        assert_eq!(config.max_connections, 25);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.connection_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.max_lifetime, Some(Duration::from_secs(1800)));
    }

    #[test]
    fn test_driver_options_invalid() {
        let base = PoolConfig::default();
        assert!(base.with_driver_options(Some(&json!({ "maxConnections": "all" }))).is_err());
        assert!(
            base.with_driver_options(Some(&json!({ "minConnections": 20, "maxConnections": 5 })))
                .is_err()
        );
        assert_eq!(base.with_driver_options(None).unwrap(), base);
    }
}
