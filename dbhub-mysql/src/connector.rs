//! MySQL connector.

use async_trait::async_trait;
use dbhub_core::{
    Backend, BoxError, ConnectRequest, Connector, Disconnect, Handle, HandleKind, HubError,
    HubResult, LiveClient, NamedHandle, single_alias,
};
use mysql_async::Pool;
use tracing::{debug, info, warn};

use crate::config::MysqlConfig;
use crate::pool::{PoolConfig, create_pool};

/// Connector for `mysql://` entries.
///
/// Each entry gets its own pool, exposed as a [`mysql_async::Pool`] handle.
/// The pool is only registered after one connection has been acquired and
/// released.
#[derive(Debug, Clone, Default)]
pub struct MysqlConnector {
    defaults: PoolConfig,
}

impl MysqlConnector {
    /// Create a connector with default pool settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a connector with custom default pool settings.
    pub fn with_pool_config(defaults: PoolConfig) -> Self {
        Self { defaults }
    }
}

struct MysqlPoolHandle {
    pool: Pool,
}

#[async_trait]
impl Disconnect for MysqlPoolHandle {
    async fn disconnect(&self) -> Result<(), BoxError> {
        self.pool.clone().disconnect().await?;
        Ok(())
    }
}

#[async_trait]
impl Connector for MysqlConnector {
    fn backend(&self) -> Backend {
        Backend::Relational
    }

    async fn connect(&self, request: ConnectRequest) -> HubResult<LiveClient> {
        let alias = single_alias(Backend::Relational, &request.spec, &request.uri)?;
        let config = MysqlConfig::from_uri(&request.uri)?;
        let pool_config = self
            .defaults
            .with_driver_options(request.spec.driver_options.as_ref())?;
        let pool = create_pool(&config, &pool_config)?;

        let wait = match (config.connect_timeout, pool_config.connection_timeout) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        debug!(name = %alias, host = %config.host, "Validating MySQL pool");
        let acquired = match wait {
            Some(wait) => match tokio::time::timeout(wait, pool.get_conn()).await {
                Ok(result) => result.map_err(|e| HubError::connection(Backend::Relational, &alias, e)),
                Err(_) => Err(HubError::ConnectTimeout {
                    backend: Backend::Relational,
                    name: alias.clone(),
                    timeout: wait,
                }),
            },
            None => pool
                .get_conn()
                .await
                .map_err(|e| HubError::connection(Backend::Relational, &alias, e)),
        };

        match acquired {
            Ok(conn) => drop(conn),
            Err(err) => {
                if let Err(close_err) = pool.disconnect().await {
                    warn!(name = %alias, error = %close_err, "Error closing unusable MySQL pool");
                }
                return Err(err);
            }
        }

        info!(name = %alias, host = %config.host, "MySQL connection OK");

        Ok(LiveClient::new(
            Backend::Relational,
            alias.clone(),
            Box::new(MysqlPoolHandle { pool: pool.clone() }),
        )
        .with_handle(NamedHandle::new(
            alias.clone(),
            HandleKind::Relational,
            alias,
            Handle::new(pool),
        )))
    }
}
