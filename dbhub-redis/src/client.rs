//! Shared Redis client handle.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dbhub_core::{BoxError, Disconnect};
use parking_lot::Mutex;
use redis::RedisResult;
use redis::aio::MultiplexedConnection;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// A Redis client registered in a hub.
///
/// The multiplexed connection is opened on first use and shared by every
/// clone. Cloning is cheap.
#[derive(Clone)]
pub struct RedisClient {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    client: redis::Client,
    connection: OnceCell<MultiplexedConnection>,
    probe: Mutex<Option<JoinHandle<()>>>,
}

impl RedisClient {
    pub(crate) fn new(name: impl Into<String>, client: redis::Client) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                client,
                connection: OnceCell::new(),
                probe: Mutex::new(None),
            }),
        }
    }

    /// Name the client was registered under.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The underlying driver client.
    pub fn client(&self) -> &redis::Client {
        &self.inner.client
    }

    /// The shared multiplexed connection, opened on first use.
    pub async fn connection(&self) -> RedisResult<MultiplexedConnection> {
        self.inner
            .connection
            .get_or_try_init(|| self.inner.client.get_multiplexed_async_connection())
            .await
            .cloned()
    }

    /// Whether the shared connection has been opened.
    pub fn is_connected(&self) -> bool {
        self.inner.connection.initialized()
    }

    /// Send `PING` over the shared connection.
    pub async fn ping(&self) -> RedisResult<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    /// Open the connection in the background.
    ///
    /// Failures are logged and never reported to the caller.
    pub(crate) fn spawn_probe(&self) {
        let client = self.clone();
        let handle = tokio::spawn(async move {
            match client.ping().await {
                Ok(()) => info!(name = %client.name(), "Redis connection OK"),
                Err(e) => error!(name = %client.name(), error = %e, "Redis connection error"),
            }
        });
        *self.inner.probe.lock() = Some(handle);
    }
}

#[async_trait]
impl Disconnect for RedisClient {
    async fn disconnect(&self) -> Result<(), BoxError> {
        if let Some(probe) = self.inner.probe.lock().take() {
            probe.abort();
        }

        let Some(conn) = self.inner.connection.get() else {
            debug!(name = %self.name(), "Redis client never connected");
            return Ok(());
        };

        let mut conn = conn.clone();
        let _: () = redis::cmd("QUIT").query_async(&mut conn).await?;
        Ok(())
    }
}

impl fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisClient")
            .field("name", &self.inner.name)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
