//! Primary-driver connections through an externally supplied mapper.
//!
//! A mapper (object-document mapper or similar) owns its own connection.
//! The hub only asks it to open one, waits for the first of "opened" or
//! "failed", and gives up after the connect timeout. Giving up does not abort
//! the mapper's handshake.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::connector::{ConnectRequest, Connector, single_alias};
use crate::error::{BoxError, HubError, HubResult};
use crate::handle::{Backend, Disconnect, Handle, HandleKind, LiveClient, NamedHandle};

/// Connection capability of a mapper.
#[async_trait]
pub trait Mapper: Send + Sync {
    /// Open the mapper's connection. Resolves once it is open or has failed.
    async fn open(&self, uri: &str, options: Option<&Value>) -> Result<Handle, BoxError>;

    /// Close the mapper's connection.
    async fn disconnect(&self) -> Result<(), BoxError>;
}

/// Connector routing a primary-driver entry through a [`Mapper`].
#[derive(Clone)]
pub struct MapperConnector {
    mapper: Arc<dyn Mapper>,
}

impl MapperConnector {
    /// Create a connector over a mapper.
    pub fn new(mapper: Arc<dyn Mapper>) -> Self {
        Self { mapper }
    }
}

struct MapperClient {
    mapper: Arc<dyn Mapper>,
}

#[async_trait]
impl Disconnect for MapperClient {
    async fn disconnect(&self) -> Result<(), BoxError> {
        self.mapper.disconnect().await
    }
}

#[async_trait]
impl Connector for MapperConnector {
    fn backend(&self) -> Backend {
        Backend::Mapper
    }

    async fn connect(&self, request: ConnectRequest) -> HubResult<LiveClient> {
        let ConnectRequest {
            spec,
            uri,
            connect_timeout,
            ..
        } = request;
        let name = single_alias(Backend::Mapper, &spec, &uri)?;
        let rendered = uri.render();

        let opened = tokio::time::timeout(
            connect_timeout,
            self.mapper.open(&rendered, spec.driver_options.as_ref()),
        )
        .await;

        let handle = match opened {
            Ok(Ok(handle)) => handle,
            Ok(Err(source)) => return Err(HubError::connection(Backend::Mapper, name, source)),
            Err(_) => {
                warn!(name = %name, timeout_secs = connect_timeout.as_secs(), "Mapper connection timed out");
                return Err(HubError::ConnectTimeout {
                    backend: Backend::Mapper,
                    name,
                    timeout: connect_timeout,
                });
            }
        };

        info!(name = %name, host = %uri.host, "Mapper connection OK");

        let client = MapperClient {
            mapper: self.mapper.clone(),
        };
        Ok(LiveClient::new(Backend::Mapper, name.clone(), Box::new(client))
            .with_handle(NamedHandle::new(name.clone(), HandleKind::Mapper, name, handle)))
    }
}
