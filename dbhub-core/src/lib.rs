//! # dbhub-core
//!
//! Backend-independent core of dbhub: one `init`/`close` lifecycle for
//! connections to document, relational and key-value stores.
//!
//! This crate provides:
//! - A connection-string model (`scheme://[user:pwd@]host[/name][?opts]`)
//! - Credential overlay from a lazily created secret store
//! - Naming rules (`db`, `db:alias`, lists sharing one client)
//! - The [`Connector`] seam implemented by the driver crates
//! - A [`ConnectionHub`] registry that connects in parallel, rejects on the
//!   first error and closes best-effort
//!
//! ## Example
//!
//! ```rust,ignore
//! use dbhub_core::{ConnectionHub, ConnectionSpec};
//!
//! let hub = ConnectionHub::builder()
//!     .connector(dbhub_mongodb::MongoConnector::new())
//!     .build();
//!
//! hub.init([
//!     ConnectionSpec::new("mongodb://localhost:27017/wtb").names(["wtb:main", "catalog"]),
//! ])
//! .await?;
//!
//! let main = hub.get("main");
//! hub.close().await;
//! ```

pub mod config;
pub mod connector;
pub mod env;
pub mod error;
pub mod handle;
pub mod hub;
pub mod logging;
pub mod mapper;
pub mod secret;
pub mod spec;
pub mod uri;

pub use config::{HubConfig, HubOptions};
pub use connector::{
    ConnectRequest, Connector, DatabaseRef, DocumentNames, defer_missing_name, single_alias,
};
pub use env::{EnvExpander, EnvSource, MapEnvSource, StdEnvSource};
pub use error::{BoxError, HubError, HubResult};
pub use handle::{Backend, Disconnect, Handle, HandleKind, LiveClient, NamedHandle};
pub use hub::{ClientInfo, CloseFailure, CloseReport, ConnectionHub, ConnectionHubBuilder, HubState};
pub use mapper::{Mapper, MapperConnector};
pub use secret::{MapSecretStore, SecretResolver, SecretStore, SecretValue};
pub use spec::{ConnectionSpec, NameSpec};
pub use uri::{ConnectionUri, Scheme};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{HubConfig, HubOptions};
    pub use crate::connector::{ConnectRequest, Connector};
    pub use crate::error::{HubError, HubResult};
    pub use crate::handle::{Backend, Handle, HandleKind, NamedHandle};
    pub use crate::hub::{CloseReport, ConnectionHub, HubState};
    pub use crate::mapper::Mapper;
    pub use crate::secret::{SecretResolver, SecretStore};
    pub use crate::spec::{ConnectionSpec, NameSpec};
    pub use crate::uri::{ConnectionUri, Scheme};
}
