//! Named handles and the clients that back them.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;

/// Backend family a connector strategy serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Document store through the native driver.
    Document,
    /// Document store through an externally supplied mapper/ODM.
    Mapper,
    /// Relational database.
    Relational,
    /// Key-value store.
    KeyValue,
}

impl Backend {
    /// Get the backend name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Mapper => "mapper",
            Self::Relational => "relational",
            Self::KeyValue => "key-value",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind tag of a registered handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// First database of a document-store client.
    Document,
    /// Additional database sharing the client of a [`HandleKind::Document`] handle.
    DocumentSecondary,
    /// Connection opened through a mapper.
    Mapper,
    /// Relational connection pool.
    Relational,
    /// Key-value client.
    KeyValue,
}

impl HandleKind {
    /// Backend family of this handle kind.
    pub fn backend(&self) -> Backend {
        match self {
            Self::Document | Self::DocumentSecondary => Backend::Document,
            Self::Mapper => Backend::Mapper,
            Self::Relational => Backend::Relational,
            Self::KeyValue => Backend::KeyValue,
        }
    }
}

/// A type-erased, cheaply clonable backend object (database, pool, client).
#[derive(Clone)]
pub struct Handle {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Handle {
    /// Wrap a backend object.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Borrow the backend object if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Get a shared pointer to the backend object if it is a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.clone().downcast::<T>().ok()
    }

    /// Clone the backend object out if it is a `T`.
    pub fn cloned<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Check whether the backend object is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Name of the wrapped type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.type_name).finish()
    }
}

/// A handle exposed under an alias.
#[derive(Debug, Clone)]
pub struct NamedHandle {
    /// Externally visible name.
    pub alias: String,
    /// Kind tag.
    pub kind: HandleKind,
    /// Name of the client backing this handle.
    pub client: String,
    /// The backend object.
    pub handle: Handle,
}

impl NamedHandle {
    /// Create a named handle.
    pub fn new(
        alias: impl Into<String>,
        kind: HandleKind,
        client: impl Into<String>,
        handle: Handle,
    ) -> Self {
        Self {
            alias: alias.into(),
            kind,
            client: client.into(),
            handle,
        }
    }
}

/// Close capability of an underlying client (close/end/quit).
#[async_trait]
pub trait Disconnect: Send + Sync {
    /// Release the client's sockets.
    async fn disconnect(&self) -> Result<(), BoxError>;
}

/// One opened client and every alias it backs.
///
/// Several aliases may share one client; the registry disconnects the
/// client exactly once no matter how many aliases reference it.
pub struct LiveClient {
    /// Backend family.
    pub backend: Backend,
    /// Client name used for collision checks and logs.
    pub name: String,
    /// Close capability.
    pub client: Box<dyn Disconnect>,
    /// Handles to expose.
    pub handles: Vec<NamedHandle>,
}

impl LiveClient {
    /// Create a live client with no handles yet.
    pub fn new(backend: Backend, name: impl Into<String>, client: Box<dyn Disconnect>) -> Self {
        Self {
            backend,
            name: name.into(),
            client,
            handles: Vec::new(),
        }
    }

    /// Add a handle backed by this client.
    pub fn with_handle(mut self, handle: NamedHandle) -> Self {
        self.handles.push(handle);
        self
    }

    /// Aliases exposed by this client.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.handles.iter().map(|h| h.alias.as_str())
    }
}

impl fmt::Debug for LiveClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveClient")
            .field("backend", &self.backend)
            .field("name", &self.name)
            .field("handles", &self.handles)
            .finish_non_exhaustive()
    }
}
