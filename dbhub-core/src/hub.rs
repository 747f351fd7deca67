//! Connection registry and lifecycle orchestration.
//!
//! A [`ConnectionHub`] turns a list of [`ConnectionSpec`]s into live,
//! named handles and tears them down again:
//!
//! ```text
//! Idle --init--> Connecting --all connected--> Ready --close--> Closing --> Idle
//!                    |                                            ^
//!                    +-------------- first error, close ----------+
//! ```
//!
//! `init` starts one task per spec and returns on the first failure without
//! cancelling the others. Whatever connects afterwards is still registered
//! (or disconnected, if `close` already ran), so callers always clean up with
//! `close`, which never fails.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::future::join_all;
use futures::stream::FuturesUnordered;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::HubOptions;
use crate::connector::{ConnectRequest, Connector};
use crate::error::{BoxError, HubError, HubResult};
use crate::handle::{Backend, Disconnect, LiveClient, NamedHandle};
use crate::mapper::{Mapper, MapperConnector};
use crate::secret::SecretResolver;
use crate::spec::{ConnectionSpec, NameSpec};
use crate::uri::ConnectionUri;

/// Lifecycle state of a hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubState {
    /// Nothing registered; `init` may be called.
    Idle,
    /// An `init` is in flight or has failed.
    Connecting,
    /// Every connection of the last `init` is registered.
    Ready,
    /// A `close` is disconnecting clients.
    Closing,
}

impl HubState {
    /// Get the state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Closing => "closing",
        }
    }
}

impl fmt::Display for HubState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Summary of a registered client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Backend family.
    pub backend: Backend,
    /// Client name.
    pub name: String,
    /// Aliases backed by the client.
    pub aliases: Vec<String>,
}

/// A client whose disconnect failed during `close`.
#[derive(Debug)]
pub struct CloseFailure {
    /// Backend family.
    pub backend: Backend,
    /// Client name.
    pub client: String,
    /// Aliases the client backed.
    pub aliases: Vec<String>,
    /// Error returned by the driver.
    pub error: BoxError,
}

/// Outcome of [`ConnectionHub::close`].
#[derive(Debug, Default)]
pub struct CloseReport {
    /// Clients disconnected cleanly.
    pub closed: Vec<String>,
    /// Clients whose disconnect failed. They are unregistered all the same.
    pub failures: Vec<CloseFailure>,
}

impl CloseReport {
    /// Check whether every client disconnected cleanly.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of clients that were unregistered.
    pub fn total(&self) -> usize {
        self.closed.len() + self.failures.len()
    }
}

struct RegisteredClient {
    backend: Backend,
    name: String,
    client: Box<dyn Disconnect>,
    aliases: Vec<String>,
}

struct Registry {
    state: HubState,
    generation: u64,
    aliases: IndexMap<String, NamedHandle>,
    clients: IndexMap<(Backend, String), RegisteredClient>,
}

impl Registry {
    fn new() -> Self {
        Self {
            state: HubState::Idle,
            generation: 0,
            aliases: IndexMap::new(),
            clients: IndexMap::new(),
        }
    }
}

struct HubInner {
    connectors: HashMap<Backend, Arc<dyn Connector>>,
    secrets: Option<Arc<SecretResolver>>,
    options: HubOptions,
    registry: Mutex<Registry>,
}

/// A client refused by the registry, handed back so it can be disconnected.
struct Rejected {
    error: HubError,
    live: LiveClient,
}

/// One spec ready to be connected.
struct ConnectTask {
    connector: Arc<dyn Connector>,
    spec: ConnectionSpec,
    backend: Backend,
    label: String,
}

/// Registry of named connections across backends.
///
/// Cloning is cheap; clones share the same registry.
///
/// ```rust,no_run
/// # async fn example(specs: Vec<dbhub_core::ConnectionSpec>) -> dbhub_core::HubResult<()> {
/// use dbhub_core::ConnectionHub;
///
/// let hub = ConnectionHub::builder().separator("/").build();
/// hub.init(specs).await?;
/// for alias in hub.aliases() {
///     println!("{}", alias);
/// }
/// let report = hub.close().await;
/// assert!(report.is_clean());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConnectionHub {
    inner: Arc<HubInner>,
}

impl ConnectionHub {
    /// Create a builder for the hub.
    pub fn builder() -> ConnectionHubBuilder {
        ConnectionHubBuilder::new()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> HubState {
        self.inner.registry.lock().state
    }

    /// Options applied to every `init`.
    pub fn options(&self) -> &HubOptions {
        &self.inner.options
    }

    /// Connect every spec and register its handles.
    ///
    /// Shape errors (names, schemes, alias collisions, mapper setup) are
    /// reported before anything connects. Connection errors reject with the
    /// first failure; connections still in flight keep running and register
    /// when they finish.
    pub async fn init(&self, specs: impl IntoIterator<Item = ConnectionSpec>) -> HubResult<()> {
        let specs: Vec<ConnectionSpec> = specs.into_iter().collect();

        let (generation, tasks) = {
            let mut registry = self.inner.registry.lock();
            if registry.state != HubState::Idle {
                return Err(HubError::InvalidState {
                    operation: "init",
                    state: registry.state.name(),
                });
            }

            let tasks = self.plan(specs, &registry)?;
            registry.state = HubState::Connecting;
            registry.generation += 1;
            (registry.generation, tasks)
        };

        info!(connections = tasks.len(), generation, "Initializing connections");

        let mut pending = FuturesUnordered::new();
        for task in tasks {
            let inner = self.inner.clone();
            let backend = task.backend;
            let label = task.label.clone();
            let handle = tokio::spawn(async move { inner.connect(task, generation).await });
            pending.push(async move { (backend, label, handle.await) });
        }

        while let Some((backend, label, joined)) = pending.next().await {
            let result = joined.unwrap_or_else(|e| Err(HubError::connection(backend, label, e)));
            if let Err(err) = result {
                error!(backend = %backend, error = %err, "Connection init failed");
                return Err(err);
            }
        }

        let mut registry = self.inner.registry.lock();
        if registry.generation == generation && registry.state == HubState::Connecting {
            registry.state = HubState::Ready;
            info!(aliases = registry.aliases.len(), "Connections initialized");
        }
        Ok(())
    }

    /// Disconnect every registered client and clear the registry.
    ///
    /// Never fails. Disconnect errors are logged and collected in the report;
    /// the registry is empty and `Idle` afterwards regardless.
    pub async fn close(&self) -> CloseReport {
        let (generation, clients) = {
            let mut registry = self.inner.registry.lock();
            registry.state = HubState::Closing;
            registry.generation += 1;
            registry.aliases.clear();
            let clients = std::mem::take(&mut registry.clients);
            (registry.generation, clients)
        };

        debug!(clients = clients.len(), "Closing connections");

        let outcomes = join_all(clients.into_values().map(|client| async move {
            let result = client.client.disconnect().await;
            (client, result)
        }))
        .await;

        let mut report = CloseReport::default();
        for (client, result) in outcomes {
            match result {
                Ok(()) => {
                    info!(backend = %client.backend, client = %client.name, "Connection closed");
                    report.closed.push(client.name);
                }
                Err(err) => {
                    error!(
                        backend = %client.backend,
                        client = %client.name,
                        error = %err,
                        "Error closing connection"
                    );
                    report.failures.push(CloseFailure {
                        backend: client.backend,
                        client: client.name,
                        aliases: client.aliases,
                        error: err,
                    });
                }
            }
        }

        let mut registry = self.inner.registry.lock();
        if registry.generation == generation {
            registry.state = HubState::Idle;
        }
        report
    }

    /// Registered aliases in registration order.
    pub fn aliases(&self) -> Vec<String> {
        self.inner.registry.lock().aliases.keys().cloned().collect()
    }

    /// Look up a handle by alias.
    pub fn get(&self, alias: &str) -> Option<NamedHandle> {
        self.inner.registry.lock().aliases.get(alias).cloned()
    }

    /// Look up a handle by alias and downcast it to `T`.
    pub fn handle<T: std::any::Any + Send + Sync>(&self, alias: &str) -> Option<Arc<T>> {
        self.get(alias).and_then(|named| named.handle.downcast::<T>())
    }

    /// Check whether an alias is registered.
    pub fn contains(&self, alias: &str) -> bool {
        self.inner.registry.lock().aliases.contains_key(alias)
    }

    /// Registered clients in registration order.
    pub fn clients(&self) -> Vec<ClientInfo> {
        self.inner
            .registry
            .lock()
            .clients
            .values()
            .map(|client| ClientInfo {
                backend: client.backend,
                name: client.name.clone(),
                aliases: client.aliases.clone(),
            })
            .collect()
    }

    /// Number of registered aliases.
    pub fn len(&self) -> usize {
        self.inner.registry.lock().aliases.len()
    }

    /// Check whether no alias is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate the specs and pick a connector for each, mapper first,
    /// then document, relational and key-value entries.
    fn plan(&self, specs: Vec<ConnectionSpec>, live: &Registry) -> HubResult<Vec<ConnectTask>> {
        let separator = self.inner.options.separator.as_str();

        let mut primary: Option<ConnectionSpec> = None;
        let mut rest = Vec::with_capacity(specs.len());
        for spec in specs {
            spec.validate()?;
            if !spec.is_primary_driver {
                rest.push(spec);
            } else if primary.is_some() {
                return Err(HubError::config(
                    "only one primary-driver connection is allowed per init",
                ));
            } else {
                primary = Some(spec);
            }
        }

        let mut planned: Vec<(ConnectTask, ConnectionUri)> = Vec::new();

        if let Some(spec) = primary {
            let connector = self.inner.mapper_connector()?;
            let uri = ConnectionUri::parse(&spec.connection_string)?;
            if uri.backend() != Backend::Document {
                return Err(HubError::config(format!(
                    "primary-driver connections need a document-store connection string, got '{}'",
                    uri.scheme.name()
                )));
            }
            planned.push((ConnectTask::new(connector, Backend::Mapper, spec, &uri), uri));
        }

        let mut parsed = rest
            .into_iter()
            .map(|spec| ConnectionUri::parse(&spec.connection_string).map(|uri| (spec, uri)))
            .collect::<HubResult<Vec<_>>>()?;
        parsed.sort_by_key(|(_, uri)| initiation_rank(uri.backend()));

        for (spec, uri) in parsed {
            let backend = uri.backend();
            let connector = self.inner.connectors.get(&backend).cloned().ok_or_else(|| {
                HubError::config(format!(
                    "no connector registered for '{}' connection strings",
                    uri.scheme.name()
                ))
            })?;
            planned.push((ConnectTask::new(connector, backend, spec, &uri), uri));
        }

        let mut seen_aliases: HashSet<String> = HashSet::new();
        let mut seen_clients: HashSet<(Backend, String)> = HashSet::new();
        for (task, uri) in &planned {
            // A secret may replace the URI's database, so names derived from
            // it are only checked at registration.
            let secret = task.spec.secret_id.is_some();

            if !(secret && task.spec.name.is_none()) {
                for alias in task.connector.plan_aliases(&task.spec, uri, separator)? {
                    if live.aliases.contains_key(&alias) || !seen_aliases.insert(alias.clone()) {
                        return Err(HubError::DuplicateAlias {
                            backend: task.backend,
                            alias,
                        });
                    }
                }
            }

            if secret && !matches!(task.spec.name, Some(NameSpec::Single(_))) {
                continue;
            }
            if let Some(client) = task.connector.plan_client(&task.spec, uri, separator)? {
                let key = (task.backend, client);
                if live.clients.contains_key(&key) || !seen_clients.insert(key.clone()) {
                    return Err(HubError::DuplicateClient {
                        backend: task.backend,
                        client: key.1,
                    });
                }
            }
        }

        Ok(planned.into_iter().map(|(task, _)| task).collect())
    }
}

impl fmt::Debug for ConnectionHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.registry.lock();
        f.debug_struct("ConnectionHub")
            .field("state", &registry.state)
            .field("aliases", &registry.aliases.keys().collect::<Vec<_>>())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn initiation_rank(backend: Backend) -> u8 {
    match backend {
        Backend::Mapper => 0,
        Backend::Document => 1,
        Backend::Relational => 2,
        Backend::KeyValue => 3,
    }
}

impl ConnectTask {
    fn new(
        connector: Arc<dyn Connector>,
        backend: Backend,
        spec: ConnectionSpec,
        uri: &ConnectionUri,
    ) -> Self {
        let label = spec
            .primary_name()
            .map(str::to_string)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| {
                if uri.default_name.is_empty() {
                    uri.host.clone()
                } else {
                    uri.default_name.clone()
                }
            });
        Self {
            connector,
            spec,
            backend,
            label,
        }
    }
}

impl HubInner {
    fn mapper_connector(&self) -> HubResult<Arc<dyn Connector>> {
        if let Some(connector) = self.connectors.get(&Backend::Mapper) {
            return Ok(connector.clone());
        }
        self.options
            .mapper
            .clone()
            .map(|mapper| Arc::new(MapperConnector::new(mapper)) as Arc<dyn Connector>)
            .ok_or(HubError::MissingMapperHandle)
    }

    async fn connect(&self, task: ConnectTask, generation: u64) -> HubResult<()> {
        let uri = ConnectionUri::resolve(&task.spec, self.secrets.as_deref()).await?;
        debug!(backend = %task.backend, name = %task.label, uri = %uri.redacted(), "Connecting");

        let request = ConnectRequest {
            spec: task.spec,
            uri,
            separator: self.options.separator.clone(),
            connect_timeout: self.options.connect_timeout,
        };
        let live = task.connector.connect(request).await?;

        match self.register(live, generation) {
            Ok(()) => Ok(()),
            Err(Rejected { error, live }) => {
                discard(live).await;
                Err(error)
            }
        }
    }

    /// Insert a client and all its aliases, or nothing.
    fn register(&self, live: LiveClient, generation: u64) -> Result<(), Rejected> {
        let mut registry = self.registry.lock();

        if registry.generation != generation || registry.state != HubState::Connecting {
            let error = HubError::InvalidState {
                operation: "register",
                state: registry.state.name(),
            };
            return Err(Rejected { error, live });
        }

        let key = (live.backend, live.name.clone());
        if registry.clients.contains_key(&key) {
            let error = HubError::DuplicateClient {
                backend: live.backend,
                client: live.name.clone(),
            };
            return Err(Rejected { error, live });
        }

        let mut seen = HashSet::new();
        let duplicate = live
            .aliases()
            .find(|alias| registry.aliases.contains_key(*alias) || !seen.insert(*alias))
            .map(str::to_string);
        if let Some(alias) = duplicate {
            let error = HubError::DuplicateAlias {
                backend: live.backend,
                alias,
            };
            return Err(Rejected { error, live });
        }

        let LiveClient {
            backend,
            name,
            client,
            handles,
        } = live;
        let aliases: Vec<String> = handles.iter().map(|h| h.alias.clone()).collect();
        for handle in handles {
            registry.aliases.insert(handle.alias.clone(), handle);
        }
        info!(backend = %backend, client = %name, aliases = ?aliases, "Connection registered");
        registry.clients.insert(
            key,
            RegisteredClient {
                backend,
                name,
                client,
                aliases,
            },
        );
        Ok(())
    }
}

/// Disconnect a client the registry refused.
async fn discard(live: LiveClient) {
    warn!(backend = %live.backend, client = %live.name, "Disconnecting unregistered client");
    if let Err(err) = live.client.disconnect().await {
        error!(
            backend = %live.backend,
            client = %live.name,
            error = %err,
            "Error closing connection"
        );
    }
}

/// Builder for [`ConnectionHub`].
#[derive(Default)]
pub struct ConnectionHubBuilder {
    connectors: HashMap<Backend, Arc<dyn Connector>>,
    secrets: Option<Arc<SecretResolver>>,
    options: HubOptions,
}

impl ConnectionHubBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the connector for its backend, replacing any previous one.
    pub fn connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connectors
            .insert(connector.backend(), Arc::new(connector));
        self
    }

    /// Register a shared connector.
    pub fn connector_arc(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connectors.insert(connector.backend(), connector);
        self
    }

    /// Set the secret resolver used for specs with a secret id.
    pub fn secrets(mut self, secrets: SecretResolver) -> Self {
        self.secrets = Some(Arc::new(secrets));
        self
    }

    /// Replace all options.
    pub fn options(mut self, options: HubOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the alias separator.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.options.separator = separator.into();
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    /// Set the mapper for primary-driver specs.
    pub fn mapper(mut self, mapper: Arc<dyn Mapper>) -> Self {
        self.options.mapper = Some(mapper);
        self
    }

    /// Build the hub.
    pub fn build(self) -> ConnectionHub {
        ConnectionHub {
            inner: Arc::new(HubInner {
                connectors: self.connectors,
                secrets: self.secrets,
                options: self.options,
                registry: Mutex::new(Registry::new()),
            }),
        }
    }
}
