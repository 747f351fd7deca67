//! Backend connector strategies.
//!
//! A [`Connector`] turns one resolved connection entry into a [`LiveClient`]:
//! the opened client plus every handle it exposes. Connectors never touch the
//! registry; the hub registers what they return.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{HubError, HubResult};
use crate::handle::{Backend, LiveClient};
use crate::spec::{ConnectionSpec, NameSpec};
use crate::uri::ConnectionUri;

/// Everything a connector needs to open one connection.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    /// The configured entry.
    pub spec: ConnectionSpec,
    /// Its resolved URI (secret already applied).
    pub uri: ConnectionUri,
    /// Separator between database name and alias.
    pub separator: String,
    /// Upper bound for connectors that race their handshake.
    pub connect_timeout: Duration,
}

/// Strategy for one backend family.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Backend family served.
    fn backend(&self) -> Backend;

    /// Aliases the entry will register, computed without any I/O.
    ///
    /// Used by the hub to reject collisions before anything connects. An
    /// empty list means the aliases depend on a secret and are only known
    /// after resolution.
    fn plan_aliases(
        &self,
        spec: &ConnectionSpec,
        uri: &ConnectionUri,
        _separator: &str,
    ) -> HubResult<Vec<String>> {
        Ok(plan_single_alias(self.backend(), spec, uri)?
            .into_iter()
            .collect())
    }

    /// Client name the entry will register, computed without any I/O.
    ///
    /// `None` when the name is only known after secret resolution.
    fn plan_client(
        &self,
        spec: &ConnectionSpec,
        uri: &ConnectionUri,
        _separator: &str,
    ) -> HubResult<Option<String>> {
        plan_single_alias(self.backend(), spec, uri)
    }

    /// Open the connection.
    async fn connect(&self, request: ConnectRequest) -> HubResult<LiveClient>;
}

/// Alias of a single-handle entry: its name, else the database in the URI.
pub fn single_alias(
    backend: Backend,
    spec: &ConnectionSpec,
    uri: &ConnectionUri,
) -> HubResult<String> {
    match &spec.name {
        Some(NameSpec::Many(names)) if names.len() > 1 => Err(HubError::config(format!(
            "{} connections accept a single name, got {}",
            backend,
            names.len()
        ))),
        Some(name) => name
            .primary()
            .map(str::to_string)
            .ok_or(HubError::MissingDatabaseName { backend }),
        None if !uri.default_name.is_empty() => Ok(uri.default_name.clone()),
        None => Err(HubError::MissingDatabaseName { backend }),
    }
}

/// Planned aliases, or none when the name is expected from the entry's secret.
///
/// A missing database name is only final for entries without a secret; the
/// secret may still provide `defaultName`.
pub fn defer_missing_name(
    spec: &ConnectionSpec,
    planned: HubResult<Vec<String>>,
) -> HubResult<Vec<String>> {
    match planned {
        Err(HubError::MissingDatabaseName { .. }) if spec.secret_id.is_some() => Ok(Vec::new()),
        other => other,
    }
}

fn plan_single_alias(
    backend: Backend,
    spec: &ConnectionSpec,
    uri: &ConnectionUri,
) -> HubResult<Option<String>> {
    let planned = single_alias(backend, spec, uri).map(|alias| vec![alias]);
    Ok(defer_missing_name(spec, planned)?.into_iter().next())
}

/// A database exposed under an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRef {
    /// Actual database name.
    pub database: String,
    /// Exposed alias.
    pub alias: String,
}

/// Naming of one document-store entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNames {
    /// Name of the shared client.
    pub client: String,
    /// Databases to expose, primary first.
    pub databases: Vec<DatabaseRef>,
}

impl DocumentNames {
    /// Resolve the client name and databases of a document-store entry.
    ///
    /// - no name: the URI database, under its own name
    /// - `"db"`: database `db`
    /// - `"db<sep>alias"`: database `db` exposed as `alias`
    /// - a list: each entry as above, all on one client
    pub fn resolve(
        spec: &ConnectionSpec,
        uri: &ConnectionUri,
        separator: &str,
    ) -> HubResult<Self> {
        let backend = Backend::Document;
        let entries: Vec<&str> = match &spec.name {
            None if uri.default_name.is_empty() => {
                return Err(HubError::MissingDatabaseName { backend });
            }
            None => vec![uri.default_name.as_str()],
            Some(name) => name.names(),
        };

        let client = match &spec.name {
            Some(NameSpec::Single(name)) => name.clone(),
            _ if !uri.default_name.is_empty() => uri.default_name.clone(),
            _ => entries.join(","),
        };

        let databases = entries
            .into_iter()
            .map(|entry| split_alias(entry, separator))
            .collect::<HubResult<Vec<_>>>()?;

        Ok(Self { client, databases })
    }

    /// Exposed aliases in order.
    pub fn aliases(&self) -> Vec<String> {
        self.databases.iter().map(|db| db.alias.clone()).collect()
    }
}

fn split_alias(entry: &str, separator: &str) -> HubResult<DatabaseRef> {
    let (database, alias) = if separator.is_empty() {
        (entry, None)
    } else {
        let mut parts = entry.split(separator);
        (parts.next().unwrap_or_default(), parts.next())
    };

    if database.is_empty() {
        return Err(HubError::config(format!(
            "name '{}' does not start with a database name",
            entry
        )));
    }

    let alias = alias.filter(|a| !a.is_empty()).unwrap_or(database);
    Ok(DatabaseRef {
        database: database.to_string(),
        alias: alias.to_string(),
    })
}
