//! Native MongoDB connector.

use async_trait::async_trait;
use bson::doc;
use dbhub_core::{
    Backend, BoxError, ConnectRequest, ConnectionSpec, ConnectionUri, Connector, Disconnect,
    DocumentNames, Handle, HandleKind, HubError, HubResult, LiveClient, NamedHandle,
    defer_missing_name,
};
use mongodb::Client;
use tracing::{debug, info};

use crate::config::MongoDriverOptions;

/// Connector for `mongodb://` and `mongodb+srv://` entries.
///
/// Each entry opens one client. Every database named by the entry is
/// exposed as a [`mongodb::Database`] handle on that client.
#[derive(Debug, Clone, Default)]
pub struct MongoConnector {
    defaults: MongoDriverOptions,
}

impl MongoConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a connector whose options apply to every entry unless the
    /// entry's `driverOptions` override them.
    pub fn with_defaults(defaults: MongoDriverOptions) -> Self {
        Self { defaults }
    }
}

/// Shared client of one entry.
struct MongoClientHandle {
    client: Client,
}

#[async_trait]
impl Disconnect for MongoClientHandle {
    async fn disconnect(&self) -> Result<(), BoxError> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}

#[async_trait]
impl Connector for MongoConnector {
    fn backend(&self) -> Backend {
        Backend::Document
    }

    fn plan_aliases(
        &self,
        spec: &ConnectionSpec,
        uri: &ConnectionUri,
        separator: &str,
    ) -> HubResult<Vec<String>> {
        let planned = DocumentNames::resolve(spec, uri, separator).map(|names| names.aliases());
        defer_missing_name(spec, planned)
    }

    fn plan_client(
        &self,
        spec: &ConnectionSpec,
        uri: &ConnectionUri,
        separator: &str,
    ) -> HubResult<Option<String>> {
        let planned = DocumentNames::resolve(spec, uri, separator).map(|names| vec![names.client]);
        Ok(defer_missing_name(spec, planned)?.into_iter().next())
    }

    async fn connect(&self, request: ConnectRequest) -> HubResult<LiveClient> {
        let names = DocumentNames::resolve(&request.spec, &request.uri, &request.separator)?;
        let driver_options = MongoDriverOptions::from_value(request.spec.driver_options.as_ref())?
            .or(&self.defaults);
        let fail = |e: mongodb::error::Error| HubError::connection(Backend::Document, &names.client, e);

        let options = driver_options
            .client_options(&request.uri.render())
            .await
            .map_err(fail)?;
        let client = Client::with_options(options).map_err(fail)?;

        debug!(client = %names.client, host = %request.uri.host, "Pinging MongoDB");
        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(fail)?;

        info!(
            client = %names.client,
            host = %request.uri.host,
            databases = names.databases.len(),
            "MongoDB connection OK"
        );

        let mut live = LiveClient::new(
            Backend::Document,
            names.client.clone(),
            Box::new(MongoClientHandle {
                client: client.clone(),
            }),
        );
        for (i, db) in names.databases.iter().enumerate() {
            let kind = if i == 0 {
                HandleKind::Document
            } else {
                HandleKind::DocumentSecondary
            };
            live = live.with_handle(NamedHandle::new(
                db.alias.clone(),
                kind,
                names.client.clone(),
                Handle::new(client.database(&db.database)),
            ));
        }
        Ok(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plan(spec: &ConnectionSpec) -> HubResult<Vec<String>> {
        let uri = ConnectionUri::parse(&spec.connection_string).unwrap();
        MongoConnector::new().plan_aliases(spec, &uri, ":")
    }

    #[test]
    fn test_plan_aliases() {
        let spec = ConnectionSpec::new("mongodb://localhost/wtb").names(["wtb:main", "catalog"]);
        assert_eq!(plan(&spec).unwrap(), vec!["main", "catalog"]);

        let spec = ConnectionSpec::new("mongodb+srv://cluster0.example.net/wtb");
        assert_eq!(plan(&spec).unwrap(), vec!["wtb"]);
    }

    #[test]
    fn test_plan_client() {
        let connector = MongoConnector::new();
        let client = |spec: &ConnectionSpec| {
            let uri = ConnectionUri::parse(&spec.connection_string).unwrap();
            connector.plan_client(spec, &uri, ":")
        };

        let spec = ConnectionSpec::new("mongodb://localhost/wtb").names(["wtb:main", "catalog"]);
        assert_eq!(client(&spec).unwrap().as_deref(), Some("wtb"));

        let spec = ConnectionSpec::new("mongodb://localhost/wtb").name("wtb:main");
        assert_eq!(client(&spec).unwrap().as_deref(), Some("wtb:main"));

        let spec = ConnectionSpec::new("mongodb://localhost").secret("mongo-creds");
        assert_eq!(client(&spec).unwrap(), None);
    }

    #[test]
    fn test_plan_missing_name() {
        let spec = ConnectionSpec::new("mongodb://localhost:27017");
        assert!(plan(&spec).unwrap_err().is_missing_database_name());

        let spec = spec.secret("mongo-creds");
        assert!(plan(&spec).unwrap().is_empty());
    }
}
