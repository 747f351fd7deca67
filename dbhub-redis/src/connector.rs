//! Redis connector.

use async_trait::async_trait;
use dbhub_core::{
    Backend, ConnectRequest, ConnectionUri, Connector, Handle, HandleKind, HubError, HubResult,
    LiveClient, NamedHandle, single_alias,
};
use tracing::debug;

use crate::client::RedisClient;

/// Connector for `redis://` entries.
///
/// The entry resolves as soon as the client is created; the connection is
/// opened in the background and its errors are only logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisConnector;

impl RedisConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self
    }
}

/// Driver URL for a resolved URI.
///
/// The path part is only kept when it is a database number; any other
/// database name is an alias, not something Redis understands.
pub fn redis_url(uri: &ConnectionUri) -> String {
    let mut url = format!("{}://", uri.scheme.name());
    if !uri.username.is_empty() || !uri.password.is_empty() {
        url.push_str(&uri.username);
        url.push(':');
        url.push_str(&uri.password);
        url.push('@');
    }
    url.push_str(&uri.host);
    if uri.default_name.parse::<u16>().is_ok() {
        url.push('/');
        url.push_str(&uri.default_name);
    }
    if !uri.query_options.is_empty() {
        url.push('?');
        url.push_str(&uri.query_options);
    }
    url
}

#[async_trait]
impl Connector for RedisConnector {
    fn backend(&self) -> Backend {
        Backend::KeyValue
    }

    async fn connect(&self, request: ConnectRequest) -> HubResult<LiveClient> {
        let alias = single_alias(Backend::KeyValue, &request.spec, &request.uri)?;
        let url = redis_url(&request.uri);
        let client = redis::Client::open(url.as_str())
            .map_err(|e| HubError::invalid_connection_string(&url, e.to_string()))?;

        let client = RedisClient::new(alias.clone(), client);
        client.spawn_probe();
        debug!(name = %alias, host = %request.uri.host, "Redis client created");

        Ok(
            LiveClient::new(Backend::KeyValue, alias.clone(), Box::new(client.clone())).with_handle(
                NamedHandle::new(alias.clone(), HandleKind::KeyValue, alias, Handle::new(client)),
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn url(s: &str) -> String {
        redis_url(&ConnectionUri::parse(s).unwrap())
    }

    #[test]
    fn test_redis_url() {
        assert_eq!(url("redis://cache:6379"), "redis://cache:6379");
        assert_eq!(url("redis://cache:6379/2"), "redis://cache:6379/2");
        assert_eq!(url("redis://cache:6379/sessions"), "redis://cache:6379");
        assert_eq!(url("redis://u:pw@cache:6379/0?protocol=resp3"), "redis://u:pw@cache:6379/0?protocol=resp3");
    }

    #[test]
    fn test_redis_url_password_only() {
        let mut uri = ConnectionUri::parse("redis://cache:6379").unwrap();
        uri.password = "from-secret".to_string();
        assert_eq!(redis_url(&uri), "redis://:from-secret@cache:6379");
    }
}
