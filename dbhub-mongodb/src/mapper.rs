//! A [`Mapper`] over the MongoDB driver.
//!
//! Used for primary-driver entries when no external object mapper is
//! supplied. The opened handle is the connection string's default
//! [`mongodb::Database`].

use async_trait::async_trait;
use bson::doc;
use dbhub_core::{BoxError, Handle, Mapper};
use mongodb::Client;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::MongoDriverOptions;

/// Mapper that owns one MongoDB client at a time.
#[derive(Default)]
pub struct MongoMapper {
    defaults: MongoDriverOptions,
    client: Mutex<Option<Client>>,
}

impl MongoMapper {
    /// Create a mapper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mapper with default driver options.
    pub fn with_defaults(defaults: MongoDriverOptions) -> Self {
        Self {
            defaults,
            client: Mutex::new(None),
        }
    }

    /// Whether the mapper currently holds an open client.
    pub fn is_open(&self) -> bool {
        self.client.lock().is_some()
    }
}

#[async_trait]
impl Mapper for MongoMapper {
    async fn open(&self, uri: &str, options: Option<&Value>) -> Result<Handle, BoxError> {
        let driver_options = MongoDriverOptions::from_value(options)?.or(&self.defaults);
        let client = Client::with_options(driver_options.client_options(uri).await?)?;

        let database = client
            .default_database()
            .ok_or("connection string names no database")?;
        database.run_command(doc! { "ping": 1 }, None).await?;
        info!(database = %database.name(), "MongoDB mapper connection open");

        if let Some(previous) = self.client.lock().replace(client) {
            debug!("Replacing previous mapper client");
            drop(previous);
        }
        Ok(Handle::new(database))
    }

    async fn disconnect(&self) -> Result<(), BoxError> {
        let client = self.client.lock().take();
        if let Some(client) = client {
            client.shutdown().await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_requires_database() {
        let mapper = MongoMapper::new();
        let err = mapper.open("mongodb://localhost:27017", None).await.unwrap_err();
        assert!(err.to_string().contains("no database"));
        assert!(!mapper.is_open());
    }

    #[tokio::test]
    async fn test_disconnect_without_client() {
        let mapper = MongoMapper::new();
        mapper.disconnect().await.unwrap();
        assert!(!mapper.is_open());
    }
}
