//! Secret lookup for connection credentials.
//!
//! A [`SecretResolver`] fronts a [`SecretStore`] (AWS Secrets Manager in
//! production, an in-memory map in tests). The store client can be created
//! lazily: the factory runs on the first lookup and its result is reused for
//! every later one.
//!
//! Payloads are parsed as JSON when possible. A payload that is not valid
//! JSON is returned as [`SecretValue::Plain`]; only store failures are errors.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::{BoxError, HubError, HubResult};

/// Source of raw secret payloads.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the string payload of a secret.
    async fn secret_string(&self, secret_id: &str) -> Result<String, BoxError>;
}

/// A parsed secret payload.
#[derive(Clone, PartialEq)]
pub enum SecretValue {
    /// The payload was valid JSON.
    Structured(Value),
    /// The payload was not JSON and is kept verbatim.
    Plain(String),
}

impl SecretValue {
    /// Parse a raw payload. Never fails.
    pub fn parse(raw: String) -> Self {
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Self::Structured(value),
            Err(_) => Self::Plain(raw),
        }
    }

    /// String field of a structured object payload.
    pub fn field(&self, key: &str) -> Option<&str> {
        match self {
            Self::Structured(Value::Object(map)) => map.get(key).and_then(Value::as_str),
            _ => None,
        }
    }

    /// Whether the payload is a JSON object.
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Structured(Value::Object(_)))
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured(_) => f.write_str("SecretValue::Structured([REDACTED])"),
            Self::Plain(_) => f.write_str("SecretValue::Plain([REDACTED])"),
        }
    }
}

type StoreFactory =
    Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn SecretStore>, BoxError>> + Send + Sync>;

/// Resolves secrets through a lazily created store.
pub struct SecretResolver {
    store: OnceCell<Arc<dyn SecretStore>>,
    factory: Option<StoreFactory>,
}

impl SecretResolver {
    /// Create a resolver over an existing store.
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self {
            store: OnceCell::new_with(Some(store)),
            factory: None,
        }
    }

    /// Create a resolver whose store is built on first use.
    ///
    /// A factory error fails that lookup only; the next lookup runs the
    /// factory again.
    pub fn lazy<F, Fut>(make_store: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Arc<dyn SecretStore>, BoxError>> + Send + 'static,
    {
        let factory: StoreFactory = Box::new(move || make_store().boxed());
        Self {
            store: OnceCell::new(),
            factory: Some(factory),
        }
    }

    /// Whether the store client has been created.
    pub fn is_initialized(&self) -> bool {
        self.store.initialized()
    }

    async fn store(&self, secret_id: &str) -> HubResult<&Arc<dyn SecretStore>> {
        self.store
            .get_or_try_init(|| async {
                let factory = self.factory.as_ref().ok_or_else(|| HubError::SecretStore {
                    secret_id: secret_id.to_string(),
                    source: "no secret store configured".into(),
                })?;
                debug!("Creating secret store client");
                factory().await.map_err(|source| HubError::SecretStore {
                    secret_id: secret_id.to_string(),
                    source,
                })
            })
            .await
    }

    /// Fetch and parse a secret.
    pub async fn get_secret(&self, secret_id: &str) -> HubResult<SecretValue> {
        let store = self.store(secret_id).await?;
        debug!(secret_id = %secret_id, "Fetching secret");
        let raw = store
            .secret_string(secret_id)
            .await
            .map_err(|source| HubError::SecretStore {
                secret_id: secret_id.to_string(),
                source,
            })?;
        Ok(SecretValue::parse(raw))
    }
}

impl fmt::Debug for SecretResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretResolver")
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

/// In-memory secret store.
#[derive(Debug, Clone, Default)]
pub struct MapSecretStore {
    secrets: HashMap<String, String>,
}

impl MapSecretStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret payload.
    pub fn with_secret(mut self, secret_id: impl Into<String>, payload: impl Into<String>) -> Self {
        self.secrets.insert(secret_id.into(), payload.into());
        self
    }
}

#[async_trait]
impl SecretStore for MapSecretStore {
    async fn secret_string(&self, secret_id: &str) -> Result<String, BoxError> {
        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| format!("secret '{}' not found", secret_id).into())
    }
}
