//! # dbhub-aws
//!
//! [`SecretStore`] backed by AWS Secrets Manager.
//!
//! Credentials and region come from the standard AWS chain (environment,
//! profiles, IMDS, ECS) unless set on the builder.
//!
//! ```rust,ignore
//! use dbhub_aws::AwsSecretStore;
//! use dbhub_core::ConnectionHub;
//!
//! let hub = ConnectionHub::builder()
//!     .secrets(AwsSecretStore::lazy_resolver())
//!     .build();
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::config::Credentials;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use dbhub_core::{BoxError, SecretResolver, SecretStore};
use tracing::debug;

/// Secret store over the Secrets Manager `GetSecretValue` call.
#[derive(Clone)]
pub struct AwsSecretStore {
    client: Client,
}

impl AwsSecretStore {
    /// Build a store from the default AWS configuration.
    pub async fn from_env() -> Self {
        Self::builder().build().await
    }

    /// Start building a store.
    pub fn builder() -> AwsSecretStoreBuilder {
        AwsSecretStoreBuilder::default()
    }

    /// Wrap an existing client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Resolver that creates the store on the first secret lookup.
    pub fn lazy_resolver() -> SecretResolver {
        SecretResolver::lazy(|| async {
            let store: Arc<dyn SecretStore> = Arc::new(Self::from_env().await);
            Ok(store)
        })
    }

    /// Region the client is configured for.
    pub fn region(&self) -> Option<&str> {
        self.client.config().region().map(|r| r.as_ref())
    }
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    async fn secret_string(&self, secret_id: &str) -> Result<String, BoxError> {
        debug!(secret_id = %secret_id, "GetSecretValue");
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| DisplayErrorContext(e).to_string())?;

        output
            .secret_string
            .ok_or_else(|| format!("secret '{}' has no string payload", secret_id).into())
    }
}

impl fmt::Debug for AwsSecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsSecretStore")
            .field("region", &self.region())
            .finish_non_exhaustive()
    }
}

/// Builder for [`AwsSecretStore`].
#[derive(Debug, Default)]
pub struct AwsSecretStoreBuilder {
    region: Option<String>,
    endpoint_url: Option<String>,
    credentials: Option<(String, String)>,
}

impl AwsSecretStoreBuilder {
    /// Set the region instead of taking it from the environment.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Override the endpoint URL (VPC endpoints, LocalStack).
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Use static credentials instead of the default chain.
    pub fn credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.credentials = Some((access_key_id.into(), secret_access_key.into()));
        self
    }

    /// Load the AWS configuration and build the store.
    pub async fn build(self) -> AwsSecretStore {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = self.region {
            loader = loader.region(Region::new(region));
        }
        if let Some(endpoint) = self.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        if let Some((key, secret)) = self.credentials {
            loader = loader.credentials_provider(Credentials::new(key, secret, None, None, "dbhub"));
        }

        let config = loader.load().await;
        AwsSecretStore::from_client(Client::new(&config))
    }
}
