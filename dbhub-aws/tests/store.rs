//! Store tests against an endpoint that refuses connections.

use std::sync::Arc;

use dbhub_aws::AwsSecretStore;
use dbhub_core::{SecretResolver, SecretStore};
use pretty_assertions::assert_eq;

async fn offline_store() -> AwsSecretStore {
    AwsSecretStore::builder()
        .region("eu-west-1")
        .endpoint_url("http://127.0.0.1:1")
        .credentials("AKIDEXAMPLE", "not-a-secret")
        .build()
        .await
}

#[tokio::test]
async fn test_builder_region() {
    let store = offline_store().await;
    assert_eq!(store.region(), Some("eu-west-1"));
    assert!(format!("{:?}", store).contains("eu-west-1"));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_store_error() {
    let resolver = SecretResolver::new(Arc::new(offline_store().await) as Arc<dyn SecretStore>);
    let err = resolver.get_secret("prod/mongo").await.unwrap_err();
    assert!(err.is_secret_error());
}
