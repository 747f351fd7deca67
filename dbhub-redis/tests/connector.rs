//! Connector tests that need no running server.

use std::time::Duration;

use dbhub_core::prelude::*;
use dbhub_redis::{RedisConnector, RedisHubExt};

fn hub() -> ConnectionHub {
    ConnectionHub::builder().connector(RedisConnector::new()).build()
}

#[tokio::test]
async fn test_registered_before_connecting() {
    let hub = hub();
    hub.init([ConnectionSpec::new("redis://127.0.0.1:1").name("cache")])
        .await
        .unwrap();

    assert_eq!(hub.state(), HubState::Ready);
    let client = hub.redis("cache").unwrap();
    assert_eq!(client.name(), "cache");

    // The probe fails in the background; nothing surfaces.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!client.is_connected());

    let report = hub.close().await;
    assert!(report.is_clean());
    assert!(hub.redis("cache").is_none());
}

#[tokio::test]
async fn test_missing_name() {
    let err = hub()
        .init([ConnectionSpec::new("redis://127.0.0.1:6379")])
        .await
        .unwrap_err();
    assert!(err.is_missing_database_name());
}

#[tokio::test]
async fn test_invalid_url_rejects() {
    let err = hub()
        .init([ConnectionSpec::new("redis://cache:notaport").name("cache")])
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::InvalidConnectionString { .. }));
}
