//! Facade wiring tests. None of these need a running database.

#![cfg(all(feature = "mongodb", feature = "mysql", feature = "redis"))]

use std::time::Duration;

use dbhub::prelude::*;
use pretty_assertions::assert_eq;

const CONFIG: &str = r#"
separator = "/"
connect_timeout_secs = 5

[[connections]]
connectionString = "redis://127.0.0.1:1"
name = "cache"

[[connections]]
connectionString = "redis://127.0.0.1:1/3"
name = "sessions"
"#;

#[tokio::test]
async fn test_builder_from_config() {
    let config = HubConfig::from_toml_str(CONFIG).unwrap();
    let hub = dbhub::builder_from_config(&config).build();

    assert_eq!(hub.options().separator, "/");
    assert_eq!(hub.options().connect_timeout, Duration::from_secs(5));

    hub.init(config.specs().unwrap()).await.unwrap();
    assert_eq!(hub.aliases(), vec!["cache", "sessions"]);
    assert!(hub.redis("sessions").is_some());

    let report = hub.close().await;
    assert!(report.is_clean());
    assert_eq!(report.closed.len(), 2);
    assert!(hub.is_empty());
}

#[tokio::test]
async fn test_every_scheme_has_a_connector() {
    let hub = dbhub::hub_builder().build();

    for uri in ["mongodb://127.0.0.1:1", "mongodb+srv://cluster0.example.net", "mysql://127.0.0.1:1"] {
        let err = hub.init([ConnectionSpec::new(uri)]).await.unwrap_err();
        assert!(err.is_missing_database_name(), "{}: {}", uri, err);
        assert_eq!(hub.state(), HubState::Idle);
    }
}

#[tokio::test]
async fn test_unsupported_scheme() {
    let err = dbhub::hub_builder()
        .build()
        .init([ConnectionSpec::new("postgres://localhost/app").name("app")])
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::InvalidConnectionString { .. }));
}

#[tokio::test]
async fn test_primary_driver_needs_mapper() {
    let err = dbhub::hub_builder()
        .build()
        .init([ConnectionSpec::new("mongodb://127.0.0.1:1/wtb").primary_driver(true)])
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::MissingMapperHandle));
}

#[tokio::test]
async fn test_duplicate_alias_across_backends() {
    let hub = dbhub::hub_builder().build();
    let err = hub
        .init([
            ConnectionSpec::new("mysql://127.0.0.1:1/cms").name("shared"),
            ConnectionSpec::new("redis://127.0.0.1:1").name("shared"),
        ])
        .await
        .unwrap_err();

    assert!(err.is_duplicate_alias());
    assert!(hub.aliases().is_empty());
}
