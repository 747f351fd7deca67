//! Hub options and file-based configuration.
//!
//! A configuration file lists the connections and the options of one hub:
//!
//! ```toml
//! separator = ":"
//! connect_timeout_secs = 60
//!
//! [[connections]]
//! connectionString = "mongodb://${MONGO_HOST:-localhost:27017}/wtb"
//! name = ["wtb", "catalog"]
//!
//! [[connections]]
//! connectionString = "mysql://cms@mysql.internal/cms"
//! name = "stg_cms"
//! secretId = "stg-mysql-cms"
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::env::{EnvExpander, EnvSource};
use crate::error::{HubError, HubResult};
use crate::mapper::Mapper;
use crate::spec::ConnectionSpec;

/// Default separator between database name and alias.
pub const DEFAULT_SEPARATOR: &str = ":";

/// Default connect timeout for connectors that race their handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Options applied to every `init` of a hub.
#[derive(Clone)]
pub struct HubOptions {
    /// Separator used to split `<db><separator><alias>` names.
    pub separator: String,
    /// Timeout of the mapper handshake.
    pub connect_timeout: Duration,
    /// Mapper used for the primary-driver entry.
    pub mapper: Option<Arc<dyn Mapper>>,
}

impl Default for HubOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            mapper: None,
        }
    }
}

impl HubOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the alias separator.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the mapper.
    pub fn mapper(mut self, mapper: Arc<dyn Mapper>) -> Self {
        self.mapper = Some(mapper);
        self
    }
}

impl fmt::Debug for HubOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubOptions")
            .field("separator", &self.separator)
            .field("connect_timeout", &self.connect_timeout)
            .field("mapper", &self.mapper.is_some())
            .finish()
    }
}

/// Hub configuration loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubConfig {
    /// Separator between database name and alias.
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Configured connections.
    #[serde(default)]
    pub connections: Vec<ConnectionSpec>,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            connect_timeout_secs: default_connect_timeout_secs(),
            connections: Vec::new(),
        }
    }
}

impl HubConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(input: &str) -> HubResult<Self> {
        toml::from_str(input).map_err(|e| HubError::config(format!("invalid TOML: {}", e)))
    }

    /// Load a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> HubResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            HubError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!(
            path = %path.display(),
            connections = config.connections.len(),
            "Hub configuration loaded"
        );
        Ok(config)
    }

    /// Options described by this configuration.
    pub fn options(&self) -> HubOptions {
        HubOptions::new()
            .separator(self.separator.clone())
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
    }

    /// Connection specs with environment references expanded.
    pub fn specs(&self) -> HubResult<Vec<ConnectionSpec>> {
        self.specs_with(&EnvExpander::new())
    }

    /// Connection specs expanded against a custom environment.
    pub fn specs_with<S: EnvSource>(
        &self,
        expander: &EnvExpander<S>,
    ) -> HubResult<Vec<ConnectionSpec>> {
        self.connections
            .iter()
            .map(|spec| {
                let mut spec = spec.clone();
                spec.connection_string = expander.expand(&spec.connection_string)?;
                if let Some(secret_id) = &spec.secret_id {
                    spec.secret_id = Some(expander.expand(secret_id)?);
                }
                Ok(spec)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnvSource;
    use crate::spec::NameSpec;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
        separator = "/"

        [[connections]]
        connectionString = "mongodb://${MONGO_HOST:-localhost:27017}/wtb"
        name = ["wtb/foo", "affiliate"]

        [[connections]]
        connectionString = "redis://${REDIS_HOST}"
        name = "cache"

        [[connections]]
        connectionString = "mongodb://mongo.internal/main"
        name = "main"
        mongoose = true
        secret = "prd-${STAGE}-mongo"
    "#;

    #[test]
    fn test_defaults() {
        let config = HubConfig::from_toml_str("").unwrap();
        assert_eq!(config, HubConfig::default());
        assert_eq!(config.options().separator, ":");
        assert_eq!(config.options().connect_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_parse_sample() {
        let config = HubConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.separator, "/");
        assert_eq!(config.connections.len(), 3);
        assert_eq!(
            config.connections[0].name,
            Some(NameSpec::Many(vec!["wtb/foo".into(), "affiliate".into()]))
        );
        assert!(config.connections[2].is_primary_driver);
    }

    #[test]
    fn test_specs_expand_environment() {
        let config = HubConfig::from_toml_str(SAMPLE).unwrap();
        let env = EnvExpander::with_source(
            MapEnvSource::new()
                .set("REDIS_HOST", "cache.internal:6379")
                .set("STAGE", "eu"),
        );
        let specs = config.specs_with(&env).unwrap();
        assert_eq!(specs[0].connection_string, "mongodb://localhost:27017/wtb");
        assert_eq!(specs[1].connection_string, "redis://cache.internal:6379");
        assert_eq!(specs[2].secret_id.as_deref(), Some("prd-eu-mongo"));
    }

    #[test]
    fn test_specs_missing_variable() {
        let config = HubConfig::from_toml_str(SAMPLE).unwrap();
        let env = EnvExpander::with_source(MapEnvSource::new());
        assert!(config.specs_with(&env).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbhub.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = HubConfig::from_file(&path).unwrap();
        assert_eq!(config.connections.len(), 3);

        assert!(HubConfig::from_file(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_primary_driver_table() {
        let config = HubConfig::from_toml_str(
            r#"
            [[connections]]
            connectionString = "mongodb://mongo.internal/main"
            mongoose = { appName = "api", serverSelectionTimeoutMs = 500 }
            "#,
        )
        .unwrap();

        let spec = &config.connections[0];
        assert!(spec.is_primary_driver);
        assert_eq!(
            spec.driver_options,
            Some(serde_json::json!({ "appName": "api", "serverSelectionTimeoutMs": 500 }))
        );
    }

    #[test]
    fn test_invalid_toml() {
        assert!(HubConfig::from_toml_str("connections = 3").is_err());
    }
}
