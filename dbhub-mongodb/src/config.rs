//! MongoDB driver options.
//!
//! Options come from the `driverOptions` object of a connection entry and
//! are applied on top of whatever the connection string already sets.

use std::time::Duration;

use dbhub_core::{HubError, HubResult};
use mongodb::options::ClientOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MongoDB read preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadPreference {
    /// Read from primary only.
    #[default]
    Primary,
    /// Read from primary preferred, fallback to secondary.
    PrimaryPreferred,
    /// Read from secondary only.
    Secondary,
    /// Read from secondary preferred, fallback to primary.
    SecondaryPreferred,
    /// Read from nearest member.
    Nearest,
}

impl ReadPreference {
    fn to_driver(self) -> mongodb::options::ReadPreference {
        use mongodb::options::ReadPreference as Driver;

        match self {
            Self::Primary => Driver::Primary,
            Self::PrimaryPreferred => Driver::PrimaryPreferred {
                options: Default::default(),
            },
            Self::Secondary => Driver::Secondary {
                options: Default::default(),
            },
            Self::SecondaryPreferred => Driver::SecondaryPreferred {
                options: Default::default(),
            },
            Self::Nearest => Driver::Nearest {
                options: Default::default(),
            },
        }
    }
}

/// Options accepted in `driverOptions` for MongoDB entries.
///
/// Unknown keys are ignored so entries written for other drivers still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MongoDriverOptions {
    /// Application name (shown in server logs).
    pub app_name: Option<String>,
    /// Minimum connection pool size.
    pub min_pool_size: Option<u32>,
    /// Maximum connection pool size.
    pub max_pool_size: Option<u32>,
    /// Maximum idle time for pooled connections, in milliseconds.
    pub max_idle_time_ms: Option<u64>,
    /// Connection timeout, in milliseconds.
    pub connect_timeout_ms: Option<u64>,
    /// Server selection timeout, in milliseconds.
    pub server_selection_timeout_ms: Option<u64>,
    /// Read preference.
    pub read_preference: Option<ReadPreference>,
    /// Retry writes.
    pub retry_writes: Option<bool>,
    /// Retry reads.
    pub retry_reads: Option<bool>,
    /// Direct connection (bypass replica set discovery).
    pub direct_connection: Option<bool>,
}

impl MongoDriverOptions {
    /// Read options from a `driverOptions` value.
    pub fn from_value(value: Option<&Value>) -> HubResult<Self> {
        match value {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| HubError::config(format!("invalid MongoDB driver options: {}", e))),
        }
    }

    /// Fill unset fields from `defaults`.
    pub fn or(self, defaults: &Self) -> Self {
        Self {
            app_name: self.app_name.or_else(|| defaults.app_name.clone()),
            min_pool_size: self.min_pool_size.or(defaults.min_pool_size),
            max_pool_size: self.max_pool_size.or(defaults.max_pool_size),
            max_idle_time_ms: self.max_idle_time_ms.or(defaults.max_idle_time_ms),
            connect_timeout_ms: self.connect_timeout_ms.or(defaults.connect_timeout_ms),
            server_selection_timeout_ms: self
                .server_selection_timeout_ms
                .or(defaults.server_selection_timeout_ms),
            read_preference: self.read_preference.or(defaults.read_preference),
            retry_writes: self.retry_writes.or(defaults.retry_writes),
            retry_reads: self.retry_reads.or(defaults.retry_reads),
            direct_connection: self.direct_connection.or(defaults.direct_connection),
        }
    }

    /// Apply the options to parsed client options.
    pub fn apply(&self, options: &mut ClientOptions) {
        if let Some(ref app_name) = self.app_name {
            options.app_name = Some(app_name.clone());
        }
        if let Some(min_pool) = self.min_pool_size {
            options.min_pool_size = Some(min_pool);
        }
        if let Some(max_pool) = self.max_pool_size {
            options.max_pool_size = Some(max_pool);
        }
        if let Some(ms) = self.max_idle_time_ms {
            options.max_idle_time = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = self.connect_timeout_ms {
            options.connect_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = self.server_selection_timeout_ms {
            options.server_selection_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(read_pref) = self.read_preference {
            options.selection_criteria = Some(mongodb::options::SelectionCriteria::ReadPreference(
                read_pref.to_driver(),
            ));
        }
        if let Some(retry_writes) = self.retry_writes {
            options.retry_writes = Some(retry_writes);
        }
        if let Some(retry_reads) = self.retry_reads {
            options.retry_reads = Some(retry_reads);
        }
        if let Some(direct) = self.direct_connection {
            options.direct_connection = Some(direct);
        }
    }

    /// Parse a connection string and apply the options.
    pub async fn client_options(&self, uri: &str) -> Result<ClientOptions, mongodb::error::Error> {
        let mut options = ClientOptions::parse(uri).await?;
        self.apply(&mut options);
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_value() {
        let options = MongoDriverOptions::from_value(Some(&json!({
            "appName": "wtb-api",
            "maxPoolSize": 20,
            "serverSelectionTimeoutMs": 500,
            "readPreference": "secondaryPreferred",
            "useUnifiedTopology": true
        })))
        .unwrap();

        assert_eq!(options.app_name.as_deref(), Some("wtb-api"));
        assert_eq!(options.max_pool_size, Some(20));
        assert_eq!(options.server_selection_timeout_ms, Some(500));
        assert_eq!(options.read_preference, Some(ReadPreference::SecondaryPreferred));
    }

    #[test]
    fn test_from_value_absent_or_invalid() {
        assert_eq!(
            MongoDriverOptions::from_value(None).unwrap(),
            MongoDriverOptions::default()
        );
        assert!(MongoDriverOptions::from_value(Some(&json!({ "maxPoolSize": "many" }))).is_err());
    }

    #[test]
    fn test_or_prefers_entry_values() {
        let defaults = MongoDriverOptions {
            app_name: Some("dbhub".into()),
            max_pool_size: Some(10),
            ..Default::default()
        };
        let entry = MongoDriverOptions {
            max_pool_size: Some(50),
            ..Default::default()
        };
        let merged = entry.or(&defaults);
        assert_eq!(merged.app_name.as_deref(), Some("dbhub"));
        assert_eq!(merged.max_pool_size, Some(50));
    }

    #[tokio::test]
    async fn test_client_options() {
        let options = MongoDriverOptions {
            app_name: Some("wtb-api".into()),
            connect_timeout_ms: Some(2_000),
            direct_connection: Some(true),
            ..Default::default()
        };
        let client_options = options
            .client_options("mongodb://localhost:27017/wtb")
            .await
            .unwrap();

        assert_eq!(client_options.app_name.as_deref(), Some("wtb-api"));
        assert_eq!(client_options.connect_timeout, Some(Duration::from_secs(2)));
        assert_eq!(client_options.direct_connection, Some(true));
        assert_eq!(client_options.default_database.as_deref(), Some("wtb"));
    }
}
