//! Declarative connection entries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{HubError, HubResult};

/// The `name` of a connection entry: one name or an ordered list of names.
///
/// In a list, the first entry is the primary alias and the rest are
/// secondary aliases sharing the same client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameSpec {
    /// A single name.
    Single(String),
    /// Several names sharing one client.
    Many(Vec<String>),
}

impl NameSpec {
    /// All names in order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }

    /// The primary (first) name.
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::Single(name) => Some(name),
            Self::Many(names) => names.first().map(String::as_str),
        }
    }

    /// The name when it is scalar.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(name) => Some(name),
            Self::Many(_) => None,
        }
    }
}

impl From<&str> for NameSpec {
    fn from(name: &str) -> Self {
        Self::Single(name.to_string())
    }
}

impl From<String> for NameSpec {
    fn from(name: String) -> Self {
        Self::Single(name)
    }
}

impl From<Vec<String>> for NameSpec {
    fn from(names: Vec<String>) -> Self {
        Self::Many(names)
    }
}

/// One configured connection.
///
/// `isPrimaryDriver` (or `mongoose`) accepts either a flag or an object. An
/// object turns the flag on and serves as the mapper's options when
/// `driverOptions` is not given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawConnectionSpec")]
pub struct ConnectionSpec {
    /// `scheme://[user:pwd@]host[/name][?opts]`.
    pub connection_string: String,
    /// Name(s) under which the connection is exposed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<NameSpec>,
    /// Route this entry through the mapper instead of the native driver.
    #[serde(default)]
    pub is_primary_driver: bool,
    /// Backend-specific driver options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_options: Option<Value>,
    /// Secret holding the credentials.
    #[serde(default, alias = "secret", skip_serializing_if = "Option::is_none")]
    pub secret_id: Option<String>,
}

/// `isPrimaryDriver` as written in configuration.
#[derive(Deserialize)]
#[serde(untagged)]
enum PrimaryDriver {
    Flag(bool),
    Options(Map<String, Value>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConnectionSpec {
    connection_string: String,
    #[serde(default)]
    name: Option<NameSpec>,
    #[serde(default, alias = "mongoose")]
    is_primary_driver: Option<PrimaryDriver>,
    #[serde(default)]
    driver_options: Option<Value>,
    #[serde(default, alias = "secret")]
    secret_id: Option<String>,
}

impl From<RawConnectionSpec> for ConnectionSpec {
    fn from(raw: RawConnectionSpec) -> Self {
        let (is_primary_driver, mapper_options) = match raw.is_primary_driver {
            None => (false, None),
            Some(PrimaryDriver::Flag(enabled)) => (enabled, None),
            Some(PrimaryDriver::Options(options)) => (true, Some(Value::Object(options))),
        };
        Self {
            connection_string: raw.connection_string,
            name: raw.name,
            is_primary_driver,
            driver_options: raw.driver_options.or(mapper_options),
            secret_id: raw.secret_id,
        }
    }
}

impl ConnectionSpec {
    /// Create a spec for a connection string.
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            name: None,
            is_primary_driver: false,
            driver_options: None,
            secret_id: None,
        }
    }

    /// Set a single name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(NameSpec::Single(name.into()));
        self
    }

    /// Set several names sharing one client.
    pub fn names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.name = Some(NameSpec::Many(names.into_iter().map(Into::into).collect()));
        self
    }

    /// Route through the mapper.
    pub fn primary_driver(mut self, enabled: bool) -> Self {
        self.is_primary_driver = enabled;
        self
    }

    /// Set backend-specific driver options.
    pub fn driver_options(mut self, options: Value) -> Self {
        self.driver_options = Some(options);
        self
    }

    /// Resolve credentials from a secret.
    pub fn secret(mut self, secret_id: impl Into<String>) -> Self {
        self.secret_id = Some(secret_id.into());
        self
    }

    /// Primary name, if any.
    pub fn primary_name(&self) -> Option<&str> {
        self.name.as_ref().and_then(NameSpec::primary)
    }

    /// Check the shape of the entry.
    pub fn validate(&self) -> HubResult<()> {
        if self.connection_string.trim().is_empty() {
            return Err(HubError::config("connection string must not be empty"));
        }
        match &self.name {
            Some(NameSpec::Many(names)) if names.is_empty() => Err(HubError::config(
                "name must be a string or a non-empty list of strings",
            )),
            Some(name) if name.names().iter().any(|n| n.is_empty()) => {
                Err(HubError::config("names must not be empty strings"))
            }
            _ => Ok(()),
        }
    }
}
