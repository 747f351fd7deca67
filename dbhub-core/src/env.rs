//! Environment variable expansion for configuration values.

use std::collections::HashMap;

use crate::error::{HubError, HubResult};

/// Source for environment variables.
pub trait EnvSource: Send + Sync {
    /// Get a variable's value.
    fn get(&self, name: &str) -> Option<String>;
}

/// Process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Environment backed by a map, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MapEnvSource {
    vars: HashMap<String, String>,
}

impl MapEnvSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Expands `$VAR`, `${VAR}` and `${VAR:-default}` references.
///
/// A `$` not followed by a name or `{` is kept literally, so passwords such
/// as `pa$$` survive untouched.
#[derive(Debug, Clone, Default)]
pub struct EnvExpander<S: EnvSource = StdEnvSource> {
    source: S,
}

impl EnvExpander<StdEnvSource> {
    /// Expander over the process environment.
    pub fn new() -> Self {
        Self {
            source: StdEnvSource,
        }
    }
}

impl<S: EnvSource> EnvExpander<S> {
    /// Expander over a custom source.
    pub fn with_source(source: S) -> Self {
        Self { source }
    }

    /// Expand every reference in `input`.
    pub fn expand(&self, input: &str) -> HubResult<String> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some(body) = after.strip_prefix('{') {
                let end = body.find('}').ok_or_else(|| {
                    HubError::config(format!("unterminated variable reference in '{}'", input))
                })?;
                out.push_str(&self.lookup_braced(&body[..end])?);
                rest = &body[end + 1..];
            } else {
                let len = after
                    .char_indices()
                    .find(|&(i, c)| !(c == '_' || c.is_ascii_alphanumeric()) || (i == 0 && c.is_ascii_digit()))
                    .map(|(i, _)| i)
                    .unwrap_or(after.len());
                if len == 0 {
                    out.push('$');
                } else {
                    out.push_str(&self.lookup(&after[..len], None)?);
                }
                rest = &after[len..];
            }
        }

        out.push_str(rest);
        Ok(out)
    }

    fn lookup_braced(&self, body: &str) -> HubResult<String> {
        match body.split_once(":-") {
            Some((name, default)) => self.lookup(name, Some(default)),
            None => self.lookup(body, None),
        }
    }

    fn lookup(&self, name: &str, default: Option<&str>) -> HubResult<String> {
        if name.is_empty() {
            return Err(HubError::config("empty variable name"));
        }
        match (self.source.get(name), default) {
            (Some(value), _) if !value.is_empty() => Ok(value),
            (_, Some(default)) => Ok(default.to_string()),
            (Some(value), None) => Ok(value),
            (None, None) => Err(HubError::config(format!(
                "environment variable '{}' is not set",
                name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expander() -> EnvExpander<MapEnvSource> {
        EnvExpander::with_source(
            MapEnvSource::new()
                .set("MONGO_HOST", "db.internal:27017")
                .set("MONGO_USER", "svc")
                .set("EMPTY", ""),
        )
    }

    #[test]
    fn test_expand_braced_and_simple() {
        assert_eq!(
            expander()
                .expand("mongodb://${MONGO_USER}:pw@$MONGO_HOST/wtb")
                .unwrap(),
            "mongodb://svc:pw@db.internal:27017/wtb"
        );
    }

    #[test]
    fn test_expand_default() {
        let e = expander();
        assert_eq!(e.expand("${MISSING:-localhost}").unwrap(), "localhost");
        assert_eq!(e.expand("${EMPTY:-fallback}").unwrap(), "fallback");
        assert_eq!(e.expand("${MONGO_USER:-x}").unwrap(), "svc");
    }

    #[test]
    fn test_expand_missing_is_error() {
        assert!(expander().expand("${MISSING}").is_err());
        assert!(expander().expand("$MISSING/db").is_err());
        assert!(expander().expand("${MONGO_USER").is_err());
    }

    #[test]
    fn test_literal_dollars() {
        let e = expander();
        assert_eq!(e.expand("mysql://u:pa$$@h/db").unwrap(), "mysql://u:pa$$@h/db");
        assert_eq!(e.expand("cost: $5").unwrap(), "cost: $5");
        assert_eq!(e.expand("no refs").unwrap(), "no refs");
    }
}
