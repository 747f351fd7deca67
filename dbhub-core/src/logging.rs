//! Logging setup for dbhub.
//!
//! Every component emits structured `tracing` events (connect, register,
//! close, secret lookups). Applications that already install a subscriber
//! need nothing from this module. Others can call [`init`], which reads:
//!
//! - `DBHUB_DEBUG=true|1|yes` - enable debug logging
//! - `DBHUB_LOG_LEVEL=trace|debug|info|warn|error` - set the level
//! - `DBHUB_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! ```rust,no_run
//! dbhub_core::logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

impl LogFormat {
    /// Parse a format name, falling back to JSON.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }

    /// Get the format name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Whether logging was requested at all.
    pub enabled: bool,
    /// Level applied to the dbhub crates.
    pub level: &'static str,
    /// Output format.
    pub format: LogFormat,
}

impl LogSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through a variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let debug = lookup("DBHUB_DEBUG")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);
        let requested = lookup("DBHUB_LOG_LEVEL");
        let fallback = if debug { "debug" } else { "warn" };

        let level = match requested.as_deref().map(str::to_lowercase).as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => fallback,
        };

        Self {
            enabled: debug || requested.is_some(),
            level,
            format: lookup("DBHUB_LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or(LogFormat::Json),
        }
    }

    /// Settings with an explicit level.
    pub fn with_level(level: &'static str) -> Self {
        Self {
            enabled: true,
            level,
            format: LogFormat::Json,
        }
    }

    /// Filter directive covering the dbhub crates.
    pub fn directive(&self) -> String {
        [
            "dbhub",
            "dbhub_core",
            "dbhub_mongodb",
            "dbhub_mysql",
            "dbhub_redis",
            "dbhub_aws",
            "dbhub_cli",
        ]
        .iter()
        .map(|target| format!("{}={}", target, self.level))
        .collect::<Vec<_>>()
        .join(",")
    }
}

/// Check if debug logging is enabled via `DBHUB_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("DBHUB_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Install a subscriber configured from the environment.
///
/// Does nothing unless `DBHUB_DEBUG` or `DBHUB_LOG_LEVEL` is set. Only the
/// first call has an effect.
pub fn init() {
    let settings = LogSettings::from_env();
    if settings.enabled {
        init_with(settings);
    }
}

/// Install a subscriber with explicit settings. Only the first call has an effect.
pub fn init_with(settings: LogSettings) {
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(settings.directive())
                .unwrap_or_else(|_| EnvFilter::new("warn"));

            // try_init: another subscriber may already be installed.
            let installed = match settings.format {
                LogFormat::Json => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json())
                    .try_init(),
                LogFormat::Compact => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact())
                    .try_init(),
                LogFormat::Pretty => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().pretty())
                    .try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = settings.level,
                    format = settings.format.name(),
                    "dbhub logging initialized"
                );
            }
        }

        #[cfg(not(feature = "tracing-subscriber"))]
        {
            drop(settings);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> LogSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LogSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_disabled_by_default() {
        let s = settings(&[]);
        assert!(!s.enabled);
        assert_eq!(s.level, "warn");
        assert_eq!(s.format, LogFormat::Json);
    }

    #[test]
    fn test_debug_flag() {
        let s = settings(&[("DBHUB_DEBUG", "YES")]);
        assert!(s.enabled);
        assert_eq!(s.level, "debug");
    }

    #[test]
    fn test_explicit_level_and_format() {
        let s = settings(&[("DBHUB_LOG_LEVEL", "Info"), ("DBHUB_LOG_FORMAT", "compact")]);
        assert!(s.enabled);
        assert_eq!(s.level, "info");
        assert_eq!(s.format, LogFormat::Compact);

        let s = settings(&[("DBHUB_LOG_LEVEL", "loud")]);
        assert_eq!(s.level, "warn");
    }

    #[test]
    fn test_directive() {
        let directive = LogSettings::with_level("trace").directive();
        assert!(directive.starts_with("dbhub=trace,dbhub_core=trace"));
        assert!(directive.contains("dbhub_redis=trace"));
    }
}
