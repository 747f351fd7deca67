//! CLI error types and result alias.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(dbhub::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(dbhub::config))]
    Config(String),

    /// Error from the connection hub
    #[error(transparent)]
    #[diagnostic(code(dbhub::hub))]
    Hub(#[from] dbhub::HubError),

    /// Some clients failed to close
    #[error("{0} connection(s) failed to close")]
    #[diagnostic(code(dbhub::close), help("see the warnings above for the failing clients"))]
    Close(usize),
}

impl CliError {
    /// Underlying causes, outermost first.
    pub fn causes(&self) -> Vec<String> {
        let mut causes = Vec::new();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            causes.push(err.to_string());
            source = err.source();
        }
        causes
    }
}
