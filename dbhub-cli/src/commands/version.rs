//! `dbhub version` command - Display version information.

use crate::error::CliResult;
use crate::output::{self, kv};

/// Package version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name
const NAME: &str = env!("CARGO_PKG_NAME");

/// Run the version command
pub async fn run() -> CliResult<()> {
    output::header("dbhub");

    kv("Version", VERSION);
    kv("Binary", NAME);

    #[cfg(debug_assertions)]
    let build_mode = "debug";
    #[cfg(not(debug_assertions))]
    let build_mode = "release";

    kv("Build", build_mode);

    let mut features = Vec::new();

    #[cfg(feature = "mongodb")]
    features.push("mongodb");

    #[cfg(feature = "mysql")]
    features.push("mysql");

    #[cfg(feature = "redis")]
    features.push("redis");

    #[cfg(feature = "aws")]
    features.push("aws");

    if features.is_empty() {
        features.push("none");
    }

    kv("Features", &features.join(", "));

    output::newline();
    output::dim("https://github.com/pegasusheavy/dbhub");

    Ok(())
}
