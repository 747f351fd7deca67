//! `dbhub check` command - Open and close every configured connection.

use std::time::Duration;

use dbhub::{ConnectionHub, ConnectionHubBuilder, HubConfig};

use crate::cli::CheckArgs;
use crate::config;
use crate::error::{CliError, CliResult};
use crate::output::{self, success, warn};

/// Run the check command
pub async fn run(args: CheckArgs) -> CliResult<()> {
    output::header("Check Connections");

    output::step(1, 3, "Loading configuration...");
    let config = config::load(&args.config)?;
    let specs = config.specs()?;

    output::kv("Config", &args.config.display().to_string());
    output::kv("Connections", &specs.len().to_string());
    output::kv("Separator", &config.separator);
    output::newline();

    let mut builder = builder(&config);
    if let Some(secs) = args.timeout {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }
    let hub = builder.build();

    output::step(2, 3, "Connecting...");
    if let Err(err) = hub.init(specs).await {
        // Release whatever did connect before reporting.
        let report = hub.close().await;
        for failure in &report.failures {
            warn(&format!("{} '{}': {}", failure.backend, failure.client, failure.error));
        }
        return Err(err.into());
    }

    print_clients(&hub);
    output::newline();

    output::step(3, 3, "Closing...");
    let report = hub.close().await;
    output::newline();

    if report.is_clean() {
        success(&format!("{} connection(s) opened and closed", report.closed.len()));
        Ok(())
    } else {
        for failure in &report.failures {
            warn(&format!("{} '{}': {}", failure.backend, failure.client, failure.error));
        }
        Err(CliError::Close(report.failures.len()))
    }
}

fn builder(config: &HubConfig) -> ConnectionHubBuilder {
    let builder = dbhub::builder_from_config(config);

    #[cfg(feature = "mongodb")]
    let builder = builder.mapper(std::sync::Arc::new(dbhub::mongodb::MongoMapper::new()));

    builder
}

fn print_clients(hub: &ConnectionHub) {
    output::newline();
    output::section("Clients");

    let rows: Vec<Vec<String>> = hub
        .clients()
        .into_iter()
        .map(|client| {
            vec![
                client.backend.to_string(),
                client.name,
                client.aliases.join(", "),
            ]
        })
        .collect();

    output::table(&["Backend", "Client", "Aliases"], &rows);
}
