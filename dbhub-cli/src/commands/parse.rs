//! `dbhub parse` command - Show how a connection string is understood.

use dbhub::connector::{DocumentNames, single_alias};
use dbhub::{Backend, ConnectionSpec, ConnectionUri, HubResult};

use crate::cli::ParseArgs;
use crate::error::CliResult;
use crate::output::{self, kv};

/// Run the parse command
pub async fn run(args: ParseArgs) -> CliResult<()> {
    output::header("Parse Connection String");

    let uri = ConnectionUri::parse(&args.connection_string)?;

    kv("Scheme", uri.scheme.name());
    kv("Backend", &uri.backend().to_string());
    kv("Username", or_none(&uri.username));
    kv("Password", if uri.password.is_empty() { "(none)" } else { "***" });
    kv("Host", &uri.host);
    kv("Database", or_none(&uri.default_name));
    kv("Options", or_none(&uri.query_options));
    kv("Rendered", &uri.redacted());

    output::newline();
    output::section("Aliases");
    for alias in aliases(&args, &uri)? {
        output::list_item(&alias);
    }

    Ok(())
}

fn or_none(value: &str) -> &str {
    if value.is_empty() { "(none)" } else { value }
}

/// Aliases the connection would register under.
pub fn aliases(args: &ParseArgs, uri: &ConnectionUri) -> HubResult<Vec<String>> {
    let mut spec = ConnectionSpec::new(args.connection_string.clone());
    match args.name.as_slice() {
        [] => {}
        [single] => spec = spec.name(single.clone()),
        many => spec = spec.names(many.iter().cloned()),
    }

    match uri.backend() {
        Backend::Document | Backend::Mapper => {
            Ok(DocumentNames::resolve(&spec, uri, &args.separator)?.aliases())
        }
        backend => Ok(vec![single_alias(backend, &spec, uri)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(connection_string: &str, names: &[&str], separator: &str) -> ParseArgs {
        ParseArgs {
            connection_string: connection_string.to_string(),
            name: names.iter().map(|n| n.to_string()).collect(),
            separator: separator.to_string(),
        }
    }

    fn resolve(args: &ParseArgs) -> HubResult<Vec<String>> {
        aliases(args, &ConnectionUri::parse(&args.connection_string)?)
    }

    #[test]
    fn test_document_aliases() {
        let a = args("mongodb://localhost/wtb", &["wtb:main", "catalog"], ":");
        assert_eq!(resolve(&a).unwrap(), vec!["main", "catalog"]);

        let a = args("mongodb://localhost/wtb", &["wtb/main"], "/");
        assert_eq!(resolve(&a).unwrap(), vec!["main"]);
    }

    #[test]
    fn test_single_aliases() {
        assert_eq!(resolve(&args("mysql://db/cms", &[], ":")).unwrap(), vec!["cms"]);
        assert_eq!(resolve(&args("redis://cache:6379", &["cache"], ":")).unwrap(), vec!["cache"]);
    }

    #[test]
    fn test_missing_name() {
        let err = resolve(&args("redis://cache:6379", &[], ":")).unwrap_err();
        assert!(err.is_missing_database_name());
    }
}
