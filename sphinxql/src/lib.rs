//! Command-line front end for the SphinxQL adapter.
//!
//! The argument types and command handlers live here so they can be
//! exercised without spawning the binary; `main.rs` only parses, sets up
//! logging and dispatches.

use clap::{Args, Parser, Subcommand, ValueEnum};
use sphinxql_core::{
    Database, DatabaseConfig, MemoryProfiler, QueryOutcome, QueryType, SphinxQlAdapter, SqlValue,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "sphinxql")]
#[command(about = "SphinxQL client for Sphinx and Manticore search servers")]
#[command(version)]
#[command(long_about = "
sphinxql - run statements against a Sphinx or Manticore SphinxQL listener

Every statement is sent over the MySQL text protocol with
` option max_matches=<N>` appended, exactly as the adapter does for
applications.

EXAMPLES:
  sphinxql --url sphinxql://127.0.0.1:9306 test
  sphinxql query \"SELECT id FROM products WHERE MATCH('phone')\" --typed
  sphinxql --config search.toml query \"DELETE FROM products WHERE id=1\" --type delete
  sphinxql escape \"@title (red)\"
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Configuration file
    #[arg(long, value_name = "FILE", help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Connection URL
    #[arg(
        long,
        env = "SPHINXQL_URL",
        help = "Connection URL (sphinxql://host:port?max_matches=N); overrides --config"
    )]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a statement and print its result
    Query(QueryArgs),
    /// Escape a value the way the adapter embeds it in statements
    Escape(EscapeArgs),
    /// Test the connection to the search server
    Test,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Statement text, without the option clause
    #[arg(help = "Statement to run")]
    pub sql: String,

    /// Statement kind
    #[arg(long = "type", value_enum, default_value_t = QueryKind::Select)]
    pub query_type: QueryKind,

    /// Decode values by column type instead of printing raw text
    #[arg(long, help = "Decode row values by column type")]
    pub typed: bool,
}

#[derive(Args, Debug)]
pub struct EscapeArgs {
    /// Value to escape
    #[arg(help = "Value to escape", allow_hyphen_values = true)]
    pub value: String,

    /// Skip the surrounding single quotes
    #[arg(long, help = "Do not wrap the result in single quotes")]
    pub unquoted: bool,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(
        short,
        long,
        global = true,
        help = "Suppress all output except errors"
    )]
    pub quiet: bool,
}

/// Statement kinds accepted by `--type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl From<QueryKind> for QueryType {
    fn from(kind: QueryKind) -> Self {
        match kind {
            QueryKind::Select => Self::Select,
            QueryKind::Insert => Self::Insert,
            QueryKind::Update => Self::Update,
            QueryKind::Delete => Self::Delete,
            QueryKind::Other => Self::Other,
        }
    }
}

/// Builds the adapter configuration from the command line.
///
/// `--url` wins over `--config`; with neither, the defaults
/// (`127.0.0.1:9306`) are used.
///
/// # Errors
/// Returns error if the URL or the configuration file is invalid.
pub fn resolve_config(cli: &Cli) -> sphinxql_core::Result<DatabaseConfig> {
    match (&cli.url, &cli.config) {
        (Some(url), config) => {
            if config.is_some() {
                debug!("--url given, ignoring --config");
            }
            DatabaseConfig::from_url(url)
        }
        (None, Some(path)) => DatabaseConfig::load(path),
        (None, None) => Ok(DatabaseConfig::default()),
    }
}

/// Runs the selected command.
///
/// # Errors
/// Returns error if configuration, connection, or the statement fails.
pub async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = resolve_config(cli)?;

    match &cli.command {
        Command::Query(args) => run_query(config, args).await,
        Command::Escape(args) => {
            let adapter = SphinxQlAdapter::new(config)?;
            println!("{}", escape_for_output(&adapter, args));
            Ok(())
        }
        Command::Test => test_connection(config).await,
    }
}

/// Text printed by the `escape` command.
pub fn escape_for_output(adapter: &SphinxQlAdapter, args: &EscapeArgs) -> String {
    adapter
        .escape(&SqlValue::from(args.value.as_str()), !args.unquoted)
        .to_string()
}

/// Human-readable summary of a non-`SELECT` outcome.
pub fn describe_outcome(outcome: &QueryOutcome) -> Option<String> {
    match outcome {
        QueryOutcome::Rows(_) => None,
        QueryOutcome::Inserted {
            insert_id,
            affected_rows,
        } => Some(format!(
            "insert_id: {}, affected_rows: {}",
            insert_id, affected_rows
        )),
        QueryOutcome::Affected(affected_rows) => {
            Some(format!("affected_rows: {}", affected_rows))
        }
    }
}

async fn run_query(config: DatabaseConfig, args: &QueryArgs) -> anyhow::Result<()> {
    let profiler = Arc::new(MemoryProfiler::new());
    let mut adapter = SphinxQlAdapter::new(config)?.with_profiler(profiler.clone());

    let result = adapter
        .query(args.query_type.into(), &args.sql, args.typed, None)
        .await;
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            adapter.disconnect().await;
            return Err(e.into());
        }
    };

    if let Some(sql) = adapter.last_query() {
        debug!(sql = %sql, "statement completed");
    }

    match describe_outcome(&outcome) {
        Some(summary) => println!("{}", summary),
        None => {
            if let Some(rows) = outcome.into_rows() {
                let stdout = std::io::stdout();
                let mut out = stdout.lock();
                let mut count = 0_usize;
                for row in rows {
                    writeln!(out, "{}", row?)?;
                    count = count.saturating_add(1);
                }
                info!("{} rows", count);
            }
        }
    }

    for mark in profiler.marks() {
        if let Some(elapsed) = mark.elapsed {
            info!(group = %mark.group, "{:.3} ms {}", elapsed.as_secs_f64() * 1000.0, mark.name);
        }
    }

    adapter.disconnect().await;
    Ok(())
}

async fn test_connection(config: DatabaseConfig) -> anyhow::Result<()> {
    info!("Testing connection to {}...", config.connection);

    let mut adapter = SphinxQlAdapter::new(config)?;
    adapter.connect().await?;

    info!(
        connection_id = adapter.connection_id().unwrap_or_default(),
        "✓ Connection test successful"
    );
    println!("Connection to {} successful", adapter.config().connection);

    adapter.disconnect().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_query_defaults() {
        let cli = parse(&["sphinxql", "query", "SELECT * FROM idx"]);
        let Command::Query(args) = &cli.command else {
            panic!("expected query command");
        };
        assert_eq!(args.sql, "SELECT * FROM idx");
        assert_eq!(args.query_type, QueryKind::Select);
        assert!(!args.typed);
    }

    #[test]
    fn test_query_type_and_typed() {
        let cli = parse(&[
            "sphinxql",
            "query",
            "INSERT INTO idx (id) VALUES (1)",
            "--type",
            "insert",
            "--typed",
        ]);
        let Command::Query(args) = &cli.command else {
            panic!("expected query command");
        };
        assert_eq!(QueryType::from(args.query_type), QueryType::Insert);
        assert!(args.typed);
    }

    #[test]
    fn test_unknown_query_type_rejected() {
        assert!(Cli::try_parse_from(["sphinxql", "query", "x", "--type", "merge"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["sphinxql", "test", "-vv"]);
        assert_eq!(cli.global.verbose, 2);
        assert!(!cli.global.quiet);
        assert!(matches!(cli.command, Command::Test));
    }

    #[test]
    fn test_escape_accepts_leading_hyphen() {
        let cli = parse(&["sphinxql", "escape", "-term", "--unquoted"]);
        let Command::Escape(args) = &cli.command else {
            panic!("expected escape command");
        };
        assert_eq!(args.value, "-term");
        assert!(args.unquoted);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["sphinxql"]).is_err());
    }

    #[test]
    fn test_escape_output() {
        let adapter = SphinxQlAdapter::new(DatabaseConfig::default()).unwrap();

        let quoted = EscapeArgs {
            value: "@title (red)".to_string(),
            unquoted: false,
        };
        assert_eq!(escape_for_output(&adapter, &quoted), r"'\\@title \\(red\\)'");

        let unquoted = EscapeArgs {
            value: "it's".to_string(),
            unquoted: true,
        };
        assert_eq!(escape_for_output(&adapter, &unquoted), r"it\'s");

        let numeric = EscapeArgs {
            value: "42".to_string(),
            unquoted: false,
        };
        assert_eq!(escape_for_output(&adapter, &numeric), "42");
    }

    #[test]
    fn test_describe_outcome() {
        let inserted = QueryOutcome::Inserted {
            insert_id: 12,
            affected_rows: 1,
        };
        assert_eq!(
            describe_outcome(&inserted).as_deref(),
            Some("insert_id: 12, affected_rows: 1")
        );
        assert_eq!(
            describe_outcome(&QueryOutcome::Affected(4)).as_deref(),
            Some("affected_rows: 4")
        );
    }

    #[test]
    fn test_resolve_config_defaults() {
        let cli = Cli {
            global: GlobalArgs {
                verbose: 0,
                quiet: false,
            },
            config: None,
            url: None,
            command: Command::Test,
        };
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.connection.hostname, "127.0.0.1");
        assert_eq!(config.connection.port, 9306);
    }

    #[test]
    fn test_resolve_config_url_wins() {
        let cli = Cli {
            global: GlobalArgs {
                verbose: 0,
                quiet: false,
            },
            config: Some(PathBuf::from("/nonexistent/sphinxql.toml")),
            url: Some("sphinxql://search.local:9312?max_matches=10".to_string()),
            command: Command::Test,
        };
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.connection.hostname, "search.local");
        assert_eq!(config.max_matches, 10);
    }
}
