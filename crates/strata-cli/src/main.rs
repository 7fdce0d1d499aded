//! Strata CLI - Command-line driver for the strata record store

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use strata_core::{RecordBackend, SqlConfig, WideColumnConfig};
use strata_sqlite::SqliteRecordStore;
use strata_widecol::WideColumnStore;

mod commands;

#[derive(Parser)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Storage backend to use
    #[arg(short, long, value_enum, default_value_t = BackendKind::Sqlite)]
    backend: BackendKind,

    #[command(flatten)]
    sql: SqlArgs,

    /// Keyspace for the wide-column backend
    #[arg(long, default_value = "demo")]
    keyspace: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SqlArgs {
    /// Database path or `file:` URI
    #[arg(long, env = "SQL_DSN", default_value = "./strata.db")]
    dsn: String,

    /// Maximum number of open connections
    #[arg(long, env = "SQL_MAX_OPEN_CONNS", default_value_t = 10)]
    max_open_conns: usize,

    /// Maximum number of idle connections
    #[arg(long, env = "SQL_MAX_IDLE_CONNS", default_value_t = 5)]
    max_idle_conns: usize,

    /// Maximum connection lifetime in minutes
    #[arg(long, env = "SQL_MAX_CONN_LIFETIME_MINS", default_value_t = 5)]
    max_conn_lifetime_mins: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendKind {
    Sqlite,
    WideColumn,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the table, insert sample records, list them, then drop the table
    Demo {
        /// Number of sample records to insert
        #[arg(short, long, default_value_t = 10)]
        count: usize,

        /// Keep the table instead of dropping it at the end
        #[arg(long)]
        keep: bool,
    },

    /// Create the records table and its index
    Create,

    /// Drop the records table and all data
    Drop,

    /// Print every record
    List,

    /// Print one record
    Get {
        /// Record id
        id: String,
    },

    /// Insert or update one payload column of a record
    Upsert {
        /// Payload column (primaryPayload or secondaryPayload)
        namespace: String,

        /// Record id
        id: String,

        /// Payload as a JSON object
        payload: String,
    },
}

fn open_backend(cli: &Cli) -> Result<Box<dyn RecordBackend>> {
    match cli.backend {
        BackendKind::Sqlite => {
            let config = SqlConfig::new(
                cli.sql.dsn.clone(),
                cli.sql.max_open_conns,
                cli.sql.max_idle_conns,
                cli.sql.max_conn_lifetime_mins,
            );
            let store = SqliteRecordStore::open(config)
                .with_context(|| format!("Failed to open database at {}", cli.sql.dsn))?;
            Ok(Box::new(store))
        }
        BackendKind::WideColumn => {
            let config = WideColumnConfig::default().with_keyspace(cli.keyspace.clone());
            let store = WideColumnStore::open(config).context("Failed to open wide-column backend")?;
            Ok(Box::new(store))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let backend = open_backend(&cli)?;
    tracing::debug!(backend = backend.name(), "Backend ready");

    // Execute command
    match cli.command {
        Commands::Demo { count, keep } => {
            commands::demo::execute(backend.as_ref(), count, keep)?;
        }
        Commands::Create => {
            commands::records::create_table(backend.as_ref())?;
        }
        Commands::Drop => {
            commands::records::drop_table(backend.as_ref())?;
        }
        Commands::List => {
            commands::records::list(backend.as_ref())?;
        }
        Commands::Get { id } => {
            commands::records::get(backend.as_ref(), &id)?;
        }
        Commands::Upsert {
            namespace,
            id,
            payload,
        } => {
            commands::records::upsert(backend.as_ref(), &namespace, &id, &payload)?;
        }
    }

    Ok(())
}
