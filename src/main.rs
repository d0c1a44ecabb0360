//! td-glance - run Treasure Data queries from the terminal.

use std::sync::Arc;

use anyhow::{bail, Context};
use td_glance::adapter::ClientFactory;
use td_glance::cli::{Cli, Command};
use td_glance::config::{Config, ConnectionConfig};
use td_glance::engine::{JobClient, MockJobClient};
use td_glance::output::{self, OutputFormat};
use td_glance::{logging, QueryAdapter, TdError};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<TdError>() {
            Some(td) => error!("{}: {}", td.category(), td),
            None => error!("{:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let connection = resolve_connection(&cli, &config)?;
    info!("Connection: {}", connection.display_string());

    let adapter = build_adapter(&cli, connection).with_poll_interval(config.polling.interval());

    match &cli.command {
        Command::Query { sql } => run_query(&adapter, sql, cli.format).await,
        Command::Tables => {
            let tables = adapter.fetch_tables().await?;
            print!("{}", output::render_tables(&tables, cli.format)?);
            Ok(())
        }
        Command::Describe { table } => {
            let tables = adapter.fetch_tables().await?;
            let Some(descriptor) = tables.iter().find(|t| t.name == *table) else {
                bail!("Table '{}' not found", table);
            };
            let summary = adapter.fetch_table_summary(descriptor);
            println!("{}", output::render_summary(&summary, cli.format)?);
            Ok(())
        }
    }
}

/// Runs one query, turning Ctrl-C into a job cancel.
async fn run_query(adapter: &QueryAdapter, sql: &str, format: OutputFormat) -> anyhow::Result<()> {
    let (handle, mut future) = adapter.start(sql)?;

    let result = tokio::select! {
        result = &mut future => result,
        interrupted = tokio::signal::ctrl_c() => {
            interrupted.context("Failed to listen for Ctrl-C")?;
            warn!("Interrupted, canceling query");
            handle.cancel();
            future.await
        }
    };

    print!("{}", output::render_result(&result?, format)?);
    Ok(())
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
fn resolve_connection(cli: &Cli, config: &Config) -> anyhow::Result<ConnectionConfig> {
    // Precedence: CLI flags, then named or default connection, then environment.
    let mut connection = match cli.connection_name() {
        Some(name) => config
            .get_connection(Some(name))
            .cloned()
            .ok_or_else(|| TdError::config(format!("Connection '{}' not found in config file", name)))?,
        None => config.get_connection(None).cloned().unwrap_or_default(),
    };

    connection.merge(&cli.to_connection_overrides());
    connection.apply_env_defaults();

    if cli.mock {
        connection.api_key.get_or_insert_with(|| "mock".to_string());
        connection.database.get_or_insert_with(|| "sample_datasets".to_string());
    }

    connection.validate()?;
    Ok(connection)
}

fn build_adapter(cli: &Cli, connection: ConnectionConfig) -> QueryAdapter {
    if !cli.mock {
        return QueryAdapter::new(connection);
    }

    warn!("Using in-memory mock engine");
    let factory: ClientFactory = Arc::new(|_: &ConnectionConfig| {
        let client: Arc<dyn JobClient> = Arc::new(MockJobClient::sample());
        Ok(client)
    });
    QueryAdapter::with_client_factory(connection, factory)
}
