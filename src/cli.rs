//! Command-line argument parsing for td-glance.

use crate::config::ConnectionOverrides;
use crate::engine::EngineKind;
use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Run Treasure Data queries and browse table metadata.
#[derive(Parser, Debug)]
#[command(name = "td-glance")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Treasure Data API key
    #[arg(long, value_name = "KEY", global = true)]
    pub api_key: Option<String>,

    /// Target database
    #[arg(short = 'd', long, value_name = "DATABASE", global = true)]
    pub database: Option<String>,

    /// Query engine: presto (default) or hive
    #[arg(short = 'e', long, value_name = "ENGINE", global = true)]
    pub engine: Option<String>,

    /// API endpoint (e.g., https://api.treasuredata.com)
    #[arg(long, value_name = "URL", global = true)]
    pub endpoint: Option<String>,

    /// Use named connection from config
    #[arg(short = 'c', long, value_name = "NAME", global = true)]
    pub connection: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Output format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Use an in-memory engine with canned data (for testing)
    #[arg(long, global = true)]
    pub mock: bool,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a query and print its result (Ctrl-C cancels the job)
    Query {
        /// SQL to submit
        sql: String,
    },
    /// List the tables of the database
    Tables,
    /// Show the columns of a table
    Describe {
        /// Table name
        table: String,
    },
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Connection settings given on the command line only.
    ///
    /// Flags that were not passed stay `None` so file and env settings survive the merge.
    pub fn to_connection_overrides(&self) -> ConnectionOverrides {
        ConnectionOverrides {
            api_key: self.api_key.clone(),
            database: self.database.clone(),
            engine: self.engine.as_deref().map(EngineKind::parse),
            endpoint: self.endpoint.clone(),
            hive_results: None,
        }
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Returns the named connection to use, if specified.
    pub fn connection_name(&self) -> Option<&str> {
        self.connection.as_deref()
    }
}
