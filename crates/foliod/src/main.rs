//! Command line interface for the folio book catalog.
//!
//! This crate provides the `folio` executable, a thin shell over the `folio` library. It
//! supports:
//! - Creating the configuration and the database schema
//! - Ingesting books by locator or by catalog id
//! - Listing what has been ingested
//! - Removing the database
//!
//! # Usage
//!
//! ```bash
//! # Write the configuration and create the relations
//! folio init
//!
//! # Ingest the first ten books of the catalog
//! folio ingest --count 10
//!
//! # Ingest specific books
//! folio ingest https://www.gutenberg.org/cache/epub/19337/pg19337.txt
//!
//! # Show what is stored
//! folio list
//!
//! # Remove the database
//! folio clean
//! ```
//!
//! Destructive operations and ingestion ask for confirmation first; `--accept-defaults`
//! skips every prompt. Logging detail is raised with repeated `-v` flags.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::path::PathBuf;

use clap::{builder::ArgAction, Args, Parser, Subcommand};
use console::style;
use folio::{
  config::{Config, SchemaVariant},
  database::{BookRecord, ListBooks},
  error::FolioError,
  pipeline::{BatchReport, Outcome},
  prelude::*,
  Folio,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod error;
pub mod interaction;

use crate::{commands::*, error::*, interaction::*};

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Ingest public-domain books into a local catalog")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Path to the database file. Overrides the configured location.
  #[arg(long, short, global = true)]
  path: Option<PathBuf>,

  /// Path to the configuration file. If not specified, uses the default platform-specific
  /// configuration directory.
  #[arg(long, short, global = true)]
  config: Option<PathBuf>,

  /// Skip all prompts and accept defaults
  #[arg(long, short = 'y', global = true)]
  accept_defaults: bool,

  /// The subcommand to execute
  #[command(subcommand)]
  command: Commands,
}

impl Cli {
  /// Location of the configuration file.
  fn config_path(&self) -> PathBuf { self.config.clone().unwrap_or_else(Config::default_path) }

  /// The configuration file when it exists, otherwise the defaults, with `--path` applied.
  fn load_config(&self) -> Result<Config> {
    let path = self.config_path();
    let config = if path.exists() {
      Config::load(&path)?
    } else {
      debug!(path = %path.display(), "No configuration file, using defaults");
      Config::default()
    };
    Ok(match &self.path {
      Some(database_path) => config.with_database_path(database_path),
      None => config,
    })
  }
}

/// Configures the logging system based on the verbosity level
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
///
/// `RUST_LOG` takes precedence when set.
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true)
    .init();
}

/// Entry point for the `folio` CLI application
///
/// Parses arguments, sets up logging, resolves the configuration and runs the requested
/// command. Malformed arguments are rejected by the parser with exit status 2; a failed
/// command is reported on stderr and ends the process with exit status 1.
#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  setup_logging(cli.verbose);

  let terminal = Terminal::new(cli.accept_defaults);
  let result = match &cli.command {
    Commands::Init(args) => init(&cli, &terminal, args).await,
    Commands::Ingest(args) => ingest(&cli, &terminal, args).await,
    Commands::List => list(&cli, &terminal).await,
    Commands::Clean => clean(&cli, &terminal).await,
  };

  if let Err(e) = result {
    terminal.reply(ResponseContent::Error(&e))?;
    std::process::exit(1);
  }
  Ok(())
}
