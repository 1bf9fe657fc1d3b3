use super::*;

pub mod clean;
pub mod ingest;
pub mod init;
pub mod list;

pub use clean::clean;
pub use ingest::{ingest, IngestArgs};
pub use init::{init, InitArgs};
pub use list::list;

/// Available commands for the CLI
#[derive(Subcommand, Clone)]
pub enum Commands {
  /// Write the configuration file and create the database relations
  Init(InitArgs),

  /// Download books and store their metadata and paragraphs
  Ingest(IngestArgs),

  /// Show the books stored in the database
  List,

  /// Removes the entire database after confirmation
  Clean,
}
