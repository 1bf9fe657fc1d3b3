//! Error types for the `folio` command line interface.

use thiserror::Error;

use super::*;

/// Error type alias used throughout the CLI.
pub type Result<T> = core::result::Result<T, FoliodError>;

/// Errors that can end a CLI command.
#[derive(Error, Debug)]
pub enum FoliodError {
  /// A library operation failed.
  #[error(transparent)]
  Folio(#[from] FolioError),

  /// Reading an answer from the terminal failed.
  #[error(transparent)]
  Dialog(#[from] dialoguer::Error),

  /// A file system operation failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// The pattern for database side files was malformed.
  #[error(transparent)]
  Glob(#[from] glob::PatternError),
}
