//! Error types for the folio library.
//!
//! Errors fall in two groups. Per-document failures (an unreachable source, a malformed
//! locator, a local I/O failure, a database failure while storing one book) are reported and
//! skipped by the batch driver. Fatal failures ([`FolioError::is_fatal`]) are programming or
//! configuration mistakes and abort the whole run.
//!
//! A document that is already stored is not an error at all, see
//! [`Outcome::AlreadyIngested`](crate::pipeline::Outcome::AlreadyIngested).
//!
//! # Examples
//!
//! ```
//! use folio::{error::FolioError, source::Locator};
//!
//! match Locator::parse("https://example.org/books/") {
//!   Err(FolioError::InvalidLocator(locator)) => println!("not a text file: {locator}"),
//!   Err(e) => println!("other error: {e}"),
//!   Ok(locator) => println!("artifact name: {}", locator.file_name()),
//! }
//! ```

use thiserror::Error;

/// Error type alias used for the [`folio`](crate) crate.
pub type Result<T> = core::result::Result<T, FolioError>;

/// Errors that can occur while fetching, parsing and storing books.
#[derive(Error, Debug)]
pub enum FolioError {
  /// The locator does not end in an alphanumeric name with a `.txt` suffix, or is not a URL.
  ///
  /// This is distinct from [`FolioError::Unavailable`]: the locator was never requested.
  #[error("Locator \"{0}\" does not name a plain-text file")]
  InvalidLocator(String),

  /// The source answered with something other than `200 OK`.
  #[error("Source {locator} responded with status {status}")]
  Unavailable {
    /// The requested locator.
    locator: String,
    /// The HTTP status code received.
    status:  u16,
  },

  /// A network request failed before a status was received.
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// A SQLite operation failed.
  ///
  /// This wraps errors from the `rusqlite` crate, covering:
  /// - SQL syntax errors
  /// - Constraint violations
  /// - Type conversion errors
  #[error(transparent)]
  Sqlite(#[from] rusqlite::Error),

  /// An async SQLite operation failed.
  #[error(transparent)]
  AsyncSqlite(#[from] tokio_rusqlite::Error),

  /// A file system operation failed.
  ///
  /// This occurs when:
  /// - The downloaded artifact cannot be written or opened
  /// - The database directory cannot be created
  /// - A configuration file cannot be read or written
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// A lookup or insert was given a different number of attributes and values.
  ///
  /// This is a caller programming error and is never retried.
  #[error("Relation \"{relation}\" was given {attributes} attribute(s) but {values} value(s)")]
  ArityMismatch {
    /// The relation that was addressed.
    relation:   String,
    /// Number of attribute names supplied.
    attributes: usize,
    /// Number of values supplied.
    values:     usize,
  },

  /// No row matched after an insert was suppressed by the uniqueness constraint.
  #[error("No row in \"{0}\" matches the requested values")]
  NotFound(String),

  /// The header block never reached the `***` delimiter within the scanned bound.
  #[error("No \"***\" delimiter within the first {0} lines")]
  MissingDelimiter(usize),

  /// A configuration file could not be parsed.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// A configuration could not be serialized.
  #[error(transparent)]
  TomlSer(#[from] toml::ser::Error),

  /// The configuration is unusable.
  #[error("{0}")]
  Config(String),
}

impl FolioError {
  /// Whether this error must abort a multi-document run instead of skipping one document.
  ///
  /// # Examples
  ///
  /// ```
  /// use folio::error::FolioError;
  ///
  /// assert!(FolioError::Config("no template".into()).is_fatal());
  /// assert!(!FolioError::InvalidLocator("x".into()).is_fatal());
  /// ```
  pub fn is_fatal(&self) -> bool {
    matches!(
      self,
      FolioError::ArityMismatch { .. }
        | FolioError::Config(_)
        | FolioError::TomlDe(_)
        | FolioError::TomlSer(_)
    )
  }
}
