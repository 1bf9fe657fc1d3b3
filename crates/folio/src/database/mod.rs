//! Local SQLite storage for books, their reference data and their paragraphs.
//!
//! The schema is normalized:
//! - `language`, `author` and (optionally) `role` hold each distinct name exactly once
//! - `book` references them and is unique on (title, year, language)
//! - `paragraph` holds the body text, one row per paragraph, owned by its book
//!
//! Relations are created idempotently when a [`Database`] is opened. All reads and writes go
//! through [`DatabaseInstruction`]s, which always bind values as parameters.
//!
//! Deleting a row from a dimension relation cascades to every book that references it and
//! from there to the books' paragraphs. Nothing in this crate deletes dimension rows, but
//! anyone editing the database by hand should keep that in mind.
//!
//! # Examples
//!
//! ```no_run
//! use folio::{
//!   config::SchemaVariant,
//!   database::{Database, Dimension, Resolve},
//!   prelude::*,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut db = Database::open("books.db", SchemaVariant::WithRole).await?;
//! let english = Resolve::dimension(Dimension::Language, "English").execute(&mut db).await?;
//! assert_eq!(english, Resolve::dimension(Dimension::Language, "English").execute(&mut db).await?);
//! # Ok(())
//! # }
//! ```

use tokio_rusqlite::Connection;

use super::*;

pub mod instruction;

pub use self::instruction::*;

/// DDL for [`SchemaVariant::WithRole`].
const INIT_WITH_ROLE: &str =
  include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/migrations/init.sql"));
/// DDL for [`SchemaVariant::AuthorOnly`].
const INIT_AUTHOR_ONLY: &str =
  include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/migrations/init_author_only.sql"));
/// Drops every relation.
const RESET: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/migrations/reset.sql"));

/// Handle for the book database.
///
/// Wraps an async SQLite connection together with the schema variant the relations were
/// created with.
pub struct Database {
  /// Async SQLite connection handle
  conn:   Connection,
  /// Shape of the schema
  schema: SchemaVariant,
}

impl Database {
  /// Opens an existing database or creates a new one at `path`.
  ///
  /// Missing parent directories are created, and any missing relation of `schema` is
  /// created. An existing `book` relation created for the other schema variant is rejected
  /// with [`FolioError::Config`]; [`Database::open_reset`] replaces it instead.
  pub async fn open(path: impl AsRef<Path>, schema: SchemaVariant) -> Result<Self> {
    let db = Self::connect(path.as_ref(), schema).await?;
    if let Some(stored) = db.stored_schema().await? {
      if stored != schema {
        return Err(FolioError::Config(format!(
          "Database at {} was created with the {stored} schema but {schema} is configured; set            `schema = \"{stored}\"` or reset the database",
          path.as_ref().display()
        )));
      }
    }
    db.init_schema().await?;
    Ok(db)
  }

  /// Opens the database at `path`, drops every relation and creates those of `schema`.
  pub async fn open_reset(path: impl AsRef<Path>, schema: SchemaVariant) -> Result<Self> {
    let mut db = Self::connect(path.as_ref(), schema).await?;
    db.reset().await?;
    Ok(db)
  }

  /// Opens the connection, creating missing parent directories.
  async fn connect(path: &Path, schema: SchemaVariant) -> Result<Self> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path).await?;
    debug!(path = %path.display(), ?schema, "Opened database");
    Ok(Self { conn, schema })
  }

  /// The variant an existing `book` relation was created with, if there is one.
  async fn stored_schema(&self) -> Result<Option<SchemaVariant>> {
    let columns = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('book')")?;
        let columns =
          stmt.query_map([], |row| row.get::<_, String>(0))?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
      })
      .await?;

    if columns.is_empty() {
      Ok(None)
    } else if columns.iter().any(|column| column == "role_id") {
      Ok(Some(SchemaVariant::WithRole))
    } else {
      Ok(Some(SchemaVariant::AuthorOnly))
    }
  }

  /// Opens a database that lives only as long as the handle, for tests.
  pub async fn open_in_memory(schema: SchemaVariant) -> Result<Self> {
    let conn = Connection::open_in_memory().await?;
    let db = Self { conn, schema };
    db.init_schema().await?;
    Ok(db)
  }

  /// The schema variant of this database.
  pub fn schema(&self) -> SchemaVariant { self.schema }

  /// Drops every relation, including their rows, and creates them again.
  pub async fn reset(&mut self) -> Result<()> {
    warn!(schema = ?self.schema, "Dropping all relations");
    self
      .conn
      .call(|conn| {
        conn.execute_batch(RESET)?;
        Ok(())
      })
      .await?;
    self.init_schema().await
  }

  /// Runs the create-if-absent DDL for the schema variant.
  async fn init_schema(&self) -> Result<()> {
    let ddl = match self.schema {
      SchemaVariant::WithRole => INIT_WITH_ROLE,
      SchemaVariant::AuthorOnly => INIT_AUTHOR_ONLY,
    };
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(ddl)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Quotes a relation or attribute name for use in a statement.
///
/// Identifiers cannot be bound as parameters; wrapping them in double quotes and doubling any
/// embedded quote makes every name a single, inert identifier.
///
/// ```
/// use folio::database::quote_identifier;
///
/// assert_eq!(quote_identifier("author"), "\"author\"");
/// assert_eq!(quote_identifier("a\"; DROP TABLE book; --"), "\"a\"\"; DROP TABLE book; --\"");
/// ```
pub fn quote_identifier(name: &str) -> String { format!("\"{}\"", name.replace('"', "\"\"")) }
