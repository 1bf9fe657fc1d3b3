//! The book record protocol.
//!
//! A book is identified by (title, year, language). Ingestion first asks [`BookExists`] with
//! the language *name*, before any dimension row is created, so that a document already in
//! the store costs a single query. Only when the book is absent are the dimensions resolved
//! and [`AddBook`] issued. If a concurrent writer stored the same book in the meantime, the
//! insert is suppressed by the uniqueness constraint and yields `None`; callers follow up
//! with [`FindBook`].

use super::*;

/// How a book's language is referred to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageRef {
  /// By the name stored in the `language` relation.
  Name(String),
  /// By the `language` row identifier.
  Id(i64),
}

/// Checks whether a book with the given identity is stored.
///
/// # Examples
///
/// ```no_run
/// use folio::{
///   config::SchemaVariant,
///   database::{BookExists, Database},
///   prelude::*,
/// };
///
/// # async fn example() -> Result<(), FolioError> {
/// let mut db = Database::open_in_memory(SchemaVariant::WithRole).await?;
/// assert!(!BookExists::by_language_name("Emma", 1815, "English").execute(&mut db).await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BookExists {
  /// Title of the book.
  title:    String,
  /// Publication year, possibly the unknown-year sentinel.
  year:     i64,
  /// Language of the book.
  language: LanguageRef,
}

impl BookExists {
  /// Creates an existence check.
  pub fn new(title: &str, year: i64, language: LanguageRef) -> Self {
    Self { title: title.to_string(), year, language }
  }

  /// Creates an existence check keyed on the language name.
  pub fn by_language_name(title: &str, year: i64, language: &str) -> Self {
    Self::new(title, year, LanguageRef::Name(language.to_string()))
  }
}

#[async_trait]
impl DatabaseInstruction for BookExists {
  type Output = bool;

  async fn execute(&self, db: &mut Database) -> Result<Self::Output> {
    let title = self.title.clone();
    let year = self.year;
    let language = self.language.clone();

    let exists = db
      .conn
      .call(move |conn| {
        let exists = match language {
          LanguageRef::Name(name) => conn
            .prepare_cached(
              "SELECT EXISTS (
                 SELECT 1 FROM book b
                 JOIN language l ON l.id = b.language_id
                 WHERE b.title = ?1 AND b.year = ?2 AND l.name = ?3
               )",
            )?
            .query_row(params![title, year, name], |row| row.get::<_, bool>(0))?,
          LanguageRef::Id(id) => conn
            .prepare_cached(
              "SELECT EXISTS (
                 SELECT 1 FROM book WHERE title = ?1 AND year = ?2 AND language_id = ?3
               )",
            )?
            .query_row(params![title, year, id], |row| row.get::<_, bool>(0))?,
        };
        Ok(exists)
      })
      .await?;

    trace!(title = %self.title, year = self.year, exists, "Checked book existence");
    Ok(exists)
  }
}

/// Looks up the identifier of a stored book.
#[derive(Debug, Clone)]
pub struct FindBook {
  /// Title of the book.
  title:       String,
  /// Publication year.
  year:        i64,
  /// The `language` row of the book.
  language_id: i64,
}

impl FindBook {
  /// Creates a lookup by the full identity of a book.
  pub fn new(title: &str, year: i64, language_id: i64) -> Self {
    Self { title: title.to_string(), year, language_id }
  }
}

#[async_trait]
impl DatabaseInstruction for FindBook {
  type Output = Option<i64>;

  async fn execute(&self, db: &mut Database) -> Result<Self::Output> {
    let title = self.title.clone();
    let year = self.year;
    let language_id = self.language_id;

    Ok(
      db.conn
        .call(move |conn| {
          Ok(
            conn
              .prepare_cached(
                "SELECT id FROM book WHERE title = ?1 AND year = ?2 AND language_id = ?3",
              )?
              .query_row(params![title, year, language_id], |row| row.get::<_, i64>(0))
              .optional()?,
          )
        })
        .await?,
    )
  }
}

/// Inserts a book whose dimensions have all been resolved.
///
/// Yields the new identifier, or `None` when the uniqueness constraint suppressed the insert
/// because the same book was stored concurrently. `None` is not a success: the caller must
/// look the book up with [`FindBook`].
#[derive(Debug, Clone)]
pub struct AddBook {
  /// Title of the book.
  pub title:       String,
  /// Publication year, possibly the unknown-year sentinel.
  pub year:        i64,
  /// The `author` row.
  pub author_id:   i64,
  /// The `role` row; ignored by [`SchemaVariant::AuthorOnly`] databases.
  pub role_id:     Option<i64>,
  /// The `language` row.
  pub language_id: i64,
}

#[async_trait]
impl DatabaseInstruction for AddBook {
  type Output = Option<i64>;

  async fn execute(&self, db: &mut Database) -> Result<Self::Output> {
    let book = self.clone();
    let schema = db.schema;
    let ingested_at = Utc::now();

    let id = db
      .conn
      .call(move |conn| {
        let id = match schema {
          SchemaVariant::WithRole => conn
            .prepare_cached(
              "INSERT INTO book (title, year, author_id, role_id, language_id, ingested_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT (title, year, language_id) DO NOTHING
               RETURNING id",
            )?
            .query_row(
              params![
                book.title,
                book.year,
                book.author_id,
                book.role_id,
                book.language_id,
                ingested_at
              ],
              |row| row.get::<_, i64>(0),
            )
            .optional()?,
          SchemaVariant::AuthorOnly => conn
            .prepare_cached(
              "INSERT INTO book (title, year, author_id, language_id, ingested_at)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT (title, year, language_id) DO NOTHING
               RETURNING id",
            )?
            .query_row(
              params![book.title, book.year, book.author_id, book.language_id, ingested_at],
              |row| row.get::<_, i64>(0),
            )
            .optional()?,
        };
        Ok(id)
      })
      .await?;

    match id {
      Some(id) => debug!(title = %self.title, year = self.year, id, "Inserted book"),
      None => warn!(title = %self.title, year = self.year, "Book insert suppressed by a conflict"),
    }
    Ok(id)
  }
}
