//! Read-side queries over the stored catalog.

use super::*;

/// Row counts of every relation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
  /// Rows in `language`.
  pub languages:  i64,
  /// Rows in `author`.
  pub authors:    i64,
  /// Rows in `role`; always 0 for [`SchemaVariant::AuthorOnly`].
  pub roles:      i64,
  /// Rows in `book`.
  pub books:      i64,
  /// Rows in `paragraph`.
  pub paragraphs: i64,
}

/// Counts the rows of every relation.
#[derive(Debug, Clone, Copy)]
pub struct Stats;

#[async_trait]
impl DatabaseInstruction for Stats {
  type Output = TableCounts;

  async fn execute(&self, db: &mut Database) -> Result<Self::Output> {
    let schema = db.schema;
    Ok(
      db.conn
        .call(move |conn| {
          let count = |relation: &str| -> rusqlite::Result<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", quote_identifier(relation)), [], |row| {
              row.get(0)
            })
          };
          Ok(TableCounts {
            languages:  count("language")?,
            authors:    count("author")?,
            roles:      match schema {
              SchemaVariant::WithRole => count("role")?,
              SchemaVariant::AuthorOnly => 0,
            },
            books:      count("book")?,
            paragraphs: count("paragraph")?,
          })
        })
        .await?,
    )
  }
}

/// A stored book with its reference data resolved to names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
  /// Row identifier.
  pub id:          i64,
  /// The book's metadata as stored.
  pub metadata:    Metadata,
  /// Number of stored paragraphs.
  pub paragraphs:  i64,
  /// When the book row was written.
  pub ingested_at: DateTime<Utc>,
}

/// Lists every stored book, ordered by title then year.
#[derive(Debug, Clone, Copy)]
pub struct ListBooks;

#[async_trait]
impl DatabaseInstruction for ListBooks {
  type Output = Vec<BookRecord>;

  async fn execute(&self, db: &mut Database) -> Result<Self::Output> {
    let role = match db.schema {
      SchemaVariant::WithRole => "COALESCE(r.name, ?1)",
      SchemaVariant::AuthorOnly => "?1",
    };
    let role_join = match db.schema {
      SchemaVariant::WithRole => "LEFT JOIN role r ON r.id = b.role_id",
      SchemaVariant::AuthorOnly => "",
    };
    let sql = format!(
      "SELECT b.id, b.title, a.name, {role}, l.name, b.year, b.ingested_at,
              (SELECT COUNT(*) FROM paragraph p WHERE p.book_id = b.id)
       FROM book b
       JOIN author a ON a.id = b.author_id
       JOIN language l ON l.id = b.language_id
       {role_join}
       ORDER BY b.title, b.year"
    );

    Ok(
      db.conn
        .call(move |conn| {
          let mut stmt = conn.prepare(&sql)?;
          let books = stmt
            .query_map([document::DEFAULT_ROLE], |row| {
              Ok(BookRecord {
                id:          row.get(0)?,
                metadata:    Metadata {
                  title:    row.get(1)?,
                  author:   row.get(2)?,
                  role:     row.get(3)?,
                  language: row.get(4)?,
                  year:     row.get(5)?,
                },
                ingested_at: row.get(6)?,
                paragraphs:  row.get(7)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(books)
        })
        .await?,
    )
  }
}

/// The paragraphs of one book, in insertion order.
#[derive(Debug, Clone, Copy)]
pub struct BookParagraphs {
  /// The owning book.
  book_id: i64,
}

impl BookParagraphs {
  /// Creates the query for `book_id`.
  pub fn new(book_id: i64) -> Self { Self { book_id } }
}

#[async_trait]
impl DatabaseInstruction for BookParagraphs {
  type Output = Vec<String>;

  async fn execute(&self, db: &mut Database) -> Result<Self::Output> {
    let book_id = self.book_id;
    Ok(
      db.conn
        .call(move |conn| {
          let mut stmt =
            conn.prepare_cached("SELECT body FROM paragraph WHERE book_id = ?1 ORDER BY id")?;
          let bodies =
            stmt.query_map([book_id], |row| row.get::<_, String>(0))?.collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(bodies)
        })
        .await?,
    )
  }
}
