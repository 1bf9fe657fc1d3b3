//! Batched paragraph insertion.

use super::*;

/// Appends a batch of paragraphs to a book in a single transaction.
///
/// Yields the number of rows written. Paragraph order within the book is the insertion
/// order, which the `paragraph.id` column preserves.
#[derive(Debug, Clone)]
pub struct AddParagraphs {
  /// The owning book.
  book_id: i64,
  /// Paragraph bodies, in order.
  bodies:  Vec<String>,
}

impl AddParagraphs {
  /// Creates an insertion of `bodies` for `book_id`.
  pub fn new(book_id: i64, bodies: Vec<String>) -> Self { Self { book_id, bodies } }
}

#[async_trait]
impl DatabaseInstruction for AddParagraphs {
  type Output = usize;

  async fn execute(&self, db: &mut Database) -> Result<Self::Output> {
    if self.bodies.is_empty() {
      return Ok(0);
    }
    let book_id = self.book_id;
    let bodies = self.bodies.clone();

    let written = db
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut written = 0;
        {
          let mut stmt = tx.prepare_cached("INSERT INTO paragraph (body, book_id) VALUES (?1, ?2)")?;
          for body in &bodies {
            written += stmt.execute(params![body, book_id])?;
          }
        }
        tx.commit()?;
        Ok(written)
      })
      .await?;

    trace!(book_id, written, "Wrote paragraph batch");
    Ok(written)
  }
}
