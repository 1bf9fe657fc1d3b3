//! Streaming persistence of a document body.
//!
//! [`Ingest`] reads a [`LineSource`] line by line, segments it with [`Paragraphs`], and stores
//! one `paragraph` row per paragraph. Rows are written in transactions of
//! [`IngestSettings::commit_every`] paragraphs, so progress becomes durable in bounded steps
//! and no more than one batch is ever held in memory. Every
//! [`IngestSettings::throttle_every`] paragraphs the ingester pauses for
//! [`IngestSettings::throttle_pause`] to stay polite towards the store and the source.
//!
//! # Examples
//!
//! ```no_run
//! use folio::{config::IngestSettings, database::Database, document::TextLines, ingest::Ingest};
//!
//! # async fn example(mut db: Database, book_id: i64) -> Result<(), Box<dyn std::error::Error>> {
//! let mut lines = TextLines::new("A\nB\n\nC\n".as_bytes());
//! let stats = Ingest::new(book_id, &IngestSettings::default()).run(&mut lines, &mut db).await?;
//! assert_eq!(stats.paragraphs, 2);
//! # Ok(())
//! # }
//! ```

use super::*;
use crate::database::AddParagraphs;

mod paragraph;

pub use self::paragraph::*;

/// Ingests the body of one book.
#[derive(Debug, Clone)]
pub struct Ingest {
  /// The book owning every stored paragraph.
  book_id:        i64,
  /// Paragraphs per transaction.
  commit_every:   usize,
  /// Paragraphs between pauses.
  throttle_every: usize,
  /// Length of each pause.
  throttle_pause: Duration,
}

impl Ingest {
  /// Creates an ingester for `book_id` tuned by `settings`.
  pub fn new(book_id: i64, settings: &IngestSettings) -> Self {
    Self {
      book_id,
      commit_every: settings.commit_every.max(1),
      throttle_every: settings.throttle_every.max(1),
      throttle_pause: settings.throttle_pause(),
    }
  }

  /// Streams `source` into the database and returns the counts of what was read.
  ///
  /// The counts reflect the stream itself. If a write fails, the paragraphs of earlier
  /// batches stay committed and the error is returned.
  pub async fn run<S: LineSource + ?Sized>(&self, source: &mut S, db: &mut Database) -> Result<IngestStats> {
    let mut paragraphs = Paragraphs::default();
    let mut pending = Vec::with_capacity(self.commit_every);
    let mut persisted = 0;

    while let Some(line) = source.next_line().await? {
      if let Some(paragraph) = paragraphs.push(&line) {
        pending.push(paragraph);
        if pending.len() >= self.commit_every {
          persisted = self.commit(&mut pending, persisted, db).await?;
        }
      }
    }
    if let Some(paragraph) = paragraphs.finish() {
      pending.push(paragraph);
    }
    if !pending.is_empty() {
      self.commit(&mut pending, persisted, db).await?;
    }

    let stats = paragraphs.stats();
    info!(
      book_id = self.book_id,
      paragraphs = stats.paragraphs,
      lines = stats.lines,
      characters = stats.characters,
      "Ingested body"
    );
    Ok(stats)
  }

  /// Writes the pending batch in one transaction, then pauses if a throttling boundary was
  /// crossed. Returns the new number of persisted paragraphs.
  async fn commit(&self, pending: &mut Vec<String>, persisted: usize, db: &mut Database) -> Result<usize> {
    let batch = std::mem::take(pending);
    let stored = AddParagraphs::new(self.book_id, batch).execute(db).await?;
    let total = persisted + stored;
    trace!(book_id = self.book_id, total, "Committed paragraph batch");

    if total / self.throttle_every > persisted / self.throttle_every {
      info!(book_id = self.book_id, "{total} paragraphs loaded");
      if !self.throttle_pause.is_zero() {
        tokio::time::sleep(self.throttle_pause).await;
      }
    }
    Ok(total)
  }
}

#[cfg(test)]
mod tests {
  use tokio::io::BufReader;

  use super::*;
  use crate::{
    database::{AddBook, BookParagraphs, Dimension, Resolve, Stats},
    document::TextLines,
  };

  /// An in-memory database holding one empty book.
  async fn book() -> (Database, i64) {
    let mut db = Database::open_in_memory(SchemaVariant::AuthorOnly).await.unwrap();
    let author_id =
      Resolve::dimension(Dimension::Author, "Jane Austen").execute(&mut db).await.unwrap();
    let language_id =
      Resolve::dimension(Dimension::Language, "English").execute(&mut db).await.unwrap();
    let id = AddBook { title: "Emma".into(), year: 1815, author_id, role_id: None, language_id }
      .execute(&mut db)
      .await
      .unwrap()
      .unwrap();
    (db, id)
  }

  fn settings(commit_every: usize) -> IngestSettings {
    IngestSettings { commit_every, throttle_every: 2, ..IngestSettings::unthrottled() }
  }

  #[traced_test]
  #[tokio::test]
  async fn test_final_paragraph_is_flushed() {
    let (mut db, id) = book().await;
    let mut lines = TextLines::new("A\nB\n\nC".as_bytes());

    let stats = Ingest::new(id, &settings(50)).run(&mut lines, &mut db).await.unwrap();

    assert_eq!(stats, IngestStats { characters: 3, lines: 4, paragraphs: 2 });
    assert_eq!(BookParagraphs::new(id).execute(&mut db).await.unwrap(), vec!["A B", "C"]);
  }

  #[traced_test]
  #[tokio::test]
  async fn test_batches_across_chunked_reads() {
    let (mut db, id) = book().await;
    let reader = tokio_test::io::Builder::new()
      .read(b"one\n\ntw")
      .read(b"o\n\nthree\n")
      .read(b"\n\n\nfour\n\nfive")
      .build();
    let mut lines = TextLines::new(BufReader::new(reader));

    let stats = Ingest::new(id, &settings(2)).run(&mut lines, &mut db).await.unwrap();

    assert_eq!(stats.paragraphs, 5);
    assert_eq!(BookParagraphs::new(id).execute(&mut db).await.unwrap(), vec![
      "one", "two", "three", "four", "five"
    ]);
    assert!(logs_contain("4 paragraphs loaded"));
  }

  #[traced_test]
  #[tokio::test]
  async fn test_empty_body() {
    let (mut db, id) = book().await;
    let mut lines = TextLines::new("\n\n  \n".as_bytes());

    let stats = Ingest::new(id, &settings(50)).run(&mut lines, &mut db).await.unwrap();

    assert_eq!(stats.paragraphs, 0);
    assert_eq!(Stats.execute(&mut db).await.unwrap().paragraphs, 0);
  }

  #[traced_test]
  #[tokio::test]
  async fn test_write_failure_is_returned() {
    let (mut db, id) = book().await;
    let mut lines = TextLines::new("a\n\nb\n\nc\n".as_bytes());

    // A missing book violates the foreign key on the first write.
    let result = Ingest::new(id + 1, &settings(1)).run(&mut lines, &mut db).await;

    assert!(result.is_err());
    assert_eq!(Stats.execute(&mut db).await.unwrap().paragraphs, 0);
  }
}
