//! Per-document orchestration and the batch driver.
//!
//! [`Folio`] owns the configuration, the database and the fetcher. Ingesting one document
//! always runs the same sequence:
//!
//! 1. Validate the locator and stream the text into a local artifact.
//! 2. Read the header and locate the publication year.
//! 3. Stop early with [`Outcome::AlreadyIngested`] if (title, year, language) is stored.
//! 4. Resolve author, role and language to identifiers.
//! 5. Insert the book.
//! 6. Stream the body into paragraphs.
//! 7. Remove the artifact, whatever happened before.
//!
//! [`Folio::ingest_all`] runs that sequence for many locators, one after the other, with a
//! randomized pause in between. A failure of one document is reported and skipped; only
//! errors for which [`FolioError::is_fatal`] holds end the batch.

use rand::Rng;

use super::*;
use crate::database::{AddBook, BookExists, Dimension, FindBook, Resolve};

/// Result of ingesting one document that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// The document was stored.
  Ingested(IngestReport),
  /// A book with the same (title, year, language) was already stored; nothing was written.
  AlreadyIngested(Metadata),
}

/// What was stored for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
  /// Identifier of the new `book` row.
  pub book_id:  i64,
  /// Metadata read from the header.
  pub metadata: Metadata,
  /// Counts of the streamed body.
  pub stats:    IngestStats,
}

/// Tally of a multi-document run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
  /// Documents stored.
  pub ingested:   usize,
  /// Documents that were already stored.
  pub duplicates: usize,
  /// Documents skipped because of a per-document error.
  pub skipped:    usize,
}

impl BatchReport {
  /// Documents processed in total.
  pub fn total(&self) -> usize { self.ingested + self.duplicates + self.skipped }
}

impl Display for BatchReport {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{} ingested, {} already present, {} skipped",
      self.ingested, self.duplicates, self.skipped
    )
  }
}

/// The ingestion pipeline bound to one configuration and one database.
///
/// # Examples
///
/// ```no_run
/// use folio::{config::IngestSettings, Config, Folio};
///
/// # async fn example() -> Result<(), folio::error::FolioError> {
/// let config = Config::default().with_ingest(IngestSettings::unthrottled());
/// let mut folio = Folio::open(config).await?;
///
/// let locators = (1..=3).map(|id| folio.config().locator_for(id)).collect::<Vec<_>>();
/// let report = folio
///   .ingest_all(&locators, |locator, outcome| match outcome {
///     Ok(outcome) => println!("{locator}: {outcome:?}"),
///     Err(e) => eprintln!("{locator}: {e}"),
///   })
///   .await?;
/// println!("{report}");
/// # Ok(())
/// # }
/// ```
pub struct Folio {
  /// Configuration the instance was opened with.
  config:   Config,
  /// The book database.
  database: Database,
  /// Downloads artifacts into [`Config::download_path`].
  fetcher:  Fetcher,
}

impl Folio {
  /// Validates `config` and opens its database, creating relations as needed.
  pub async fn open(config: Config) -> Result<Self> {
    config.validate()?;
    let database = Database::open(&config.database_path, config.schema).await?;
    let fetcher = Fetcher::new(&config.download_path);
    debug!(
      database = %config.database_path.display(),
      downloads = %config.download_path.display(),
      "Opened folio"
    );
    Ok(Self { config, database, fetcher })
  }

  /// Validates `config`, then opens its database with every relation dropped and created
  /// again for the configured schema variant.
  pub async fn open_reset(config: Config) -> Result<Self> {
    config.validate()?;
    let database = Database::open_reset(&config.database_path, config.schema).await?;
    let fetcher = Fetcher::new(&config.download_path);
    Ok(Self { config, database, fetcher })
  }

  /// The configuration in use.
  pub fn config(&self) -> &Config { &self.config }

  /// The underlying database, for running queries.
  pub fn database_mut(&mut self) -> &mut Database { &mut self.database }

  /// Drops and recreates every relation.
  pub async fn reset(&mut self) -> Result<()> { self.database.reset().await }

  /// Downloads and ingests the document behind `locator`.
  ///
  /// The downloaded artifact is removed before returning, on success and on failure.
  pub async fn ingest(&mut self, locator: &str) -> Result<Outcome> {
    let locator = Locator::parse(locator)?;
    let artifact = self.fetcher.download(&locator).await?;
    let outcome = self.ingest_document(artifact.path()).await;
    artifact.discard().await;

    match &outcome {
      Ok(Outcome::Ingested(report)) =>
        info!(%locator, book_id = report.book_id, paragraphs = report.stats.paragraphs, "Ingested document"),
      Ok(Outcome::AlreadyIngested(metadata)) =>
        info!(%locator, %metadata, "Document already ingested"),
      Err(e) => warn!(%locator, error = %e, "Failed to ingest document"),
    }
    outcome
  }

  /// Ingests a text file that is already on local disk. The file is left in place.
  pub async fn ingest_file(&mut self, path: impl AsRef<Path>) -> Result<Outcome> {
    self.ingest_document(path.as_ref()).await
  }

  /// Ingests each of `locators` in turn, reporting every result to `on_outcome`.
  ///
  /// Per-document failures are counted as skipped. The first fatal error ends the run and is
  /// returned.
  pub async fn ingest_all<I, S, F>(&mut self, locators: I, mut on_outcome: F) -> Result<BatchReport>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(&str, &Result<Outcome>), {
    let mut report = BatchReport::default();

    for (index, locator) in locators.into_iter().enumerate() {
      let locator = locator.as_ref();
      if index > 0 {
        self.backoff().await;
      }

      let outcome = self.ingest(locator).await;
      on_outcome(locator, &outcome);
      match outcome {
        Ok(Outcome::Ingested(_)) => report.ingested += 1,
        Ok(Outcome::AlreadyIngested(_)) => report.duplicates += 1,
        Err(e) if e.is_fatal() => return Err(e),
        Err(_) => report.skipped += 1,
      }
    }

    info!(%report, "Finished batch");
    Ok(report)
  }

  /// Reads, deduplicates and stores one document on disk.
  async fn ingest_document(&mut self, path: &Path) -> Result<Outcome> {
    let settings = &self.config.ingest;
    let mut document = Document::open(path, settings.year_window, settings.header_limit).await?;
    let metadata = document.metadata.clone();
    let db = &mut self.database;

    if BookExists::by_language_name(&metadata.title, metadata.year, &metadata.language)
      .execute(db)
      .await?
    {
      return Ok(Outcome::AlreadyIngested(metadata));
    }

    let author_id = Resolve::dimension(Dimension::Author, &metadata.author).execute(db).await?;
    let role_id = match db.schema() {
      SchemaVariant::WithRole =>
        Some(Resolve::dimension(Dimension::Role, &metadata.role).execute(db).await?),
      SchemaVariant::AuthorOnly => None,
    };
    let language_id =
      Resolve::dimension(Dimension::Language, &metadata.language).execute(db).await?;

    let book = AddBook { title: metadata.title.clone(), year: metadata.year, author_id, role_id, language_id };
    let book_id = match book.execute(db).await? {
      Some(id) => id,
      // Stored by another writer since the existence check.
      None => match FindBook::new(&metadata.title, metadata.year, language_id).execute(db).await? {
        Some(_) => return Ok(Outcome::AlreadyIngested(metadata)),
        None => return Err(FolioError::NotFound("book".to_string())),
      },
    };

    let stats = Ingest::new(book_id, settings).run(&mut document.body, db).await?;
    Ok(Outcome::Ingested(IngestReport { book_id, metadata, stats }))
  }

  /// Sleeps for a random duration within the configured backoff bounds.
  async fn backoff(&self) {
    let (min, max) = (self.config.ingest.backoff_min_ms, self.config.ingest.backoff_max_ms);
    if max == 0 {
      return;
    }
    let millis = rand::thread_rng().gen_range(min..=max);
    trace!(millis, "Pausing before the next document");
    tokio::time::sleep(Duration::from_millis(millis)).await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::database::{BookParagraphs, ListBooks, Stats, TableCounts};

  const EMMA: &str = "Title: Emma\nAuthor: Jane Austen\nLanguage: English\n\n*** START ***\n\
                      First published 1815.\n\nChapter I\n\nEmma Woodhouse, handsome,\nclever, \
                      and rich.\n*** END ***\n";

  async fn open(dir: &Path, schema: SchemaVariant) -> Folio {
    let config = Config::default()
      .with_database_path(&dir.join("books.db"))
      .with_download_path(&dir.join("downloads"))
      .with_schema(schema)
      .with_ingest(IngestSettings::unthrottled());
    Folio::open(config).await.unwrap()
  }

  #[traced_test]
  #[tokio::test]
  async fn test_ingest_local_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("emma.txt");
    std::fs::write(&path, EMMA).unwrap();
    let mut folio = open(dir.path(), SchemaVariant::WithRole).await;

    let Outcome::Ingested(report) = folio.ingest_file(&path).await.unwrap() else {
      panic!("expected the document to be ingested");
    };
    assert_eq!(report.metadata.year, 1815);
    assert_eq!(report.stats.paragraphs, 3);
    assert!(path.exists());

    let books = ListBooks.execute(folio.database_mut()).await.unwrap();
    assert_eq!(books[0].metadata.author, "Jane Austen");
    assert_eq!(books[0].paragraphs, 3);
  }

  #[traced_test]
  #[tokio::test]
  async fn test_duplicate_writes_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("emma.txt");
    std::fs::write(&path, EMMA).unwrap();
    let mut folio = open(dir.path(), SchemaVariant::WithRole).await;

    folio.ingest_file(&path).await.unwrap();
    let before = Stats.execute(folio.database_mut()).await.unwrap();

    let outcome = folio.ingest_file(&path).await.unwrap();
    assert!(matches!(outcome, Outcome::AlreadyIngested(ref metadata) if metadata.title == "Emma"));
    assert_eq!(Stats.execute(folio.database_mut()).await.unwrap(), before);
  }

  #[traced_test]
  #[tokio::test]
  async fn test_contributor_role_is_stored() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("anthology.txt");
    std::fs::write(&path, "Title: Anthology\nEditor: Some One\n***\nText.\n").unwrap();
    let mut folio = open(dir.path(), SchemaVariant::WithRole).await;

    folio.ingest_file(&path).await.unwrap();

    let books = ListBooks.execute(folio.database_mut()).await.unwrap();
    assert_eq!(books[0].metadata.role, "editor");
    assert_eq!(books[0].metadata.language, document::UNKNOWN);
    assert_eq!(books[0].metadata.year, document::UNKNOWN_YEAR);
    assert_eq!(Stats.execute(folio.database_mut()).await.unwrap().roles, 1);
  }

  #[traced_test]
  #[tokio::test]
  async fn test_latin1_byte_does_not_truncate_book() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("latin1.txt");
    let mut text = b"Title: Menu\nAuthor: Chef\nLanguage: French\n***\nPrinted 1901.\n\n".to_vec();
    for i in 0..300 {
      text.extend_from_slice(format!("Paragraph {i}.\n\n").as_bytes());
    }
    text.extend_from_slice(b"Caf\xe9 noir.\n\nFin.\n");
    std::fs::write(&path, text).unwrap();
    let mut folio = open(dir.path(), SchemaVariant::WithRole).await;

    let Outcome::Ingested(report) = folio.ingest_file(&path).await.unwrap() else {
      panic!("expected the document to be ingested");
    };
    assert_eq!(report.stats.paragraphs, 303);

    let paragraphs = BookParagraphs::new(report.book_id).execute(folio.database_mut()).await.unwrap();
    assert_eq!(paragraphs.len(), 303);
    assert_eq!(paragraphs[301], "Caf\u{FFFD} noir.");
    assert_eq!(paragraphs[302], "Fin.");
  }

  #[traced_test]
  #[tokio::test]
  async fn test_book_stored_by_another_writer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("emma.txt");
    std::fs::write(&path, EMMA).unwrap();
    let mut folio = open(dir.path(), SchemaVariant::WithRole).await;

    // A second connection stores the book between the existence check and the insert.
    rusqlite::Connection::open(dir.path().join("books.db"))
      .unwrap()
      .execute_batch(
        "CREATE TRIGGER book_race BEFORE INSERT ON book
         BEGIN
           INSERT INTO book (title, year, author_id, role_id, language_id, ingested_at)
           VALUES (NEW.title, NEW.year, NEW.author_id, NEW.role_id, NEW.language_id, NEW.ingested_at);
         END;",
      )
      .unwrap();

    let outcome = folio.ingest_file(&path).await.unwrap();
    assert!(matches!(outcome, Outcome::AlreadyIngested(ref metadata) if metadata.title == "Emma"));

    let counts = Stats.execute(folio.database_mut()).await.unwrap();
    assert_eq!((counts.books, counts.paragraphs), (1, 0));
  }

  #[traced_test]
  #[tokio::test]
  async fn test_author_only_schema() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("emma.txt");
    std::fs::write(&path, EMMA).unwrap();
    let mut folio = open(dir.path(), SchemaVariant::AuthorOnly).await;

    assert!(matches!(folio.ingest_file(&path).await.unwrap(), Outcome::Ingested(_)));
    let counts = Stats.execute(folio.database_mut()).await.unwrap();
    assert_eq!((counts.authors, counts.roles, counts.books), (1, 0, 1));
  }

  #[traced_test]
  #[tokio::test]
  async fn test_missing_delimiter_stores_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.txt");
    std::fs::write(&path, "Title: Broken\nAuthor: Nobody\n\nNo delimiter anywhere.\n").unwrap();
    let mut folio = open(dir.path(), SchemaVariant::WithRole).await;

    let err = folio.ingest_file(&path).await.unwrap_err();
    assert!(matches!(err, FolioError::MissingDelimiter(_)));
    assert!(!err.is_fatal());
    assert_eq!(Stats.execute(folio.database_mut()).await.unwrap(), TableCounts::default());
  }

  #[traced_test]
  #[tokio::test]
  async fn test_invalid_config_is_rejected() {
    let dir = tempdir().unwrap();
    let config = Config::default()
      .with_database_path(&dir.path().join("books.db"))
      .with_source_template("https://example.org/static.txt");
    assert!(matches!(Folio::open(config).await, Err(FolioError::Config(_))));
  }

  #[test]
  fn test_batch_report_display() {
    let report = BatchReport { ingested: 2, duplicates: 1, skipped: 3 };
    assert_eq!(report.total(), 6);
    assert_eq!(report.to_string(), "2 ingested, 1 already present, 3 skipped");
  }
}
