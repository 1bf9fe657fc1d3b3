use super::*;

#[traced_test]
#[tokio::test]
async fn test_end_to_end() -> TestResult<()> {
  let (mut folio, dir) = create_test_folio(SchemaVariant::WithRole).await;
  let mut server = mockito::Server::new_async().await;
  let mock = serve(&mut server, "/cache/epub/1/pg1.txt", SYNTHETIC).await;

  let outcome = folio.ingest(&format!("{}/cache/epub/1/pg1.txt", server.url())).await?;
  mock.assert_async().await;

  let Outcome::Ingested(report) = outcome else {
    panic!("expected a new book, got {outcome:?}");
  };
  assert_eq!(report.metadata.title, "Foo");
  assert_eq!(report.metadata.author, "Bar");
  assert_eq!(report.metadata.language, "English");
  assert_eq!(report.metadata.year, 1999);
  assert_eq!(report.stats.paragraphs, 2);

  let counts = Stats.execute(folio.database_mut()).await?;
  assert_eq!(counts, TableCounts { languages: 1, authors: 1, roles: 1, books: 1, paragraphs: 2 });

  let books = ListBooks.execute(folio.database_mut()).await?;
  assert_eq!(books.len(), 1);
  assert_eq!(books[0].id, report.book_id);
  assert_eq!(books[0].metadata, report.metadata);

  let paragraphs = BookParagraphs::new(report.book_id).execute(folio.database_mut()).await?;
  assert_eq!(paragraphs, vec![
    "First paragraph, printed in 1999, spans two lines.",
    "Second paragraph."
  ]);

  // The artifact does not outlive the ingestion.
  assert!(!dir.path().join("downloads").join("pg1.txt").exists());
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_reingest_is_reported_not_stored() -> TestResult<()> {
  let (mut folio, dir) = create_test_folio(SchemaVariant::WithRole).await;
  let mut server = mockito::Server::new_async().await;
  let mock = server
    .mock("GET", "/pg1.txt")
    .with_status(200)
    .with_body(SYNTHETIC)
    .expect(2)
    .create_async()
    .await;
  let locator = format!("{}/pg1.txt", server.url());

  folio.ingest(&locator).await?;
  let before = Stats.execute(folio.database_mut()).await?;

  let outcome = folio.ingest(&locator).await?;
  mock.assert_async().await;

  match outcome {
    Outcome::AlreadyIngested(metadata) => assert_eq!(metadata.title, "Foo"),
    other => panic!("expected a duplicate, got {other:?}"),
  }
  assert_eq!(Stats.execute(folio.database_mut()).await?, before);
  assert!(!dir.path().join("downloads").join("pg1.txt").exists());
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_same_book_under_another_locator_is_a_duplicate() -> TestResult<()> {
  let (mut folio, _dir) = create_test_folio(SchemaVariant::WithRole).await;
  let mut server = mockito::Server::new_async().await;
  let _original = serve(&mut server, "/pg1.txt", SYNTHETIC).await;
  let _mirror = serve(&mut server, "/mirror1.txt", SYNTHETIC).await;

  folio.ingest(&format!("{}/pg1.txt", server.url())).await?;
  let outcome = folio.ingest(&format!("{}/mirror1.txt", server.url())).await?;

  assert!(matches!(outcome, Outcome::AlreadyIngested(_)));
  assert_eq!(Stats.execute(folio.database_mut()).await?.books, 1);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_unavailable_source() -> TestResult<()> {
  let (mut folio, _dir) = create_test_folio(SchemaVariant::WithRole).await;
  let mut server = mockito::Server::new_async().await;
  let _missing = server.mock("GET", "/pg404.txt").with_status(404).create_async().await;

  let err = folio.ingest(&format!("{}/pg404.txt", server.url())).await.unwrap_err();

  assert!(matches!(err, FolioError::Unavailable { status: 404, .. }));
  assert!(!err.is_fatal());
  assert_eq!(Stats.execute(folio.database_mut()).await?, TableCounts::default());
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_malformed_locator_is_never_requested() -> TestResult<()> {
  let (mut folio, _dir) = create_test_folio(SchemaVariant::WithRole).await;
  let mut server = mockito::Server::new_async().await;
  let mock = server.mock("GET", mockito::Matcher::Any).expect(0).create_async().await;

  for locator in [format!("{}/books/", server.url()), format!("{}/pg-1.txt", server.url())] {
    let err = folio.ingest(&locator).await.unwrap_err();
    assert!(matches!(err, FolioError::InvalidLocator(_)), "{locator}: {err}");
  }
  mock.assert_async().await;
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_unknown_year_sentinel() -> TestResult<()> {
  let (mut folio, _dir) = create_test_folio(SchemaVariant::AuthorOnly).await;
  let mut server = mockito::Server::new_async().await;
  let _undated = serve(&mut server, "/pg2.txt", "Title: Undated\nAuthor: Bar\nLanguage: English\n***\nNo year.\n")
    .await;

  let outcome = folio.ingest(&format!("{}/pg2.txt", server.url())).await?;

  let Outcome::Ingested(report) = outcome else { panic!("expected a new book") };
  assert_eq!(report.metadata.year, UNKNOWN_YEAR);
  assert!(!report.metadata.has_year());
  assert_eq!(Stats.execute(folio.database_mut()).await?.roles, 0);
  Ok(())
}
