use super::*;

#[traced_test]
#[tokio::test]
async fn test_batch_skips_failures_and_continues() -> TestResult<()> {
  let (mut folio, _dir) = create_test_folio(SchemaVariant::WithRole).await;
  let mut server = mockito::Server::new_async().await;
  let _first = serve(&mut server, "/pg1.txt", SYNTHETIC).await;
  let _failing = server.mock("GET", "/pg2.txt").with_status(500).create_async().await;
  let _third = serve(&mut server, "/pg3.txt", "Title: Bar\nAuthor: Baz\nLanguage: French\n***\nUn.\n\nDeux.\n")
    .await;
  let _duplicate = serve(&mut server, "/pg4.txt", SYNTHETIC).await;

  let locators = vec![
    format!("{}/pg1.txt", server.url()),
    format!("{}/pg2.txt", server.url()),
    "not a locator".to_string(),
    format!("{}/pg3.txt", server.url()),
    format!("{}/pg4.txt", server.url()),
  ];

  let mut seen = Vec::new();
  let report = folio
    .ingest_all(&locators, |locator, outcome| seen.push((locator.to_string(), outcome.is_ok())))
    .await?;

  assert_eq!(report, BatchReport { ingested: 2, duplicates: 1, skipped: 2 });
  assert_eq!(report.total(), locators.len());
  assert_eq!(
    seen.iter().map(|(_, ok)| *ok).collect::<Vec<_>>(),
    vec![true, false, false, true, true]
  );
  assert_eq!(seen[2].0, "not a locator");

  let counts = Stats.execute(folio.database_mut()).await?;
  assert_eq!((counts.books, counts.languages, counts.paragraphs), (2, 2, 4));
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_empty_batch() -> TestResult<()> {
  let (mut folio, _dir) = create_test_folio(SchemaVariant::WithRole).await;
  let report = folio.ingest_all(Vec::<String>::new(), |_, _| {}).await?;
  assert_eq!(report, BatchReport::default());
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_locators_from_template() -> TestResult<()> {
  let dir = tempdir()?;
  let mut server = mockito::Server::new_async().await;
  let _book = serve(&mut server, "/cache/epub/7/pg7.txt", SYNTHETIC).await;
  let config =
    test_config(dir.path()).with_source_template(format!("{}/cache/epub/{{id}}/pg{{id}}.txt", server.url()));
  let mut folio = Folio::open(config).await?;

  let locator = folio.config().locator_for(7);
  let report = folio.ingest_all([locator], |_, _| {}).await?;

  assert_eq!(report.ingested, 1);
  Ok(())
}
