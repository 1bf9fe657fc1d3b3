use folio::database::{AddBook, AddParagraphs, Dimension, Resolve};

use super::*;

#[traced_test]
#[tokio::test]
async fn test_rows_survive_reopen() -> TestResult<()> {
  let dir = tempdir()?;
  let path = dir.path().join("books.db");

  {
    let mut db = Database::open(&path, SchemaVariant::WithRole).await?;
    let author_id = Resolve::dimension(Dimension::Author, "Bar").execute(&mut db).await?;
    let role_id = Resolve::dimension(Dimension::Role, "author").execute(&mut db).await?;
    let language_id = Resolve::dimension(Dimension::Language, "English").execute(&mut db).await?;
    let book_id = AddBook {
      title: "Foo".into(),
      year: 1999,
      author_id,
      role_id: Some(role_id),
      language_id,
    }
    .execute(&mut db)
    .await?
    .unwrap();
    AddParagraphs::new(book_id, vec!["One.".into()]).execute(&mut db).await?;
  }

  let mut db = Database::open(&path, SchemaVariant::WithRole).await?;
  assert_eq!(Stats.execute(&mut db).await?, TableCounts {
    languages:  1,
    authors:    1,
    roles:      1,
    books:      1,
    paragraphs: 1,
  });

  // The existing row is found rather than duplicated.
  Resolve::dimension(Dimension::Author, "Bar").execute(&mut db).await?;
  assert_eq!(Stats.execute(&mut db).await?.authors, 1);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_reset_on_disk() -> TestResult<()> {
  let (mut folio, _dir) = create_test_folio(SchemaVariant::WithRole).await;
  let mut server = mockito::Server::new_async().await;
  let _book = serve(&mut server, "/pg1.txt", SYNTHETIC).await;

  folio.ingest(&format!("{}/pg1.txt", server.url())).await?;
  assert_eq!(Stats.execute(folio.database_mut()).await?.books, 1);

  folio.reset().await?;
  assert_eq!(Stats.execute(folio.database_mut()).await?, TableCounts::default());

  // A reset store accepts the same document again.
  let outcome = folio.ingest(&format!("{}/pg1.txt", server.url())).await?;
  assert!(matches!(outcome, Outcome::Ingested(_)));
  Ok(())
}
