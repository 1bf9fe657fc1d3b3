//! Remote sources of book texts.
//!
//! A [`Locator`] is a URL whose final path segment names a plain-text file, e.g.
//! `https://www.gutenberg.org/cache/epub/19337/pg19337.txt`. That segment doubles as the
//! name of the local [`Artifact`] the [`Fetcher`] streams the text into. An artifact lives
//! only as long as it takes to ingest it and is removed afterwards, whatever the outcome.
//!
//! # Examples
//!
//! ```no_run
//! use folio::source::{Fetcher, Locator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let locator = Locator::parse("https://www.gutenberg.org/cache/epub/19337/pg19337.txt")?;
//! let fetcher = Fetcher::new("/tmp/folio");
//! let artifact = fetcher.download(&locator).await?;
//! println!("Downloaded to {}", artifact.path().display());
//! artifact.discard().await;
//! # Ok(())
//! # }
//! ```

use futures::StreamExt;
use reqwest::StatusCode;
use tokio::io::AsyncWriteExt;
use url::Url;

use super::*;

lazy_static! {
  /// An alphanumeric file name with a `.txt` suffix, at the end of a path.
  static ref TEXT_FILE: Regex = Regex::new(r"/([A-Za-z0-9]+\.txt)$").unwrap();
}

/// A validated address of a remote plain-text book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
  /// The full address.
  url:       Url,
  /// Final path segment, used as the local artifact name.
  file_name: String,
}

impl Locator {
  /// Validates `locator`.
  ///
  /// Fails with [`FolioError::InvalidLocator`] when it is not an absolute URL or its path
  /// does not end in an alphanumeric name with a `.txt` suffix.
  ///
  /// ```
  /// use folio::source::Locator;
  ///
  /// let locator = Locator::parse("https://example.org/files/pg7.txt").unwrap();
  /// assert_eq!(locator.file_name(), "pg7.txt");
  ///
  /// assert!(Locator::parse("https://example.org/files/").is_err());
  /// assert!(Locator::parse("https://example.org/files/pg-7.txt").is_err());
  /// assert!(Locator::parse("pg7.txt").is_err());
  /// ```
  pub fn parse(locator: &str) -> Result<Self> {
    let invalid = || FolioError::InvalidLocator(locator.to_string());
    let url = Url::parse(locator.trim()).map_err(|_| invalid())?;
    let file_name = TEXT_FILE
      .captures(url.path())
      .and_then(|captures| captures.get(1))
      .map(|name| name.as_str().to_string())
      .ok_or_else(invalid)?;
    Ok(Self { url, file_name })
  }

  /// Name of the file the locator points at.
  pub fn file_name(&self) -> &str { &self.file_name }

  /// The full address.
  pub fn url(&self) -> &Url { &self.url }
}

impl FromStr for Locator {
  type Err = FolioError;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl Display for Locator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.url) }
}

/// Downloads books into a local directory.
#[derive(Debug, Clone)]
pub struct Fetcher {
  /// HTTP client, reused across downloads.
  client:       reqwest::Client,
  /// Where artifacts are written.
  download_dir: PathBuf,
}

impl Fetcher {
  /// Creates a fetcher writing into `download_dir`.
  pub fn new(download_dir: impl Into<PathBuf>) -> Self {
    Self { client: reqwest::Client::new(), download_dir: download_dir.into() }
  }

  /// The directory artifacts are written to.
  pub fn download_dir(&self) -> &Path { &self.download_dir }

  /// Streams the text behind `locator` into a local artifact.
  ///
  /// Anything other than `200 OK` fails with [`FolioError::Unavailable`] and leaves no file
  /// behind. A partially written file is removed when the transfer fails midway.
  pub async fn download(&self, locator: &Locator) -> Result<Artifact> {
    debug!(%locator, "Requesting document");
    let response = self.client.get(locator.url().clone()).send().await?;

    let status = response.status();
    if status != StatusCode::OK {
      trace!(%locator, ?response, "Source refused document");
      return Err(FolioError::Unavailable {
        locator: locator.to_string(),
        status:  status.as_u16(),
      });
    }

    tokio::fs::create_dir_all(&self.download_dir).await?;
    let artifact = Artifact { path: self.download_dir.join(locator.file_name()) };
    match artifact.write(response).await {
      Ok(bytes) => {
        debug!(%locator, path = %artifact.path.display(), bytes, "Downloaded document");
        Ok(artifact)
      },
      Err(e) => {
        artifact.discard().await;
        Err(e)
      },
    }
  }
}

/// A downloaded text on local disk.
#[derive(Debug)]
pub struct Artifact {
  /// Location of the file.
  path: PathBuf,
}

impl Artifact {
  /// Location of the file.
  pub fn path(&self) -> &Path { &self.path }

  /// Writes the response body chunk by chunk, returning the number of bytes written.
  async fn write(&self, response: reqwest::Response) -> Result<usize> {
    let mut file = tokio::fs::File::create(&self.path).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0;
    while let Some(chunk) = stream.next().await {
      let chunk = chunk?;
      file.write_all(&chunk).await?;
      written += chunk.len();
    }
    file.flush().await?;
    Ok(written)
  }

  /// Removes the file. A failure to remove it is logged, never returned.
  pub async fn discard(self) {
    match tokio::fs::remove_file(&self.path).await {
      Ok(()) => trace!(path = %self.path.display(), "Removed artifact"),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
      Err(e) => warn!(path = %self.path.display(), error = %e, "Could not remove artifact"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_locator() {
    let locator =
      Locator::parse("https://www.gutenberg.org/cache/epub/19337/pg19337.txt").unwrap();
    assert_eq!(locator.file_name(), "pg19337.txt");
    assert_eq!(locator.url().host_str(), Some("www.gutenberg.org"));
    assert_eq!(
      locator.to_string(),
      "https://www.gutenberg.org/cache/epub/19337/pg19337.txt"
    );
  }

  #[test]
  fn test_reject_malformed_locators() {
    for locator in [
      "",
      "not a url",
      "/local/path/pg1.txt",
      "https://example.org/",
      "https://example.org/book.pdf",
      "https://example.org/my_book.txt",
      "https://example.org/book.txt/",
    ] {
      assert!(
        matches!(Locator::parse(locator), Err(FolioError::InvalidLocator(_))),
        "{locator:?} should be rejected"
      );
    }
  }

  #[test]
  fn test_query_string_is_not_part_of_the_name() {
    let locator = Locator::parse("https://example.org/pg7.txt?mirror=1").unwrap();
    assert_eq!(locator.file_name(), "pg7.txt");
  }

  #[traced_test]
  #[tokio::test]
  async fn test_download_and_discard() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/files/pg7.txt")
      .with_status(200)
      .with_body("Title: Foo\n***\nBody\n")
      .create_async()
      .await;
    let dir = tempdir().unwrap();
    let fetcher = Fetcher::new(dir.path().join("downloads"));

    let locator = Locator::parse(&format!("{}/files/pg7.txt", server.url())).unwrap();
    let artifact = fetcher.download(&locator).await.unwrap();
    mock.assert_async().await;

    let path = artifact.path().to_path_buf();
    assert_eq!(path, dir.path().join("downloads").join("pg7.txt"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "Title: Foo\n***\nBody\n");

    artifact.discard().await;
    assert!(!path.exists());
  }

  #[traced_test]
  #[tokio::test]
  async fn test_non_ok_status_is_unavailable() {
    let mut server = mockito::Server::new_async().await;
    let _missing = server.mock("GET", "/pg404.txt").with_status(404).create_async().await;
    let _empty = server.mock("GET", "/pg204.txt").with_status(204).create_async().await;
    let dir = tempdir().unwrap();
    let fetcher = Fetcher::new(dir.path());

    for (name, expected) in [("pg404.txt", 404), ("pg204.txt", 204)] {
      let locator = Locator::parse(&format!("{}/{name}", server.url())).unwrap();
      match fetcher.download(&locator).await {
        Err(FolioError::Unavailable { status, .. }) => assert_eq!(status, expected),
        other => panic!("expected Unavailable, got {other:?}"),
      }
      assert!(!dir.path().join(name).exists());
    }
  }
}
