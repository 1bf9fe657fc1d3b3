//! Reading a downloaded book: header, publication year and body.
//!
//! A [`Document`] is read in a single forward pass over the file:
//!
//! 1. Header lines are collected into a [`Header`] until the `***` delimiter.
//! 2. Unless the header states an original publication year, up to `year_window` lines after
//!    the delimiter are buffered and searched for a year.
//! 3. The remaining stream, starting with the buffered lines, is exposed as a [`Body`] that
//!    ends at the archive's end marker or at the end of the file.
//!
//! Only the header and the bounded year window are ever held in memory. Bytes that are not
//! valid UTF-8 are replaced rather than ending the read.
//!
//! # Examples
//!
//! ```no_run
//! use folio::{document::Document, prelude::*};
//!
//! # async fn example() -> Result<(), FolioError> {
//! let mut document = Document::open("pg19337.txt", 500, 1_000).await?;
//! println!("{} ({})", document.metadata.title, document.metadata.year);
//! while let Some(line) = document.body.next_line().await? {
//!   println!("{line}");
//! }
//! # Ok(())
//! # }
//! ```

use std::borrow::Cow;

use tokio::{
  fs::File,
  io::{AsyncBufRead, AsyncBufReadExt, BufReader},
};

use super::*;

pub mod header;
pub mod year;

pub use self::{header::*, year::*};

/// Bibliographic metadata of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
  /// Title, or [`UNKNOWN`].
  pub title:    String,
  /// First contributor, or [`UNKNOWN`].
  pub author:   String,
  /// The contributor's role, e.g. `author` or `editor`.
  pub role:     String,
  /// Language name, or [`UNKNOWN`].
  pub language: String,
  /// Publication year, or [`UNKNOWN_YEAR`].
  pub year:     i64,
}

impl Metadata {
  /// Metadata described by `header`, with the year found by the caller.
  pub fn from_header(header: &Header, year: i64) -> Self {
    let (author, role) = header.contributor();
    Self {
      title: header.title().to_string(),
      author: author.to_string(),
      role: role.to_string(),
      language: header.language().to_string(),
      year,
    }
  }

  /// Whether a publication year was found.
  pub fn has_year(&self) -> bool { self.year != UNKNOWN_YEAR }
}

impl Display for Metadata {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} \"{}\" ({}, ", self.author, self.title, self.language)?;
    if self.has_year() {
      write!(f, "{})", self.year)
    } else {
      write!(f, "year unknown)")
    }
  }
}

/// A source of text lines read one at a time.
#[async_trait]
pub trait LineSource: Send {
  /// The next line without its terminator, or `None` at the end of the source.
  async fn next_line(&mut self) -> Result<Option<String>>;
}

/// Lines of a byte stream, decoded as UTF-8 with invalid sequences replaced by U+FFFD.
///
/// Older archive files are often Latin-1; a stray byte costs one character, not the rest of
/// the book. Line terminators (`\n` or `\r\n`) are stripped.
pub struct TextLines<R> {
  /// The underlying reader.
  reader: R,
  /// Bytes of the line being read.
  buf:    Vec<u8>,
}

impl<R: AsyncBufRead + Unpin + Send> TextLines<R> {
  /// Reads lines from `reader`.
  pub fn new(reader: R) -> Self { Self { reader, buf: Vec::new() } }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> LineSource for TextLines<R> {
  async fn next_line(&mut self) -> Result<Option<String>> {
    self.buf.clear();
    if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
      return Ok(None);
    }
    if self.buf.ends_with(b"\n") {
      self.buf.pop();
      if self.buf.ends_with(b"\r") {
        self.buf.pop();
      }
    }
    let line = match String::from_utf8_lossy(&self.buf) {
      Cow::Borrowed(line) => line.to_string(),
      Cow::Owned(line) => {
        debug!(%line, "Replaced bytes that are not valid UTF-8");
        line
      },
    };
    Ok(Some(line))
  }
}

/// The body of a document: the lines between the opening delimiter and the end marker.
pub struct Body<R> {
  /// Lines already read while searching for the year, replayed first.
  buffered: VecDeque<String>,
  /// The rest of the underlying stream.
  lines:    TextLines<R>,
  /// Set once the end marker or the end of the stream has been reached.
  finished: bool,
}

impl<R: AsyncBufRead + Unpin + Send> Body<R> {
  /// Wraps the remaining stream, replaying `buffered` lines first.
  fn new(buffered: VecDeque<String>, lines: TextLines<R>) -> Self {
    Self { buffered, lines, finished: false }
  }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> LineSource for Body<R> {
  async fn next_line(&mut self) -> Result<Option<String>> {
    if self.finished {
      return Ok(None);
    }
    let line = match self.buffered.pop_front() {
      Some(line) => Some(line),
      None => self.lines.next_line().await?,
    };
    match line {
      Some(line) if !is_closing_delimiter(&line) => Ok(Some(line)),
      Some(_) => {
        debug!("Reached end marker");
        self.finished = true;
        Ok(None)
      },
      None => {
        self.finished = true;
        Ok(None)
      },
    }
  }
}

/// A document whose header has been read and whose body is ready to stream.
pub struct Document<R> {
  /// Metadata from the header and the year search.
  pub metadata: Metadata,
  /// The parsed header block.
  pub header:   Header,
  /// The body stream.
  pub body:     Body<R>,
}

impl Document<BufReader<File>> {
  /// Opens a text file on disk and reads its header.
  pub async fn open(path: impl AsRef<Path>, year_window: usize, header_limit: usize) -> Result<Self> {
    let file = File::open(path.as_ref()).await?;
    debug!(path = %path.as_ref().display(), "Opened document");
    Self::read(BufReader::new(file), year_window, header_limit).await
  }
}

impl<R: AsyncBufRead + Unpin + Send> Document<R> {
  /// Reads the header of `reader` and positions the body right after the delimiter.
  ///
  /// Fails with [`FolioError::MissingDelimiter`] when the delimiter does not follow within
  /// `header_limit` header lines.
  pub async fn read(reader: R, year_window: usize, header_limit: usize) -> Result<Self> {
    let mut lines = TextLines::new(reader);
    let mut header = Header::default();

    loop {
      match lines.next_line().await? {
        Some(line) if is_delimiter(&line) => break,
        Some(_) if header.lines().len() >= header_limit =>
          return Err(FolioError::MissingDelimiter(header_limit)),
        Some(line) => header.push_line(&line),
        None => return Err(FolioError::MissingDelimiter(header.lines().len())),
      }
    }

    let mut buffered = VecDeque::new();
    let year = match header.original_publication() {
      Some(year) => year,
      None => {
        while buffered.len() < year_window {
          match lines.next_line().await? {
            Some(line) => {
              let closing = is_closing_delimiter(&line);
              buffered.push_back(line);
              if closing {
                break;
              }
            },
            None => break,
          }
        }
        search_window(&buffered, year_window)
      },
    };

    let metadata = Metadata::from_header(&header, year);
    debug!(%metadata, "Read document header");
    Ok(Self { metadata, header, body: Body::new(buffered, lines) })
  }
}
