//! Catalog header parsing.
//!
//! Every book in the archive starts with a block of `Label: value` lines describing it,
//! closed by a line beginning with [`DELIMITER`]. The block is read once into a [`Header`];
//! afterwards each field lookup is a pure read of that mapping, so independent lookups never
//! interfere with each other or with the body stream.

use super::*;

/// Marker that opens the body of a document.
pub const DELIMITER: &str = "***";

/// Value reported for a field that the header does not carry.
pub const UNKNOWN: &str = "unknown";

/// Contributor labels, in order of preference. The matched label is the contributor's role.
pub const CONTRIBUTOR_LABELS: [&str; 7] =
  ["author", "creator", "editor", "compiler", "translator", "contributor", "illustrator"];

/// Role recorded when the header names no contributor at all.
pub const DEFAULT_ROLE: &str = "author";

lazy_static! {
  /// A `Label: value` line. Labels start at the beginning of the line.
  static ref LABELED_LINE: Regex = Regex::new(r"^([A-Za-z][A-Za-z ]*?):\s*(.*?)\s*$").unwrap();
  /// The first alphabetic word of a language field, e.g. `English` in `English, French`.
  static ref LANGUAGE_WORD: Regex = Regex::new(r"^([A-Za-z]+)").unwrap();
  /// A trailing 4-digit year, as in `Original publication: London: Macmillan, 1887`.
  static ref TRAILING_YEAR: Regex = Regex::new(r"(\d{4})\W*$").unwrap();
  /// The archive's end marker, e.g. `*** END OF THE PROJECT GUTENBERG EBOOK EMMA ***`.
  static ref CLOSING_MARKER: Regex = Regex::new(r"^\*{3}\s*END\b").unwrap();
}

/// Whether `line` ends the header block and opens the body.
pub fn is_delimiter(line: &str) -> bool { line.starts_with(DELIMITER) }

/// Whether `line` closes a document body.
///
/// Only the archive's end marker counts; a bare `***` inside the body is a scene break.
///
/// ```
/// use folio::document::is_closing_delimiter;
///
/// assert!(is_closing_delimiter("*** END OF THE PROJECT GUTENBERG EBOOK EMMA ***"));
/// assert!(is_closing_delimiter("***END OF THIS PROJECT GUTENBERG EBOOK***"));
/// assert!(!is_closing_delimiter("***"));
/// assert!(!is_closing_delimiter("*** Endnotes"));
/// ```
pub fn is_closing_delimiter(line: &str) -> bool { CLOSING_MARKER.is_match(line) }

/// The parsed header block of one document.
///
/// # Examples
///
/// ```
/// use folio::document::{Header, UNKNOWN};
///
/// let header = Header::parse(["Title: Foo", "Author: Bar", "Language: English, French"]);
/// assert_eq!(header.title(), "Foo");
/// assert_eq!(header.contributor(), ("Bar", "author"));
/// assert_eq!(header.language(), "English");
/// assert_eq!(header.field_or_unknown("Release date"), UNKNOWN);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Header {
  /// Raw header lines, in order.
  lines:      Vec<String>,
  /// First value seen for each lowercase label.
  fields:     BTreeMap<String, String>,
  /// Label of the most recent labeled line, extended by continuation lines.
  last_label: Option<String>,
}

impl Header {
  /// Builds a header from lines that precede the delimiter.
  ///
  /// Lines are consumed up to, not including, the first delimiter line.
  pub fn parse<I, S>(lines: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>, {
    let mut header = Header::default();
    for line in lines {
      let line = line.as_ref();
      if is_delimiter(line) {
        break;
      }
      header.push_line(line);
    }
    header
  }

  /// Adds one header line.
  ///
  /// An indented line directly following a labeled line continues that field's value, which
  /// is how long titles wrap in the archive's format. A blank line ends the continuation.
  pub fn push_line(&mut self, line: &str) {
    self.lines.push(line.to_string());

    if line.trim().is_empty() {
      self.last_label = None;
      return;
    }

    if line.starts_with(char::is_whitespace) {
      if let Some(value) = self.last_label.as_ref().and_then(|label| self.fields.get_mut(label)) {
        value.push(' ');
        value.push_str(line.trim());
      }
      return;
    }

    self.last_label = None;
    if let Some(captures) = LABELED_LINE.captures(line) {
      let label = captures[1].trim().to_lowercase();
      let value = captures[2].to_string();
      if value.is_empty() || self.fields.contains_key(&label) {
        return;
      }
      trace!(%label, %value, "Header field");
      self.fields.insert(label.clone(), value);
      self.last_label = Some(label);
    }
  }

  /// The raw header lines.
  pub fn lines(&self) -> &[String] { &self.lines }

  /// The value of `label` (case-insensitive), if the header carries it.
  pub fn field(&self, label: &str) -> Option<&str> {
    self.fields.get(&label.to_lowercase()).map(String::as_str)
  }

  /// The value of `label`, or [`UNKNOWN`].
  pub fn field_or_unknown(&self, label: &str) -> &str { self.field(label).unwrap_or(UNKNOWN) }

  /// Matches `pattern` against each raw header line and returns the capture groups of the
  /// first line that matches.
  ///
  /// The result holds one entry per capture group of `pattern`; groups that did not
  /// participate in the match, or all groups when no line matches, are [`UNKNOWN`].
  ///
  /// ```
  /// use folio::document::{Header, UNKNOWN};
  /// use regex::Regex;
  ///
  /// let header = Header::parse(["Release date: June 1, 2006 [eBook #18561]"]);
  /// let ebook = Regex::new(r"^Release date: .*?(\d{4}) \[eBook #(\d+)\]").unwrap();
  /// assert_eq!(header.extract(&ebook), vec!["2006", "18561"]);
  ///
  /// let missing = Regex::new(r"^Credits: (.*)$").unwrap();
  /// assert_eq!(header.extract(&missing), vec![UNKNOWN]);
  /// ```
  pub fn extract(&self, pattern: &Regex) -> Vec<String> {
    let groups = pattern.captures_len().saturating_sub(1);
    let captures = self.lines.iter().find_map(|line| pattern.captures(line));

    (1..=groups)
      .map(|group| {
        captures
          .as_ref()
          .and_then(|captures| captures.get(group))
          .map_or_else(|| UNKNOWN.to_string(), |m| m.as_str().to_string())
      })
      .collect()
  }

  /// The book's title.
  pub fn title(&self) -> &str { self.field_or_unknown("title") }

  /// The first contributor and its role, e.g. `("Jane Austen", "author")`.
  pub fn contributor(&self) -> (&str, &str) {
    CONTRIBUTOR_LABELS
      .iter()
      .find_map(|label| self.field(label).map(|name| (name, *label)))
      .unwrap_or((UNKNOWN, DEFAULT_ROLE))
  }

  /// The first word of the language field.
  pub fn language(&self) -> &str {
    self
      .field("language")
      .and_then(|value| LANGUAGE_WORD.captures(value))
      .and_then(|captures| captures.get(1))
      .map_or(UNKNOWN, |m| m.as_str())
  }

  /// The year ending an `Original publication:` field, when present.
  pub fn original_publication(&self) -> Option<i64> {
    self
      .field("original publication")
      .and_then(|value| TRAILING_YEAR.captures(value))
      .and_then(|captures| captures[1].parse().ok())
  }
}
