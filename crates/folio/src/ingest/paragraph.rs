//! Blank-line paragraph segmentation.

use super::*;

/// Counts describing the literal content of an ingested stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
  /// Characters of the trimmed lines.
  pub characters: usize,
  /// Physical lines read.
  pub lines:      usize,
  /// Paragraphs emitted.
  pub paragraphs: usize,
}

/// Groups physical lines into paragraphs.
///
/// Non-blank lines accumulate into the current paragraph, trimmed and joined with a single
/// space. A blank line emits the accumulated paragraph; a blank line with nothing
/// accumulated does nothing, so runs of blank lines collapse. [`Paragraphs::finish`] emits
/// whatever is still accumulated when the stream ends.
///
/// # Examples
///
/// ```
/// use folio::ingest::Paragraphs;
///
/// let mut paragraphs = Paragraphs::default();
/// let mut emitted: Vec<String> = ["A", "B", "", "", "C"]
///   .into_iter()
///   .filter_map(|line| paragraphs.push(line))
///   .collect();
/// emitted.extend(paragraphs.finish());
///
/// assert_eq!(emitted, vec!["A B", "C"]);
/// assert_eq!(paragraphs.stats().paragraphs, 2);
/// ```
#[derive(Debug, Default)]
pub struct Paragraphs {
  /// The paragraph being accumulated.
  current: String,
  /// Running counts.
  stats:   IngestStats,
}

impl Paragraphs {
  /// Feeds one physical line, returning a paragraph if the line completed one.
  pub fn push(&mut self, line: &str) -> Option<String> {
    self.stats.lines += 1;
    let line = line.trim();
    self.stats.characters += line.chars().count();

    if line.is_empty() {
      return self.flush();
    }
    if !self.current.is_empty() {
      self.current.push(' ');
    }
    self.current.push_str(line);
    None
  }

  /// Ends the stream, returning the final paragraph if one was still being accumulated.
  pub fn finish(&mut self) -> Option<String> { self.flush() }

  /// The counts so far.
  pub fn stats(&self) -> IngestStats { self.stats }

  /// Emits the accumulated paragraph, if any.
  fn flush(&mut self) -> Option<String> {
    if self.current.is_empty() {
      return None;
    }
    self.stats.paragraphs += 1;
    Some(std::mem::take(&mut self.current))
  }
}
