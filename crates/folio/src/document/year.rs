//! Publication year location.
//!
//! Catalog headers rarely carry a publication year, but the first pages of the body usually
//! do (a title page, a copyright line, a preface date). The locator skips the header, then
//! looks for the first standalone 4-digit token within a bounded window of body lines.

use super::*;

/// Year recorded when none could be found. It lies outside any plausible publication year
/// and takes part in the (title, year, language) uniqueness key like any other year.
pub const UNKNOWN_YEAR: i64 = 10_000;

/// Default number of body lines searched for a year.
pub const DEFAULT_YEAR_WINDOW: usize = 500;

lazy_static! {
  /// A standalone 4-digit token.
  static ref YEAR: Regex = Regex::new(r"\b(\d{4})\b").unwrap();
}

/// Finds the publication year of a complete document.
///
/// Lines are consumed until one begins with [`DELIMITER`]; the following `window` lines are
/// then searched with [`search_window`]. A document without a delimiter has
/// [`UNKNOWN_YEAR`].
///
/// # Examples
///
/// ```
/// use folio::document::{locate_year, UNKNOWN_YEAR};
///
/// let text = "Title: Foo\nDate: 2001\n*** START ***\nPrinted in 1999.\n";
/// assert_eq!(locate_year(text.lines(), 500), 1999);
///
/// let text = "Title: Foo\n*** START ***\nNo digits here.\n";
/// assert_eq!(locate_year(text.lines(), 500), UNKNOWN_YEAR);
/// ```
pub fn locate_year<I, S>(lines: I, window: usize) -> i64
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>, {
  let mut lines = lines.into_iter();
  if !lines.by_ref().any(|line| is_delimiter(line.as_ref())) {
    return UNKNOWN_YEAR;
  }
  search_window(lines, window)
}

/// Searches at most `window` lines that follow the header delimiter for a year.
///
/// The search stops early, with [`UNKNOWN_YEAR`], at the closing end marker.
pub fn search_window<I, S>(lines: I, window: usize) -> i64
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>, {
  for line in lines.into_iter().take(window) {
    let line = line.as_ref();
    if is_closing_delimiter(line) {
      break;
    }
    if let Some(year) = YEAR.captures(line).and_then(|captures| captures[1].parse().ok()) {
      trace!(year, line, "Found publication year");
      return year;
    }
  }
  UNKNOWN_YEAR
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_year_after_delimiter() {
    let lines = ["Title: 1984", "*** START ***", "", "A story told in 1949, reprinted."];
    assert_eq!(locate_year(lines, DEFAULT_YEAR_WINDOW), 1949);
  }

  #[test]
  fn test_header_years_are_ignored() {
    let lines = ["Release date: 2004", "*** START ***", "nothing"];
    assert_eq!(locate_year(lines, DEFAULT_YEAR_WINDOW), UNKNOWN_YEAR);
  }

  #[test]
  fn test_year_outside_window() {
    let mut lines = vec!["*** START ***".to_string()];
    lines.extend((0..DEFAULT_YEAR_WINDOW).map(|i| format!("line {i}")));
    lines.push("Written 1850".to_string());
    assert_eq!(locate_year(&lines, DEFAULT_YEAR_WINDOW), UNKNOWN_YEAR);
    assert_eq!(locate_year(&lines, DEFAULT_YEAR_WINDOW + 1), 1850);
  }

  #[test]
  fn test_closing_delimiter_ends_search() {
    let lines = ["*** START ***", "short text", "*** END ***", "Licensed 2010"];
    assert_eq!(locate_year(lines, DEFAULT_YEAR_WINDOW), UNKNOWN_YEAR);
  }

  #[test]
  fn test_scene_break_does_not_end_search() {
    let lines = ["*** START ***", "Chapter one.", "***", "Dated 1851."];
    assert_eq!(locate_year(lines, DEFAULT_YEAR_WINDOW), 1851);
  }

  #[test]
  fn test_longer_numbers_are_not_years() {
    assert_eq!(search_window(["Call 123456 or 12345", "in 1901."], 10), 1901);
  }

  #[test]
  fn test_no_delimiter() {
    assert_eq!(locate_year(["Title: Foo", "1999"], DEFAULT_YEAR_WINDOW), UNKNOWN_YEAR);
  }
}
