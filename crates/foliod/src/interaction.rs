//! Terminal interaction: prompts and styled replies.

use dialoguer::{Confirm, Input};

use super::*;

/// Prefix for information messages
pub static INFO_PREFIX: &str = "ℹ ";
/// Prefix for success messages
pub static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for error messages
pub static ERROR_PREFIX: &str = "✗ ";
/// Prefix for warning messages
pub static WARNING_PREFIX: &str = "! ";
/// Prefix for user prompts
pub static PROMPT_PREFIX: &str = "❯ ";
/// Prefix for a list item
pub static ITEM_PREFIX: &str = "├─";
/// Prefix for the last list item
pub static LAST_ITEM_PREFIX: &str = "└─";
/// Continuation line below a list item
pub static CONTINUE_PREFIX: &str = "│  ";

/// Something to show the user.
#[derive(Debug)]
pub enum ResponseContent<'a> {
  /// Stored books.
  Books(&'a [BookRecord]),
  /// The result of ingesting one locator.
  Ingested(&'a str, &'a folio::error::Result<Outcome>),
  /// A completed operation.
  Success(&'a str),
  /// Something the user should notice.
  Warning(&'a str),
  /// A failure.
  Error(&'a FoliodError),
  /// Anything else.
  Info(&'a str),
}

/// How commands talk to the user.
pub trait UserInteraction {
  /// Asks a yes/no question.
  fn confirm(&self, message: &str) -> Result<bool>;
  /// Asks for a line of text.
  fn prompt(&self, message: &str) -> Result<String>;
  /// Shows `content`.
  fn reply(&self, content: ResponseContent) -> Result<()>;
}

/// Interaction over stdin and stdout.
pub struct Terminal {
  /// Answer every confirmation with yes without asking.
  accept_defaults: bool,
}

impl Terminal {
  /// Creates a terminal interaction.
  pub fn new(accept_defaults: bool) -> Self { Self { accept_defaults } }
}

impl UserInteraction for Terminal {
  fn confirm(&self, message: &str) -> Result<bool> {
    if self.accept_defaults {
      return Ok(true);
    }
    Ok(
      Confirm::new()
        .with_prompt(format!("{}{message}", style(PROMPT_PREFIX).cyan()))
        .default(false)
        .wait_for_newline(true)
        .interact()?,
    )
  }

  fn prompt(&self, message: &str) -> Result<String> {
    Ok(
      Input::<String>::new()
        .with_prompt(format!("{}{message}", style(PROMPT_PREFIX).cyan()))
        .interact_text()?,
    )
  }

  fn reply(&self, content: ResponseContent) -> Result<()> {
    match content {
      ResponseContent::Books(books) => {
        if books.is_empty() {
          println!("{} No books ingested yet", style(INFO_PREFIX).blue());
          return Ok(());
        }
        println!("{} {} book(s) stored", style(INFO_PREFIX).blue(), books.len());
        for (index, book) in books.iter().enumerate() {
          let prefix = if index + 1 == books.len() { LAST_ITEM_PREFIX } else { ITEM_PREFIX };
          let year = if book.metadata.has_year() {
            book.metadata.year.to_string()
          } else {
            "year unknown".to_string()
          };
          println!("{prefix} {} ({})", style(&book.metadata.title).white().bold(), year);
          println!(
            "{CONTINUE_PREFIX} {} ({}), {}",
            style(&book.metadata.author).yellow(),
            book.metadata.role,
            book.metadata.language
          );
          println!(
            "{CONTINUE_PREFIX} {} paragraphs, ingested {}",
            book.paragraphs,
            book.ingested_at.format("%Y-%m-%d %H:%M")
          );
        }
      },
      ResponseContent::Ingested(locator, outcome) => match outcome {
        Ok(Outcome::Ingested(report)) => println!(
          "{} Ingested {}: {} paragraphs",
          style(SUCCESS_PREFIX).green(),
          report.metadata,
          report.stats.paragraphs
        ),
        Ok(Outcome::AlreadyIngested(metadata)) => println!(
          "{} Skipped {}: \"{}\" is already ingested",
          style(INFO_PREFIX).blue(),
          style(locator).dim(),
          metadata.title
        ),
        Err(e) =>
          println!("{} Skipped {}: {e}", style(WARNING_PREFIX).yellow(), style(locator).dim()),
      },
      ResponseContent::Success(message) => println!("{} {message}", style(SUCCESS_PREFIX).green()),
      ResponseContent::Warning(message) => println!("{} {message}", style(WARNING_PREFIX).yellow()),
      ResponseContent::Error(e) => eprintln!("{} {e}", style(ERROR_PREFIX).red()),
      ResponseContent::Info(message) => println!("{} {message}", style(INFO_PREFIX).blue()),
    }
    Ok(())
  }
}
