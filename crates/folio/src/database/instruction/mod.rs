//! Database instructions.
//!
//! Every read or write against the store is a small value implementing
//! [`DatabaseInstruction`], built up front and executed against a [`Database`]:
//!
//! - [`Resolve`]: find-or-insert a row of a dimension relation
//! - [`BookExists`], [`FindBook`], [`AddBook`]: the book record protocol
//! - [`AddParagraphs`]: one batch of body text in one transaction
//! - [`Stats`], [`ListBooks`], [`BookParagraphs`]: read-side queries

use rusqlite::{params, params_from_iter, OptionalExtension};

use super::*;

pub mod book;
pub mod paragraph;
pub mod query;
pub mod resolve;

pub use self::{book::*, paragraph::*, query::*, resolve::*};

/// An operation against a [`Database`].
#[async_trait]
pub trait DatabaseInstruction {
  /// What executing the instruction yields.
  type Output;

  // Take &mut reference to avoid taking ownership and allow multiple operations
  /// Runs the instruction.
  async fn execute(&self, db: &mut Database) -> Result<Self::Output>;
}
