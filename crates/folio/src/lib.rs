//! Public-domain book ingestion into a normalized relational catalog.
//!
//! `folio` downloads plain-text books from a remote archive, reads the catalog header that
//! precedes every book, and stores the result in a local SQLite database:
//!
//! - Bibliographic metadata (title, author, role, language, publication year)
//! - Deduplicated reference tables for authors, roles and languages
//! - The book body, one row per blank-line-delimited paragraph
//!
//! # Features
//!
//! - **Tolerant header parsing**: labeled `Label: value` fields are read once into a
//!   [`Header`](document::Header); missing fields resolve to [`UNKNOWN`](document::UNKNOWN)
//!   instead of failing.
//! - **Idempotent ingestion**: a book is identified by its (title, year, language) triple and
//!   a second ingestion of the same document is reported as
//!   [`Outcome::AlreadyIngested`](pipeline::Outcome::AlreadyIngested).
//! - **Streaming bodies**: paragraphs are persisted in batches while the file is read, so a
//!   large book is never held in memory.
//! - **Parameter binding everywhere**: values are always bound; relation and attribute names
//!   are quoted identifiers.
//!
//! # Getting Started
//!
//! ```no_run
//! use folio::{pipeline::Outcome, Config, Folio};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let mut folio = Folio::open(Config::default()).await?;
//!
//!   match folio.ingest("https://www.gutenberg.org/cache/epub/19337/pg19337.txt").await? {
//!     Outcome::Ingested(report) => println!("Stored {} paragraphs", report.stats.paragraphs),
//!     Outcome::AlreadyIngested(metadata) => println!("{} is already stored", metadata.title),
//!   }
//!   Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`document`]: Header parsing, year location and body streaming
//! - [`ingest`]: Paragraph segmentation and batched persistence
//! - [`database`]: Schema management and database instructions
//! - [`source`]: Locator validation and artifact download
//! - [`pipeline`]: The per-document orchestration and batch driver
//! - [`config`]: Explicit configuration threaded into [`Folio`]

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  collections::{BTreeMap, VecDeque},
  fmt::Display,
  path::{Path, PathBuf},
  str::FromStr,
  time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod source;

pub use crate::{config::Config, pipeline::Folio};
use crate::{
  config::{IngestSettings, SchemaVariant},
  database::{Database, DatabaseInstruction},
  document::{Document, LineSource, Metadata},
  error::*,
  ingest::{Ingest, IngestStats},
  source::{Fetcher, Locator},
};

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use folio::{database::Stats, prelude::*, Config, Folio};
///
/// async fn example() -> Result<(), FolioError> {
///   let mut folio = Folio::open(Config::default()).await?;
///   let counts = Stats.execute(folio.database_mut()).await?;
///   println!("{} books stored", counts.books);
///   Ok(())
/// }
/// ```
pub mod prelude {
  pub use crate::{database::DatabaseInstruction, document::LineSource, error::FolioError};
}
