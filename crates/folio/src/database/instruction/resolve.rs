//! Find-or-insert for dimension relations.
//!
//! A dimension relation (`author`, `role`, `language`) holds each distinct value exactly
//! once. [`Resolve`] returns the identifier of the row holding a value, inserting the row the
//! first time the value is seen:
//!
//! 1. Look the row up by its attribute values.
//! 2. If absent, insert it with `ON CONFLICT DO NOTHING RETURNING id`.
//! 3. If the insert returned nothing, another writer inserted the same value in between;
//!    look it up again.
//!
//! The uniqueness constraint on the relation, not application locking, is what guarantees a
//! single row per value.

use super::*;

/// The dimension relations of the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
  /// Contributor names.
  Author,
  /// Contributor roles, present in [`SchemaVariant::WithRole`] only.
  Role,
  /// Language names.
  Language,
}

impl Dimension {
  /// The relation's name.
  pub fn relation(&self) -> &'static str {
    match self {
      Dimension::Author => "author",
      Dimension::Role => "role",
      Dimension::Language => "language",
    }
  }

  /// The unique attribute holding the value.
  pub fn attribute(&self) -> &'static str { "name" }
}

impl Display for Dimension {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.relation())
  }
}

/// Finds or inserts the row of `relation` whose `attributes` equal `values`.
///
/// # Examples
///
/// ```no_run
/// use folio::{
///   config::SchemaVariant,
///   database::{Database, Resolve},
///   prelude::*,
/// };
///
/// # async fn example() -> Result<(), FolioError> {
/// let mut db = Database::open_in_memory(SchemaVariant::WithRole).await?;
///
/// let id = Resolve::new("author", ["name"], ["Jane Austen"]).execute(&mut db).await?;
/// let again = Resolve::new("author", ["name"], ["Jane Austen"]).execute(&mut db).await?;
/// assert_eq!(id, again);
///
/// // Arity mismatches are rejected before touching the database.
/// let err = Resolve::new("author", ["name", "born"], ["Jane Austen"]).execute(&mut db).await;
/// assert!(matches!(err, Err(FolioError::ArityMismatch { .. })));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Resolve {
  /// Relation name.
  relation:   String,
  /// Attribute names, matched positionally with `values`.
  attributes: Vec<String>,
  /// Values to find or insert.
  values:     Vec<String>,
}

impl Resolve {
  /// Creates a resolve instruction for arbitrary attributes of a relation.
  pub fn new<A, V>(
    relation: impl Into<String>,
    attributes: impl IntoIterator<Item = A>,
    values: impl IntoIterator<Item = V>,
  ) -> Self
  where
    A: Into<String>,
    V: Into<String>,
  {
    Self {
      relation:   relation.into(),
      attributes: attributes.into_iter().map(Into::into).collect(),
      values:     values.into_iter().map(Into::into).collect(),
    }
  }

  /// Creates a resolve instruction for the name of a dimension.
  pub fn dimension(dimension: Dimension, value: &str) -> Self {
    Self::new(dimension.relation(), [dimension.attribute()], [value])
  }

  /// Rejects instructions whose attributes and values do not pair up.
  fn check_arity(&self) -> Result<()> {
    if self.attributes.is_empty() || self.attributes.len() != self.values.len() {
      return Err(FolioError::ArityMismatch {
        relation:   self.relation.clone(),
        attributes: self.attributes.len(),
        values:     self.values.len(),
      });
    }
    Ok(())
  }

  /// `SELECT id FROM "relation" WHERE "a1" = ?1 AND ...`.
  fn lookup_sql(&self) -> String {
    let conditions = self
      .attributes
      .iter()
      .enumerate()
      .map(|(i, attribute)| format!("{} = ?{}", quote_identifier(attribute), i + 1))
      .collect::<Vec<_>>()
      .join(" AND ");
    format!("SELECT id FROM {} WHERE {} LIMIT 1", quote_identifier(&self.relation), conditions)
  }

  /// `INSERT INTO "relation" ("a1", ...) VALUES (?1, ...) ON CONFLICT DO NOTHING RETURNING id`.
  fn insert_sql(&self) -> String {
    let columns =
      self.attributes.iter().map(|attribute| quote_identifier(attribute)).collect::<Vec<_>>();
    let placeholders = (1..=self.values.len()).map(|i| format!("?{i}")).collect::<Vec<_>>();
    format!(
      "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT DO NOTHING RETURNING id",
      quote_identifier(&self.relation),
      columns.join(", "),
      placeholders.join(", ")
    )
  }
}

#[async_trait]
impl DatabaseInstruction for Resolve {
  type Output = i64;

  async fn execute(&self, db: &mut Database) -> Result<Self::Output> {
    self.check_arity()?;

    let lookup_sql = self.lookup_sql();
    let insert_sql = self.insert_sql();
    let values = self.values.clone();

    let (id, inserted) = db
      .conn
      .call(move |conn| {
        let lookup = |conn: &rusqlite::Connection| -> rusqlite::Result<Option<i64>> {
          conn
            .prepare_cached(&lookup_sql)?
            .query_row(params_from_iter(values.iter()), |row| row.get::<_, i64>(0))
            .optional()
        };

        if let Some(id) = lookup(&*conn)? {
          return Ok((Some(id), false));
        }
        let inserted = conn
          .prepare_cached(&insert_sql)?
          .query_row(params_from_iter(values.iter()), |row| row.get::<_, i64>(0))
          .optional()?;
        match inserted {
          Some(id) => Ok((Some(id), true)),
          None => Ok((lookup(&*conn)?, false)),
        }
      })
      .await?;

    match id {
      Some(id) => {
        if inserted {
          debug!(relation = %self.relation, values = ?self.values, id, "Inserted dimension row");
        } else {
          trace!(relation = %self.relation, values = ?self.values, id, "Found dimension row");
        }
        Ok(id)
      },
      None => Err(FolioError::NotFound(self.relation.clone())),
    }
  }
}
