//! Explicit configuration for a [`Folio`](crate::Folio) instance.
//!
//! Connection target, download location, source template and ingestion tuning are carried
//! in a [`Config`] value that is handed to [`Folio::open`](crate::Folio::open). Nothing is
//! read from process-wide state. Configurations are stored as TOML; missing keys fall back to
//! their defaults.
//!
//! # Examples
//!
//! ```
//! use folio::config::{Config, SchemaVariant};
//!
//! let config: Config = toml::from_str(
//!   r#"
//!   database_path = "books.db"
//!   schema = "author_only"
//!
//!   [ingest]
//!   commit_every = 10
//!   "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.schema, SchemaVariant::AuthorOnly);
//! assert_eq!(config.ingest.commit_every, 10);
//! assert_eq!(config.ingest.throttle_every, 100);
//! ```

use super::*;

/// Placeholder substituted by a catalog id in [`Config::source_template`].
pub const ID_PLACEHOLDER: &str = "{id}";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// SQLite database file.
  pub database_path:   PathBuf,
  /// Directory receiving downloaded artifacts until they are processed.
  pub download_path:   PathBuf,
  /// Locator template; `{id}` is replaced by a catalog id.
  pub source_template: String,
  /// Which relations the schema carries.
  pub schema:          SchemaVariant,
  /// Batching, throttling and scanning bounds.
  pub ingest:          IngestSettings,
}

/// Shape of the persisted schema.
///
/// Observed catalogs disagree on whether contributor roles are worth a relation of their
/// own, so both shapes are supported.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
  /// `language`, `author`, `role`, `book`, `paragraph`.
  #[default]
  WithRole,
  /// `language`, `author`, `book`, `paragraph`; every contributor is an author.
  AuthorOnly,
}

impl Display for SchemaVariant {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SchemaVariant::WithRole => write!(f, "with_role"),
      SchemaVariant::AuthorOnly => write!(f, "author_only"),
    }
  }
}

/// Tuning knobs for one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
  /// Paragraphs persisted per transaction.
  pub commit_every:      usize,
  /// Paragraph interval between throttling pauses.
  pub throttle_every:    usize,
  /// Length of a throttling pause in milliseconds.
  pub throttle_pause_ms: u64,
  /// Lines after the delimiter searched for a publication year.
  pub year_window:       usize,
  /// Lines searched for the header delimiter before a document is rejected.
  pub header_limit:      usize,
  /// Lower bound of the pause between two documents, in milliseconds.
  pub backoff_min_ms:    u64,
  /// Upper bound of the pause between two documents, in milliseconds.
  pub backoff_max_ms:    u64,
}

impl Default for IngestSettings {
  fn default() -> Self {
    Self {
      commit_every:      50,
      throttle_every:    100,
      throttle_pause_ms: 1_000,
      year_window:       document::DEFAULT_YEAR_WINDOW,
      header_limit:      1_000,
      backoff_min_ms:    1_000,
      backoff_max_ms:    3_000,
    }
  }
}

impl IngestSettings {
  /// Settings without any pauses, handy for tests and local files.
  pub fn unthrottled() -> Self {
    Self { throttle_pause_ms: 0, backoff_min_ms: 0, backoff_max_ms: 0, ..Self::default() }
  }

  /// The throttling pause as a [`Duration`].
  pub fn throttle_pause(&self) -> Duration { Duration::from_millis(self.throttle_pause_ms) }

  /// Checks the settings for values that would make ingestion loop or never commit.
  pub fn validate(&self) -> Result<()> {
    if self.commit_every == 0 || self.throttle_every == 0 {
      return Err(FolioError::Config(
        "`commit_every` and `throttle_every` must both be at least 1".to_string(),
      ));
    }
    if self.backoff_min_ms > self.backoff_max_ms {
      return Err(FolioError::Config(format!(
        "`backoff_min_ms` ({}) exceeds `backoff_max_ms` ({})",
        self.backoff_min_ms, self.backoff_max_ms
      )));
    }
    Ok(())
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_path:   Self::default_database_path(),
      download_path:   std::env::temp_dir().join("folio"),
      source_template: "https://www.gutenberg.org/cache/epub/{id}/pg{id}.txt".to_string(),
      schema:          SchemaVariant::default(),
      ingest:          IngestSettings::default(),
    }
  }
}

impl Config {
  /// Default location of the configuration file.
  ///
  /// - On Unix: `~/.config/folio/config.toml`
  /// - On macOS: `~/Library/Application Support/folio/config.toml`
  /// - On Windows: `%APPDATA%\folio\config.toml`
  /// - Fallback: `./folio/config.toml`
  pub fn default_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("folio").join("config.toml")
  }

  /// Default location of the database file, under the platform data directory.
  pub fn default_database_path() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("folio").join("folio.db")
  }

  /// Reads a configuration from a TOML file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    debug!(path = %path.as_ref().display(), "Loaded configuration");
    Ok(config)
  }

  /// Writes this configuration as TOML, creating parent directories.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(self)?)?;
    debug!(path = %path.display(), "Saved configuration");
    Ok(())
  }

  /// Checks the template and the ingestion settings.
  pub fn validate(&self) -> Result<()> {
    if !self.source_template.contains(ID_PLACEHOLDER) {
      return Err(FolioError::Config(format!(
        "Source template \"{}\" has no {ID_PLACEHOLDER} placeholder",
        self.source_template
      )));
    }
    self.ingest.validate()
  }

  /// Expands the source template for one catalog id.
  ///
  /// ```
  /// let config = folio::Config::default();
  /// assert_eq!(config.locator_for(7), "https://www.gutenberg.org/cache/epub/7/pg7.txt");
  /// ```
  pub fn locator_for(&self, id: u32) -> String {
    self.source_template.replace(ID_PLACEHOLDER, &id.to_string())
  }

  /// Sets the database file.
  pub fn with_database_path(mut self, path: &Path) -> Self {
    self.database_path = path.to_path_buf();
    self
  }

  /// Sets the download directory.
  pub fn with_download_path(mut self, path: &Path) -> Self {
    self.download_path = path.to_path_buf();
    self
  }

  /// Sets the locator template.
  pub fn with_source_template(mut self, template: impl Into<String>) -> Self {
    self.source_template = template.into();
    self
  }

  /// Sets the schema variant.
  pub fn with_schema(mut self, schema: SchemaVariant) -> Self {
    self.schema = schema;
    self
  }

  /// Replaces the ingestion settings.
  pub fn with_ingest(mut self, ingest: IngestSettings) -> Self {
    self.ingest = ingest;
    self
  }
}
