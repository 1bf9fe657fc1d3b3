//! Module for ingesting books into the database.

use super::*;

/// Arguments for [`Commands::Ingest`].
#[derive(Args, Clone)]
pub struct IngestArgs {
  /// Locators of plain-text books, e.g.
  /// "https://www.gutenberg.org/cache/epub/19337/pg19337.txt"
  #[arg(conflicts_with_all = ["count", "start"])]
  pub locators: Vec<String>,

  /// Number of catalog ids to ingest [default: 1]
  #[arg(long, short = 'n', value_parser = clap::value_parser!(u32).range(1..))]
  pub count: Option<u32>,

  /// First catalog id to ingest [default: 1]
  #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
  pub start: Option<u32>,

  /// Drop every relation, including all stored books, before ingesting
  #[arg(long)]
  pub reset: bool,
}

impl IngestArgs {
  /// The explicit locators, or the catalog ids expanded through the source template.
  ///
  /// The range stops at the largest catalog id rather than wrapping around.
  fn locators(&self, config: &Config) -> Vec<String> {
    if !self.locators.is_empty() {
      return self.locators.clone();
    }
    let start = self.start.unwrap_or(1);
    let last = start.saturating_add(self.count.unwrap_or(1) - 1);
    (start..=last).map(|id| config.locator_for(id)).collect()
  }
}

/// Function for the [`Commands::Ingest`] in the CLI.
///
/// Asks for one confirmation up front, then ingests every locator in order. Each document's
/// result is reported as it completes; a failed document is reported and skipped.
pub async fn ingest<I: UserInteraction>(cli: &Cli, interaction: &I, args: &IngestArgs) -> Result<()> {
  let config = cli.load_config()?;
  let locators = args.locators(&config);

  let mut question = format!(
    "Ingest {} document(s) into {}? Text from these sources is written to the database.",
    locators.len(),
    config.database_path.display()
  );
  if args.reset {
    question.push_str(" Every stored book is dropped first.");
  }
  if !interaction.confirm(&question)? {
    return interaction.reply(ResponseContent::Info("Ingestion cancelled"));
  }

  let mut folio = if args.reset {
    let folio = Folio::open_reset(config).await?;
    interaction.reply(ResponseContent::Warning("All relations were dropped and recreated"))?;
    folio
  } else {
    Folio::open(config).await?
  };

  let report: BatchReport = folio
    .ingest_all(&locators, |locator, outcome| {
      if let Err(e) = interaction.reply(ResponseContent::Ingested(locator, outcome)) {
        warn!(error = %e, "Could not report outcome");
      }
    })
    .await?;

  interaction.reply(ResponseContent::Success(&format!("Finished: {report}")))
}
