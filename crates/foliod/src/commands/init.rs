//! Module for setting up the configuration and the database.

use super::*;

/// Arguments for [`Commands::Init`].
#[derive(Args, Clone)]
pub struct InitArgs {
  /// Drop every relation, including all stored books, and create them again
  #[arg(long)]
  pub reset: bool,

  /// Store every contributor as an author, without a role relation
  #[arg(long)]
  pub author_only: bool,
}

/// Function for the [`Commands::Init`] in the CLI.
pub async fn init<I: UserInteraction>(cli: &Cli, interaction: &I, args: &InitArgs) -> Result<()> {
  let mut config = cli.load_config()?;
  if args.author_only {
    config = config.with_schema(SchemaVariant::AuthorOnly);
  }

  let config_path = cli.config_path();
  config.save(&config_path)?;
  interaction.reply(ResponseContent::Info(&format!(
    "Configuration written to {}",
    config_path.display()
  )))?;

  let database_path = config.database_path.clone();
  if args.reset {
    if !interaction.confirm(&format!(
      "Drop every relation in {}? All stored books will be lost.",
      database_path.display()
    ))? {
      interaction.reply(ResponseContent::Info("Reset cancelled"))?;
      return Ok(());
    }
    Folio::open_reset(config).await?;
    interaction.reply(ResponseContent::Warning("All relations were dropped and recreated"))?;
  } else {
    Folio::open(config).await?;
  }

  interaction.reply(ResponseContent::Success(&format!(
    "Database initialized at {}",
    database_path.display()
  )))
}
