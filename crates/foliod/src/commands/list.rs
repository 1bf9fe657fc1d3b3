//! Module for listing the stored books.

use super::*;

/// Function for the [`Commands::List`] in the CLI.
pub async fn list<I: UserInteraction>(cli: &Cli, interaction: &I) -> Result<()> {
  let mut folio = Folio::open(cli.load_config()?).await?;
  let books = ListBooks.execute(folio.database_mut()).await?;
  interaction.reply(ResponseContent::Books(&books))
}
