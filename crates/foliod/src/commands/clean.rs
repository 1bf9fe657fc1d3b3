//! Module for removing the database.

use super::*;

/// Function for the [`Commands::Clean`] in the CLI.
///
/// Asks twice before deleting: a yes/no confirmation, then typing `DELETE`. Both are skipped
/// with `--accept-defaults`.
pub async fn clean<I: UserInteraction>(cli: &Cli, interaction: &I) -> Result<()> {
  let path = cli.load_config()?.database_path;
  if !path.exists() {
    return interaction
      .reply(ResponseContent::Warning(&format!("No database found at: {}", path.display())));
  }
  interaction.reply(ResponseContent::Warning(&format!("Database found at: {}", path.display())))?;

  if !cli.accept_defaults {
    if !interaction.confirm("Are you sure you want to delete this database?")? {
      return interaction.reply(ResponseContent::Info("Operation cancelled"));
    }
    if interaction.prompt(&format!("Type {} to confirm deletion", style("DELETE").red().bold()))?
      != "DELETE"
    {
      return interaction.reply(ResponseContent::Info("Operation cancelled"));
    }
  }

  std::fs::remove_file(&path)?;
  // Journal and write-ahead-log files live next to the database.
  for file in glob::glob(&format!("{}-*", glob::Pattern::escape(&path.to_string_lossy())))?.flatten() {
    debug!(path = %file.display(), "Removing database side file");
    std::fs::remove_file(file)?;
  }
  interaction.reply(ResponseContent::Success("Database files cleaned"))
}
