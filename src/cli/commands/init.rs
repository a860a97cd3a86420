//! Initialize command.

use console::style;

use crate::config::Settings;
use crate::repository::redact_url_password;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context().await?;
    ctx.init_schema().await?;

    if settings.api_key.is_none() {
        println!(
            "{} No API key configured. Set YOUTUBE_API_KEY or api_key in tubevault.toml",
            style("!").yellow()
        );
    }

    let location = if settings.has_database_url() {
        redact_url_password(&settings.database_url())
    } else {
        settings.database_path().display().to_string()
    };
    println!(
        "{} Initialized tubevault database at {}",
        style("✓").green(),
        location
    );

    Ok(())
}
