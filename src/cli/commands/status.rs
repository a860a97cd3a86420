//! Status command.

use console::style;

use crate::config::Settings;
use crate::repository::redact_url_password;

/// Show where data lives and how much of it there is.
pub async fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    if !settings.database_exists() {
        println!(
            "{} No database at {}. Run 'tubevault init' first.",
            style("!").yellow(),
            settings.database_path().display()
        );
        return Ok(());
    }

    let db = settings.create_db_context().await?;
    let counts = db.table_counts().await?;

    println!("\n{}", style("tubevault status").bold());
    println!("{}", "-".repeat(60));
    println!(
        "{:<12} {}",
        "Database:",
        redact_url_password(&settings.database_url())
    );
    println!("{:<12} {}", "Backend:", db.connection().backend_name());
    println!(
        "{:<12} {}",
        "API key:",
        if settings.api_key.is_some() {
            style("configured").green()
        } else {
            style("missing").red()
        }
    );
    println!("{}", "-".repeat(60));
    println!("{:<12} {:>10}", "channels", counts.channels);
    println!("{:<12} {:>10}", "videos", counts.videos);
    println!("{:<12} {:>10}", "playlists", counts.playlists);
    println!("{:<12} {:>10}", "comments", counts.comments);

    Ok(())
}
