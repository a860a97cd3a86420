//! Report command.

use console::style;

use crate::config::Settings;
use crate::reports::{ChannelFilter, ReportKind};

use super::helpers::{print_json, print_table, OutputFormat};

/// Print the available reports.
pub fn cmd_report_list() {
    println!("\n{}", style("Reports").bold());
    println!("{}", "-".repeat(60));
    for kind in ReportKind::ALL {
        println!("{:>2}  {:<16} {}", kind.number(), kind.name(), kind.title());
    }
}

/// Run one report over every stored video.
pub async fn cmd_report(
    settings: &Settings,
    kind: ReportKind,
    channels: &[String],
    year: i32,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if !settings.database_exists() {
        println!(
            "{} No database found. Run 'tubevault init' first.",
            style("!").yellow()
        );
        return Ok(());
    }

    let db = settings.create_db_context().await?;
    let videos = db.videos().get_all().await?;
    let filter = ChannelFilter::only(channels.iter().cloned());
    let table = kind.run(&videos, &filter, year);

    if format == OutputFormat::Json {
        return print_json(&table.to_json());
    }

    let title = match kind {
        ReportKind::PublishedInYear => format!("{} ({})", kind.title(), year),
        _ => kind.title().to_string(),
    };
    println!("\n{}", style(title).bold());

    if table.rows.is_empty() {
        println!("{} No matching videos", style("!").yellow());
        return Ok(());
    }

    let headers: Vec<&str> = table.headers.iter().map(String::as_str).collect();
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();
    print_table(&headers, &rows);

    Ok(())
}
