//! Ingest command.

use std::sync::Arc;

use console::style;

use crate::api::YouTubeClient;
use crate::config::Settings;
use crate::harvest::{HarvestError, HarvestReport, Harvester, TableStats};
use crate::models::ChannelStatus;

use super::helpers::{print_json, OutputFormat};

/// Ingest each channel in turn. An unknown channel is reported and skipped.
/// An unreachable store stops the command before any channel is fetched.
pub async fn cmd_ingest(
    settings: &Settings,
    channel_ids: &[String],
    format: OutputFormat,
) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    let db = settings.create_db_context().await?;
    db.init_schema().await?;

    let client = YouTubeClient::from_settings(settings)?;
    let harvester = Harvester::new(Arc::new(client), db, settings.harvest.clone());

    let mut reports = Vec::with_capacity(channel_ids.len());
    for channel_id in channel_ids {
        match harvester.ingest(channel_id).await {
            Ok(report) => {
                if format == OutputFormat::Table {
                    print_summary(&report);
                }
                reports.push(report);
            }
            Err(HarvestError::ChannelNotFound(id)) => {
                eprintln!("{} Channel '{}' not found", style("✗").red(), id);
            }
        }
    }

    if format == OutputFormat::Json {
        print_json(&reports)?;
    }

    Ok(())
}

fn print_summary(report: &HarvestReport) {
    let name = report
        .channel
        .as_ref()
        .map(|c| c.name.as_str())
        .unwrap_or(report.channel_id.as_str());

    match report.channel_status {
        ChannelStatus::Inserted => {
            println!("{} Channel {} stored", style("✓").green(), style(name).bold())
        }
        ChannelStatus::AlreadyExists => println!(
            "{} Channel {} already exists",
            style("!").yellow(),
            style(name).bold()
        ),
        ChannelStatus::Failed => println!(
            "{} Channel {} could not be fetched or stored",
            style("✗").red(),
            style(name).bold()
        ),
    }

    let stats = &report.stats;
    print_table_stats("videos", &stats.videos);
    print_table_stats("playlists", &stats.playlists);
    print_table_stats("comments", &stats.comments);
    if stats.failed_requests > 0 {
        println!(
            "  {} {} request(s) failed, see log for details",
            style("!").yellow(),
            stats.failed_requests
        );
    }
}

fn print_table_stats(label: &str, stats: &TableStats) {
    let failed = if stats.failed > 0 {
        style(format!("{} failed", stats.failed)).red().to_string()
    } else {
        "0 failed".to_string()
    };
    println!(
        "  {:<10} {:>6} new  {:>6} existing  {}",
        label, stats.inserted, stats.existing, failed
    );
}
