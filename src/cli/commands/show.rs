//! Show command: list stored rows.

use console::style;

use crate::config::Settings;
use crate::models::TIMESTAMP_FORMAT;

use super::helpers::{opt_count, print_json, print_table, truncate, OutputFormat};

/// Which table to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ShowEntity {
    Channels,
    Videos,
    Playlists,
    Comments,
}

/// Keep the first `limit` items; 0 keeps all.
fn take<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    if limit > 0 {
        items.truncate(limit);
    }
    items
}

pub async fn cmd_show(
    settings: &Settings,
    entity: ShowEntity,
    limit: usize,
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

    match entity {
        ShowEntity::Channels => {
            let channels = take(db.channels().get_all().await?, limit);
            if format == OutputFormat::Json {
                return print_json(&channels);
            }
            let rows: Vec<Vec<String>> = channels
                .iter()
                .map(|c| {
                    vec![
                        c.id.clone(),
                        c.name.clone(),
                        opt_count(c.subscribers),
                        opt_count(c.views),
                        opt_count(c.total_videos),
                    ]
                })
                .collect();
            print_table(&["ID", "Name", "Subscribers", "Views", "Videos"], &rows);
        }
        ShowEntity::Videos => {
            let videos = take(db.videos().get_all().await?, limit);
            if format == OutputFormat::Json {
                return print_json(&videos);
            }
            let rows: Vec<Vec<String>> = videos
                .iter()
                .map(|v| {
                    vec![
                        v.id.clone(),
                        truncate(&v.channel_name, 20),
                        truncate(&v.title, 40),
                        v.published_at.format(TIMESTAMP_FORMAT).to_string(),
                        v.duration.to_string(),
                        opt_count(v.views),
                        opt_count(v.likes),
                        opt_count(v.comments),
                    ]
                })
                .collect();
            print_table(
                &[
                    "ID", "Channel", "Title", "Published", "Duration", "Views", "Likes", "Comments",
                ],
                &rows,
            );
        }
        ShowEntity::Playlists => {
            let playlists = take(db.playlists().get_all().await?, limit);
            if format == OutputFormat::Json {
                return print_json(&playlists);
            }
            let rows: Vec<Vec<String>> = playlists
                .iter()
                .map(|p| vec![p.id.clone(), truncate(&p.channel_name, 24), p.title.clone()])
                .collect();
            print_table(&["ID", "Channel", "Title"], &rows);
        }
        ShowEntity::Comments => {
            let comments = take(db.comments().get_all().await?, limit);
            if format == OutputFormat::Json {
                return print_json(&comments);
            }
            let rows: Vec<Vec<String>> = comments
                .iter()
                .map(|c| {
                    vec![
                        c.video_id.clone(),
                        truncate(&c.author, 20),
                        c.published_at.format(TIMESTAMP_FORMAT).to_string(),
                        truncate(&c.text, 60),
                    ]
                })
                .collect();
            print_table(&["Video", "Author", "Published", "Text"], &rows);
        }
    }

    Ok(())
}
