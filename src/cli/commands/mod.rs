//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod helpers;
mod ingest;
mod init;
mod report;
mod show;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};
use crate::reports::{ReportKind, DEFAULT_YEAR};

pub use helpers::OutputFormat;
pub use show::ShowEntity;

#[derive(Parser)]
#[command(name = "tubevault")]
#[command(about = "Video channel metadata harvesting and reporting")]
#[command(version)]
pub struct Cli {
    /// Target directory or database file (overrides config file).
    /// Can be a directory containing tubevault.db or a .db file directly.
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Fetch channels, their videos, playlists and comments into the database
    Ingest {
        /// Channel IDs to ingest (e.g. UC_x5XG1OV2P6uZZ5FSM9Ttw)
        #[arg(required = true)]
        channel_ids: Vec<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// List stored records
    Show {
        /// Table to list
        #[arg(value_enum)]
        entity: ShowEntity,
        /// Maximum rows to print (0 = all)
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Run one of the canned reports over stored videos
    Report {
        /// Report name or number (see --list)
        #[arg(required_unless_present = "list")]
        view: Option<ReportKind>,
        /// Only include these channels (by name, repeatable)
        #[arg(long = "channel")]
        channels: Vec<String>,
        /// Year for the by-year report
        #[arg(long, default_value_t = DEFAULT_YEAR)]
        year: i32,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
        /// List available reports
        #[arg(long)]
        list: bool,
    },

    /// Show database location and row counts
    Status,
}

/// Parse arguments, load settings and run the chosen command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        target: cli.target,
    };
    let (settings, _config) = load_settings_with_options(options).await?;
    tracing::debug!("Resolved settings: {:?}", settings);

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Ingest {
            channel_ids,
            format,
        } => ingest::cmd_ingest(&settings, &channel_ids, format).await,
        Commands::Show {
            entity,
            limit,
            format,
        } => show::cmd_show(&settings, entity, limit, format).await,
        Commands::Report {
            view,
            channels,
            year,
            format,
            list,
        } => match view {
            Some(kind) if !list => {
                report::cmd_report(&settings, kind, &channels, year, format).await
            }
            _ => {
                report::cmd_report_list();
                Ok(())
            }
        },
        Commands::Status => status::cmd_status(&settings).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn parser_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn report_accepts_names_and_numbers() {
        let cli = Cli::parse_from([
            "tubevault",
            "report",
            "9",
            "--channel",
            "A",
            "--channel",
            "B",
        ]);
        match cli.command {
            Commands::Report {
                view, channels, year, ..
            } => {
                assert_eq!(view, Some(ReportKind::AboveChannelAverage));
                assert_eq!(channels, vec!["A", "B"]);
                assert_eq!(year, DEFAULT_YEAR);
            }
            _ => panic!("expected report"),
        }
    }

    #[test]
    fn report_list_needs_no_view() {
        let cli = Cli::parse_from(["tubevault", "report", "--list"]);
        assert!(matches!(
            cli.command,
            Commands::Report {
                view: None,
                list: true,
                ..
            }
        ));
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::parse_from(["tubevault", "status", "-t", "/tmp/vault.db", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.target, Some(PathBuf::from("/tmp/vault.db")));
    }
}
