//! Database context for managing connections and repository access.
//!
//! The DbContext is the primary entry point for all database operations.
//! It holds the open connection and hands out repositories that share it.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::channel::ChannelRepository;
use super::comment::CommentRepository;
use super::connection::{DbConnection, DbError, SqliteConn};
use super::playlist::PlaylistRepository;
use super::video::VideoRepository;
use crate::with_conn_split;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Same tables plus a `seq` identity column; PostgreSQL has no rowid.
#[cfg_attr(not(feature = "postgres"), allow(dead_code))]
const SCHEMA_POSTGRES_SQL: &str = include_str!("schema_postgres.sql");

/// Row counts for every harvest table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TableCounts {
    pub channels: i64,
    pub videos: i64,
    pub playlists: i64,
    pub comments: i64,
}

/// Database context that holds the connection and provides repository access.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::connect("postgres://localhost/youtube").await?;
/// ctx.init_schema().await?;
/// let videos = ctx.videos().get_all().await?;
/// ```
#[derive(Clone)]
pub struct DbContext {
    db: DbConnection,
}

impl DbContext {
    /// Open a SQLite database file.
    pub async fn open(db_path: &Path) -> Result<Self, DbError> {
        Ok(Self {
            db: DbConnection::open_sqlite(db_path).await?,
        })
    }

    /// Connect to a database URL.
    ///
    /// Supports:
    /// - SQLite: file paths or `sqlite:` URLs
    /// - PostgreSQL: `postgres://` or `postgresql://` URLs
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        Ok(Self {
            db: DbConnection::establish(url).await?,
        })
    }

    pub fn connection(&self) -> &DbConnection {
        &self.db
    }

    pub fn channels(&self) -> ChannelRepository {
        ChannelRepository::new(self.db.clone())
    }

    pub fn videos(&self) -> VideoRepository {
        VideoRepository::new(self.db.clone())
    }

    pub fn playlists(&self) -> PlaylistRepository {
        PlaylistRepository::new(self.db.clone())
    }

    pub fn comments(&self) -> CommentRepository {
        CommentRepository::new(self.db.clone())
    }

    /// Create the four tables and their indexes if missing. Safe to call repeatedly.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        with_conn_split!(self.db,
            sqlite: conn => {
                init_sqlite_schema(conn).await
            },
            postgres: conn => {
                init_postgres_schema(conn).await
            }
        )
    }

    /// Count rows in every table.
    pub async fn table_counts(&self) -> Result<TableCounts, DbError> {
        Ok(TableCounts {
            channels: self.channels().count().await?,
            videos: self.videos().count().await?,
            playlists: self.playlists().count().await?,
            comments: self.comments().count().await?,
        })
    }
}

async fn init_sqlite_schema(conn: &mut SqliteConn) -> Result<(), DbError> {
    conn.batch_execute(SCHEMA_SQL).await
}

/// PostgreSQL needs statements executed separately.
#[cfg(feature = "postgres")]
async fn init_postgres_schema(conn: &mut diesel_async::AsyncPgConnection) -> Result<(), DbError> {
    use diesel_async::RunQueryDsl;

    for stmt in schema_statements(SCHEMA_POSTGRES_SQL) {
        diesel::sql_query(stmt).execute(conn).await?;
    }
    Ok(())
}

/// Split a DDL script into statements, dropping `--` comment lines.
#[cfg_attr(not(feature = "postgres"), allow(dead_code))]
fn schema_statements(script: &str) -> Vec<String> {
    let without_comments: String = script
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    without_comments
        .split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .map(str::to_string)
        .collect()
}
