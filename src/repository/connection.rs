//! Database connection shared by every repository, for SQLite or PostgreSQL.
//!
//! The backend is picked at runtime from the database URL. One connection is
//! established when the context opens and lives for the whole run; operations
//! take turns on it.

use std::path::Path;
use std::sync::Arc;

use diesel::expression::SqlLiteral;
use diesel::sql_types::BigInt;
use diesel::sqlite::SqliteConnection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::AsyncConnection;
use tokio::sync::Mutex;

#[cfg(feature = "postgres")]
use diesel_async::AsyncPgConnection;

use super::util::{is_postgres_url, to_diesel_error};

/// Diesel error type alias.
pub type DbError = diesel::result::Error;

/// Async SQLite connection type.
pub type SqliteConn = SyncConnectionWrapper<SqliteConnection>;

/// PostgreSQL connection type.
#[cfg(feature = "postgres")]
pub type PgConn = AsyncPgConnection;

/// The open connection for whichever backend the URL names.
#[derive(Clone)]
pub enum DbConnection {
    Sqlite(Arc<Mutex<SqliteConn>>),
    #[cfg(feature = "postgres")]
    Postgres(Arc<Mutex<PgConn>>),
}

impl DbConnection {
    /// Connect to a database URL.
    ///
    /// - `postgres://` or `postgresql://` → PostgreSQL (requires the `postgres` feature)
    /// - Everything else → SQLite, with an optional `sqlite:` prefix
    ///
    /// An unreachable store fails here rather than on first use.
    pub async fn establish(url: &str) -> Result<Self, DbError> {
        if is_postgres_url(url) {
            return Self::establish_postgres(url).await;
        }

        let conn = SqliteConn::establish(sqlite_path(url))
            .await
            .map_err(to_diesel_error)?;
        Ok(DbConnection::Sqlite(Arc::new(Mutex::new(conn))))
    }

    /// Open a SQLite database file.
    pub async fn open_sqlite(path: &Path) -> Result<Self, DbError> {
        Self::establish(&path.display().to_string()).await
    }

    #[cfg(feature = "postgres")]
    async fn establish_postgres(url: &str) -> Result<Self, DbError> {
        let conn = PgConn::establish(url).await.map_err(to_diesel_error)?;
        Ok(DbConnection::Postgres(Arc::new(Mutex::new(conn))))
    }

    #[cfg(not(feature = "postgres"))]
    async fn establish_postgres(_url: &str) -> Result<Self, DbError> {
        Err(to_diesel_error(
            "PostgreSQL URL given but tubevault was built without the `postgres` feature",
        ))
    }

    /// Ordering expression that reads rows back in insertion order: SQLite's
    /// implicit rowid, or the `seq` identity column on PostgreSQL.
    pub fn insertion_order(&self) -> SqlLiteral<BigInt> {
        let column = match self {
            DbConnection::Sqlite(_) => "rowid",
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(_) => "seq",
        };
        diesel::dsl::sql::<BigInt>(column)
    }

    /// Short backend name for display.
    pub fn backend_name(&self) -> &'static str {
        match self {
            DbConnection::Sqlite(_) => "sqlite",
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(_) => "postgres",
        }
    }
}

/// File path part of a SQLite URL.
pub fn sqlite_path(url: &str) -> &str {
    url.strip_prefix("sqlite:").unwrap_or(url)
}

/// Run the same Diesel code against whichever backend is connected.
/// `conn` is bound to a `&mut` connection for the length of the block.
///
/// ```ignore
/// with_conn!(self.db, conn, {
///     channels::table.load::<ChannelRecord>(conn).await
/// })
/// ```
#[macro_export]
macro_rules! with_conn {
    ($db:expr, $conn:ident, $body:block) => {{
        match &$db {
            $crate::repository::connection::DbConnection::Sqlite(shared) => {
                let mut guard = shared.lock().await;
                let $conn = &mut *guard;
                $body
            }
            #[cfg(feature = "postgres")]
            $crate::repository::connection::DbConnection::Postgres(shared) => {
                let mut guard = shared.lock().await;
                let $conn = &mut *guard;
                $body
            }
        }
    }};
}

/// Run backend-specific Diesel code when the SQL differs between SQLite and PostgreSQL.
///
/// ```ignore
/// with_conn_split!(self.db,
///     sqlite: conn => {
///         diesel::insert_or_ignore_into(table).values(&row).execute(conn).await
///     },
///     postgres: conn => {
///         diesel::insert_into(table).values(&row).on_conflict_do_nothing().execute(conn).await
///     }
/// )
/// ```
#[macro_export]
macro_rules! with_conn_split {
    ($db:expr, sqlite: $sqlite_conn:ident => $sqlite_body:expr, postgres: $pg_conn:ident => $pg_body:expr) => {{
        match &$db {
            $crate::repository::connection::DbConnection::Sqlite(shared) => {
                let mut guard = shared.lock().await;
                let $sqlite_conn = &mut *guard;
                $sqlite_body
            }
            #[cfg(feature = "postgres")]
            $crate::repository::connection::DbConnection::Postgres(shared) => {
                let mut guard = shared.lock().await;
                let $pg_conn = &mut *guard;
                $pg_body
            }
        }
    }};
}
