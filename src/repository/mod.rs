//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking.
//! Supports both SQLite and PostgreSQL backends. Every write is
//! insert-or-ignore keyed on the platform ID, so re-running an ingestion
//! never modifies or duplicates stored rows.

pub mod channel;
pub mod comment;
pub mod connection;
pub mod context;
pub mod models;
pub mod playlist;
pub mod util;
pub mod video;

pub use channel::ChannelRepository;
pub use comment::CommentRepository;
pub use connection::{DbConnection, DbError};
pub use context::{DbContext, TableCounts};
pub use playlist::PlaylistRepository;
pub use util::redact_url_password;
pub use video::VideoRepository;
