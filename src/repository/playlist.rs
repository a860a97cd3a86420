//! Playlist repository.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::connection::{DbConnection, DbError};
use super::models::{NewPlaylist, PlaylistRecord};
use crate::models::Playlist;
use crate::schema::playlists;
use crate::{with_conn, with_conn_split};

impl From<PlaylistRecord> for Playlist {
    fn from(record: PlaylistRecord) -> Self {
        Playlist {
            id: record.playlist_id,
            channel_id: record.channel_id,
            channel_name: record.channel_name,
            title: record.title,
        }
    }
}

#[derive(Clone)]
pub struct PlaylistRepository {
    db: DbConnection,
}

impl PlaylistRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Insert a playlist unless its ID is already stored. Returns `true` when written.
    pub async fn insert_or_ignore(&self, playlist: &Playlist) -> Result<bool, DbError> {
        let row = NewPlaylist {
            playlist_id: &playlist.id,
            channel_id: &playlist.channel_id,
            channel_name: &playlist.channel_name,
            title: &playlist.title,
        };
        let written = with_conn_split!(self.db,
            sqlite: conn => {
                diesel::insert_or_ignore_into(playlists::table)
                    .values(&row)
                    .execute(conn)
                    .await?
            },
            postgres: conn => {
                diesel::insert_into(playlists::table)
                    .values(&row)
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .await?
            }
        );
        Ok(written > 0)
    }

    /// All playlists in insertion order.
    pub async fn get_all(&self) -> Result<Vec<Playlist>, DbError> {
        let order = self.db.insertion_order();
        let records: Vec<PlaylistRecord> = with_conn!(self.db, conn, {
            playlists::table.order(order).load(conn).await?
        });
        Ok(records.into_iter().map(Playlist::from).collect())
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        use diesel::dsl::count_star;
        with_conn!(self.db, conn, {
            playlists::table.select(count_star()).first(conn).await
        })
    }
}
