//! Channel repository.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::connection::{DbConnection, DbError};
use super::models::{ChannelRecord, NewChannel};
use crate::models::Channel;
use crate::schema::channels;
use crate::{with_conn, with_conn_split};

impl From<ChannelRecord> for Channel {
    fn from(record: ChannelRecord) -> Self {
        Channel {
            id: record.channel_id,
            name: record.channel_name,
            subscribers: record.subscribers,
            views: record.views,
            total_videos: record.total_videos,
            description: record.description,
            uploads_playlist_id: record.uploads_playlist_id,
        }
    }
}

impl<'a> From<&'a Channel> for NewChannel<'a> {
    fn from(channel: &'a Channel) -> Self {
        NewChannel {
            channel_id: &channel.id,
            channel_name: &channel.name,
            subscribers: channel.subscribers,
            views: channel.views,
            total_videos: channel.total_videos,
            description: channel.description.as_deref(),
            uploads_playlist_id: channel.uploads_playlist_id.as_deref(),
        }
    }
}

#[derive(Clone)]
pub struct ChannelRepository {
    db: DbConnection,
}

impl ChannelRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Insert a channel unless its ID is already stored.
    ///
    /// Returns `true` when a row was written. An existing row is never modified.
    pub async fn insert_or_ignore(&self, channel: &Channel) -> Result<bool, DbError> {
        let row = NewChannel::from(channel);
        let written = with_conn_split!(self.db,
            sqlite: conn => {
                diesel::insert_or_ignore_into(channels::table)
                    .values(&row)
                    .execute(conn)
                    .await?
            },
            postgres: conn => {
                diesel::insert_into(channels::table)
                    .values(&row)
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .await?
            }
        );
        Ok(written > 0)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Channel>, DbError> {
        with_conn!(self.db, conn, {
            channels::table
                .find(id)
                .first::<ChannelRecord>(conn)
                .await
                .optional()
                .map(|opt| opt.map(Channel::from))
        })
    }

    /// All channels in insertion order.
    pub async fn get_all(&self) -> Result<Vec<Channel>, DbError> {
        let order = self.db.insertion_order();
        let records: Vec<ChannelRecord> = with_conn!(self.db, conn, {
            channels::table.order(order).load(conn).await?
        });
        Ok(records.into_iter().map(Channel::from).collect())
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        use diesel::dsl::count_star;
        with_conn!(self.db, conn, {
            channels::table.select(count_star()).first(conn).await
        })
    }
}
