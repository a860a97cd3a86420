//! Comment repository.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::connection::{DbConnection, DbError};
use super::models::{CommentRecord, NewComment};
use super::util::to_deserialization_error;
use crate::models::{Comment, TIMESTAMP_FORMAT};
use crate::schema::comments;
use crate::{with_conn, with_conn_split};

impl TryFrom<CommentRecord> for Comment {
    type Error = DbError;

    fn try_from(record: CommentRecord) -> Result<Self, Self::Error> {
        let published_at = NaiveDateTime::parse_from_str(&record.published_at, TIMESTAMP_FORMAT)
            .map_err(to_deserialization_error)?;
        Ok(Comment {
            id: record.comment_id,
            video_id: record.video_id,
            text: record.text,
            author: record.author,
            published_at,
        })
    }
}

#[derive(Clone)]
pub struct CommentRepository {
    db: DbConnection,
}

impl CommentRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Insert a comment unless its ID is already stored. Returns `true` when written.
    pub async fn insert_or_ignore(&self, comment: &Comment) -> Result<bool, DbError> {
        let published_at = comment.published_at.format(TIMESTAMP_FORMAT).to_string();
        let row = NewComment {
            comment_id: &comment.id,
            video_id: &comment.video_id,
            text: &comment.text,
            author: &comment.author,
            published_at: &published_at,
        };
        let written = with_conn_split!(self.db,
            sqlite: conn => {
                diesel::insert_or_ignore_into(comments::table)
                    .values(&row)
                    .execute(conn)
                    .await?
            },
            postgres: conn => {
                diesel::insert_into(comments::table)
                    .values(&row)
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .await?
            }
        );
        Ok(written > 0)
    }

    /// All comments in insertion order.
    pub async fn get_all(&self) -> Result<Vec<Comment>, DbError> {
        let order = self.db.insertion_order();
        let records: Vec<CommentRecord> = with_conn!(self.db, conn, {
            comments::table.order(order).load(conn).await?
        });
        records.into_iter().map(Comment::try_from).collect()
    }

    /// Comments on one video, in insertion order.
    pub async fn for_video(&self, video_id: &str) -> Result<Vec<Comment>, DbError> {
        let order = self.db.insertion_order();
        let records: Vec<CommentRecord> = with_conn!(self.db, conn, {
            comments::table
                .filter(comments::video_id.eq(video_id))
                .order(order)
                .load(conn)
                .await?
        });
        records.into_iter().map(Comment::try_from).collect()
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        use diesel::dsl::count_star;
        with_conn!(self.db, conn, {
            comments::table.select(count_star()).first(conn).await
        })
    }
}
