//! Video repository.
//!
//! Tags and thumbnails are stored as JSON text, the publish time as
//! `YYYY-MM-DD HH:MM:SS`, and the duration both as `HH:MM:SS` text and as
//! whole seconds. Reads rebuild the duration from the seconds column.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::connection::{DbConnection, DbError};
use super::models::{NewVideo, VideoRecord};
use super::util::{to_deserialization_error, to_serialization_error};
use crate::models::{InvalidDuration, Video, VideoDuration, TIMESTAMP_FORMAT};
use crate::schema::videos;
use crate::{with_conn, with_conn_split};

impl TryFrom<VideoRecord> for Video {
    type Error = DbError;

    fn try_from(record: VideoRecord) -> Result<Self, Self::Error> {
        let tags = record
            .tags
            .as_deref()
            .map(serde_json::from_str::<Vec<String>>)
            .transpose()
            .map_err(to_deserialization_error)?;
        let thumbnails =
            serde_json::from_str(&record.thumbnails).map_err(to_deserialization_error)?;
        let published_at = NaiveDateTime::parse_from_str(&record.published_at, TIMESTAMP_FORMAT)
            .map_err(to_deserialization_error)?;
        let duration = u64::try_from(record.duration_seconds)
            .ok()
            .and_then(VideoDuration::from_seconds)
            .ok_or_else(|| {
                to_deserialization_error(InvalidDuration(record.duration_seconds.to_string()))
            })?;

        Ok(Video {
            id: record.video_id,
            channel_id: record.channel_id,
            channel_name: record.channel_name,
            title: record.title,
            tags,
            thumbnails,
            description: record.description,
            published_at,
            duration,
            views: record.views,
            likes: record.likes,
            comments: record.comments,
            favorites: record.favorites,
        })
    }
}

#[derive(Clone)]
pub struct VideoRepository {
    db: DbConnection,
}

impl VideoRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Insert a video unless its ID is already stored. Returns `true` when written.
    pub async fn insert_or_ignore(&self, video: &Video) -> Result<bool, DbError> {
        let tags = video
            .tags
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(to_serialization_error)?;
        let thumbnails =
            serde_json::to_string(&video.thumbnails).map_err(to_serialization_error)?;
        let published_at = video.published_at.format(TIMESTAMP_FORMAT).to_string();
        let duration = video.duration.to_string();

        let row = NewVideo {
            video_id: &video.id,
            channel_id: &video.channel_id,
            channel_name: &video.channel_name,
            title: &video.title,
            tags: tags.as_deref(),
            thumbnails: &thumbnails,
            description: video.description.as_deref(),
            published_at: &published_at,
            duration: &duration,
            duration_seconds: video.duration.total_seconds() as i64,
            views: video.views,
            likes: video.likes,
            comments: video.comments,
            favorites: video.favorites,
        };

        let written = with_conn_split!(self.db,
            sqlite: conn => {
                diesel::insert_or_ignore_into(videos::table)
                    .values(&row)
                    .execute(conn)
                    .await?
            },
            postgres: conn => {
                diesel::insert_into(videos::table)
                    .values(&row)
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .await?
            }
        );
        Ok(written > 0)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Video>, DbError> {
        with_conn!(self.db, conn, {
            videos::table
                .find(id)
                .first::<VideoRecord>(conn)
                .await
                .optional()
                .and_then(|opt| opt.map(Video::try_from).transpose())
        })
    }

    /// All videos in insertion order.
    pub async fn get_all(&self) -> Result<Vec<Video>, DbError> {
        let order = self.db.insertion_order();
        let records: Vec<VideoRecord> = with_conn!(self.db, conn, {
            videos::table.order(order).load(conn).await?
        });
        records.into_iter().map(Video::try_from).collect()
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        use diesel::dsl::count_star;
        with_conn!(self.db, conn, {
            videos::table.select(count_star()).first(conn).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup_test_db;
    use chrono::NaiveDate;
    use serde_json::json;

    fn video(id: &str, views: Option<i64>, seconds: u64) -> Video {
        Video {
            id: id.to_string(),
            channel_id: "UCabc".to_string(),
            channel_name: "Alpha".to_string(),
            title: format!("Video {id}"),
            tags: Some(vec!["rust".to_string(), "db".to_string()]),
            thumbnails: json!({"default": {"url": "https://i.ytimg.com/vi/x/default.jpg"}}),
            description: None,
            published_at: NaiveDate::from_ymd_opt(2022, 3, 4)
                .unwrap()
                .and_hms_opt(5, 6, 7)
                .unwrap(),
            duration: VideoDuration::from_seconds(seconds).unwrap(),
            views,
            likes: Some(3),
            comments: None,
            favorites: Some(0),
        }
    }

    #[tokio::test]
    async fn test_video_round_trip() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.videos();

        let original = video("v1", Some(42), 26 * 3600 + 5);
        assert!(repo.insert_or_ignore(&original).await.unwrap());

        let stored = repo.get("v1").await.unwrap().unwrap();
        assert_eq!(stored, original);
        assert_eq!(stored.duration.to_string(), "26:00:05");
    }

    #[tokio::test]
    async fn test_missing_tags_stay_null() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.videos();

        let mut v = video("v2", None, 60);
        v.tags = None;
        repo.insert_or_ignore(&v).await.unwrap();

        let stored = repo.get("v2").await.unwrap().unwrap();
        assert_eq!(stored.tags, None);
        assert_eq!(stored.views, None);
    }

    #[tokio::test]
    async fn test_duplicate_video_is_ignored() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.videos();

        assert!(repo.insert_or_ignore(&video("v3", Some(1), 10)).await.unwrap());
        assert!(!repo.insert_or_ignore(&video("v3", Some(500), 10)).await.unwrap());

        let stored = repo.get("v3").await.unwrap().unwrap();
        assert_eq!(stored.views, Some(1));
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
