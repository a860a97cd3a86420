//! Diesel row types for the four harvest tables.

use diesel::prelude::*;

use crate::schema;

/// Channel row.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::channels)]
#[diesel(primary_key(channel_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ChannelRecord {
    pub channel_id: String,
    pub channel_name: String,
    pub subscribers: Option<i64>,
    pub views: Option<i64>,
    pub total_videos: Option<i64>,
    pub description: Option<String>,
    pub uploads_playlist_id: Option<String>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::channels)]
pub struct NewChannel<'a> {
    pub channel_id: &'a str,
    pub channel_name: &'a str,
    pub subscribers: Option<i64>,
    pub views: Option<i64>,
    pub total_videos: Option<i64>,
    pub description: Option<&'a str>,
    pub uploads_playlist_id: Option<&'a str>,
}

/// Video row. `tags` and `thumbnails` hold JSON text.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::videos)]
#[diesel(primary_key(video_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VideoRecord {
    pub video_id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub title: String,
    pub tags: Option<String>,
    pub thumbnails: String,
    pub description: Option<String>,
    pub published_at: String,
    pub duration: String,
    pub duration_seconds: i64,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub comments: Option<i64>,
    pub favorites: Option<i64>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::videos)]
pub struct NewVideo<'a> {
    pub video_id: &'a str,
    pub channel_id: &'a str,
    pub channel_name: &'a str,
    pub title: &'a str,
    pub tags: Option<&'a str>,
    pub thumbnails: &'a str,
    pub description: Option<&'a str>,
    pub published_at: &'a str,
    pub duration: &'a str,
    pub duration_seconds: i64,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub comments: Option<i64>,
    pub favorites: Option<i64>,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::playlists)]
#[diesel(primary_key(playlist_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PlaylistRecord {
    pub playlist_id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub title: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::playlists)]
pub struct NewPlaylist<'a> {
    pub playlist_id: &'a str,
    pub channel_id: &'a str,
    pub channel_name: &'a str,
    pub title: &'a str,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::comments)]
#[diesel(primary_key(comment_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CommentRecord {
    pub comment_id: String,
    pub video_id: String,
    pub text: String,
    pub author: String,
    pub published_at: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::comments)]
pub struct NewComment<'a> {
    pub comment_id: &'a str,
    pub video_id: &'a str,
    pub text: &'a str,
    pub author: &'a str,
    pub published_at: &'a str,
}
