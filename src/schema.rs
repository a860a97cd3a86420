// Diesel table definitions. Kept in sync with the DDL in repository/schema.sql
// and repository/schema_postgres.sql.

diesel::table! {
    channels (channel_id) {
        channel_id -> Text,
        channel_name -> Text,
        subscribers -> Nullable<BigInt>,
        views -> Nullable<BigInt>,
        total_videos -> Nullable<BigInt>,
        description -> Nullable<Text>,
        uploads_playlist_id -> Nullable<Text>,
    }
}

diesel::table! {
    videos (video_id) {
        video_id -> Text,
        channel_id -> Text,
        channel_name -> Text,
        title -> Text,
        tags -> Nullable<Text>,
        thumbnails -> Text,
        description -> Nullable<Text>,
        published_at -> Text,
        duration -> Text,
        duration_seconds -> BigInt,
        views -> Nullable<BigInt>,
        likes -> Nullable<BigInt>,
        comments -> Nullable<BigInt>,
        favorites -> Nullable<BigInt>,
    }
}

diesel::table! {
    playlists (playlist_id) {
        playlist_id -> Text,
        channel_id -> Text,
        channel_name -> Text,
        title -> Text,
    }
}

diesel::table! {
    comments (comment_id) {
        comment_id -> Text,
        video_id -> Text,
        text -> Text,
        author -> Text,
        published_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(channels, videos, playlists, comments,);
