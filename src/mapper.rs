//! Raw API payload → domain record mapping.
//!
//! Pure functions. Missing optional fields become `None` (never zero) and are
//! logged at `debug`; only a record that cannot be stored meaningfully (no
//! publish time, unparseable duration) is rejected.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::payload::{
    ChannelResource, CommentThreadResource, Count, PlaylistResource, VideoResource,
};
use crate::models::{Channel, Comment, Playlist, Video, VideoDuration, TIMESTAMP_FORMAT};

/// A payload that could not be turned into a record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("{entity} {id}: missing {field}")]
    MissingField {
        entity: &'static str,
        id: String,
        field: &'static str,
    },

    #[error("{entity} {id}: {source}")]
    Timestamp {
        entity: &'static str,
        id: String,
        source: TimestampError,
    },

    #[error("video {id}: {source}")]
    Duration { id: String, source: DurationError },
}

/// An ISO-8601 duration the mapper refuses.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("duration '{0}' does not start with 'P'")]
    MissingDesignator(String),
    #[error("duration '{0}' uses calendar units (years or months) with no fixed length")]
    CalendarUnits(String),
    #[error("duration '{0}' is malformed")]
    Malformed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("timestamp '{0}' is not an ISO-8601 date-time")]
pub struct TimestampError(pub String);

/// Parse an ISO-8601 duration such as `PT1H2M3S` into hours, minutes and seconds.
///
/// Weeks and days are folded into hours; hours are not wrapped at 24.
/// Fractional seconds are truncated. Years and months are rejected because
/// their length depends on the calendar.
pub fn parse_duration(text: &str) -> Result<VideoDuration, DurationError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix('P')
        .ok_or_else(|| DurationError::MissingDesignator(text.to_string()))?;
    let malformed = || DurationError::Malformed(text.to_string());

    let mut total: u64 = 0;
    let mut number = String::new();
    let mut in_time = false;
    let mut saw_component = false;

    for ch in body.chars() {
        match ch {
            '0'..='9' | '.' | ',' => number.push(ch),
            'T' if !in_time && number.is_empty() => in_time = true,
            unit => {
                if number.is_empty() {
                    return Err(malformed());
                }
                let multiplier: u64 = match (in_time, unit) {
                    (false, 'W') => 7 * 86_400,
                    (false, 'D') => 86_400,
                    (false, 'Y') | (false, 'M') => {
                        return Err(DurationError::CalendarUnits(text.to_string()))
                    }
                    (true, 'H') => 3_600,
                    (true, 'M') => 60,
                    (true, 'S') => 1,
                    _ => return Err(malformed()),
                };
                let value = whole_part(&number, unit == 'S').ok_or_else(malformed)?;
                total = value
                    .checked_mul(multiplier)
                    .and_then(|v| total.checked_add(v))
                    .ok_or_else(malformed)?;
                number.clear();
                saw_component = true;
            }
        }
    }

    if !number.is_empty() || !saw_component {
        return Err(malformed());
    }

    VideoDuration::from_seconds(total).ok_or_else(malformed)
}

/// Integer value of a duration component. Only seconds may carry a fraction.
fn whole_part(number: &str, allow_fraction: bool) -> Option<u64> {
    match number.split_once(['.', ',']) {
        Some((whole, fraction)) => {
            if !allow_fraction || !fraction.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            whole.parse().ok()
        }
        None => number.parse().ok(),
    }
}

/// Parse a platform timestamp (`2022-05-01T12:00:00Z`) into naive UTC.
///
/// Offsets other than `Z` are converted to UTC; sub-second precision is dropped.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, TimestampError> {
    let trimmed = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        let utc = parsed.with_timezone(&Utc).naive_utc();
        return Ok(utc.with_nanosecond(0).unwrap_or(utc));
    }

    // Already-normalized or zone-less input
    let relaxed = trimmed.replacen('T', " ", 1);
    let relaxed = relaxed.trim_end_matches('Z');
    let relaxed = relaxed.split('.').next().unwrap_or(relaxed);
    NaiveDateTime::parse_from_str(relaxed, TIMESTAMP_FORMAT)
        .map_err(|_| TimestampError(text.to_string()))
}

/// Normalize a platform timestamp to `YYYY-MM-DD HH:MM:SS` (implicit UTC).
pub fn normalize_timestamp(text: &str) -> Result<String, TimestampError> {
    parse_timestamp(text).map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
}

fn count(value: Option<&Count>, entity: &'static str, id: &str, field: &'static str) -> Option<i64> {
    match value {
        Some(c) => {
            let parsed = c.value();
            if parsed.is_none() {
                warn!(entity, id, field, ?c, "unparseable count, storing null");
            }
            parsed
        }
        None => {
            debug!(entity, id, field, "count absent, storing null");
            None
        }
    }
}

/// Map a `channels.list` item.
pub fn map_channel(resource: &ChannelResource) -> Channel {
    let id = resource.id.as_str();
    let snippet = resource.snippet.as_ref();
    let stats = resource.statistics.as_ref();

    let name = snippet.and_then(|s| s.title.clone()).unwrap_or_else(|| {
        warn!(channel_id = id, "channel has no title");
        String::new()
    });

    let subscribers = match stats {
        Some(s) if s.hidden_subscriber_count && s.subscriber_count.is_none() => None,
        _ => count(
            stats.and_then(|s| s.subscriber_count.as_ref()),
            "channel",
            id,
            "subscribers",
        ),
    };

    let uploads_playlist_id = resource
        .content_details
        .as_ref()
        .and_then(|c| c.related_playlists.as_ref())
        .and_then(|r| r.uploads.clone());
    if uploads_playlist_id.is_none() {
        warn!(channel_id = id, "channel has no uploads playlist");
    }

    Channel {
        id: id.to_string(),
        name,
        subscribers,
        views: count(stats.and_then(|s| s.view_count.as_ref()), "channel", id, "views"),
        total_videos: count(
            stats.and_then(|s| s.video_count.as_ref()),
            "channel",
            id,
            "total_videos",
        ),
        description: snippet.and_then(|s| s.description.clone()),
        uploads_playlist_id,
    }
}

/// Map a `videos.list` item.
pub fn map_video(resource: &VideoResource) -> Result<Video, MapError> {
    let id = resource.id.as_str();
    let snippet = resource
        .snippet
        .as_ref()
        .ok_or_else(|| MapError::MissingField {
            entity: "video",
            id: id.to_string(),
            field: "snippet",
        })?;
    let stats = resource.statistics.as_ref();

    let published_raw = snippet
        .published_at
        .as_deref()
        .ok_or_else(|| MapError::MissingField {
            entity: "video",
            id: id.to_string(),
            field: "publishedAt",
        })?;
    let published_at = parse_timestamp(published_raw).map_err(|source| MapError::Timestamp {
        entity: "video",
        id: id.to_string(),
        source,
    })?;

    let duration = match resource
        .content_details
        .as_ref()
        .and_then(|c| c.duration.as_deref())
    {
        Some(raw) => parse_duration(raw).map_err(|source| MapError::Duration {
            id: id.to_string(),
            source,
        })?,
        None => {
            warn!(video_id = id, "video has no duration, storing 00:00:00");
            VideoDuration::default()
        }
    };

    Ok(Video {
        id: id.to_string(),
        channel_id: snippet.channel_id.clone().unwrap_or_default(),
        channel_name: snippet.channel_title.clone().unwrap_or_default(),
        title: snippet.title.clone().unwrap_or_else(|| {
            warn!(video_id = id, "video has no title");
            String::new()
        }),
        tags: snippet.tags.clone(),
        thumbnails: snippet
            .thumbnails
            .clone()
            .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
        description: snippet.description.clone(),
        published_at,
        duration,
        views: count(stats.and_then(|s| s.view_count.as_ref()), "video", id, "views"),
        likes: count(stats.and_then(|s| s.like_count.as_ref()), "video", id, "likes"),
        comments: count(
            stats.and_then(|s| s.comment_count.as_ref()),
            "video",
            id,
            "comments",
        ),
        favorites: count(
            stats.and_then(|s| s.favorite_count.as_ref()),
            "video",
            id,
            "favorites",
        ),
    })
}

/// Map a `playlists.list` item. The owner arguments fill in fields the snippet lacks.
pub fn map_playlist(resource: &PlaylistResource, channel_id: &str, channel_name: &str) -> Playlist {
    let snippet = resource.snippet.as_ref();
    Playlist {
        id: resource.id.clone(),
        channel_id: snippet
            .and_then(|s| s.channel_id.clone())
            .unwrap_or_else(|| channel_id.to_string()),
        channel_name: snippet
            .and_then(|s| s.channel_title.clone())
            .unwrap_or_else(|| channel_name.to_string()),
        title: snippet.and_then(|s| s.title.clone()).unwrap_or_default(),
    }
}

/// Map a `commentThreads.list` item to its top-level comment.
pub fn map_comment(thread: &CommentThreadResource, video_id: &str) -> Result<Comment, MapError> {
    let thread_snippet = thread.snippet.as_ref();
    let top = thread_snippet.and_then(|s| s.top_level_comment.as_ref());
    let id = top
        .and_then(|c| c.id.clone())
        .or_else(|| thread.id.clone())
        .ok_or_else(|| MapError::MissingField {
            entity: "comment",
            id: format!("on video {video_id}"),
            field: "id",
        })?;
    let snippet = top.and_then(|c| c.snippet.as_ref());

    let published_raw = snippet
        .and_then(|s| s.published_at.as_deref())
        .ok_or_else(|| MapError::MissingField {
            entity: "comment",
            id: id.clone(),
            field: "publishedAt",
        })?;
    let published_at = parse_timestamp(published_raw).map_err(|source| MapError::Timestamp {
        entity: "comment",
        id: id.clone(),
        source,
    })?;

    Ok(Comment {
        video_id: snippet
            .and_then(|s| s.video_id.clone())
            .or_else(|| thread_snippet.and_then(|s| s.video_id.clone()))
            .unwrap_or_else(|| video_id.to_string()),
        text: snippet
            .and_then(|s| s.text_display.clone())
            .unwrap_or_default(),
        author: snippet
            .and_then(|s| s.author_display_name.clone())
            .unwrap_or_default(),
        published_at,
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn duration(text: &str) -> (u32, u32, u32) {
        let d = parse_duration(text).unwrap();
        (d.hours, d.minutes, d.seconds)
    }

    #[test]
    fn parses_common_durations() {
        assert_eq!(duration("PT1H2M3S"), (1, 2, 3));
        assert_eq!(duration("PT45S"), (0, 0, 45));
        assert_eq!(duration("PT0S"), (0, 0, 0));
        assert_eq!(duration("PT15M"), (0, 15, 0));
        assert_eq!(duration("P0D"), (0, 0, 0));
    }

    #[test]
    fn normalizes_overflowing_components() {
        assert_eq!(duration("PT90M"), (1, 30, 0));
        assert_eq!(duration("PT3.9S"), (0, 0, 3));
    }

    #[test]
    fn long_durations_are_not_wrapped() {
        assert_eq!(duration("P1DT2H"), (26, 0, 0));
        assert_eq!(duration("P1W"), (168, 0, 0));
    }

    #[test]
    fn rejects_bad_durations() {
        assert!(matches!(
            parse_duration("1H"),
            Err(DurationError::MissingDesignator(_))
        ));
        assert!(matches!(
            parse_duration("P1M"),
            Err(DurationError::CalendarUnits(_))
        ));
        assert!(matches!(
            parse_duration("P1Y2D"),
            Err(DurationError::CalendarUnits(_))
        ));
        assert!(parse_duration("PT").is_err());
        assert!(parse_duration("PT5").is_err());
        assert!(parse_duration("PTH").is_err());
        assert!(parse_duration("PT1.5M").is_err());
    }

    #[test]
    fn rejects_durations_too_long_to_hold() {
        assert!(matches!(
            parse_duration("PT99999999999999H"),
            Err(DurationError::Malformed(_))
        ));
        // Overflows the running total itself
        assert!(matches!(
            parse_duration("P99999999999999999W"),
            Err(DurationError::Malformed(_))
        ));
        assert_eq!(duration("PT4294967295H").0, u32::MAX);
    }

    #[test]
    fn normalizes_timestamps() {
        assert_eq!(
            normalize_timestamp("2022-05-01T12:00:00Z").unwrap(),
            "2022-05-01 12:00:00"
        );
        assert_eq!(
            normalize_timestamp("2022-05-01T12:00:00.123Z").unwrap(),
            "2022-05-01 12:00:00"
        );
        assert_eq!(
            normalize_timestamp("2022-05-01T14:00:00+02:00").unwrap(),
            "2022-05-01 12:00:00"
        );
        assert_eq!(
            normalize_timestamp("2022-05-01 12:00:00").unwrap(),
            "2022-05-01 12:00:00"
        );
        assert!(normalize_timestamp("yesterday").is_err());
    }

    fn video_payload(stats: serde_json::Value) -> VideoResource {
        serde_json::from_value(json!({
            "id": "vid1",
            "snippet": {
                "channelId": "UCabc",
                "channelTitle": "Alpha",
                "title": "Intro",
                "thumbnails": {"default": {"url": "https://i.ytimg.com/vi/vid1/default.jpg"}},
                "publishedAt": "2022-05-01T12:00:00Z"
            },
            "contentDetails": {"duration": "PT4M13S"},
            "statistics": stats
        }))
        .unwrap()
    }

    #[test]
    fn missing_likes_map_to_null_not_zero() {
        let hidden = map_video(&video_payload(json!({"viewCount": "10"}))).unwrap();
        let zero = map_video(&video_payload(json!({"viewCount": "10", "likeCount": "0"}))).unwrap();

        assert_eq!(hidden.likes, None);
        assert_eq!(zero.likes, Some(0));
        assert_ne!(hidden.likes, zero.likes);
        assert_eq!(hidden.views, Some(10));
    }

    #[test]
    fn maps_video_fields() {
        let video = map_video(&video_payload(json!({
            "viewCount": "1200",
            "likeCount": "30",
            "commentCount": "4",
            "favoriteCount": "0"
        })))
        .unwrap();

        assert_eq!(video.channel_name, "Alpha");
        assert_eq!(video.tags, None);
        assert_eq!(video.duration.to_string(), "00:04:13");
        assert_eq!(
            video.published_at.format(TIMESTAMP_FORMAT).to_string(),
            "2022-05-01 12:00:00"
        );
        assert_eq!(video.comments, Some(4));
        assert_eq!(video.thumbnails["default"]["url"], json!("https://i.ytimg.com/vi/vid1/default.jpg"));
    }

    #[test]
    fn video_without_publish_time_is_rejected() {
        let resource: VideoResource =
            serde_json::from_value(json!({"id": "vid2", "snippet": {"title": "x"}})).unwrap();
        assert_eq!(
            map_video(&resource),
            Err(MapError::MissingField {
                entity: "video",
                id: "vid2".to_string(),
                field: "publishedAt",
            })
        );
    }

    #[test]
    fn maps_channel_with_hidden_subscribers() {
        let resource: ChannelResource = serde_json::from_value(json!({
            "id": "UCabc",
            "snippet": {"title": "Alpha", "description": "about"},
            "statistics": {"viewCount": "99", "videoCount": "3", "hiddenSubscriberCount": true},
            "contentDetails": {"relatedPlaylists": {"uploads": "UUabc"}}
        }))
        .unwrap();

        let channel = map_channel(&resource);
        assert_eq!(channel.name, "Alpha");
        assert_eq!(channel.subscribers, None);
        assert_eq!(channel.views, Some(99));
        assert_eq!(channel.total_videos, Some(3));
        assert_eq!(channel.uploads_playlist_id.as_deref(), Some("UUabc"));
    }

    #[test]
    fn maps_comment_from_top_level_snippet() {
        let thread: CommentThreadResource = serde_json::from_value(json!({
            "id": "thread1",
            "snippet": {
                "videoId": "vid1",
                "topLevelComment": {
                    "id": "comment1",
                    "snippet": {
                        "videoId": "vid1",
                        "textDisplay": "Great video",
                        "authorDisplayName": "viewer",
                        "publishedAt": "2023-01-02T10:00:00Z"
                    }
                }
            }
        }))
        .unwrap();

        let comment = map_comment(&thread, "vid1").unwrap();
        assert_eq!(comment.id, "comment1");
        assert_eq!(comment.text, "Great video");
        assert_eq!(comment.author, "viewer");
    }

    #[test]
    fn playlist_falls_back_to_owner() {
        let resource: PlaylistResource =
            serde_json::from_value(json!({"id": "PL1", "snippet": {"title": "Talks"}})).unwrap();

        let playlist = map_playlist(&resource, "UCabc", "Alpha");
        assert_eq!(playlist.channel_id, "UCabc");
        assert_eq!(playlist.channel_name, "Alpha");
        assert_eq!(playlist.title, "Talks");
    }
}
