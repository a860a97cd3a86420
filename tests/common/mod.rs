//! In-memory platform fake shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;

use tubevault::api::{
    ApiError, ChannelResource, CommentThreadResource, Page, PlaylistItemResource,
    PlaylistResource, VideoPlatform, VideoResource,
};
use tubevault::repository::DbContext;

/// How many times each endpoint was hit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calls {
    pub channels: usize,
    pub playlist_items: usize,
    pub videos: usize,
    pub playlists: usize,
    pub comment_threads: usize,
}

#[derive(Default)]
pub struct FakePlatform {
    channels: HashMap<String, Value>,
    /// Playlist ID -> pages of video IDs.
    uploads: HashMap<String, Vec<Vec<String>>>,
    videos: HashMap<String, Value>,
    playlists: HashMap<String, Vec<Value>>,
    comments: HashMap<String, Vec<Value>>,
    /// Video ID -> error reason returned for its comments.
    comment_errors: HashMap<String, String>,
    /// Uploads playlist ID -> page index that answers with a server error.
    upload_page_failures: HashMap<String, usize>,
    /// Channel lookups that fail before lookups start succeeding.
    channel_failures: Mutex<usize>,
    calls: Mutex<Calls>,
}

pub fn uploads_id(channel_id: &str) -> String {
    format!("UU{}", channel_id.trim_start_matches("UC"))
}

pub fn video_id(channel_id: &str, n: usize) -> String {
    format!("{}-v{:03}", channel_id, n)
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel whose uploads playlist lists `video_count` videos, 50 per page.
    pub fn with_channel(mut self, channel_id: &str, name: &str, video_count: usize) -> Self {
        let uploads = uploads_id(channel_id);
        self.channels.insert(
            channel_id.to_string(),
            json!({
                "id": channel_id,
                "snippet": {"title": name, "description": format!("{name} uploads")},
                "statistics": {
                    "subscriberCount": "1200",
                    "viewCount": "98000",
                    "videoCount": video_count.to_string(),
                    "hiddenSubscriberCount": false
                },
                "contentDetails": {"relatedPlaylists": {"uploads": uploads}}
            }),
        );

        let ids: Vec<String> = (0..video_count).map(|n| video_id(channel_id, n)).collect();
        for (n, id) in ids.iter().enumerate() {
            self.videos.insert(
                id.clone(),
                json!({
                    "id": id,
                    "snippet": {
                        "channelId": channel_id,
                        "channelTitle": name,
                        "title": format!("{name} video {n}"),
                        "tags": ["rust"],
                        "thumbnails": {"default": {"url": format!("https://i.ytimg.com/vi/{id}/default.jpg")}},
                        "publishedAt": "2022-05-01T12:00:00Z"
                    },
                    "contentDetails": {"duration": "PT1H2M3S"},
                    "statistics": {
                        "viewCount": ((n + 1) * 100).to_string(),
                        "likeCount": "7",
                        "commentCount": "2",
                        "favoriteCount": "0"
                    }
                }),
            );
        }
        let pages = if ids.is_empty() {
            vec![Vec::new()]
        } else {
            ids.chunks(50).map(|c| c.to_vec()).collect()
        };
        self.uploads.insert(uploads, pages);

        self.playlists.insert(
            channel_id.to_string(),
            vec![json!({
                "id": format!("PL{channel_id}"),
                "snippet": {"channelId": channel_id, "channelTitle": name, "title": "Favourites"}
            })],
        );
        self
    }

    /// Give every video of a channel `per_video` top-level comments.
    pub fn with_comments(mut self, channel_id: &str, video_count: usize, per_video: usize) -> Self {
        for n in 0..video_count {
            let vid = video_id(channel_id, n);
            let threads = (0..per_video)
                .map(|c| {
                    json!({
                        "id": format!("{vid}-t{c}"),
                        "snippet": {
                            "videoId": vid,
                            "topLevelComment": {
                                "id": format!("{vid}-c{c}"),
                                "snippet": {
                                    "videoId": vid,
                                    "textDisplay": format!("comment {c}"),
                                    "authorDisplayName": "viewer",
                                    "publishedAt": "2022-06-01T08:30:00Z"
                                }
                            }
                        }
                    })
                })
                .collect();
            self.comments.insert(vid, threads);
        }
        self
    }

    pub fn with_comment_error(mut self, video_id: &str, reason: &str) -> Self {
        self.comment_errors
            .insert(video_id.to_string(), reason.to_string());
        self
    }

    /// Drop one statistic from a video's payload.
    pub fn without_statistic(mut self, video_id: &str, field: &str) -> Self {
        if let Some(stats) = self
            .videos
            .get_mut(video_id)
            .and_then(|v| v.get_mut("statistics"))
            .and_then(Value::as_object_mut)
        {
            stats.remove(field);
        }
        self
    }

    /// Make one page (0-based) of a channel's uploads listing fail.
    pub fn failing_upload_page(mut self, channel_id: &str, page: usize) -> Self {
        self.upload_page_failures.insert(uploads_id(channel_id), page);
        self
    }

    pub fn failing_channel_lookups(self, count: usize) -> Self {
        *self.channel_failures.lock().unwrap() = count;
        self
    }

    pub fn calls(&self) -> Calls {
        *self.calls.lock().unwrap()
    }

    fn record(&self, f: impl FnOnce(&mut Calls)) {
        f(&mut *self.calls.lock().unwrap());
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: &Value) -> T {
    serde_json::from_value(value.clone()).unwrap()
}

fn page_index(token: Option<&str>) -> usize {
    token
        .and_then(|t| t.strip_prefix("page-"))
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl VideoPlatform for FakePlatform {
    async fn channels(&self, channel_id: &str) -> Result<Vec<ChannelResource>, ApiError> {
        self.record(|c| c.channels += 1);
        {
            let mut failures = self.channel_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(ApiError::Status {
                    status: 500,
                    reason: Some("backendError".to_string()),
                    message: "Backend Error".to_string(),
                });
            }
        }
        Ok(self.channels.get(channel_id).map(decode).into_iter().collect())
    }

    async fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<PlaylistItemResource>, ApiError> {
        self.record(|c| c.playlist_items += 1);
        let pages = self.uploads.get(playlist_id).ok_or_else(|| ApiError::Status {
            status: 404,
            reason: Some("playlistNotFound".to_string()),
            message: "The playlist identified with the request's playlistId parameter cannot be found.".to_string(),
        })?;

        let index = page_index(page_token);
        if self.upload_page_failures.get(playlist_id) == Some(&index) {
            return Err(ApiError::Status {
                status: 500,
                reason: Some("backendError".to_string()),
                message: "Backend Error".to_string(),
            });
        }
        let items = pages
            .get(index)
            .map(|ids| {
                ids.iter()
                    .map(|id| {
                        decode(&json!({
                            "id": format!("item-{id}"),
                            "snippet": {"resourceId": {"kind": "youtube#video", "videoId": id}}
                        }))
                    })
                    .collect()
            })
            .unwrap_or_default();
        let next_page_token = (index + 1 < pages.len()).then(|| format!("page-{}", index + 1));
        Ok(Page {
            items,
            next_page_token,
        })
    }

    async fn videos(&self, video_ids: &[String]) -> Result<Vec<VideoResource>, ApiError> {
        self.record(|c| c.videos += 1);
        assert!(video_ids.len() <= 50, "batch of {} ids", video_ids.len());
        Ok(video_ids
            .iter()
            .filter_map(|id| self.videos.get(id))
            .map(decode)
            .collect())
    }

    async fn playlists(
        &self,
        channel_id: &str,
        _page_token: Option<&str>,
    ) -> Result<Page<PlaylistResource>, ApiError> {
        self.record(|c| c.playlists += 1);
        let items = self
            .playlists
            .get(channel_id)
            .map(|p| p.iter().map(decode).collect())
            .unwrap_or_default();
        Ok(Page::last(items))
    }

    async fn comment_threads(
        &self,
        video_id: &str,
        _page_size: u32,
        _page_token: Option<&str>,
    ) -> Result<Page<CommentThreadResource>, ApiError> {
        self.record(|c| c.comment_threads += 1);
        if let Some(reason) = self.comment_errors.get(video_id) {
            return Err(ApiError::Status {
                status: 403,
                reason: Some(reason.clone()),
                message: "The video identified by the videoId parameter has disabled comments."
                    .to_string(),
            });
        }
        let items = self
            .comments
            .get(video_id)
            .map(|t| t.iter().map(decode).collect())
            .unwrap_or_default();
        Ok(Page::last(items))
    }
}

/// Fresh SQLite store in a temporary directory.
pub async fn setup_db() -> (DbContext, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = DbContext::open(&dir.path().join("tubevault.db"))
        .await
        .unwrap();
    ctx.init_schema().await.unwrap();
    (ctx, dir)
}
