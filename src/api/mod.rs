//! Remote platform API.
//!
//! [`VideoPlatform`] is the seam between the harvester and the network:
//! [`YouTubeClient`] talks to the real Data API, tests plug in fakes.

pub mod payload;
mod youtube;

pub use payload::{
    ChannelResource, CommentThreadResource, PlaylistItemResource, PlaylistResource,
    VideoResource,
};
pub use youtube::{YouTubeClient, DEFAULT_BASE_URL, MAX_COMMENT_PAGE_SIZE, MAX_PAGE_SIZE};

use async_trait::async_trait;
use thiserror::Error;

/// Platform error reasons that mean "this video has no readable comments".
const COMMENTS_DISABLED_REASONS: &[&str] = &["commentsDisabled"];

/// Errors from the remote platform.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("platform returned HTTP {status}{}: {message}", reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default())]
    Status {
        status: u16,
        reason: Option<String>,
        message: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("no API key configured (set YOUTUBE_API_KEY or api_key in the config file)")]
    MissingApiKey,
}

impl ApiError {
    /// The platform's machine-readable error reason, if it sent one.
    pub fn reason(&self) -> Option<&str> {
        match self {
            ApiError::Status { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }

    /// Whether the error only says the owner turned comments off.
    pub fn is_comments_disabled(&self) -> bool {
        self.reason()
            .is_some_and(|r| COMMENTS_DISABLED_REASONS.contains(&r))
    }
}

/// One page of a listing plus the cursor for the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Absent on the last page.
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_page_token: None,
        }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Read-only access to the video platform.
///
/// Implementations issue one request per call and never retry.
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    /// Look up a channel by ID (snippet, content details, statistics).
    /// Returns no items when the ID is unknown.
    async fn channels(&self, channel_id: &str) -> Result<Vec<ChannelResource>, ApiError>;

    /// One page of a playlist's items.
    async fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<PlaylistItemResource>, ApiError>;

    /// Look up videos by ID (snippet, content details, statistics).
    /// At most [`MAX_PAGE_SIZE`] IDs per call; unknown IDs are simply absent.
    async fn videos(&self, video_ids: &[String]) -> Result<Vec<VideoResource>, ApiError>;

    /// One page of a channel's playlists.
    async fn playlists(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<PlaylistResource>, ApiError>;

    /// One page of top-level comment threads on a video.
    ///
    /// A video with comments disabled yields an empty last page, not an error.
    async fn comment_threads(
        &self,
        video_id: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page<CommentThreadResource>, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_shows_reason() {
        let err = ApiError::Status {
            status: 403,
            reason: Some("quotaExceeded".to_string()),
            message: "The request cannot be completed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "platform returned HTTP 403 (quotaExceeded): The request cannot be completed"
        );
        assert!(!err.is_comments_disabled());
    }

    #[test]
    fn detects_disabled_comments() {
        let err = ApiError::Status {
            status: 403,
            reason: Some("commentsDisabled".to_string()),
            message: "disabled".to_string(),
        };
        assert!(err.is_comments_disabled());
        assert!(!ApiError::MissingApiKey.is_comments_disabled());
    }
}
