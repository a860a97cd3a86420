//! Cursor-driven pagination over platform listings.

use std::collections::HashSet;
use std::future::Future;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, Page, VideoPlatform};

/// Upper bound on upload-playlist pages (50 ids each) before giving up.
pub const DEFAULT_MAX_UPLOAD_PAGES: usize = 2_000;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("channel {0} not found")]
    ChannelNotFound(String),

    #[error("channel {0} has no uploads playlist")]
    NoUploadsPlaylist(String),

    #[error("playlist {playlist_id} still had more pages after {pages} pages")]
    PageLimitExceeded { playlist_id: String, pages: usize },

    #[error("platform repeated page cursor '{0}'")]
    RepeatedCursor(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Items gathered by [`paginate`].
///
/// A listing that breaks off part way still keeps what earlier pages
/// returned; `error` says why it stopped.
#[derive(Debug)]
pub struct Paged<T> {
    pub items: Vec<T>,
    /// Pages fetched successfully.
    pub pages: usize,
    /// A cursor was still pending when the page limit was reached.
    pub truncated: bool,
    pub error: Option<CollectError>,
}

impl<T> Paged<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            pages: 0,
            truncated: false,
            error: None,
        }
    }

    /// Swap the items for something derived from them, keeping the outcome.
    pub fn map_items<U>(self, f: impl FnOnce(Vec<T>) -> Vec<U>) -> Paged<U> {
        Paged {
            items: f(self.items),
            pages: self.pages,
            truncated: self.truncated,
            error: self.error,
        }
    }
}

/// Follow continuation cursors until the last page or `max_pages`.
///
/// `max_pages == 0` means no limit. A failed page or a cursor equal to the
/// one just used stops the listing; items from earlier pages are kept.
pub async fn paginate<T, F, Fut>(max_pages: usize, mut fetch: F) -> Paged<T>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
{
    let mut paged = Paged::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = match fetch(page_token.clone()).await {
            Ok(page) => page,
            Err(e) => {
                paged.error = Some(e.into());
                break;
            }
        };
        paged.pages += 1;
        paged.items.extend(page.items);

        let Some(token) = page.next_page_token else {
            break;
        };
        if page_token.as_deref() == Some(token.as_str()) {
            paged.error = Some(CollectError::RepeatedCursor(token));
            break;
        }
        if max_pages != 0 && paged.pages >= max_pages {
            paged.truncated = true;
            break;
        }
        debug!(page = paged.pages, "fetching next page");
        page_token = Some(token);
    }

    paged
}

/// Resolve a channel's uploads playlist ID.
pub async fn uploads_playlist_id(
    api: &dyn VideoPlatform,
    channel_id: &str,
) -> Result<String, CollectError> {
    let channels = api.channels(channel_id).await?;
    let channel = channels
        .into_iter()
        .next()
        .ok_or_else(|| CollectError::ChannelNotFound(channel_id.to_string()))?;

    channel
        .content_details
        .and_then(|c| c.related_playlists)
        .and_then(|r| r.uploads)
        .ok_or_else(|| CollectError::NoUploadsPlaylist(channel_id.to_string()))
}

/// Every video ID in a playlist, in listing order, without duplicates.
///
/// Running into `max_pages` is reported as [`CollectError::PageLimitExceeded`]
/// alongside the IDs gathered up to that point.
pub async fn collect_playlist_video_ids(
    api: &dyn VideoPlatform,
    playlist_id: &str,
    max_pages: usize,
) -> Paged<String> {
    let mut paged = paginate(max_pages, |token| async move {
        api.playlist_items(playlist_id, token.as_deref()).await
    })
    .await;

    if paged.truncated && paged.error.is_none() {
        paged.error = Some(CollectError::PageLimitExceeded {
            playlist_id: playlist_id.to_string(),
            pages: paged.pages,
        });
    }

    let paged = paged.map_items(|items| {
        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(items.len());
        for item in &items {
            match item.video_id() {
                Some(id) if seen.insert(id.to_string()) => ids.push(id.to_string()),
                Some(id) => debug!(video_id = id, "duplicate playlist entry"),
                None => warn!(playlist_id, item = ?item.id, "playlist item without a video id"),
            }
        }
        ids
    });

    info!(
        "Collected {} video ids from {} pages of {}",
        paged.items.len(),
        paged.pages,
        playlist_id
    );
    paged
}

/// Every uploaded video ID of a channel.
///
/// Pass `known_uploads` when the channel record was already fetched to skip
/// the lookup. Fails outright only when the uploads playlist cannot be
/// resolved; a listing that breaks off returns its partial IDs.
pub async fn collect_upload_ids(
    api: &dyn VideoPlatform,
    channel_id: &str,
    known_uploads: Option<&str>,
    max_pages: usize,
) -> Result<Paged<String>, CollectError> {
    let playlist_id = match known_uploads {
        Some(id) => id.to_string(),
        None => uploads_playlist_id(api, channel_id).await?,
    };
    Ok(collect_playlist_video_ids(api, &playlist_id, max_pages).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        ChannelResource, CommentThreadResource, PlaylistItemResource, PlaylistResource,
        VideoResource,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn page(items: Vec<u32>, next: Option<&str>) -> Page<u32> {
        Page {
            items,
            next_page_token: next.map(str::to_string),
        }
    }

    fn backend_error() -> ApiError {
        ApiError::Status {
            status: 500,
            reason: Some("backendError".to_string()),
            message: "Backend Error".to_string(),
        }
    }

    #[tokio::test]
    async fn follows_cursors_to_the_end() {
        let calls = AtomicUsize::new(0);
        let paged = paginate(0, |token| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                match (n, token.as_deref()) {
                    (0, None) => Ok(page(vec![1, 2], Some("a"))),
                    (1, Some("a")) => Ok(page(vec![3], Some("b"))),
                    (2, Some("b")) => Ok(page(vec![4], None)),
                    other => panic!("unexpected call {other:?}"),
                }
            }
        })
        .await;

        assert_eq!(paged.items, vec![1, 2, 3, 4]);
        assert_eq!(paged.pages, 3);
        assert!(!paged.truncated);
        assert!(paged.error.is_none());
    }

    #[tokio::test]
    async fn stops_at_page_limit() {
        let paged = paginate(2, |token| async move {
            let next = format!("{}x", token.unwrap_or_default());
            Ok(page(vec![1], Some(next.as_str())))
        })
        .await;

        assert_eq!(paged.pages, 2);
        assert!(paged.truncated);
        assert!(paged.error.is_none());
    }

    #[tokio::test]
    async fn repeated_cursor_keeps_earlier_items() {
        let paged = paginate(0, |_token| async { Ok(page(vec![1], Some("same"))) }).await;
        // First page hands out "same", second repeats it
        assert_eq!(paged.items, vec![1, 1]);
        assert!(matches!(paged.error, Some(CollectError::RepeatedCursor(t)) if t == "same"));
    }

    #[tokio::test]
    async fn failed_first_page_yields_nothing() {
        let paged: Paged<u32> =
            paginate(0, |_token| async { Err(ApiError::MissingApiKey) }).await;
        assert!(paged.items.is_empty());
        assert_eq!(paged.pages, 0);
        assert!(matches!(
            paged.error,
            Some(CollectError::Api(ApiError::MissingApiKey))
        ));
    }

    #[tokio::test]
    async fn failed_later_page_keeps_earlier_items() {
        let paged = paginate(0, |token| async move {
            match token.as_deref() {
                None => Ok(page(vec![1, 2, 3], Some("p2"))),
                Some(_) => Err(backend_error()),
            }
        })
        .await;

        assert_eq!(paged.items, vec![1, 2, 3]);
        assert_eq!(paged.pages, 1);
        assert!(matches!(paged.error, Some(CollectError::Api(_))));
    }

    /// Uploads playlist whose cursor never runs out.
    struct EndlessUploads {
        served: AtomicUsize,
    }

    #[async_trait]
    impl VideoPlatform for EndlessUploads {
        async fn channels(&self, _channel_id: &str) -> Result<Vec<ChannelResource>, ApiError> {
            Ok(Vec::new())
        }

        async fn playlist_items(
            &self,
            _playlist_id: &str,
            _page_token: Option<&str>,
        ) -> Result<Page<PlaylistItemResource>, ApiError> {
            let n = self.served.fetch_add(1, Ordering::SeqCst);
            let item = serde_json::from_value(json!({
                "id": format!("item-{n}"),
                "snippet": {"resourceId": {"kind": "youtube#video", "videoId": format!("v{n}")}}
            }))
            .unwrap();
            Ok(Page {
                items: vec![item],
                next_page_token: Some(format!("page-{}", n + 1)),
            })
        }

        async fn videos(&self, _video_ids: &[String]) -> Result<Vec<VideoResource>, ApiError> {
            Ok(Vec::new())
        }

        async fn playlists(
            &self,
            _channel_id: &str,
            _page_token: Option<&str>,
        ) -> Result<Page<PlaylistResource>, ApiError> {
            Ok(Page::empty())
        }

        async fn comment_threads(
            &self,
            _video_id: &str,
            _page_size: u32,
            _page_token: Option<&str>,
        ) -> Result<Page<CommentThreadResource>, ApiError> {
            Ok(Page::empty())
        }
    }

    #[tokio::test]
    async fn runaway_upload_listing_hits_the_page_limit() {
        let api = EndlessUploads {
            served: AtomicUsize::new(0),
        };

        let paged = collect_upload_ids(&api, "UCloop", Some("UUloop"), 2)
            .await
            .unwrap();

        assert_eq!(api.served.load(Ordering::SeqCst), 2);
        assert_eq!(paged.items, vec!["v0", "v1"]);
        assert!(matches!(
            paged.error,
            Some(CollectError::PageLimitExceeded { ref playlist_id, pages: 2 })
                if playlist_id == "UUloop"
        ));
    }

    #[tokio::test]
    async fn unknown_channel_fails_before_listing() {
        let api = EndlessUploads {
            served: AtomicUsize::new(0),
        };

        let err = collect_upload_ids(&api, "UCnone", None, 2).await.unwrap_err();
        assert!(matches!(err, CollectError::ChannelNotFound(id) if id == "UCnone"));
        assert_eq!(api.served.load(Ordering::SeqCst), 0);
    }
}
