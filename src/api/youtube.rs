//! YouTube Data API v3 client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::payload::{
    ChannelResource, CommentThreadResource, ErrorResponse, ListResponse, PlaylistItemResource,
    PlaylistResource, VideoResource,
};
use super::{ApiError, Page, VideoPlatform};
use crate::config::Settings;

/// Public Data API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Largest page (and id batch) the platform accepts for most listings.
pub const MAX_PAGE_SIZE: usize = 50;

/// Largest page the comment-thread listing accepts.
pub const MAX_COMMENT_PAGE_SIZE: u32 = 100;

const CHANNEL_PARTS: &str = "snippet,contentDetails,statistics";
const VIDEO_PARTS: &str = "snippet,contentDetails,statistics";

/// HTTP client for the Data API. One instance per process run.
pub struct YouTubeClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, ApiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ApiError::MissingApiKey);
        }

        // Fail early on a malformed base URL rather than on the first request
        Url::parse(base_url)?;

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build a client from resolved settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        let api_key = settings.api_key.as_deref().ok_or(ApiError::MissingApiKey)?;
        Self::new(
            api_key,
            &settings.api_base_url,
            Duration::from_secs(settings.request_timeout),
            &settings.user_agent,
        )
    }

    /// Full request URL for a resource. The key is appended last.
    fn endpoint(&self, resource: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, resource))?;
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(resource, params)?;
        debug!(resource, ?params, "GET");

        // The URL carries the key, so it is stripped from transport errors
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Http(e.without_url()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Http(e.without_url()))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(format!("{resource}: {e}")))
    }

    async fn list<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> Result<Page<T>, ApiError> {
        let response: ListResponse<T> = self.get(resource, params).await?;
        Ok(Page {
            items: response.items,
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }
}

/// Turn a non-2xx response into an [`ApiError::Status`], keeping the platform's reason.
fn status_error(status: u16, body: &str) -> ApiError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => {
            let detail = parsed.error.errors.into_iter().next();
            let reason = detail.as_ref().and_then(|d| d.reason.clone());
            let message = parsed
                .error
                .message
                .or_else(|| detail.and_then(|d| d.message))
                .unwrap_or_else(|| "no message".to_string());
            ApiError::Status {
                status: parsed.error.code.unwrap_or(status),
                reason,
                message,
            }
        }
        Err(_) => ApiError::Status {
            status,
            reason: None,
            message: body.chars().take(200).collect(),
        },
    }
}

#[async_trait]
impl VideoPlatform for YouTubeClient {
    async fn channels(&self, channel_id: &str) -> Result<Vec<ChannelResource>, ApiError> {
        let page = self
            .list("channels", &[("part", CHANNEL_PARTS), ("id", channel_id)])
            .await?;
        Ok(page.items)
    }

    async fn playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<PlaylistItemResource>, ApiError> {
        let max = MAX_PAGE_SIZE.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", max.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        self.list("playlistItems", &params).await
    }

    async fn videos(&self, video_ids: &[String]) -> Result<Vec<VideoResource>, ApiError> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = video_ids.join(",");
        let page = self
            .list("videos", &[("part", VIDEO_PARTS), ("id", ids.as_str())])
            .await?;
        Ok(page.items)
    }

    async fn playlists(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<PlaylistResource>, ApiError> {
        let max = MAX_PAGE_SIZE.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("channelId", channel_id),
            ("maxResults", max.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        self.list("playlists", &params).await
    }

    async fn comment_threads(
        &self,
        video_id: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page<CommentThreadResource>, ApiError> {
        let max = page_size.clamp(1, MAX_COMMENT_PAGE_SIZE).to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("videoId", video_id),
            ("maxResults", max.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        match self.list("commentThreads", &params).await {
            Err(e) if e.is_comments_disabled() => {
                debug!(video_id, "comments disabled");
                Ok(Page::empty())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer one HTTP request with a canned response. The handle yields the
    /// request line that was received.
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/youtube/v3", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (base_url, handle)
    }

    fn local_client(base_url: &str) -> YouTubeClient {
        YouTubeClient::new("test-key", base_url, Duration::from_secs(5), "tubevault-test")
            .unwrap()
    }

    fn client() -> YouTubeClient {
        YouTubeClient::new(
            "test-key",
            "https://example.test/youtube/v3/",
            Duration::from_secs(5),
            "tubevault-test",
        )
        .unwrap()
    }

    #[test]
    fn endpoint_appends_params_and_key() {
        let url = client()
            .endpoint("channels", &[("part", CHANNEL_PARTS), ("id", "UC123")])
            .unwrap();
        assert_eq!(url.path(), "/youtube/v3/channels");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("part".to_string(), CHANNEL_PARTS.to_string()),
                ("id".to_string(), "UC123".to_string()),
                ("key".to_string(), "test-key".to_string()),
            ]
        );
    }

    #[test]
    fn empty_key_is_rejected() {
        let result = YouTubeClient::new("  ", DEFAULT_BASE_URL, Duration::from_secs(5), "ua");
        assert!(matches!(result, Err(ApiError::MissingApiKey)));
    }

    #[test]
    fn status_error_reads_platform_reason() {
        let body = r#"{
            "error": {
                "code": 403,
                "message": "The video identified by the videoId parameter has disabled comments.",
                "errors": [{"reason": "commentsDisabled", "domain": "youtube.commentThread"}]
            }
        }"#;
        let err = status_error(403, body);
        assert!(err.is_comments_disabled());
        assert_eq!(err.reason(), Some("commentsDisabled"));
    }

    #[test]
    fn status_error_tolerates_non_json_bodies() {
        let err = status_error(502, "<html>Bad Gateway</html>");
        match err {
            ApiError::Status {
                status,
                reason,
                message,
            } => {
                assert_eq!(status, 502);
                assert!(reason.is_none());
                assert!(message.contains("Bad Gateway"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn disabled_comments_come_back_as_an_empty_page() {
        let body = r#"{"error": {"code": 403, "message": "The video identified by the videoId parameter has disabled comments.", "errors": [{"reason": "commentsDisabled", "domain": "youtube.commentThread"}]}}"#;
        let (base_url, server) = serve_once("403 Forbidden", body).await;

        let page = local_client(&base_url)
            .comment_threads("vid123", 100, None)
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
        let request_line = server.await.unwrap();
        assert!(request_line.starts_with("GET /youtube/v3/commentThreads?"));
        assert!(request_line.contains("videoId=vid123"));
    }

    #[tokio::test]
    async fn other_comment_errors_are_returned() {
        let body = r#"{"error": {"code": 403, "message": "Quota exceeded.", "errors": [{"reason": "quotaExceeded"}]}}"#;
        let (base_url, server) = serve_once("403 Forbidden", body).await;

        let err = local_client(&base_url)
            .comment_threads("vid123", 100, None)
            .await
            .unwrap_err();

        assert_eq!(err.reason(), Some("quotaExceeded"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn list_pages_carry_the_next_cursor() {
        let body = r#"{"items": [], "nextPageToken": "CAUQAA"}"#;
        let (base_url, server) = serve_once("200 OK", body).await;

        let page = local_client(&base_url)
            .playlist_items("UUabc", Some("CAIQAA"))
            .await
            .unwrap();

        assert_eq!(page.next_page_token.as_deref(), Some("CAUQAA"));
        let request_line = server.await.unwrap();
        assert!(request_line.contains("pageToken=CAIQAA"));
    }
}
