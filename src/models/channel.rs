//! Channel models.

use serde::{Deserialize, Serialize};

/// A channel on the video platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Platform-assigned channel ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Subscriber count (absent when the channel hides it).
    pub subscribers: Option<i64>,
    /// Lifetime view count.
    pub views: Option<i64>,
    /// Number of public videos.
    pub total_videos: Option<i64>,
    /// Channel description.
    pub description: Option<String>,
    /// ID of the platform-generated playlist holding every upload.
    pub uploads_playlist_id: Option<String>,
}

/// Outcome of the channel step of an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    /// The channel row was written by this run.
    Inserted,
    /// A row with this channel ID was already stored and was left untouched.
    AlreadyExists,
    /// The channel could not be fetched or stored.
    Failed,
}

impl ChannelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::AlreadyExists => "already_exists",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
