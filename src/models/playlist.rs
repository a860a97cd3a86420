//! Playlist model.

use serde::{Deserialize, Serialize};

/// A playlist owned by a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub title: String,
}
