//! Comment model.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A top-level comment on a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// ID of the top-level comment (not the thread).
    pub id: String,
    pub video_id: String,
    pub text: String,
    pub author: String,
    #[serde(with = "super::timestamp")]
    pub published_at: NaiveDateTime,
}
