//! Data models for tubevault.

mod channel;
mod comment;
mod playlist;
mod video;

pub use channel::{Channel, ChannelStatus};
pub use comment::Comment;
pub use playlist::Playlist;
pub use video::{InvalidDuration, Video, VideoDuration};

/// Format used for every persisted and displayed timestamp.
///
/// Platform timestamps are UTC; the zone marker is dropped on normalization.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serde adapter for naive timestamps in [`TIMESTAMP_FORMAT`].
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
