//! Video models.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single uploaded video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub title: String,
    /// Tag list, absent when the uploader set none.
    pub tags: Option<Vec<String>>,
    /// Thumbnail set keyed by size name, kept as delivered.
    pub thumbnails: serde_json::Value,
    pub description: Option<String>,
    #[serde(with = "super::timestamp")]
    pub published_at: NaiveDateTime,
    pub duration: VideoDuration,
    pub views: Option<i64>,
    pub likes: Option<i64>,
    pub comments: Option<i64>,
    pub favorites: Option<i64>,
}

/// Video length in whole seconds, split into hours, minutes and seconds.
///
/// Hours are not wrapped at 24, so long live streams keep their real length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VideoDuration {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl VideoDuration {
    /// Split whole seconds into parts. `None` when the hours overflow `u32`.
    pub fn from_seconds(total: u64) -> Option<Self> {
        let hours = u32::try_from(total / 3600).ok()?;
        Some(Self {
            hours,
            minutes: ((total % 3600) / 60) as u32,
            seconds: (total % 60) as u32,
        })
    }

    pub fn total_seconds(&self) -> u64 {
        self.hours as u64 * 3600 + self.minutes as u64 * 60 + self.seconds as u64
    }

    /// Time-of-day view, only available for durations under 24 hours.
    pub fn as_time_of_day(&self) -> Option<NaiveTime> {
        if self.hours >= 24 {
            return None;
        }
        NaiveTime::from_hms_opt(self.hours, self.minutes, self.seconds)
    }
}

impl fmt::Display for VideoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Error returned when a stored `HH:MM:SS` value cannot be read back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid duration '{0}', expected HH:MM:SS")]
pub struct InvalidDuration(pub String);

impl FromStr for VideoDuration {
    type Err = InvalidDuration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDuration(s.to_string());
        let mut parts = s.split(':');
        let mut next = || -> Result<u32, InvalidDuration> {
            parts
                .next()
                .ok_or_else(invalid)?
                .parse::<u32>()
                .map_err(|_| invalid())
        };
        let hours = next()?;
        let minutes = next()?;
        let seconds = next()?;
        if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
            return Err(invalid());
        }
        Ok(Self {
            hours,
            minutes,
            seconds,
        })
    }
}

impl Serialize for VideoDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VideoDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
