//! The ten canned views over the video table.
//!
//! Each view is a pure function of a video snapshot (in insertion order) and
//! a channel-name filter. Sorting is stable, so ties keep insertion order.
//! Null counts are skipped by sums and means and sort after every value.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

use crate::models::{Video, VideoDuration, TIMESTAMP_FORMAT};

/// Rows kept by the top-10 views.
pub const TOP_N: usize = 10;

/// Year the publication-year view uses unless told otherwise.
pub const DEFAULT_YEAR: i32 = 2022;

/// Channel names a view is restricted to. Empty means every channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelFilter {
    names: Option<HashSet<String>>,
}

impl ChannelFilter {
    pub fn all() -> Self {
        Self { names: None }
    }

    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: HashSet<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            Self::all()
        } else {
            Self { names: Some(names) }
        }
    }

    pub fn matches(&self, channel_name: &str) -> bool {
        self.names
            .as_ref()
            .map_or(true, |names| names.contains(channel_name))
    }

    fn apply<'a>(&'a self, videos: &'a [Video]) -> impl Iterator<Item = &'a Video> + 'a {
        videos.iter().filter(move |v| self.matches(&v.channel_name))
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoChannel {
    pub title: String,
    pub channel_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelVideoCount {
    pub channel_name: String,
    pub video_count: usize,
}

/// A video with one of its counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoCount {
    pub title: String,
    pub channel_name: String,
    pub count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedVideo {
    pub title: String,
    pub channel_name: String,
    #[serde(with = "crate::models::timestamp")]
    pub published_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelAverageDuration {
    pub channel_name: String,
    pub average_seconds: f64,
    /// Average rounded down to whole seconds, as `HH:MM:SS`.
    pub average_duration: VideoDuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelTotalViews {
    pub channel_name: String,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AboveAverageVideo {
    pub title: String,
    pub channel_name: String,
    pub views: i64,
    pub channel_average_views: f64,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// 1) Every video with its channel.
pub fn videos_with_channels(videos: &[Video], filter: &ChannelFilter) -> Vec<VideoChannel> {
    filter
        .apply(videos)
        .map(|v| VideoChannel {
            title: v.title.clone(),
            channel_name: v.channel_name.clone(),
        })
        .collect()
}

/// 2) Videos per channel, most first; ties by channel name.
pub fn video_counts_by_channel(videos: &[Video], filter: &ChannelFilter) -> Vec<ChannelVideoCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in filter.apply(videos) {
        *counts.entry(v.channel_name.as_str()).or_default() += 1;
    }

    let mut rows: Vec<ChannelVideoCount> = counts
        .into_iter()
        .map(|(name, count)| ChannelVideoCount {
            channel_name: name.to_string(),
            video_count: count,
        })
        .collect();
    // BTreeMap order is by name, so a stable sort leaves ties alphabetical
    rows.sort_by(|a, b| b.video_count.cmp(&a.video_count));
    rows
}

/// Stable descending sort on a nullable count, nulls last, then truncate.
fn top_by<F>(videos: &[Video], filter: &ChannelFilter, key: F) -> Vec<VideoCount>
where
    F: Fn(&Video) -> Option<i64>,
{
    let mut rows: Vec<VideoCount> = filter
        .apply(videos)
        .map(|v| VideoCount {
            title: v.title.clone(),
            channel_name: v.channel_name.clone(),
            count: key(v),
        })
        .collect();
    rows.sort_by(|a, b| match (a.count, b.count) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    rows.truncate(TOP_N);
    rows
}

/// 3) Ten most viewed videos.
pub fn top_by_views(videos: &[Video], filter: &ChannelFilter) -> Vec<VideoCount> {
    top_by(videos, filter, |v| v.views)
}

/// 4) Comment count of every video.
pub fn comment_counts(videos: &[Video], filter: &ChannelFilter) -> Vec<VideoCount> {
    filter
        .apply(videos)
        .map(|v| VideoCount {
            title: v.title.clone(),
            channel_name: v.channel_name.clone(),
            count: v.comments,
        })
        .collect()
}

/// 5) Videos published in `year` (UTC).
pub fn published_in_year(videos: &[Video], filter: &ChannelFilter, year: i32) -> Vec<PublishedVideo> {
    filter
        .apply(videos)
        .filter(|v| v.published_at.year() == year)
        .map(|v| PublishedVideo {
            title: v.title.clone(),
            channel_name: v.channel_name.clone(),
            published_at: v.published_at,
        })
        .collect()
}

/// 6) Mean video length per channel, by channel name.
pub fn average_duration_by_channel(
    videos: &[Video],
    filter: &ChannelFilter,
) -> Vec<ChannelAverageDuration> {
    let mut sums: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for v in filter.apply(videos) {
        let entry = sums.entry(v.channel_name.as_str()).or_default();
        entry.0 += v.duration.total_seconds();
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(name, (total, n))| {
            let average = total as f64 / n as f64;
            ChannelAverageDuration {
                channel_name: name.to_string(),
                average_seconds: average,
                // A mean never exceeds the longest duration it was taken over
                average_duration: VideoDuration::from_seconds(average as u64)
                    .unwrap_or_default(),
            }
        })
        .collect()
}

/// 7) Ten most liked videos.
pub fn top_by_likes(videos: &[Video], filter: &ChannelFilter) -> Vec<VideoCount> {
    top_by(videos, filter, |v| v.likes)
}

/// 8) Summed views per channel, by channel name.
pub fn total_views_by_channel(videos: &[Video], filter: &ChannelFilter) -> Vec<ChannelTotalViews> {
    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for v in filter.apply(videos) {
        *totals.entry(v.channel_name.as_str()).or_default() += v.views.unwrap_or(0);
    }
    totals
        .into_iter()
        .map(|(name, views)| ChannelTotalViews {
            channel_name: name.to_string(),
            views,
        })
        .collect()
}

/// 9) Videos with strictly more views than their channel's mean.
pub fn above_channel_average(videos: &[Video], filter: &ChannelFilter) -> Vec<AboveAverageVideo> {
    let mut sums: BTreeMap<&str, (i64, u64)> = BTreeMap::new();
    for v in filter.apply(videos) {
        if let Some(views) = v.views {
            let entry = sums.entry(v.channel_name.as_str()).or_default();
            entry.0 += views;
            entry.1 += 1;
        }
    }
    let means: BTreeMap<&str, f64> = sums
        .into_iter()
        .map(|(name, (total, n))| (name, total as f64 / n as f64))
        .collect();

    filter
        .apply(videos)
        .filter_map(|v| {
            let views = v.views?;
            let mean = *means.get(v.channel_name.as_str())?;
            ((views as f64) > mean).then(|| AboveAverageVideo {
                title: v.title.clone(),
                channel_name: v.channel_name.clone(),
                views,
                channel_average_views: mean,
            })
        })
        .collect()
}

/// 10) Ten most commented videos.
pub fn top_by_comments(videos: &[Video], filter: &ChannelFilter) -> Vec<VideoCount> {
    top_by(videos, filter, |v| v.comments)
}

// ---------------------------------------------------------------------------
// Named dispatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    VideosWithChannels,
    VideoCountsByChannel,
    TopByViews,
    CommentCounts,
    PublishedInYear,
    AverageDuration,
    TopByLikes,
    TotalViews,
    AboveChannelAverage,
    TopByComments,
}

impl ReportKind {
    pub const ALL: [ReportKind; 10] = [
        ReportKind::VideosWithChannels,
        ReportKind::VideoCountsByChannel,
        ReportKind::TopByViews,
        ReportKind::CommentCounts,
        ReportKind::PublishedInYear,
        ReportKind::AverageDuration,
        ReportKind::TopByLikes,
        ReportKind::TotalViews,
        ReportKind::AboveChannelAverage,
        ReportKind::TopByComments,
    ];

    /// Position in the list, starting at 1.
    pub fn number(&self) -> usize {
        Self::ALL.iter().position(|k| k == self).map_or(0, |i| i + 1)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::VideosWithChannels => "videos",
            Self::VideoCountsByChannel => "channel-counts",
            Self::TopByViews => "top-views",
            Self::CommentCounts => "comment-counts",
            Self::PublishedInYear => "by-year",
            Self::AverageDuration => "avg-duration",
            Self::TopByLikes => "top-likes",
            Self::TotalViews => "total-views",
            Self::AboveChannelAverage => "above-average",
            Self::TopByComments => "top-comments",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::VideosWithChannels => "Names of all the videos and their corresponding channels",
            Self::VideoCountsByChannel => "Channels with the most videos and how many they have",
            Self::TopByViews => "Top 10 most viewed videos and their channels",
            Self::CommentCounts => "Number of comments on each video",
            Self::PublishedInYear => "Videos published in a given year",
            Self::AverageDuration => "Average video duration per channel",
            Self::TopByLikes => "Videos with the most likes",
            Self::TotalViews => "Total views per channel",
            Self::AboveChannelAverage => "Videos with more views than their channel's average",
            Self::TopByComments => "Videos with the most comments",
        }
    }

    /// Compute this view over a snapshot.
    pub fn run(&self, videos: &[Video], filter: &ChannelFilter, year: i32) -> ReportTable {
        let (headers, rows): (Vec<&str>, Vec<Vec<Cell>>) = match self {
            Self::VideosWithChannels => (
                vec!["title", "channel_name"],
                videos_with_channels(videos, filter)
                    .into_iter()
                    .map(|r| vec![Cell::Text(r.title), Cell::Text(r.channel_name)])
                    .collect(),
            ),
            Self::VideoCountsByChannel => (
                vec!["channel_name", "video_count"],
                video_counts_by_channel(videos, filter)
                    .into_iter()
                    .map(|r| {
                        vec![
                            Cell::Text(r.channel_name),
                            Cell::Count(Some(r.video_count as i64)),
                        ]
                    })
                    .collect(),
            ),
            Self::TopByViews => (
                vec!["title", "channel_name", "views"],
                count_rows(top_by_views(videos, filter)),
            ),
            Self::CommentCounts => (
                vec!["title", "channel_name", "comments"],
                count_rows(comment_counts(videos, filter)),
            ),
            Self::PublishedInYear => (
                vec!["title", "channel_name", "published_at"],
                published_in_year(videos, filter, year)
                    .into_iter()
                    .map(|r| {
                        vec![
                            Cell::Text(r.title),
                            Cell::Text(r.channel_name),
                            Cell::Text(r.published_at.format(TIMESTAMP_FORMAT).to_string()),
                        ]
                    })
                    .collect(),
            ),
            Self::AverageDuration => (
                vec!["channel_name", "average_duration", "average_seconds"],
                average_duration_by_channel(videos, filter)
                    .into_iter()
                    .map(|r| {
                        vec![
                            Cell::Text(r.channel_name),
                            Cell::Text(r.average_duration.to_string()),
                            Cell::Decimal(r.average_seconds),
                        ]
                    })
                    .collect(),
            ),
            Self::TopByLikes => (
                vec!["title", "channel_name", "likes"],
                count_rows(top_by_likes(videos, filter)),
            ),
            Self::TotalViews => (
                vec!["channel_name", "views"],
                total_views_by_channel(videos, filter)
                    .into_iter()
                    .map(|r| vec![Cell::Text(r.channel_name), Cell::Count(Some(r.views))])
                    .collect(),
            ),
            Self::AboveChannelAverage => (
                vec!["title", "channel_name", "views", "channel_average_views"],
                above_channel_average(videos, filter)
                    .into_iter()
                    .map(|r| {
                        vec![
                            Cell::Text(r.title),
                            Cell::Text(r.channel_name),
                            Cell::Count(Some(r.views)),
                            Cell::Decimal(r.channel_average_views),
                        ]
                    })
                    .collect(),
            ),
            Self::TopByComments => (
                vec!["title", "channel_name", "comments"],
                count_rows(top_by_comments(videos, filter)),
            ),
        };

        ReportTable {
            kind: *self,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }
}

fn count_rows(rows: Vec<VideoCount>) -> Vec<Vec<Cell>> {
    rows.into_iter()
        .map(|r| {
            vec![
                Cell::Text(r.title),
                Cell::Text(r.channel_name),
                Cell::Count(r.count),
            ]
        })
        .collect()
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown report '{0}' (use a name from `report --list` or a number 1-10)")]
pub struct UnknownReport(pub String);

impl FromStr for ReportKind {
    type Err = UnknownReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        if let Ok(n) = wanted.parse::<usize>() {
            return n
                .checked_sub(1)
                .and_then(|i| Self::ALL.get(i).copied())
                .ok_or_else(|| UnknownReport(s.to_string()));
        }
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name() == wanted.replace('_', "-"))
            .ok_or_else(|| UnknownReport(s.to_string()))
    }
}

/// A single output value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Count(Option<i64>),
    Decimal(f64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Count(Some(n)) => write!(f, "{n}"),
            Cell::Count(None) => f.write_str("-"),
            Cell::Decimal(x) => write!(f, "{x:.2}"),
        }
    }
}

/// Tabular result of a view.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub kind: ReportKind,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ReportTable {
    /// Rows as JSON objects keyed by header.
    pub fn to_json(&self) -> serde_json::Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let object = self
                    .headers
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|cell| serde_json::to_value(cell).unwrap_or_default()))
                    .collect::<serde_json::Map<_, _>>();
                serde_json::Value::Object(object)
            })
            .collect();
        serde_json::Value::Array(rows)
    }
}
