//! Channel ingestion: channel → videos → playlists → comments.
//!
//! Every step logs and continues on failure, keeping whatever a broken
//! listing returned before it stopped. Only an unknown channel ends a run
//! early; the store is known to be reachable once the context has connected.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{VideoPlatform, MAX_COMMENT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::collector::{self, DEFAULT_MAX_UPLOAD_PAGES};
use crate::mapper;
use crate::models::{Channel, ChannelStatus, Comment, Playlist, Video};
use crate::repository::{DbContext, DbError};

/// Tunables for one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestOptions {
    /// Top-level threads requested per comment page (platform max 100).
    pub comment_page_size: u32,
    /// Comment pages per video; 0 follows every cursor.
    pub comment_pages: usize,
    /// Playlist pages per channel; 0 follows every cursor.
    pub playlist_pages: usize,
    /// Upload-playlist pages before the listing is treated as runaway.
    pub max_upload_pages: usize,
    /// Video IDs per detail lookup (platform max 50).
    pub video_batch_size: usize,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            comment_page_size: MAX_COMMENT_PAGE_SIZE,
            comment_pages: 1,
            playlist_pages: 1,
            max_upload_pages: DEFAULT_MAX_UPLOAD_PAGES,
            video_batch_size: MAX_PAGE_SIZE,
        }
    }
}

/// Per-table write outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    /// Rows written by this run.
    pub inserted: usize,
    /// Rows skipped because the ID was already stored.
    pub existing: usize,
    /// Records that could not be mapped or written.
    pub failed: usize,
}

impl TableStats {
    fn record(&mut self, outcome: &Result<bool, DbError>) {
        match outcome {
            Ok(true) => self.inserted += 1,
            Ok(false) => self.existing += 1,
            Err(_) => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HarvestStats {
    pub videos: TableStats,
    pub playlists: TableStats,
    pub comments: TableStats,
    /// Platform calls that failed and were skipped.
    pub failed_requests: usize,
}

/// Everything one ingestion run fetched, whether or not it was new to the store.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestReport {
    pub channel_id: String,
    /// Absent when the channel lookup itself failed.
    pub channel: Option<Channel>,
    pub channel_status: ChannelStatus,
    pub videos: Vec<Video>,
    pub playlists: Vec<Playlist>,
    pub comments: Vec<Comment>,
    pub stats: HarvestStats,
}

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("channel {0} not found")]
    ChannelNotFound(String),
}

/// Runs ingestions against one platform client and one store.
pub struct Harvester {
    api: Arc<dyn VideoPlatform>,
    db: DbContext,
    options: HarvestOptions,
}

impl Harvester {
    pub fn new(api: Arc<dyn VideoPlatform>, db: DbContext, options: HarvestOptions) -> Self {
        Self { api, db, options }
    }

    /// Ingest one channel.
    pub async fn ingest(&self, channel_id: &str) -> Result<HarvestReport, HarvestError> {
        info!("Ingesting channel {}", channel_id);
        let mut stats = HarvestStats::default();

        let (channel, channel_status) = self.ingest_channel(channel_id, &mut stats).await?;

        let video_ids = self
            .collect_video_ids(channel_id, channel.as_ref(), &mut stats)
            .await;
        let videos = self.ingest_videos(&video_ids, &mut stats).await;

        let (owner_id, owner_name) = match &channel {
            Some(c) => (c.id.clone(), c.name.clone()),
            None => (
                channel_id.to_string(),
                videos
                    .first()
                    .map(|v| v.channel_name.clone())
                    .unwrap_or_default(),
            ),
        };
        let playlists = self
            .ingest_playlists(&owner_id, &owner_name, &mut stats)
            .await;
        let comments = self.ingest_comments(&video_ids, &mut stats).await;

        info!(
            "Channel {}: {} ({} videos, {} playlists, {} comments)",
            channel_id,
            channel_status,
            videos.len(),
            playlists.len(),
            comments.len()
        );

        Ok(HarvestReport {
            channel_id: channel_id.to_string(),
            channel,
            channel_status,
            videos,
            playlists,
            comments,
            stats,
        })
    }

    async fn ingest_channel(
        &self,
        channel_id: &str,
        stats: &mut HarvestStats,
    ) -> Result<(Option<Channel>, ChannelStatus), HarvestError> {
        let resources = match self.api.channels(channel_id).await {
            Ok(resources) => resources,
            Err(e) => {
                warn!("Failed to fetch channel {}: {}", channel_id, e);
                stats.failed_requests += 1;
                return Ok((None, ChannelStatus::Failed));
            }
        };

        let resource = resources
            .first()
            .ok_or_else(|| HarvestError::ChannelNotFound(channel_id.to_string()))?;
        let channel = mapper::map_channel(resource);

        let status = match self.db.channels().insert_or_ignore(&channel).await {
            Ok(true) => ChannelStatus::Inserted,
            Ok(false) => {
                info!("Channel {} already exists", channel_id);
                ChannelStatus::AlreadyExists
            }
            Err(e) => {
                warn!("Failed to store channel {}: {}", channel_id, e);
                ChannelStatus::Failed
            }
        };

        Ok((Some(channel), status))
    }

    async fn collect_video_ids(
        &self,
        channel_id: &str,
        channel: Option<&Channel>,
        stats: &mut HarvestStats,
    ) -> Vec<String> {
        let known_uploads = channel.and_then(|c| c.uploads_playlist_id.as_deref());
        match collector::collect_upload_ids(
            self.api.as_ref(),
            channel_id,
            known_uploads,
            self.options.max_upload_pages,
        )
        .await
        {
            Ok(paged) => {
                if let Some(e) = paged.error {
                    warn!(
                        "Uploads of {} stopped after {} page(s), keeping {} video id(s): {}",
                        channel_id,
                        paged.pages,
                        paged.items.len(),
                        e
                    );
                    stats.failed_requests += 1;
                }
                paged.items
            }
            Err(e) => {
                warn!("Failed to enumerate uploads of {}: {}", channel_id, e);
                stats.failed_requests += 1;
                Vec::new()
            }
        }
    }

    /// Fetch details in batches and store each video. Result keeps enumeration order.
    async fn ingest_videos(&self, video_ids: &[String], stats: &mut HarvestStats) -> Vec<Video> {
        let batch_size = self.options.video_batch_size.clamp(1, MAX_PAGE_SIZE);
        let repo = self.db.videos();
        let mut videos = Vec::with_capacity(video_ids.len());

        for batch in video_ids.chunks(batch_size) {
            let resources = match self.api.videos(batch).await {
                Ok(resources) => resources,
                Err(e) => {
                    warn!("Failed to fetch {} video(s): {}", batch.len(), e);
                    stats.failed_requests += 1;
                    continue;
                }
            };

            let mut by_id: HashMap<String, _> = resources
                .into_iter()
                .map(|r| (r.id.clone(), r))
                .collect();

            for id in batch {
                let Some(resource) = by_id.remove(id) else {
                    warn!("Video {} was not returned by the platform", id);
                    stats.videos.failed += 1;
                    continue;
                };

                let video = match mapper::map_video(&resource) {
                    Ok(video) => video,
                    Err(e) => {
                        warn!("Skipping video: {}", e);
                        stats.videos.failed += 1;
                        continue;
                    }
                };

                let outcome = repo.insert_or_ignore(&video).await;
                if let Err(e) = &outcome {
                    warn!("Failed to store video {}: {}", id, e);
                }
                stats.videos.record(&outcome);
                videos.push(video);
            }
        }

        debug!("Fetched {} of {} videos", videos.len(), video_ids.len());
        videos
    }

    async fn ingest_playlists(
        &self,
        channel_id: &str,
        channel_name: &str,
        stats: &mut HarvestStats,
    ) -> Vec<Playlist> {
        let api = self.api.as_ref();
        let paged = collector::paginate(self.options.playlist_pages, |token| async move {
            api.playlists(channel_id, token.as_deref()).await
        })
        .await;

        if let Some(e) = &paged.error {
            warn!(
                "Playlists of {} stopped after {} page(s): {}",
                channel_id, paged.pages, e
            );
            stats.failed_requests += 1;
        }
        let resources = paged.items;

        let repo = self.db.playlists();
        let mut playlists = Vec::with_capacity(resources.len());
        for resource in &resources {
            let playlist = mapper::map_playlist(resource, channel_id, channel_name);
            let outcome = repo.insert_or_ignore(&playlist).await;
            if let Err(e) = &outcome {
                warn!("Failed to store playlist {}: {}", playlist.id, e);
            }
            stats.playlists.record(&outcome);
            playlists.push(playlist);
        }
        playlists
    }

    async fn ingest_comments(&self, video_ids: &[String], stats: &mut HarvestStats) -> Vec<Comment> {
        let repo = self.db.comments();
        let api = self.api.as_ref();
        let page_size = self.options.comment_page_size;
        let mut comments = Vec::new();

        for video_id in video_ids {
            let vid = video_id.as_str();
            let paged = collector::paginate(self.options.comment_pages, |token| async move {
                api.comment_threads(vid, page_size, token.as_deref()).await
            })
            .await;

            if let Some(e) = &paged.error {
                warn!(
                    "Comments of video {} stopped after {} page(s): {}",
                    video_id, paged.pages, e
                );
                stats.failed_requests += 1;
            }

            for thread in &paged.items {
                let comment = match mapper::map_comment(thread, video_id) {
                    Ok(comment) => comment,
                    Err(e) => {
                        warn!("Skipping comment: {}", e);
                        stats.comments.failed += 1;
                        continue;
                    }
                };
                let outcome = repo.insert_or_ignore(&comment).await;
                if let Err(e) = &outcome {
                    warn!("Failed to store comment {}: {}", comment.id, e);
                }
                stats.comments.record(&outcome);
                comments.push(comment);
            }
        }
        comments
    }
}
