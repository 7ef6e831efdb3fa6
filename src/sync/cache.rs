//! Keeps the local playlist cache in step with what was just read remotely.
//!
//! A sync writes in this order: playlist metadata, audio-feature enrichment,
//! (full sync only) removal of the old membership set, tracks, memberships.
//! The writes are sequential and not wrapped in a transaction. Only one sync
//! per playlist may run at a time; the CLI guarantees that by running one
//! command at a time.

use std::{collections::HashMap, time::Duration};

use chrono::Utc;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{
    management::{PlaylistCache, StoreError},
    spotify::{CatalogApi, CatalogError, MAX_BATCH_SIZE},
    types::{AudioFeatures, CachedPlaylist, CachedTrack, Track, TrackEntry},
};

use super::paginate::{Collector, collect_playlist_tracks, collect_playlists};

/// Pause between two playlists during a favorites refresh.
pub const FAVORITE_DELAY: Duration = Duration::from_secs(2);

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Playlist {0} is not cached")]
    UnknownPlaylist(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Replace the whole membership set instead of adding to it.
    pub is_full_sync: bool,
    /// Look up tempo, key and duration for every track.
    pub enrich: bool,
}

impl SyncOptions {
    pub fn full() -> Self {
        SyncOptions {
            is_full_sync: true,
            enrich: true,
        }
    }

    pub fn incremental() -> Self {
        SyncOptions {
            is_full_sync: false,
            enrich: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub playlist: CachedPlaylist,
    pub tracks: usize,
    pub enriched: usize,
    pub failed_batches: usize,
}

/// Result of adding one track to one playlist.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added { playlist_id: String },
    AlreadyPresent { playlist_id: String },
}

pub struct PlaylistSynchronizer<'a, C: CatalogApi + ?Sized> {
    api: &'a C,
    cache: PlaylistCache,
    collector: &'a Collector,
    favorite_delay: Duration,
}

impl<'a, C: CatalogApi + ?Sized> PlaylistSynchronizer<'a, C> {
    pub fn new(api: &'a C, cache: PlaylistCache, collector: &'a Collector) -> Self {
        PlaylistSynchronizer {
            api,
            cache,
            collector,
            favorite_delay: FAVORITE_DELAY,
        }
    }

    pub fn with_favorite_delay(mut self, delay: Duration) -> Self {
        self.favorite_delay = delay;
        self
    }

    pub fn cache(&self) -> &PlaylistCache {
        &self.cache
    }

    /// Writes `tracks` as the content of `playlist_id`.
    ///
    /// With `is_full_sync` the previous membership set is dropped first, so
    /// the cache never mixes two remote snapshots. Otherwise only the given
    /// tracks are added. A failed enrichment batch is logged and leaves the
    /// analysis fields of its tracks empty.
    ///
    /// A track without a remote "added at" time keeps the membership time
    /// already cached for it; only a track new to the playlist is stamped
    /// with the current time.
    pub async fn sync_playlist(
        &self,
        playlist_id: &str,
        tracks: &[TrackEntry],
        options: SyncOptions,
    ) -> Result<SyncReport, SyncError> {
        let remote = self.api.get_playlist(playlist_id).await?;
        self.cache.upsert_playlist(&CachedPlaylist::from(&remote))?;

        let (features, failed_batches) = if options.enrich {
            self.enrich(tracks).await
        } else {
            (HashMap::new(), 0)
        };

        // undated items keep the time of their first sync
        let known = self.cache.membership_times(playlist_id)?;
        let now = Utc::now();

        if options.is_full_sync {
            let removed = self.cache.delete_memberships(playlist_id)?;
            debug!(playlist = playlist_id, removed, "membership cleared");
        }

        for entry in tracks {
            let track = CachedTrack::from_entry(entry, features.get(&entry.id));
            self.cache.upsert_track(&track)?;
        }

        for entry in tracks {
            let created_at = entry
                .added_at
                .or_else(|| known.get(&entry.id).copied())
                .unwrap_or(now);
            self.cache
                .upsert_membership(playlist_id, &entry.id, created_at)?;
        }

        let playlist = self
            .cache
            .find_playlist(playlist_id)?
            .ok_or_else(|| SyncError::UnknownPlaylist(playlist_id.to_string()))?;

        debug!(
            playlist = playlist_id,
            tracks = tracks.len(),
            enriched = features.len(),
            failed_batches,
            "playlist synced"
        );

        Ok(SyncReport {
            playlist,
            tracks: tracks.len(),
            enriched: features.len(),
            failed_batches,
        })
    }

    /// Audio features by track id, and the number of batches that failed.
    async fn enrich(&self, tracks: &[TrackEntry]) -> (HashMap<String, AudioFeatures>, usize) {
        let mut features = HashMap::new();
        let mut failed = 0;

        for (n, batch) in tracks.chunks(MAX_BATCH_SIZE).enumerate() {
            if n > 0 && !self.collector.delay().is_zero() {
                sleep(self.collector.delay()).await;
            }

            let ids: Vec<String> = batch.iter().map(|t| t.id.clone()).collect();
            match self.api.get_audio_features(&ids).await {
                Ok(found) => {
                    for f in found.into_iter().flatten() {
                        features.insert(f.id.clone(), f);
                    }
                }
                Err(e) => {
                    warn!(batch = n, size = ids.len(), error = %e, "audio features unavailable");
                    failed += 1;
                }
            }
        }

        (features, failed)
    }

    /// Reads the whole playlist and replaces its cached content.
    pub async fn collect_and_sync(&self, playlist_id: &str) -> Result<SyncReport, SyncError> {
        let tracks = collect_playlist_tracks(self.api, self.collector, playlist_id).await?;
        self.sync_playlist(playlist_id, &tracks, SyncOptions::full())
            .await
    }

    /// Caches the metadata of every playlist owned by `owner_id`.
    pub async fn cache_playlists(&self, owner_id: &str) -> Result<Vec<CachedPlaylist>, SyncError> {
        let remote = collect_playlists(self.api, self.collector).await?;

        let mut cached = Vec::new();
        for playlist in remote.iter().filter(|p| p.owner.id == owner_id) {
            self.cache.upsert_playlist(&CachedPlaylist::from(playlist))?;
            if let Some(stored) = self.cache.find_playlist(&playlist.id)? {
                cached.push(stored);
            }
        }

        debug!(seen = remote.len(), kept = cached.len(), "playlists cached");
        Ok(cached)
    }

    /// Fully re-syncs every favorite playlist, one after the other.
    pub async fn refresh_favorites(&self) -> Result<Vec<SyncReport>, SyncError> {
        let favorites = self.cache.favorite_playlists()?;
        let mut reports = Vec::with_capacity(favorites.len());

        for (n, playlist) in favorites.iter().enumerate() {
            if n > 0 && !self.favorite_delay.is_zero() {
                sleep(self.favorite_delay).await;
            }
            reports.push(self.collect_and_sync(&playlist.id).await?);
        }

        Ok(reports)
    }

    /// Adds `track` to each playlist that does not hold it yet and records
    /// the new membership without touching the rest of the cached content.
    pub async fn add_track(
        &self,
        track: &Track,
        playlist_ids: &[String],
    ) -> Result<Vec<AddOutcome>, SyncError> {
        let entry = TrackEntry::from_track(track.clone(), Some(Utc::now())).ok_or_else(|| {
            CatalogError::InvalidRequest(format!("{} is a local file", track.uri))
        })?;

        let mut outcomes = Vec::with_capacity(playlist_ids.len());
        for playlist_id in playlist_ids {
            let current = collect_playlist_tracks(self.api, self.collector, playlist_id).await?;
            if current.iter().any(|t| t.id == entry.id) {
                outcomes.push(AddOutcome::AlreadyPresent {
                    playlist_id: playlist_id.clone(),
                });
                continue;
            }

            self.api
                .add_tracks_to_playlist(playlist_id, std::slice::from_ref(&entry.uri))
                .await?;
            self.sync_playlist(
                playlist_id,
                std::slice::from_ref(&entry),
                SyncOptions::incremental(),
            )
            .await?;

            outcomes.push(AddOutcome::Added {
                playlist_id: playlist_id.clone(),
            });
        }

        Ok(outcomes)
    }

    /// Unfollows the playlist remotely and drops it from the cache.
    pub async fn delete_playlist(&self, playlist_id: &str) -> Result<bool, SyncError> {
        self.api.unfollow_playlist(playlist_id).await?;
        Ok(self.cache.delete_playlist(playlist_id)?)
    }
}
