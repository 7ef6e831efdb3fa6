//! Read-only views over the remote catalog: track analysis, artist overview
//! and the library dashboard.
//!
//! Each view fetches its parts concurrently. Parts that Spotify may refuse
//! to this application (audio features, audio analysis, recommendations,
//! related artists) are optional: a 403 or 404 leaves them `None`, and any
//! other failure fails the whole view.

use tracing::debug;

use crate::{
    spotify::{CatalogApi, CatalogError, MAX_PAGE_LIMIT},
    types::{
        AnalysisSummary, Artist, AudioFeatures, RecentLike, TimeRange, Track, TrackEntry,
        UserProfile,
    },
};

/// Recommendations requested for one seed track.
pub const RECOMMENDATION_LIMIT: u32 = 20;

/// Rows kept from an artist's top tracks and from related artists.
pub const ARTIST_LIST_LIMIT: usize = 5;

/// Market the artist top tracks are ranked in.
pub const DEFAULT_MARKET: &str = "US";

/// Maps "not available to this application" to `None`.
pub fn unavailable_as_none<T>(result: Result<T, CatalogError>) -> Result<Option<T>, CatalogError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if matches!(e.status(), Some(403 | 404)) => {
            debug!("Treating as unavailable: {}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[derive(Debug, Clone)]
pub struct TrackAnalysis {
    pub track: Track,
    pub features: Option<AudioFeatures>,
    pub analysis: Option<AnalysisSummary>,
    pub recommendations: Option<Vec<Track>>,
}

/// Fetches a track together with its features, analysis and
/// recommendations seeded by it.
///
/// # Errors
///
/// Fails when the track itself cannot be read, or when an optional part
/// fails with anything other than 403/404.
pub async fn analyze_track<C>(api: &C, track_id: &str) -> Result<TrackAnalysis, CatalogError>
where
    C: CatalogApi + ?Sized,
{
    let ids = [track_id.to_string()];
    let (track, features, analysis, recommendations) = tokio::join!(
        api.get_track(track_id),
        api.get_audio_features(&ids),
        api.get_audio_analysis(track_id),
        api.get_recommendations(track_id, RECOMMENDATION_LIMIT)
    );

    Ok(TrackAnalysis {
        track: track?,
        features: unavailable_as_none(features)?.and_then(|f| f.into_iter().flatten().next()),
        analysis: unavailable_as_none(analysis)?.map(|a| a.track),
        recommendations: unavailable_as_none(recommendations)?,
    })
}

#[derive(Debug, Clone)]
pub struct ArtistOverview {
    pub artist: Artist,
    /// At most [`ARTIST_LIST_LIMIT`], most popular first.
    pub top_tracks: Vec<Track>,
    /// At most [`ARTIST_LIST_LIMIT`].
    pub related: Option<Vec<Artist>>,
}

/// Fetches an artist card with its top tracks in `market` and its related
/// artists.
pub async fn artist_overview<C>(
    api: &C,
    artist_id: &str,
    market: &str,
) -> Result<ArtistOverview, CatalogError>
where
    C: CatalogApi + ?Sized,
{
    let (artist, top_tracks, related) = tokio::join!(
        api.get_artist(artist_id),
        api.get_artist_top_tracks(artist_id, market),
        api.get_related_artists(artist_id)
    );

    let mut top_tracks = top_tracks?;
    top_tracks.truncate(ARTIST_LIST_LIMIT);
    let related = unavailable_as_none(related)?.map(|mut artists| {
        artists.truncate(ARTIST_LIST_LIMIT);
        artists
    });

    Ok(ArtistOverview {
        artist: artist?,
        top_tracks,
        related,
    })
}

#[derive(Debug, Clone)]
pub struct LibraryOverview {
    pub profile: UserProfile,
    /// `None` when Spotify has no listening history for the range yet.
    pub top_track: Option<Track>,
    pub top_artist: Option<Artist>,
    /// The most recent likes, newest first.
    pub recent: Vec<TrackEntry>,
}

impl LibraryOverview {
    pub fn followers(&self) -> Option<u64> {
        self.profile.followers.as_ref().map(|f| f.total)
    }
}

/// Fetches the dashboard: top track and top artist over `range`, the
/// profile and the last [`MAX_PAGE_LIMIT`] likes.
pub async fn library_overview<C>(api: &C, range: TimeRange) -> Result<LibraryOverview, CatalogError>
where
    C: CatalogApi + ?Sized,
{
    let (top_artists, top_tracks, profile, saved) = tokio::join!(
        api.get_top_artists(range, 1),
        api.get_top_tracks(range, 1),
        api.get_profile(),
        api.get_saved_tracks(MAX_PAGE_LIMIT, 0)
    );

    Ok(LibraryOverview {
        profile: profile?,
        top_track: top_tracks?.items.into_iter().next(),
        top_artist: top_artists?.items.into_iter().next(),
        recent: saved?
            .items
            .into_iter()
            .filter_map(TrackEntry::from_saved)
            .collect(),
    })
}

pub fn recent_likes(entries: &[TrackEntry]) -> Vec<RecentLike> {
    entries
        .iter()
        .map(|e| RecentLike {
            name: e.name.clone(),
            artists: e.artists_string(),
            image_url: e.image_url.clone(),
        })
        .collect()
}

/// The recent likes as a compact JSON array of `{name, artists, imageUrl}`.
pub fn recent_likes_json(entries: &[TrackEntry]) -> serde_json::Result<String> {
    serde_json::to_string(&recent_likes(entries))
}
