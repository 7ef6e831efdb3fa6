use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

impl Token {
    /// Seconds before the nominal expiry at which the token is treated as stale.
    pub const EXPIRY_MARGIN: u64 = 240;

    pub fn from_grant(grant: TokenResponse, previous_refresh: Option<&str>, now: u64) -> Self {
        Token {
            access_token: grant.access_token,
            // refresh grants may omit the refresh token, keep the old one then
            refresh_token: grant
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string))
                .unwrap_or_default(),
            scope: grant.scope.unwrap_or_default(),
            expires_in: grant.expires_in,
            obtained_at: now,
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now + Self::EXPIRY_MARGIN >= self.obtained_at + self.expires_in
    }
}

/// An internal identity and the Spotify account it is linked to.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub internal_id: String,
    pub remote_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub followers: Option<Followers>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Followers {
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub followers: Followers,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistTopTracksResponse {
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelatedArtistsResponse {
    pub artists: Vec<Artist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationsResponse {
    pub tracks: Vec<Track>,
}

/// Period the personal top lists are computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeRange {
    /// About four weeks.
    ShortTerm,
    /// About six months.
    #[default]
    MediumTerm,
    /// Several years.
    LongTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.replace('-', "_").as_str() {
            "short_term" | "short" => Ok(TimeRange::ShortTerm),
            "medium_term" | "medium" => Ok(TimeRange::MediumTerm),
            "long_term" | "long" => Ok(TimeRange::LongTerm),
            other => Err(format!(
                "Unknown time range {}, expected short, medium or long",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub total: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTrack {
    pub added_at: DateTime<Utc>,
    pub track: Track,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// `None` for local files.
    pub id: Option<String>,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub artists: Vec<TrackArtist>,
    pub album: TrackAlbum,
    #[serde(default)]
    pub duration_ms: u64,
}

impl Track {
    pub fn artists_string(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackArtist {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackAlbum {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub collaborative: bool,
    pub owner: PlaylistOwner,
    pub tracks: PlaylistTracksRef,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTracksRef {
    pub total: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistResponse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

impl CreatePlaylistResponse {
    pub fn public_url(&self) -> String {
        self.external_urls
            .spotify
            .clone()
            .unwrap_or_else(|| format!("https://open.spotify.com/playlist/{}", self.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistResponse {
    pub snapshot_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioFeatures {
    pub id: String,
    pub tempo: f64,
    pub key: i32,
    pub duration_ms: u64,
    #[serde(default)]
    pub time_signature: Option<u32>,
}

/// Track-level summary of the audio analysis. Sections, bars and segments
/// are not read.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSummary {
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub loudness: Option<f64>,
    #[serde(default)]
    pub tempo: Option<f64>,
    #[serde(default)]
    pub tempo_confidence: Option<f64>,
    #[serde(default)]
    pub time_signature: Option<f64>,
    #[serde(default)]
    pub time_signature_confidence: Option<f64>,
    #[serde(default)]
    pub key_confidence: Option<f64>,
    #[serde(default)]
    pub mode: Option<f64>,
    #[serde(default)]
    pub mode_confidence: Option<f64>,
    #[serde(default)]
    pub end_of_fade_in: Option<f64>,
    #[serde(default)]
    pub start_of_fade_out: Option<f64>,
}

impl AnalysisSummary {
    /// The values Spotify sent, by field name, in declaration order.
    pub fn metrics(&self) -> Vec<(&'static str, f64)> {
        [
            ("duration", self.duration),
            ("loudness", self.loudness),
            ("tempo", self.tempo),
            ("tempo_confidence", self.tempo_confidence),
            ("time_signature", self.time_signature),
            ("time_signature_confidence", self.time_signature_confidence),
            ("key_confidence", self.key_confidence),
            ("mode", self.mode),
            ("mode_confidence", self.mode_confidence),
            ("end_of_fade_in", self.end_of_fade_in),
            ("start_of_fade_out", self.start_of_fade_out),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioAnalysis {
    pub track: AnalysisSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFeaturesResponse {
    /// Unknown ids come back as `null` entries.
    pub audio_features: Vec<Option<AudioFeatures>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// A track normalized out of a remote response, with the time it was added to
/// the collection it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEntry {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    pub image_url: Option<String>,
    pub uri: String,
    /// Absent for old playlist items Spotify has no date for.
    pub added_at: Option<DateTime<Utc>>,
}

impl TrackEntry {
    pub fn from_track(track: Track, added_at: Option<DateTime<Utc>>) -> Option<Self> {
        let id = track.id?;
        Some(TrackEntry {
            id,
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            album: track.album.name,
            image_url: track.album.images.into_iter().next().map(|i| i.url),
            uri: track.uri,
            added_at,
        })
    }

    pub fn from_saved(saved: SavedTrack) -> Option<Self> {
        Self::from_track(saved.track, Some(saved.added_at))
    }

    pub fn from_playlist_item(item: PlaylistItem) -> Option<Self> {
        Self::from_track(item.track?, item.added_at)
    }

    pub fn artists_string(&self) -> String {
        self.artists.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedPlaylist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub total: u32,
    pub public: bool,
    pub collaborative: bool,
    pub is_favorite: bool,
}

impl From<&Playlist> for CachedPlaylist {
    fn from(p: &Playlist) -> Self {
        CachedPlaylist {
            id: p.id.clone(),
            name: p.name.clone(),
            description: p.description.clone().filter(|d| !d.is_empty()),
            total: p.tracks.total,
            public: p.public.unwrap_or(false),
            collaborative: p.collaborative,
            is_favorite: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedTrack {
    pub id: String,
    pub name: String,
    pub artists_string: String,
    pub album: String,
    pub image_url: Option<String>,
    pub spotify_uri: String,
    pub duration: Option<u64>,
    pub key: Option<i32>,
    pub tempo: Option<f64>,
}

impl CachedTrack {
    pub fn from_entry(entry: &TrackEntry, features: Option<&AudioFeatures>) -> Self {
        CachedTrack {
            id: entry.id.clone(),
            name: entry.name.clone(),
            artists_string: entry.artists_string(),
            album: entry.album.clone(),
            image_url: entry.image_url.clone(),
            spotify_uri: entry.uri.clone(),
            duration: features.map(|f| f.duration_ms),
            key: features.map(|f| f.key),
            tempo: features.map(|f| f.tempo),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistTrack {
    pub track: CachedTrack,
    pub created_at: DateTime<Utc>,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub name: String,
    pub tracks: u32,
    pub collaborative: bool,
    pub public: bool,
    pub favorite: String,
    pub id: String,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    pub added: String,
    pub name: String,
    pub artists: String,
    pub uri: String,
}

#[derive(Tabled)]
pub struct CachedTrackTableRow {
    pub title: String,
    pub artists: String,
    pub key: String,
    pub bpm: String,
    pub duration: String,
    pub added: String,
}

#[derive(Tabled)]
pub struct TrackSummaryRow {
    pub name: String,
    pub artists: String,
    pub uri: String,
}

#[derive(Tabled)]
pub struct ArtistTableRow {
    pub name: String,
    pub popularity: String,
    pub followers: u64,
    pub uri: String,
}

#[derive(Tabled)]
pub struct MetricRow {
    pub metric: String,
    pub value: String,
}

/// One recent like, as printed by `crate-digger library --json`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentLike {
    pub name: String,
    pub artists: String,
    pub image_url: Option<String>,
}
