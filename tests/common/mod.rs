#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use crate_digger::{
    interaction::{Interaction, InteractionError},
    session::{AuthCallback, Redirect},
    spotify::{CatalogApi, CatalogError},
    types::{
        AnalysisSummary, Artist, AudioAnalysis, AudioFeatures, CreatePlaylistRequest,
        CreatePlaylistResponse, ExternalUrls, Followers, Image, Paging, Playlist, PlaylistItem,
        PlaylistOwner, PlaylistTracksRef, SavedTrack, TimeRange, TokenResponse, Track,
        TrackAlbum, TrackArtist, TrackEntry, UserProfile,
    },
};

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub fn track(id: &str) -> Track {
    Track {
        id: Some(id.to_string()),
        name: format!("Track {}", id),
        uri: format!("spotify:track:{}", id),
        artists: vec![
            TrackArtist {
                id: Some("a1".to_string()),
                name: "Artist One".to_string(),
            },
            TrackArtist {
                id: Some("a2".to_string()),
                name: "Artist Two".to_string(),
            },
        ],
        album: TrackAlbum {
            name: "Album".to_string(),
            images: vec![Image {
                url: format!("https://img.example/{}", id),
            }],
        },
        duration_ms: 200_000,
    }
}

pub fn artist(id: &str) -> Artist {
    Artist {
        id: id.to_string(),
        name: format!("Artist {}", id),
        uri: format!("spotify:artist:{}", id),
        popularity: 61,
        followers: Followers { total: 12_500 },
        genres: vec!["house".to_string()],
    }
}

pub fn saved(id: &str, added_at: DateTime<Utc>) -> SavedTrack {
    SavedTrack {
        added_at,
        track: track(id),
    }
}

/// `count` saved tracks `<prefix>-<n>`, newest first, all within the day
/// of `start`.
pub fn saved_run(prefix: &str, count: usize, start: DateTime<Utc>) -> Vec<SavedTrack> {
    (0..count)
        .map(|n| saved(&format!("{}-{}", prefix, n), start - Duration::minutes(n as i64)))
        .collect()
}

pub fn item(id: &str, added_at: DateTime<Utc>) -> PlaylistItem {
    PlaylistItem {
        added_at: Some(added_at),
        track: Some(track(id)),
    }
}

/// A playlist item Spotify has no "added at" time for.
pub fn undated_item(id: &str) -> PlaylistItem {
    PlaylistItem {
        added_at: None,
        track: Some(track(id)),
    }
}

pub fn entry(id: &str, added_at: DateTime<Utc>) -> TrackEntry {
    TrackEntry::from_track(track(id), Some(added_at)).unwrap()
}

pub fn entries(prefix: &str, count: usize, added_at: DateTime<Utc>) -> Vec<TrackEntry> {
    (0..count)
        .map(|n| entry(&format!("{}-{}", prefix, n), added_at))
        .collect()
}

pub fn playlist(id: &str, owner: &str, total: u32) -> Playlist {
    Playlist {
        id: id.to_string(),
        name: format!("Playlist {}", id),
        description: Some(String::new()),
        public: Some(false),
        collaborative: false,
        owner: PlaylistOwner {
            id: owner.to_string(),
        },
        tracks: PlaylistTracksRef { total },
        external_urls: ExternalUrls::default(),
    }
}

fn api_error(status: u16, message: &str) -> CatalogError {
    CatalogError::Api {
        status,
        message: message.to_string(),
    }
}

fn page<T: Clone>(items: &[T], limit: u32, offset: u32) -> Paging<T> {
    let start = (offset as usize).min(items.len());
    let end = (start + limit as usize).min(items.len());
    Paging {
        items: items[start..end].to_vec(),
        total: items.len() as u32,
        limit,
        offset,
        next: (end < items.len()).then(|| format!("next?offset={}", end)),
    }
}

/// In-memory catalog. Configure the public fields, then inspect the
/// recorded calls.
#[derive(Default)]
pub struct FakeCatalog {
    pub saved: Vec<SavedTrack>,
    pub playlists: Vec<Playlist>,
    pub items: Mutex<HashMap<String, Vec<PlaylistItem>>>,

    /// authorization code -> access token
    pub codes: HashMap<String, String>,
    /// access token -> Spotify user id; other tokens are rejected
    pub profiles: HashMap<String, String>,
    /// refresh token -> new access token
    pub refreshes: HashMap<String, String>,

    pub fail_saved_offset: Option<u32>,
    /// zero-based index of audio-feature calls that fail
    pub fail_feature_calls: HashSet<usize>,
    /// zero-based index of the add call that fails
    pub fail_add_call: Option<usize>,
    /// endpoint name -> status it answers with, e.g. `"analysis" -> 403`
    pub failing: HashMap<&'static str, u16>,

    pub top_tracks: Vec<Track>,
    pub top_artists: Vec<Artist>,
    pub followers: Option<u64>,

    pub token: Mutex<Option<String>>,
    pub saved_offsets: Mutex<Vec<u32>>,
    pub playlist_offsets: Mutex<Vec<u32>>,
    pub feature_calls: Mutex<Vec<Vec<String>>>,
    pub add_calls: Mutex<Vec<(String, Vec<String>)>>,
    pub created: Mutex<Vec<(String, CreatePlaylistRequest)>>,
    pub unfollowed: Mutex<Vec<String>>,
    pub exchanged: Mutex<Vec<String>>,
    pub refreshed: Mutex<Vec<String>>,
    pub top_requests: Mutex<Vec<(TimeRange, u32)>>,
    pub markets: Mutex<Vec<String>>,
    pub recommendation_seeds: Mutex<Vec<(String, u32)>>,
}

impl FakeCatalog {
    pub fn with_items(self, playlist_id: &str, items: Vec<PlaylistItem>) -> Self {
        self.items
            .lock()
            .unwrap()
            .insert(playlist_id.to_string(), items);
        self
    }

    pub fn add_sizes(&self) -> Vec<usize> {
        self.add_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, uris)| uris.len())
            .collect()
    }

    pub fn feature_sizes(&self) -> Vec<usize> {
        self.feature_calls
            .lock()
            .unwrap()
            .iter()
            .map(|ids| ids.len())
            .collect()
    }

    pub fn playlist_len(&self, playlist_id: &str) -> usize {
        self.items
            .lock()
            .unwrap()
            .get(playlist_id)
            .map_or(0, |items| items.len())
    }

    pub fn failing_with(mut self, endpoint: &'static str, status: u16) -> Self {
        self.failing.insert(endpoint, status);
        self
    }

    fn check(&self, endpoint: &str) -> Result<(), CatalogError> {
        match self.failing.get(endpoint) {
            Some(status) => Err(api_error(*status, &format!("{} refused", endpoint))),
            None => Ok(()),
        }
    }

    fn grant(access_token: &str, refresh_token: Option<String>) -> TokenResponse {
        TokenResponse {
            access_token: access_token.to_string(),
            token_type: Some("Bearer".to_string()),
            scope: Some("user-library-read".to_string()),
            expires_in: 3600,
            refresh_token,
        }
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    fn set_access_token(&self, token: Option<String>) {
        *self.token.lock().unwrap() = token;
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, CatalogError> {
        self.exchanged.lock().unwrap().push(code.to_string());
        match self.codes.get(code) {
            Some(access) => Ok(Self::grant(access, Some(format!("refresh-{}", access)))),
            None => Err(api_error(400, "Invalid authorization code")),
        }
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, CatalogError> {
        self.refreshed
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        match self.refreshes.get(refresh_token) {
            // refresh grants usually omit the refresh token
            Some(access) => Ok(Self::grant(access, None)),
            None => Err(api_error(400, "Invalid refresh token")),
        }
    }

    async fn get_profile(&self) -> Result<UserProfile, CatalogError> {
        let token = self.token.lock().unwrap().clone();
        match token.and_then(|t| self.profiles.get(&t).cloned()) {
            Some(id) => Ok(UserProfile {
                id,
                display_name: None,
                email: None,
                followers: self.followers.map(|total| Followers { total }),
            }),
            None => Err(api_error(401, "The access token expired")),
        }
    }

    async fn get_saved_tracks(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Paging<SavedTrack>, CatalogError> {
        self.saved_offsets.lock().unwrap().push(offset);
        if self.fail_saved_offset == Some(offset) {
            return Err(api_error(429, "API rate limit exceeded"));
        }
        Ok(page(&self.saved, limit, offset))
    }

    async fn get_track(&self, id: &str) -> Result<Track, CatalogError> {
        self.check("track")?;
        Ok(track(id))
    }

    async fn get_audio_features(
        &self,
        ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, CatalogError> {
        let call = {
            let mut calls = self.feature_calls.lock().unwrap();
            calls.push(ids.to_vec());
            calls.len() - 1
        };
        self.check("features")?;
        if self.fail_feature_calls.contains(&call) {
            return Err(api_error(503, "Service unavailable"));
        }
        Ok(ids
            .iter()
            .map(|id| {
                Some(AudioFeatures {
                    id: id.clone(),
                    tempo: 124.6,
                    key: 9,
                    duration_ms: 215_000,
                    time_signature: Some(4),
                })
            })
            .collect())
    }

    async fn get_audio_analysis(&self, _id: &str) -> Result<AudioAnalysis, CatalogError> {
        self.check("analysis")?;
        Ok(AudioAnalysis {
            track: AnalysisSummary {
                duration: Some(215.3),
                loudness: Some(-7.25),
                tempo: Some(124.6),
                tempo_confidence: Some(0.81),
                time_signature: Some(4.0),
                ..Default::default()
            },
        })
    }

    async fn get_recommendations(
        &self,
        seed_track: &str,
        limit: u32,
    ) -> Result<Vec<Track>, CatalogError> {
        self.recommendation_seeds
            .lock()
            .unwrap()
            .push((seed_track.to_string(), limit));
        self.check("recommendations")?;
        Ok((0..3).map(|n| track(&format!("rec-{}", n))).collect())
    }

    async fn get_top_tracks(
        &self,
        range: TimeRange,
        limit: u32,
    ) -> Result<Paging<Track>, CatalogError> {
        self.top_requests.lock().unwrap().push((range, limit));
        self.check("top")?;
        Ok(page(&self.top_tracks, limit, 0))
    }

    async fn get_top_artists(
        &self,
        range: TimeRange,
        limit: u32,
    ) -> Result<Paging<Artist>, CatalogError> {
        self.top_requests.lock().unwrap().push((range, limit));
        self.check("top")?;
        Ok(page(&self.top_artists, limit, 0))
    }

    async fn get_artist(&self, id: &str) -> Result<Artist, CatalogError> {
        self.check("artist")?;
        Ok(artist(id))
    }

    /// Eight tracks, more than the overview keeps.
    async fn get_artist_top_tracks(
        &self,
        id: &str,
        market: &str,
    ) -> Result<Vec<Track>, CatalogError> {
        self.markets.lock().unwrap().push(market.to_string());
        self.check("artist_top_tracks")?;
        Ok((0..8).map(|n| track(&format!("{}-top-{}", id, n))).collect())
    }

    /// Seven artists, more than the overview keeps.
    async fn get_related_artists(&self, id: &str) -> Result<Vec<Artist>, CatalogError> {
        self.check("related")?;
        Ok((0..7).map(|n| artist(&format!("{}-rel-{}", id, n))).collect())
    }

    async fn get_playlist(&self, id: &str) -> Result<Playlist, CatalogError> {
        self.playlists
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| api_error(404, "Resource not found"))
    }

    async fn get_playlist_tracks(
        &self,
        id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Paging<PlaylistItem>, CatalogError> {
        self.playlist_offsets.lock().unwrap().push(offset);
        let items = self.items.lock().unwrap();
        let items = items.get(id).cloned().unwrap_or_default();
        Ok(page(&items, limit, offset))
    }

    async fn get_user_playlists(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Paging<Playlist>, CatalogError> {
        Ok(page(&self.playlists, limit, offset))
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<CreatePlaylistResponse, CatalogError> {
        let mut created = self.created.lock().unwrap();
        created.push((user_id.to_string(), request.clone()));
        let id = format!("created-{}", created.len());
        Ok(CreatePlaylistResponse {
            external_urls: ExternalUrls {
                spotify: Some(format!("https://open.spotify.com/playlist/{}", id)),
            },
            id,
            name: request.name.clone(),
        })
    }

    async fn add_tracks_to_playlist(
        &self,
        id: &str,
        uris: &[String],
    ) -> Result<String, CatalogError> {
        let call = {
            let mut calls = self.add_calls.lock().unwrap();
            calls.push((id.to_string(), uris.to_vec()));
            calls.len() - 1
        };
        if self.fail_add_call == Some(call) {
            return Err(api_error(502, "Bad gateway"));
        }

        let mut items = self.items.lock().unwrap();
        let playlist = items.entry(id.to_string()).or_default();
        for uri in uris {
            let track_id = uri.trim_start_matches("spotify:track:");
            playlist.push(item(track_id, Utc::now()));
        }
        Ok(format!("snapshot-{}", call))
    }

    async fn unfollow_playlist(&self, id: &str) -> Result<(), CatalogError> {
        self.unfollowed.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

/// Scripted user: echoes the issued state unless told otherwise and answers
/// every confirmation with `answer`.
pub struct FakeInteraction {
    pub code: Option<String>,
    pub error: Option<String>,
    pub state_override: Option<String>,
    pub answer: bool,

    pub redirects: Mutex<Vec<Redirect>>,
    pub prompts: Mutex<Vec<String>>,
    pub shown: Mutex<Vec<(String, usize)>>,
    pub links: Mutex<Vec<String>>,
    pub messages: Mutex<Vec<String>>,
}

impl Default for FakeInteraction {
    fn default() -> Self {
        FakeInteraction {
            code: None,
            error: None,
            state_override: None,
            answer: true,
            redirects: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            shown: Mutex::new(Vec::new()),
            links: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
        }
    }
}

impl FakeInteraction {
    pub fn with_code(code: &str) -> Self {
        FakeInteraction {
            code: Some(code.to_string()),
            ..Default::default()
        }
    }

    pub fn answering(answer: bool) -> Self {
        FakeInteraction {
            answer,
            ..Default::default()
        }
    }

    pub fn redirect_count(&self) -> usize {
        self.redirects.lock().unwrap().len()
    }
}

#[async_trait]
impl Interaction for FakeInteraction {
    async fn redirect(&self, redirect: &Redirect) -> Result<AuthCallback, InteractionError> {
        self.redirects.lock().unwrap().push(redirect.clone());
        Ok(AuthCallback {
            code: self.code.clone(),
            state: Some(
                self.state_override
                    .clone()
                    .unwrap_or_else(|| redirect.state.clone()),
            ),
            error: self.error.clone(),
        })
    }

    async fn confirm(&self, prompt: &str) -> Result<bool, InteractionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answer)
    }

    fn display_tracks(&self, title: &str, tracks: &[TrackEntry]) {
        self.shown
            .lock()
            .unwrap()
            .push((title.to_string(), tracks.len()));
    }

    fn display_link(&self, _label: &str, url: &str) {
        self.links.lock().unwrap().push(url.to_string());
    }

    fn display_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
