//! # Spotify Integration Module
//!
//! Typed access to the subset of the Spotify Web API that crate-digger uses.
//! Every operation is a single HTTP call: nothing in here pages, retries or
//! sleeps. Pagination and rate-limit pacing live in [`crate::sync::paginate`].
//!
//! ## Architecture
//!
//! ```text
//! Session / Sync / CLI
//!          ↓
//!     CatalogApi (trait)
//!          ↓
//!     SpotifyClient (reqwest)
//!          ↓
//!   Spotify Web API + Accounts service
//! ```
//!
//! The [`CatalogApi`] trait is the seam the rest of the crate is written
//! against, so the session manager and the synchronizer can be driven by an
//! in-memory catalog in tests.
//!
//! ## Submodules
//!
//! - [`auth`] - authorization-code exchange and token refresh against the
//!   accounts service
//! - [`artist`] - artist cards, artist top tracks and related artists
//! - [`library`] - profile, saved tracks, top items, single tracks, audio
//!   features, audio analysis and recommendations
//! - [`playlist`] - playlist reads and mutations
//!
//! ## Errors
//!
//! Any non-success status becomes [`CatalogError::Api`] carrying the status
//! code and the message Spotify put in the error body. Transport failures are
//! [`CatalogError::Http`]. [`CatalogError::status`] exposes the status code
//! either way, which is how optional views tell "not available to this
//! application" apart from a real failure.

pub mod artist;
pub mod auth;
pub mod library;
pub mod playlist;

use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    config::Config,
    types::{
        ApiErrorBody, Artist, AudioAnalysis, AudioFeatures, CreatePlaylistRequest,
        CreatePlaylistResponse, OAuthErrorBody, Paging, Playlist, PlaylistItem, SavedTrack,
        TimeRange, TokenResponse, Track, UserProfile,
    },
};

/// Largest page the paging endpoints accept.
pub const MAX_PAGE_LIMIT: u32 = 50;

/// Largest id list accepted by the audio-features endpoint, and the largest
/// uri list accepted when adding items to a playlist.
pub const MAX_BATCH_SIZE: usize = 100;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Spotify API responded with {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Spotify request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CatalogError {
    /// HTTP status of the failed call, if the call got as far as a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Api { status, .. } => Some(*status),
            CatalogError::Http(e) => e.status().map(|s| s.as_u16()),
            CatalogError::InvalidRequest(_) => None,
        }
    }
}

/// The remote catalog operations used by crate-digger.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Sets (or clears) the bearer token used by every user-scoped call.
    fn set_access_token(&self, token: Option<String>);

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, CatalogError>;

    async fn refresh_access_token(&self, refresh_token: &str)
    -> Result<TokenResponse, CatalogError>;

    async fn get_profile(&self) -> Result<UserProfile, CatalogError>;

    async fn get_saved_tracks(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Paging<SavedTrack>, CatalogError>;

    async fn get_track(&self, id: &str) -> Result<Track, CatalogError>;

    /// At most [`MAX_BATCH_SIZE`] ids; the result is aligned with `ids`.
    async fn get_audio_features(
        &self,
        ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, CatalogError>;

    async fn get_audio_analysis(&self, id: &str) -> Result<AudioAnalysis, CatalogError>;

    async fn get_recommendations(
        &self,
        seed_track: &str,
        limit: u32,
    ) -> Result<Vec<Track>, CatalogError>;

    async fn get_top_tracks(
        &self,
        range: TimeRange,
        limit: u32,
    ) -> Result<Paging<Track>, CatalogError>;

    async fn get_top_artists(
        &self,
        range: TimeRange,
        limit: u32,
    ) -> Result<Paging<Artist>, CatalogError>;

    async fn get_artist(&self, id: &str) -> Result<Artist, CatalogError>;

    async fn get_artist_top_tracks(
        &self,
        id: &str,
        market: &str,
    ) -> Result<Vec<Track>, CatalogError>;

    async fn get_related_artists(&self, id: &str) -> Result<Vec<Artist>, CatalogError>;

    async fn get_playlist(&self, id: &str) -> Result<Playlist, CatalogError>;

    async fn get_playlist_tracks(
        &self,
        id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Paging<PlaylistItem>, CatalogError>;

    async fn get_user_playlists(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Paging<Playlist>, CatalogError>;

    async fn create_playlist(
        &self,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<CreatePlaylistResponse, CatalogError>;

    /// At most [`MAX_BATCH_SIZE`] uris. Returns the new snapshot id.
    async fn add_tracks_to_playlist(
        &self,
        id: &str,
        uris: &[String],
    ) -> Result<String, CatalogError>;

    async fn unfollow_playlist(&self, id: &str) -> Result<(), CatalogError>;
}

/// reqwest-backed [`CatalogApi`].
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    access_token: RwLock<Option<String>>,
}

impl SpotifyClient {
    pub fn new(config: &Config) -> Self {
        SpotifyClient {
            http: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            access_token: RwLock::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn bearer(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .access_token
            .read()
            .map(|t| t.clone())
            .unwrap_or_default();
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, CatalogError> {
        let response = self.bearer(request).send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(CatalogError::Api {
            status,
            message: error_message(&body),
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, CatalogError> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Pulls the human readable message out of a Spotify error body. The Web API
/// and the accounts service use different shapes.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(api) = serde_json::from_str::<ApiErrorBody>(body) {
        return api.error.message;
    }
    if let Ok(oauth) = serde_json::from_str::<OAuthErrorBody>(body) {
        return oauth.error_description.unwrap_or(oauth.error);
    }
    body.trim().to_string()
}

#[async_trait]
impl CatalogApi for SpotifyClient {
    fn set_access_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.access_token.write() {
            *guard = token;
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, CatalogError> {
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.redirect_uri),
        ])
        .await
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, CatalogError> {
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn get_profile(&self) -> Result<UserProfile, CatalogError> {
        self.me().await
    }

    async fn get_saved_tracks(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Paging<SavedTrack>, CatalogError> {
        self.saved_tracks(limit, offset).await
    }

    async fn get_track(&self, id: &str) -> Result<Track, CatalogError> {
        self.track(id).await
    }

    async fn get_audio_features(
        &self,
        ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, CatalogError> {
        self.audio_features(ids).await
    }

    async fn get_audio_analysis(&self, id: &str) -> Result<AudioAnalysis, CatalogError> {
        self.audio_analysis(id).await
    }

    async fn get_recommendations(
        &self,
        seed_track: &str,
        limit: u32,
    ) -> Result<Vec<Track>, CatalogError> {
        self.recommendations(seed_track, limit).await
    }

    async fn get_top_tracks(
        &self,
        range: TimeRange,
        limit: u32,
    ) -> Result<Paging<Track>, CatalogError> {
        self.top_tracks(range, limit).await
    }

    async fn get_top_artists(
        &self,
        range: TimeRange,
        limit: u32,
    ) -> Result<Paging<Artist>, CatalogError> {
        self.top_artists(range, limit).await
    }

    async fn get_artist(&self, id: &str) -> Result<Artist, CatalogError> {
        self.artist(id).await
    }

    async fn get_artist_top_tracks(
        &self,
        id: &str,
        market: &str,
    ) -> Result<Vec<Track>, CatalogError> {
        self.artist_top_tracks(id, market).await
    }

    async fn get_related_artists(&self, id: &str) -> Result<Vec<Artist>, CatalogError> {
        self.related_artists(id).await
    }

    async fn get_playlist(&self, id: &str) -> Result<Playlist, CatalogError> {
        self.playlist(id).await
    }

    async fn get_playlist_tracks(
        &self,
        id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Paging<PlaylistItem>, CatalogError> {
        self.playlist_items(id, limit, offset).await
    }

    async fn get_user_playlists(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Paging<Playlist>, CatalogError> {
        self.my_playlists(limit, offset).await
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<CreatePlaylistResponse, CatalogError> {
        self.create(user_id, request).await
    }

    async fn add_tracks_to_playlist(
        &self,
        id: &str,
        uris: &[String],
    ) -> Result<String, CatalogError> {
        self.add_tracks(id, uris).await
    }

    async fn unfollow_playlist(&self, id: &str) -> Result<(), CatalogError> {
        self.unfollow(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_reads_web_api_body() {
        let body = r#"{"error":{"status":401,"message":"The access token expired"}}"#;
        assert_eq!(error_message(body), "The access token expired");
    }

    #[test]
    fn error_message_reads_accounts_body() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid authorization code"}"#;
        assert_eq!(error_message(body), "Invalid authorization code");

        let bare = r#"{"error":"invalid_client"}"#;
        assert_eq!(error_message(bare), "invalid_client");
    }

    #[test]
    fn error_message_falls_back_to_text() {
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn status_is_only_known_for_api_errors() {
        let api = CatalogError::Api {
            status: 404,
            message: "Not found".to_string(),
        };
        assert_eq!(api.status(), Some(404));
        assert_eq!(CatalogError::InvalidRequest("too many".to_string()).status(), None);
    }
}
