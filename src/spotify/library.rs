use crate::{
    spotify::SpotifyClient,
    types::{
        Artist, AudioAnalysis, AudioFeatures, AudioFeaturesResponse, Paging,
        RecommendationsResponse, SavedTrack, TimeRange, Track, UserProfile,
    },
};

use super::{CatalogError, MAX_BATCH_SIZE};

impl SpotifyClient {
    /// Retrieves the profile of the user the current access token belongs to.
    ///
    /// The session gate uses this call to tell which Spotify account a stored
    /// credential really resolves to.
    ///
    /// # Returns
    ///
    /// - `Ok(UserProfile)` - Spotify user id, display name and follower count
    /// - `Err(CatalogError::Api)` - 401 when the token expired or was revoked
    pub(super) async fn me(&self) -> Result<UserProfile, CatalogError> {
        let request = self.http.get(self.url("/me"));
        self.send_json(request).await
    }

    /// Retrieves one page of the user's Liked Songs.
    ///
    /// Saved tracks come back newest first, ordered by the time they were
    /// liked. That ordering is what lets the month walk stop early.
    ///
    /// # Arguments
    ///
    /// * `limit` - Page size, at most [`super::MAX_PAGE_LIMIT`]
    /// * `offset` - Index of the first saved track to return
    ///
    /// # Returns
    ///
    /// - `Ok(Paging<SavedTrack>)` - The page with `total` and the `next` link
    /// - `Err(CatalogError)` - Network failure or non-success status, e.g. 429
    ///   when the rate limit is hit
    pub(super) async fn saved_tracks(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Paging<SavedTrack>, CatalogError> {
        let request = self
            .http
            .get(self.url("/me/tracks"))
            .query(&[("limit", limit), ("offset", offset)]);
        self.send_json(request).await
    }

    /// Retrieves one track with its album, artists and popularity.
    ///
    /// # Arguments
    ///
    /// * `id` - Spotify track id, not the `spotify:track:` uri
    ///
    /// # Errors
    ///
    /// `CatalogError::Api` with status 400 for a malformed id and 404 for an
    /// unknown one.
    pub(super) async fn track(&self, id: &str) -> Result<Track, CatalogError> {
        let request = self.http.get(self.url(&format!("/tracks/{}", id)));
        self.send_json(request).await
    }

    /// Retrieves tempo, key and duration for several tracks in one call.
    ///
    /// # Arguments
    ///
    /// * `ids` - Track ids, at most [`MAX_BATCH_SIZE`]
    ///
    /// # Returns
    ///
    /// One entry per id, in the same order. Ids Spotify has no features for
    /// come back as `None`. An empty `ids` slice returns an empty list
    /// without a request.
    ///
    /// # Errors
    ///
    /// `CatalogError::InvalidRequest` when more than [`MAX_BATCH_SIZE`] ids
    /// are passed; otherwise whatever the request fails with.
    pub(super) async fn audio_features(
        &self,
        ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, CatalogError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        if ids.len() > MAX_BATCH_SIZE {
            return Err(CatalogError::InvalidRequest(format!(
                "audio features accept at most {} ids, got {}",
                MAX_BATCH_SIZE,
                ids.len()
            )));
        }

        let request = self
            .http
            .get(self.url("/audio-features"))
            .query(&[("ids", ids.join(","))]);
        let response: AudioFeaturesResponse = self.send_json(request).await?;
        Ok(response.audio_features)
    }

    /// Retrieves the track-level audio analysis of one track.
    ///
    /// # Arguments
    ///
    /// * `id` - Spotify track id
    ///
    /// # Errors
    ///
    /// Applications registered after late 2024 get a 403 here; callers treat
    /// that as "not available" rather than a failure.
    pub(super) async fn audio_analysis(&self, id: &str) -> Result<AudioAnalysis, CatalogError> {
        let request = self
            .http
            .get(self.url(&format!("/audio-analysis/{}", id)));
        self.send_json(request).await
    }

    /// Retrieves tracks recommended from a single seed track.
    ///
    /// # Arguments
    ///
    /// * `seed_track` - Spotify track id used as the only seed
    /// * `limit` - Number of recommendations, 1 to 100
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Track>)` - Recommended tracks in Spotify's order
    /// - `Err(CatalogError)` - 403/404 for applications without access to the
    ///   endpoint, or any other failure
    pub(super) async fn recommendations(
        &self,
        seed_track: &str,
        limit: u32,
    ) -> Result<Vec<Track>, CatalogError> {
        let request = self.http.get(self.url("/recommendations")).query(&[
            ("seed_tracks", seed_track.to_string()),
            ("limit", limit.to_string()),
        ]);
        let response: RecommendationsResponse = self.send_json(request).await?;
        Ok(response.tracks)
    }

    /// Retrieves the user's most played tracks.
    ///
    /// # Arguments
    ///
    /// * `range` - Period the ranking is computed over
    /// * `limit` - Page size, at most [`super::MAX_PAGE_LIMIT`]
    ///
    /// # Returns
    ///
    /// The first page of the ranking, best first. Needs the `user-top-read`
    /// scope.
    pub(super) async fn top_tracks(
        &self,
        range: TimeRange,
        limit: u32,
    ) -> Result<Paging<Track>, CatalogError> {
        let request = self.http.get(self.url("/me/top/tracks")).query(&[
            ("time_range", range.as_str().to_string()),
            ("limit", limit.to_string()),
        ]);
        self.send_json(request).await
    }

    /// Retrieves the user's most played artists. Same contract as
    /// [`SpotifyClient::top_tracks`].
    pub(super) async fn top_artists(
        &self,
        range: TimeRange,
        limit: u32,
    ) -> Result<Paging<Artist>, CatalogError> {
        let request = self.http.get(self.url("/me/top/artists")).query(&[
            ("time_range", range.as_str().to_string()),
            ("limit", limit.to_string()),
        ]);
        self.send_json(request).await
    }
}
