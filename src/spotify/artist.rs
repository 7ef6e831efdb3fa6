use crate::{
    spotify::SpotifyClient,
    types::{Artist, ArtistTopTracksResponse, RelatedArtistsResponse, Track},
};

use super::CatalogError;

impl SpotifyClient {
    /// Retrieves an artist with popularity, follower count and genres.
    ///
    /// # Arguments
    ///
    /// * `id` - Spotify artist id
    ///
    /// # Errors
    ///
    /// `CatalogError::Api` with status 404 (or 400 for a malformed id) when
    /// the artist does not exist.
    pub(super) async fn artist(&self, id: &str) -> Result<Artist, CatalogError> {
        let request = self.http.get(self.url(&format!("/artists/{}", id)));
        self.send_json(request).await
    }

    /// Retrieves an artist's top tracks in one market.
    ///
    /// # Arguments
    ///
    /// * `id` - Spotify artist id
    /// * `market` - ISO 3166-1 alpha-2 country code the ranking is taken from
    ///
    /// # Returns
    ///
    /// Up to ten tracks, most popular first.
    pub(super) async fn artist_top_tracks(
        &self,
        id: &str,
        market: &str,
    ) -> Result<Vec<Track>, CatalogError> {
        let request = self
            .http
            .get(self.url(&format!("/artists/{}/top-tracks", id)))
            .query(&[("market", market)]);
        let response: ArtistTopTracksResponse = self.send_json(request).await?;
        Ok(response.tracks)
    }

    /// Retrieves artists Spotify considers similar.
    ///
    /// # Arguments
    ///
    /// * `id` - Spotify artist id
    ///
    /// # Errors
    ///
    /// Applications without access to the endpoint get a 403 or 404.
    pub(super) async fn related_artists(&self, id: &str) -> Result<Vec<Artist>, CatalogError> {
        let request = self
            .http
            .get(self.url(&format!("/artists/{}/related-artists", id)));
        let response: RelatedArtistsResponse = self.send_json(request).await?;
        Ok(response.artists)
    }
}
