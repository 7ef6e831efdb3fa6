use crate::{
    spotify::SpotifyClient,
    types::{
        AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, CreatePlaylistRequest,
        CreatePlaylistResponse, Paging, Playlist, PlaylistItem,
    },
};

use super::{CatalogError, MAX_BATCH_SIZE};

impl SpotifyClient {
    /// Retrieves playlist metadata: name, description, visibility, owner
    /// and track count.
    ///
    /// # Arguments
    ///
    /// * `id` - Spotify playlist id
    ///
    /// # Errors
    ///
    /// `CatalogError::Api` with status 404 when the playlist does not exist
    /// or is not visible to the user.
    pub(super) async fn playlist(&self, id: &str) -> Result<Playlist, CatalogError> {
        let request = self
            .http
            .get(self.url(&format!("/playlists/{}", id)))
            .query(&[("additional_types", "track")]);
        self.send_json(request).await
    }

    /// Retrieves one page of a playlist's items.
    ///
    /// # Arguments
    ///
    /// * `id` - Spotify playlist id
    /// * `limit` - Page size, at most [`super::MAX_PAGE_LIMIT`]
    /// * `offset` - Index of the first item to return
    ///
    /// # Returns
    ///
    /// Items in playlist order. An item's `track` is `None` when the track
    /// was removed from Spotify, and `added_at` is `None` for items old
    /// enough that Spotify kept no date.
    pub(super) async fn playlist_items(
        &self,
        id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Paging<PlaylistItem>, CatalogError> {
        let request = self
            .http
            .get(self.url(&format!("/playlists/{}/tracks", id)))
            .query(&[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("additional_types", "track".to_string()),
            ]);
        self.send_json(request).await
    }

    /// Retrieves one page of the playlists the user owns or follows.
    ///
    /// # Arguments
    ///
    /// * `limit` - Page size, at most [`super::MAX_PAGE_LIMIT`]
    /// * `offset` - Index of the first playlist to return
    pub(super) async fn my_playlists(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Paging<Playlist>, CatalogError> {
        let request = self
            .http
            .get(self.url("/me/playlists"))
            .query(&[("limit", limit), ("offset", offset)]);
        self.send_json(request).await
    }

    /// Creates an empty playlist owned by `user_id`.
    ///
    /// # Arguments
    ///
    /// * `user_id` - Spotify user id; must be the user the token belongs to
    /// * `body` - Name, description and visibility of the new playlist
    ///
    /// # Returns
    ///
    /// - `Ok(CreatePlaylistResponse)` - The new playlist id and its public URL
    /// - `Err(CatalogError::Api)` - 403 when `user_id` is somebody else
    pub(super) async fn create(
        &self,
        user_id: &str,
        body: &CreatePlaylistRequest,
    ) -> Result<CreatePlaylistResponse, CatalogError> {
        let request = self
            .http
            .post(self.url(&format!("/users/{}/playlists", user_id)))
            .json(body);
        self.send_json(request).await
    }

    /// Appends tracks to the end of a playlist.
    ///
    /// # Arguments
    ///
    /// * `id` - Spotify playlist id
    /// * `uris` - Track uris in the order they should appear, at most
    ///   [`MAX_BATCH_SIZE`]
    ///
    /// # Returns
    ///
    /// The playlist's new snapshot id.
    ///
    /// # Errors
    ///
    /// `CatalogError::InvalidRequest` for more than [`MAX_BATCH_SIZE`] uris,
    /// before any request is made.
    pub(super) async fn add_tracks(
        &self,
        id: &str,
        uris: &[String],
    ) -> Result<String, CatalogError> {
        if uris.len() > MAX_BATCH_SIZE {
            return Err(CatalogError::InvalidRequest(format!(
                "at most {} tracks can be added per call, got {}",
                MAX_BATCH_SIZE,
                uris.len()
            )));
        }

        let body = AddTrackToPlaylistRequest {
            uris: uris.to_vec(),
        };
        let request = self
            .http
            .post(self.url(&format!("/playlists/{}/tracks", id)))
            .json(&body);
        let response: AddTrackToPlaylistResponse = self.send_json(request).await?;
        Ok(response.snapshot_id)
    }

    /// Removes a playlist from the user's library.
    ///
    /// Deleting a playlist on Spotify means unfollowing it.
    ///
    /// # Arguments
    ///
    /// * `id` - Spotify playlist id
    ///
    /// # Errors
    ///
    /// Whatever the request fails with; Spotify answers 200 even when the
    /// user was not following the playlist.
    pub(super) async fn unfollow(&self, id: &str) -> Result<(), CatalogError> {
        let request = self
            .http
            .delete(self.url(&format!("/playlists/{}/followers", id)));
        self.send(request).await?;
        Ok(())
    }
}
