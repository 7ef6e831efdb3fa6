//! Builds "Liked - <Month> <Year>" playlists out of the saved tracks of one
//! calendar month.

use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::debug;

use crate::{
    interaction::{Interaction, InteractionError},
    spotify::{CatalogApi, CatalogError, MAX_BATCH_SIZE},
    types::{CreatePlaylistRequest, TrackEntry},
    utils::YearMonth,
};

use super::paginate::{Collector, collect_tracks_for_month};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Interaction(#[from] InteractionError),
    #[error(
        "Added {added} of {total} tracks to {playlist_url} before a batch failed: {source}. \
         The playlist was kept with the tracks added so far."
    )]
    PartialAdd {
        playlist_url: String,
        added: usize,
        total: usize,
        #[source]
        source: CatalogError,
    },
}

/// A batch add that stopped part way.
#[derive(Error, Debug)]
#[error("Adding tracks stopped after {added}: {source}")]
pub struct BatchAddError {
    pub added: usize,
    #[source]
    pub source: CatalogError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Created {
        playlist_id: String,
        name: String,
        url: String,
        tracks: usize,
    },
    NoTracks,
    Cancelled,
}

pub fn playlist_name(month: YearMonth) -> String {
    format!("Liked - {}", month.label())
}

/// Adds `uris` in order, [`MAX_BATCH_SIZE`] at a time.
///
/// Stops at the first failing batch. Batches already added stay in the
/// playlist; the error tells how many tracks that was.
pub async fn add_in_batches<C>(
    api: &C,
    playlist_id: &str,
    uris: &[String],
    delay: Duration,
) -> Result<usize, BatchAddError>
where
    C: CatalogApi + ?Sized,
{
    let mut added = 0;

    for (n, batch) in uris.chunks(MAX_BATCH_SIZE).enumerate() {
        if n > 0 && !delay.is_zero() {
            sleep(delay).await;
        }

        api.add_tracks_to_playlist(playlist_id, batch)
            .await
            .map_err(|source| BatchAddError { added, source })?;

        added += batch.len();
        debug!(playlist = playlist_id, added, total = uris.len(), "batch added");
    }

    Ok(added)
}

pub struct MonthlyPlaylistBuilder<'a, C: CatalogApi + ?Sized> {
    api: &'a C,
    collector: &'a Collector,
    interaction: &'a dyn Interaction,
}

impl<'a, C: CatalogApi + ?Sized> MonthlyPlaylistBuilder<'a, C> {
    pub fn new(api: &'a C, collector: &'a Collector, interaction: &'a dyn Interaction) -> Self {
        MonthlyPlaylistBuilder {
            api,
            collector,
            interaction,
        }
    }

    /// Saved tracks of `month`, newest first.
    pub async fn tracks(&self, month: YearMonth) -> Result<Vec<TrackEntry>, CatalogError> {
        collect_tracks_for_month(self.api, self.collector, month).await
    }

    /// Collects the month, asks for confirmation, then creates a private
    /// playlist owned by `user_id` and fills it.
    pub async fn build(&self, user_id: &str, month: YearMonth) -> Result<BuildOutcome, BuildError> {
        let tracks = self.tracks(month).await?;
        self.collector.finish();

        if tracks.is_empty() {
            self.interaction
                .display_message(&format!("No tracks saved in {}", month.label()));
            return Ok(BuildOutcome::NoTracks);
        }

        let name = playlist_name(month);
        self.interaction
            .display_tracks(&format!("Tracks saved in {}", month.label()), &tracks);

        let prompt = format!("Create playlist '{}' with {} tracks?", name, tracks.len());
        if !self.interaction.confirm(&prompt).await? {
            return Ok(BuildOutcome::Cancelled);
        }

        let request = CreatePlaylistRequest {
            name: name.clone(),
            description: format!("Tracks liked in {}", month.label()),
            public: false,
            collaborative: false,
        };
        let created = self.api.create_playlist(user_id, &request).await?;
        let url = created.public_url();

        let uris: Vec<String> = tracks.iter().map(|t| t.uri.clone()).collect();
        add_in_batches(self.api, &created.id, &uris, self.collector.delay())
            .await
            .map_err(|e| BuildError::PartialAdd {
                playlist_url: url.clone(),
                added: e.added,
                total: uris.len(),
                source: e.source,
            })?;

        self.interaction.display_link(&name, &url);

        Ok(BuildOutcome::Created {
            playlist_id: created.id,
            name,
            url,
            tracks: uris.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playlist_name_uses_month_label() {
        let month = YearMonth::new(2024, 3).unwrap();
        assert_eq!(playlist_name(month), "Liked - March 2024");
    }
}
