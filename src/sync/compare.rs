//! Finds saved tracks that a playlist does not contain yet.

use std::collections::HashSet;

use crate::{
    interaction::Interaction,
    spotify::{CatalogApi, CatalogError},
    types::TrackEntry,
};

use super::{
    monthly::{BuildError, add_in_batches},
    paginate::{Collector, collect_playlist_tracks, collect_saved_tracks},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub playlist_tracks: usize,
    pub scanned: usize,
    /// Saved tracks absent from the playlist, in library order.
    pub missing: Vec<TrackEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompareOutcome {
    UpToDate,
    Added(usize),
    Cancelled,
}

/// Compares `playlist_id` with up to `max` saved tracks starting at `offset`.
pub async fn compare_with_library<C>(
    api: &C,
    collector: &Collector,
    playlist_id: &str,
    offset: u32,
    max: usize,
) -> Result<Comparison, CatalogError>
where
    C: CatalogApi + ?Sized,
{
    let in_playlist = collect_playlist_tracks(api, collector, playlist_id).await?;
    let known: HashSet<&str> = in_playlist.iter().map(|t| t.id.as_str()).collect();

    let mut saved = collect_saved_tracks(api, collector, offset, max).await?;
    saved.truncate(max);
    let scanned = saved.len();

    let mut seen = HashSet::new();
    let missing = saved
        .into_iter()
        .filter(|t| !known.contains(t.id.as_str()) && seen.insert(t.id.clone()))
        .collect();

    Ok(Comparison {
        playlist_tracks: in_playlist.len(),
        scanned,
        missing,
    })
}

/// Shows the missing tracks and, once confirmed, appends them.
pub async fn fill_from_library<C>(
    api: &C,
    collector: &Collector,
    interaction: &dyn Interaction,
    playlist_id: &str,
    offset: u32,
    max: usize,
) -> Result<CompareOutcome, BuildError>
where
    C: CatalogApi + ?Sized,
{
    let comparison = compare_with_library(api, collector, playlist_id, offset, max).await?;
    collector.finish();

    if comparison.missing.is_empty() {
        interaction.display_message(&format!(
            "All {} scanned Liked Songs are already in the playlist",
            comparison.scanned
        ));
        return Ok(CompareOutcome::UpToDate);
    }

    interaction.display_tracks("Liked Songs missing from the playlist", &comparison.missing);
    let prompt = format!("Add {} tracks to the playlist?", comparison.missing.len());
    if !interaction.confirm(&prompt).await? {
        return Ok(CompareOutcome::Cancelled);
    }

    let uris: Vec<String> = comparison.missing.iter().map(|t| t.uri.clone()).collect();
    let added = add_in_batches(api, playlist_id, &uris, collector.delay())
        .await
        .map_err(|e| BuildError::PartialAdd {
            playlist_url: format!("https://open.spotify.com/playlist/{}", playlist_id),
            added: e.added,
            total: uris.len(),
            source: e.source,
        })?;

    Ok(CompareOutcome::Added(added))
}
