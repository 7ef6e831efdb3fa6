use crate::{
    Res, info, success,
    sync::{CompareOutcome, compare::fill_from_library},
    utils,
};

use super::App;

/// Adds Liked Songs missing from `playlist_id`, scanning `max` saved tracks
/// from `offset`.
pub async fn compare(app: &App, playlist_id: Option<String>, offset: u32, max: usize) -> Res<()> {
    let playlist_id = utils::require_param("playlist id", playlist_id)?;
    app.session("compare").await?;

    let collector = app.collector("Comparing playlist with Liked Songs");
    let outcome = fill_from_library(
        &app.client,
        &collector,
        &app.terminal,
        &playlist_id,
        offset,
        max,
    )
    .await?;

    match outcome {
        CompareOutcome::Added(count) => success!("Added {} tracks to the playlist", count),
        CompareOutcome::UpToDate => success!("Playlist is up to date"),
        CompareOutcome::Cancelled => info!("Cancelled"),
    }

    Ok(())
}
