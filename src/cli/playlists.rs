use chrono::Utc;
use tabled::Table;

use crate::{
    Res, info,
    interaction::Interaction,
    success,
    sync::{PlaylistSynchronizer, SyncReport},
    types::{CachedPlaylist, CachedTrackTableRow, PlaylistTableRow},
    utils, warning,
};

use super::App;

fn playlist_rows(playlists: &[CachedPlaylist]) -> Vec<PlaylistTableRow> {
    playlists
        .iter()
        .map(|p| PlaylistTableRow {
            name: p.name.clone(),
            tracks: p.total,
            collaborative: p.collaborative,
            public: p.public,
            favorite: if p.is_favorite { "★" } else { "" }.to_string(),
            id: p.id.clone(),
        })
        .collect()
}

fn report_sync(report: &SyncReport) {
    success!(
        "Cached {} tracks of {}",
        report.tracks,
        report.playlist.name
    );
    if report.failed_batches > 0 {
        warning!(
            "Audio features unavailable for {} batch(es); tempo and key show N/A",
            report.failed_batches
        );
    }
}

/// Lists cached playlists. Local only.
pub async fn list_playlists(app: &App, favorites: bool) -> Res<()> {
    let cache = app.cache();
    let playlists = if favorites {
        cache.favorite_playlists()?
    } else {
        cache.playlists()?
    };

    if playlists.is_empty() {
        warning!("No playlists cached yet. Run `crate-digger playlists cache` first.");
        return Ok(());
    }

    println!("{}", Table::new(playlist_rows(&playlists)));
    Ok(())
}

/// Caches the metadata of every playlist the user owns.
pub async fn cache_playlists(app: &App) -> Res<()> {
    let session = app.session("playlists-cache").await?;
    let collector = app.collector("Fetching playlists");
    let synchronizer = PlaylistSynchronizer::new(&app.client, app.cache(), &collector);

    let cached = synchronizer.cache_playlists(&session.remote_id).await?;
    collector.finish();

    success!("Cached {} playlists", cached.len());
    Ok(())
}

/// Shows the cached content of one playlist.
pub async fn view_playlist(app: &App, playlist_id: Option<String>) -> Res<()> {
    let playlist_id = utils::require_param("playlist id", playlist_id)?;
    let cache = app.cache();

    let Some(playlist) = cache.find_playlist(&playlist_id)? else {
        warning!("Playlist {} is not cached", playlist_id);
        return Ok(());
    };

    let now = Utc::now();
    let rows: Vec<CachedTrackTableRow> = cache
        .playlist_tracks(&playlist_id)?
        .into_iter()
        .map(|pt| CachedTrackTableRow {
            title: pt.track.name,
            artists: pt.track.artists_string,
            key: utils::optional_or_na(pt.track.key, utils::key_to_string),
            bpm: utils::optional_or_na(pt.track.tempo, |t| format!("{:.0}", t)),
            duration: utils::optional_or_na(pt.track.duration, |ms| {
                utils::seconds_to_minutes(ms / 1000)
            }),
            added: utils::relative_date_string(pt.created_at, now),
        })
        .collect();

    info!("{} ({} tracks)", playlist.name, rows.len());
    if let Some(description) = &playlist.description {
        println!("{}", description);
    }
    println!("{}", Table::new(rows));
    Ok(())
}

/// Reads a playlist from Spotify and replaces its cached content.
pub async fn sync_playlist(app: &App, playlist_id: Option<String>) -> Res<()> {
    let playlist_id = utils::require_param("playlist id", playlist_id)?;
    app.session("playlists-sync").await?;

    let collector = app.collector("Fetching playlist tracks");
    let synchronizer = PlaylistSynchronizer::new(&app.client, app.cache(), &collector);
    let report = synchronizer.collect_and_sync(&playlist_id).await?;
    collector.finish();

    report_sync(&report);
    Ok(())
}

/// Re-syncs every favorite playlist.
pub async fn refresh_favorites(app: &App) -> Res<()> {
    let favorites = app.cache().favorite_playlists()?;
    if favorites.is_empty() {
        warning!("No favorite playlists. Mark one with `crate-digger playlists favorite <id>`.");
        return Ok(());
    }

    let prompt = format!("Refresh {} favorite playlists?", favorites.len());
    if !app.terminal.confirm(&prompt).await? {
        info!("Cancelled");
        return Ok(());
    }

    app.session("playlists-refresh").await?;
    let collector = app.collector("Refreshing favorite playlists");
    let synchronizer = PlaylistSynchronizer::new(&app.client, app.cache(), &collector);
    let reports = synchronizer.refresh_favorites().await?;
    collector.finish();

    for report in &reports {
        report_sync(report);
    }
    Ok(())
}

/// Flips the local favorite flag.
pub async fn toggle_favorite(app: &App, playlist_id: Option<String>) -> Res<()> {
    let playlist_id = utils::require_param("playlist id", playlist_id)?;

    match app.cache().toggle_favorite(&playlist_id)? {
        Some(p) if p.is_favorite => success!("{} marked as favorite", p.name),
        Some(p) => success!("{} is no longer a favorite", p.name),
        None => warning!("Playlist {} is not cached", playlist_id),
    }
    Ok(())
}

/// Unfollows a playlist on Spotify and removes it from the cache.
pub async fn delete_playlist(app: &App, playlist_id: Option<String>) -> Res<()> {
    let playlist_id = utils::require_param("playlist id", playlist_id)?;

    let Some(playlist) = app.cache().find_playlist(&playlist_id)? else {
        warning!("Playlist {} is not cached", playlist_id);
        return Ok(());
    };

    println!("{}", Table::new(playlist_rows(std::slice::from_ref(&playlist))));
    let prompt = format!("Delete playlist '{}'?", playlist.name);
    if !app.terminal.confirm(&prompt).await? {
        info!("Cancelled");
        return Ok(());
    }

    app.session("playlists-delete").await?;
    let collector = app.collector("Deleting playlist");
    let synchronizer = PlaylistSynchronizer::new(&app.client, app.cache(), &collector);
    synchronizer.delete_playlist(&playlist_id).await?;
    collector.finish();

    success!("Deleted {}", playlist.name);
    Ok(())
}
