use tabled::Table;

use crate::{
    Res,
    browse::{self, TrackAnalysis},
    info,
    spotify::CatalogApi,
    success,
    sync::{AddOutcome, PlaylistSynchronizer},
    types::{MetricRow, Track, TrackSummaryRow},
    utils,
};

use super::App;

/// Shows a track with its audio features, its audio analysis and the
/// tracks recommended from it. Parts Spotify will not serve print as "N/A".
pub async fn analyze_track(app: &App, track_id: Option<String>) -> Res<()> {
    let track_id = utils::require_param("track id", track_id)?;
    app.session("track-analyze").await?;

    let TrackAnalysis {
        track,
        features,
        analysis,
        recommendations,
    } = browse::analyze_track(&app.client, &track_id).await?;

    info!("{} by {}", track.name, track.artists_string());
    info!("Album: {}", track.album.name);
    info!(
        "Key: {}",
        utils::optional_or_na(features.as_ref().map(|f| f.key), utils::key_to_string)
    );
    info!(
        "BPM: {}",
        utils::optional_or_na(features.as_ref().map(|f| f.tempo), |t| format!("{:.0}", t))
    );
    info!(
        "Time signature: {}",
        utils::optional_or_na(features.as_ref().and_then(|f| f.time_signature), |t| {
            format!("{}/4", t)
        })
    );
    info!(
        "Duration: {}",
        utils::seconds_to_minutes(track.duration_ms / 1000)
    );

    println!();
    info!("Audio analysis");
    match analysis {
        Some(summary) => {
            let rows: Vec<MetricRow> = summary
                .metrics()
                .into_iter()
                .map(|(metric, value)| MetricRow {
                    metric: metric.to_string(),
                    value: format!("{:.3}", value),
                })
                .collect();
            println!("{}", Table::new(rows));
        }
        None => info!("N/A"),
    }

    println!();
    info!("Recommended tracks");
    match recommendations {
        Some(tracks) if !tracks.is_empty() => {
            println!("{}", Table::new(summary_rows(&tracks)))
        }
        _ => info!("N/A"),
    }
    Ok(())
}

pub(super) fn summary_rows(tracks: &[Track]) -> Vec<TrackSummaryRow> {
    tracks
        .iter()
        .map(|t| TrackSummaryRow {
            name: t.name.clone(),
            artists: t.artists_string(),
            uri: t.uri.clone(),
        })
        .collect()
}

/// Adds a track to each of `playlist_ids` unless it is already there.
pub async fn add_track(app: &App, track_id: Option<String>, playlist_ids: Vec<String>) -> Res<()> {
    let track_id = utils::require_param("track id", track_id)?;
    if playlist_ids.is_empty() {
        return Err(utils::MissingParameter("playlist id").into());
    }
    app.session("track-add").await?;

    let track = app.client.get_track(&track_id).await?;
    let collector = app.collector("Checking playlists");
    let synchronizer = PlaylistSynchronizer::new(&app.client, app.cache(), &collector);
    let outcomes = synchronizer.add_track(&track, &playlist_ids).await?;
    collector.finish();

    for outcome in outcomes {
        match outcome {
            AddOutcome::Added { playlist_id } => {
                success!("Added {} to {}", track.name, playlist_id)
            }
            AddOutcome::AlreadyPresent { playlist_id } => {
                info!("{} is already in {}", track.name, playlist_id)
            }
        }
    }
    Ok(())
}
