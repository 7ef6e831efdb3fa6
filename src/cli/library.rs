use chrono::Utc;
use tabled::Table;

use crate::{
    Res,
    browse::{self, LibraryOverview},
    info,
    types::{TimeRange, TrackTableRow},
    utils,
};

use super::App;

/// Shows the library dashboard: top track, top artist, follower count and
/// the most recent likes. With `json` only the recent likes are printed, as
/// a JSON array.
pub async fn library(app: &App, range: TimeRange, json: bool) -> Res<()> {
    app.session("library").await?;

    let overview = browse::library_overview(&app.client, range).await?;
    if json {
        println!("{}", browse::recent_likes_json(&overview.recent)?);
        return Ok(());
    }

    let LibraryOverview {
        profile,
        top_track,
        top_artist,
        recent,
    } = &overview;

    info!(
        "Library of {}",
        profile.display_name.as_deref().unwrap_or(&profile.id)
    );
    info!(
        "Top track ({}): {}",
        range.as_str(),
        utils::optional_or_na(top_track.as_ref(), |t| format!(
            "{} by {}",
            t.name,
            t.artists_string()
        ))
    );
    info!(
        "Top artist ({}): {}",
        range.as_str(),
        utils::optional_or_na(top_artist.as_ref(), |a| format!("{} ({})", a.name, a.id))
    );
    info!(
        "Followers: {}",
        utils::optional_or_na(overview.followers(), |n| n.to_string())
    );

    println!();
    info!("Recent likes");
    let now = Utc::now();
    let rows: Vec<TrackTableRow> = recent
        .iter()
        .map(|t| TrackTableRow {
            added: utils::optional_or_na(t.added_at, |d| utils::relative_date_string(d, now)),
            name: t.name.clone(),
            artists: t.artists_string(),
            uri: t.uri.clone(),
        })
        .collect();
    println!("{}", Table::new(rows));
    Ok(())
}
