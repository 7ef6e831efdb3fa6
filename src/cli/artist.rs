use tabled::Table;

use crate::{
    Res,
    browse::{self, DEFAULT_MARKET},
    info,
    types::{Artist, ArtistTableRow},
    utils,
};

use super::{App, track::summary_rows};

pub(super) fn artist_rows(artists: &[Artist]) -> Vec<ArtistTableRow> {
    artists
        .iter()
        .map(|a| ArtistTableRow {
            name: a.name.clone(),
            popularity: format!("{}%", a.popularity),
            followers: a.followers.total,
            uri: a.uri.clone(),
        })
        .collect()
}

/// Shows an artist card, the artist's top five tracks and five related
/// artists.
pub async fn artist(app: &App, artist_id: Option<String>) -> Res<()> {
    let artist_id = utils::require_param("artist id", artist_id)?;
    app.session("artist").await?;

    let overview = browse::artist_overview(&app.client, &artist_id, DEFAULT_MARKET).await?;
    let artist = &overview.artist;

    info!("{} ({})", artist.name, artist.uri);
    info!("Popularity: {}%", artist.popularity);
    info!("Followers: {}", artist.followers.total);
    if !artist.genres.is_empty() {
        info!("Genres: {}", artist.genres.join(", "));
    }

    println!();
    info!("Top tracks");
    if overview.top_tracks.is_empty() {
        info!("N/A");
    } else {
        println!("{}", Table::new(summary_rows(&overview.top_tracks)));
    }

    println!();
    info!("Related artists");
    match overview.related {
        Some(related) if !related.is_empty() => println!("{}", Table::new(artist_rows(&related))),
        _ => info!("N/A"),
    }
    Ok(())
}
