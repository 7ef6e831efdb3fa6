use chrono::Utc;

use crate::{
    Res, info, success,
    sync::{BuildOutcome, MonthlyPlaylistBuilder},
    utils, warning,
};

use super::App;

/// Builds the "Liked" playlist for `month` (`YYYY-MM`, default: last month).
pub async fn monthly(app: &App, month: Option<String>) -> Res<()> {
    let month = utils::parse_year_month(month.as_deref(), Utc::now().date_naive())?;
    let session = app.session("monthly").await?;

    let collector = app.collector(&format!("Collecting tracks saved in {}", month.label()));
    let builder = MonthlyPlaylistBuilder::new(&app.client, &collector, &app.terminal);

    match builder.build(&session.remote_id, month).await? {
        BuildOutcome::Created { name, tracks, .. } => {
            success!("Created {} with {} tracks", name, tracks)
        }
        BuildOutcome::NoTracks => warning!("Nothing to do for {}", month.label()),
        BuildOutcome::Cancelled => info!("Cancelled"),
    }

    Ok(())
}
