use crate::{Res, info, success};

use super::App;

/// Authorizes the current account. `reset` drops the stored credential
/// first, which is the way out of an identity mismatch.
pub async fn auth(app: &App, reset: bool) -> Res<()> {
    if reset {
        app.credentials().clear(&app.account)?;
        info!("Stored credential for {} cleared", app.account);
    }

    let session = app.session("auth").await?;
    success!(
        "Authorized {} as Spotify user {}",
        session.account_id,
        session.remote_id
    );
    Ok(())
}
