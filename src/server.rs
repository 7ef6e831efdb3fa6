use std::{net::SocketAddr, str::FromStr};

use axum::{Extension, Router, routing::get};
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::{debug, warn};

use crate::{
    api::{self, CallbackSlot},
    interaction::InteractionError,
};

/// Binds the callback listener on `addr` and serves it in the background.
///
/// Binding happens before this returns, so the browser can never be sent to
/// a port nobody listens on yet. Abort the handle once the callback is in.
pub async fn start_callback_server(
    addr: &str,
    slot: CallbackSlot,
) -> Result<JoinHandle<()>, InteractionError> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| InteractionError::Listener(format!("bad server address {}: {}", addr, e)))?;

    let app = Router::new().route("/callback", get(api::callback).layer(Extension(slot)));

    let listener = TcpListener::bind(&addr).await?;
    debug!(%addr, "callback listener bound");

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            warn!(error = %e, "callback listener stopped");
        }
    }))
}
