use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::Mutex;
use tracing::debug;

use crate::session::AuthCallback;

/// Where the listener leaves the callback for the waiting command.
pub type CallbackSlot = Arc<Mutex<Option<AuthCallback>>>;

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(slot): Extension<CallbackSlot>,
) -> Html<&'static str> {
    let received = AuthCallback {
        code: params.get("code").cloned(),
        state: params.get("state").cloned(),
        error: params.get("error").cloned(),
    };
    debug!(
        has_code = received.code.is_some(),
        error = ?received.error,
        "authorization callback received"
    );

    let page = if received.error.is_some() {
        Html("<h4>Authorization was denied.</h4><p>You can close this window.</p>")
    } else if received.code.is_some() {
        Html("<h2>Authorization received.</h2><p>You can close this window.</p>")
    } else {
        Html("<h4>Missing authorization code.</h4>")
    };

    let mut lock = slot.lock().await;
    *lock = Some(received);

    page
}
