use std::{
    io::Write,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use chrono::Utc;
use tabled::Table;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::Mutex,
};

use crate::{
    api::CallbackSlot,
    info,
    interaction::{Interaction, InteractionError},
    server::start_callback_server,
    session::{AuthCallback, Redirect},
    success,
    types::{TrackEntry, TrackTableRow},
    utils, warning,
};

/// How long to wait for the browser to come back.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Drives the interaction from a terminal: opens the browser, listens for
/// the callback, asks questions on stdin and prints tables.
pub struct Terminal {
    server_addr: String,
    assume_yes: bool,
    timeout: Duration,
    /// One buffered reader for the whole run, so input buffered past a line
    /// stays available to the next prompt.
    input: Mutex<Box<dyn AsyncBufRead + Send + Unpin>>,
}

impl Terminal {
    pub fn new(server_addr: impl Into<String>, assume_yes: bool) -> Self {
        Self::with_input(server_addr, assume_yes, BufReader::new(tokio::io::stdin()))
    }

    /// A terminal that reads answers from `input` instead of stdin.
    pub fn with_input(
        server_addr: impl Into<String>,
        assume_yes: bool,
        input: impl AsyncBufRead + Send + Unpin + 'static,
    ) -> Self {
        Terminal {
            server_addr: server_addr.into(),
            assume_yes,
            timeout: CALLBACK_TIMEOUT,
            input: Mutex::new(Box::new(input)),
        }
    }
}

#[async_trait]
impl Interaction for Terminal {
    async fn redirect(&self, redirect: &Redirect) -> Result<AuthCallback, InteractionError> {
        let slot: CallbackSlot = Arc::new(Mutex::new(None));
        let server = start_callback_server(&self.server_addr, Arc::clone(&slot)).await?;

        if webbrowser::open(&redirect.url).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                redirect.url
            );
        } else {
            info!("Waiting for Spotify authorization in your browser...");
        }

        let received = wait_for_callback(slot, &redirect.state, self.timeout, POLL_INTERVAL).await;
        server.abort();
        received
    }

    async fn confirm(&self, prompt: &str) -> Result<bool, InteractionError> {
        if self.assume_yes {
            return Ok(true);
        }

        print!("{} [y/N] ", prompt);
        std::io::stdout().flush()?;

        let mut answer = String::new();
        let mut input = self.input.lock().await;
        if input.read_line(&mut answer).await? == 0 {
            return Ok(false);
        }

        Ok(matches!(
            answer.trim().to_lowercase().as_str(),
            "y" | "yes"
        ))
    }

    fn display_tracks(&self, title: &str, tracks: &[TrackEntry]) {
        let now = Utc::now();
        let rows: Vec<TrackTableRow> = tracks
            .iter()
            .map(|t| TrackTableRow {
                added: utils::optional_or_na(t.added_at, |d| utils::relative_date_string(d, now)),
                name: t.name.clone(),
                artists: t.artists_string(),
                uri: t.uri.clone(),
            })
            .collect();

        info!("{} ({})", title, tracks.len());
        println!("{}", Table::new(rows));
    }

    fn display_link(&self, label: &str, url: &str) {
        success!("{}: {}", label, url);
    }

    fn display_message(&self, message: &str) {
        info!("{}", message);
    }
}

/// Polls `slot` until the listener stores a callback or `max_wait` passes.
///
/// A callback that carries a code but not the issued `state` is refused.
pub async fn wait_for_callback(
    slot: CallbackSlot,
    expected_state: &str,
    max_wait: Duration,
    poll: Duration,
) -> Result<AuthCallback, InteractionError> {
    let start = Instant::now();

    while start.elapsed() < max_wait {
        let lock = slot.lock().await;
        if let Some(received) = lock.as_ref() {
            if received.error.is_none() && received.state.as_deref() != Some(expected_state) {
                return Err(InteractionError::StateMismatch);
            }
            return Ok(received.clone());
        }
        drop(lock);
        tokio::time::sleep(poll).await;
    }

    Err(InteractionError::Timeout)
}
