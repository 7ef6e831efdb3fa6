//! The boundary between the core and whoever drives it.
//!
//! The session manager and the playlist builders never talk to a terminal or
//! a browser directly. They ask an [`Interaction`] to send the user somewhere,
//! to confirm an action, or to show a result.

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    session::{AuthCallback, Redirect},
    types::TrackEntry,
};

#[derive(Error, Debug)]
pub enum InteractionError {
    #[error("Timed out waiting for the authorization callback")]
    Timeout,
    #[error("Authorization callback carried an unexpected state")]
    StateMismatch,
    #[error("Callback listener failed: {0}")]
    Listener(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait Interaction: Send + Sync {
    /// Sends the user to `redirect.url` and resumes with whatever the
    /// authorization service handed back.
    async fn redirect(&self, redirect: &Redirect) -> Result<AuthCallback, InteractionError>;

    async fn confirm(&self, prompt: &str) -> Result<bool, InteractionError>;

    fn display_tracks(&self, title: &str, tracks: &[TrackEntry]);

    fn display_link(&self, label: &str, url: &str);

    fn display_message(&self, message: &str);
}
