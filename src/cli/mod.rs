//! # CLI Module
//!
//! The command-line layer of crate-digger. Each command builds an [`App`],
//! passes the authorization gate when it needs Spotify, and then hands off to
//! the sync layer, printing progress and results on the way.
//!
//! ## Commands
//!
//! - [`auth`] - authorize (or re-authorize) the current account
//! - [`list_playlists`], [`cache_playlists`], [`view_playlist`],
//!   [`sync_playlist`], [`refresh_favorites`], [`toggle_favorite`],
//!   [`delete_playlist`] - the local playlist cache
//! - [`monthly`] - build a "Liked - <Month> <Year>" playlist
//! - [`analyze_track`], [`add_track`] - single track operations
//! - [`artist`] - artist card, top tracks and related artists
//! - [`library`] - top items and recent likes
//! - [`compare`] - add Liked Songs missing from a playlist
//!
//! ```text
//! CLI Layer (commands, Terminal)
//!     ↓
//! Session gate / Sync layer
//!     ↓
//! CatalogApi (Spotify)  +  local SQLite cache
//! ```

mod artist;
mod auth;
mod compare;
mod library;
mod monthly;
mod playlists;
mod terminal;
mod track;

pub use artist::artist;
pub use auth::auth;
pub use compare::compare;
pub use library::library;
pub use monthly::monthly;
pub use playlists::{
    cache_playlists, delete_playlist, list_playlists, refresh_favorites, sync_playlist,
    toggle_favorite, view_playlist,
};
pub use terminal::{Terminal, wait_for_callback};
pub use track::{add_track, analyze_track};

use crate::{
    Res, config,
    config::Config,
    management::{CredentialStore, Database, PlaylistCache},
    session::{AccountContext, AuthSettings, Session, SessionManager},
    spotify::SpotifyClient,
    sync::Collector,
    utils,
};

/// Everything a command needs, wired from the environment.
pub struct App {
    pub config: Config,
    pub account: String,
    pub client: SpotifyClient,
    pub db: Database,
    pub terminal: Terminal,
}

impl App {
    pub fn new(account: Option<String>, assume_yes: bool) -> Res<Self> {
        let config = Config::from_env()?;
        let account = config::account_id(account)?;
        let client = SpotifyClient::new(&config);
        let db = Database::open(&config.database_path)?;
        let terminal = Terminal::new(config.server_addr.clone(), assume_yes);

        Ok(App {
            config,
            account,
            client,
            db,
            terminal,
        })
    }

    pub fn credentials(&self) -> CredentialStore {
        CredentialStore::new(self.db.clone())
    }

    pub fn cache(&self) -> PlaylistCache {
        PlaylistCache::new(self.db.clone())
    }

    /// A paginator that reports its progress on a spinner.
    pub fn collector(&self, message: &str) -> Collector {
        Collector::default().with_progress(utils::spinner(message))
    }

    /// Passes the authorization gate; `resume` names the command asking.
    pub async fn session(&self, resume: &str) -> Res<Session> {
        let manager = SessionManager::new(
            &self.client,
            self.credentials(),
            AuthSettings::from(&self.config),
        );
        let ctx = AccountContext::new(self.account.clone(), resume);
        Ok(manager.authenticate(&ctx, &self.terminal).await?)
    }
}
