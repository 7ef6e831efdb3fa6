//! crate-digger library
//!
//! Browses a Spotify library from the terminal, builds monthly playlists out
//! of Liked Songs and keeps a local SQLite mirror of playlists for fast
//! browsing.
//!
//! # Modules
//!
//! - `api` - HTTP endpoint receiving the OAuth redirect
//! - `browse` - Read-only views: track analysis, artists and the library dashboard
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `interaction` - The boundary the core uses to talk to the user
//! - `management` - Local SQLite store for credentials and the playlist cache
//! - `server` - Local HTTP listener for OAuth callbacks
//! - `session` - The authorization gate in front of every Spotify call
//! - `spotify` - Spotify Web API client implementation
//! - `sync` - Pagination, cache synchronization and playlist building
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers

pub mod api;
pub mod browse;
pub mod cli;
pub mod config;
pub mod interaction;
pub mod management;
pub mod server;
pub mod session;
pub mod spotify;
pub mod sync;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Command functions return this so that any of the crate's error types can
/// bubble up to `main`, which prints it and exits.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational line prefixed with a blue `o`.
///
/// ```
/// info!("Found {} playlists", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a line prefixed with a green checkmark once something worked.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a red `!` line and exits with status 1.
///
/// Only `main` uses this; library code returns errors instead.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a yellow `!` line for problems that do not stop the command, such
/// as a batch of audio features that could not be fetched.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
