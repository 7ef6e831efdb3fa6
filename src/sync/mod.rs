//! # Sync Module
//!
//! Everything that reads pages from Spotify and acts on them.
//!
//! - [`paginate`] - the paced offset paginator and the collections built on it
//! - [`cache`] - writes collected playlists into the local cache
//! - [`monthly`] - monthly "Liked" playlists and batched adds
//! - [`compare`] - Liked Songs missing from a playlist

pub mod cache;
pub mod compare;
pub mod monthly;
pub mod paginate;

pub use cache::{AddOutcome, PlaylistSynchronizer, SyncError, SyncOptions, SyncReport};
pub use compare::{CompareOutcome, Comparison};
pub use monthly::{BuildError, BuildOutcome, MonthlyPlaylistBuilder};
pub use paginate::{Collector, Flow, Page};
