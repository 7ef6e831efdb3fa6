mod auth;
mod database;
mod playlist;

pub use auth::CredentialStore;
pub use database::Database;
pub use database::StoreError;
pub use playlist::PlaylistCache;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;

/// Timestamps are stored as RFC 3339 text.
pub(crate) fn parse_timestamp(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}
