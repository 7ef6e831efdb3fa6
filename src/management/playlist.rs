use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use crate::types::{CachedPlaylist, CachedTrack, PlaylistTrack};

use super::{Database, StoreError};

const PLAYLIST_COLUMNS: &str =
    "id, name, description, total, public, collaborative, is_favorite";

const TRACK_COLUMNS: &str =
    "id, name, artists_string, album, image_url, spotify_uri, duration, musical_key, tempo";

/// Local mirror of playlists, tracks and playlist membership.
#[derive(Clone)]
pub struct PlaylistCache {
    db: Database,
}

impl PlaylistCache {
    pub fn new(db: Database) -> Self {
        PlaylistCache { db }
    }

    /// Inserts or refreshes playlist metadata. The local favorite flag is
    /// never touched by an upsert.
    pub fn upsert_playlist(&self, playlist: &CachedPlaylist) -> Result<(), StoreError> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO playlists (id, name, description, total, public, collaborative, is_favorite, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                total = excluded.total,
                public = excluded.public,
                collaborative = excluded.collaborative",
            params![
                playlist.id,
                playlist.name,
                playlist.description,
                playlist.total,
                playlist.public,
                playlist.collaborative,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn find_playlist(&self, id: &str) -> Result<Option<CachedPlaylist>, StoreError> {
        let conn = self.db.lock()?;
        let playlist = conn
            .query_row(
                &format!("SELECT {} FROM playlists WHERE id = ?1", PLAYLIST_COLUMNS),
                params![id],
                playlist_from_row,
            )
            .optional()?;
        Ok(playlist)
    }

    /// All cached playlists, oldest cached first.
    pub fn playlists(&self) -> Result<Vec<CachedPlaylist>, StoreError> {
        self.query_playlists("SELECT {} FROM playlists ORDER BY created_at ASC, name ASC")
    }

    pub fn favorite_playlists(&self) -> Result<Vec<CachedPlaylist>, StoreError> {
        self.query_playlists(
            "SELECT {} FROM playlists WHERE is_favorite = 1 ORDER BY created_at ASC, name ASC",
        )
    }

    fn query_playlists(&self, template: &str) -> Result<Vec<CachedPlaylist>, StoreError> {
        let conn = self.db.lock()?;
        let sql = template.replace("{}", PLAYLIST_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let playlists = stmt
            .query_map([], playlist_from_row)?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?;
        Ok(playlists)
    }

    /// Flips the favorite flag and returns the updated playlist.
    pub fn toggle_favorite(&self, id: &str) -> Result<Option<CachedPlaylist>, StoreError> {
        {
            let conn = self.db.lock()?;
            let changed = conn.execute(
                "UPDATE playlists SET is_favorite = NOT is_favorite WHERE id = ?1",
                params![id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
        }
        self.find_playlist(id)
    }

    /// Removes the playlist and its membership rows. Tracks stay.
    pub fn delete_playlist(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.db.lock()?;
        let changed = conn.execute("DELETE FROM playlists WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn delete_memberships(&self, playlist_id: &str) -> Result<usize, StoreError> {
        let conn = self.db.lock()?;
        let removed = conn.execute(
            "DELETE FROM playlist_tracks WHERE playlist_id = ?1",
            params![playlist_id],
        )?;
        Ok(removed)
    }

    /// Inserts or overwrites a track. Analysis fields that are absent in
    /// `track` keep whatever an earlier enrichment stored.
    pub fn upsert_track(&self, track: &CachedTrack) -> Result<(), StoreError> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO tracks (id, name, artists_string, album, image_url, spotify_uri, duration, musical_key, tempo)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                artists_string = excluded.artists_string,
                album = excluded.album,
                image_url = excluded.image_url,
                spotify_uri = excluded.spotify_uri,
                duration = COALESCE(excluded.duration, tracks.duration),
                musical_key = COALESCE(excluded.musical_key, tracks.musical_key),
                tempo = COALESCE(excluded.tempo, tracks.tempo)",
            params![
                track.id,
                track.name,
                track.artists_string,
                track.album,
                track.image_url,
                track.spotify_uri,
                track.duration.map(|d| d as i64),
                track.key,
                track.tempo,
            ],
        )?;
        Ok(())
    }

    pub fn find_track(&self, id: &str) -> Result<Option<CachedTrack>, StoreError> {
        let conn = self.db.lock()?;
        let track = conn
            .query_row(
                &format!("SELECT {} FROM tracks WHERE id = ?1", TRACK_COLUMNS),
                params![id],
                |row| track_from_row(row, 0),
            )
            .optional()?;
        Ok(track)
    }

    /// Creates the membership row if it does not exist. An existing row is
    /// left untouched so its `created_at` survives re-syncs.
    pub fn upsert_membership(
        &self,
        playlist_id: &str,
        track_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conn = self.db.lock()?;
        let inserted = conn.execute(
            "INSERT INTO playlist_tracks (playlist_id, track_id, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(playlist_id, track_id) DO NOTHING",
            params![playlist_id, track_id, created_at.to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    /// Membership time of every track currently cached for `playlist_id`.
    pub fn membership_times(
        &self,
        playlist_id: &str,
    ) -> Result<HashMap<String, DateTime<Utc>>, StoreError> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT track_id, created_at FROM playlist_tracks WHERE playlist_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![playlist_id], |row| {
                let created_at: String = row.get(1)?;
                Ok((row.get(0)?, super::parse_timestamp(&created_at, 1)?))
            })?
            .collect::<Result<HashMap<_, _>, rusqlite::Error>>()?;
        Ok(rows)
    }

    /// Tracks of a playlist with their membership time, newest first.
    pub fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<PlaylistTrack>, StoreError> {
        let conn = self.db.lock()?;
        let columns = TRACK_COLUMNS
            .split(", ")
            .map(|c| format!("t.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, pt.created_at FROM playlist_tracks pt
             JOIN tracks t ON t.id = pt.track_id
             WHERE pt.playlist_id = ?1
             ORDER BY pt.created_at DESC, t.name ASC",
            columns
        ))?;
        let rows = stmt
            .query_map(params![playlist_id], |row| {
                let created_at: String = row.get(9)?;
                Ok(PlaylistTrack {
                    track: track_from_row(row, 0)?,
                    created_at: super::parse_timestamp(&created_at, 9)?,
                })
            })?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?;
        Ok(rows)
    }
}

fn playlist_from_row(row: &Row<'_>) -> rusqlite::Result<CachedPlaylist> {
    Ok(CachedPlaylist {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        total: row.get(3)?,
        public: row.get(4)?,
        collaborative: row.get(5)?,
        is_favorite: row.get(6)?,
    })
}

fn track_from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<CachedTrack> {
    Ok(CachedTrack {
        id: row.get(start)?,
        name: row.get(start + 1)?,
        artists_string: row.get(start + 2)?,
        album: row.get(start + 3)?,
        image_url: row.get(start + 4)?,
        spotify_uri: row.get(start + 5)?,
        duration: row.get::<_, Option<i64>>(start + 6)?.map(|d| d as u64),
        key: row.get(start + 7)?,
        tempo: row.get(start + 8)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn playlist(id: &str, name: &str) -> CachedPlaylist {
        CachedPlaylist {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            total: 2,
            public: false,
            collaborative: false,
            is_favorite: false,
        }
    }

    fn track(id: &str, tempo: Option<f64>) -> CachedTrack {
        CachedTrack {
            id: id.to_string(),
            name: format!("Track {}", id),
            artists_string: "Artist".to_string(),
            album: "Album".to_string(),
            image_url: None,
            spotify_uri: format!("spotify:track:{}", id),
            duration: tempo.map(|_| 200_000),
            key: tempo.map(|_| 5),
            tempo,
        }
    }

    #[test]
    fn upsert_playlist_keeps_favorite_flag() {
        let cache = PlaylistCache::new(Database::open_in_memory().unwrap());
        cache.upsert_playlist(&playlist("p1", "Old name")).unwrap();
        cache.toggle_favorite("p1").unwrap();

        cache.upsert_playlist(&playlist("p1", "New name")).unwrap();

        let stored = cache.find_playlist("p1").unwrap().unwrap();
        assert_eq!(stored.name, "New name");
        assert!(stored.is_favorite);
        assert_eq!(cache.favorite_playlists().unwrap().len(), 1);
    }

    #[test]
    fn toggle_unknown_playlist_returns_none() {
        let cache = PlaylistCache::new(Database::open_in_memory().unwrap());
        assert!(cache.toggle_favorite("missing").unwrap().is_none());
    }

    #[test]
    fn track_upsert_keeps_earlier_analysis() {
        let cache = PlaylistCache::new(Database::open_in_memory().unwrap());
        cache.upsert_track(&track("t1", Some(120.5))).unwrap();
        cache.upsert_track(&track("t1", None)).unwrap();

        let stored = cache.find_track("t1").unwrap().unwrap();
        assert_eq!(stored.tempo, Some(120.5));
        assert_eq!(stored.key, Some(5));
    }

    #[test]
    fn membership_insert_is_create_or_noop() {
        let cache = PlaylistCache::new(Database::open_in_memory().unwrap());
        cache.upsert_playlist(&playlist("p1", "Mix")).unwrap();
        cache.upsert_track(&track("t1", None)).unwrap();

        let first = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap();

        assert!(cache.upsert_membership("p1", "t1", first).unwrap());
        assert!(!cache.upsert_membership("p1", "t1", later).unwrap());

        let rows = cache.playlist_tracks("p1").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].created_at, first);
    }

    #[test]
    fn deleting_playlist_keeps_tracks() {
        let cache = PlaylistCache::new(Database::open_in_memory().unwrap());
        cache.upsert_playlist(&playlist("p1", "Mix")).unwrap();
        cache.upsert_track(&track("t1", None)).unwrap();
        cache.upsert_membership("p1", "t1", Utc::now()).unwrap();

        assert!(cache.delete_playlist("p1").unwrap());
        assert!(cache.playlist_tracks("p1").unwrap().is_empty());
        assert!(cache.find_track("t1").unwrap().is_some());
    }
}
