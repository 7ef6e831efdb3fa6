use chrono::Utc;
use rusqlite::{OptionalExtension, Row, params};

use crate::types::{Account, Token};

use super::{Database, StoreError};

/// Durable accounts and their OAuth credentials.
///
/// A credential row is never deleted on its own: a failed validation clears
/// the token columns, a new authorization overwrites them.
#[derive(Clone)]
pub struct CredentialStore {
    db: Database,
}

impl CredentialStore {
    pub fn new(db: Database) -> Self {
        CredentialStore { db }
    }

    pub fn find_account(&self, internal_id: &str) -> Result<Option<Account>, StoreError> {
        let conn = self.db.lock()?;
        let account = conn
            .query_row(
                "SELECT internal_id, remote_id, created_at FROM accounts WHERE internal_id = ?1",
                params![internal_id],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    pub fn find_account_by_remote(&self, remote_id: &str) -> Result<Option<Account>, StoreError> {
        let conn = self.db.lock()?;
        let account = conn
            .query_row(
                "SELECT internal_id, remote_id, created_at FROM accounts WHERE remote_id = ?1",
                params![remote_id],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    /// Creates the account if needed and binds it to `remote_id`.
    ///
    /// Callers check the one-to-one rule first; the unique index on
    /// `remote_id` rejects a second identity regardless.
    pub fn link_account(&self, internal_id: &str, remote_id: &str) -> Result<Account, StoreError> {
        {
            let conn = self.db.lock()?;
            conn.execute(
                "INSERT INTO accounts (internal_id, remote_id, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(internal_id) DO UPDATE SET remote_id = excluded.remote_id",
                params![internal_id, remote_id, Utc::now().to_rfc3339()],
            )?;
        }

        self.find_account(internal_id)?
            .ok_or_else(|| StoreError::Corrupt(format!("account {} vanished", internal_id)))
    }

    /// Returns the stored credential, or `None` when there is none or it was
    /// cleared.
    pub fn load(&self, internal_id: &str) -> Result<Option<Token>, StoreError> {
        let conn = self.db.lock()?;
        let token = conn
            .query_row(
                "SELECT access_token, refresh_token, scope, expires_in, obtained_at
                 FROM credentials WHERE internal_id = ?1 AND access_token IS NOT NULL",
                params![internal_id],
                |row| {
                    Ok(Token {
                        access_token: row.get(0)?,
                        refresh_token: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        scope: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        expires_in: row.get::<_, Option<i64>>(3)?.unwrap_or_default() as u64,
                        obtained_at: row.get::<_, Option<i64>>(4)?.unwrap_or_default() as u64,
                    })
                },
            )
            .optional()?;
        Ok(token)
    }

    /// Creates or overwrites the credential of an existing account.
    pub fn save(&self, internal_id: &str, token: &Token) -> Result<(), StoreError> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO credentials (internal_id, access_token, refresh_token, scope, expires_in, obtained_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(internal_id) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                scope = excluded.scope,
                expires_in = excluded.expires_in,
                obtained_at = excluded.obtained_at",
            params![
                internal_id,
                token.access_token,
                token.refresh_token,
                token.scope,
                token.expires_in as i64,
                token.obtained_at as i64,
            ],
        )?;
        Ok(())
    }

    pub fn clear(&self, internal_id: &str) -> Result<(), StoreError> {
        let conn = self.db.lock()?;
        conn.execute(
            "UPDATE credentials SET access_token = NULL, refresh_token = NULL,
                scope = NULL, expires_in = NULL, obtained_at = NULL
             WHERE internal_id = ?1",
            params![internal_id],
        )?;
        Ok(())
    }
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    let created_at: String = row.get(2)?;
    Ok(Account {
        internal_id: row.get(0)?,
        remote_id: row.get(1)?,
        created_at: super::parse_timestamp(&created_at, 2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(access: &str) -> Token {
        Token {
            access_token: access.to_string(),
            refresh_token: "refresh".to_string(),
            scope: "user-library-read".to_string(),
            expires_in: 3600,
            obtained_at: 1_700_000_000,
        }
    }

    #[test]
    fn link_then_find_both_ways() {
        let store = CredentialStore::new(Database::open_in_memory().unwrap());
        store.link_account("dan@example.com", "spotify-dan").unwrap();

        let by_internal = store.find_account("dan@example.com").unwrap().unwrap();
        assert_eq!(by_internal.remote_id.as_deref(), Some("spotify-dan"));

        let by_remote = store.find_account_by_remote("spotify-dan").unwrap().unwrap();
        assert_eq!(by_remote.internal_id, "dan@example.com");
    }

    #[test]
    fn remote_id_cannot_be_linked_twice() {
        let store = CredentialStore::new(Database::open_in_memory().unwrap());
        store.link_account("a@example.com", "shared").unwrap();
        assert!(store.link_account("b@example.com", "shared").is_err());
    }

    #[test]
    fn save_overwrites_and_clear_keeps_row() {
        let store = CredentialStore::new(Database::open_in_memory().unwrap());
        store.link_account("dan@example.com", "spotify-dan").unwrap();

        store.save("dan@example.com", &token("first")).unwrap();
        store.save("dan@example.com", &token("second")).unwrap();
        assert_eq!(
            store.load("dan@example.com").unwrap().unwrap().access_token,
            "second"
        );

        store.clear("dan@example.com").unwrap();
        assert!(store.load("dan@example.com").unwrap().is_none());

        // the account link survives a cleared credential
        assert!(store.find_account("dan@example.com").unwrap().is_some());
    }

    #[test]
    fn credential_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");

        {
            let store = CredentialStore::new(Database::open(&path).unwrap());
            store.link_account("dan@example.com", "spotify-dan").unwrap();
            store.save("dan@example.com", &token("durable")).unwrap();
        }

        let store = CredentialStore::new(Database::open(&path).unwrap());
        assert_eq!(store.load("dan@example.com").unwrap(), Some(token("durable")));
    }
}
