//! SQLite-based bookmark persistence
//!
//! Single-slot, process-private storage for the capability token. The slot
//! survives restarts, is scoped to the application's data directory, and is
//! never synced or shared.

use crate::error::{Error, Result, StoreError};
use crate::types::{CapabilityToken, StoredBookmark};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Database connection pool type
pub type DbPool = Pool<SqliteConnectionManager>;

/// Well-known key for the single root-folder bookmark slot
pub const BOOKMARK_KEY: &str = "rootFolderBookmark";

const DB_FILE_NAME: &str = "scopekeep.db";

/// Durable single-slot store for the capability token
pub struct TokenStore {
    pool: DbPool,
    db_path: PathBuf,
}

impl TokenStore {
    /// Create a store inside a data directory, creating the directory if
    /// needed.
    pub fn new_with_path(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();

        std::fs::create_dir_all(data_dir).map_err(|e| {
            Error::Store(StoreError::WriteFailed(format!(
                "Failed to create data directory: {}",
                e
            )))
        })?;

        let db_path = data_dir.join(DB_FILE_NAME);
        info!("Bookmark database path: {:?}", db_path);

        Self::from_path(db_path)
    }

    /// Create a store in the platform's default application data directory.
    pub fn new_default() -> Result<Self> {
        let base = dirs::data_dir().ok_or_else(|| {
            Error::Store(StoreError::WriteFailed(
                "No application data directory available".to_string(),
            ))
        })?;
        Self::new_with_path(base.join("scopekeep"))
    }

    /// Create a store from a specific database path (useful for testing).
    pub fn from_path(db_path: PathBuf) -> Result<Self> {
        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e| Error::Store(StoreError::Pool(e.to_string())))?;

        let store = Self { pool, db_path };
        store.initialize()?;

        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| Error::Store(StoreError::Pool(e.to_string())))?;

        let store = Self {
            pool,
            db_path: PathBuf::from(":memory:"),
        };
        store.initialize()?;

        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.pool.get()?;
        run_migrations(&conn)?;
        debug!("Bookmark database initialized");
        Ok(())
    }

    /// Overwrite the stored token unconditionally.
    ///
    /// A single atomic statement: the slot is never left partially written.
    pub fn put(&self, token: &CapabilityToken) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO bookmarks (key, token, minted_at)
            VALUES (?, ?, ?)
            "#,
            params![
                BOOKMARK_KEY,
                token.as_bytes(),
                chrono::Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| Error::Store(StoreError::WriteFailed(e.to_string())))?;

        info!("Stored bookmark token ({} bytes)", token.as_bytes().len());
        Ok(())
    }

    /// The currently stored token, or `None` if never set.
    pub fn get(&self) -> Result<Option<CapabilityToken>> {
        Ok(self.entry()?.map(|e| e.token))
    }

    /// The stored token together with its mint timestamp.
    pub fn entry(&self) -> Result<Option<StoredBookmark>> {
        let conn = self.pool.get()?;
        let row = conn
            .query_row(
                "SELECT token, minted_at FROM bookmarks WHERE key = ?",
                params![BOOKMARK_KEY],
                |row| {
                    let bytes: Vec<u8> = row.get(0)?;
                    let minted_at: String = row.get(1)?;
                    Ok((bytes, minted_at))
                },
            )
            .optional()?;

        match row {
            Some((bytes, minted_at)) => {
                let minted_at = chrono::DateTime::parse_from_rfc3339(&minted_at)
                    .map_err(|e| {
                        Error::Store(StoreError::Database(format!(
                            "Bad minted_at timestamp: {}",
                            e
                        )))
                    })?
                    .with_timezone(&chrono::Utc);

                Ok(Some(StoredBookmark {
                    token: CapabilityToken::new(bytes),
                    minted_at,
                }))
            }
            None => Ok(None),
        }
    }

    /// Get the database path
    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }
}

/// Create the bookmark schema if it does not exist yet.
fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS bookmarks (
            key TEXT PRIMARY KEY,
            token BLOB NOT NULL,
            minted_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_get_before_any_put_is_none() {
        let store = TokenStore::in_memory().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_put_then_get() {
        let store = TokenStore::in_memory().unwrap();
        let token = CapabilityToken::new(b"blob".to_vec());

        store.put(&token).unwrap();
        assert_eq!(store.get().unwrap(), Some(token));
    }

    #[test]
    fn test_put_overwrites_single_slot() {
        let store = TokenStore::in_memory().unwrap();
        let first = CapabilityToken::new(b"first".to_vec());
        let second = CapabilityToken::new(b"second".to_vec());

        store.put(&first).unwrap();
        store.put(&second).unwrap();
        assert_eq!(store.get().unwrap(), Some(second));
    }

    #[test]
    fn test_entry_carries_mint_time() {
        let store = TokenStore::in_memory().unwrap();
        store.put(&CapabilityToken::new(b"blob".to_vec())).unwrap();

        let entry = store.entry().unwrap().unwrap();
        assert!(entry.minted_at <= chrono::Utc::now());
    }

    #[test]
    fn test_token_survives_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("scopekeep.db");
        let token = CapabilityToken::new(b"persisted".to_vec());

        {
            let store = TokenStore::from_path(db_path.clone()).unwrap();
            store.put(&token).unwrap();
        }

        let store = TokenStore::from_path(db_path).unwrap();
        assert_eq!(store.get().unwrap(), Some(token));
    }

    #[test]
    fn test_new_with_path_creates_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let store = TokenStore::new_with_path(&nested).unwrap();
        assert!(store.db_path().starts_with(&nested));
    }
}
