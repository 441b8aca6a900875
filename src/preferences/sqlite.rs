//! SQLite-backed preference storage.

use std::path::Path;

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use super::storage::{PreferenceResult, PreferenceStorage, StorageFuture};

/// Preferences in a single key/value table.
pub struct SqlitePreferenceStorage {
    conn: Connection,
    table: String,
}

impl SqlitePreferenceStorage {
    /// Table name for preferences.
    pub const DEFAULT_TABLE: &'static str = "preferences";

    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or the table created.
    pub async fn open(path: impl AsRef<Path>) -> PreferenceResult<Self> {
        let conn = Connection::open(path.as_ref()).await?;
        Self::with_connection(conn).await
    }

    /// Use an already opened connection, creating the table if needed.
    ///
    /// # Errors
    /// Returns an error if the table cannot be created.
    pub async fn with_connection(conn: Connection) -> PreferenceResult<Self> {
        let table = Self::DEFAULT_TABLE.to_string();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                )"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self { conn, table })
    }
}

impl PreferenceStorage for SqlitePreferenceStorage {
    fn get(&self, key: &str) -> StorageFuture<'_, PreferenceResult<Option<String>>> {
        let key = key.to_string();
        Box::pin(async move {
            let table = self.table.clone();
            let value = self
                .conn
                .call(move |conn| {
                    let value = conn
                        .query_row(
                            &format!("SELECT value FROM {table} WHERE key = ?1"),
                            rusqlite::params![key],
                            |row| row.get::<_, String>(0),
                        )
                        .optional()?;
                    Ok(value)
                })
                .await?;
            Ok(value)
        })
    }

    fn set(&self, key: &str, value: &str) -> StorageFuture<'_, PreferenceResult<()>> {
        let key = key.to_string();
        let value = value.to_string();
        Box::pin(async move {
            let table = self.table.clone();
            let updated_at = chrono::Utc::now().timestamp_millis();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT OR REPLACE INTO {table} (key, value, updated_at)
                             VALUES (?1, ?2, ?3)"
                        ),
                        rusqlite::params![key, value, updated_at],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }
}
