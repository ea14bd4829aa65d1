use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tokio::sync::Mutex;

pub use rusqlite::Connection;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings store: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("settings directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings value encoding: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("settings value encoding: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Durable application key/value settings.
#[derive(Debug, Clone)]
pub struct Settings(
    Arc<Mutex<Connection>>
);

impl Settings {
    /// Opens (or creates) `settings.db` in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SettingsError> {
        std::fs::create_dir_all(dir.as_ref())?;
        let db = Connection::open(dir.as_ref().join("settings.db"))?;
        Self::with_connection(db)
    }

    pub fn in_memory() -> Result<Self, SettingsError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(db: Connection) -> Result<Self, SettingsError> {
        db.busy_timeout(Duration::ZERO)?;
        db.execute(
            "CREATE TABLE if not exists kvs(key TEXT NOT NULL UNIQUE, value TEXT);", []
        )?;
        Ok(Settings(Arc::new(Mutex::new(db))))
    }

    pub async fn set<V: Serialize>(&self, key: &str, value: &V) -> Result<(), SettingsError> {
        self.0.lock().await.set(key, value)
    }

    pub async fn get<V: for<'a> Deserialize<'a>>(&self, key: &str) -> Result<Option<V>, SettingsError> {
        self.0.lock().await.get(key)
    }

    pub async fn get_bool(&self, key: &str, default: bool) -> Result<bool, SettingsError> {
        Ok(self.get(key).await?.unwrap_or(default))
    }

    pub async fn set_bool(&self, key: &str, value: bool) -> Result<(), SettingsError> {
        self.set(key, &value).await
    }
}

pub trait RustSqlite {
    fn set<V: Serialize>(&self, key: &str, value: &V) -> Result<(), SettingsError>;
    fn get<V: for<'a> Deserialize<'a>>(&self, key: &str) -> Result<Option<V>, SettingsError>;
}

impl RustSqlite for Connection {
    fn set<V: Serialize>(&self, key: &str, value: &V) -> Result<(), SettingsError> {
        self.execute(
            "INSERT INTO kvs(key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value=excluded.value;",
            [key, &hex::encode(serde_json::to_vec(value)?)]
        )?;
        Ok(())
    }

    fn get<V: for<'a> Deserialize<'a>>(&self, key: &str) -> Result<Option<V>, SettingsError> {
        let mut statement = self.prepare("SELECT value FROM kvs WHERE key = ?1")?;
        let mut rows = statement.query([key])?;
        match rows.next()? {
            Some(row) => {
                let item: String = row.get(0)?;
                Ok(Some(serde_json::from_slice(&hex::decode(item)?)?))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
