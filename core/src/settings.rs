use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

/// Settings key holding the path of the active food data file.
pub const FOOD_DATA_SAVE_LOCATION: &str = "foodDataSaveLocation";

/// Small key/value store for user preferences that outlive the data file itself.
pub struct SettingsStore {
    conn: Connection,
}

impl SettingsStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open settings database: {}", path.display()))?;
        let store = SettingsStore { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = SettingsStore { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS user_settings (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO user_settings (key, value)
             VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM user_settings WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM user_settings WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    /// The remembered data file path. Blank values count as unset.
    pub fn food_data_save_location(&self) -> Result<Option<PathBuf>> {
        Ok(self
            .get_setting(FOOD_DATA_SAVE_LOCATION)?
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from))
    }

    pub fn set_food_data_save_location(&self, path: &Path) -> Result<()> {
        self.set_setting(FOOD_DATA_SAVE_LOCATION, &path.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_set_get() {
        let store = SettingsStore::open_in_memory().unwrap();
        store.set_setting("test_key", "test_value").unwrap();
        let val = store.get_setting("test_key").unwrap();
        assert_eq!(val.as_deref(), Some("test_value"));
    }

    #[test]
    fn test_settings_get_nonexistent() {
        let store = SettingsStore::open_in_memory().unwrap();
        assert!(store.get_setting("nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_settings_upsert() {
        let store = SettingsStore::open_in_memory().unwrap();
        store.set_setting("key", "value1").unwrap();
        store.set_setting("key", "value2").unwrap();
        assert_eq!(store.get_setting("key").unwrap().as_deref(), Some("value2"));
    }

    #[test]
    fn test_settings_delete() {
        let store = SettingsStore::open_in_memory().unwrap();
        store.set_setting("key", "value").unwrap();
        assert!(store.delete_setting("key").unwrap());
        assert!(store.get_setting("key").unwrap().is_none());
        // Deleting again returns false
        assert!(!store.delete_setting("key").unwrap());
    }

    #[test]
    fn test_food_data_save_location() {
        let store = SettingsStore::open_in_memory().unwrap();
        assert!(store.food_data_save_location().unwrap().is_none());

        store
            .set_food_data_save_location(Path::new("/data/FoodData.json"))
            .unwrap();
        assert_eq!(
            store.food_data_save_location().unwrap(),
            Some(PathBuf::from("/data/FoodData.json"))
        );

        store.set_setting(FOOD_DATA_SAVE_LOCATION, "   ").unwrap();
        assert!(store.food_data_save_location().unwrap().is_none());
    }

    #[test]
    fn test_settings_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.db");
        {
            let store = SettingsStore::open(&path).unwrap();
            store.set_setting("key", "kept").unwrap();
        }
        let store = SettingsStore::open(&path).unwrap();
        assert_eq!(store.get_setting("key").unwrap().as_deref(), Some("kept"));
    }
}
