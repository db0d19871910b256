use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Serialize, de::DeserializeOwned};

use crate::store::schema::{AuthData, LocalAttemptRecord, LocalHistoryData};

pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("testarena");
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    #[allow(dead_code)] // Used by integration tests
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
                Err(_) => T::default(),
            }
        } else {
            T::default()
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Load the stored credential. Returns None if the file exists but cannot
    /// be parsed (schema mismatch / corruption); the caller treats that the
    /// same as "not logged in".
    pub fn load_auth(&self) -> Option<AuthData> {
        let path = self.file_path("auth.json");
        if path.exists() {
            let content = fs::read_to_string(&path).ok()?;
            let data: AuthData = serde_json::from_str(&content).ok()?;
            if data.needs_reset() {
                return None;
            }
            Some(data)
        } else {
            Some(AuthData::default())
        }
    }

    pub fn save_auth(&self, data: &AuthData) -> Result<()> {
        self.save("auth.json", data)
    }

    /// Drop the stored credential, e.g. after the server reports it expired.
    pub fn clear_auth(&self) -> Result<()> {
        let path = self.file_path("auth.json");
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn load_history(&self) -> LocalHistoryData {
        self.load("local_history.json")
    }

    pub fn append_history(&self, record: LocalAttemptRecord) -> Result<()> {
        let mut history = self.load_history();
        history.attempts.push(record);
        self.save("local_history.json", &history)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_auth_roundtrip() {
        let (_dir, store) = store();
        let data = AuthData {
            token: Some("tok-123".to_string()),
            email: Some("a@b.c".to_string()),
            username: Some("a".to_string()),
            saved_at: Some(Utc::now()),
            ..AuthData::default()
        };
        store.save_auth(&data).unwrap();
        let loaded = store.load_auth().unwrap();
        assert_eq!(loaded.token.as_deref(), Some("tok-123"));
        assert_eq!(loaded.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn test_missing_auth_file_is_fresh_default() {
        let (_dir, store) = store();
        let loaded = store.load_auth().unwrap();
        assert!(loaded.token.is_none());
    }

    #[test]
    fn test_corrupt_auth_file_reads_as_none() {
        let (dir, store) = store();
        fs::write(dir.path().join("auth.json"), "{not json").unwrap();
        assert!(store.load_auth().is_none());
    }

    #[test]
    fn test_clear_auth_removes_file() {
        let (dir, store) = store();
        store.save_auth(&AuthData::default()).unwrap();
        assert!(dir.path().join("auth.json").exists());
        store.clear_auth().unwrap();
        assert!(!dir.path().join("auth.json").exists());
        // Clearing again is fine.
        store.clear_auth().unwrap();
    }

    #[test]
    fn test_history_appends_in_order() {
        let (_dir, store) = store();
        for total in [5, 10] {
            store
                .append_history(LocalAttemptRecord {
                    paper_label: "sample".to_string(),
                    total,
                    attempted: 1,
                    unanswered: total - 1,
                    duration_minutes: 30,
                    finished_at: Utc::now(),
                })
                .unwrap();
        }
        let history = store.load_history();
        assert_eq!(history.attempts.len(), 2);
        assert_eq!(history.attempts[0].total, 5);
        assert_eq!(history.attempts[1].total, 10);
    }

    #[test]
    fn test_save_leaves_no_tmp_file() {
        let (dir, store) = store();
        store.save_auth(&AuthData::default()).unwrap();
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
