//! Client-side key/value storage for the session token.

use super::{AuthToken, TOKEN_KEY, TOKEN_TIME_KEY};
use crate::error::DashError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// String key/value storage, the shape of browser local storage.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, DashError>;
    fn set(&self, key: &str, value: &str) -> Result<(), DashError>;
    fn remove(&self, key: &str) -> Result<(), DashError>;
}

// ─── Token helpers ───────────────────────────────────────────────────────────

/// Read the stored token. Missing keys or an unparseable time yield `None`.
pub fn load_token(store: &dyn TokenStore) -> Result<Option<AuthToken>, DashError> {
    let token = store.get(TOKEN_KEY)?.filter(|t| !t.is_empty());
    let issued_at = store
        .get(TOKEN_TIME_KEY)?
        .and_then(|t| t.trim().parse::<i64>().ok());
    Ok(match (token, issued_at) {
        (Some(token), Some(issued_at)) => Some(AuthToken { token, issued_at }),
        _ => None,
    })
}

pub fn save_token(store: &dyn TokenStore, token: &AuthToken) -> Result<(), DashError> {
    store.set(TOKEN_KEY, &token.token)?;
    store.set(TOKEN_TIME_KEY, &token.issued_at.to_string())
}

/// Restart the 12h window of the stored token.
pub fn touch_token(store: &dyn TokenStore, now_ms: i64) -> Result<(), DashError> {
    store.set(TOKEN_TIME_KEY, &now_ms.to_string())
}

pub fn clear_token(store: &dyn TokenStore) -> Result<(), DashError> {
    store.remove(TOKEN_KEY)?;
    store.remove(TOKEN_TIME_KEY)
}

// ─── In-memory ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, DashError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DashError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DashError> {
        self.lock().remove(key);
        Ok(())
    }
}

// ─── JSON file ───────────────────────────────────────────────────────────────

/// A flat JSON object on disk. A missing file reads as empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<HashMap<String, String>, DashError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(HashMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(DashError::Storage(format!("{}: {}", self.path.display(), e))),
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<(), DashError> {
        let text = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, text)
            .map_err(|e| DashError::Storage(format!("{}: {}", self.path.display(), e)))
    }

    fn update<F>(&self, f: F) -> Result<(), DashError>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.read_map()?;
        f(&mut map);
        self.write_map(&map)
    }
}

impl TokenStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, DashError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DashError> {
        self.update(|m| {
            m.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), DashError> {
        self.update(|m| {
            m.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("stardash-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_save_load_clear() {
        let store = MemoryStore::new();
        assert_eq!(load_token(&store).unwrap(), None);

        let token = AuthToken {
            token: "abc".into(),
            issued_at: 1_700_000_000_000,
        };
        save_token(&store, &token).unwrap();
        assert_eq!(load_token(&store).unwrap(), Some(token));
        assert_eq!(
            store.get(TOKEN_TIME_KEY).unwrap().as_deref(),
            Some("1700000000000")
        );

        clear_token(&store).unwrap();
        assert_eq!(load_token(&store).unwrap(), None);
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_token_without_time_is_missing() {
        let store = MemoryStore::new();
        store.set(TOKEN_KEY, "abc").unwrap();
        assert_eq!(load_token(&store).unwrap(), None);
        store.set(TOKEN_TIME_KEY, "yesterday").unwrap();
        assert_eq!(load_token(&store).unwrap(), None);
    }

    #[test]
    fn test_touch_refreshes_time() {
        let store = MemoryStore::new();
        save_token(
            &store,
            &AuthToken {
                token: "abc".into(),
                issued_at: 5,
            },
        )
        .unwrap();
        touch_token(&store, 99).unwrap();
        assert_eq!(load_token(&store).unwrap().unwrap().issued_at, 99);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let path = temp_path("persist");
        let _ = std::fs::remove_file(&path);

        let store = FileStore::new(&path);
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
        store.set(TOKEN_KEY, "abc").unwrap();
        store.set(TOKEN_TIME_KEY, "42").unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(
            load_token(&reopened).unwrap(),
            Some(AuthToken {
                token: "abc".into(),
                issued_at: 42
            })
        );
        clear_token(&reopened).unwrap();
        assert_eq!(load_token(&store).unwrap(), None);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_corrupt_file_is_error() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileStore::new(&path);
        assert!(matches!(store.get(TOKEN_KEY), Err(DashError::Serde(_))));
        let _ = std::fs::remove_file(&path);
    }
}
