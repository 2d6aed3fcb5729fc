use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::{ClientError, ClientResult};
use crate::models::{Session, User};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Persistent string key/value store holding the session record.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> ClientResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> ClientResult<()>;
    fn remove(&self, key: &str) -> ClientResult<()>;

    /// Replace several keys in one write.
    fn set_many(&self, entries: &[(&str, &str)]) -> ClientResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove several keys in one write.
    fn remove_many(&self, keys: &[&str]) -> ClientResult<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

impl dyn SessionStorage {
    pub fn token(&self) -> ClientResult<Option<String>> {
        self.get(TOKEN_KEY)
    }

    /// The persisted session, only when both halves are present and the user
    /// record parses.
    pub fn load_session(&self) -> ClientResult<Option<Session>> {
        let (Some(token), Some(user_json)) = (self.get(TOKEN_KEY)?, self.get(USER_KEY)?) else {
            return Ok(None);
        };
        match serde_json::from_str::<User>(&user_json) {
            Ok(user) => Ok(Some(Session { user, token })),
            Err(e) => {
                tracing::warn!("Discarding unreadable persisted user: {}", e);
                Ok(None)
            }
        }
    }

    pub fn save_session(&self, session: &Session) -> ClientResult<()> {
        let user_json = serde_json::to_string(&session.user)?;
        self.set_many(&[(TOKEN_KEY, session.token.as_str()), (USER_KEY, user_json.as_str())])
    }

    pub fn clear_session(&self) -> ClientResult<()> {
        self.remove_many(&[TOKEN_KEY, USER_KEY])
    }
}

/// JSON file backed storage. Each write goes through a temp file and a
/// rename so readers never observe a half-written record.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> ClientResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            ClientError::Storage(format!("{} is not a valid session file: {}", self.path.display(), e))
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, f: F) -> ClientResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?;
        f(&mut entries);
        self.write_all(&entries)
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> ClientResult<()> {
        self.update(|entries| {
            for (key, value) in pairs {
                entries.insert(key.to_string(), value.to_string());
            }
        })
    }

    fn remove_many(&self, keys: &[&str]) -> ClientResult<()> {
        self.update(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}

/// In-process storage for tests and throwaway runs.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}
