use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::Session;

/// Fixed storage key holding the serialized local session
pub const SESSION_STORAGE_KEY: &str = "qube-auth-session";

/// Best-effort persistence for the current session.
///
/// None of these operations surface errors: an unreadable or missing store
/// reads as "no session", and failed writes are logged and dropped.
pub trait SessionStore: Send + Sync {
    fn read(&self) -> Option<Session>;
    fn save(&self, session: &Session);
    fn clear(&self);
}

/// JSON file store, one file named after the storage key
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: Option<PathBuf>,
}

impl FileSessionStore {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: Some(dir.as_ref().join(format!("{}.json", SESSION_STORAGE_KEY))),
        }
    }

    /// Store with no backing location; behaves as permanently empty
    pub fn unavailable() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl SessionStore for FileSessionStore {
    fn read(&self) -> Option<Session> {
        let path = self.path.as_ref()?;
        let content = fs::read_to_string(path).ok()?;

        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::debug!("Ignoring unreadable session file {}: {}", path.display(), e);
                None
            }
        }
    }

    fn save(&self, session: &Session) {
        let Some(path) = self.path.as_ref() else {
            return;
        };

        let result = serde_json::to_string_pretty(session)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| e.to_string())?;
                }
                fs::write(path, content).map_err(|e| e.to_string())
            });

        if let Err(e) = result {
            tracing::warn!("Failed to persist session to {}: {}", path.display(), e);
        }
    }

    fn clear(&self) {
        let Some(path) = self.path.as_ref() else {
            return;
        };

        if let Err(e) = fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to clear session file {}: {}", path.display(), e);
            }
        }
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn read(&self) -> Option<Session> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn save(&self, session: &Session) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(session.clone());
        }
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("qube-store-{}", Uuid::new_v4().simple()))
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = scratch_dir();
        let store = FileSessionStore::in_dir(&dir);
        assert!(store.read().is_none());

        let session = Session::local("hr@qube.com", "hr-manager");
        store.save(&session);
        assert_eq!(store.read(), Some(session));
        assert!(store
            .path()
            .unwrap()
            .ends_with("qube-auth-session.json"));

        store.clear();
        assert!(store.read().is_none());
        // clearing twice is harmless
        store.clear();

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn corrupt_file_reads_as_no_session() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).unwrap();
        let store = FileSessionStore::in_dir(&dir);
        fs::write(store.path().unwrap(), "{not json").unwrap();

        assert!(store.read().is_none());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn unavailable_store_is_always_empty() {
        let store = FileSessionStore::unavailable();
        store.save(&Session::local("a@b.c", "guest"));
        assert!(store.read().is_none());
        store.clear();
    }

    #[test]
    fn memory_store_overwrites_with_latest() {
        let store = MemorySessionStore::new();
        store.save(&Session::local("a@b.c", "guest"));
        store.save(&Session::local("a@b.c", "hr-manager"));
        assert_eq!(store.read().unwrap().user.id, "local-hr-manager");
        store.clear();
        assert!(store.read().is_none());
    }
}
