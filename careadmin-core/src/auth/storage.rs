//! Session persistence
//!
//! The file store keeps the session across process restarts so a cached
//! session can be validated at startup. The memory store is for tests and
//! callers that must not touch disk.

use super::types::{AuthError, Session};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

const AUTH_SESSION_FILE: &str = "auth_session.dat";

// Simple obfuscation key - not cryptographically secure but prevents casual reading
const OBFUSCATION_KEY: &[u8] = b"CareAdminConsoleSessionStore";

/// Where the Session Manager keeps its session between runs
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>, AuthError>;
    fn store(&self, session: &Session) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// File-backed session storage
pub struct FileSessionStore {
    data_dir: PathBuf,
}

impl FileSessionStore {
    /// Create a store rooted at `data_dir`, creating the directory if needed
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let data_dir = data_dir.into();

        std::fs::create_dir_all(&data_dir).map_err(|e| {
            AuthError::Storage(format!("Failed to create data directory: {}", e))
        })?;

        info!("Session storage directory: {}", data_dir.display());
        Ok(Self { data_dir })
    }

    /// Path of the session file
    pub fn session_file_path(&self) -> PathBuf {
        self.data_dir.join(AUTH_SESSION_FILE)
    }

    /// Simple XOR obfuscation (not secure, but prevents casual reading)
    fn obfuscate(data: &[u8]) -> Vec<u8> {
        data.iter()
            .zip(OBFUSCATION_KEY.iter().cycle())
            .map(|(byte, key)| byte ^ key)
            .collect()
    }

    /// Remove a file that could not be decoded
    fn discard_corrupt(path: &Path, reason: &str) {
        error!("Discarding unreadable session file ({})", reason);
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove corrupt session file: {}", e);
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, AuthError> {
        let path = self.session_file_path();

        if !path.exists() {
            debug!("Session file does not exist (first run or signed out)");
            return Ok(None);
        }

        let encoded = std::fs::read_to_string(&path)
            .map_err(|e| AuthError::Storage(format!("Failed to read session file: {}", e)))?;

        let obfuscated = match BASE64.decode(encoded.trim()) {
            Ok(data) => data,
            Err(e) => {
                Self::discard_corrupt(&path, &format!("base64: {}", e));
                return Ok(None);
            }
        };

        let json = Self::obfuscate(&obfuscated);
        match serde_json::from_slice::<Session>(&json) {
            Ok(session) => {
                info!("Loaded session for {}", session.identity.email);
                Ok(Some(session))
            }
            Err(e) => {
                Self::discard_corrupt(&path, &format!("json: {}", e));
                Ok(None)
            }
        }
    }

    fn store(&self, session: &Session) -> Result<(), AuthError> {
        let path = self.session_file_path();

        let json = serde_json::to_vec(session)
            .map_err(|e| AuthError::Storage(format!("Failed to serialize session: {}", e)))?;
        let encoded = BASE64.encode(Self::obfuscate(&json));

        std::fs::write(&path, &encoded).map_err(|e| {
            error!("Failed to write session file: {}", e);
            AuthError::Storage(format!("Failed to write session file: {}", e))
        })?;

        info!(
            "Session stored for {} (expires {})",
            session.identity.email, session.expires_at
        );
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        let path = self.session_file_path();
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| {
                AuthError::Storage(format!("Failed to delete session file: {}", e))
            })?;
            info!("Cleared session file");
        }
        Ok(())
    }
}

/// In-process session storage
#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a session already stored
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.session.lock().clone())
    }

    fn store(&self, session: &Session) -> Result<(), AuthError> {
        *self.session.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.session.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::Identity;
    use chrono::Utc;

    fn session() -> Session {
        Session {
            id_token: "test_id_token".to_string(),
            access_token: "test_access_token_12345".to_string(),
            refresh_token: "test_refresh_token_67890".to_string(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
            identity: Identity {
                email: "admin@example.com".to_string(),
                name: "Admin".to_string(),
                sub: "sub-1".to_string(),
            },
        }
    }

    #[test]
    fn test_obfuscation_roundtrip() {
        let original = b"Hello, World! This is a test.";
        let obfuscated = FileSessionStore::obfuscate(original);
        assert_ne!(original.as_slice(), obfuscated.as_slice());
        let recovered = FileSessionStore::obfuscate(&obfuscated);
        assert_eq!(original.as_slice(), recovered.as_slice());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path()).unwrap();
        assert!(store.load().unwrap().is_none());

        let session = session();
        store.store(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path()).unwrap();
        std::fs::write(store.session_file_path(), "%%% not base64 %%%").unwrap();

        assert!(store.load().unwrap().is_none());
        assert!(!store.session_file_path().exists());
    }

    #[test]
    fn test_session_file_is_not_plain_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path()).unwrap();
        store.store(&session()).unwrap();

        let raw = std::fs::read_to_string(store.session_file_path()).unwrap();
        assert!(!raw.contains("test_refresh_token_67890"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(store.load().unwrap().is_none());
        store.store(&session()).unwrap();
        assert!(store.load().unwrap().is_some());
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
