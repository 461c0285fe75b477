// ── Persisted token stores ──
//
// Both stores hold the single bearer token under `TOKEN_KEY`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use taskboard_api::{Error, TOKEN_KEY, TokenStore};

use crate::ConfigError;

/// Keyring service name for the stored token.
pub const KEYRING_SERVICE: &str = "taskboard";

// ── File ────────────────────────────────────────────────────────────

/// Token kept in a small JSON document: `{"authToken": "..."}`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, Error> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                Error::TokenStore(format!("corrupt token file {}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(io_error(&self.path, &e)),
        }
    }

    fn write(&self, doc: &BTreeMap<String, String>) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, &e))?;
        }
        let raw = serde_json::to_string_pretty(doc)
            .map_err(|e| Error::TokenStore(e.to_string()))?;
        std::fs::write(&self.path, raw).map_err(|e| io_error(&self.path, &e))
    }
}

fn io_error(path: &Path, err: &std::io::Error) -> Error {
    Error::TokenStore(format!("{}: {err}", path.display()))
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<SecretString>, Error> {
        Ok(self.read()?.remove(TOKEN_KEY).map(SecretString::from))
    }

    fn store(&self, token: &SecretString) -> Result<(), Error> {
        let mut doc = self.read()?;
        doc.insert(TOKEN_KEY.into(), token.expose_secret().to_owned());
        self.write(&doc)?;
        debug!(path = %self.path.display(), "token saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        let mut doc = self.read()?;
        if doc.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        if doc.is_empty() {
            std::fs::remove_file(&self.path).map_err(|e| io_error(&self.path, &e))?;
        } else {
            self.write(&doc)?;
        }
        debug!(path = %self.path.display(), "token removed");
        Ok(())
    }
}

// ── Keyring ─────────────────────────────────────────────────────────

/// Token kept in the operating-system keyring.
pub struct KeyringTokenStore {
    entry: keyring::Entry,
}

impl fmt::Debug for KeyringTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyringTokenStore")
            .field("service", &KEYRING_SERVICE)
            .field("user", &TOKEN_KEY)
            .finish()
    }
}

impl KeyringTokenStore {
    pub fn new() -> Result<Self, ConfigError> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, TOKEN_KEY)
            .map_err(|e| ConfigError::TokenStore(e.to_string()))?;
        Ok(Self { entry })
    }
}

fn keyring_error(err: &keyring::Error) -> Error {
    Error::TokenStore(format!("keyring: {err}"))
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<SecretString>, Error> {
        match self.entry.get_password() {
            Ok(secret) => Ok(Some(SecretString::from(secret))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(keyring_error(&e)),
        }
    }

    fn store(&self, token: &SecretString) -> Result<(), Error> {
        self.entry
            .set_password(token.expose_secret())
            .map_err(|e| keyring_error(&e))
    }

    fn clear(&self) -> Result<(), Error> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(keyring_error(&e)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn file_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested/session.json"));

        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();

        store.store(&SecretString::from("abc".to_owned())).unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc["authToken"], "abc");
        assert_eq!(store.load().unwrap().unwrap().expose_secret(), "abc");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn clear_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"authToken":"x","theme":"dark"}"#).unwrap();

        let store = FileTokenStore::new(&path);
        store.clear().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("theme"));
        assert!(!raw.contains("authToken"));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileTokenStore::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("corrupt token file"));
    }
}
