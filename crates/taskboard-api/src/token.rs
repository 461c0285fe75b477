// Persisted bearer credential.
//
// The token is written on login, read before every request, and removed
// on logout. Only the session layer writes it; the HTTP client only reads.

use std::fmt;
use std::sync::RwLock;

use secrecy::SecretString;

use crate::error::Error;

/// Fixed storage key for the bearer token.
pub const TOKEN_KEY: &str = "authToken";

/// Storage backend for the single credential token.
pub trait TokenStore: Send + Sync + fmt::Debug {
    /// Read the stored token, if any.
    fn load(&self) -> Result<Option<SecretString>, Error>;

    /// Persist a new token, replacing any previous one.
    fn store(&self, token: &SecretString) -> Result<(), Error>;

    /// Remove the stored token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), Error>;
}

/// Process-local token store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<SecretString>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(SecretString::from(token.into()))),
        }
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::TokenStore("token lock poisoned".into())
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SecretString>, Error> {
        Ok(self.token.read().map_err(poisoned)?.clone())
    }

    fn store(&self, token: &SecretString) -> Result<(), Error> {
        *self.token.write().map_err(poisoned)? = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.token.write().map_err(poisoned)? = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn memory_store_lifecycle() {
        let store = MemoryTokenStore::new();
        assert!(store.load().unwrap().is_none());

        store.store(&SecretString::from("abc".to_string())).unwrap();
        assert_eq!(store.load().unwrap().unwrap().expose_secret(), "abc");

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
