//! API key lifecycle: show, regenerate, remove on uninstall.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::keys::store::{KeyStoreError, OptionStore};

/// Option name the connector plugin stores its API key under.
pub const API_KEY_OPTION: &str = "iwc_api_key";

/// Length of generated keys.
pub const API_KEY_LENGTH: usize = 32;

/// Manages the site API key held in an [`OptionStore`].
#[derive(Debug, Clone)]
pub struct ApiKeyManager {
    store: OptionStore,
}

impl ApiKeyManager {
    pub fn new(store: OptionStore) -> Self {
        Self { store }
    }

    /// The stored key, if any.
    pub fn current(&self) -> Result<Option<String>, KeyStoreError> {
        self.store.get(API_KEY_OPTION)
    }

    /// The stored key, generating one first when none exists.
    pub fn ensure(&self) -> Result<String, KeyStoreError> {
        match self.current()? {
            Some(key) => Ok(key),
            None => {
                tracing::info!("No API key stored, generating one");
                self.regenerate()
            }
        }
    }

    /// Replace the key with a freshly generated one.
    pub fn regenerate(&self) -> Result<String, KeyStoreError> {
        let key = generate_key();
        self.store.set(API_KEY_OPTION, &key)?;
        tracing::info!(path = ?self.store.path(), "API key regenerated");
        Ok(key)
    }

    /// Run a key operation on the blocking pool. Writes go through
    /// `std::fs`, which must stay off the async workers.
    pub async fn run_blocking<T, F>(&self, op: F) -> Result<T, KeyStoreError>
    where
        F: FnOnce(&ApiKeyManager) -> Result<T, KeyStoreError> + Send + 'static,
        T: Send + 'static,
    {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || op(&manager)).await?
    }

    /// Delete the key option. Returns whether a key was stored.
    pub fn uninstall(&self) -> Result<bool, KeyStoreError> {
        let existed = self.store.delete(API_KEY_OPTION)?;
        tracing::info!(existed, "API key option deleted");
        Ok(existed)
    }
}

/// Random lowercase alphanumeric key.
pub fn generate_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(API_KEY_LENGTH)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}
