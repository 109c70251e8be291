//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The option store is opened before the listener binds

use thiserror::Error;

use crate::config::ConfigError;
use crate::keys::KeyStoreError;

/// Anything that stops the service from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("API key store: {0}")]
    KeyStore(#[from] KeyStoreError),

    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}
