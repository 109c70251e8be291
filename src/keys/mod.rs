//! API key management.
//!
//! The connector plugin on the WordPress side authenticates REST calls with
//! a single site option, `iwc_api_key`. This module owns that option:
//! - store.rs keeps site options in a JSON file
//! - manager.rs shows, regenerates and deletes (uninstall) the key

pub mod manager;
pub mod store;

pub use manager::{ApiKeyManager, API_KEY_OPTION};
pub use store::{KeyStoreError, OptionStore};
