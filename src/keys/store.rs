//! Site option persistence.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the option store.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("option store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("option store at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("option store lock poisoned")]
    Poisoned,

    #[error("option store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A JSON file of named string options, the equivalent of a site's
/// options table for the handful of values this service owns.
///
/// Every mutation is written through to disk before it returns.
#[derive(Debug, Clone)]
pub struct OptionStore {
    path: PathBuf,
    inner: Arc<Mutex<BTreeMap<String, String>>>,
}

impl OptionStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KeyStoreError> {
        let path = path.as_ref().to_path_buf();
        let options = if path.exists() {
            let file = File::open(&path).map_err(|source| KeyStoreError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                KeyStoreError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = ?path, options = options.len(), "Option store opened");
        Ok(Self {
            path,
            inner: Arc::new(Mutex::new(options)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Result<Option<String>, KeyStoreError> {
        Ok(self.lock()?.get(name).cloned())
    }

    pub fn set(&self, name: &str, value: &str) -> Result<(), KeyStoreError> {
        let mut options = self.lock()?;
        let mut next = options.clone();
        next.insert(name.to_string(), value.to_string());
        self.persist(&next)?;
        *options = next;
        Ok(())
    }

    /// Remove an option. Returns whether it existed.
    pub fn delete(&self, name: &str) -> Result<bool, KeyStoreError> {
        let mut options = self.lock()?;
        if !options.contains_key(name) {
            return Ok(false);
        }
        let mut next = options.clone();
        next.remove(name);
        self.persist(&next)?;
        *options = next;
        Ok(true)
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, KeyStoreError> {
        self.inner.lock().map_err(|_| KeyStoreError::Poisoned)
    }

    /// Write to a sibling temp file, then rename over the store.
    fn persist(&self, options: &BTreeMap<String, String>) -> Result<(), KeyStoreError> {
        let io_err = |source| KeyStoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let tmp = self.path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        {
            let file = File::create(&tmp).map_err(io_err)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, options).map_err(|source| {
                KeyStoreError::Corrupt {
                    path: tmp.clone(),
                    source,
                }
            })?;
            writer.flush().map_err(io_err)?;
        }
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}
