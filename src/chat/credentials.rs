//! API key sources for the remote completion service.
//!
//! A missing key is a normal state: the orchestrator answers locally.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Supplies the bearer token for the completion service, if one is configured.
pub trait CredentialStore: Send + Sync {
    /// The stored key; blank values count as absent.
    fn api_key(&self) -> Result<Option<String>>;
}

fn non_blank(key: &str) -> Option<String> {
    let trimmed = key.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ─────────────────────────────────────────────────────────────────
// Static
// ─────────────────────────────────────────────────────────────────

/// A key fixed at construction, typically from `[openai] api_key`.
#[derive(Debug, Clone, Default)]
pub struct StaticCredential {
    key: Option<String>,
}

impl StaticCredential {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self {
            key: non_blank(key.as_ref()),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

impl CredentialStore for StaticCredential {
    fn api_key(&self) -> Result<Option<String>> {
        Ok(self.key.clone())
    }
}

// ─────────────────────────────────────────────────────────────────
// File
// ─────────────────────────────────────────────────────────────────

/// A key kept in a single file, written with owner-only permissions on unix.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store `key`, replacing any previous one.
    pub fn set_key(&self, key: &str) -> Result<()> {
        let key = non_blank(key)
            .ok_or_else(|| Error::Config("API key must not be empty".to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let mut file = open_private(&self.path).map_err(|e| Error::IoWrite {
            path: self.path.clone(),
            source: e,
        })?;
        file.write_all(key.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .map_err(|e| Error::IoWrite {
                path: self.path.clone(),
                source: e,
            })?;

        info!(path = %self.path.display(), "API key stored");
        Ok(())
    }

    /// Remove the stored key. Returns whether one existed.
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).map_err(|e| Error::IoWrite {
            path: self.path.clone(),
            source: e,
        })?;
        info!(path = %self.path.display(), "API key removed");
        Ok(true)
    }
}

impl CredentialStore for FileCredentialStore {
    fn api_key(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| Error::IoRead {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(non_blank(&content))
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

// ─────────────────────────────────────────────────────────────────
// Chain
// ─────────────────────────────────────────────────────────────────

/// Asks each store in turn; the first key found wins.
#[derive(Default)]
pub struct CredentialChain {
    stores: Vec<Box<dyn CredentialStore>>,
}

impl CredentialChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, store: impl CredentialStore + 'static) -> Self {
        self.stores.push(Box::new(store));
        self
    }
}

impl CredentialStore for CredentialChain {
    fn api_key(&self) -> Result<Option<String>> {
        for (index, store) in self.stores.iter().enumerate() {
            if let Some(key) = store.api_key()? {
                debug!(source = index, "API key found");
                return Ok(Some(key));
            }
        }
        Ok(None)
    }
}
