//! Durable credential storage.
//!
//! The token pair is persisted as JSON at a fixed path
//! (`~/.orator/credentials.json`), read once at process start and removed
//! on logout. Nothing else is stored here.

use crate::api::TokenPair;
use std::fs;
use std::path::PathBuf;

/// File-backed store for the token pair
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Store at the default location (~/.orator/credentials.json)
    pub fn new() -> Self {
        Self {
            path: home_dir_or_fallback().join(".orator").join("credentials.json"),
        }
    }

    /// Store at an explicit path
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// The backing file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read the persisted token pair
    ///
    /// A missing or unreadable file yields `None`; a corrupt file is
    /// logged and treated the same.
    pub fn load(&self) -> Option<TokenPair> {
        let contents = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(tokens) => Some(tokens),
            Err(e) => {
                tracing::warn!("Ignoring corrupt credential file: {}", e);
                None
            }
        }
    }

    /// Persist the token pair, creating the parent directory if needed
    pub fn save(&self, tokens: &TokenPair) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create credential directory: {}", e))?;
        }

        let contents = serde_json::to_string_pretty(tokens)
            .map_err(|e| format!("Failed to serialise credentials: {}", e))?;

        fs::write(&self.path, contents)
            .map_err(|e| format!("Failed to write credential file: {}", e))?;

        tracing::debug!("Credentials saved to {}", self.path.display());
        Ok(())
    }

    /// Remove the persisted token pair, if present
    pub fn clear(&self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                tracing::warn!("Failed to remove credential file: {}", e);
            } else {
                tracing::debug!("Credential file removed");
            }
        }
    }
}

/// Get the home directory, falling back to /tmp if unavailable
fn home_dir_or_fallback() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        tracing::error!("Could not determine home directory, using /tmp");
        PathBuf::from("/tmp")
    })
}
