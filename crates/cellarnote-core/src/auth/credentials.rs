//! Persisted access/refresh token pair.
//!
//! The pair is always stored as one unit (a single keyring secret or a
//! single file), so a reader can never observe one token without the other.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

#[cfg(feature = "keyring-storage")]
use keyring::Entry;

use crate::config::ClientConfig;

/// Service name used for keyring storage
const KEYRING_SERVICE: &str = "cellarnote";
/// Username used for the keyring entry holding both tokens
const KEYRING_USER: &str = "tokens";
/// Credentials file name for file-based storage
const CREDENTIALS_FILE: &str = ".credentials";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            issued_at: Some(Utc::now()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() || self.refresh_token.trim().is_empty() {
            anyhow::bail!("access and refresh tokens must both be present");
        }
        Ok(())
    }
}

// Tokens never show up in logs or panic messages
impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Durable storage for the credential pair.
///
/// `save` overwrites both tokens at once and `clear` removes both at once.
/// Clearing an empty store is not an error.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<CredentialPair>>;
    fn save(&self, pair: &CredentialPair) -> Result<()>;
    fn clear(&self) -> Result<()>;

    /// Human-readable location, for status output
    fn describe(&self) -> String;
}

// ============================================================================
// Keyring-based storage
// ============================================================================

#[cfg(feature = "keyring-storage")]
pub struct KeyringTokenStore {
    service: String,
}

#[cfg(feature = "keyring-storage")]
impl KeyringTokenStore {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, KEYRING_USER).context("Failed to create keyring entry")
    }
}

#[cfg(feature = "keyring-storage")]
impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "keyring-storage")]
impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<CredentialPair>> {
        match self.entry()?.get_password() {
            Ok(json) => {
                let pair: CredentialPair = serde_json::from_str(&json)
                    .context("Failed to parse token pair from keychain")?;
                Ok(Some(pair))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read token pair from keychain"),
        }
    }

    fn save(&self, pair: &CredentialPair) -> Result<()> {
        pair.validate()?;
        let json = serde_json::to_string(pair).context("Failed to serialize token pair")?;
        self.entry()?
            .set_password(&json)
            .context("Failed to store token pair in keychain")?;
        debug!(service = %self.service, "Token pair saved to keychain");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token pair from keychain"),
        }
    }

    fn describe(&self) -> String {
        format!("OS keychain (service '{}')", self.service)
    }
}

// ============================================================================
// File-based storage
// ============================================================================

pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the cellarnote config directory.
    pub fn in_config_dir() -> Result<Self> {
        Ok(Self::new(ClientConfig::config_dir()?.join(CREDENTIALS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the credentials file and its temporary siblings.
    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<CredentialPair>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).context("Failed to read credentials file")?;
        let pair: CredentialPair =
            serde_json::from_str(&contents).context("Failed to parse credentials file")?;
        Ok(Some(pair))
    }

    fn save(&self, pair: &CredentialPair) -> Result<()> {
        pair.validate()?;
        let dir = self.dir();
        fs::create_dir_all(dir).context("Failed to create credentials directory")?;
        let json = serde_json::to_string(pair).context("Failed to serialize token pair")?;

        // Each save writes its own temp file; the rename replaces both tokens
        // in one step and the last rename wins
        let mut tmp = NamedTempFile::new_in(dir)
            .context("Failed to create temporary credentials file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))
                .context("Failed to restrict credentials file permissions")?;
        }
        tmp.write_all(json.as_bytes())
            .context("Failed to write credentials file")?;
        tmp.as_file()
            .sync_all()
            .context("Failed to flush credentials file")?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .context("Failed to replace credentials file")?;

        debug!(path = %self.path.display(), "Token pair saved to file");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to delete credentials file"),
        }
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

// ============================================================================
// In-memory storage
// ============================================================================

/// Process-local store, for tests and embedders that persist elsewhere.
#[derive(Default)]
pub struct MemoryTokenStore {
    pair: Mutex<Option<CredentialPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: CredentialPair) -> Self {
        Self {
            pair: Mutex::new(Some(pair)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<CredentialPair>> {
        Ok(self
            .pair
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, pair: &CredentialPair) -> Result<()> {
        pair.validate()?;
        *self.pair.lock().unwrap_or_else(PoisonError::into_inner) = Some(pair.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.pair.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

/// Platform keychain when available, otherwise a file in the config directory.
pub fn default_store() -> Result<Box<dyn TokenStore>> {
    #[cfg(feature = "keyring-storage")]
    {
        Ok(Box::new(KeyringTokenStore::new()))
    }
    #[cfg(not(feature = "keyring-storage"))]
    {
        Ok(Box::new(FileTokenStore::in_config_dir()?))
    }
}
