//! Configuration sections.
//!
//! Reading the configuration file is left to the application; these types only
//! describe the sections this crate consumes and deserialize with any serde format.

use crate::constants::DEFAULT_TRUST_STORE_PATH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An error that may arise decoding or encoding a stored configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The stored bytes are not valid configuration JSON.
    #[error("invalid configuration JSON")]
    Json(#[from] serde_json::Error),
}

/// The `[x509]` settings section.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct X509Settings {
    #[serde(rename = "TRUST_STORE_PATH", default = "default_trust_store_path")]
    trust_store_path: PathBuf,
}

impl X509Settings {
    /// Creates settings pointing at the given trust store directory.
    pub fn new(trust_store_path: impl Into<PathBuf>) -> Self {
        Self {
            trust_store_path: trust_store_path.into(),
        }
    }

    /// Returns the directory holding the trusted root certificates.
    pub fn trust_store_path(&self) -> &Path {
        &self.trust_store_path
    }
}

impl Default for X509Settings {
    fn default() -> Self {
        Self {
            trust_store_path: default_trust_store_path(),
        }
    }
}

fn default_trust_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_TRUST_STORE_PATH)
}

/// Configuration of a client-certificate authentication source, as stored in the database.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ClientCertSourceConfig {
    /// Create an account on first sign-in when no account matches.
    pub auto_create_users: bool,
    /// Activate automatically created accounts.
    pub auto_activate_users: bool,
    /// Language assigned to automatically created accounts.
    pub default_language: String,
}

impl ClientCertSourceConfig {
    /// Decodes a stored configuration.
    ///
    /// Older rows hold the JSON object encoded a second time as a JSON string;
    /// both forms are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if neither form decodes.
    pub fn from_db(bytes: &[u8]) -> Result<Self, ConfigError> {
        match serde_json::from_slice(bytes) {
            Ok(config) => Ok(config),
            Err(e) if starts_with_string(bytes) => {
                let inner: String = serde_json::from_slice(bytes).map_err(|_| e)?;
                Ok(serde_json::from_str(&inner)?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Encodes the configuration for storage.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if serialization fails.
    pub fn to_db(&self) -> Result<Vec<u8>, ConfigError> {
        Ok(serde_json::to_vec(self)?)
    }
}

fn starts_with_string(bytes: &[u8]) -> bool {
    bytes.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'"')
}
