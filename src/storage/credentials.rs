// src/storage/credentials.rs
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, StorageError};

const APP_DIR: &str = "hog-price-extractor";
// Fixed key the credentials live under
const CREDENTIALS_FILE: &str = "googleCreds.json";

/// Google OAuth client configuration saved by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCreds {
    pub client_id: String,
}

impl GoogleCreds {
    pub fn is_configured(&self) -> bool {
        !self.client_id.trim().is_empty()
    }
}

/// Persists credentials in the per-user config directory.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at `<config dir>/hog-price-extractor/googleCreds.json`.
    pub fn default_location() -> Result<Self, AppError> {
        let dir = dirs::config_dir()
            .ok_or_else(|| AppError::Config("Could not determine the user config directory".to_string()))?;
        Ok(Self::at(dir.join(APP_DIR).join(CREDENTIALS_FILE)))
    }

    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads saved credentials. A missing or unreadable file means "not configured".
    pub fn load(&self) -> Option<GoogleCreds> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::error!("Could not read Google credentials from {}: {}", self.path.display(), e);
                return None;
            }
        };
        match serde_json::from_str::<GoogleCreds>(&data) {
            Ok(creds) => Some(creds),
            Err(e) => {
                tracing::error!("Could not parse Google credentials in {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Overwrites the saved credentials.
    pub fn save(&self, client_id: &str) -> Result<GoogleCreds, AppError> {
        let client_id = client_id.trim();
        if client_id.is_empty() {
            return Err(AppError::InputValidation("Google Client ID is required.".to_string()));
        }
        let creds = GoogleCreds {
            client_id: client_id.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(StorageError::IoError)?;
        }
        let data = serde_json::to_string_pretty(&creds)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&self.path, data).map_err(StorageError::IoError)?;

        tracing::info!("Saved Google credentials to {}", self.path.display());
        Ok(creds)
    }
}
