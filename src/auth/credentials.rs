use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Identity carried on every request: a login token, a guest session, or both.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    pub token: Option<SecretString>,
    pub guest_session_id: Option<String>,
}

impl Credentials {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(SecretString::from(token.to_string())),
            guest_session_id: None,
        }
    }
}

pub trait CredentialStore: Send + Sync {
    fn load(&self) -> AppResult<Credentials>;
    fn save(&self, credentials: &Credentials) -> AppResult<()>;
    fn clear(&self) -> AppResult<()>;
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<Credentials>,
}

impl MemoryCredentialStore {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Mutex::new(credentials),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> AppResult<Credentials> {
        let credentials = self
            .credentials
            .lock()
            .map_err(|_| AppError::Storage("credential lock poisoned".to_string()))?;
        Ok(credentials.clone())
    }

    fn save(&self, credentials: &Credentials) -> AppResult<()> {
        let mut current = self
            .credentials
            .lock()
            .map_err(|_| AppError::Storage("credential lock poisoned".to_string()))?;
        *current = credentials.clone();
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        self.save(&Credentials::default())
    }
}

// On-disk shape; SecretString is never serialized directly.
#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct StoredCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    guest_session_id: Option<String>,
}

/// Keeps credentials in a JSON file between runs of the CLI.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> AppResult<Credentials> {
        if !self.path.exists() {
            return Ok(Credentials::default());
        }

        let raw = fs::read_to_string(&self.path)?;
        let stored: StoredCredentials = serde_json::from_str(&raw)
            .map_err(|e| AppError::Storage(format!("corrupt credentials file: {}", e)))?;

        Ok(Credentials {
            token: stored.token.map(SecretString::from),
            guest_session_id: stored.guest_session_id,
        })
    }

    fn save(&self, credentials: &Credentials) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let stored = StoredCredentials {
            token: credentials
                .token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            guest_session_id: credentials.guest_session_id.clone(),
        };

        fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
        log::debug!("Saved credentials to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
