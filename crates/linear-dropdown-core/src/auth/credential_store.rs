use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::ConfigLocator;

use super::{AuthData, AuthError};

/// API keys stored per profile, one user-only JSON file each.
pub struct FileCredentialStore {
    locator: ConfigLocator,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredentials {
    profile: String,
    auth: AuthData,
}

impl FileCredentialStore {
    pub fn new(locator: ConfigLocator) -> Self {
        Self { locator }
    }

    pub fn with_default_locator() -> Result<Self, AuthError> {
        Ok(Self::new(ConfigLocator::new()?))
    }

    pub fn load(&self, profile: &str) -> Result<Option<AuthData>, AuthError> {
        let path = self.path(profile);
        if !path.exists() {
            return Ok(None);
        }
        let stored: StoredCredentials = serde_json::from_str(&fs::read_to_string(path)?)?;
        Ok(Some(stored.auth))
    }

    pub fn save(&self, profile: &str, auth: &AuthData) -> Result<(), AuthError> {
        if auth.api_key.trim().is_empty() {
            return Err(AuthError::EmptyApiKey);
        }
        let stored = StoredCredentials {
            profile: profile.to_owned(),
            auth: auth.clone(),
        };
        let path = self.path(profile);
        fs::write(&path, serde_json::to_string_pretty(&stored)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    /// Removing a profile that was never stored is not an error.
    pub fn delete(&self, profile: &str) -> Result<(), AuthError> {
        match fs::remove_file(self.path(profile)) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }

    fn path(&self, profile: &str) -> PathBuf {
        self.locator.credentials_file(profile)
    }
}
