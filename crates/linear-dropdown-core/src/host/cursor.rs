use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, ConfigLocator};

/// Errors raised by cursor storage backends.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("cursor store lock poisoned")]
    Poisoned,
}

/// Host-managed continuation token storage, scoped to one pagination session.
///
/// Values are opaque: whatever is `set` is handed back verbatim by `get`.
pub trait CursorStore {
    fn get(&self) -> Result<Option<String>, CursorError>;
    fn set(&self, cursor: &str) -> Result<(), CursorError>;
}

/// In-process cursor store, one per pagination session.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    cursor: Mutex<Option<String>>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cursor(cursor: impl Into<String>) -> Self {
        Self {
            cursor: Mutex::new(Some(cursor.into())),
        }
    }
}

impl CursorStore for MemoryCursorStore {
    fn get(&self) -> Result<Option<String>, CursorError> {
        let guard = self.cursor.lock().map_err(|_| CursorError::Poisoned)?;
        Ok(guard.clone())
    }

    fn set(&self, cursor: &str) -> Result<(), CursorError> {
        let mut guard = self.cursor.lock().map_err(|_| CursorError::Poisoned)?;
        *guard = Some(cursor.to_owned());
        Ok(())
    }
}

/// Cursor persisted as a small JSON file so sessions survive process restarts.
pub struct FileCursorStore {
    path: PathBuf,
    session: String,
}

impl FileCursorStore {
    pub fn new(locator: &ConfigLocator, session: impl Into<String>) -> Self {
        let session = session.into();
        Self {
            path: locator.cursor_file(&session),
            session,
        }
    }

    pub fn with_default_locator(session: impl Into<String>) -> Result<Self, CursorError> {
        Ok(Self::new(&ConfigLocator::new()?, session))
    }

    /// Forget the stored cursor so the next session starts from the first page.
    pub fn clear(&self) -> Result<(), CursorError> {
        match fs::remove_file(&self.path) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl CursorStore for FileCursorStore {
    fn get(&self) -> Result<Option<String>, CursorError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let envelope: CursorEnvelope = serde_json::from_str(&raw)?;
        Ok(Some(envelope.cursor))
    }

    fn set(&self, cursor: &str) -> Result<(), CursorError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let envelope = CursorEnvelope {
            version: 1,
            session: self.session.clone(),
            cursor: cursor.to_owned(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&envelope)?)?;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CursorEnvelope {
    version: u32,
    session: String,
    cursor: String,
}
