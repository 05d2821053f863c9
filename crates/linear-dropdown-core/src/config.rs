use std::env;
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;

/// Overrides the per-user directory, e.g. to give each host its own state.
pub const HOME_ENV: &str = "LINEAR_DROPDOWN_HOME";

/// Locates the directory holding credentials and pagination cursors.
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    root: PathBuf,
}

impl ConfigLocator {
    /// `LINEAR_DROPDOWN_HOME` when set, otherwise the platform config directory.
    pub fn new() -> Result<Self, ConfigError> {
        let root = match env::var_os(HOME_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => ProjectDirs::from("app", "linear", "linear-dropdown")
                .ok_or(ConfigError::MissingProjectDirs)?
                .config_dir()
                .to_path_buf(),
        };
        Self::at(root)
    }

    /// Use `root` as the state directory, creating it user-only if missing.
    pub fn at(root: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&root).map_err(ConfigError::CreateDir)?;
        set_user_only_permissions(&root)?;
        Ok(Self { root })
    }

    pub fn credentials_file(&self, profile: &str) -> PathBuf {
        self.root
            .join(format!("credentials-{}.json", file_safe(profile)))
    }

    pub fn cursor_file(&self, session: &str) -> PathBuf {
        self.root.join(format!("cursor-{}.json", file_safe(session)))
    }
}

/// Profile and session names end up in file names.
fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn set_user_only_permissions(path: &Path) -> Result<(), ConfigError> {
    #[cfg(unix)]
    {
        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_mode(0o700);
        fs::set_permissions(path, permissions)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to determine configuration directory for linear-dropdown")]
    MissingProjectDirs,
    #[error("failed to create configuration directory: {0}")]
    CreateDir(#[source] std::io::Error),
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}
