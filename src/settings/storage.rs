//! Key-value persistence backends for settings.

use crate::error::{RestyleError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the settings directory.
pub const CONFIG_DIR_ENV: &str = "RESTYLE_CONFIG_DIR";

/// Persistence for serialized settings records.
pub trait SettingsStorage {
    /// Returns the record stored under `key`, or `None` if there is none.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous record.
    fn save(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Stores each record as `<key>.json` inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates a storage rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Opens the storage at [`FileStorage::default_location`].
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_location()?))
    }

    /// Returns `$RESTYLE_CONFIG_DIR`, else the platform config directory
    /// joined with `restyle`.
    pub fn default_location() -> Result<PathBuf> {
        if let Ok(custom_dir) = std::env::var(CONFIG_DIR_ENV) {
            if !custom_dir.is_empty() {
                return Ok(PathBuf::from(custom_dir));
            }
        }
        dirs::config_dir()
            .map(|dir| dir.join("restyle"))
            .ok_or_else(|| RestyleError::Storage("could not determine config directory".into()))
    }

    /// Returns the storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file that holds the record for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SettingsStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RestyleError::Storage(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            RestyleError::Storage(format!(
                "failed to create {}: {e}",
                self.dir.display()
            ))
        })?;
        let path = self.path_for(key);
        fs::write(&path, value).map_err(|e| {
            RestyleError::Storage(format!("failed to write {}: {e}", path.display()))
        })?;
        restrict_permissions(&path)
    }
}

/// Limits the record to owner read/write (0600); it holds API keys.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .map_err(|e| RestyleError::Storage(format!("failed to stat {}: {e}", path.display())))?
        .permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms).map_err(|e| {
        RestyleError::Storage(format!(
            "failed to set permissions on {}: {e}",
            path.display()
        ))
    })
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// In-process storage. Nothing outlives the value.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: HashMap<String, String>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage pre-populated with one record.
    pub fn with_record(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut records = HashMap::new();
        records.insert(key.into(), value.into());
        Self { records }
    }

    /// Returns the raw record under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.records.get(key).map(String::as_str)
    }
}

impl SettingsStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
