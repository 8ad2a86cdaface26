//! Key/value substrates backing the preference store.
//!
//! Substrate writes are fail-silent: a value that cannot be persisted is
//! dropped with a warning rather than surfaced to the caller.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::errors::SettingsError;

/// Plain (non-secure) persisted key/value store supplied by the host.
pub trait PreferenceSubstrate: Send + Sync {
    fn get_string(&self, key: &str) -> Option<String>;

    fn set_string(&self, key: &str, value: &str);

    fn remove(&self, key: &str);

    /// Missing or unparseable values read as `false`.
    fn get_bool(&self, key: &str) -> bool {
        matches!(self.get_string(key).as_deref(), Some("true"))
    }

    fn set_bool(&self, key: &str, value: bool) {
        self.set_string(key, if value { "true" } else { "false" });
    }
}

/// Volatile substrate, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySubstrate {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemorySubstrate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl PreferenceSubstrate for MemorySubstrate {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set_string(&self, key: &str, value: &str) {
        self.values.write().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }
}

/// JSON-file substrate. The whole map is rewritten on every change.
#[derive(Debug)]
pub struct FileSubstrate {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileSubstrate {
    /// Open the substrate at `path`, starting empty if the file is missing.
    pub fn open(path: &Path) -> Result<Self, SettingsError> {
        let values = if path.exists() {
            let contents = fs::read_to_string(path)?;
            serde_json::from_str(&contents).map_err(|e| {
                SettingsError::Parse(format!("Failed to parse {}: {e}", path.display()))
            })?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) {
        if let Err(e) = write_atomic(&self.path, values) {
            tracing::warn!(path = %self.path.display(), error = %e, "preference write dropped");
        }
    }
}

/// Write to a temp file next to `path`, then rename over it.
fn write_atomic(path: &Path, values: &BTreeMap<String, String>) -> std::io::Result<()> {
    let bytes = serde_json::to_vec_pretty(values)?;

    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, &bytes)?;
    fs::rename(&tmp_path, path)
}

impl PreferenceSubstrate for FileSubstrate {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set_string(&self, key: &str, value: &str) {
        let mut values = self.values.write();
        values.insert(key.to_string(), value.to_string());
        self.persist(&values);
    }

    fn remove(&self, key: &str) {
        let mut values = self.values.write();
        if values.remove(key).is_some() {
            self.persist(&values);
        }
    }
}

/// Overrides the location of the default preference file.
pub const PREFERENCES_ENV: &str = "BIOVAULT_PREFERENCES";

/// Location of the default preference file: `$BIOVAULT_PREFERENCES` if
/// set, else `<config dir>/biovault/preferences.json`.
pub fn default_preferences_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(PREFERENCES_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("biovault").join("preferences.json"))
}

/// Open a `FileSubstrate` at `path`, creating its directory.
///
/// Falls back to a `MemorySubstrate` when there is no path or the file
/// cannot be opened. An unreadable file is left untouched.
pub fn open_default(path: Option<&Path>) -> Arc<dyn PreferenceSubstrate> {
    let Some(path) = path else {
        tracing::warn!("no config directory; preferences will not persist");
        return Arc::new(MemorySubstrate::new());
    };

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            tracing::warn!(path = %parent.display(), error = %e, "cannot create preference dir");
        }
    }

    match FileSubstrate::open(path) {
        Ok(substrate) => {
            tracing::debug!(path = %path.display(), "preferences opened");
            Arc::new(substrate)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "preferences will not persist");
            Arc::new(MemorySubstrate::new())
        }
    }
}

/// The process-wide default substrate, opened on first use at
/// [`default_preferences_path`].
pub fn shared_substrate() -> Arc<dyn PreferenceSubstrate> {
    static SHARED: OnceLock<Arc<dyn PreferenceSubstrate>> = OnceLock::new();
    SHARED
        .get_or_init(|| open_default(default_preferences_path().as_deref()))
        .clone()
}
