use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::SettingsError;

/// Vault configuration, loaded from `.biovault.toml`.
///
/// Every field has a sensible default so the vault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Secure-store namespace every secret item is filed under.
    #[serde(default = "default_service")]
    pub service: String,

    /// Consult the static face-capable model list when the dynamic
    /// biometry query is inconclusive.
    #[serde(default = "default_model_allow_list")]
    pub model_allow_list: bool,

    /// Extra hardware model identifiers to treat as face-capable.
    #[serde(default)]
    pub extra_face_models: Vec<String>,

    /// Preference file (relative to the settings directory). When unset
    /// the process-wide shared substrate is used.
    #[serde(default)]
    pub preferences_file: Option<String>,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_service() -> String {
    "biovault".to_string()
}

fn default_model_allow_list() -> bool {
    true
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            service: default_service(),
            model_allow_list: default_model_allow_list(),
            extra_face_models: Vec::new(),
            preferences_file: None,
        }
    }
}

impl Settings {
    /// Name of the config file we look for.
    const FILE_NAME: &'static str = ".biovault.toml";

    /// Load settings from `<dir>/.biovault.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(dir: &Path) -> Result<Self, SettingsError> {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            SettingsError::Parse(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.service.is_empty() {
            return Err(SettingsError::Parse(format!(
                "{}: service cannot be empty",
                config_path.display()
            )));
        }

        Ok(settings)
    }

    /// Resolve the preference file path against `dir`, if one is set.
    pub fn preferences_path(&self, dir: &Path) -> Option<PathBuf> {
        self.preferences_file.as_ref().map(|file| dir.join(file))
    }
}

// ── Tests ────────────────────────────────────────────────────────────
