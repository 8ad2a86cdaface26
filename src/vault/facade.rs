//! `BioVault`, the public entry point.
//!
//! Composes the capability prober, the secret store adapter and the
//! preference store under one flat API keyed by identifier. Holds no
//! state of its own beyond the injected collaborators; identifiers are
//! independent and no cross-identifier locking is done.

use std::path::Path;
use std::sync::Arc;

use crate::capability::{BiometricModality, CapabilityProber};
use crate::config::Settings;
use crate::errors::{Result, SettingsError};
use crate::platform::{BiometricPolicy, SecureStore};
use crate::preferences::{FileSubstrate, PreferenceFlags, PreferenceSubstrate, Preferences};

use super::store::{validate_identifier, SecretStore};

pub struct BioVault {
    prober: CapabilityProber,
    secrets: SecretStore,
    prefs: Preferences,
}

impl BioVault {
    // ── Construction ─────────────────────────────────────────────────

    /// A vault with default settings over the process-wide substrate,
    /// which persists to [`default_preferences_path`].
    ///
    /// [`default_preferences_path`]: crate::preferences::default_preferences_path
    pub fn new(policy: Arc<dyn BiometricPolicy>, store: Arc<dyn SecureStore>) -> Self {
        Self::assemble(&Settings::default(), Preferences::shared(), policy, store)
    }

    /// A vault configured by `settings`.
    ///
    /// When `settings.preferences_file` is set, a `FileSubstrate` at that
    /// path (relative to `dir`) replaces the process-wide substrate.
    pub fn from_settings(
        settings: &Settings,
        dir: &Path,
        policy: Arc<dyn BiometricPolicy>,
        store: Arc<dyn SecureStore>,
    ) -> std::result::Result<Self, SettingsError> {
        let prefs = match settings.preferences_path(dir) {
            Some(path) => Preferences::new(Arc::new(FileSubstrate::open(&path)?)),
            None => Preferences::shared(),
        };
        Ok(Self::assemble(settings, prefs, policy, store))
    }

    /// A vault configured by `settings` over an explicit `substrate`. The
    /// process-wide substrate is never opened.
    pub fn with_preferences(
        settings: &Settings,
        substrate: Arc<dyn PreferenceSubstrate>,
        policy: Arc<dyn BiometricPolicy>,
        store: Arc<dyn SecureStore>,
    ) -> Self {
        Self::assemble(settings, Preferences::new(substrate), policy, store)
    }

    fn assemble(
        settings: &Settings,
        prefs: Preferences,
        policy: Arc<dyn BiometricPolicy>,
        store: Arc<dyn SecureStore>,
    ) -> Self {
        let prober = CapabilityProber::from_settings(policy, settings);
        let secrets = SecretStore::new(store, prober.clone(), &settings.service);
        Self {
            prober,
            secrets,
            prefs,
        }
    }

    /// Builder-style variant of `set_preference_substrate`.
    pub fn with_substrate(mut self, substrate: Arc<dyn PreferenceSubstrate>) -> Self {
        self.set_preference_substrate(substrate);
        self
    }

    /// Route flags, the enrollment baseline and simulator secrets through
    /// `substrate` from now on.
    pub fn set_preference_substrate(&mut self, substrate: Arc<dyn PreferenceSubstrate>) {
        self.prefs = Preferences::new(substrate);
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn prober(&self) -> &CapabilityProber {
        &self.prober
    }

    // ── Secrets ──────────────────────────────────────────────────────
    //
    // These must be awaited inside a Tokio runtime: secure-store calls run
    // on `spawn_blocking`, which panics without one.

    /// Store `value` for `identifier`. Requires a Tokio runtime.
    pub async fn set_secret(&self, identifier: &str, value: &str) -> Result<()> {
        self.secrets.set_secret(&self.prefs, identifier, value).await
    }

    /// Resolves once the user has passed (or failed) the biometric check.
    /// Requires a Tokio runtime.
    pub async fn get_secret(&self, identifier: &str, prompt: &str) -> Result<String> {
        self.secrets.get_secret(&self.prefs, identifier, prompt).await
    }

    /// Remove the secret for `identifier`; missing is not an error.
    /// Requires a Tokio runtime.
    pub async fn delete_secret(&self, identifier: &str) -> Result<()> {
        self.secrets.delete_secret(&self.prefs, identifier).await
    }

    /// Clear all flags for `identifier` and delete its secret. Requires a
    /// Tokio runtime.
    ///
    /// An empty identifier fails with `InvalidIdentifier` before anything
    /// is cleared.
    pub async fn reset(&self, identifier: &str) -> Result<()> {
        validate_identifier(identifier)?;
        self.prefs.clear(identifier);
        self.secrets.delete_secret(&self.prefs, identifier).await?;
        tracing::debug!(identifier, "identifier reset");
        Ok(())
    }

    // ── Capability ───────────────────────────────────────────────────

    pub fn supported_modality(&self) -> BiometricModality {
        self.prober.supported_modality()
    }

    pub fn configured_modality(&self) -> BiometricModality {
        self.prober.configured_modality()
    }

    /// See `CapabilityProber::settings_changed`.
    pub fn settings_changed(&self) -> bool {
        self.prober.settings_changed(&self.prefs)
    }

    pub fn is_simulated_environment(&self) -> bool {
        self.prober.is_virtual_device()
    }

    /// `true` if enrollment changed and any of `identifiers` relies on
    /// biometrics, meaning the user must confirm consent again.
    ///
    /// The enrollment check runs once, so the baseline advances at most
    /// once per call.
    pub fn biometrics_invalidated<S: AsRef<str>>(&self, identifiers: &[S]) -> bool {
        if !self.settings_changed() {
            return false;
        }
        identifiers
            .iter()
            .any(|id| self.prefs.use_biometrics(id.as_ref()))
    }

    // ── Preference flags ─────────────────────────────────────────────
    //
    // Empty identifiers read as `false` and writes to them are ignored.

    pub fn use_biometrics(&self, identifier: &str) -> bool {
        self.prefs.use_biometrics(identifier)
    }

    /// Turning biometrics off also clears add-on-next-login.
    pub fn set_use_biometrics(&self, identifier: &str, value: bool) {
        self.prefs.set_use_biometrics(identifier, value);
    }

    pub fn asked_user(&self, identifier: &str) -> bool {
        self.prefs.asked_user(identifier)
    }

    pub fn set_asked_user(&self, identifier: &str, value: bool) {
        self.prefs.set_asked_user(identifier, value);
    }

    pub fn add_on_next_login(&self, identifier: &str) -> bool {
        self.prefs.add_on_next_login(identifier)
    }

    pub fn set_add_on_next_login(&self, identifier: &str, value: bool) {
        self.prefs.set_add_on_next_login(identifier, value);
    }

    pub fn flags(&self, identifier: &str) -> PreferenceFlags {
        self.prefs.flags(identifier)
    }
}
