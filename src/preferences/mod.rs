//! Preference store: per-identifier opt-in flags.
//!
//! Three independent booleans per identifier, plus two process-wide
//! slots the vault uses internally: the last observed enrollment snapshot
//! and, on simulated devices, the plain fallback copy of each secret.
//!
//! All operations are synchronous and infallible from the caller's side.

pub mod substrate;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::platform::EnrollmentSnapshot;

pub use substrate::{
    default_preferences_path, open_default, shared_substrate, FileSubstrate, MemorySubstrate,
    PreferenceSubstrate, PREFERENCES_ENV,
};

const KEY_PREFIX: &str = "biovault";
const BASELINE_KEY: &str = "biovault.enrollment_snapshot";

#[derive(Debug, Clone, Copy)]
enum Flag {
    UseBiometrics,
    AskedUser,
    AddOnNextLogin,
}

impl Flag {
    const ALL: [Flag; 3] = [Flag::UseBiometrics, Flag::AskedUser, Flag::AddOnNextLogin];

    fn as_str(self) -> &'static str {
        match self {
            Self::UseBiometrics => "use_biometrics",
            Self::AskedUser => "asked_user",
            Self::AddOnNextLogin => "add_on_next_login",
        }
    }

    fn key(self, identifier: &str) -> String {
        format!("{KEY_PREFIX}.{}.{identifier}", self.as_str())
    }
}

fn fallback_secret_key(identifier: &str) -> String {
    format!("{KEY_PREFIX}.secret.{identifier}")
}

/// Snapshot of all three flags for one identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceFlags {
    pub use_biometrics: bool,
    pub asked_user: bool,
    pub add_on_next_login: bool,
}

/// Handle over a shared preference substrate. Cheap to clone.
#[derive(Clone)]
pub struct Preferences {
    substrate: Arc<dyn PreferenceSubstrate>,
}

impl Preferences {
    pub fn new(substrate: Arc<dyn PreferenceSubstrate>) -> Self {
        Self { substrate }
    }

    /// Preferences over the process-wide default substrate.
    pub fn shared() -> Self {
        Self::new(shared_substrate())
    }

    pub fn substrate(&self) -> &Arc<dyn PreferenceSubstrate> {
        &self.substrate
    }

    // ── Per-identifier flags ─────────────────────────────────────────
    //
    // An empty identifier names no slot: writes are dropped and reads
    // return `false`.

    fn get_flag(&self, flag: Flag, identifier: &str) -> bool {
        !identifier.is_empty() && self.substrate.get_bool(&flag.key(identifier))
    }

    fn set_flag(&self, flag: Flag, identifier: &str, value: bool) {
        if identifier.is_empty() {
            tracing::debug!(flag = flag.as_str(), "flag write for empty identifier ignored");
            return;
        }
        self.substrate.set_bool(&flag.key(identifier), value);
    }

    pub fn use_biometrics(&self, identifier: &str) -> bool {
        self.get_flag(Flag::UseBiometrics, identifier)
    }

    /// Turning biometrics off also clears any pending add-on-next-login.
    pub fn set_use_biometrics(&self, identifier: &str, value: bool) {
        self.set_flag(Flag::UseBiometrics, identifier, value);
        if !value {
            self.set_add_on_next_login(identifier, false);
        }
    }

    pub fn asked_user(&self, identifier: &str) -> bool {
        self.get_flag(Flag::AskedUser, identifier)
    }

    pub fn set_asked_user(&self, identifier: &str, value: bool) {
        self.set_flag(Flag::AskedUser, identifier, value);
    }

    pub fn add_on_next_login(&self, identifier: &str) -> bool {
        self.get_flag(Flag::AddOnNextLogin, identifier)
    }

    pub fn set_add_on_next_login(&self, identifier: &str, value: bool) {
        self.set_flag(Flag::AddOnNextLogin, identifier, value);
    }

    pub fn flags(&self, identifier: &str) -> PreferenceFlags {
        PreferenceFlags {
            use_biometrics: self.use_biometrics(identifier),
            asked_user: self.asked_user(identifier),
            add_on_next_login: self.add_on_next_login(identifier),
        }
    }

    /// Remove all three flags for `identifier`; they read back as `false`.
    pub fn clear(&self, identifier: &str) {
        if identifier.is_empty() {
            return;
        }
        for flag in Flag::ALL {
            self.substrate.remove(&flag.key(identifier));
        }
    }

    // ── Process-wide enrollment baseline ─────────────────────────────

    pub(crate) fn enrollment_baseline(&self) -> Option<EnrollmentSnapshot> {
        self.substrate
            .get_string(BASELINE_KEY)
            .and_then(|encoded| EnrollmentSnapshot::from_base64(&encoded))
    }

    pub(crate) fn set_enrollment_baseline(&self, snapshot: &EnrollmentSnapshot) {
        self.substrate.set_string(BASELINE_KEY, &snapshot.to_base64());
    }

    // ── Simulated-device secret fallback ─────────────────────────────

    pub(crate) fn fallback_secret(&self, identifier: &str) -> Option<String> {
        self.substrate.get_string(&fallback_secret_key(identifier))
    }

    pub(crate) fn set_fallback_secret(&self, identifier: &str, value: &str) {
        self.substrate.set_string(&fallback_secret_key(identifier), value);
    }

    pub(crate) fn remove_fallback_secret(&self, identifier: &str) {
        self.substrate.remove(&fallback_secret_key(identifier));
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self::shared()
    }
}
