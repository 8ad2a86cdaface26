//! Integration test for the process-wide default preference substrate.
//!
//! Runs as its own test binary so the environment override is in place
//! before anything opens the shared substrate.

use std::sync::Arc;

use biovault::platform::{MemoryKeychain, ScriptedDevice};
use biovault::preferences::{
    default_preferences_path, open_default, FileSubstrate, PreferenceSubstrate, PREFERENCES_ENV,
};
use biovault::BioVault;
use tempfile::TempDir;

#[tokio::test]
async fn default_wiring_survives_relaunch() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("config").join("preferences.json");
    std::env::set_var(PREFERENCES_ENV, &path);
    assert_eq!(default_preferences_path().as_deref(), Some(path.as_path()));

    let device = Arc::new(ScriptedDevice::fingerprint());
    let keychain = Arc::new(MemoryKeychain::gated_by(device.clone()));

    let vault = BioVault::new(device.clone(), keychain.clone());
    vault.set_use_biometrics("alice", true);
    vault.set_secret("alice", "pw").await.unwrap();

    // Every default-wired vault in the process shares one substrate.
    let sibling = BioVault::new(device.clone(), keychain.clone());
    assert!(sibling.use_biometrics("alice"));

    let on_disk = FileSubstrate::open(&path).expect("preference file written");
    assert!(on_disk.get_bool("biovault.use_biometrics.alice"));
    assert!(on_disk.get_string("biovault.enrollment_snapshot").is_some());

    // A relaunched process opens the same default location.
    let relaunched = BioVault::new(device.clone(), keychain)
        .with_substrate(open_default(default_preferences_path().as_deref()));
    assert!(relaunched.use_biometrics("alice"));
    assert!(!relaunched.settings_changed());

    device.enroll("finger-2");
    assert!(relaunched.settings_changed());
}
