//! Secret store adapter.
//!
//! `SecretStore` files one secret per identifier in the platform secure
//! store under `(service, identifier)`, protected by the currently
//! enrolled biometric set. Store I/O runs on tokio's blocking pool so a
//! UI-driving task is never parked on a biometric prompt.
//!
//! On a simulated device there is no secure hardware to bind to, so the
//! secret is kept as a plain value in the preference substrate instead.

use std::sync::Arc;

use zeroize::{Zeroize, Zeroizing};

use crate::capability::CapabilityProber;
use crate::errors::{Result, StoreError};
use crate::platform::{status, AccessPolicy, ItemKey, SecureStore};
use crate::preferences::Preferences;

/// Async adapter over a `SecureStore`.
///
/// Every async method must be awaited inside a Tokio runtime.
#[derive(Clone)]
pub struct SecretStore {
    store: Arc<dyn SecureStore>,
    prober: CapabilityProber,
    service: String,
}

impl SecretStore {
    pub fn new(store: Arc<dyn SecureStore>, prober: CapabilityProber, service: &str) -> Self {
        Self {
            store,
            prober,
            service: service.to_string(),
        }
    }

    /// Secure-store namespace for every item this adapter writes.
    pub fn service(&self) -> &str {
        &self.service
    }

    fn item_key(&self, identifier: &str) -> ItemKey {
        ItemKey::new(&self.service, identifier)
    }

    /// Store `value` for `identifier`, replacing any previous secret.
    ///
    /// Replacement is delete-then-insert, not atomic: a failed insert leaves
    /// the slot empty. On success the current enrollment becomes the
    /// baseline for `CapabilityProber::settings_changed`.
    pub async fn set_secret(
        &self,
        prefs: &Preferences,
        identifier: &str,
        value: &str,
    ) -> Result<()> {
        validate_identifier(identifier)?;

        if self.prober.is_virtual_device() {
            prefs.set_fallback_secret(identifier, value);
            tracing::debug!(identifier, "secret stored in simulator fallback");
            return Ok(());
        }

        let store = Arc::clone(&self.store);
        let key = self.item_key(identifier);
        let data = Zeroizing::new(value.as_bytes().to_vec());
        run_blocking(move || replace_item(store.as_ref(), &key, &data)).await?;

        if let Some(snapshot) = self.prober.current_enrollment() {
            prefs.set_enrollment_baseline(&snapshot);
        }
        tracing::debug!(identifier, service = %self.service, "secret stored");
        Ok(())
    }

    /// Read the secret for `identifier`, running a biometric challenge that
    /// shows `prompt` to the user.
    pub async fn get_secret(
        &self,
        prefs: &Preferences,
        identifier: &str,
        prompt: &str,
    ) -> Result<String> {
        validate_identifier(identifier)?;

        if self.prober.is_virtual_device() {
            return prefs.fallback_secret(identifier).ok_or(StoreError::NotFound);
        }

        let store = Arc::clone(&self.store);
        let key = self.item_key(identifier);
        let prompt = prompt.to_string();
        let result = run_blocking(move || {
            let mut bytes = store.read(&key, &prompt).map_err(StoreError::from_status)?;
            decode_secret(std::mem::take(&mut *bytes))
        })
        .await;

        match &result {
            Ok(_) => tracing::debug!(identifier, "secret read"),
            Err(e) => tracing::debug!(identifier, error = %e, "secret read failed"),
        }
        result
    }

    /// Remove the secret for `identifier`. A missing secret is not an error.
    pub async fn delete_secret(&self, prefs: &Preferences, identifier: &str) -> Result<()> {
        validate_identifier(identifier)?;

        if self.prober.is_virtual_device() {
            prefs.remove_fallback_secret(identifier);
            return Ok(());
        }

        let store = Arc::clone(&self.store);
        let key = self.item_key(identifier);
        run_blocking(move || remove_item(store.as_ref(), &key)).await?;
        tracing::debug!(identifier, "secret deleted");
        Ok(())
    }
}

pub(crate) fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.is_empty() {
        return Err(StoreError::InvalidIdentifier);
    }
    Ok(())
}

/// Delete any existing item, then insert under a current-biometric-set policy.
fn replace_item(store: &dyn SecureStore, key: &ItemKey, data: &[u8]) -> Result<()> {
    remove_item(store, key)?;

    let access = store
        .access_control(AccessPolicy::BiometryCurrentSet)
        .ok_or(StoreError::AccessControlCreationFailed)?;

    store
        .insert(key, data, &access)
        .map_err(StoreError::PlatformStatus)
}

fn remove_item(store: &dyn SecureStore, key: &ItemKey) -> Result<()> {
    match store.delete(key) {
        Ok(()) | Err(status::ITEM_NOT_FOUND) => Ok(()),
        Err(code) => Err(StoreError::PlatformStatus(code)),
    }
}

/// Convert stored bytes to a `String`, wiping them if they are not UTF-8.
fn decode_secret(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| {
        let mut bad_bytes = e.into_bytes();
        bad_bytes.zeroize();
        StoreError::InvalidData("stored secret is not valid UTF-8".to_string())
    })
}

/// Run secure-store I/O on the blocking pool. Panics when called outside
/// a Tokio runtime.
///
/// A task that panics or is cancelled surfaces as an internal-component
/// status; it is never retried.
async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result,
        Err(e) => {
            tracing::debug!(error = %e, "secure store task did not complete");
            Err(StoreError::PlatformStatus(status::INTERNAL_COMPONENT))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{BiometricPolicy, MemoryKeychain, OsStatus, ScriptedDevice};
    use crate::preferences::MemorySubstrate;

    struct Fixture {
        device: Arc<ScriptedDevice>,
        keychain: Arc<MemoryKeychain>,
        prefs: Preferences,
        secrets: SecretStore,
    }

    fn fixture(device: ScriptedDevice) -> Fixture {
        let device = Arc::new(device);
        let keychain = Arc::new(MemoryKeychain::gated_by(device.clone()));
        let prober = CapabilityProber::new(device.clone());
        Fixture {
            secrets: SecretStore::new(keychain.clone(), prober, "test-service"),
            prefs: Preferences::new(Arc::new(MemorySubstrate::new())),
            device,
            keychain,
        }
    }

    #[tokio::test]
    async fn set_then_get_roundtrip() {
        let f = fixture(ScriptedDevice::fingerprint());
        f.secrets.set_secret(&f.prefs, "alice", "hunter2").await.unwrap();

        let value = f.secrets.get_secret(&f.prefs, "alice", "Unlock").await.unwrap();
        assert_eq!(value, "hunter2");
        assert_eq!(f.device.prompts(), vec!["Unlock"]);
    }

    #[tokio::test]
    async fn items_use_service_and_current_set_policy() {
        let f = fixture(ScriptedDevice::fingerprint());
        f.secrets.set_secret(&f.prefs, "alice", "pw").await.unwrap();

        let key = ItemKey::new("test-service", "alice");
        assert_eq!(
            f.keychain.policy_of(&key),
            Some(AccessPolicy::BiometryCurrentSet)
        );
    }

    #[tokio::test]
    async fn overwrite_replaces_value() {
        let f = fixture(ScriptedDevice::fingerprint());
        f.secrets.set_secret(&f.prefs, "alice", "one").await.unwrap();
        f.secrets.set_secret(&f.prefs, "alice", "two").await.unwrap();

        assert_eq!(f.keychain.len(), 1);
        let value = f.secrets.get_secret(&f.prefs, "alice", "p").await.unwrap();
        assert_eq!(value, "two");
    }

    #[tokio::test]
    async fn failed_overwrite_leaves_slot_empty() {
        let f = fixture(ScriptedDevice::fingerprint());
        f.secrets.set_secret(&f.prefs, "alice", "one").await.unwrap();

        f.keychain.set_write_failure(Some(status::INTERACTION_NOT_ALLOWED));
        let err = f.secrets.set_secret(&f.prefs, "alice", "two").await.unwrap_err();
        assert_eq!(err, StoreError::PlatformStatus(status::INTERACTION_NOT_ALLOWED));

        f.keychain.set_write_failure(None);
        let err = f.secrets.get_secret(&f.prefs, "alice", "p").await.unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }

    #[tokio::test]
    async fn rejected_access_control_is_reported() {
        let f = fixture(ScriptedDevice::fingerprint());
        f.keychain.reject_policy(AccessPolicy::BiometryCurrentSet);

        let err = f.secrets.set_secret(&f.prefs, "alice", "pw").await.unwrap_err();
        assert_eq!(err, StoreError::AccessControlCreationFailed);
        assert!(f.keychain.is_empty());
    }

    #[tokio::test]
    async fn successful_write_sets_enrollment_baseline() {
        let f = fixture(ScriptedDevice::fingerprint());
        assert!(f.prefs.enrollment_baseline().is_none());

        f.secrets.set_secret(&f.prefs, "alice", "pw").await.unwrap();
        assert_eq!(
            f.prefs.enrollment_baseline(),
            f.device.enrollment_snapshot()
        );
    }

    #[tokio::test]
    async fn prompt_failure_is_surfaced_verbatim() {
        let f = fixture(ScriptedDevice::face());
        f.secrets.set_secret(&f.prefs, "alice", "pw").await.unwrap();

        let cancel: OsStatus = status::USER_CANCELED;
        f.device.fail_next_prompt(cancel);
        let err = f.secrets.get_secret(&f.prefs, "alice", "p").await.unwrap_err();
        assert_eq!(err, StoreError::PlatformStatus(cancel));
        assert!(err.is_user_cancel());

        // No internal retry: the next explicit call succeeds.
        assert_eq!(f.secrets.get_secret(&f.prefs, "alice", "p").await.unwrap(), "pw");
    }

    #[tokio::test]
    async fn non_utf8_item_is_invalid_data() {
        let f = fixture(ScriptedDevice::fingerprint());
        let key = ItemKey::new("test-service", "alice");
        let access = f.keychain.access_control(AccessPolicy::BiometryAny).unwrap();
        f.keychain.insert(&key, &[0xff, 0xfe], &access).unwrap();

        let err = f.secrets.get_secret(&f.prefs, "alice", "p").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let f = fixture(ScriptedDevice::fingerprint());
        f.secrets.delete_secret(&f.prefs, "never-written").await.unwrap();

        f.secrets.set_secret(&f.prefs, "alice", "pw").await.unwrap();
        f.secrets.delete_secret(&f.prefs, "alice").await.unwrap();
        f.secrets.delete_secret(&f.prefs, "alice").await.unwrap();

        let err = f.secrets.get_secret(&f.prefs, "alice", "p").await.unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }

    #[tokio::test]
    async fn empty_identifier_is_rejected() {
        let f = fixture(ScriptedDevice::fingerprint());
        let err = f.secrets.set_secret(&f.prefs, "", "pw").await.unwrap_err();
        assert_eq!(err, StoreError::InvalidIdentifier);
        assert!(f.keychain.is_empty());
    }

    #[tokio::test]
    async fn simulator_falls_back_to_plain_preferences() {
        let f = fixture(ScriptedDevice::fingerprint().virtualized());
        f.secrets.set_secret(&f.prefs, "alice", "pw").await.unwrap();

        assert!(f.keychain.is_empty());
        assert!(f.prefs.enrollment_baseline().is_none());
        assert_eq!(f.secrets.get_secret(&f.prefs, "alice", "p").await.unwrap(), "pw");
        assert!(f.device.prompts().is_empty());

        f.secrets.delete_secret(&f.prefs, "alice").await.unwrap();
        let err = f.secrets.get_secret(&f.prefs, "alice", "p").await.unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }
}
