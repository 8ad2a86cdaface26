//! In-memory secure store.
//!
//! Mirrors keychain semantics closely enough to exercise the vault:
//! duplicate inserts are rejected, missing items report
//! `ITEM_NOT_FOUND`, and when gated by a `ScriptedDevice` every read runs
//! a biometric challenge. Items written under
//! `AccessPolicy::BiometryCurrentSet` become unreadable once the device's
//! enrolled set changes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use zeroize::Zeroizing;

use super::device::ScriptedDevice;
use super::{
    status, AccessControl, AccessPolicy, BiometricPolicy, EnrollmentSnapshot, ItemKey, OsStatus,
    SecureStore,
};

struct Item {
    data: Zeroizing<Vec<u8>>,
    policy: AccessPolicy,
    /// Enrollment at write time, for `BiometryCurrentSet` items.
    bound_to: Option<EnrollmentSnapshot>,
}

#[derive(Default)]
pub struct MemoryKeychain {
    items: Mutex<HashMap<ItemKey, Item>>,
    gate: Option<Arc<ScriptedDevice>>,
    rejected_policies: Mutex<Vec<AccessPolicy>>,
    write_failure: Mutex<Option<OsStatus>>,
}

impl MemoryKeychain {
    /// An ungated store: reads never prompt.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose reads require a biometric challenge on `device`.
    pub fn gated_by(device: Arc<ScriptedDevice>) -> Self {
        Self {
            gate: Some(device),
            ..Self::default()
        }
    }

    /// Refuse to build access control for `policy`.
    pub fn reject_policy(&self, policy: AccessPolicy) {
        self.rejected_policies.lock().push(policy);
    }

    /// Make inserts fail with `status` until cleared.
    pub fn set_write_failure(&self, status: Option<OsStatus>) {
        *self.write_failure.lock() = status;
    }

    pub fn contains(&self, key: &ItemKey) -> bool {
        self.items.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Policy an item was stored under.
    pub fn policy_of(&self, key: &ItemKey) -> Option<AccessPolicy> {
        self.items.lock().get(key).map(|item| item.policy)
    }

    fn current_enrollment(&self) -> Option<EnrollmentSnapshot> {
        self.gate.as_ref().and_then(|d| d.enrollment_snapshot())
    }
}

impl SecureStore for MemoryKeychain {
    fn access_control(&self, policy: AccessPolicy) -> Option<AccessControl> {
        if self.rejected_policies.lock().contains(&policy) {
            return None;
        }
        Some(AccessControl::new(policy))
    }

    fn insert(
        &self,
        key: &ItemKey,
        data: &[u8],
        access: &AccessControl,
    ) -> Result<(), OsStatus> {
        if let Some(status) = *self.write_failure.lock() {
            return Err(status);
        }
        let bound_to = match access.policy() {
            AccessPolicy::BiometryCurrentSet => self.current_enrollment(),
            _ => None,
        };

        let mut items = self.items.lock();
        if items.contains_key(key) {
            return Err(status::DUPLICATE_ITEM);
        }
        items.insert(
            key.clone(),
            Item {
                data: Zeroizing::new(data.to_vec()),
                policy: access.policy(),
                bound_to,
            },
        );
        Ok(())
    }

    fn read(&self, key: &ItemKey, prompt: &str) -> Result<Zeroizing<Vec<u8>>, OsStatus> {
        let (data, bound_to) = {
            let items = self.items.lock();
            let item = items.get(key).ok_or(status::ITEM_NOT_FOUND)?;
            (item.data.clone(), item.bound_to.clone())
        };

        if let Some(device) = &self.gate {
            // Re-enrollment invalidates current-set items.
            if bound_to.is_some() && bound_to != device.enrollment_snapshot() {
                return Err(status::ITEM_NOT_FOUND);
            }
            device.authenticate(prompt)?;
        }

        Ok(data)
    }

    fn delete(&self, key: &ItemKey) -> Result<(), OsStatus> {
        match self.items.lock().remove(key) {
            Some(_) => Ok(()),
            None => Err(status::ITEM_NOT_FOUND),
        }
    }
}
