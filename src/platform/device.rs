//! Scriptable in-process device.
//!
//! `ScriptedDevice` implements `BiometricPolicy` over mutable state so a
//! host without biometric hardware (CI, desktop development) can drive
//! enrollment changes, lockout and prompt outcomes explicitly.

use std::collections::{BTreeSet, VecDeque};

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use super::{BiometricPolicy, BiometryKind, EnrollmentSnapshot, OsStatus, PolicyStatus};

/// Biometric sensor fitted to a scripted device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    Absent,
    Fingerprint,
    Face,
}

#[derive(Debug)]
struct DeviceState {
    sensor: Sensor,
    enrolled: BTreeSet<String>,
    locked_out: bool,
    simulated: bool,
    kind_query: bool,
    model: Option<String>,
    query_failure: Option<OsStatus>,
    prompt_failures: VecDeque<OsStatus>,
    prompts: Vec<String>,
}

pub struct ScriptedDevice {
    state: Mutex<DeviceState>,
}

impl ScriptedDevice {
    /// A device with the given sensor and nothing enrolled.
    pub fn new(sensor: Sensor) -> Self {
        Self {
            state: Mutex::new(DeviceState {
                sensor,
                enrolled: BTreeSet::new(),
                locked_out: false,
                simulated: false,
                kind_query: true,
                model: None,
                query_failure: None,
                prompt_failures: VecDeque::new(),
                prompts: Vec::new(),
            }),
        }
    }

    /// Fingerprint sensor with one enrolled finger.
    pub fn fingerprint() -> Self {
        let device = Self::new(Sensor::Fingerprint);
        device.enroll("finger-1");
        device
    }

    /// Face sensor with one enrolled face.
    pub fn face() -> Self {
        let device = Self::new(Sensor::Face);
        device.enroll("face-1");
        device
    }

    /// No biometric hardware at all.
    pub fn without_biometrics() -> Self {
        Self::new(Sensor::Absent)
    }

    /// Report the given hardware model identifier.
    pub fn with_model(self, model: &str) -> Self {
        self.state.lock().model = Some(model.to_string());
        self
    }

    /// Mark the device as simulated/virtual.
    pub fn virtualized(self) -> Self {
        self.state.lock().simulated = true;
        self
    }

    /// Make the dynamic biometry query unavailable, as on older platforms.
    pub fn without_kind_query(self) -> Self {
        self.state.lock().kind_query = false;
        self
    }

    pub fn enroll(&self, name: &str) {
        self.state.lock().enrolled.insert(name.to_string());
    }

    pub fn unenroll(&self, name: &str) {
        self.state.lock().enrolled.remove(name);
    }

    pub fn set_locked_out(&self, locked_out: bool) {
        self.state.lock().locked_out = locked_out;
    }

    /// Make every capability query fail with `status` until cleared.
    pub fn set_query_failure(&self, status: Option<OsStatus>) {
        self.state.lock().query_failure = status;
    }

    /// Queue a failure for the next biometric prompt.
    pub fn fail_next_prompt(&self, status: OsStatus) {
        self.state.lock().prompt_failures.push_back(status);
    }

    /// Prompts shown so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.state.lock().prompts.clone()
    }

    /// Run a biometric challenge showing `prompt`.
    ///
    /// Succeeds unless a failure was queued with `fail_next_prompt`.
    pub fn authenticate(&self, prompt: &str) -> Result<(), OsStatus> {
        let mut state = self.state.lock();
        state.prompts.push(prompt.to_string());
        match state.prompt_failures.pop_front() {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }
}

impl BiometricPolicy for ScriptedDevice {
    fn evaluate_status(&self) -> PolicyStatus {
        let state = self.state.lock();
        if let Some(status) = state.query_failure {
            return PolicyStatus::Failed(status);
        }
        if state.sensor == Sensor::Absent {
            return PolicyStatus::NotAvailable;
        }
        if state.enrolled.is_empty() {
            return PolicyStatus::NotEnrolled;
        }
        if state.locked_out {
            return PolicyStatus::LockedOut;
        }
        PolicyStatus::Evaluable
    }

    fn biometry_kind(&self) -> BiometryKind {
        let state = self.state.lock();
        if !state.kind_query {
            return BiometryKind::Unsupported;
        }
        match state.sensor {
            Sensor::Absent => BiometryKind::None,
            Sensor::Fingerprint => BiometryKind::Fingerprint,
            Sensor::Face => BiometryKind::Face,
        }
    }

    fn enrollment_snapshot(&self) -> Option<EnrollmentSnapshot> {
        let state = self.state.lock();
        if state.sensor == Sensor::Absent || state.query_failure.is_some() {
            return None;
        }
        let mut hasher = Sha256::new();
        for name in &state.enrolled {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
        }
        Some(EnrollmentSnapshot::from_bytes(hasher.finalize().to_vec()))
    }

    fn device_model(&self) -> Option<String> {
        self.state.lock().model.clone()
    }

    fn is_simulated(&self) -> bool {
        self.state.lock().simulated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::status;

    #[test]
    fn status_tracks_sensor_and_enrollment() {
        let device = ScriptedDevice::new(Sensor::Fingerprint);
        assert_eq!(device.evaluate_status(), PolicyStatus::NotEnrolled);

        device.enroll("thumb");
        assert_eq!(device.evaluate_status(), PolicyStatus::Evaluable);

        device.set_locked_out(true);
        assert_eq!(device.evaluate_status(), PolicyStatus::LockedOut);

        assert_eq!(
            ScriptedDevice::without_biometrics().evaluate_status(),
            PolicyStatus::NotAvailable
        );
    }

    #[test]
    fn snapshot_changes_with_enrolled_set() {
        let device = ScriptedDevice::fingerprint();
        let before = device.enrollment_snapshot().unwrap();
        assert_eq!(device.enrollment_snapshot().unwrap(), before);

        device.enroll("finger-2");
        let after = device.enrollment_snapshot().unwrap();
        assert_ne!(after, before);

        device.unenroll("finger-2");
        assert_eq!(device.enrollment_snapshot().unwrap(), before);
    }

    #[test]
    fn queued_prompt_failure_is_consumed_once() {
        let device = ScriptedDevice::face();
        device.fail_next_prompt(status::USER_CANCELED);

        assert_eq!(device.authenticate("first"), Err(status::USER_CANCELED));
        assert_eq!(device.authenticate("second"), Ok(()));
        assert_eq!(device.prompts(), vec!["first", "second"]);
    }

    #[test]
    fn kind_query_can_be_disabled() {
        let device = ScriptedDevice::face().without_kind_query();
        assert_eq!(device.biometry_kind(), BiometryKind::Unsupported);
    }
}
