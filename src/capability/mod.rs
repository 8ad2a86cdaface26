//! Capability prober.
//!
//! Answers which biometric modality the hardware supports, which one is
//! usable right now, and whether the enrolled biometric set changed since
//! the last observed baseline. Every answer is taken from live device
//! state. Failures to query the platform fail closed (`None` / `false`).

pub mod models;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::platform::{BiometricPolicy, BiometryKind, EnrollmentSnapshot, PolicyStatus};
use crate::preferences::Preferences;

pub use models::FaceModelList;

/// Biometric method supported or currently usable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiometricModality {
    #[default]
    None,
    Fingerprint,
    Face,
}

impl BiometricModality {
    pub fn is_available(self) -> bool {
        self != Self::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Fingerprint => "fingerprint",
            Self::Face => "face",
        }
    }
}

impl fmt::Display for BiometricModality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct CapabilityProber {
    policy: Arc<dyn BiometricPolicy>,
    /// `None` disables the static model fallback.
    face_models: Option<FaceModelList>,
}

impl CapabilityProber {
    pub fn new(policy: Arc<dyn BiometricPolicy>) -> Self {
        Self {
            policy,
            face_models: Some(FaceModelList::builtin()),
        }
    }

    pub fn from_settings(policy: Arc<dyn BiometricPolicy>, settings: &Settings) -> Self {
        let face_models = settings
            .model_allow_list
            .then(|| FaceModelList::with_extra(settings.extra_face_models.clone()));
        Self {
            policy,
            face_models,
        }
    }

    /// Replace (or with `None`, drop) the static face model fallback.
    pub fn with_face_models(mut self, face_models: Option<FaceModelList>) -> Self {
        self.face_models = face_models;
        self
    }

    /// Strongest modality the hardware can support, enrolled or not.
    pub fn supported_modality(&self) -> BiometricModality {
        let status = self.policy.evaluate_status();
        let modality = match status {
            PolicyStatus::NotAvailable | PolicyStatus::Failed(_) => BiometricModality::None,
            _ if self.has_face_hardware() => BiometricModality::Face,
            // A simulator cannot truthfully report unenrolled hardware.
            PolicyStatus::NotEnrolled if self.policy.is_simulated() => BiometricModality::None,
            _ => BiometricModality::Fingerprint,
        };
        tracing::trace!(?status, %modality, "supported modality");
        modality
    }

    /// Modality usable right now: enrolled and not locked out.
    pub fn configured_modality(&self) -> BiometricModality {
        match self.policy.evaluate_status() {
            PolicyStatus::Evaluable if self.has_face_hardware() => BiometricModality::Face,
            PolicyStatus::Evaluable => BiometricModality::Fingerprint,
            _ => BiometricModality::None,
        }
    }

    /// `true` once per actual change of the enrolled biometric set.
    ///
    /// Compares the live snapshot with the stored baseline and advances the
    /// baseline when they differ. Without a baseline nothing is recorded.
    pub fn settings_changed(&self, prefs: &Preferences) -> bool {
        let Some(current) = self.policy.enrollment_snapshot() else {
            return false;
        };
        let Some(baseline) = prefs.enrollment_baseline() else {
            return false;
        };
        if current == baseline {
            return false;
        }

        prefs.set_enrollment_baseline(&current);
        tracing::debug!("biometric enrollment changed since last baseline");
        true
    }

    pub fn is_virtual_device(&self) -> bool {
        self.policy.is_simulated()
    }

    pub(crate) fn current_enrollment(&self) -> Option<EnrollmentSnapshot> {
        self.policy.enrollment_snapshot()
    }

    fn has_face_hardware(&self) -> bool {
        match self.policy.biometry_kind() {
            BiometryKind::Face => true,
            BiometryKind::Fingerprint => false,
            BiometryKind::Unsupported | BiometryKind::None => self.model_is_face_capable(),
        }
    }

    fn model_is_face_capable(&self) -> bool {
        match (&self.face_models, self.policy.device_model()) {
            (Some(list), Some(model)) => list.contains(&model),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{status, ScriptedDevice, Sensor};
    use crate::preferences::MemorySubstrate;

    fn prober(device: ScriptedDevice) -> (Arc<ScriptedDevice>, CapabilityProber) {
        let device = Arc::new(device);
        (device.clone(), CapabilityProber::new(device))
    }

    #[test]
    fn no_hardware_is_none_everywhere() {
        let (_, p) = prober(ScriptedDevice::without_biometrics().with_model("iPhone10,3"));
        assert_eq!(p.supported_modality(), BiometricModality::None);
        assert_eq!(p.configured_modality(), BiometricModality::None);
    }

    #[test]
    fn unenrolled_fingerprint_sensor_is_still_supported() {
        let (_, p) = prober(ScriptedDevice::new(Sensor::Fingerprint));
        assert_eq!(p.supported_modality(), BiometricModality::Fingerprint);
        assert_eq!(p.configured_modality(), BiometricModality::None);
    }

    #[test]
    fn unenrolled_sensor_on_simulator_is_unsupported() {
        let (_, p) = prober(ScriptedDevice::new(Sensor::Fingerprint).virtualized());
        assert_eq!(p.supported_modality(), BiometricModality::None);
        assert!(p.is_virtual_device());
    }

    #[test]
    fn enrolled_simulator_reports_its_sensor() {
        let (_, p) = prober(ScriptedDevice::fingerprint().virtualized());
        assert_eq!(p.supported_modality(), BiometricModality::Fingerprint);
    }

    #[test]
    fn face_reported_dynamically() {
        let (_, p) = prober(ScriptedDevice::face());
        assert_eq!(p.supported_modality(), BiometricModality::Face);
        assert_eq!(p.configured_modality(), BiometricModality::Face);
    }

    #[test]
    fn allow_list_covers_inconclusive_query() {
        let (_, p) = prober(
            ScriptedDevice::new(Sensor::Face)
                .without_kind_query()
                .with_model("iPhone10,6"),
        );
        assert_eq!(p.supported_modality(), BiometricModality::Face);
    }

    #[test]
    fn allow_list_can_be_disabled() {
        let (_, p) = prober(
            ScriptedDevice::face()
                .without_kind_query()
                .with_model("iPhone10,6"),
        );
        let p = p.with_face_models(None);
        assert_eq!(p.supported_modality(), BiometricModality::Fingerprint);
    }

    #[test]
    fn lockout_hides_configured_modality() {
        let (device, p) = prober(ScriptedDevice::fingerprint());
        device.set_locked_out(true);
        assert_eq!(p.supported_modality(), BiometricModality::Fingerprint);
        assert_eq!(p.configured_modality(), BiometricModality::None);
    }

    #[test]
    fn query_failure_fails_closed() {
        let (device, p) = prober(ScriptedDevice::face());
        device.set_query_failure(Some(status::INTERNAL_COMPONENT));
        assert_eq!(p.supported_modality(), BiometricModality::None);
        assert_eq!(p.configured_modality(), BiometricModality::None);
    }

    #[test]
    fn settings_changed_needs_a_baseline() {
        let (device, p) = prober(ScriptedDevice::fingerprint());
        let prefs = Preferences::new(Arc::new(MemorySubstrate::new()));

        assert!(!p.settings_changed(&prefs));
        device.enroll("finger-2");
        assert!(!p.settings_changed(&prefs));
        assert!(prefs.enrollment_baseline().is_none());
    }

    #[test]
    fn settings_changed_reports_each_change_once() {
        let (device, p) = prober(ScriptedDevice::fingerprint());
        let prefs = Preferences::new(Arc::new(MemorySubstrate::new()));
        prefs.set_enrollment_baseline(&p.current_enrollment().unwrap());

        assert!(!p.settings_changed(&prefs));

        device.enroll("finger-2");
        assert!(p.settings_changed(&prefs));
        assert!(!p.settings_changed(&prefs));

        device.unenroll("finger-1");
        assert!(p.settings_changed(&prefs));
    }

    #[test]
    fn modality_display_names() {
        assert_eq!(BiometricModality::Face.to_string(), "face");
        assert!(!BiometricModality::None.is_available());
        assert!(BiometricModality::Fingerprint.is_available());
    }
}
