//! Platform collaborators.
//!
//! The vault never talks to an OS API directly. It consumes two traits:
//! - `BiometricPolicy`: can a biometric policy be evaluated, what biometry
//!   the hardware reports, and an opaque snapshot of current enrollment.
//! - `SecureStore`: namespace/account keyed blobs behind an access-control
//!   policy checked at read time.
//!
//! In-process implementations live here too: `ScriptedDevice` and
//! `MemoryKeychain` for development hosts and tests, and `KeyringStore`
//! (feature `keyring-store`) backed by the OS credential store.

pub mod device;
pub mod keychain;
pub mod status;

#[cfg(feature = "keyring-store")]
pub mod keyring;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

pub use device::{ScriptedDevice, Sensor};
pub use keychain::MemoryKeychain;

#[cfg(feature = "keyring-store")]
pub use self::keyring::KeyringStore;

/// Raw status code reported by the platform secure store.
pub type OsStatus = i32;

/// Outcome of asking the platform whether a biometric policy can be
/// evaluated right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyStatus {
    /// At least one biometric is enrolled and the sensor is usable.
    Evaluable,
    /// Hardware is present but nothing is enrolled.
    NotEnrolled,
    /// No biometric hardware, or the feature is disabled entirely.
    NotAvailable,
    /// Too many failed attempts; the sensor is locked until passcode entry.
    LockedOut,
    /// The query itself failed.
    Failed(OsStatus),
}

/// Biometry reported by the dynamic capability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometryKind {
    /// The platform version does not offer the query at all.
    Unsupported,
    None,
    Fingerprint,
    Face,
}

/// Opaque fingerprint of the currently enrolled biometric set.
///
/// Two snapshots are equal only if the enrolled set did not change.
#[derive(Debug, Clone, Eq)]
pub struct EnrollmentSnapshot(Vec<u8>);

impl EnrollmentSnapshot {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Encode for storage in a string-valued substrate.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    /// Decode a stored snapshot; returns `None` for malformed input.
    pub fn from_base64(encoded: &str) -> Option<Self> {
        BASE64.decode(encoded).ok().map(Self)
    }
}

impl PartialEq for EnrollmentSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

/// Rule the secure store enforces before releasing an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessPolicy {
    /// Live biometric check against the set enrolled at write time.
    /// Re-enrollment makes the item permanently inaccessible.
    BiometryCurrentSet,
    /// Live biometric check against any enrolled biometric.
    BiometryAny,
    /// Biometric or device passcode.
    UserPresence,
}

/// Access-control token produced by the store for a given policy.
///
/// Items are always bound to this device and only readable while a
/// device passcode is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControl {
    policy: AccessPolicy,
}

impl AccessControl {
    pub fn new(policy: AccessPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AccessPolicy {
        self.policy
    }
}

/// Namespace + account pair addressing one secure-store item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub service: String,
    pub account: String,
}

impl ItemKey {
    pub fn new(service: &str, account: &str) -> Self {
        Self {
            service: service.to_string(),
            account: account.to_string(),
        }
    }
}

/// Device biometric capability and enrollment state.
///
/// Every call reflects live device state; implementations must not cache.
pub trait BiometricPolicy: Send + Sync {
    /// Can a biometric policy be evaluated right now?
    fn evaluate_status(&self) -> PolicyStatus;

    /// Biometry type reported by the dynamic query.
    fn biometry_kind(&self) -> BiometryKind;

    /// Snapshot of the enrolled set, or `None` if unavailable.
    fn enrollment_snapshot(&self) -> Option<EnrollmentSnapshot>;

    /// Hardware model identifier (e.g. `"iPhone10,3"`), if known.
    fn device_model(&self) -> Option<String>;

    /// `true` when running on a simulated/virtual device.
    fn is_simulated(&self) -> bool;
}

/// Access-controlled key/value store for opaque blobs.
///
/// Implementations report failures as raw platform statuses. A missing
/// item must be reported as [`status::ITEM_NOT_FOUND`].
pub trait SecureStore: Send + Sync {
    /// Build an access-control token, or `None` if the platform rejects
    /// the requested policy.
    fn access_control(&self, policy: AccessPolicy) -> Option<AccessControl> {
        Some(AccessControl::new(policy))
    }

    /// Insert a new item. Fails with [`status::DUPLICATE_ITEM`] if one exists.
    fn insert(
        &self,
        key: &ItemKey,
        data: &[u8],
        access: &AccessControl,
    ) -> Result<(), OsStatus>;

    /// Read an item, showing `prompt` if a live check is required.
    fn read(&self, key: &ItemKey, prompt: &str) -> Result<Zeroizing<Vec<u8>>, OsStatus>;

    /// Remove an item.
    fn delete(&self, key: &ItemKey) -> Result<(), OsStatus>;
}
