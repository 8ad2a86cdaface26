//! Biometric-gated storage for a single secret per identifier.
//!
//! `BioVault` stores secrets in a platform secure store behind the
//! currently enrolled biometric set, keeps per-identifier opt-in flags in
//! a plain preference substrate, and reports biometric capability and
//! enrollment changes. Platform services are injected through the traits
//! in [`platform`].

pub mod capability;
pub mod config;
pub mod errors;
pub mod platform;
pub mod preferences;
pub mod vault;

pub use capability::BiometricModality;
pub use errors::{Result, SettingsError, StoreError};
pub use preferences::PreferenceFlags;
pub use vault::BioVault;
