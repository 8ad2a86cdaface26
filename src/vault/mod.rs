//! Vault module — biometric-gated secret storage.
//!
//! This module provides:
//! - The secret store adapter over a platform `SecureStore` (`store`)
//! - The `BioVault` facade combining secrets, capability and flags (`facade`)

pub mod facade;
pub mod store;

pub use facade::BioVault;
pub use store::SecretStore;
