//! OS keyring backend.
//!
//! Stores items in the operating system's credential store:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring / KDE Wallet)
//!
//! The `keyring` crate has no per-item biometric gate, so access control
//! is accepted but enforced only by the user's login session. Prompts are
//! not shown.

use zeroize::Zeroizing;

use super::{status, AccessControl, ItemKey, OsStatus, SecureStore};

#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringStore;

impl KeyringStore {
    pub fn new() -> Self {
        Self
    }

    fn entry(key: &ItemKey) -> Result<keyring::Entry, OsStatus> {
        keyring::Entry::new(&key.service, &key.account).map_err(to_status)
    }
}

/// Map a keyring failure to the closest raw status.
fn to_status(err: keyring::Error) -> OsStatus {
    match err {
        keyring::Error::NoEntry => status::ITEM_NOT_FOUND,
        keyring::Error::NoStorageAccess(_) => status::INTERACTION_NOT_ALLOWED,
        keyring::Error::PlatformFailure(_) => status::INTERNAL_COMPONENT,
        keyring::Error::Ambiguous(_) => status::DUPLICATE_ITEM,
        _ => status::PARAM,
    }
}

impl SecureStore for KeyringStore {
    fn insert(
        &self,
        key: &ItemKey,
        data: &[u8],
        _access: &AccessControl,
    ) -> Result<(), OsStatus> {
        let entry = Self::entry(key)?;
        match entry.get_secret() {
            Ok(_) => return Err(status::DUPLICATE_ITEM),
            Err(keyring::Error::NoEntry) => {}
            Err(e) => return Err(to_status(e)),
        }
        entry.set_secret(data).map_err(to_status)
    }

    fn read(&self, key: &ItemKey, _prompt: &str) -> Result<Zeroizing<Vec<u8>>, OsStatus> {
        let entry = Self::entry(key)?;
        entry.get_secret().map(Zeroizing::new).map_err(to_status)
    }

    fn delete(&self, key: &ItemKey) -> Result<(), OsStatus> {
        Self::entry(key)?.delete_credential().map_err(to_status)
    }
}
