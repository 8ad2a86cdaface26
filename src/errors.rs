use thiserror::Error;

use crate::platform::OsStatus;

/// All errors a secret-store operation can surface.
///
/// Nothing is retried or swallowed: every variant reaches the immediate
/// caller exactly once.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Access control policy could not be created")]
    AccessControlCreationFailed,

    #[error("Invalid secret data: {0}")]
    InvalidData(String),

    #[error("No secret stored for this identifier")]
    NotFound,

    #[error("Identifier cannot be empty")]
    InvalidIdentifier,

    /// Raw platform status (user cancel, lockout, hardware error, ...).
    #[error("Secure store failed with status {0}")]
    PlatformStatus(OsStatus),
}

impl StoreError {
    /// Map a raw platform status, turning "item not found" into `NotFound`.
    pub fn from_status(status: OsStatus) -> Self {
        if status == crate::platform::status::ITEM_NOT_FOUND {
            Self::NotFound
        } else {
            Self::PlatformStatus(status)
        }
    }

    /// Returns the raw platform status, if this error carries one.
    pub fn status(&self) -> Option<OsStatus> {
        match self {
            Self::PlatformStatus(code) => Some(*code),
            _ => None,
        }
    }

    /// `true` when the user dismissed the biometric prompt.
    pub fn is_user_cancel(&self) -> bool {
        self.status() == Some(crate::platform::status::USER_CANCELED)
    }
}

/// Errors raised while loading configuration or a persisted substrate.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Config file error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for secret-store results.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::status;

    #[test]
    fn item_not_found_maps_to_not_found() {
        assert_eq!(
            StoreError::from_status(status::ITEM_NOT_FOUND),
            StoreError::NotFound
        );
    }

    #[test]
    fn other_statuses_pass_through_verbatim() {
        let err = StoreError::from_status(status::AUTH_FAILED);
        assert_eq!(err, StoreError::PlatformStatus(status::AUTH_FAILED));
        assert_eq!(err.status(), Some(status::AUTH_FAILED));
        assert!(!err.is_user_cancel());
        assert!(StoreError::from_status(status::USER_CANCELED).is_user_cancel());
    }
}
