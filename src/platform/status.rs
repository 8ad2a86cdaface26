//! Raw secure-store status codes.
//!
//! Values follow the Security framework's `OSStatus` numbering so hosts
//! bridging a real keychain can pass statuses through unchanged.

use super::OsStatus;

pub const SUCCESS: OsStatus = 0;
pub const PARAM: OsStatus = -50;
pub const USER_CANCELED: OsStatus = -128;
pub const INTERNAL_COMPONENT: OsStatus = -2070;
pub const NOT_AVAILABLE: OsStatus = -25291;
pub const AUTH_FAILED: OsStatus = -25293;
pub const DUPLICATE_ITEM: OsStatus = -25299;
pub const ITEM_NOT_FOUND: OsStatus = -25300;
pub const INTERACTION_NOT_ALLOWED: OsStatus = -25308;
