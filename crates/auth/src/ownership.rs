//! Ownership guard for caller-supplied owner ids.
//!
//! The provider's row-level security is not modelled here, so the gateway checks
//! every claimed `user_id` against the authenticated identity before it issues a
//! provider call.
//!
//! - No IO
//! - No panics

use thiserror::Error;

use echoes_core::UserId;

use crate::Identity;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OwnershipError {
    #[error("forbidden: user id mismatch")]
    OwnerMismatch { claimed: String },
}

/// Reject a claimed owner id that is not the authenticated identity.
///
/// The claim is compared as a user id, so casing and surrounding whitespace do not
/// matter; anything that is not a user id at all is a mismatch.
pub fn assert_owner(claimed: &str, identity: &Identity) -> Result<(), OwnershipError> {
    match claimed.parse::<UserId>() {
        Ok(id) if id == identity.user_id() => Ok(()),
        _ => Err(OwnershipError::OwnerMismatch {
            claimed: claimed.to_string(),
        }),
    }
}
