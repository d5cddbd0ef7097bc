//! Access checks for protected screens and UI branches
//!
//! Provides functions for:
//! - Deciding whether an identity may see a protected surface
//! - Turning a denied check into a typed error

use super::types::{AccessPolicy, Identity, Role};
use thiserror::Error;

/// Access errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Role '{role}' is not allowed (requires one of: {allowed})")]
    Forbidden { role: Role, allowed: AccessPolicy },
}

/// Check whether an identity may see a surface guarded by `policy`
///
/// Absent identities are never allowed.
pub fn allows(identity: Option<&Identity>, policy: &AccessPolicy) -> bool {
    match identity {
        Some(identity) => policy.contains(identity.role),
        None => false,
    }
}

/// Require access, returning the identity on success
pub fn require_access<'a>(
    identity: Option<&'a Identity>,
    policy: &AccessPolicy,
) -> Result<&'a Identity, AccessError> {
    let identity = identity.ok_or(AccessError::NotAuthenticated)?;

    if policy.contains(identity.role) {
        Ok(identity)
    } else {
        Err(AccessError::Forbidden {
            role: identity.role,
            allowed: policy.clone(),
        })
    }
}
