//! Authentication and authorization module for TeachFlow RBAC
//!
//! Provides role-based access control for portal users:
//! - Session manager owning the current identity
//! - Access predicate over an identity and an allowed-role set
//! - Development identities for demos outside production

mod access;
mod dev;
mod manager;
mod types;

pub use access::{allows, require_access, AccessError};
pub use dev::DevIdentityProvider;
pub use manager::{AuthState, LoginOutcome, SessionManager, SessionPhase, SubscriptionHandle};
pub use types::{AccessPolicy, Identity, ProfileRecord, Role, Session};
