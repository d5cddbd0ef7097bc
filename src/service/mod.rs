//! Hosted auth/database service interface
//!
//! The portal never talks to the backend directly; everything goes through
//! [`AuthService`] so the backend can be swapped for the in-process
//! [`MemoryAuthService`] in tests and demos.

mod memory;

pub use memory::{MemoryAuthService, ProfileGate};

use crate::auth::{ProfileRecord, Session};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors from sign-in and sign-out
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthServiceError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Auth service unreachable: {0}")]
    Unreachable(String),

    #[error("Auth service error: {0}")]
    Service(String),
}

/// Errors from profile lookups
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Profile has unknown role: {0}")]
    UnknownRole(String),

    #[error("Profile store unreachable: {0}")]
    Unreachable(String),
}

/// Why the service emitted a session-change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn,
    SignedOut,
    /// Session ended by the service (expiry, admin revocation)
    Revoked,
}

/// Session-change notification
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub change: SessionChange,
    /// Live session, or `None` when there no longer is one
    pub session: Option<Session>,
}

impl SessionEvent {
    pub fn signed_in(session: Session) -> Self {
        Self {
            change: SessionChange::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            change: SessionChange::SignedOut,
            session: None,
        }
    }

    pub fn revoked() -> Self {
        Self {
            change: SessionChange::Revoked,
            session: None,
        }
    }
}

/// Operations consumed from the hosted auth/database service
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Sign in with an email and password
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthServiceError>;

    /// End the current session
    async fn sign_out(&self) -> Result<(), AuthServiceError>;

    /// Session persisted from an earlier run, if any
    async fn current_session(&self) -> Result<Option<Session>, AuthServiceError>;

    /// Subscribe to session-change notifications
    ///
    /// The subscription lasts as long as the returned receiver is held.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    /// Look up the profile row for an account
    async fn fetch_profile(&self, user_id: &str) -> Result<ProfileRecord, LookupError>;
}
