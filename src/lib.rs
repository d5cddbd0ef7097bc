//! TeachFlow - session and access control for a school portal
//!
//! TeachFlow keeps track of who is signed in to the portal and what they
//! may see. A [`SessionManager`] reconciles the hosted auth service's
//! session with the in-memory identity, and the access predicate gates
//! screens by role through the [`NavigationGuard`].

pub mod auth;
pub mod config;
pub mod nav;
pub mod service;

pub use auth::{AccessPolicy, Identity, Role, SessionManager};
pub use config::Config;
pub use nav::{GuardDecision, NavigationGuard, Route, UiEvent};
pub use service::{AuthService, MemoryAuthService};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Core error types for TeachFlow
#[derive(Error, Debug)]
pub enum TeachflowError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Auth service error: {0}")]
    AuthService(#[from] service::AuthServiceError),

    #[error("Profile lookup error: {0}")]
    Lookup(#[from] service::LookupError),

    #[error("Access denied: {0}")]
    Access(#[from] auth::AccessError),
}

/// A serializable secret string wrapper
///
/// `Debug` output is redacted.
#[derive(Debug, Clone)]
pub struct Secret(SecretString);

impl Secret {
    /// Create a new secret from a string
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// Expose the secret value
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<String> for Secret {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for Secret {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.expose_secret().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(secret.expose(), "hunter2");
        assert!(!format!("{:?}", secret).contains("hunter2"));
    }

    #[test]
    fn test_secret_serde() {
        let secret: Secret = serde_json::from_str("\"token\"").unwrap();
        assert_eq!(secret.expose(), "token");
        assert_eq!(serde_json::to_string(&secret).unwrap(), "\"token\"");
    }

    #[test]
    fn test_error_conversion() {
        let err: TeachflowError = service::AuthServiceError::InvalidCredentials.into();
        assert_eq!(err.to_string(), "Auth service error: Invalid login credentials");

        let err: TeachflowError = auth::AccessError::NotAuthenticated.into();
        assert!(matches!(err, TeachflowError::Access(_)));
    }
}
