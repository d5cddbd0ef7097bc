//! In-process auth service
//!
//! Stands in for the hosted backend: accounts, issued sessions, profile
//! rows and session-change notifications all live in memory. Faults can be
//! injected to exercise the failure paths of the session manager.

use super::{AuthService, AuthServiceError, LookupError, SessionEvent};
use crate::auth::{ProfileRecord, Session};
use crate::Secret;
use async_trait::async_trait;
use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine,
};
use chrono::{Duration, Utc};
use parking_lot::{Mutex, RwLock};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::{broadcast, Notify};

/// Capacity of the session-change notification channel
const EVENT_CAPACITY: usize = 64;

/// Default session lifetime (hours)
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
struct Account {
    user_id: String,
    /// SHA-256 digest of the password (base64)
    password_digest: String,
}

#[derive(Debug, Default)]
struct Faults {
    /// Every sign-in and session lookup fails with this message
    unreachable: Option<String>,
    /// Sign-out fails with this message
    sign_out_failure: Option<String>,
    /// Profile lookups for these users fail
    failing_profiles: HashSet<String>,
}

/// Holds profile lookups for one user until released
///
/// Dropping the gate without calling [`ProfileGate::release`] keeps any
/// waiting lookup parked.
#[derive(Debug)]
pub struct ProfileGate {
    user_id: String,
    notify: Arc<Notify>,
    gates: Arc<Mutex<HashMap<String, Arc<Notify>>>>,
}

impl ProfileGate {
    /// Let held lookups complete and stop holding new ones
    pub fn release(self) {
        self.gates.lock().remove(&self.user_id);
        self.notify.notify_waiters();
        self.notify.notify_one();
    }
}

/// In-memory implementation of [`AuthService`]
pub struct MemoryAuthService {
    /// Accounts by lowercased email
    accounts: RwLock<HashMap<String, Account>>,
    /// Profile rows by user ID
    profiles: RwLock<HashMap<String, ProfileRecord>>,
    /// Session persisted across "page loads"
    current: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
    faults: RwLock<Faults>,
    gates: Arc<Mutex<HashMap<String, Arc<Notify>>>>,
    session_ttl: Duration,
}

impl MemoryAuthService {
    /// Create an empty service
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            accounts: RwLock::new(HashMap::new()),
            profiles: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
            events,
            faults: RwLock::new(Faults::default()),
            gates: Arc::new(Mutex::new(HashMap::new())),
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        }
    }

    /// Set the lifetime of issued sessions
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Hash a password for storage
    fn digest(password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        STANDARD.encode(hasher.finalize())
    }

    /// Generate a random bearer token
    fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    // ==================== Directory ====================

    /// Register an account and its profile row, returning the user ID
    pub fn add_account(&self, email: &str, password: &str, profile: ProfileRecord) -> String {
        let user_id = uuid::Uuid::new_v4().to_string();
        let account = Account {
            user_id: user_id.clone(),
            password_digest: Self::digest(password),
        };

        self.accounts.write().insert(email.to_lowercase(), account);
        self.profiles.write().insert(user_id.clone(), profile);

        tracing::debug!(user = %user_id, "Registered account");
        user_id
    }

    /// Number of registered accounts
    pub fn account_count(&self) -> usize {
        self.accounts.read().len()
    }

    // ==================== Fault injection ====================

    /// Make sign-in and session lookups fail as if the service were down
    pub fn set_unreachable(&self, message: Option<&str>) {
        self.faults.write().unreachable = message.map(str::to_string);
    }

    /// Make sign-out fail
    pub fn set_sign_out_failure(&self, message: Option<&str>) {
        self.faults.write().sign_out_failure = message.map(str::to_string);
    }

    /// Make profile lookups for a user fail
    pub fn fail_profile(&self, user_id: &str) {
        self.faults.write().failing_profiles.insert(user_id.to_string());
    }

    /// Park profile lookups for a user until the gate is released
    pub fn hold_profile(&self, user_id: &str) -> ProfileGate {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .insert(user_id.to_string(), notify.clone());

        ProfileGate {
            user_id: user_id.to_string(),
            notify,
            gates: self.gates.clone(),
        }
    }

    /// End the current session from the service side
    pub fn revoke(&self) {
        let had_session = self.current.write().take().is_some();
        if had_session {
            tracing::info!("Session revoked by service");
            let _ = self.events.send(SessionEvent::revoked());
        }
    }

    fn check_reachable(&self) -> Result<(), AuthServiceError> {
        match &self.faults.read().unreachable {
            Some(message) => Err(AuthServiceError::Unreachable(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MemoryAuthService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthService for MemoryAuthService {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthServiceError> {
        self.check_reachable()?;

        let email = email.trim().to_lowercase();
        let account = self
            .accounts
            .read()
            .get(&email)
            .cloned()
            .ok_or(AuthServiceError::InvalidCredentials)?;

        let provided = Self::digest(password);
        let matches: bool = account
            .password_digest
            .as_bytes()
            .ct_eq(provided.as_bytes())
            .into();
        if !matches {
            return Err(AuthServiceError::InvalidCredentials);
        }

        let now = Utc::now();
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: account.user_id,
            email,
            access_token: Secret::new(Self::generate_token()),
            issued_at: now,
            expires_at: now + self.session_ttl,
        };

        *self.current.write() = Some(session.clone());
        let _ = self.events.send(SessionEvent::signed_in(session.clone()));

        tracing::debug!(user = %session.user_id, session = %session.id, "Issued session");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthServiceError> {
        if let Some(message) = self.faults.read().sign_out_failure.clone() {
            return Err(AuthServiceError::Service(message));
        }

        let had_session = self.current.write().take().is_some();
        if had_session {
            let _ = self.events.send(SessionEvent::signed_out());
        }
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthServiceError> {
        self.check_reachable()?;

        let mut current = self.current.write();
        if current.as_ref().is_some_and(Session::is_expired) {
            *current = None;
        }
        Ok(current.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<ProfileRecord, LookupError> {
        let gate = self.gates.lock().get(user_id).cloned();
        if let Some(notify) = gate {
            notify.notified().await;
        }

        if self.faults.read().failing_profiles.contains(user_id) {
            return Err(LookupError::Unreachable(format!(
                "profile lookup failed for {}",
                user_id
            )));
        }

        self.profiles
            .read()
            .get(user_id)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(user_id.to_string()))
    }
}
