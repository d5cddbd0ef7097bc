//! Session manager for TeachFlow
//!
//! Owns the current [`Identity`] and reconciles it with the auth service:
//! startup resolution, login (with the development fallback), logout and
//! session-change notifications. Every result that commits identity is
//! tagged with a generation; results whose generation has been superseded
//! are dropped.

use super::access::allows;
use super::dev::DevIdentityProvider;
use super::types::{AccessPolicy, Identity, Session};
use crate::config::Config;
use crate::nav::{Notification, Route, UiEvent};
use crate::service::{AuthService, LookupError, SessionEvent};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lifecycle of the session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing resolved yet
    Uninitialized,
    /// Startup resolution in progress
    Resolving,
    Unauthenticated,
    /// Login in progress
    Authenticating,
    Authenticated,
}

/// Committed session state as seen by readers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub phase: SessionPhase,
    pub identity: Option<Identity>,
    pub loading: bool,
    /// Last session whose outcome is known: its profile lookup finished
    /// (successfully or not) or the session ended
    pub settled_session: Option<String>,
}

impl AuthState {
    fn initial() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            identity: None,
            loading: true,
            settled_session: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Uninitialized counts as loading
    pub fn is_loading(&self) -> bool {
        self.loading || self.phase == SessionPhase::Uninitialized
    }
}

/// How a login attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Signed in with the auth service
    Service,
    /// Signed in through the development identity provider
    Development,
    /// Signed in with the service, but no identity was resolved
    Unresolved,
    /// Refused; an error notification was emitted
    Rejected,
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Service | LoginOutcome::Development)
    }
}

/// Generation bookkeeping, checked and committed under one lock
#[derive(Debug, Default)]
struct Tracking {
    generation: u64,
    /// Session the current generation resolves
    session_id: Option<String>,
}

struct Inner {
    service: Arc<dyn AuthService>,
    dev: Option<DevIdentityProvider>,
    welcome: String,
    settle_timeout: Duration,
    state: watch::Sender<AuthState>,
    tracking: Mutex<Tracking>,
    events: mpsc::UnboundedSender<UiEvent>,
    subscribed: AtomicBool,
    stale_discards: AtomicU64,
}

/// Handle to the session state
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Create a manager and the receiver for its UI events
    pub fn new(
        service: Arc<dyn AuthService>,
        config: &Config,
    ) -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(AuthState::initial());
        let dev = DevIdentityProvider::from_config(config);
        if dev.is_some() {
            info!(environment = ?config.app.environment, "Development identities enabled");
        }

        let manager = Self {
            inner: Arc::new(Inner {
                service,
                dev,
                welcome: format!("Welcome to {}", config.app.name),
                settle_timeout: config.session.login_settle_timeout,
                state,
                tracking: Mutex::new(Tracking::default()),
                events,
                subscribed: AtomicBool::new(false),
                stale_discards: AtomicU64::new(0),
            }),
        };
        (manager, rx)
    }

    /// Start consuming session-change notifications
    ///
    /// Returns `None` if a subscription is already running. The
    /// subscription lasts until the handle is dropped or shut down.
    pub fn start(&self) -> Option<SubscriptionHandle> {
        if self.inner.subscribed.swap(true, Ordering::SeqCst) {
            warn!("Session subscription already running");
            return None;
        }

        // Subscribe before spawning so no notification is missed
        let mut rx = self.inner.service.subscribe();
        let manager = self.clone();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => manager.handle_event(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session notifications dropped");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Session notification stream closed");
                        break;
                    }
                }
            }
        });

        Some(SubscriptionHandle {
            task: Some(task),
            inner: Arc::clone(&self.inner),
        })
    }

    /// Resolve a session persisted by the auth service
    ///
    /// Failures are logged and leave the identity absent. Loading is
    /// cleared on every path.
    pub async fn bootstrap(&self) {
        let generation = self.inner.tracking.lock().generation;
        self.inner.state.send_modify(|s| {
            if s.phase == SessionPhase::Uninitialized {
                s.phase = SessionPhase::Resolving;
            }
            s.loading = true;
        });

        match self.inner.service.current_session().await {
            Ok(Some(session)) => {
                debug!(session = %session.id, user = %session.user_id, "Resolving existing session");
                let result = self.lookup_identity(&session).await;
                self.inner.commit_lookup(generation, &session, result);
            }
            Ok(None) => debug!("No existing session"),
            Err(e) => warn!(error = %e, "Failed to query existing session"),
        }

        self.inner.finish_loading();
    }

    /// Sign in, falling back to development identities where enabled
    ///
    /// On a service sign-in the identity is populated by the session
    /// subscription; this waits (bounded) for that to settle before
    /// navigating to the dashboard.
    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            self.inner.emit(UiEvent::Notify(Notification::error(
                "Form incomplete",
                "Please enter both email and password.",
            )));
            return LoginOutcome::Rejected;
        }

        let mut state_rx = self.inner.state.subscribe();
        self.inner.state.send_modify(|s| {
            s.loading = true;
            s.phase = SessionPhase::Authenticating;
        });

        let outcome = match self.inner.service.sign_in(email, password).await {
            Ok(session) => {
                info!(user = %session.user_id, session = %session.id, "Signed in");
                self.wait_settled(&mut state_rx, &session.id).await;

                let resolved = self
                    .inner
                    .state
                    .borrow()
                    .identity
                    .as_ref()
                    .is_some_and(|identity| identity.id == session.user_id);
                if resolved {
                    self.inner.emit(UiEvent::Notify(Notification::success(
                        "Login successful",
                        self.inner.welcome.as_str(),
                    )));
                    self.inner.emit(UiEvent::Navigate(Route::Dashboard));
                    LoginOutcome::Service
                } else {
                    warn!(session = %session.id, "Signed in but no identity was resolved");
                    self.inner.emit(UiEvent::Notify(Notification::error(
                        "Login failed",
                        "Your profile could not be loaded.",
                    )));
                    LoginOutcome::Unresolved
                }
            }
            Err(e) => match self.inner.dev.as_ref().and_then(|d| d.resolve(email, password)) {
                Some(identity) => {
                    info!(user = %identity.id, role = %identity.role, "Signed in with development identity");
                    self.inner.commit_local(identity);
                    self.inner.emit(UiEvent::Notify(Notification::success(
                        "Login successful",
                        self.inner.welcome.as_str(),
                    )));
                    self.inner.emit(UiEvent::Navigate(Route::Dashboard));
                    LoginOutcome::Development
                }
                None => {
                    warn!(error = %e, "Login failed");
                    self.inner
                        .emit(UiEvent::Notify(Notification::error("Login failed", e.to_string())));
                    LoginOutcome::Rejected
                }
            },
        };

        self.inner.finish_loading();
        outcome
    }

    /// Sign out and clear the identity
    ///
    /// The identity is cleared even if the service refuses.
    pub async fn logout(&self) {
        let result = self.inner.service.sign_out().await;
        self.inner.clear();

        match result {
            Ok(()) => {
                info!("Signed out");
                self.inner.emit(UiEvent::Notify(Notification::success(
                    "Logged out",
                    "You have been successfully logged out.",
                )));
            }
            Err(e) => {
                warn!(error = %e, "Sign-out failed, cleared local session");
                self.inner
                    .emit(UiEvent::Notify(Notification::error("Logout failed", e.to_string())));
            }
        }
        self.inner.emit(UiEvent::Navigate(Route::Login));
    }

    /// Check the current identity against a policy
    pub fn check_access(&self, policy: &AccessPolicy) -> bool {
        allows(self.inner.state.borrow().identity.as_ref(), policy)
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.state.borrow().identity.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.state.borrow().phase
    }

    /// Copy of the committed state
    pub fn snapshot(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    /// Observe state changes
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Number of lookup results dropped because they were superseded
    pub fn stale_discards(&self) -> u64 {
        self.inner.stale_discards.load(Ordering::Relaxed)
    }

    fn handle_event(&self, event: SessionEvent) {
        debug!(change = ?event.change, "Session change");

        let Some(session) = event.session else {
            self.inner.clear();
            return;
        };

        let generation = {
            let mut tracking = self.inner.tracking.lock();
            tracking.generation += 1;
            tracking.session_id = Some(session.id.clone());
            tracking.generation
        };

        let manager = self.clone();
        tokio::spawn(async move {
            let result = manager.lookup_identity(&session).await;
            manager.inner.commit_lookup(generation, &session, result);
        });
    }

    async fn lookup_identity(&self, session: &Session) -> Result<Identity, LookupError> {
        let profile = self.inner.service.fetch_profile(&session.user_id).await?;
        Identity::from_profile(session, profile)
    }

    async fn wait_settled(&self, rx: &mut watch::Receiver<AuthState>, session_id: &str) {
        let settled = rx.wait_for(|s| s.settled_session.as_deref() == Some(session_id));
        match tokio::time::timeout(self.inner.settle_timeout, settled).await {
            Ok(Ok(_)) => {}
            Ok(Err(_)) => debug!("State channel closed while waiting for session"),
            Err(_) => warn!(
                session = %session_id,
                timeout_ms = self.inner.settle_timeout.as_millis() as u64,
                "Session not resolved before timeout"
            ),
        }
    }
}

impl Inner {
    fn emit(&self, event: UiEvent) {
        if self.events.send(event).is_err() {
            debug!("UI event receiver dropped");
        }
    }

    /// Commit a lookup result if its generation is still current
    fn commit_lookup(&self, generation: u64, session: &Session, result: Result<Identity, LookupError>) {
        let mut tracking = self.tracking.lock();
        if tracking.generation != generation {
            self.stale_discards.fetch_add(1, Ordering::Relaxed);
            debug!(
                session = %session.id,
                generation,
                current = tracking.generation,
                "Discarding superseded profile lookup"
            );
            return;
        }
        tracking.session_id = Some(session.id.clone());

        self.state.send_modify(|s| {
            match result {
                Ok(identity) => {
                    info!(user = %identity.id, role = %identity.role, "Identity resolved");
                    s.identity = Some(identity);
                    s.phase = SessionPhase::Authenticated;
                }
                Err(e) => {
                    warn!(user = %session.user_id, error = %e, "Profile lookup failed");
                    s.identity = None;
                    if s.phase != SessionPhase::Authenticating {
                        s.phase = SessionPhase::Unauthenticated;
                    }
                }
            }
            s.settled_session = Some(session.id.clone());
        });
    }

    /// Install an identity that did not come from the service
    fn commit_local(&self, identity: Identity) {
        let mut tracking = self.tracking.lock();
        tracking.generation += 1;
        tracking.session_id = None;

        self.state.send_modify(|s| {
            s.identity = Some(identity);
            s.phase = SessionPhase::Authenticated;
            s.settled_session = None;
        });
    }

    fn clear(&self) {
        let mut tracking = self.tracking.lock();
        tracking.generation += 1;
        let ended = tracking.session_id.take();

        self.state.send_modify(|s| {
            if s.identity.take().is_some() {
                info!("Identity cleared");
            }
            if !matches!(s.phase, SessionPhase::Uninitialized | SessionPhase::Resolving | SessionPhase::Authenticating) {
                s.phase = SessionPhase::Unauthenticated;
            }
            // An ended session is settled: nothing more will resolve it
            s.settled_session = ended;
        });
    }

    /// Supersede every lookup still in flight
    fn release_subscription(&self) {
        let generation = {
            let mut tracking = self.tracking.lock();
            tracking.generation += 1;
            tracking.generation
        };
        self.subscribed.store(false, Ordering::SeqCst);
        debug!(generation, "Session subscription released");
    }

    fn finish_loading(&self) {
        self.state.send_modify(|s| {
            s.loading = false;
            s.phase = if s.identity.is_some() {
                SessionPhase::Authenticated
            } else {
                SessionPhase::Unauthenticated
            };
        });
    }
}

/// Keeps the session subscription alive
pub struct SubscriptionHandle {
    task: Option<JoinHandle<()>>,
    inner: Arc<Inner>,
}

impl SubscriptionHandle {
    /// Stop the subscription and wait for its task to end
    pub async fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        self.inner.release_subscription();
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.inner.release_subscription();
        }
    }
}
