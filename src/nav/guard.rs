//! Navigation guard
//!
//! Decides, for a screen and the committed session state, whether to show
//! a loading indicator, redirect, or render. While the session is loading
//! no redirect is ever produced.

use super::routes::{public_redirect, Route};
use crate::auth::{allows, AccessPolicy, AuthState};
use tokio::sync::watch;
use tracing::debug;

/// Outcome of guarding a screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still resolving; show a loading indicator
    Loading,
    Redirect(Route),
    Render,
}

impl GuardDecision {
    pub fn is_final(&self) -> bool {
        !matches!(self, GuardDecision::Loading)
    }
}

/// Gatekeeper for guarded routes
pub struct NavigationGuard;

impl NavigationGuard {
    /// Decide for a policy-protected screen
    pub fn evaluate(state: &AuthState, policy: &AccessPolicy) -> GuardDecision {
        if state.is_loading() {
            return GuardDecision::Loading;
        }

        let identity = state.identity.as_ref();
        if identity.is_none() {
            return GuardDecision::Redirect(Route::Login);
        }
        if !allows(identity, policy) {
            return GuardDecision::Redirect(Route::Unauthorized);
        }
        GuardDecision::Render
    }

    /// Decide for any route, public or guarded
    pub fn visit(route: Route, state: &AuthState) -> GuardDecision {
        match route.policy() {
            Some(policy) => Self::evaluate(state, &policy),
            None => {
                if state.is_loading() && matches!(route, Route::Landing | Route::Login) {
                    return GuardDecision::Loading;
                }
                match public_redirect(route, state.identity.as_ref()) {
                    Some(target) => GuardDecision::Redirect(target),
                    None => GuardDecision::Render,
                }
            }
        }
    }

    /// Wait for loading to clear, then decide once
    pub async fn resolve(
        rx: &mut watch::Receiver<AuthState>,
        policy: &AccessPolicy,
    ) -> GuardDecision {
        let state = Self::settled(rx).await;
        Self::evaluate(&state, policy)
    }

    /// Wait for loading to clear, then decide once for a route
    pub async fn navigate(rx: &mut watch::Receiver<AuthState>, route: Route) -> GuardDecision {
        let state = Self::settled(rx).await;
        let decision = Self::visit(route, &state);
        debug!(route = %route, decision = ?decision, "Navigation resolved");
        decision
    }

    async fn settled(rx: &mut watch::Receiver<AuthState>) -> AuthState {
        let settled = rx.wait_for(|s| !s.is_loading()).await.map(|s| (*s).clone());
        match settled {
            Ok(state) => state,
            // Manager gone; decide on whatever was last committed
            Err(_) => rx.borrow().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Identity, Role, SessionPhase};

    fn state(identity: Option<Role>, loading: bool) -> AuthState {
        AuthState {
            phase: if identity.is_some() {
                SessionPhase::Authenticated
            } else {
                SessionPhase::Unauthenticated
            },
            identity: identity.map(|role| Identity {
                id: "u1".to_string(),
                email: "u1@example.com".to_string(),
                name: "User".to_string(),
                role,
                school_id: None,
            }),
            loading,
            settled_session: None,
        }
    }

    #[test]
    fn test_loading_never_redirects() {
        let fees = Route::Fees.policy().unwrap();
        assert_eq!(NavigationGuard::evaluate(&state(None, true), &fees), GuardDecision::Loading);
        assert_eq!(
            NavigationGuard::evaluate(&state(Some(Role::Teacher), true), &fees),
            GuardDecision::Loading
        );
    }

    #[test]
    fn test_decisions() {
        let fees = Route::Fees.policy().unwrap();
        assert_eq!(
            NavigationGuard::evaluate(&state(None, false), &fees),
            GuardDecision::Redirect(Route::Login)
        );
        assert_eq!(
            NavigationGuard::evaluate(&state(Some(Role::Teacher), false), &fees),
            GuardDecision::Redirect(Route::Unauthorized)
        );
        assert_eq!(
            NavigationGuard::evaluate(&state(Some(Role::Student), false), &fees),
            GuardDecision::Render
        );
    }

    #[test]
    fn test_visit_public_routes() {
        let signed_in = state(Some(Role::SchoolAdmin), false);
        assert_eq!(
            NavigationGuard::visit(Route::Login, &signed_in),
            GuardDecision::Redirect(Route::Dashboard)
        );
        assert_eq!(NavigationGuard::visit(Route::Unauthorized, &signed_in), GuardDecision::Render);
        assert_eq!(NavigationGuard::visit(Route::Login, &state(None, false)), GuardDecision::Render);
        assert_eq!(NavigationGuard::visit(Route::Login, &state(None, true)), GuardDecision::Loading);
        assert_eq!(NavigationGuard::visit(Route::NotFound, &state(None, true)), GuardDecision::Render);
    }

    #[tokio::test]
    async fn test_resolve_waits_for_loading() {
        let (tx, mut rx) = watch::channel(state(None, true));

        let waiter = tokio::spawn(async move {
            NavigationGuard::resolve(&mut rx, &AccessPolicy::all()).await
        });

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        tx.send_replace(state(Some(Role::Teacher), false));
        assert_eq!(waiter.await.unwrap(), GuardDecision::Render);
    }

    #[tokio::test]
    async fn test_resolve_after_sender_dropped() {
        let (tx, mut rx) = watch::channel(state(None, true));
        drop(tx);

        // Still loading when the manager went away; no final decision possible
        assert_eq!(
            NavigationGuard::resolve(&mut rx, &AccessPolicy::all()).await,
            GuardDecision::Loading
        );
    }
}
