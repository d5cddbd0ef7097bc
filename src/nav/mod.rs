//! Navigation for the TeachFlow portal
//!
//! Provides:
//! - The route table with per-route access policies
//! - The navigation guard that gates screens on the session state
//! - Role-specific page fragments and dashboard cards
//! - Notifications and navigation signals emitted to the UI

mod guard;
mod notify;
mod routes;
mod views;

pub use guard::{GuardDecision, NavigationGuard};
pub use notify::{Notification, NotificationKind, UiEvent};
pub use routes::{home_for, nav_items, public_redirect, NavItem, Route};
pub use views::{can_upload_resources, dashboard_cards, DashboardCard, RoleView};
