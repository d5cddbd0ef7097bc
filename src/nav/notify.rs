//! User-visible notifications and navigation signals

use super::routes::Route;
use serde::Serialize;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        }
    }
}

/// Toast-style message for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title, description)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, description)
    }

    fn new(kind: NotificationKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Side effects the session manager asks the UI to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Notify(Notification),
    Navigate(Route),
}

impl UiEvent {
    pub fn as_notification(&self) -> Option<&Notification> {
        match self {
            UiEvent::Notify(n) => Some(n),
            UiEvent::Navigate(_) => None,
        }
    }

    pub fn as_navigation(&self) -> Option<Route> {
        match self {
            UiEvent::Navigate(route) => Some(*route),
            UiEvent::Notify(_) => None,
        }
    }
}
