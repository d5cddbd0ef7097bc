//! Route table, public redirects and the sidebar menu

use crate::auth::{allows, AccessPolicy, Identity, Role};
use std::fmt;

/// Logical screens of the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Login,
    Unauthorized,
    NotFound,
    Dashboard,
    Attendance,
    Fees,
    Assessments,
    Resources,
    Quizzes,
    Profile,
}

impl Route {
    /// Every route, public ones first
    pub const ALL: [Route; 11] = [
        Route::Landing,
        Route::Login,
        Route::Unauthorized,
        Route::NotFound,
        Route::Dashboard,
        Route::Attendance,
        Route::Fees,
        Route::Assessments,
        Route::Resources,
        Route::Quizzes,
        Route::Profile,
    ];

    /// Guarded routes in sidebar order
    pub const MENU: [Route; 7] = [
        Route::Dashboard,
        Route::Attendance,
        Route::Fees,
        Route::Assessments,
        Route::Resources,
        Route::Quizzes,
        Route::Profile,
    ];

    /// Resolve a path; unknown paths map to [`Route::NotFound`]
    pub fn from_path(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Route::Landing,
            "/login" => Route::Login,
            "/unauthorized" => Route::Unauthorized,
            "/dashboard" => Route::Dashboard,
            "/attendance" => Route::Attendance,
            "/fees" => Route::Fees,
            "/assessments" => Route::Assessments,
            "/resources" => Route::Resources,
            "/quizzes" => Route::Quizzes,
            "/profile" => Route::Profile,
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Unauthorized => "/unauthorized",
            Route::NotFound => "*",
            Route::Dashboard => "/dashboard",
            Route::Attendance => "/attendance",
            Route::Fees => "/fees",
            Route::Assessments => "/assessments",
            Route::Resources => "/resources",
            Route::Quizzes => "/quizzes",
            Route::Profile => "/profile",
        }
    }

    /// Sidebar label
    pub fn label(&self) -> &'static str {
        match self {
            Route::Landing => "Home",
            Route::Login => "Login",
            Route::Unauthorized => "Unauthorized",
            Route::NotFound => "Not Found",
            Route::Dashboard => "Dashboard",
            Route::Attendance => "Attendance",
            Route::Fees => "Fees",
            Route::Assessments => "Assessments",
            Route::Resources => "Resources",
            Route::Quizzes => "Quizzes",
            Route::Profile => "Profile",
        }
    }

    /// Roles allowed through the navigation guard; `None` for public routes
    pub fn policy(&self) -> Option<AccessPolicy> {
        match self {
            Route::Landing | Route::Login | Route::Unauthorized | Route::NotFound => None,
            Route::Fees => Some(AccessPolicy::only([
                Role::SuperAdmin,
                Role::SchoolAdmin,
                Role::Student,
            ])),
            Route::Dashboard
            | Route::Attendance
            | Route::Assessments
            | Route::Resources
            | Route::Quizzes
            | Route::Profile => Some(AccessPolicy::default()),
        }
    }

    pub fn is_guarded(&self) -> bool {
        self.policy().is_some()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Where a public route sends the visitor, if anywhere
///
/// Landing and Login bounce an authenticated identity to the dashboard.
pub fn public_redirect(route: Route, identity: Option<&Identity>) -> Option<Route> {
    match route {
        Route::Landing | Route::Login if identity.is_some() => Some(Route::Dashboard),
        _ => None,
    }
}

/// "Go home" target offered by the not-found screen
pub fn home_for(identity: Option<&Identity>) -> Route {
    match identity {
        Some(_) => Route::Dashboard,
        None => Route::Landing,
    }
}

/// Sidebar entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub route: Route,
    pub label: &'static str,
    pub href: &'static str,
}

/// Sidebar entries the identity may reach, in menu order
pub fn nav_items(identity: Option<&Identity>) -> Vec<NavItem> {
    Route::MENU
        .into_iter()
        .filter(|route| {
            route
                .policy()
                .is_some_and(|policy| allows(identity, &policy))
        })
        .map(|route| NavItem {
            route,
            label: route.label(),
            href: route.path(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            id: "u1".to_string(),
            email: "user@example.com".to_string(),
            name: "User".to_string(),
            role,
            school_id: Some("1".to_string()),
        }
    }

    #[test]
    fn test_path_round_trip() {
        for route in Route::ALL {
            if route != Route::NotFound {
                assert_eq!(Route::from_path(route.path()), route);
            }
        }
    }

    #[test]
    fn test_path_normalisation() {
        assert_eq!(Route::from_path("/fees/"), Route::Fees);
        assert_eq!(Route::from_path("/dashboard?tab=stats"), Route::Dashboard);
        assert_eq!(Route::from_path(""), Route::Landing);
        assert_eq!(Route::from_path("/grades"), Route::NotFound);
        assert_eq!(Route::from_path("/fees/123"), Route::NotFound);
    }

    #[test]
    fn test_public_routes_have_no_policy() {
        for route in [Route::Landing, Route::Login, Route::Unauthorized, Route::NotFound] {
            assert!(!route.is_guarded());
        }
        for route in Route::MENU {
            assert!(route.is_guarded());
        }
    }

    #[test]
    fn test_fees_excludes_teachers() {
        let policy = Route::Fees.policy().unwrap();
        assert!(policy.contains(Role::SuperAdmin));
        assert!(policy.contains(Role::SchoolAdmin));
        assert!(policy.contains(Role::Student));
        assert!(!policy.contains(Role::Teacher));

        assert_eq!(Route::Quizzes.policy().unwrap(), AccessPolicy::all());
    }

    #[test]
    fn test_nav_items_filtered_by_role() {
        let teacher = identity(Role::Teacher);
        let items: Vec<Route> = nav_items(Some(&teacher)).iter().map(|i| i.route).collect();
        assert_eq!(
            items,
            vec![
                Route::Dashboard,
                Route::Attendance,
                Route::Assessments,
                Route::Resources,
                Route::Quizzes,
                Route::Profile,
            ]
        );

        let student = identity(Role::Student);
        assert_eq!(nav_items(Some(&student)).len(), 7);
        assert_eq!(nav_items(Some(&student))[2].href, "/fees");

        assert!(nav_items(None).is_empty());
    }

    #[test]
    fn test_public_redirects() {
        let admin = identity(Role::SuperAdmin);
        assert_eq!(public_redirect(Route::Login, Some(&admin)), Some(Route::Dashboard));
        assert_eq!(public_redirect(Route::Landing, Some(&admin)), Some(Route::Dashboard));
        assert_eq!(public_redirect(Route::Unauthorized, Some(&admin)), None);
        assert_eq!(public_redirect(Route::Login, None), None);

        assert_eq!(home_for(Some(&admin)), Route::Dashboard);
        assert_eq!(home_for(None), Route::Landing);
    }
}
