//! Identity and role types for TeachFlow RBAC
//!
//! Provides:
//! - Role enum for the four portal roles
//! - AccessPolicy for the set of roles allowed on a screen or UI branch
//! - Session, ProfileRecord and Identity as exchanged with the auth service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::service::LookupError;
use crate::Secret;

/// Roles a portal user can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Top-level administrator across all schools
    SuperAdmin,
    /// Administrator of a single school
    SchoolAdmin,
    /// Instructor within a school
    Teacher,
    /// Learner within a school
    Student,
}

impl Role {
    /// Every role, in menu/display order
    pub const ALL: [Role; 4] = [
        Role::SuperAdmin,
        Role::SchoolAdmin,
        Role::Teacher,
        Role::Student,
    ];

    /// Parse a role from its wire name
    pub fn from_str(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "super_admin" => Some(Role::SuperAdmin),
            "school_admin" => Some(Role::SchoolAdmin),
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            _ => None,
        }
    }

    /// Parse multiple roles from a comma-separated string
    pub fn parse_many(s: &str) -> Result<AccessPolicy, String> {
        let mut roles = BTreeSet::new();
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match Role::from_str(part) {
                Some(r) => {
                    roles.insert(r);
                }
                None => return Err(format!("Unknown role: {}", part)),
            }
        }
        Ok(AccessPolicy { roles })
    }

    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::SchoolAdmin => "school_admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    /// Human-readable label ("School Admin")
    pub fn label(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::SchoolAdmin => "School Admin",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
        }
    }

    /// Whether identities with this role belong to a school
    pub fn is_tenant_scoped(&self) -> bool {
        match self {
            Role::SuperAdmin => false,
            Role::SchoolAdmin | Role::Teacher | Role::Student => true,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of roles permitted to reach a screen or UI branch
///
/// Policies are declared statically; the default admits every role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    roles: BTreeSet<Role>,
}

impl AccessPolicy {
    /// Policy admitting every known role
    pub fn all() -> Self {
        Self {
            roles: Role::ALL.into_iter().collect(),
        }
    }

    /// Policy admitting only the given roles
    pub fn only(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
        }
    }

    /// Check whether a role is admitted
    pub fn contains(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Admitted roles in display order
    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.roles.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.roles.iter().map(Role::as_str).collect();
        f.write_str(&names.join(","))
    }
}

/// Proof of authentication issued by the auth service
///
/// The access token is opaque to this crate and never logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier of this session
    pub id: String,
    /// Account the session belongs to
    pub user_id: String,
    /// Email the account signed in with
    pub email: String,
    /// Bearer token issued by the service
    pub access_token: Secret,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Profile row as returned by the profile store
///
/// `role` is whatever string the store holds; it is only trusted once it
/// parses into a [`Role`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub display_name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// The authenticated principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    /// Display name
    pub name: String,
    pub role: Role,
    /// School the identity belongs to (absent for super admins)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
}

impl Identity {
    /// Build an identity from a live session and its profile record
    pub fn from_profile(session: &Session, profile: ProfileRecord) -> Result<Self, LookupError> {
        let role = Role::from_str(&profile.role)
            .ok_or_else(|| LookupError::UnknownRole(profile.role.clone()))?;

        Ok(Self {
            id: session.user_id.clone(),
            email: session.email.clone(),
            name: profile.display_name,
            role,
            school_id: profile.tenant_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            id: "sess-1".to_string(),
            user_id: "user-3".to_string(),
            email: "teacher@example.com".to_string(),
            access_token: Secret::new("token"),
            issued_at: Utc::now(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from_str("teacher"), Some(Role::Teacher));
        assert_eq!(Role::from_str("SCHOOL_ADMIN"), Some(Role::SchoolAdmin));
        assert_eq!(Role::from_str(" student "), Some(Role::Student));
        assert_eq!(Role::from_str("principal"), None);
    }

    #[test]
    fn test_role_parse_many() {
        let policy = Role::parse_many("super_admin, school_admin, student").unwrap();
        assert!(policy.contains(Role::SuperAdmin));
        assert!(policy.contains(Role::SchoolAdmin));
        assert!(policy.contains(Role::Student));
        assert!(!policy.contains(Role::Teacher));

        assert!(Role::parse_many("teacher,janitor").is_err());
    }

    #[test]
    fn test_role_display_matches_wire_name() {
        for role in Role::ALL {
            assert_eq!(Role::from_str(&role.to_string()), Some(role));
        }
    }

    #[test]
    fn test_default_policy_admits_all_roles() {
        let policy = AccessPolicy::default();
        for role in Role::ALL {
            assert!(policy.contains(role));
        }
        assert_eq!(policy.to_string(), "super_admin,school_admin,teacher,student");
    }

    #[test]
    fn test_only_super_admin_is_unscoped() {
        assert!(!Role::SuperAdmin.is_tenant_scoped());
        assert!(Role::SchoolAdmin.is_tenant_scoped());
        assert!(Role::Teacher.is_tenant_scoped());
        assert!(Role::Student.is_tenant_scoped());
    }

    #[test]
    fn test_identity_from_profile() {
        let profile = ProfileRecord {
            display_name: "Teacher User".to_string(),
            role: "teacher".to_string(),
            tenant_id: Some("1".to_string()),
        };
        let identity = Identity::from_profile(&session(), profile).unwrap();
        assert_eq!(identity.id, "user-3");
        assert_eq!(identity.email, "teacher@example.com");
        assert_eq!(identity.role, Role::Teacher);
        assert_eq!(identity.school_id.as_deref(), Some("1"));
    }

    #[test]
    fn test_identity_rejects_unknown_role() {
        let profile = ProfileRecord {
            display_name: "Someone".to_string(),
            role: "principal".to_string(),
            tenant_id: None,
        };
        assert!(matches!(
            Identity::from_profile(&session(), profile),
            Err(LookupError::UnknownRole(role)) if role == "principal"
        ));
    }

    #[test]
    fn test_session_expiration() {
        let live = session();
        assert!(!live.is_expired());

        let expired = Session {
            expires_at: Utc::now() - chrono::Duration::minutes(1),
            ..live
        };
        assert!(expired.is_expired());
    }
}
