//! Development identity provider
//!
//! Lets demo accounts sign in without a backend. Only constructed when the
//! configuration enables it outside production; the session manager never
//! consults it otherwise.
//!
//! Recognised credentials are `<alias>[+<school>]@<domain>` with the shared
//! secret as password. Aliases: `admin`/`super_admin`, `school`/`school_admin`,
//! `teacher`, `student`.

use super::types::{Identity, Role};
use crate::config::{Config, Environment};
use crate::Secret;
use subtle::ConstantTimeEq;

/// Synthesizes identities from development credentials
#[derive(Debug, Clone)]
pub struct DevIdentityProvider {
    domain: String,
    shared_secret: Secret,
    default_school: String,
}

impl DevIdentityProvider {
    /// Build the provider if the configuration allows it
    pub fn from_config(config: &Config) -> Option<Self> {
        let dev = &config.dev_identity;
        if !dev.enabled {
            return None;
        }
        if config.app.environment == Environment::Production {
            tracing::warn!("Development identities are disabled in production");
            return None;
        }

        Some(Self {
            domain: dev.domain.to_lowercase(),
            shared_secret: dev.shared_secret.clone(),
            default_school: dev.default_school.clone(),
        })
    }

    /// Resolve a development credential into an identity
    ///
    /// Returns `None` for anything that is not a recognised pattern.
    pub fn resolve(&self, email: &str, password: &str) -> Option<Identity> {
        let secret_ok: bool = self
            .shared_secret
            .expose()
            .as_bytes()
            .ct_eq(password.as_bytes())
            .into();
        if !secret_ok {
            return None;
        }

        let email = email.trim().to_lowercase();
        let (local, domain) = email.rsplit_once('@')?;
        if domain != self.domain {
            return None;
        }

        let (alias, school) = match local.split_once('+') {
            Some((alias, school)) if !school.is_empty() => (alias, Some(school)),
            Some(_) => return None,
            None => (local, None),
        };

        let role = match alias {
            "admin" | "super_admin" => Role::SuperAdmin,
            "school" | "school_admin" => Role::SchoolAdmin,
            "teacher" => Role::Teacher,
            "student" => Role::Student,
            _ => return None,
        };

        let school_id = if role.is_tenant_scoped() {
            Some(school.unwrap_or(&self.default_school).to_string())
        } else {
            None
        };

        let id = match &school_id {
            Some(school) => format!("dev-{}-{}", role, school),
            None => format!("dev-{}", role),
        };

        Some(Identity {
            id,
            email: email.clone(),
            name: display_name(role).to_string(),
            role,
            school_id,
        })
    }
}

fn display_name(role: Role) -> &'static str {
    match role {
        Role::SuperAdmin => "Super Admin",
        Role::SchoolAdmin => "School Admin",
        Role::Teacher => "Teacher User",
        Role::Student => "Student User",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_config() -> Config {
        Config::parse(
            r#"
[app]
environment = "development"

[dev_identity]
enabled = true
domain = "example.com"
shared_secret = "password"
default_school = "1"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_provider_disabled_by_default() {
        assert!(DevIdentityProvider::from_config(&Config::default()).is_none());
    }

    #[test]
    fn test_provider_never_built_in_production() {
        let mut config = dev_config();
        config.app.environment = Environment::Production;
        assert!(DevIdentityProvider::from_config(&config).is_none());
    }

    #[test]
    fn test_resolves_each_alias() {
        let provider = DevIdentityProvider::from_config(&dev_config()).unwrap();

        let admin = provider.resolve("admin@example.com", "password").unwrap();
        assert_eq!(admin.role, Role::SuperAdmin);
        assert_eq!(admin.school_id, None);
        assert_eq!(admin.name, "Super Admin");

        let school = provider.resolve("school@example.com", "password").unwrap();
        assert_eq!(school.role, Role::SchoolAdmin);
        assert_eq!(school.school_id.as_deref(), Some("1"));

        let teacher = provider.resolve("Teacher@Example.com", "password").unwrap();
        assert_eq!(teacher.role, Role::Teacher);
        assert_eq!(teacher.email, "teacher@example.com");

        let student = provider.resolve("student@example.com", "password").unwrap();
        assert_eq!(student.role, Role::Student);
        assert_eq!(student.name, "Student User");
    }

    #[test]
    fn test_school_suffix_sets_tenant() {
        let provider = DevIdentityProvider::from_config(&dev_config()).unwrap();

        let teacher = provider.resolve("teacher+42@example.com", "password").unwrap();
        assert_eq!(teacher.school_id.as_deref(), Some("42"));
        assert_eq!(teacher.id, "dev-teacher-42");

        // Super admins are never scoped to a school
        let admin = provider.resolve("admin+42@example.com", "password").unwrap();
        assert_eq!(admin.school_id, None);
        assert_eq!(admin.id, "dev-super_admin");

        assert!(provider.resolve("teacher+@example.com", "password").is_none());
    }

    #[test]
    fn test_rejects_unrecognised_credentials() {
        let provider = DevIdentityProvider::from_config(&dev_config()).unwrap();

        assert!(provider.resolve("teacher@example.com", "wrong").is_none());
        assert!(provider.resolve("teacher@school.org", "password").is_none());
        assert!(provider.resolve("janitor@example.com", "password").is_none());
        assert!(provider.resolve("teacher", "password").is_none());
    }
}
