//! Raw configuration types for TOML parsing

use super::*;
use serde::Deserialize;

/// Raw configuration as parsed from TOML
#[derive(Debug, Deserialize)]
pub struct RawConfig {
    pub app: Option<RawAppConfig>,
    pub dev_identity: Option<RawDevIdentityConfig>,
    pub session: Option<RawSessionConfig>,
    pub logging: Option<RawLoggingConfig>,
    #[serde(default)]
    pub accounts: Vec<RawAccountConfig>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawAppConfig {
    pub name: Option<String>,
    pub environment: Option<String>,
}

impl TryFrom<RawAppConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(raw: RawAppConfig) -> Result<Self, Self::Error> {
        let environment = match raw.environment.as_deref() {
            None => Environment::Production,
            Some(name) => Environment::from_str(name).ok_or_else(|| {
                ConfigError::Invalid(format!("Unknown environment: {}", name))
            })?,
        };

        Ok(Self {
            name: raw.name.unwrap_or_else(|| "TeachFlow".to_string()),
            environment,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawDevIdentityConfig {
    pub enabled: Option<bool>,
    pub domain: Option<String>,
    pub shared_secret: Option<String>,
    pub default_school: Option<String>,
}

impl From<RawDevIdentityConfig> for DevIdentityConfig {
    fn from(raw: RawDevIdentityConfig) -> Self {
        let defaults = DevIdentityConfig::default();
        Self {
            enabled: raw.enabled.unwrap_or(false),
            domain: raw.domain.unwrap_or(defaults.domain),
            shared_secret: raw
                .shared_secret
                .map(Secret::new)
                .unwrap_or(defaults.shared_secret),
            default_school: raw.default_school.unwrap_or(defaults.default_school),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawSessionConfig {
    pub login_settle_timeout_ms: Option<u64>,
}

impl From<RawSessionConfig> for SessionConfig {
    fn from(raw: RawSessionConfig) -> Self {
        Self {
            login_settle_timeout: raw
                .login_settle_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| SessionConfig::default().login_settle_timeout),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawLoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl From<RawLoggingConfig> for LoggingConfig {
    fn from(raw: RawLoggingConfig) -> Self {
        Self {
            level: raw.level.unwrap_or_else(|| "info".to_string()),
            format: match raw.format.as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawAccountConfig {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: String,
    pub school: Option<String>,
}

impl TryFrom<RawAccountConfig> for AccountConfig {
    type Error = ConfigError;

    fn try_from(raw: RawAccountConfig) -> Result<Self, Self::Error> {
        let role = Role::from_str(&raw.role).ok_or_else(|| {
            ConfigError::Invalid(format!("Unknown role for {}: {}", raw.email, raw.role))
        })?;

        if role.is_tenant_scoped() && raw.school.is_none() {
            return Err(ConfigError::Invalid(format!(
                "Account {} needs a school for role {}",
                raw.email, role
            )));
        }

        Ok(Self {
            email: raw.email,
            password: Secret::new(raw.password),
            name: raw.name,
            role,
            school: raw.school,
        })
    }
}
