//! Configuration system for TeachFlow
//!
//! Loads configuration from TOML files and environment variables.

mod types;

pub use types::*;

use crate::auth::Role;
use crate::Secret;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;

/// Environment variable overriding `app.environment`
pub const ENV_OVERRIDE: &str = "TEACHFLOW_ENV";

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main TeachFlow configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Development identity provider
    pub dev_identity: DevIdentityConfig,
    /// Session manager tuning
    pub session: SessionConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Accounts seeded into the in-memory auth service
    pub accounts: Vec<AccountConfig>,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = Self::read_raw(path.as_ref()).await?;
        Self::from_raw(raw, std::env::var(ENV_OVERRIDE).ok())
    }

    async fn read_raw(path: &Path) -> Result<RawConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).await?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load configuration from a string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Self::from_raw(raw, None)
    }

    /// Convert from raw TOML config to validated config
    fn from_raw(raw: RawConfig, env_override: Option<String>) -> Result<Self, ConfigError> {
        let mut raw_app = raw.app.unwrap_or_default();
        if let Some(environment) = env_override {
            raw_app.environment = Some(environment);
        }

        let app: AppConfig = raw_app.try_into()?;
        let dev_identity = raw.dev_identity.unwrap_or_default().into();
        let session = raw.session.unwrap_or_default().into();
        let logging = raw.logging.unwrap_or_default().into();

        let accounts = raw
            .accounts
            .into_iter()
            .map(|a| a.try_into())
            .collect::<Result<Vec<_>, _>>()?;

        let config = Self {
            app,
            dev_identity,
            session,
            logging,
            accounts,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-section invariants
    fn validate(&self) -> Result<(), ConfigError> {
        if self.app.environment == Environment::Production && self.dev_identity.enabled {
            return Err(ConfigError::Invalid(
                "dev_identity cannot be enabled in production".to_string(),
            ));
        }

        if self.dev_identity.enabled && self.dev_identity.shared_secret.expose().is_empty() {
            return Err(ConfigError::Invalid(
                "dev_identity.shared_secret must not be empty".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for account in &self.accounts {
            if !seen.insert(account.email.to_lowercase()) {
                return Err(ConfigError::Invalid(format!(
                    "Duplicate account: {}",
                    account.email
                )));
            }
        }

        Ok(())
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            app: AppConfig::default(),
            dev_identity: DevIdentityConfig::default(),
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
            accounts: vec![],
        }
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("teachflow")
            .join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Application settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name shown in notifications
    pub name: String,
    /// Deployment environment
    pub environment: Environment,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "TeachFlow".to_string(),
            environment: Environment::Production,
        }
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
    Test,
}

impl Environment {
    /// Parse an environment name
    pub fn from_str(s: &str) -> Option<Environment> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Some(Environment::Production),
            "development" | "dev" => Some(Environment::Development),
            "test" => Some(Environment::Test),
            _ => None,
        }
    }
}

/// Development identity provider settings
#[derive(Debug, Clone)]
pub struct DevIdentityConfig {
    /// Whether development credentials are accepted
    pub enabled: bool,
    /// Email domain of development accounts
    pub domain: String,
    /// Password shared by every development account
    pub shared_secret: Secret,
    /// School assigned when the credential names none
    pub default_school: String,
}

impl Default for DevIdentityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            domain: "example.com".to_string(),
            shared_secret: Secret::new("password"),
            default_school: "1".to_string(),
        }
    }
}

/// Session manager tuning
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a successful login waits for its profile to be resolved
    pub login_settle_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_settle_timeout: Duration::from_millis(5000),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Format: "json" or "pretty"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format
    Pretty,
    /// JSON format
    Json,
}

/// Account seeded into the in-memory auth service
#[derive(Debug, Clone)]
pub struct AccountConfig {
    pub email: String,
    pub password: Secret,
    pub name: String,
    pub role: Role,
    pub school: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.app.environment, Environment::Production);
        assert_eq!(config.app.name, "TeachFlow");
        assert!(!config.dev_identity.enabled);
        assert_eq!(config.session.login_settle_timeout, Duration::from_millis(5000));
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.accounts.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
[app]
name = "Springfield Portal"
environment = "development"

[dev_identity]
enabled = true
domain = "springfield.edu"
shared_secret = "letmein"
default_school = "7"

[session]
login_settle_timeout_ms = 250

[logging]
level = "debug"
format = "json"

[[accounts]]
email = "teacher@springfield.edu"
password = "apple"
name = "Edna Krabappel"
role = "teacher"
school = "7"
"#,
        )
        .unwrap();

        assert_eq!(config.app.name, "Springfield Portal");
        assert_eq!(config.app.environment, Environment::Development);
        assert!(config.dev_identity.enabled);
        assert_eq!(config.dev_identity.domain, "springfield.edu");
        assert_eq!(config.dev_identity.shared_secret.expose(), "letmein");
        assert_eq!(config.dev_identity.default_school, "7");
        assert_eq!(config.session.login_settle_timeout, Duration::from_millis(250));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);

        let account = &config.accounts[0];
        assert_eq!(account.role, Role::Teacher);
        assert_eq!(account.school.as_deref(), Some("7"));
        assert_eq!(account.password.expose(), "apple");
    }

    #[test]
    fn test_dev_identity_rejected_in_production() {
        let result = Config::parse(
            r#"
[app]
environment = "production"

[dev_identity]
enabled = true
"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_env_override_wins() {
        let raw: RawConfig = toml::from_str(
            r#"
[app]
environment = "development"

[dev_identity]
enabled = true
"#,
        )
        .unwrap();

        // Forcing production must also refuse the dev provider
        let result = Config::from_raw(raw, Some("production".to_string()));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_env_override_applies() {
        let raw: RawConfig = toml::from_str("[app]\nenvironment = \"development\"\n").unwrap();
        let config = Config::from_raw(raw, Some("test".to_string())).unwrap();
        assert_eq!(config.app.environment, Environment::Test);

        let raw: RawConfig = toml::from_str("[app]\nenvironment = \"development\"\n").unwrap();
        let config = Config::from_raw(raw, None).unwrap();
        assert_eq!(config.app.environment, Environment::Development);
    }

    #[test]
    fn test_unknown_values_rejected() {
        assert!(matches!(
            Config::parse("[app]\nenvironment = \"staging\"\n"),
            Err(ConfigError::Invalid(_))
        ));

        let bad_role = r#"
[[accounts]]
email = "x@example.com"
password = "p"
name = "X"
role = "principal"
"#;
        assert!(matches!(Config::parse(bad_role), Err(ConfigError::Invalid(_))));

        assert!(matches!(
            Config::parse("[app\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_duplicate_accounts_rejected() {
        let content = r#"
[[accounts]]
email = "a@example.com"
password = "p"
name = "A"
role = "student"
school = "1"

[[accounts]]
email = "A@example.com"
password = "q"
name = "A again"
role = "student"
school = "1"
"#;
        assert!(matches!(Config::parse(content), Err(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[app]\nenvironment = \"test\"\n")
            .await
            .unwrap();

        let raw = Config::read_raw(&path).await.unwrap();
        let config = Config::from_raw(raw, None).unwrap();
        assert_eq!(config.app.environment, Environment::Test);
        assert!(config.accounts.is_empty());

        let missing = Config::load(dir.path().join("missing.toml")).await;
        assert!(matches!(missing, Err(ConfigError::NotFound(_))));
    }
}
