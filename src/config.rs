//! Uploader configuration loaded from environment variables or a `.env` file.

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;

/// Default values used when a variable is not set.
pub mod defaults {
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    pub const STATUS_PASSED: &str = "passed";
    pub const STATUS_FAILED: &str = "failed";
    pub const STATUS_SKIPPED: &str = "blocked";
    pub const STATUS_ERROR: &str = "blocked";
    pub const STATUS_CANCELED: &str = "blocked";
}

/// TestRail account connection settings.
#[derive(Debug, Clone)]
pub struct TestRailSettings {
    /// Base URL of the TestRail instance, e.g. `https://example.testrail.io`
    pub url: String,
    /// Account email used for HTTP Basic authentication
    pub email: String,
    /// API key used as the Basic authentication password
    pub api_key: SecretString,
}

/// HTTP transport settings.
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Optional proxy URL applied to every outbound call
    pub proxy: Option<String>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(defaults::CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
            proxy: None,
        }
    }
}

/// Names of the TestRail statuses each local result status is reported as.
///
/// Names are matched case-insensitively against the account's statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNames {
    pub passed: String,
    pub failed: String,
    pub skipped: String,
    pub error: String,
    pub canceled: String,
}

impl Default for StatusNames {
    fn default() -> Self {
        Self {
            passed: defaults::STATUS_PASSED.to_string(),
            failed: defaults::STATUS_FAILED.to_string(),
            skipped: defaults::STATUS_SKIPPED.to_string(),
            error: defaults::STATUS_ERROR.to_string(),
            canceled: defaults::STATUS_CANCELED.to_string(),
        }
    }
}

/// Where results are reported inside TestRail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSettings {
    pub project_id: i64,
    pub suite_id: i64,
    /// New runs cover every case of the suite instead of only the reported ones
    pub add_all_tests_to_plan: bool,
    pub plan_name: String,
    pub run_name: String,
    pub status_names: StatusNames,
}

/// Full uploader configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub testrail: TestRailSettings,
    pub transport: TransportSettings,
    pub project: ProjectSettings,
}

impl SyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TESTRAIL_URL`: TestRail base URL - REQUIRED
    /// - `TESTRAIL_EMAIL`: Account email - REQUIRED
    /// - `TESTRAIL_API_KEY`: Account API key - REQUIRED
    /// - `TESTRAIL_PROXY`: Proxy URL (optional)
    /// - `TESTRAIL_CONNECT_TIMEOUT_SECS`: Connect timeout (default: 10)
    /// - `TESTRAIL_REQUEST_TIMEOUT_SECS`: Total request timeout (default: 60)
    /// - `TESTRAIL_PROJECT_ID`: Project id - REQUIRED
    /// - `TESTRAIL_SUITE_ID`: Suite id - REQUIRED
    /// - `TESTRAIL_PLAN_NAME`: Plan to find or create - REQUIRED
    /// - `TESTRAIL_RUN_NAME`: Run to find or create inside the plan - REQUIRED
    /// - `TESTRAIL_ADD_ALL_TESTS`: Include every suite case in new runs (default: false)
    /// - `TESTRAIL_STATUS_PASSED` / `_FAILED` / `_SKIPPED` / `_ERROR` / `_CANCELED`:
    ///   TestRail status names (defaults: passed, failed, blocked, blocked, blocked)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from a `.env`-style file.
    ///
    /// Values in the file take precedence; anything missing falls back to the
    /// process environment. The process environment is not modified.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        let entries = dotenvy::from_path_iter(path.as_ref())
            .map_err(|e| ConfigError::EnvFile(e.to_string()))?;
        for entry in entries {
            let (key, value) = entry.map_err(|e| ConfigError::EnvFile(e.to_string()))?;
            values.insert(key, value);
        }

        Self::from_lookup(|key| values.get(key).cloned().or_else(|| env::var(key).ok()))
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingEnvVar(key))
        };

        let url = required("TESTRAIL_URL")?;
        let email = required("TESTRAIL_EMAIL")?;
        let api_key = SecretString::from(required("TESTRAIL_API_KEY")?);

        let connect_timeout_secs = lookup("TESTRAIL_CONNECT_TIMEOUT_SECS")
            .unwrap_or_else(|| defaults::CONNECT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue("TESTRAIL_CONNECT_TIMEOUT_SECS must be a valid number")
            })?;

        let request_timeout_secs = lookup("TESTRAIL_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| defaults::REQUEST_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue("TESTRAIL_REQUEST_TIMEOUT_SECS must be a valid number")
            })?;

        let project_id = required("TESTRAIL_PROJECT_ID")?
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidValue("TESTRAIL_PROJECT_ID must be a valid number"))?;

        let suite_id = required("TESTRAIL_SUITE_ID")?
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidValue("TESTRAIL_SUITE_ID must be a valid number"))?;

        let add_all_tests_to_plan = match lookup("TESTRAIL_ADD_ALL_TESTS") {
            Some(v) => parse_bool(&v).ok_or(ConfigError::InvalidValue(
                "TESTRAIL_ADD_ALL_TESTS must be true or false",
            ))?,
            None => false,
        };

        let status = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let status_names = StatusNames {
            passed: status("TESTRAIL_STATUS_PASSED", defaults::STATUS_PASSED),
            failed: status("TESTRAIL_STATUS_FAILED", defaults::STATUS_FAILED),
            skipped: status("TESTRAIL_STATUS_SKIPPED", defaults::STATUS_SKIPPED),
            error: status("TESTRAIL_STATUS_ERROR", defaults::STATUS_ERROR),
            canceled: status("TESTRAIL_STATUS_CANCELED", defaults::STATUS_CANCELED),
        };

        let config = SyncConfig {
            testrail: TestRailSettings {
                url,
                email,
                api_key,
            },
            transport: TransportSettings {
                connect_timeout: Duration::from_secs(connect_timeout_secs),
                request_timeout: Duration::from_secs(request_timeout_secs),
                proxy: lookup("TESTRAIL_PROXY").filter(|v| !v.trim().is_empty()),
            },
            project: ProjectSettings {
                project_id,
                suite_id,
                add_all_tests_to_plan,
                plan_name: required("TESTRAIL_PLAN_NAME")?,
                run_name: required("TESTRAIL_RUN_NAME")?,
                status_names,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Check values that parse but cannot work.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if !(self.testrail.url.starts_with("http://") || self.testrail.url.starts_with("https://"))
        {
            errors.push(format!(
                "TESTRAIL_URL '{}' must start with http:// or https://",
                self.testrail.url
            ));
        }

        if self.transport.request_timeout.is_zero() {
            errors.push("TESTRAIL_REQUEST_TIMEOUT_SECS must be greater than zero".to_string());
        }

        let names = &self.project.status_names;
        for (key, value) in [
            ("TESTRAIL_STATUS_PASSED", &names.passed),
            ("TESTRAIL_STATUS_FAILED", &names.failed),
            ("TESTRAIL_STATUS_SKIPPED", &names.skipped),
            ("TESTRAIL_STATUS_ERROR", &names.error),
            ("TESTRAIL_STATUS_CANCELED", &names.canceled),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("{} must not be blank", key));
            }
        }

        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }

        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Failed to read env file: {0}")]
    EnvFile(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}
