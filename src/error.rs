//! Domain error types for TestRail synchronization.
//!
//! Every `TestRailError` renders a fixed per-kind description followed by the
//! call-specific detail (ids involved and, where available, TestRail's own error body).

use std::fmt;

use crate::config::ConfigError;
use crate::models::ResultStatus;

/// Kind of a TestRail failure, independent of the detail message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    AccessDenied,
    AuthenticationFailed,
    HitRateLimit,
    Maintenance,
    InvalidRoute,
    SocketTimeout,
    CaseId,
    UnknownError,
}

impl ErrorKind {
    /// Fixed human-readable description for this kind.
    pub fn description(&self) -> &'static str {
        match self {
            Self::BadRequest => "TestRail rejected your request for invalid input.",
            Self::AccessDenied => "TestRail not allowing access to resource.",
            Self::AuthenticationFailed => "TestRail authentication failed.",
            Self::HitRateLimit => {
                "TestRail rejected your request because the rate limit has been reached."
            }
            Self::Maintenance => "TestRail is performing maintenance. Try again later.",
            Self::InvalidRoute => "The given TestRail endpoint does not exist.",
            Self::SocketTimeout => "Timed out waiting for a response from TestRail.",
            Self::CaseId => "TestRail invalid case ID.",
            Self::UnknownError => "An unknown TestRail error has occurred.",
        }
    }

    /// Whether a caller may retry an operation that failed with this kind.
    ///
    /// Only access violations are final; everything else (rate limits,
    /// maintenance windows, timeouts included) may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::AccessDenied)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::HitRateLimit => "HIT_RATE_LIMIT",
            Self::Maintenance => "MAINTENANCE",
            Self::InvalidRoute => "INVALID_ROUTE",
            Self::SocketTimeout => "SOCKET_TIMEOUT",
            Self::CaseId => "CASE_ID",
            Self::UnknownError => "UNKNOWN_ERROR",
        };
        f.write_str(name)
    }
}

/// Recoverable failures talking to TestRail or validating input against it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TestRailError {
    /// Malformed or unknown identifier
    #[error("TestRail rejected your request for invalid input. Details: {0}")]
    BadRequest(String),

    /// Authorization failure or completed-resource violation
    #[error("TestRail not allowing access to resource. Details: {0}")]
    AccessDenied(String),

    #[error("TestRail authentication failed. Details: {0}")]
    AuthenticationFailed(String),

    #[error("TestRail rejected your request because the rate limit has been reached. Details: {0}")]
    HitRateLimit(String),

    #[error("TestRail is performing maintenance. Try again later. Details: {0}")]
    Maintenance(String),

    /// Client bug: the request path does not exist on the server
    #[error("The given TestRail endpoint does not exist. Details: {0}")]
    InvalidRoute(String),

    #[error("Timed out waiting for a response from TestRail. Details: {0}")]
    SocketTimeout(String),

    /// Local validation failure on a case-id token or case membership
    #[error("TestRail invalid case ID. Details: {0}")]
    CaseId(String),

    #[error("An unknown TestRail error has occurred. Details: {0}")]
    UnknownError(String),
}

impl TestRailError {
    /// Build an error of the given kind.
    pub fn new(kind: ErrorKind, details: impl Into<String>) -> Self {
        let details = details.into();
        match kind {
            ErrorKind::BadRequest => Self::BadRequest(details),
            ErrorKind::AccessDenied => Self::AccessDenied(details),
            ErrorKind::AuthenticationFailed => Self::AuthenticationFailed(details),
            ErrorKind::HitRateLimit => Self::HitRateLimit(details),
            ErrorKind::Maintenance => Self::Maintenance(details),
            ErrorKind::InvalidRoute => Self::InvalidRoute(details),
            ErrorKind::SocketTimeout => Self::SocketTimeout(details),
            ErrorKind::CaseId => Self::CaseId(details),
            ErrorKind::UnknownError => Self::UnknownError(details),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::AccessDenied(_) => ErrorKind::AccessDenied,
            Self::AuthenticationFailed(_) => ErrorKind::AuthenticationFailed,
            Self::HitRateLimit(_) => ErrorKind::HitRateLimit,
            Self::Maintenance(_) => ErrorKind::Maintenance,
            Self::InvalidRoute(_) => ErrorKind::InvalidRoute,
            Self::SocketTimeout(_) => ErrorKind::SocketTimeout,
            Self::CaseId(_) => ErrorKind::CaseId,
            Self::UnknownError(_) => ErrorKind::UnknownError,
        }
    }

    /// Call-specific detail without the per-kind description.
    pub fn details(&self) -> &str {
        match self {
            Self::BadRequest(d)
            | Self::AccessDenied(d)
            | Self::AuthenticationFailed(d)
            | Self::HitRateLimit(d)
            | Self::Maintenance(d)
            | Self::InvalidRoute(d)
            | Self::SocketTimeout(d)
            | Self::CaseId(d)
            | Self::UnknownError(d) => d,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Append context (operation name, affected id) to the detail message.
    pub fn with_context(self, context: impl fmt::Display) -> Self {
        let details = format!("{} ({})", self.details(), context);
        Self::new(self.kind(), details)
    }
}

/// Convenience type alias for Results with TestRailError.
pub type TestRailResult<T> = Result<T, TestRailError>;

/// The configured status mapping cannot be used.
///
/// These indicate broken configuration rather than a transient failure and
/// must abort startup instead of being retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusMappingError {
    #[error(
        "TestRail has multiple result statuses configured with system name [{name}]. \
         Duplicates detected have status IDs {first_id} and {second_id}"
    )]
    DuplicateStatusName {
        name: String,
        first_id: i32,
        second_id: i32,
    },

    #[error("Mapping for TestRail {label} status '{name}' not found")]
    StatusNotFound { label: &'static str, name: String },

    #[error("Status {0} does not have a TestRail mapping")]
    NoMapping(ResultStatus),
}

/// Errors surfaced by the upload facade.
#[derive(Debug, thiserror::Error)]
pub enum UploaderError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid status mapping: {0}")]
    Mapping(#[from] StatusMappingError),

    #[error(transparent)]
    TestRail(#[from] TestRailError),
}

impl UploaderError {
    /// Fatal errors mean the uploader configuration is unusable; retrying cannot help.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Config(_) | Self::Mapping(_) => true,
            Self::TestRail(_) => false,
        }
    }

    /// The underlying TestRail error, if this is one.
    pub fn as_testrail(&self) -> Option<&TestRailError> {
        match self {
            Self::TestRail(e) => Some(e),
            _ => None,
        }
    }
}
