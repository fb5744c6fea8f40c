//! Error types for provider API calls.

use std::fmt;

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while talking to the billing provider.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No API key in the environment.
    #[error("TARIFA_API_KEY is not set")]
    AuthMissing,

    /// The provider could not be reached at all.
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    /// The provider answered with a non-success status. A 401 means a bad
    /// key; a 400 usually means a payload the provider's validation
    /// refused.
    #[error("provider rejected the request: {status}")]
    Rejected {
        /// HTTP status code.
        status: StatusLabel,
    },

    /// The provider answered 2xx but the body was not what we expect.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// HTTP status with its conventional reason phrase, for error display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLabel(pub u16);

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.0 {
            400 => " Bad Request",
            401 => " Unauthorized",
            402 => " Request Failed",
            403 => " Forbidden",
            404 => " Not Found",
            409 => " Conflict",
            429 => " Too Many Requests",
            500..=599 => " Server Error",
            _ => "",
        };
        write!(f, "HTTP {}{}", self.0, reason)
    }
}

impl Error {
    /// Create a rejection error from a bare status code.
    pub fn rejected(status: u16) -> Self {
        Self::Rejected {
            status: StatusLabel(status),
        }
    }

    /// The HTTP status, when the provider rejected the request.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status } => Some(status.0),
            _ => None,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::rejected(code),
            other => Self::Unreachable(other.to_string()),
        }
    }
}
