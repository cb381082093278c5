use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error taxonomy shared by the controller, the connectors and both facades.
///
/// Local and remote failures use the same kinds, so a caller can only tell them apart by the message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Error {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Unauthorized request: {0}")]
    Unauthorized(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("No available resources: {0}")]
    NoAvailableResources(String),

    #[error("Provider unavailable: {0}")]
    UnavailableProvider(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidParameter,
    InstanceNotFound,
    Unauthorized,
    QuotaExceeded,
    NoAvailableResources,
    UnavailableProvider,
    Unexpected,
}

impl ErrorKind {
    /// Kinds a client may retry later. Everything else is permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::QuotaExceeded | ErrorKind::NoAvailableResources | ErrorKind::UnavailableProvider)
    }

    /// Fixed status code reported by the API and RPC layers for this kind.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::InvalidParameter => 400,
            ErrorKind::Unauthorized => 403,
            ErrorKind::InstanceNotFound => 404,
            ErrorKind::QuotaExceeded => 409,
            ErrorKind::Unexpected => 500,
            ErrorKind::NoAvailableResources => 503,
            ErrorKind::UnavailableProvider => 504,
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Error::InstanceNotFound(_) => ErrorKind::InstanceNotFound,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            Error::NoAvailableResources(_) => ErrorKind::NoAvailableResources,
            Error::UnavailableProvider(_) => ErrorKind::UnavailableProvider,
            Error::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::InvalidParameter(msg)
            | Error::InstanceNotFound(msg)
            | Error::Unauthorized(msg)
            | Error::QuotaExceeded(msg)
            | Error::NoAvailableResources(msg)
            | Error::UnavailableProvider(msg)
            | Error::Unexpected(msg) => msg,
        }
    }

    /// Rebuilds an error from its kind, used when a fault crosses the RPC boundary.
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::InvalidParameter => Error::InvalidParameter(message),
            ErrorKind::InstanceNotFound => Error::InstanceNotFound(message),
            ErrorKind::Unauthorized => Error::Unauthorized(message),
            ErrorKind::QuotaExceeded => Error::QuotaExceeded(message),
            ErrorKind::NoAvailableResources => Error::NoAvailableResources(message),
            ErrorKind::UnavailableProvider => Error::UnavailableProvider(message),
            ErrorKind::Unexpected => Error::Unexpected(message),
        }
    }

    /// Builds an `Unexpected` error and logs it, these are always defects of a collaborator.
    pub fn unexpected(message: impl Into<String>) -> Self {
        let message = message.into();
        log::error!("Unexpected failure: {}", message);
        Error::Unexpected(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures while reading and validating the broker configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse broker configuration JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Invalid broker configuration: {0}")]
    InvalidConfig(String),
}
