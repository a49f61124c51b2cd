//! Error types for the DNS-01 hook
//!
//! Every failure category has its own variant so callers can tell them apart.
//! The process exit code is derived from the variant in exactly one place,
//! [`Error::exit_status`].

use thiserror::Error;

/// Result type alias for hook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit status contract
///
/// These codes are what the calling ACME client sees:
/// - 0: Success
/// - 1: Usage, configuration or authentication error
/// - 2: No manageable zone for the domain (or zones could not be listed)
/// - 3: A registrar read/write/delete/commit call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Hook finished
    Success = 0,
    /// Bad invocation, bad configuration or rejected credentials
    Usage = 1,
    /// Zone discovery failed
    ZoneDiscovery = 2,
    /// Registrar operation failed
    Registrar = 3,
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status as u8)
    }
}

/// Core error type for the DNS-01 hook
#[derive(Error, Debug)]
pub enum Error {
    /// The hook was invoked under an unknown program name
    #[error("{0}")]
    Usage(String),

    /// Configuration errors (missing credentials, bad values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token exchange failed or returned no usable token
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Zone listing could not be fetched or parsed
    #[error("Can't list zones: {0}")]
    ZoneDiscovery(String),

    /// No manageable zone is a label-aligned suffix of the domain
    #[error("Can't find zone for domain {domain}")]
    ZoneNotFound {
        /// The domain being validated
        domain: String,
    },

    /// A registrar call against a selected zone failed
    #[error("Can't {operation} in zone {zone}: {message}")]
    Registrar {
        /// Zone service name
        zone: String,
        /// Operation that failed (e.g. "update record")
        operation: String,
        /// Underlying cause
        message: String,
    },

    /// DNS lookup failure (soft; callers degrade instead of aborting)
    #[error("DNS lookup error: {0}")]
    Dns(String),

    /// I/O errors (config file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors (config file parsing)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a usage error
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a zone discovery error
    pub fn zone_discovery(msg: impl Into<String>) -> Self {
        Self::ZoneDiscovery(msg.into())
    }

    /// Create a "no zone for domain" error
    pub fn zone_not_found(domain: impl Into<String>) -> Self {
        Self::ZoneNotFound {
            domain: domain.into(),
        }
    }

    /// Create a registrar operation error
    pub fn registrar(
        zone: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Registrar {
            zone: zone.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a DNS lookup error
    pub fn dns(msg: impl Into<String>) -> Self {
        Self::Dns(msg.into())
    }

    /// Map this error onto the process exit status contract
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Error::Usage(_)
            | Error::Config(_)
            | Error::Authentication(_)
            | Error::Dns(_)
            | Error::Io(_)
            | Error::Json(_) => ExitStatus::Usage,
            Error::ZoneDiscovery(_) | Error::ZoneNotFound { .. } => ExitStatus::ZoneDiscovery,
            Error::Registrar { .. } => ExitStatus::Registrar,
        }
    }
}
