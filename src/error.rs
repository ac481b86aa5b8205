//! Error types for spaceship-ddns
//!
//! Every fallible library operation returns [`DdnsError`]. The binary wraps it
//! with `anyhow` context at the top level.

use thiserror::Error;

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, DdnsError>;

/// Errors raised while resolving configuration or running a reconciliation pass
#[derive(Error, Debug)]
pub enum DdnsError {
    /// Required configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The public IP lookup failed or returned unusable content
    #[error("Unable to retrieve the current address: {0}")]
    IpDiscovery(String),

    /// Network failure or non-2xx response from the registrar API
    #[error("{operation} failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        /// Registrar operation that failed (`list`, `delete`, `add`)
        operation: &'static str,
        /// HTTP status code, absent for network-level failures
        status: Option<u16>,
        /// Raw response body, empty for network-level failures
        body: String,
        /// Human readable description
        message: String,
    },

    /// A 2xx response whose body could not be interpreted
    #[error("{operation} returned an unexpected body: {message}")]
    Protocol {
        /// Registrar operation that failed
        operation: &'static str,
        /// Parse failure description
        message: String,
    },

    /// One or more target names failed in an otherwise completed pass
    #[error("{} of {total} record(s) failed to reconcile: {}", .failed.len(), .failed.join(", "))]
    PartialFailure {
        /// Names whose add/update failed
        failed: Vec<String>,
        /// Number of target names in the pass
        total: usize,
    },
}

impl DdnsError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an IP discovery error
    pub fn ip_discovery(msg: impl Into<String>) -> Self {
        Self::IpDiscovery(msg.into())
    }

    /// Create a transport error for a network-level failure (no response)
    pub fn network(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            operation,
            status: None,
            body: String::new(),
            message: err.to_string(),
        }
    }

    /// Create a transport error for a non-2xx response
    pub fn http_status(operation: &'static str, status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::Transport {
            operation,
            status: Some(status),
            message: if body.is_empty() {
                "empty response body".to_string()
            } else {
                body.clone()
            },
            body,
        }
    }

    /// Create a protocol error
    pub fn protocol(operation: &'static str, msg: impl Into<String>) -> Self {
        Self::Protocol {
            operation,
            message: msg.into(),
        }
    }

    /// Stable short label, used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::IpDiscovery(_) => "ip_discovery",
            Self::Transport { .. } => "transport",
            Self::Protocol { .. } => "protocol",
            Self::PartialFailure { .. } => "partial_failure",
        }
    }

    /// HTTP status carried by a transport error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

//==============================================================================
// Tests
//==============================================================================
