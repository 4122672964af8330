//! Error types for the blelink core
//!
//! The link manager never fails outward while running: every anomaly a caller
//! needs to react to is published as a [`ConnectionState`](crate::ConnectionState).
//! [`LinkError`] gives those failure states a typed form and covers the few
//! operations (UUID parsing, session validation, reconnect without a session)
//! that report synchronously.

use thiserror::Error;

// ----------------------------------------------------------------------------
// Adapter Errors
// ----------------------------------------------------------------------------

/// Error reported by a platform adapter alongside an asynchronous event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AdapterError {
    message: String,
}

impl AdapterError {
    /// Create an adapter error from any displayable platform error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Human-readable error text
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ----------------------------------------------------------------------------
// Link Errors
// ----------------------------------------------------------------------------

/// Errors surfaced by the link manager
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("Bluetooth radio unavailable: {state}")]
    RadioUnavailable { state: String },

    #[error("Scan stopped without a connection")]
    ScanTimedOut,

    #[error("Failed to connect to peripheral")]
    ConnectFailed,

    #[error("Failed to discover services")]
    ServiceDiscoveryFailed,

    #[error("Failed to discover characteristics")]
    CharacteristicDiscoveryFailed,

    #[error("No session configured: call connect before reconnect")]
    MissingSessionConfig,

    #[error("Incomplete session configuration: missing {missing}")]
    IncompleteSessionConfig { missing: String },

    #[error("Invalid UUID: {0}")]
    InvalidUuid(String),
}

/// Result type for link operations
pub type LinkResult<T> = Result<T, LinkError>;
