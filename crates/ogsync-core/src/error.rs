//! Error types for ogsync
//!
//! Every failure the reconciliation engine can surface is a variant here.
//! Callers match on the variant instead of inspecting messages.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for ogsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ogsync
#[derive(Error, Debug)]
pub enum Error {
    /// Input literal is not an IPv4 address or CIDR network
    #[error("Malformed address: {literal}")]
    MalformedAddress {
        /// The rejected literal
        literal: String,
    },

    /// The device rejected the supplied credentials
    #[error("Authentication failed for {host}")]
    Authentication {
        /// Management address of the device
        host: String,
    },

    /// The device did not accept a connection in time
    #[error("Connection to {host} timed out after {timeout:?}")]
    ConnectTimeout {
        /// Management address of the device
        host: String,
        /// The timeout that elapsed
        timeout: Duration,
    },

    /// The device did not answer a read or push in time
    #[error("Timed out waiting for {host} after {timeout:?}")]
    ReadTimeout {
        /// Management address of the device
        host: String,
        /// The timeout that elapsed
        timeout: Duration,
    },

    /// The persistence step timed out after commands were pushed.
    ///
    /// The device may hold the new configuration without having saved it.
    #[error("Commit/write on {host} timed out after {timeout:?}; verify the device manually")]
    WriteTimeout {
        /// Management address of the device
        host: String,
        /// The timeout that elapsed
        timeout: Duration,
    },

    /// Any other transport failure (session dropped, unexpected prompt, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The resolver has no record for the name
    #[error("No such name: {0}")]
    NameNotFound(String),

    /// The resolver could not be reached
    #[error("Resolver unreachable: {0}")]
    ResolverUnreachable(String),

    /// The device directory could not be reached
    #[error("Device directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// The device directory has no such device
    #[error("No device in directory: {hostname}")]
    DirectoryDeviceNotFound {
        /// The hostname that was looked up
        hostname: String,
    },

    /// Vendor tag outside the supported set
    #[error("Unsupported vendor: {0}")]
    UnsupportedVendor(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a malformed address error
    pub fn malformed(literal: impl Into<String>) -> Self {
        Self::MalformedAddress {
            literal: literal.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(host: impl Into<String>) -> Self {
        Self::Authentication { host: host.into() }
    }

    /// Create a generic transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a device-not-found error
    pub fn device_not_found(hostname: impl Into<String>) -> Self {
        Self::DirectoryDeviceNotFound {
            hostname: hostname.into(),
        }
    }

    /// Whether retrying the whole operation later can succeed without
    /// operator intervention.
    ///
    /// A `WriteTimeout` is deliberately not retryable: the device state is
    /// unknown until someone checks it.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectTimeout { .. }
                | Self::ReadTimeout { .. }
                | Self::Transport(_)
                | Self::ResolverUnreachable(_)
                | Self::DirectoryUnavailable(_)
        )
    }

    /// Whether the failure happened after the device may have been changed
    pub fn needs_manual_verification(&self) -> bool {
        matches!(self, Self::WriteTimeout { .. })
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
