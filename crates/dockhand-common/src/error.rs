//! Unified error types for the dockhand workspace.
//!
//! Every rejection the control plane can produce is a variant of
//! [`DockhandError`]. The orchestrator recovers ordinary rejections into a
//! user-facing message; local storage failures are kept apart through
//! [`DockhandError::is_local_storage_failure`].

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Role;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum DockhandError {
    /// No authenticated identity accompanied the request.
    #[error("authentication required")]
    Unauthenticated,

    /// The authenticated identity lacks the required role.
    #[error("user {username} lacks the {required} role")]
    Forbidden {
        /// Username of the rejected actor.
        username: String,
        /// Role the operation requires.
        required: Role,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A container with the requested name already exists.
    #[error("container name already exists: {name}")]
    NameConflict {
        /// The conflicting name.
        name: String,
    },

    /// The requested image is outside the provisioning allowlist.
    #[error("unknown application type: {image}")]
    UnknownImageType {
        /// The rejected image reference.
        image: String,
    },

    /// The runtime could not bind the requested host port.
    #[error("host port {port} is already in use")]
    PortInUse {
        /// Host port that was requested.
        port: u16,
    },

    /// Any other failure reported by the container runtime.
    #[error("runtime error: {message}")]
    Runtime {
        /// Message reported by the runtime.
        message: String,
    },

    /// Caller input failed validation before any side effect.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the invalid input.
        message: String,
    },

    /// The caller cancelled the operation while it was in flight.
    #[error("{operation} cancelled")]
    Cancelled {
        /// Runtime operation that was aborted.
        operation: &'static str,
    },

    /// The runtime did not answer within the configured deadline.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        /// Runtime operation that was aborted.
        operation: &'static str,
        /// Deadline that elapsed.
        seconds: u64,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The credential store rejected or could not process a request.
    #[error("credential store error: {message}")]
    Credentials {
        /// Description of the failure.
        message: String,
    },

    /// A mutation succeeded against the runtime but its audit entry was lost.
    #[error("'{action}' succeeded but could not be audited: {source}")]
    AuditFailed {
        /// Action text that could not be recorded.
        action: String,
        /// Underlying storage failure.
        source: Box<DockhandError>,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl DockhandError {
    /// Returns whether this failure comes from local durable storage
    /// rather than from an ordinary rejection.
    #[must_use]
    pub const fn is_local_storage_failure(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::AuditFailed { .. })
    }

    /// Returns the message shown to an operator for this failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthenticated => "Login required".into(),
            Self::Forbidden { .. } => "Admin access required".into(),
            Self::NotFound { .. } => "Container not found".into(),
            Self::NameConflict { .. } => "Container name already exists".into(),
            Self::UnknownImageType { .. } => "Unknown application type".into(),
            Self::PortInUse { .. } => "Port already in use".into(),
            Self::Runtime { message } => format!("Docker error: {message}"),
            Self::AuditFailed { action, .. } => {
                format!("'{action}' completed but the audit trail could not be written")
            }
            other => other.to_string(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DockhandError>;
