// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for OPC UA client operations.
//!
//! This module provides the error hierarchy used throughout the crate:
//!
//! ```text
//! UaError
//! ├── Session       - Connection and session lifecycle failures
//! ├── Browse        - Address-space traversal failures
//! ├── Subscription  - Subscription and monitored-item errors
//! └── Configuration - Invalid settings and unparsable node ids
//! ```
//!
//! Per-node attribute failures during browsing are deliberately *not*
//! represented here as propagated errors: the browser absorbs them and
//! renders partial information (see [`crate::resolve::Resolved`]). Errors
//! in this module are the ones that cross an API boundary.
//!
//! # Examples
//!
//! ```
//! use uascope::error::{UaError, SubscriptionError};
//!
//! let err = UaError::subscription(SubscriptionError::monitored_item_rejected(
//!     "ns=2;s=Pump.Speed",
//!     "node is not a variable",
//! ));
//! assert_eq!(err.category(), "subscription");
//! assert!(!err.is_retryable());
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::Level;

/// Convenience result alias for OPC UA operations.
pub type UaResult<T> = Result<T, UaError>;

// =============================================================================
// UaError - Main Error Type
// =============================================================================

/// The main error type for OPC UA client operations.
#[derive(Debug, Error)]
pub enum UaError {
    /// Connection and session lifecycle errors.
    #[error("{0}")]
    Session(#[from] SessionError),

    /// Address-space browsing errors.
    #[error("{0}")]
    Browse(#[from] BrowseError),

    /// Subscription and monitored-item errors.
    #[error("{0}")]
    Subscription(#[from] SubscriptionError),

    /// Configuration errors.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),
}

impl UaError {
    /// Creates a session error.
    #[inline]
    pub fn session(error: SessionError) -> Self {
        Self::Session(error)
    }

    /// Creates a browse error.
    #[inline]
    pub fn browse(error: BrowseError) -> Self {
        Self::Browse(error)
    }

    /// Creates a subscription error.
    #[inline]
    pub fn subscription(error: SubscriptionError) -> Self {
        Self::Subscription(error)
    }

    /// Creates a configuration error.
    #[inline]
    pub fn configuration(error: ConfigurationError) -> Self {
        Self::Configuration(error)
    }

    /// Creates a not-connected error.
    pub fn not_connected() -> Self {
        Self::Session(SessionError::NotConnected)
    }

    /// Creates a node-not-found error.
    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        Self::Browse(BrowseError::node_not_found(node_id))
    }

    /// Returns `true` if this error is likely transient and worth retrying.
    ///
    /// This crate never retries on its own; the hint is for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Session(e) => e.is_retryable(),
            Self::Browse(e) => e.is_retryable(),
            Self::Subscription(_) => false,
            Self::Configuration(_) => false,
        }
    }

    /// Returns the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Session(e) => e.severity(),
            Self::Browse(_) => ErrorSeverity::Warning,
            Self::Subscription(_) => ErrorSeverity::Error,
            Self::Configuration(_) => ErrorSeverity::Critical,
        }
    }

    /// Returns the error category for logging and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Session(_) => "session",
            Self::Browse(_) => "browse",
            Self::Subscription(_) => "subscription",
            Self::Configuration(_) => "configuration",
        }
    }

    /// Logs this error with a level matching its severity.
    pub fn log(&self, context: &str) {
        match self.severity().to_tracing_level() {
            Level::ERROR => tracing::error!(
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            Level::WARN => tracing::warn!(
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            _ => tracing::debug!(
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
        }
    }
}

// =============================================================================
// ErrorSeverity
// =============================================================================

/// Severity classification for errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational; recovered locally.
    Info,

    /// Degraded but operational.
    Warning,

    /// Operation failed.
    Error,

    /// Configuration or invariant violation; not recoverable at runtime.
    Critical,
}

impl ErrorSeverity {
    /// Maps the severity to a tracing level.
    pub fn to_tracing_level(self) -> Level {
        match self {
            Self::Info => Level::DEBUG,
            Self::Warning => Level::WARN,
            Self::Error => Level::ERROR,
            Self::Critical => Level::ERROR,
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

// =============================================================================
// SessionError
// =============================================================================

/// Connection and session lifecycle errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Operation attempted while not connected.
    #[error("Not connected to server")]
    NotConnected,

    /// Connection attempt failed.
    #[error("Connection failed to '{endpoint}': {reason}")]
    ConnectFailed {
        /// Target endpoint.
        endpoint: String,
        /// Failure description.
        reason: String,
    },

    /// Connection was lost while in use.
    #[error("Connection lost: {reason}")]
    ConnectionLost {
        /// Failure description.
        reason: String,
    },

    /// Operation timed out.
    #[error("Session operation timed out after {duration:?}")]
    TimedOut {
        /// Elapsed duration.
        duration: Duration,
    },

    /// The requested namespace URI is unknown to the server.
    #[error("Unknown namespace URI '{uri}'")]
    UnknownNamespace {
        /// The URI that failed to resolve.
        uri: String,
    },
}

impl SessionError {
    /// Creates a connect-failed error.
    pub fn connect_failed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectFailed {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates a connection-lost error.
    pub fn connection_lost(reason: impl Into<String>) -> Self {
        Self::ConnectionLost {
            reason: reason.into(),
        }
    }

    /// Creates an unknown-namespace error.
    pub fn unknown_namespace(uri: impl Into<String>) -> Self {
        Self::UnknownNamespace { uri: uri.into() }
    }

    /// Returns `true` if this error is likely transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailed { .. } | Self::ConnectionLost { .. } | Self::TimedOut { .. }
        )
    }

    /// Returns the severity of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotConnected => ErrorSeverity::Error,
            Self::ConnectFailed { .. } => ErrorSeverity::Error,
            Self::ConnectionLost { .. } => ErrorSeverity::Error,
            Self::TimedOut { .. } => ErrorSeverity::Warning,
            Self::UnknownNamespace { .. } => ErrorSeverity::Error,
        }
    }
}

// =============================================================================
// BrowseError
// =============================================================================

/// Address-space browsing errors.
///
/// These surface only at API boundaries (e.g. an unresolvable starting
/// node). Mid-traversal failures are absorbed by the browser.
#[derive(Debug, Error)]
pub enum BrowseError {
    /// The requested node does not exist on the server.
    #[error("Node not found: '{node_id}'")]
    NodeNotFound {
        /// The node id that failed to resolve.
        node_id: String,
    },

    /// Reading a node attribute failed.
    #[error("Failed to read attribute {attribute} of '{node_id}': {reason}")]
    AttributeUnavailable {
        /// The node whose attribute was requested.
        node_id: String,
        /// The attribute that was requested.
        attribute: &'static str,
        /// Failure description.
        reason: String,
    },

    /// Enumerating a node's children or variables failed.
    #[error("Failed to enumerate {set} of '{node_id}': {reason}")]
    ChildEnumerationFailed {
        /// The node whose children were requested.
        node_id: String,
        /// Which result set failed ("children" or "variables").
        set: &'static str,
        /// Failure description.
        reason: String,
    },
}

impl BrowseError {
    /// Creates a node-not-found error.
    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        Self::NodeNotFound {
            node_id: node_id.into(),
        }
    }

    /// Creates an attribute-unavailable error.
    pub fn attribute_unavailable(
        node_id: impl Into<String>,
        attribute: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::AttributeUnavailable {
            node_id: node_id.into(),
            attribute,
            reason: reason.into(),
        }
    }

    /// Creates a child-enumeration error.
    pub fn child_enumeration_failed(
        node_id: impl Into<String>,
        set: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::ChildEnumerationFailed {
            node_id: node_id.into(),
            set,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error is likely transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AttributeUnavailable { .. } | Self::ChildEnumerationFailed { .. }
        )
    }
}

// =============================================================================
// SubscriptionError
// =============================================================================

/// Subscription and monitored-item errors.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// Creating the subscription on the server failed.
    #[error("Subscription creation failed: {reason}")]
    CreationFailed {
        /// Failure description.
        reason: String,
    },

    /// The server rejected a monitored-item registration.
    #[error("Monitored item rejected for '{node_id}': {reason}")]
    MonitoredItemRejected {
        /// The node that was to be monitored.
        node_id: String,
        /// Failure description.
        reason: String,
    },

    /// The referenced subscription does not exist.
    #[error("Subscription {id} not found")]
    NotFound {
        /// The missing subscription id.
        id: u32,
    },

    /// Operation attempted on a closed subscription.
    #[error("Subscription {id} is closed")]
    Closed {
        /// The closed subscription id.
        id: u32,
    },
}

impl SubscriptionError {
    /// Creates a creation-failed error.
    pub fn creation_failed(reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            reason: reason.into(),
        }
    }

    /// Creates a monitored-item-rejected error.
    pub fn monitored_item_rejected(
        node_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MonitoredItemRejected {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(id: u32) -> Self {
        Self::NotFound { id }
    }
}

// =============================================================================
// ConfigurationError
// =============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A required field is missing.
    #[error("Missing required field '{field}'")]
    MissingField {
        /// The missing field name.
        field: &'static str,
    },

    /// The endpoint URL is invalid.
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// The offending endpoint.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A node id string could not be parsed.
    #[error("Invalid node id '{input}': {reason}")]
    InvalidNodeId {
        /// The unparsable input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An interval or timeout is out of range.
    #[error("Invalid interval {value:?}: {reason}")]
    InvalidInterval {
        /// The offending value.
        value: Duration,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigurationError {
    /// Creates a missing-field error.
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Creates an invalid-endpoint error.
    pub fn invalid_endpoint(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-node-id error.
    pub fn invalid_node_id(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-interval error.
    pub fn invalid_interval(value: Duration, reason: impl Into<String>) -> Self {
        Self::InvalidInterval {
            value,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        assert_eq!(UaError::not_connected().category(), "session");
        assert_eq!(UaError::node_not_found("ns=2;i=1").category(), "browse");
        assert_eq!(
            UaError::subscription(SubscriptionError::not_found(7)).category(),
            "subscription"
        );
        assert_eq!(
            UaError::configuration(ConfigurationError::missing_field("endpoint")).category(),
            "configuration"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(UaError::session(SessionError::connection_lost("reset")).is_retryable());
        assert!(!UaError::not_connected().is_retryable());
        assert!(!UaError::subscription(SubscriptionError::creation_failed("rejected"))
            .is_retryable());
        assert!(!UaError::configuration(ConfigurationError::missing_field("endpoint"))
            .is_retryable());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Critical > ErrorSeverity::Error);
        assert!(ErrorSeverity::Error > ErrorSeverity::Warning);
        assert_eq!(
            UaError::configuration(ConfigurationError::missing_field("endpoint")).severity(),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_error_display() {
        let err = UaError::browse(BrowseError::child_enumeration_failed(
            "ns=2;i=1001",
            "children",
            "server fault",
        ));
        assert_eq!(
            err.to_string(),
            "Failed to enumerate children of 'ns=2;i=1001': server fault"
        );
    }
}
