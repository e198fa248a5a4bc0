// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session abstraction and node capability surface.
//!
//! The crate never talks to a wire directly. Everything it needs from a
//! server is expressed as two async traits implemented by a transport
//! layer (or by mocks in tests):
//!
//! - [`NodeSource`]: per-node attribute reads, child/variable
//!   enumeration, and method invocation, keyed by opaque [`NodeHandle`]s
//! - [`UaSession`]: connection lifecycle, handle minting, namespace
//!   lookup, and the raw subscription primitives
//!
//! ```text
//! TreeBrowser ──┐
//!               ├──> NodeSource ─┐
//! Resolver ─────┘                ├──> transport implementation
//! SubscriptionManager ──> UaSession ─┘
//! ```
//!
//! Attribute reads return `Ok(None)` for attributes a node legitimately
//! does not carry, and `Err` for transient failures; callers that render
//! best-effort fold both into [`crate::resolve::Resolved`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::UaResult;
use crate::types::{AttributeId, NodeId, QualifiedName, SubscriptionSettings, UaValue};

// =============================================================================
// NodeHandle
// =============================================================================

/// Opaque handle to a server-side node.
///
/// Handles are minted by the session and carry no local state; every
/// attribute is fetched on demand. A handle is only meaningful to the
/// session that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeHandle(pub u64);

impl NodeHandle {
    /// Returns the raw handle value.
    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

// =============================================================================
// SessionState
// =============================================================================

/// Connection state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No connection established.
    Disconnected,

    /// Connection attempt in progress.
    Connecting,

    /// Connected and usable.
    Connected,

    /// Orderly shutdown in progress.
    Closing,

    /// Connection failed or was lost.
    Failed,
}

impl SessionState {
    /// Returns `true` if service calls can be issued in this state.
    #[inline]
    pub const fn is_usable(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Closing => write!(f, "closing"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// =============================================================================
// RawChange
// =============================================================================

/// A raw data-change notification as pushed by the transport.
///
/// Carries the server-assigned monitored item id; the subscription
/// manager translates it into a [`crate::subscription::ChangeEvent`]
/// with local correlation ids before delivery.
#[derive(Debug, Clone)]
pub struct RawChange {
    /// Server-assigned id of the subscription that produced the change.
    pub subscription_id: u32,

    /// Server-assigned id of the monitored item.
    pub item_id: u32,

    /// The new value.
    pub value: UaValue,

    /// Attribute the change refers to (Value for data changes).
    pub attribute: AttributeId,

    /// Server source timestamp.
    pub server_timestamp: DateTime<Utc>,
}

// =============================================================================
// NodeSource
// =============================================================================

/// Per-node capability surface.
///
/// All methods take node handles; the implementation resolves them to
/// whatever wire representation it uses.
#[async_trait]
pub trait NodeSource: Send + Sync {
    /// Reads the browse name of a node.
    ///
    /// Returns `Ok(None)` if the node does not carry a browse name.
    async fn browse_name(&self, node: NodeHandle) -> UaResult<Option<QualifiedName>>;

    /// Reads the canonical node id of a node.
    ///
    /// Returns `Ok(None)` if the identifier is of an unsupported form.
    async fn node_id(&self, node: NodeHandle) -> UaResult<Option<NodeId>>;

    /// Enumerates the structural children of a node.
    ///
    /// Order is whatever the server returns.
    async fn children(&self, node: NodeHandle) -> UaResult<Vec<NodeHandle>>;

    /// Enumerates the value-bearing variable children of a node.
    ///
    /// This is a distinct result set from [`Self::children`]; a node may
    /// appear in both.
    async fn variables(&self, node: NodeHandle) -> UaResult<Vec<NodeHandle>>;

    /// Reads the current value of a variable node.
    async fn read_value(&self, node: NodeHandle) -> UaResult<UaValue>;

    /// Invokes a method node on an object node.
    ///
    /// Argument marshaling beyond [`UaValue`] is the implementation's
    /// concern.
    async fn call_method(
        &self,
        object: NodeHandle,
        method: NodeHandle,
        args: Vec<UaValue>,
    ) -> UaResult<Vec<UaValue>>;
}

// =============================================================================
// UaSession
// =============================================================================

/// Session lifecycle and subscription primitives.
#[async_trait]
pub trait UaSession: NodeSource {
    /// Establishes the connection and activates a session.
    async fn connect(&self) -> UaResult<()>;

    /// Closes the session and drops the connection.
    async fn disconnect(&self) -> UaResult<()>;

    /// Returns the current connection state.
    async fn state(&self) -> SessionState;

    /// Returns a handle to the root folder (ns=0, i=84).
    async fn root_node(&self) -> UaResult<NodeHandle>;

    /// Returns a handle to the objects folder (ns=0, i=85).
    async fn objects_node(&self) -> UaResult<NodeHandle>;

    /// Resolves a node id to a handle.
    ///
    /// # Errors
    ///
    /// Returns a browse error if the node does not exist.
    async fn node(&self, id: &NodeId) -> UaResult<NodeHandle>;

    /// Resolves a namespace URI to its index on this server.
    async fn namespace_index(&self, uri: &str) -> UaResult<u16>;

    /// Creates a subscription on the server.
    ///
    /// Returns the server-assigned subscription id and the revised
    /// publishing interval, which may differ from the requested one.
    async fn create_subscription(
        &self,
        settings: &SubscriptionSettings,
    ) -> UaResult<(u32, Duration)>;

    /// Deletes a subscription on the server.
    async fn delete_subscription(&self, subscription_id: u32) -> UaResult<()>;

    /// Registers a monitored item for an attribute of a node.
    ///
    /// Returns the server-assigned item id (non-zero).
    async fn create_monitored_item(
        &self,
        subscription_id: u32,
        node: NodeHandle,
        attribute: AttributeId,
    ) -> UaResult<u32>;

    /// Removes a monitored item.
    async fn delete_monitored_item(&self, subscription_id: u32, item_id: u32) -> UaResult<()>;

    /// Takes the notification stream.
    ///
    /// The transport pushes every [`RawChange`] into this channel in
    /// server order. The stream can be taken once; subsequent calls
    /// return `None`. The subscription manager owns the receiver for
    /// the lifetime of its dispatch task.
    async fn take_notifications(&self) -> Option<mpsc::Receiver<RawChange>>;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_handle_display() {
        assert_eq!(NodeHandle(42).to_string(), "node-42");
        assert_eq!(NodeHandle(42).value(), 42);
    }

    #[test]
    fn test_session_state_usability() {
        assert!(SessionState::Connected.is_usable());
        assert!(!SessionState::Connecting.is_usable());
        assert!(!SessionState::Failed.is_usable());
    }
}
