// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Best-effort resolution of node display attributes.
//!
//! Browse names and canonical identifiers are display-oriented: a node
//! may legitimately lack them, and a transient read failure must never
//! abort a traversal. [`AddressResolver`] therefore returns a
//! three-state [`Resolved`] instead of a `Result`, and renderers
//! pattern-match on it rather than suppressing errors in control flow.
//!
//! No caching: every call re-resolves against the session.

use tracing::debug;

use crate::session::{NodeHandle, NodeSource};
use crate::types::{NodeId, QualifiedName};

// =============================================================================
// Resolved
// =============================================================================

/// Outcome of a best-effort attribute fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<T> {
    /// The attribute was read successfully.
    Resolved(T),

    /// The node does not carry this attribute.
    Absent,

    /// The read failed transiently; the reason is kept for logging only.
    Failed(String),
}

impl<T> Resolved<T> {
    /// Returns the resolved value, if any.
    #[inline]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Resolved(v) => Some(v),
            _ => None,
        }
    }

    /// Consumes and returns the resolved value, if any.
    #[inline]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Resolved(v) => Some(v),
            _ => None,
        }
    }

    /// Returns `true` if the attribute was resolved.
    #[inline]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Maps the resolved value, preserving the other states.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        match self {
            Self::Resolved(v) => Resolved::Resolved(f(v)),
            Self::Absent => Resolved::Absent,
            Self::Failed(reason) => Resolved::Failed(reason),
        }
    }
}

impl<T: ToString> Resolved<T> {
    /// Renders the value, or an empty string for the absent and failed
    /// states. Renderers treat both the same way.
    pub fn render_or_empty(&self) -> String {
        match self {
            Self::Resolved(v) => v.to_string(),
            Self::Absent | Self::Failed(_) => String::new(),
        }
    }
}

// =============================================================================
// AddressResolver
// =============================================================================

/// Resolves node display attributes against a [`NodeSource`].
pub struct AddressResolver<'a, S: NodeSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: NodeSource + ?Sized> AddressResolver<'a, S> {
    /// Creates a resolver over a node source.
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Resolves the browse name of a node.
    pub async fn resolve_name(&self, node: NodeHandle) -> Resolved<QualifiedName> {
        match self.source.browse_name(node).await {
            Ok(Some(name)) => Resolved::Resolved(name),
            Ok(None) => Resolved::Absent,
            Err(e) => {
                debug!(node = %node, error = %e, "browse name resolution failed");
                Resolved::Failed(e.to_string())
            }
        }
    }

    /// Resolves the canonical identifier of a node.
    pub async fn resolve_identifier(&self, node: NodeHandle) -> Resolved<NodeId> {
        match self.source.node_id(node).await {
            Ok(Some(id)) => Resolved::Resolved(id),
            Ok(None) => Resolved::Absent,
            Err(e) => {
                debug!(node = %node, error = %e, "node id resolution failed");
                Resolved::Failed(e.to_string())
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;

    #[test]
    fn test_resolved_accessors() {
        let r = Resolved::Resolved(NodeId::numeric(2, 1));
        assert!(r.is_resolved());
        assert_eq!(r.value(), Some(&NodeId::numeric(2, 1)));

        let a: Resolved<NodeId> = Resolved::Absent;
        assert!(a.value().is_none());
    }

    #[test]
    fn test_render_or_empty_folds_absent_and_failed() {
        let r = Resolved::Resolved(NodeId::numeric(0, 84));
        assert_eq!(r.render_or_empty(), "ns=0;i=84");

        let a: Resolved<NodeId> = Resolved::Absent;
        assert_eq!(a.render_or_empty(), "");

        let f: Resolved<NodeId> = Resolved::Failed("timeout".into());
        assert_eq!(f.render_or_empty(), "");
    }

    #[test]
    fn test_map_preserves_state() {
        let r = Resolved::Resolved(5).map(|v| v * 2);
        assert_eq!(r, Resolved::Resolved(10));

        let f: Resolved<i32> = Resolved::Failed("x".into());
        assert_eq!(f.map(|v| v * 2), Resolved::Failed("x".into()));
    }
}
