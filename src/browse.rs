// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Address-space tree browsing.
//!
//! [`TreeBrowser`] walks the structural hierarchy under a starting node
//! in pre-order (a parent's entry precedes its children's) and produces
//! a [`BrowseReport`]: one entry per structural node, one entry per
//! value-bearing variable leaf.
//!
//! ```text
//! TreeBrowser::browse(root)
//!     │
//!     ├── explicit stack, children pushed in reverse   (pre-order)
//!     ├── visited identifier set                       (cycle defense)
//!     ├── depth cap                                    (runaway defense)
//!     └── per-node failures absorbed, never propagated
//! ```
//!
//! Rendering one report line per entry:
//!
//! ```text
//! NodeId ns=2;i=1001, BrowseName 2:Pump, has 2 variables, has 1 children
//!     - NodeId ns=2;i=1002, BrowseName 2:Speed
//! ```
//!
//! Indentation is four columns per depth level and purely cosmetic.
//! Child order is whatever the session returns; nothing is sorted.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::resolve::AddressResolver;
use crate::session::{NodeHandle, NodeSource};

/// Columns of indentation per depth level.
const INDENT_WIDTH: usize = 4;

// =============================================================================
// BrowseConfig
// =============================================================================

/// Traversal configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseConfig {
    /// Maximum depth to expand. Nodes at the cap are still reported but
    /// their variables and children are not.
    pub max_depth: usize,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self { max_depth: 32 }
    }
}

// =============================================================================
// BrowseEntry / BrowseReport
// =============================================================================

/// Distinguishes structural nodes from variable leaves in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// A structural node whose children are (potentially) expanded.
    Node,

    /// A value-bearing variable leaf; never recursed into.
    Variable,
}

/// One line of a browse report.
///
/// Display fields are best-effort strings; an unresolvable identifier
/// or browse name renders as empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseEntry {
    /// Depth below the starting node (starting node is 0).
    pub depth: usize,

    /// Structural node or variable leaf.
    pub kind: EntryKind,

    /// Rendered canonical identifier, or empty.
    pub identifier: String,

    /// Rendered browse name, or empty.
    pub browse_name: String,

    /// Number of variable leaves under this node.
    pub variable_count: usize,

    /// Number of structural children under this node.
    pub child_count: usize,

    /// Identifier was already reported earlier in this pass; the node
    /// was not expanded.
    pub repeated: bool,
}

impl BrowseEntry {
    /// Renders the entry as one indented report line.
    pub fn render_line(&self) -> String {
        let mut line = String::with_capacity(64);
        for _ in 0..self.depth * INDENT_WIDTH {
            line.push(' ');
        }

        match self.kind {
            EntryKind::Node => {
                let _ = write!(
                    line,
                    "NodeId {}, BrowseName {}",
                    self.identifier, self.browse_name
                );
                if self.variable_count > 0 {
                    let _ = write!(line, ", has {} variables", self.variable_count);
                }
                if self.child_count > 0 {
                    let _ = write!(line, ", has {} children", self.child_count);
                }
                if self.repeated {
                    line.push_str(" (repeated)");
                }
            }
            EntryKind::Variable => {
                let _ = write!(
                    line,
                    "- NodeId {}, BrowseName {}",
                    self.identifier, self.browse_name
                );
            }
        }

        line
    }
}

/// Result of one traversal pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowseReport {
    /// Entries in pre-order.
    pub entries: Vec<BrowseEntry>,

    /// Structural nodes reported.
    pub node_count: usize,

    /// Variable leaves reported.
    pub variable_count: usize,

    /// Per-node failures absorbed during the pass.
    pub error_count: usize,
}

impl BrowseReport {
    /// Renders the full report, one line per entry.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.render_line());
            out.push('\n');
        }
        out
    }
}

// =============================================================================
// BrowseStatistics
// =============================================================================

/// Cumulative browsing statistics across passes.
#[derive(Debug, Default)]
pub struct BrowseStatistics {
    nodes_visited: AtomicU64,
    variables_listed: AtomicU64,
    errors_absorbed: AtomicU64,
    repeats_detected: AtomicU64,
    depth_limited: AtomicU64,
}

impl BrowseStatistics {
    /// Returns a point-in-time snapshot.
    pub fn snapshot(&self) -> BrowseStatisticsSnapshot {
        BrowseStatisticsSnapshot {
            nodes_visited: self.nodes_visited.load(Ordering::Relaxed),
            variables_listed: self.variables_listed.load(Ordering::Relaxed),
            errors_absorbed: self.errors_absorbed.load(Ordering::Relaxed),
            repeats_detected: self.repeats_detected.load(Ordering::Relaxed),
            depth_limited: self.depth_limited.load(Ordering::Relaxed),
        }
    }
}

/// Plain-value view of [`BrowseStatistics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseStatisticsSnapshot {
    /// Structural nodes reported.
    pub nodes_visited: u64,

    /// Variable leaves reported.
    pub variables_listed: u64,

    /// Per-node failures absorbed.
    pub errors_absorbed: u64,

    /// Cycle repeats detected.
    pub repeats_detected: u64,

    /// Nodes left unexpanded by the depth cap.
    pub depth_limited: u64,
}

// =============================================================================
// TreeBrowser
// =============================================================================

/// Pre-order depth-first browser over a [`NodeSource`].
///
/// # Examples
///
/// ```no_run
/// # async fn example(session: &dyn uascope::session::UaSession) -> uascope::error::UaResult<()> {
/// use uascope::browse::TreeBrowser;
///
/// let browser = TreeBrowser::new(session);
/// let root = session.objects_node().await?;
/// let report = browser.browse(root).await;
/// print!("{}", report.render());
/// # Ok(())
/// # }
/// ```
pub struct TreeBrowser<'a, S: NodeSource + ?Sized> {
    source: &'a S,
    config: BrowseConfig,
    stats: BrowseStatistics,
}

impl<'a, S: NodeSource + ?Sized> TreeBrowser<'a, S> {
    /// Creates a browser with the default configuration.
    pub fn new(source: &'a S) -> Self {
        Self::with_config(source, BrowseConfig::default())
    }

    /// Creates a browser with an explicit configuration.
    pub fn with_config(source: &'a S, config: BrowseConfig) -> Self {
        Self {
            source,
            config,
            stats: BrowseStatistics::default(),
        }
    }

    /// Returns the cumulative statistics.
    pub fn statistics(&self) -> &BrowseStatistics {
        &self.stats
    }

    /// Walks the hierarchy under `root` and returns the report.
    ///
    /// Never fails: per-node attribute and enumeration failures are
    /// absorbed, counted, and logged at debug level. The walk tracks
    /// resolved identifiers per pass and stops expanding on a repeat,
    /// and stops expanding below the configured depth cap.
    pub async fn browse(&self, root: NodeHandle) -> BrowseReport {
        let resolver = AddressResolver::new(self.source);
        let mut report = BrowseReport::default();
        let mut visited: HashSet<String> = HashSet::new();

        // Explicit stack; children pushed in reverse preserve server
        // order in pre-order emission.
        let mut stack: Vec<(NodeHandle, usize)> = vec![(root, 0)];

        while let Some((node, depth)) = stack.pop() {
            let identifier = resolver.resolve_identifier(node).await;
            let browse_name = resolver.resolve_name(node).await;

            let id_str = identifier.render_or_empty();
            let name_str = browse_name.render_or_empty();

            // Unresolvable identifiers cannot be deduplicated.
            let repeated = !id_str.is_empty() && !visited.insert(id_str.clone());
            if repeated {
                self.stats.repeats_detected.fetch_add(1, Ordering::Relaxed);
                debug!(node = %node, identifier = %id_str, "repeated node, not expanding");
            }

            let depth_capped = depth >= self.config.max_depth;
            if depth_capped && !repeated {
                self.stats.depth_limited.fetch_add(1, Ordering::Relaxed);
                debug!(node = %node, depth, "depth cap reached, not expanding");
            }
            let expand = !repeated && !depth_capped;

            let variables = if expand {
                self.enumerate(node, "variables", &mut report, || {
                    self.source.variables(node)
                })
                .await
            } else {
                Vec::new()
            };
            let children = if expand {
                self.enumerate(node, "children", &mut report, || self.source.children(node))
                    .await
            } else {
                Vec::new()
            };

            report.entries.push(BrowseEntry {
                depth,
                kind: EntryKind::Node,
                identifier: id_str,
                browse_name: name_str,
                variable_count: variables.len(),
                child_count: children.len(),
                repeated,
            });
            report.node_count += 1;
            self.stats.nodes_visited.fetch_add(1, Ordering::Relaxed);

            for var in &variables {
                let var_id = resolver.resolve_identifier(*var).await;
                let var_name = resolver.resolve_name(*var).await;
                report.entries.push(BrowseEntry {
                    depth: depth + 1,
                    kind: EntryKind::Variable,
                    identifier: var_id.render_or_empty(),
                    browse_name: var_name.render_or_empty(),
                    variable_count: 0,
                    child_count: 0,
                    repeated: false,
                });
                report.variable_count += 1;
                self.stats.variables_listed.fetch_add(1, Ordering::Relaxed);
            }

            for child in children.into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }

        info!(
            nodes = report.node_count,
            variables = report.variable_count,
            errors = report.error_count,
            "browse pass complete"
        );

        report
    }

    /// Runs a child/variable enumeration, absorbing failures into the
    /// report's error count.
    async fn enumerate<F, Fut>(
        &self,
        node: NodeHandle,
        set: &'static str,
        report: &mut BrowseReport,
        fetch: F,
    ) -> Vec<NodeHandle>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = crate::error::UaResult<Vec<NodeHandle>>>,
    {
        match fetch().await {
            Ok(handles) => handles,
            Err(e) => {
                report.error_count += 1;
                self.stats.errors_absorbed.fetch_add(1, Ordering::Relaxed);
                debug!(node = %node, set, error = %e, "enumeration failed, continuing");
                Vec::new()
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

    #[test]
    fn test_node_line_rendering() {
        let entry = BrowseEntry {
            depth: 1,
            kind: EntryKind::Node,
            identifier: "ns=2;i=1001".into(),
            browse_name: "2:Pump".into(),
            variable_count: 2,
            child_count: 1,
            repeated: false,
        };
        assert_eq!(
            entry.render_line(),
            "    NodeId ns=2;i=1001, BrowseName 2:Pump, has 2 variables, has 1 children"
        );
    }

    #[test]
    fn test_zero_counts_are_omitted() {
        let entry = BrowseEntry {
            depth: 0,
            kind: EntryKind::Node,
            identifier: "ns=0;i=85".into(),
            browse_name: "0:Objects".into(),
            variable_count: 0,
            child_count: 0,
            repeated: false,
        };
        assert_eq!(entry.render_line(), "NodeId ns=0;i=85, BrowseName 0:Objects");
    }

    #[test]
    fn test_variable_line_rendering() {
        let entry = BrowseEntry {
            depth: 2,
            kind: EntryKind::Variable,
            identifier: "ns=2;i=1002".into(),
            browse_name: "2:Speed".into(),
            variable_count: 0,
            child_count: 0,
            repeated: false,
        };
        assert_eq!(
            entry.render_line(),
            "        - NodeId ns=2;i=1002, BrowseName 2:Speed"
        );
    }

    #[test]
    fn test_repeat_marker() {
        let entry = BrowseEntry {
            depth: 0,
            kind: EntryKind::Node,
            identifier: "ns=2;i=1".into(),
            browse_name: "2:Loop".into(),
            variable_count: 0,
            child_count: 0,
            repeated: true,
        };
        assert!(entry.render_line().ends_with("(repeated)"));
    }

    #[test]
    fn test_empty_placeholder_rendering() {
        let entry = BrowseEntry {
            depth: 0,
            kind: EntryKind::Node,
            identifier: String::new(),
            browse_name: "2:Partial".into(),
            variable_count: 0,
            child_count: 0,
            repeated: false,
        };
        assert_eq!(entry.render_line(), "NodeId , BrowseName 2:Partial");
    }
}
