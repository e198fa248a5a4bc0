// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Scriptable in-memory session for integration tests.
//!
//! `MockSession` holds an address space as a handle-keyed node table
//! with per-node failure injection, mints subscription and item ids
//! starting at 1, and exposes `push_change` to simulate server
//! notifications.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{mpsc, Mutex, RwLock};

use uascope::error::{BrowseError, SessionError, UaError, UaResult};
use uascope::session::{NodeHandle, NodeSource, RawChange, SessionState, UaSession};
use uascope::types::{AttributeId, NodeId, QualifiedName, SubscriptionSettings, UaValue};

/// Handle of the pre-seeded root folder node.
pub const ROOT_HANDLE: u64 = 1;

/// Handle of the pre-seeded objects folder node.
pub const OBJECTS_HANDLE: u64 = 2;

/// One scripted node of the mock address space.
#[derive(Debug, Clone)]
pub struct MockNode {
    pub node_id: Option<NodeId>,
    pub browse_name: Option<QualifiedName>,
    pub children: Vec<u64>,
    pub variables: Vec<u64>,
    pub value: UaValue,
    pub fail_node_id: bool,
    pub fail_browse_name: bool,
    pub fail_children: bool,
    pub fail_variables: bool,
}

impl Default for MockNode {
    fn default() -> Self {
        Self {
            node_id: None,
            browse_name: None,
            children: Vec::new(),
            variables: Vec::new(),
            value: UaValue::Null,
            fail_node_id: false,
            fail_browse_name: false,
            fail_children: false,
            fail_variables: false,
        }
    }
}

impl MockNode {
    pub fn new(node_id: NodeId, browse_name: QualifiedName) -> Self {
        Self {
            node_id: Some(node_id),
            browse_name: Some(browse_name),
            ..Self::default()
        }
    }

    pub fn with_children(mut self, children: Vec<u64>) -> Self {
        self.children = children;
        self
    }

    pub fn with_variables(mut self, variables: Vec<u64>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_value(mut self, value: UaValue) -> Self {
        self.value = value;
        self
    }
}

pub struct MockSession {
    nodes: RwLock<HashMap<u64, MockNode>>,
    connected: AtomicBool,
    next_subscription_id: AtomicU32,
    next_item_id: AtomicU32,
    revised_interval: Mutex<Option<Duration>>,
    rejected_nodes: RwLock<HashSet<u64>>,
    namespaces: RwLock<HashMap<String, u16>>,
    method_results: RwLock<HashMap<(u64, u64), Vec<UaValue>>>,
    notify_tx: mpsc::Sender<RawChange>,
    notify_rx: Mutex<Option<mpsc::Receiver<RawChange>>>,
    deleted_subscriptions: RwLock<Vec<u32>>,
    deleted_items: RwLock<Vec<(u32, u32)>>,
}

impl MockSession {
    pub fn new() -> Self {
        let (notify_tx, notify_rx) = mpsc::channel(256);
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT_HANDLE,
            MockNode::new(NodeId::ROOT_FOLDER, QualifiedName::new(0, "Root"))
                .with_children(vec![OBJECTS_HANDLE]),
        );
        nodes.insert(
            OBJECTS_HANDLE,
            MockNode::new(NodeId::OBJECTS_FOLDER, QualifiedName::new(0, "Objects")),
        );

        Self {
            nodes: RwLock::new(nodes),
            connected: AtomicBool::new(true),
            next_subscription_id: AtomicU32::new(1),
            next_item_id: AtomicU32::new(1),
            revised_interval: Mutex::new(None),
            rejected_nodes: RwLock::new(HashSet::new()),
            namespaces: RwLock::new(HashMap::new()),
            method_results: RwLock::new(HashMap::new()),
            notify_tx,
            notify_rx: Mutex::new(Some(notify_rx)),
            deleted_subscriptions: RwLock::new(Vec::new()),
            deleted_items: RwLock::new(Vec::new()),
        }
    }

    /// Adds or replaces a node of the mock address space.
    pub async fn add_node(&self, handle: u64, node: MockNode) {
        self.nodes.write().await.insert(handle, node);
    }

    /// Makes monitored-item registration fail for a node.
    pub async fn reject_monitored_item(&self, handle: u64) {
        self.rejected_nodes.write().await.insert(handle);
    }

    /// Fixes the revised publishing interval returned on creation.
    pub async fn set_revised_interval(&self, interval: Duration) {
        *self.revised_interval.lock().await = Some(interval);
    }

    /// Registers a namespace URI.
    pub async fn add_namespace(&self, uri: &str, index: u16) {
        self.namespaces.write().await.insert(uri.to_string(), index);
    }

    /// Scripts the result of a method invocation.
    pub async fn add_method_result(&self, object: u64, method: u64, result: Vec<UaValue>) {
        self.method_results
            .write()
            .await
            .insert((object, method), result);
    }

    /// Simulates a server-pushed data change.
    pub async fn push_change(&self, subscription_id: u32, item_id: u32, value: UaValue) {
        self.notify_tx
            .send(RawChange {
                subscription_id,
                item_id,
                value,
                attribute: AttributeId::Value,
                server_timestamp: Utc::now(),
            })
            .await
            .unwrap();
    }

    /// Subscriptions deleted on the server side.
    pub async fn deleted_subscriptions(&self) -> Vec<u32> {
        self.deleted_subscriptions.read().await.clone()
    }

    /// Monitored items deleted on the server side.
    pub async fn deleted_items(&self) -> Vec<(u32, u32)> {
        self.deleted_items.read().await.clone()
    }

    async fn get(&self, node: NodeHandle) -> UaResult<MockNode> {
        self.nodes
            .read()
            .await
            .get(&node.0)
            .cloned()
            .ok_or_else(|| UaError::node_not_found(node.to_string()))
    }
}

#[async_trait]
impl NodeSource for MockSession {
    async fn browse_name(&self, node: NodeHandle) -> UaResult<Option<QualifiedName>> {
        let n = self.get(node).await?;
        if n.fail_browse_name {
            return Err(UaError::browse(BrowseError::attribute_unavailable(
                node.to_string(),
                "BrowseName",
                "injected failure",
            )));
        }
        Ok(n.browse_name)
    }

    async fn node_id(&self, node: NodeHandle) -> UaResult<Option<NodeId>> {
        let n = self.get(node).await?;
        if n.fail_node_id {
            return Err(UaError::browse(BrowseError::attribute_unavailable(
                node.to_string(),
                "NodeId",
                "injected failure",
            )));
        }
        Ok(n.node_id)
    }

    async fn children(&self, node: NodeHandle) -> UaResult<Vec<NodeHandle>> {
        let n = self.get(node).await?;
        if n.fail_children {
            return Err(UaError::browse(BrowseError::child_enumeration_failed(
                node.to_string(),
                "children",
                "injected failure",
            )));
        }
        Ok(n.children.into_iter().map(NodeHandle).collect())
    }

    async fn variables(&self, node: NodeHandle) -> UaResult<Vec<NodeHandle>> {
        let n = self.get(node).await?;
        if n.fail_variables {
            return Err(UaError::browse(BrowseError::child_enumeration_failed(
                node.to_string(),
                "variables",
                "injected failure",
            )));
        }
        Ok(n.variables.into_iter().map(NodeHandle).collect())
    }

    async fn read_value(&self, node: NodeHandle) -> UaResult<UaValue> {
        Ok(self.get(node).await?.value)
    }

    async fn call_method(
        &self,
        object: NodeHandle,
        method: NodeHandle,
        _args: Vec<UaValue>,
    ) -> UaResult<Vec<UaValue>> {
        self.method_results
            .read()
            .await
            .get(&(object.0, method.0))
            .cloned()
            .ok_or_else(|| UaError::node_not_found(method.to_string()))
    }
}

#[async_trait]
impl UaSession for MockSession {
    async fn connect(&self) -> UaResult<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> UaResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn state(&self) -> SessionState {
        if self.connected.load(Ordering::SeqCst) {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    async fn root_node(&self) -> UaResult<NodeHandle> {
        Ok(NodeHandle(ROOT_HANDLE))
    }

    async fn objects_node(&self) -> UaResult<NodeHandle> {
        Ok(NodeHandle(OBJECTS_HANDLE))
    }

    async fn node(&self, id: &NodeId) -> UaResult<NodeHandle> {
        let nodes = self.nodes.read().await;
        nodes
            .iter()
            .find(|(_, n)| n.node_id.as_ref() == Some(id))
            .map(|(handle, _)| NodeHandle(*handle))
            .ok_or_else(|| UaError::node_not_found(id.to_string()))
    }

    async fn namespace_index(&self, uri: &str) -> UaResult<u16> {
        self.namespaces
            .read()
            .await
            .get(uri)
            .copied()
            .ok_or_else(|| UaError::session(SessionError::unknown_namespace(uri)))
    }

    async fn create_subscription(
        &self,
        settings: &SubscriptionSettings,
    ) -> UaResult<(u32, Duration)> {
        let id = self.next_subscription_id.fetch_add(1, Ordering::SeqCst);
        let revised = self
            .revised_interval
            .lock()
            .await
            .unwrap_or(settings.publishing_interval);
        Ok((id, revised))
    }

    async fn delete_subscription(&self, subscription_id: u32) -> UaResult<()> {
        self.deleted_subscriptions.write().await.push(subscription_id);
        Ok(())
    }

    async fn create_monitored_item(
        &self,
        _subscription_id: u32,
        node: NodeHandle,
        _attribute: AttributeId,
    ) -> UaResult<u32> {
        if self.rejected_nodes.read().await.contains(&node.0) {
            return Err(UaError::subscription(
                uascope::error::SubscriptionError::monitored_item_rejected(
                    node.to_string(),
                    "injected rejection",
                ),
            ));
        }
        self.get(node).await?;
        Ok(self.next_item_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn delete_monitored_item(&self, subscription_id: u32, item_id: u32) -> UaResult<()> {
        self.deleted_items
            .write()
            .await
            .push((subscription_id, item_id));
        Ok(())
    }

    async fn take_notifications(&self) -> Option<mpsc::Receiver<RawChange>> {
        self.notify_rx.lock().await.take()
    }
}
