// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Data-change subscriptions.
//!
//! [`SubscriptionManager`] owns all subscription state and a dedicated
//! delivery task. The transport pushes raw notifications into an mpsc
//! channel (see [`crate::session::UaSession::take_notifications`]); the
//! delivery task drains it and invokes the caller's handler, so the
//! concurrency contract is explicit: handlers run on the delivery task,
//! never on a transport thread.
//!
//! ```text
//! transport ──mpsc──> delivery task ──> DataChangeHandler::on_change
//!                          │
//!                          └── state check under lock: no delivery
//!                              after a subscription is closed
//! ```
//!
//! Lifecycle per subscription: `Created -> Active -> Closed`. Closing is
//! final; events observed after close are dropped, and removing items
//! from a closed subscription is an idempotent no-op.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{SubscriptionError, UaError, UaResult};
use crate::session::{NodeHandle, RawChange, UaSession};
use crate::types::{AttributeId, SubscriptionSettings, UaValue};

// =============================================================================
// Identifiers
// =============================================================================

/// Server-assigned subscription identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u32);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Server-assigned monitored item identifier. Always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitoredItemId(pub u32);

impl fmt::Display for MonitoredItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mi-{}", self.0)
    }
}

// =============================================================================
// SubscriptionState
// =============================================================================

/// Lifecycle state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionState {
    /// Created on the server, no monitored items yet.
    Created,

    /// At least one monitored item registered.
    Active,

    /// Closed; no further events are delivered. Final.
    Closed,
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Active => write!(f, "active"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

// =============================================================================
// ChangeEvent
// =============================================================================

/// A value-change notification as delivered to handlers.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// The monitored item that observed the change.
    pub item: MonitoredItemId,

    /// The node the item monitors.
    pub node: NodeHandle,

    /// The new value.
    pub value: UaValue,

    /// The monitored attribute (Value for data changes).
    pub attribute: AttributeId,

    /// Server source timestamp.
    pub server_timestamp: DateTime<Utc>,
}

// =============================================================================
// DataChangeHandler
// =============================================================================

/// Caller-supplied sink for change events.
///
/// Handlers are invoked sequentially on the manager's delivery task;
/// events for one item arrive in server order.
#[async_trait]
pub trait DataChangeHandler: Send + Sync {
    /// Called once per observed change.
    async fn on_change(&self, event: ChangeEvent);

    /// Called when the owning subscription is closed.
    async fn on_closed(&self, subscription: SubscriptionId) {
        let _ = subscription;
    }
}

/// Channel-backed handler forwarding events into an mpsc receiver.
///
/// # Examples
///
/// ```
/// use uascope::subscription::ChannelHandler;
///
/// let (handler, mut events) = ChannelHandler::with_capacity(64);
/// # let _ = (handler, &mut events);
/// ```
pub struct ChannelHandler {
    tx: mpsc::Sender<ChangeEvent>,
}

impl ChannelHandler {
    /// Creates a handler and the receiver it feeds.
    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<ChangeEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl DataChangeHandler for ChannelHandler {
    async fn on_change(&self, event: ChangeEvent) {
        if self.tx.send(event).await.is_err() {
            debug!("change event receiver dropped");
        }
    }
}

// =============================================================================
// Subscription (internal state)
// =============================================================================

struct Subscription {
    state: SubscriptionState,
    requested_interval: Duration,
    revised_interval: Duration,
    handler: Arc<dyn DataChangeHandler>,
    // item id -> monitored node
    items: HashMap<u32, NodeHandle>,
}

/// Read-only view of a subscription's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionInfo {
    /// Current lifecycle state.
    pub state: SubscriptionState,

    /// Publishing interval as requested.
    pub requested_interval: Duration,

    /// Publishing interval as revised by the server.
    pub revised_interval: Duration,

    /// Number of registered monitored items.
    pub item_count: usize,
}

// =============================================================================
// SubscriptionManagerStats
// =============================================================================

/// Cumulative manager statistics.
#[derive(Debug, Default)]
pub struct SubscriptionManagerStats {
    subscriptions_created: AtomicU64,
    items_created: AtomicU64,
    events_delivered: AtomicU64,
    events_dropped: AtomicU64,
}

impl SubscriptionManagerStats {
    /// Returns a point-in-time snapshot.
    pub fn snapshot(&self) -> SubscriptionManagerStatsSnapshot {
        SubscriptionManagerStatsSnapshot {
            subscriptions_created: self.subscriptions_created.load(Ordering::Relaxed),
            items_created: self.items_created.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Plain-value view of [`SubscriptionManagerStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionManagerStatsSnapshot {
    /// Subscriptions created.
    pub subscriptions_created: u64,

    /// Monitored items registered.
    pub items_created: u64,

    /// Events delivered to handlers.
    pub events_delivered: u64,

    /// Events dropped (closed or unknown target).
    pub events_dropped: u64,
}

// =============================================================================
// SubscriptionManager
// =============================================================================

/// Creates subscriptions, registers monitored items, and delivers
/// change events.
///
/// # Examples
///
/// ```no_run
/// # async fn example(session: std::sync::Arc<impl uascope::session::UaSession + 'static>)
/// #     -> uascope::error::UaResult<()> {
/// use std::time::Duration;
/// use uascope::subscription::{ChannelHandler, SubscriptionManager};
///
/// let manager = SubscriptionManager::new(session.clone());
/// manager.start().await;
///
/// let (handler, mut events) = ChannelHandler::with_capacity(64);
/// let sub = manager
///     .create_subscription(Duration::from_millis(100), handler)
///     .await?;
/// let node = session.node(&"ns=2;s=Pump.Speed".parse()?).await?;
/// let item = manager.subscribe_data_change(sub, node).await?;
///
/// if let Some(event) = events.recv().await {
///     println!("{item}: {}", event.value);
/// }
/// manager.close(sub).await?;
/// # Ok(())
/// # }
/// ```
pub struct SubscriptionManager<S: UaSession + ?Sized> {
    session: Arc<S>,
    settings: SubscriptionSettings,
    subscriptions: Arc<RwLock<HashMap<u32, Subscription>>>,
    stats: Arc<SubscriptionManagerStats>,
    dispatch: RwLock<Option<JoinHandle<()>>>,
}

impl<S: UaSession + ?Sized + 'static> SubscriptionManager<S> {
    /// Creates a manager with default subscription settings.
    pub fn new(session: Arc<S>) -> Self {
        Self::with_settings(session, SubscriptionSettings::default())
    }

    /// Creates a manager with explicit default settings.
    pub fn with_settings(session: Arc<S>, settings: SubscriptionSettings) -> Self {
        Self {
            session,
            settings,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(SubscriptionManagerStats::default()),
            dispatch: RwLock::new(None),
        }
    }

    /// Returns the cumulative statistics.
    pub fn statistics(&self) -> &SubscriptionManagerStats {
        &self.stats
    }

    /// Takes the session's notification stream and spawns the delivery
    /// task. Idempotent; a second call is a no-op.
    pub async fn start(&self) {
        let mut dispatch = self.dispatch.write().await;
        if dispatch.is_some() {
            return;
        }

        let Some(rx) = self.session.take_notifications().await else {
            warn!("notification stream already taken, delivery task not started");
            return;
        };

        let subscriptions = Arc::clone(&self.subscriptions);
        let stats = Arc::clone(&self.stats);
        *dispatch = Some(tokio::spawn(async move {
            dispatch_loop(rx, subscriptions, stats).await;
        }));
        debug!("delivery task started");
    }

    /// Creates a subscription with the given publishing interval.
    ///
    /// The server may revise the interval; the revised value is
    /// surfaced via [`Self::info`].
    ///
    /// # Errors
    ///
    /// Returns a subscription error if the server rejects the request.
    pub async fn create_subscription(
        &self,
        interval: Duration,
        handler: impl DataChangeHandler + 'static,
    ) -> UaResult<SubscriptionId> {
        let settings = SubscriptionSettings {
            publishing_interval: interval,
            ..self.settings.clone()
        };
        settings.validate()?;

        let (id, revised) = self.session.create_subscription(&settings).await?;
        self.stats
            .subscriptions_created
            .fetch_add(1, Ordering::Relaxed);

        info!(
            subscription = %SubscriptionId(id),
            requested_ms = interval.as_millis() as u64,
            revised_ms = revised.as_millis() as u64,
            "subscription created"
        );

        self.subscriptions.write().await.insert(
            id,
            Subscription {
                state: SubscriptionState::Created,
                requested_interval: interval,
                revised_interval: revised,
                handler: Arc::new(handler),
                items: HashMap::new(),
            },
        );

        Ok(SubscriptionId(id))
    }

    /// Returns the current state of a subscription.
    pub async fn info(&self, id: SubscriptionId) -> Option<SubscriptionInfo> {
        self.subscriptions.read().await.get(&id.0).map(|sub| SubscriptionInfo {
            state: sub.state,
            requested_interval: sub.requested_interval,
            revised_interval: sub.revised_interval,
            item_count: sub.items.len(),
        })
    }

    /// Registers interest in the Value attribute of a variable node.
    ///
    /// # Errors
    ///
    /// Returns a subscription error if the subscription is unknown or
    /// closed, or if the server rejects the registration. Rejections
    /// are never retried.
    pub async fn subscribe_data_change(
        &self,
        id: SubscriptionId,
        node: NodeHandle,
    ) -> UaResult<MonitoredItemId> {
        {
            let subscriptions = self.subscriptions.read().await;
            let sub = subscriptions
                .get(&id.0)
                .ok_or_else(|| UaError::subscription(SubscriptionError::not_found(id.0)))?;
            if sub.state == SubscriptionState::Closed {
                return Err(UaError::subscription(SubscriptionError::Closed { id: id.0 }));
            }
        }

        let item_id = self
            .session
            .create_monitored_item(id.0, node, AttributeId::Value)
            .await?;
        if item_id == 0 {
            return Err(UaError::subscription(
                SubscriptionError::monitored_item_rejected(
                    node.to_string(),
                    "server returned a zero item id",
                ),
            ));
        }

        let mut subscriptions = self.subscriptions.write().await;
        // The subscription may have been closed while the server call
        // was in flight; register only against a live one.
        match subscriptions.get_mut(&id.0) {
            Some(sub) if sub.state != SubscriptionState::Closed => {
                sub.items.insert(item_id, node);
                sub.state = SubscriptionState::Active;
            }
            _ => {
                drop(subscriptions);
                let _ = self.session.delete_monitored_item(id.0, item_id).await;
                return Err(UaError::subscription(SubscriptionError::Closed { id: id.0 }));
            }
        }
        self.stats.items_created.fetch_add(1, Ordering::Relaxed);

        debug!(subscription = %id, item = %MonitoredItemId(item_id), node = %node,
            "monitored item registered");
        Ok(MonitoredItemId(item_id))
    }

    /// Removes a monitored item.
    ///
    /// Removing an item from a closed or unknown subscription is an
    /// idempotent no-op.
    pub async fn unsubscribe(&self, id: SubscriptionId, item: MonitoredItemId) -> UaResult<()> {
        {
            let mut subscriptions = self.subscriptions.write().await;
            match subscriptions.get_mut(&id.0) {
                Some(sub) if sub.state != SubscriptionState::Closed => {
                    sub.items.remove(&item.0);
                }
                _ => return Ok(()),
            }
        }

        self.session.delete_monitored_item(id.0, item.0).await?;
        debug!(subscription = %id, item = %item, "monitored item removed");
        Ok(())
    }

    /// Closes a subscription. No events are delivered afterwards.
    ///
    /// Closing an already-closed or unknown subscription is a no-op.
    pub async fn close(&self, id: SubscriptionId) -> UaResult<()> {
        let handler = {
            let mut subscriptions = self.subscriptions.write().await;
            match subscriptions.get_mut(&id.0) {
                Some(sub) if sub.state != SubscriptionState::Closed => {
                    sub.state = SubscriptionState::Closed;
                    sub.items.clear();
                    Arc::clone(&sub.handler)
                }
                _ => return Ok(()),
            }
        };

        self.session.delete_subscription(id.0).await?;
        handler.on_closed(id).await;
        info!(subscription = %id, "subscription closed");
        Ok(())
    }

    /// Closes every subscription. Used on session teardown.
    pub async fn close_all(&self) -> UaResult<()> {
        let ids: Vec<u32> = self.subscriptions.read().await.keys().copied().collect();
        for id in ids {
            self.close(SubscriptionId(id)).await?;
        }
        Ok(())
    }

    /// Stops the delivery task after closing all subscriptions.
    pub async fn shutdown(&self) -> UaResult<()> {
        self.close_all().await?;
        if let Some(handle) = self.dispatch.write().await.take() {
            handle.abort();
        }
        debug!("subscription manager shut down");
        Ok(())
    }
}

/// Drains the notification stream, delivering each event at most once.
async fn dispatch_loop(
    mut rx: mpsc::Receiver<RawChange>,
    subscriptions: Arc<RwLock<HashMap<u32, Subscription>>>,
    stats: Arc<SubscriptionManagerStats>,
) {
    while let Some(change) = rx.recv().await {
        // State and item lookup under the lock; the handler call is
        // outside it so a slow handler cannot block close().
        let target = {
            let subs = subscriptions.read().await;
            subs.get(&change.subscription_id).and_then(|sub| {
                if sub.state == SubscriptionState::Closed {
                    return None;
                }
                sub.items
                    .get(&change.item_id)
                    .map(|node| (*node, Arc::clone(&sub.handler)))
            })
        };

        match target {
            Some((node, handler)) => {
                handler
                    .on_change(ChangeEvent {
                        item: MonitoredItemId(change.item_id),
                        node,
                        value: change.value,
                        attribute: change.attribute,
                        server_timestamp: change.server_timestamp,
                    })
                    .await;
                stats.events_delivered.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                stats.events_dropped.fetch_add(1, Ordering::Relaxed);
                debug!(
                    subscription = change.subscription_id,
                    item = change.item_id,
                    "dropped event for closed or unknown target"
                );
            }
        }
    }
    debug!("notification stream closed, delivery task exiting");
}

// =============================================================================
// Tests
// =============================================================================
