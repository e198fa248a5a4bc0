// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA address-space browsing and data-change subscription client.
//!
//! This crate walks a server's hierarchical address space and delivers
//! asynchronous value-change notifications. It is transport-agnostic:
//! everything it needs from a server goes through the [`session`]
//! traits, which a wire-level implementation (or a test mock) provides.
//!
//! # Features
//!
//! - Pre-order tree browsing with cycle and depth defenses
//! - Best-effort attribute resolution that never aborts a traversal
//! - Subscriptions with channel-based, single-task event delivery
//! - Remote method invocation through the session surface
//!
//! # Error Handling
//!
//! The error hierarchy lives in the [`error`] module:
//!
//! ```text
//! UaError
//! ├── Session       - Connection and session lifecycle failures
//! ├── Browse        - Address-space traversal failures
//! ├── Subscription  - Subscription and monitored-item errors
//! └── Configuration - Invalid settings and unparsable node ids
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use uascope::{ChannelHandler, SubscriptionManager, TreeBrowser};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = connect_somehow().await?;
//!
//!     // Print the address space under Objects.
//!     let browser = TreeBrowser::new(session.as_ref());
//!     let report = browser.browse(session.objects_node().await?).await;
//!     print!("{}", report.render());
//!
//!     // Watch a variable for changes.
//!     let manager = SubscriptionManager::new(session.clone());
//!     manager.start().await;
//!     let (handler, mut events) = ChannelHandler::with_capacity(64);
//!     let sub = manager
//!         .create_subscription(Duration::from_millis(100), handler)
//!         .await?;
//!     let node = session.node(&"ns=2;s=Pump.Speed".parse()?).await?;
//!     manager.subscribe_data_change(sub, node).await?;
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{} = {}", event.node, event.value);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod browse;
pub mod error;
pub mod resolve;
pub mod session;
pub mod subscription;
pub mod types;

// Re-export commonly used types
pub use error::{
    BrowseError, ConfigurationError, ErrorSeverity, SessionError, SubscriptionError, UaError,
    UaResult,
};

pub use types::{
    AttributeId, ClientConfig, ClientConfigBuilder, NodeId, NodeIdentifier, QualifiedName,
    SubscriptionSettings, UaValue,
};

pub use session::{NodeHandle, NodeSource, RawChange, SessionState, UaSession};

pub use resolve::{AddressResolver, Resolved};

pub use browse::{
    BrowseConfig, BrowseEntry, BrowseReport, BrowseStatistics, BrowseStatisticsSnapshot,
    EntryKind, TreeBrowser,
};

pub use subscription::{
    ChangeEvent, ChannelHandler, DataChangeHandler, MonitoredItemId, SubscriptionId,
    SubscriptionInfo, SubscriptionManager, SubscriptionManagerStats, SubscriptionState,
};
