// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core OPC UA value and configuration types.
//!
//! This module provides the type vocabulary shared by the rest of the crate:
//!
//! - **NodeId**: Numeric and string node identifiers with parsing
//! - **QualifiedName**: Namespace-qualified browse names
//! - **AttributeId**: Node attributes addressable by reads and subscriptions
//! - **UaValue**: Transport-level variant values
//! - **ClientConfig**: Client connection configuration with builder
//! - **SubscriptionSettings**: Publishing and monitoring configuration
//!
//! # Examples
//!
//! ```
//! use uascope::types::{ClientConfig, NodeId};
//!
//! let node_id = NodeId::string(2, "Pump.Speed");
//! assert_eq!(node_id.to_string(), "ns=2;s=Pump.Speed");
//!
//! let config = ClientConfig::builder()
//!     .endpoint("opc.tcp://localhost:4840")
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, UaError};

// =============================================================================
// NodeId
// =============================================================================

/// OPC UA node identifier.
///
/// A NodeId uniquely identifies a node within a server's address space.
/// It consists of a namespace index and either a numeric or a string
/// identifier. GUID and opaque byte-string identifiers are a known
/// limitation and are not represented.
///
/// # Examples
///
/// ```
/// use uascope::types::NodeId;
///
/// let numeric = NodeId::numeric(2, 1001);
/// let string = NodeId::string(2, "Device.Temperature");
///
/// let parsed: NodeId = "ns=2;s=Device.Temperature".parse().unwrap();
/// assert_eq!(parsed, string);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index (0 = OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

impl NodeId {
    /// Creates a numeric node ID.
    ///
    /// # Examples
    ///
    /// ```
    /// use uascope::types::NodeId;
    ///
    /// let node = NodeId::numeric(2, 1001);
    /// assert_eq!(node.namespace_index, 2);
    /// ```
    #[inline]
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node ID.
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    // =========================================================================
    // Standard Node IDs
    // =========================================================================

    /// Root folder node (ns=0, i=84).
    pub const ROOT_FOLDER: NodeId = NodeId {
        namespace_index: 0,
        identifier: NodeIdentifier::Numeric(84),
    };

    /// Objects folder node (ns=0, i=85).
    pub const OBJECTS_FOLDER: NodeId = NodeId {
        namespace_index: 0,
        identifier: NodeIdentifier::Numeric(85),
    };

    /// Server node (ns=0, i=2253).
    pub const SERVER: NodeId = NodeId {
        namespace_index: 0,
        identifier: NodeIdentifier::Numeric(2253),
    };

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns `true` if this is a numeric identifier.
    #[inline]
    pub const fn is_numeric(&self) -> bool {
        matches!(self.identifier, NodeIdentifier::Numeric(_))
    }

    /// Returns `true` if this is a string identifier.
    #[inline]
    pub const fn is_string(&self) -> bool {
        matches!(self.identifier, NodeIdentifier::String(_))
    }

    /// Returns `true` if this is in the standard namespace (ns=0).
    #[inline]
    pub const fn is_standard(&self) -> bool {
        self.namespace_index == 0
    }

    /// Returns the numeric value if this is a numeric identifier.
    #[inline]
    pub fn as_numeric(&self) -> Option<u32> {
        match &self.identifier {
            NodeIdentifier::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value if this is a string identifier.
    #[inline]
    pub fn as_string(&self) -> Option<&str> {
        match &self.identifier {
            NodeIdentifier::String(v) => Some(v),
            _ => None,
        }
    }

    /// Converts to the OPC UA string format.
    ///
    /// Format: `ns=<namespace>;{i|s}=<identifier>`. The namespace part is
    /// always present, including for the standard namespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use uascope::types::NodeId;
    ///
    /// assert_eq!(NodeId::numeric(0, 84).to_opc_string(), "ns=0;i=84");
    /// assert_eq!(NodeId::string(3, "Foo").to_opc_string(), "ns=3;s=Foo");
    /// ```
    pub fn to_opc_string(&self) -> String {
        match &self.identifier {
            NodeIdentifier::Numeric(v) => format!("ns={};i={}", self.namespace_index, v),
            NodeIdentifier::String(v) => format!("ns={};s={}", self.namespace_index, v),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_opc_string())
    }
}

impl FromStr for NodeId {
    type Err = UaError;

    /// Parses a NodeId from OPC UA string format.
    ///
    /// Supported formats:
    /// - `ns=2;i=1001` (numeric)
    /// - `ns=2;s=MyNode` (string)
    /// - `i=1001` / `s=MyNode` (namespace 0)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| {
            UaError::configuration(ConfigurationError::invalid_node_id(s, reason))
        };

        let (namespace_index, rest) = match s.strip_prefix("ns=") {
            Some(tail) => {
                let (ns, rest) = tail
                    .split_once(';')
                    .ok_or_else(|| invalid("missing ';' after namespace"))?;
                let ns: u16 = ns
                    .parse()
                    .map_err(|_| invalid("namespace index is not a u16"))?;
                (ns, rest)
            }
            None => (0, s),
        };

        let (kind, value) = rest
            .split_once('=')
            .ok_or_else(|| invalid("missing identifier part"))?;

        match kind {
            "i" => {
                let v: u32 = value
                    .parse()
                    .map_err(|_| invalid("numeric identifier is not a u32"))?;
                Ok(Self::numeric(namespace_index, v))
            }
            "s" => {
                if value.is_empty() {
                    return Err(invalid("string identifier is empty"));
                }
                Ok(Self::string(namespace_index, value))
            }
            other => Err(invalid(&format!("unsupported identifier type '{other}'"))),
        }
    }
}

/// The identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeIdentifier {
    /// Numeric identifier.
    Numeric(u32),

    /// String identifier.
    String(String),
}

// =============================================================================
// QualifiedName
// =============================================================================

/// Namespace-qualified browse name.
///
/// Browse names are display-oriented and legitimately absent on some
/// nodes; resolution is best-effort throughout the crate.
///
/// # Examples
///
/// ```
/// use uascope::types::QualifiedName;
///
/// let name = QualifiedName::new(2, "Pump");
/// assert_eq!(name.to_string(), "2:Pump");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Namespace index of the name.
    pub namespace_index: u16,

    /// The unqualified name.
    pub name: String,
}

impl QualifiedName {
    /// Creates a qualified name.
    #[inline]
    pub fn new(namespace_index: u16, name: impl Into<String>) -> Self {
        Self {
            namespace_index,
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace_index, self.name)
    }
}

// =============================================================================
// AttributeId
// =============================================================================

/// Node attributes addressable by reads and monitored items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeId {
    /// The canonical node identifier (attribute 1).
    NodeId,

    /// The browse name (attribute 3).
    BrowseName,

    /// The display name (attribute 4).
    DisplayName,

    /// The current value of a variable node (attribute 13).
    Value,
}

impl AttributeId {
    /// Returns the OPC UA numeric attribute id.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::NodeId => 1,
            Self::BrowseName => 3,
            Self::DisplayName => 4,
            Self::Value => 13,
        }
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeId => write!(f, "NodeId"),
            Self::BrowseName => write!(f, "BrowseName"),
            Self::DisplayName => write!(f, "DisplayName"),
            Self::Value => write!(f, "Value"),
        }
    }
}

// =============================================================================
// UaValue
// =============================================================================

/// Transport-level variant value.
///
/// Carries values as read from or pushed by the server, without local
/// type negotiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UaValue {
    /// Boolean value.
    Bool(bool),

    /// Signed 16-bit integer.
    Int16(i16),

    /// Unsigned 16-bit integer.
    UInt16(u16),

    /// Signed 32-bit integer.
    Int32(i32),

    /// Unsigned 32-bit integer.
    UInt32(u32),

    /// Signed 64-bit integer.
    Int64(i64),

    /// Unsigned 64-bit integer.
    UInt64(u64),

    /// 32-bit float.
    Float(f32),

    /// 64-bit float.
    Double(f64),

    /// UTF-8 string.
    String(String),

    /// Raw byte string.
    ByteString(Vec<u8>),

    /// Timestamp value.
    DateTime(DateTime<Utc>),

    /// Homogeneous array of values.
    Array(Vec<UaValue>),

    /// Null / empty variant.
    Null,
}

impl UaValue {
    /// Returns the value as a bool, if convertible.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::Int16(v) => Some(*v != 0),
            Self::Int32(v) => Some(*v != 0),
            Self::Int64(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Returns the value as an i64, if convertible without loss.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int16(v) => Some(i64::from(*v)),
            Self::UInt16(v) => Some(i64::from(*v)),
            Self::Int32(v) => Some(i64::from(*v)),
            Self::UInt32(v) => Some(i64::from(*v)),
            Self::Int64(v) => Some(*v),
            Self::UInt64(v) => i64::try_from(*v).ok(),
            Self::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Returns the value as an f64, if convertible.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Returns the value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns `true` if this is the null variant.
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the variant type as a string.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "Bool",
            Self::Int16(_) => "Int16",
            Self::UInt16(_) => "UInt16",
            Self::Int32(_) => "Int32",
            Self::UInt32(_) => "UInt32",
            Self::Int64(_) => "Int64",
            Self::UInt64(_) => "UInt64",
            Self::Float(_) => "Float",
            Self::Double(_) => "Double",
            Self::String(_) => "String",
            Self::ByteString(_) => "ByteString",
            Self::DateTime(_) => "DateTime",
            Self::Array(_) => "Array",
            Self::Null => "Null",
        }
    }
}

impl fmt::Display for UaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::ByteString(v) => write!(f, "<{} bytes>", v.len()),
            Self::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Array(v) => write!(f, "<array[{}]>", v.len()),
            Self::Null => write!(f, "null"),
        }
    }
}

// =============================================================================
// ClientConfig
// =============================================================================

/// Client connection configuration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use uascope::types::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .endpoint("opc.tcp://plc.local:4840")
///     .session_timeout(Duration::from_secs(60))
///     .build()
///     .unwrap();
/// assert_eq!(config.endpoint, "opc.tcp://plc.local:4840");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server endpoint URL (e.g. `opc.tcp://host:4840`).
    pub endpoint: String,

    /// Application name announced to the server.
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Session timeout requested from the server.
    #[serde(with = "humantime_serde", default = "default_session_timeout")]
    pub session_timeout: Duration,

    /// Timeout for individual service calls.
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Default settings applied to new subscriptions.
    #[serde(default)]
    pub subscription: SubscriptionSettings,
}

fn default_application_name() -> String {
    "uascope".to_string()
}

fn default_session_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            application_name: default_application_name(),
            session_timeout: default_session_timeout(),
            request_timeout: default_request_timeout(),
            subscription: SubscriptionSettings::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a new builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the endpoint is missing or uses an
    /// unsupported scheme, or if any timeout is zero.
    pub fn validate(&self) -> Result<(), UaError> {
        if self.endpoint.is_empty() {
            return Err(UaError::configuration(ConfigurationError::missing_field(
                "endpoint",
            )));
        }

        if !self.endpoint.starts_with("opc.tcp://") {
            return Err(UaError::configuration(ConfigurationError::invalid_endpoint(
                &self.endpoint,
                "endpoint must use the opc.tcp:// scheme",
            )));
        }

        if self.session_timeout.is_zero() {
            return Err(UaError::configuration(ConfigurationError::invalid_interval(
                self.session_timeout,
                "session_timeout must be positive",
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(UaError::configuration(ConfigurationError::invalid_interval(
                self.request_timeout,
                "request_timeout must be positive",
            )));
        }

        self.subscription.validate()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Sets the server endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Sets the announced application name.
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.config.application_name = name.into();
        self
    }

    /// Sets the session timeout.
    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.config.session_timeout = timeout;
        self
    }

    /// Sets the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Sets the default subscription settings.
    pub fn subscription(mut self, settings: SubscriptionSettings) -> Self {
        self.config.subscription = settings;
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn build(self) -> Result<ClientConfig, UaError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// =============================================================================
// SubscriptionSettings
// =============================================================================

/// Publishing and monitoring configuration for subscriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionSettings {
    /// Requested publishing interval. The server may revise this; the
    /// revised value is surfaced on the subscription state.
    #[serde(with = "humantime_serde", default = "default_publishing_interval")]
    pub publishing_interval: Duration,

    /// Keep-alive count: empty publish cycles before a keep-alive message.
    #[serde(default = "default_keep_alive_count")]
    pub keep_alive_count: u32,

    /// Lifetime count: publish cycles without client activity before the
    /// server drops the subscription. Must be at least 3x keep-alive.
    #[serde(default = "default_lifetime_count")]
    pub lifetime_count: u32,

    /// Per-item notification queue size on the server.
    #[serde(default = "default_queue_size")]
    pub queue_size: u32,

    /// Capacity of the local delivery channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_publishing_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_keep_alive_count() -> u32 {
    10
}

fn default_lifetime_count() -> u32 {
    30
}

fn default_queue_size() -> u32 {
    10
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        Self {
            publishing_interval: default_publishing_interval(),
            keep_alive_count: default_keep_alive_count(),
            lifetime_count: default_lifetime_count(),
            queue_size: default_queue_size(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl SubscriptionSettings {
    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error on a zero interval or an inconsistent
    /// lifetime/keep-alive relation.
    pub fn validate(&self) -> Result<(), UaError> {
        if self.publishing_interval.is_zero() {
            return Err(UaError::configuration(ConfigurationError::invalid_interval(
                self.publishing_interval,
                "publishing_interval must be positive",
            )));
        }

        if self.lifetime_count < self.keep_alive_count * 3 {
            return Err(UaError::configuration(ConfigurationError::invalid_interval(
                self.publishing_interval,
                "lifetime_count must be at least 3x keep_alive_count",
            )));
        }

        if self.channel_capacity == 0 {
            return Err(UaError::configuration(ConfigurationError::invalid_interval(
                self.publishing_interval,
                "channel_capacity must be positive",
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_rendering_keeps_namespace_prefix() {
        assert_eq!(NodeId::numeric(0, 84).to_opc_string(), "ns=0;i=84");
        assert_eq!(NodeId::string(3, "Foo").to_opc_string(), "ns=3;s=Foo");
        assert_eq!(NodeId::numeric(2, 1001).to_string(), "ns=2;i=1001");
    }

    #[test]
    fn test_node_id_parsing() {
        let parsed: NodeId = "ns=2;i=1001".parse().unwrap();
        assert_eq!(parsed, NodeId::numeric(2, 1001));

        let parsed: NodeId = "ns=2;s=My.Node".parse().unwrap();
        assert_eq!(parsed, NodeId::string(2, "My.Node"));

        // Namespace prefix optional on input, 0 assumed.
        let parsed: NodeId = "i=84".parse().unwrap();
        assert_eq!(parsed, NodeId::ROOT_FOLDER);
    }

    #[test]
    fn test_node_id_parse_errors() {
        assert!("ns=2;g=not-supported".parse::<NodeId>().is_err());
        assert!("ns=x;i=1".parse::<NodeId>().is_err());
        assert!("ns=2;i=notanumber".parse::<NodeId>().is_err());
        assert!("ns=2;s=".parse::<NodeId>().is_err());
        assert!("garbage".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_qualified_name_display() {
        assert_eq!(QualifiedName::new(2, "Pump").to_string(), "2:Pump");
    }

    #[test]
    fn test_attribute_id_numbers() {
        assert_eq!(AttributeId::NodeId.as_u32(), 1);
        assert_eq!(AttributeId::BrowseName.as_u32(), 3);
        assert_eq!(AttributeId::Value.as_u32(), 13);
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(UaValue::Int32(42).as_i64(), Some(42));
        assert_eq!(UaValue::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(UaValue::Bool(true).as_i64(), Some(1));
        assert_eq!(UaValue::String("x".into()).as_i64(), None);
        assert!(UaValue::Null.is_null());
    }

    #[test]
    fn test_config_builder_validation() {
        let config = ClientConfig::builder()
            .endpoint("opc.tcp://localhost:4840")
            .build()
            .unwrap();
        assert_eq!(config.application_name, "uascope");

        assert!(ClientConfig::builder().build().is_err());
        assert!(ClientConfig::builder()
            .endpoint("http://localhost")
            .build()
            .is_err());
    }

    #[test]
    fn test_subscription_settings_validation() {
        assert!(SubscriptionSettings::default().validate().is_ok());

        let bad = SubscriptionSettings {
            lifetime_count: 5,
            keep_alive_count: 10,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
