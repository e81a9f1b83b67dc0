// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub Uuid);

impl PortId {
    /// Create a new random port ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

/// Kind of value a socket carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketType {
    /// Numeric value (durations, sizes)
    Number,
    /// Text or a text style record
    Text,
    /// Hex color string
    Color,
}

impl SocketType {
    /// All socket types
    pub const ALL: [SocketType; 3] = [Self::Number, Self::Text, Self::Color];

    /// Display name of the socket
    pub fn name(&self) -> &'static str {
        match self {
            Self::Number => "Number",
            Self::Text => "Text",
            Self::Color => "Color",
        }
    }

    /// Check if this socket can be wired to another one.
    ///
    /// The relation is symmetric. Every pair of socket kinds combines, so the
    /// check is advisory and evaluation coerces whatever arrives.
    pub fn combines_with(&self, other: &SocketType) -> bool {
        match (self, other) {
            (Self::Number, Self::Number | Self::Text | Self::Color)
            | (Self::Text, Self::Number | Self::Text | Self::Color)
            | (Self::Color, Self::Number | Self::Text | Self::Color) => true,
        }
    }
}

/// A port on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Unique port ID
    pub id: PortId,
    /// Port key, unique per direction on a node
    pub name: String,
    /// Human-readable label
    pub label: String,
    /// Port direction
    pub direction: PortDirection,
    /// Socket type
    pub socket: SocketType,
    /// Whether multiple connections are allowed
    pub multi_connect: bool,
}

impl Port {
    /// Create a new input port
    pub fn input(name: impl Into<String>, label: impl Into<String>, socket: SocketType) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            label: label.into(),
            direction: PortDirection::Input,
            socket,
            multi_connect: false,
        }
    }

    /// Create a new output port
    pub fn output(name: impl Into<String>, label: impl Into<String>, socket: SocketType) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            label: label.into(),
            direction: PortDirection::Output,
            socket,
            multi_connect: true, // Outputs can fan out
        }
    }

    /// Check if a connection to another port is valid
    pub fn can_connect(&self, other: &Port) -> bool {
        // Must be opposite directions
        if self.direction == other.direction {
            return false;
        }

        self.socket.combines_with(&other.socket)
    }
}

/// Named values flowing in or out of a node, keyed by port name
pub type PortValues = IndexMap<String, PortValue>;

/// Value that travels along a connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PortValue {
    /// Number
    Number(f64),
    /// Plain text
    Text(String),
    /// Hex color string such as `#FF8000`
    Color(String),
    /// Record of named values (text style, resolved animation)
    Record(IndexMap<String, PortValue>),
}

impl PortValue {
    /// Build a record value from `(key, value)` pairs
    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, PortValue)>) -> Self {
        Self::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Borrow the string payload of text and color values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Color(s) => Some(s),
            Self::Number(_) | Self::Record(_) => None,
        }
    }

    /// Interpret the value as a finite number.
    ///
    /// Strings are parsed after trimming; records never convert.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) | Self::Color(s) => s.trim().parse::<f64>().ok()?,
            Self::Record(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Look up a field of a record value
    pub fn field(&self, key: &str) -> Option<&PortValue> {
        match self {
            Self::Record(fields) => fields.get(key),
            _ => None,
        }
    }
}
