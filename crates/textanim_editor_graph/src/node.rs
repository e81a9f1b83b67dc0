// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node instances and their persisted field values.

use crate::graphs::text_animation::NodeKind;
use crate::port::{Port, PortId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Input nodes (constants, parameters)
    Input,
    /// Output nodes (result, preview)
    Output,
}

impl NodeCategory {
    /// Lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// A value edited through a node control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Numeric field
    Number(f64),
    /// Text field
    Text(String),
}

impl FieldValue {
    /// Non-empty text content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Finite numeric content; numeric text is accepted too
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// Type of value a field edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Numeric control
    Number,
    /// Text control
    Text,
}

impl FieldKind {
    /// Build a field value from typed input.
    ///
    /// Text fields keep the input verbatim. Number fields store finite
    /// numbers as numbers and anything else as text, which evaluation treats
    /// as unset.
    pub fn value_from_str(&self, raw: &str) -> FieldValue {
        match self {
            Self::Number => match raw.trim().parse::<f64>() {
                Ok(number) if number.is_finite() => FieldValue::Number(number),
                _ => FieldValue::Text(raw.to_string()),
            },
            Self::Text => FieldValue::Text(raw.to_string()),
        }
    }
}

/// Field values of a node, keyed by field name
pub type Fields = IndexMap<String, FieldValue>;

/// A node instance in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node kind
    pub kind: NodeKind,
    /// Display name (can be customized)
    pub name: String,
    /// Position in the editor canvas. Not used by evaluation.
    pub position: [f32; 2],
    /// Input ports
    pub inputs: Vec<Port>,
    /// Output ports
    pub outputs: Vec<Port>,
    /// Persisted control values
    pub fields: Fields,
}

impl Node {
    /// Create a new node of the given kind with default fields
    pub fn new(kind: NodeKind) -> Self {
        let (inputs, outputs) = kind.ports();
        Self {
            id: NodeId::new(),
            kind,
            name: kind.display_name().to_string(),
            position: [0.0, 0.0],
            inputs,
            outputs,
            fields: kind.default_fields(),
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Set a field value
    pub fn with_field(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Get an input port by name
    pub fn input_named(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Get an output port by name
    pub fn output_named(&self, name: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// Get a port by ID
    pub fn port(&self, port_id: &PortId) -> Option<&Port> {
        self.inputs.iter().find(|p| p.id == *port_id)
            .or_else(|| self.outputs.iter().find(|p| p.id == *port_id))
    }

    /// Get all ports
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.inputs.iter().chain(self.outputs.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortDirection;
    use std::collections::HashSet;

    #[test]
    fn test_port_names_unique_per_direction() {
        for kind in NodeKind::ALL {
            let node = Node::new(kind);
            let inputs: HashSet<_> = node.inputs.iter().map(|p| p.name.as_str()).collect();
            let outputs: HashSet<_> = node.outputs.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(inputs.len(), node.inputs.len(), "{kind:?}");
            assert_eq!(outputs.len(), node.outputs.len(), "{kind:?}");
            assert!(node.inputs.iter().all(|p| p.direction == PortDirection::Input));
            assert!(node.outputs.iter().all(|p| p.direction == PortDirection::Output));
        }
    }

    #[test]
    fn test_port_lookup() {
        let node = Node::new(NodeKind::AnimationSink);
        let time = node.input_named("time").unwrap();
        assert_eq!(node.port(&time.id).unwrap().name, "time");
        assert!(node.output_named("time").is_none());
        assert_eq!(node.ports().count(), 4);
    }

    #[test]
    fn test_field_value_accessors() {
        assert_eq!(FieldValue::Text(String::new()).as_text(), None);
        assert_eq!(FieldValue::Text("Hi".into()).as_text(), Some("Hi"));
        assert_eq!(FieldValue::Text("2.5".into()).as_number(), Some(2.5));
        assert_eq!(FieldValue::Text("fast".into()).as_number(), None);
        assert_eq!(FieldValue::Number(-1.0).as_number(), Some(-1.0));
        assert_eq!(FieldValue::Number(f64::NAN).as_number(), None);
    }

    #[test]
    fn test_field_kind_parses_input() {
        assert_eq!(FieldKind::Number.value_from_str(" 2.5 "), FieldValue::Number(2.5));
        assert_eq!(FieldKind::Number.value_from_str("-1"), FieldValue::Number(-1.0));
        assert_eq!(FieldKind::Number.value_from_str("inf"), FieldValue::Text("inf".into()));
        assert_eq!(FieldKind::Text.value_from_str("112233"), FieldValue::Text("112233".into()));
        assert_eq!(FieldKind::Text.value_from_str("2024"), FieldValue::Text("2024".into()));
    }
}
