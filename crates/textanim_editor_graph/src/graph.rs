// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and connections.

use crate::connection::{Connection, ConnectionId};
use crate::graphs::text_animation::NodeKind;
use crate::node::{Node, NodeId};
use crate::port::{PortDirection, PortId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A node graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Connections between nodes
    connections: IndexMap<ConnectionId, Connection>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
        }
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node and its connections
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        self.connections.retain(|_, c| !c.involves_node(node_id));
        self.nodes.shift_remove(&node_id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all nodes of a given kind
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(move |n| n.kind == kind)
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Connect an output port to an input port.
    ///
    /// An input accepts a single connection: an existing connection into
    /// `to_port` is replaced by the new one. Cycles are not checked here,
    /// evaluation rejects them.
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_port: PortId,
        to_node: NodeId,
        to_port: PortId,
    ) -> Result<ConnectionId, ConnectionError> {
        let source_node = self.nodes.get(&from_node)
            .ok_or(ConnectionError::NodeNotFound(from_node))?;
        let target_node = self.nodes.get(&to_node)
            .ok_or(ConnectionError::NodeNotFound(to_node))?;

        let source_port = source_node.port(&from_port)
            .ok_or(ConnectionError::PortNotFound(from_port))?;
        let target_port = target_node.port(&to_port)
            .ok_or(ConnectionError::PortNotFound(to_port))?;

        if source_port.direction != PortDirection::Output
            || target_port.direction != PortDirection::Input
        {
            return Err(ConnectionError::DirectionMismatch);
        }

        if !source_port.can_connect(target_port) {
            return Err(ConnectionError::IncompatiblePorts);
        }

        if !target_port.multi_connect {
            let before = self.connections.len();
            self.connections.retain(|_, c| c.to_port != to_port);
            if self.connections.len() != before {
                tracing::debug!(port = ?to_port, "replaced existing connection into input");
            }
        }

        let connection = Connection::new(from_node, from_port, to_node, to_port);
        let id = connection.id;
        self.connections.insert(id, connection);
        Ok(id)
    }

    /// Connect ports addressed by name (`from_port` is an output of
    /// `from_node`, `to_port` an input of `to_node`)
    pub fn connect_named(
        &mut self,
        from_node: NodeId,
        from_port: &str,
        to_node: NodeId,
        to_port: &str,
    ) -> Result<ConnectionId, ConnectionError> {
        let source = self.nodes.get(&from_node)
            .ok_or(ConnectionError::NodeNotFound(from_node))?;
        let target = self.nodes.get(&to_node)
            .ok_or(ConnectionError::NodeNotFound(to_node))?;
        let from_port = source.output_named(from_port)
            .ok_or_else(|| ConnectionError::PortNameNotFound(from_port.to_string()))?
            .id;
        let to_port = target.input_named(to_port)
            .ok_or_else(|| ConnectionError::PortNameNotFound(to_port.to_string()))?
            .id;
        self.connect(from_node, from_port, to_node, to_port)
    }

    /// Remove a connection
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        self.connections.shift_remove(&connection_id)
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get connections to a specific port
    pub fn connections_to(&self, port_id: PortId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.to_port == port_id)
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get nodes in topological order (producers before consumers).
    ///
    /// Depth-first over upstream edges with an explicit stack, so long
    /// chains do not grow the call stack.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let mut visited = HashSet::new();
        let mut temp_mark = HashSet::new();
        let mut order = Vec::with_capacity(self.nodes.len());

        // Upstream nodes per consumer, last connection first
        let mut upstream: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for connection in self.connections.values().rev() {
            upstream.entry(connection.to_node).or_default().push(connection.from_node);
        }
        let upstream_of = |node_id: NodeId| upstream.get(&node_id).cloned().unwrap_or_default();

        for &root in self.nodes.keys() {
            if visited.contains(&root) {
                continue;
            }

            temp_mark.insert(root);
            let mut stack = vec![(root, upstream_of(root))];

            while let Some((node_id, pending)) = stack.last_mut() {
                if let Some(next) = pending.pop() {
                    if temp_mark.contains(&next) {
                        return Err(CycleError);
                    }
                    if !visited.contains(&next) {
                        temp_mark.insert(next);
                        stack.push((next, upstream_of(next)));
                    }
                } else {
                    let node_id = *node_id;
                    stack.pop();
                    temp_mark.remove(&node_id);
                    visited.insert(node_id);
                    order.push(node_id);
                }
            }
        }

        Ok(order)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when creating a connection
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("Port not found: {0:?}")]
    PortNotFound(PortId),

    /// No port with this name in the expected direction
    #[error("Port not found: {0}")]
    PortNameNotFound(String),

    /// Connections must run from an output to an input
    #[error("Connections must run from an output port to an input port")]
    DirectionMismatch,

    /// Incompatible socket types
    #[error("Incompatible port types")]
    IncompatiblePorts,
}

/// Error when graph contains a cycle
#[derive(Debug, thiserror::Error)]
#[error("Graph contains a cycle")]
pub struct CycleError;

#[cfg(test)]
mod tests {
    use super::*;

    fn sink_and_color() -> (Graph, NodeId, NodeId) {
        let mut graph = Graph::default();
        let sink = graph.add_node(Node::new(NodeKind::AnimationSink));
        let color = graph.add_node(Node::new(NodeKind::ColorSource));
        (graph, sink, color)
    }

    #[test]
    fn test_connect_and_disconnect() {
        let (mut graph, sink, color) = sink_and_color();
        let id = graph.connect_named(color, "color", sink, "color").unwrap();
        assert_eq!(graph.connection_count(), 1);
        assert_eq!(graph.connection(id).unwrap().from_node, color);

        assert!(graph.disconnect(id).is_some());
        assert!(graph.disconnect(id).is_none());
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_last_connection_into_input_wins() {
        let (mut graph, sink, first) = sink_and_color();
        let second = graph.add_node(Node::new(NodeKind::ColorSource));

        graph.connect_named(first, "color", sink, "color").unwrap();
        let latest = graph.connect_named(second, "color", sink, "color").unwrap();

        assert_eq!(graph.connection_count(), 1);
        assert_eq!(graph.connections().next().unwrap().id, latest);
        assert_eq!(graph.connections().next().unwrap().from_node, second);
    }

    #[test]
    fn test_outputs_fan_out() {
        let (mut graph, sink, color) = sink_and_color();
        let other_sink = graph.add_node(Node::new(NodeKind::AnimationSink));
        graph.connect_named(color, "color", sink, "color").unwrap();
        graph.connect_named(color, "color", other_sink, "color").unwrap();
        assert_eq!(graph.connection_count(), 2);
    }

    #[test]
    fn test_connect_rejects_bad_endpoints() {
        let (mut graph, sink, color) = sink_and_color();
        let color_out = graph.node(color).unwrap().outputs[0].id;
        let sink_in = graph.node(sink).unwrap().inputs[0].id;

        assert_eq!(
            graph.connect(sink, sink_in, color, color_out),
            Err(ConnectionError::DirectionMismatch)
        );
        assert_eq!(
            graph.connect(color, sink_in, sink, sink_in),
            Err(ConnectionError::PortNotFound(sink_in))
        );
        let ghost = NodeId::new();
        assert_eq!(
            graph.connect(ghost, color_out, sink, sink_in),
            Err(ConnectionError::NodeNotFound(ghost))
        );
        assert_eq!(
            graph.connect_named(color, "colour", sink, "color"),
            Err(ConnectionError::PortNameNotFound("colour".into()))
        );
    }

    #[test]
    fn test_remove_node_drops_its_connections() {
        let (mut graph, sink, color) = sink_and_color();
        graph.connect_named(color, "color", sink, "color").unwrap();

        let removed = graph.remove_node(color).unwrap();
        assert_eq!(removed.kind, NodeKind::ColorSource);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_topological_order_puts_producers_first() {
        let (mut graph, sink, color) = sink_and_color();
        let time = graph.add_node(Node::new(NodeKind::DurationSource));
        graph.connect_named(color, "color", sink, "color").unwrap();
        graph.connect_named(time, "time", sink, "time").unwrap();

        let order = graph.topological_order().unwrap();
        let position = |id| order.iter().position(|n| *n == id).unwrap();
        assert_eq!(order.len(), 3);
        assert!(position(color) < position(sink));
        assert!(position(time) < position(sink));
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let (mut graph, sink, _) = sink_and_color();
        graph.connect_named(sink, "output", sink, "time").unwrap();
        assert!(graph.topological_order().is_err());
    }

    #[test]
    fn test_long_chain_orders_without_recursion() {
        let mut graph = Graph::default();
        let mut previous = graph.add_node(Node::new(NodeKind::DurationSource));
        let first = previous;
        let mut chain = vec![previous];
        for _ in 0..20_000 {
            let sink = graph.add_node(Node::new(NodeKind::AnimationSink));
            let from = if previous == first { "time" } else { "output" };
            graph.connect_named(previous, from, sink, "time").unwrap();
            chain.push(sink);
            previous = sink;
        }

        let order = graph.topological_order().unwrap();
        assert_eq!(order, chain);

        graph.connect_named(previous, "output", chain[1], "time").unwrap();
        assert!(graph.topological_order().is_err());
    }

    #[test]
    fn test_serialization() {
        let (mut graph, sink, color) = sink_and_color();
        graph.connect_named(color, "color", sink, "color").unwrap();

        let ron_str = ron::ser::to_string_pretty(&graph, ron::ser::PrettyConfig::default()).unwrap();
        let loaded: Graph = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded.node_count(), 2);
        assert_eq!(loaded.connection_count(), 1);
        assert_eq!(loaded.node(sink).unwrap().kind, NodeKind::AnimationSink);
    }
}
