// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editing session state.
//!
//! The session owns the graph and the last successfully resolved animation
//! record. Edits arrive as [`GraphMutation`]s; every accepted mutation that
//! maps to a graph event re-runs the evaluator over the whole graph. The
//! evaluator is the only writer of the cached record and program export is
//! its only reader.

use crate::connection::ConnectionId;
use crate::evaluation::{evaluate_graph, EvaluationError};
use crate::export::export_program;
use crate::graph::{ConnectionError, Graph};
use crate::graphs::text_animation::{NodeKind, ResolvedAnimationRecord};
use crate::node::{FieldValue, Node, NodeId};
use crate::port::PortId;

/// An edit to the graph
#[derive(Debug, Clone, PartialEq)]
pub enum GraphMutation {
    /// Add a node of the given kind
    AddNode {
        /// Kind of node
        kind: NodeKind,
        /// Canvas position
        position: [f32; 2],
    },
    /// Remove a node and its connections
    RemoveNode(NodeId),
    /// Connect an output port to an input port
    Connect {
        /// Source node
        from_node: NodeId,
        /// Output port on the source node
        from_port: PortId,
        /// Target node
        to_node: NodeId,
        /// Input port on the target node
        to_port: PortId,
    },
    /// Remove a connection
    Disconnect(ConnectionId),
    /// Change a field value
    SetField {
        /// Node to edit
        node: NodeId,
        /// Field name
        key: String,
        /// New value
        value: FieldValue,
    },
    /// Move a node on the canvas
    MoveNode {
        /// Node to move
        node: NodeId,
        /// New position
        position: [f32; 2],
    },
}

/// Graph change notification; each one triggers a full re-evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    /// A field value changed
    Process,
    /// A node was added
    NodeCreated(NodeId),
    /// A node was removed
    NodeRemoved(NodeId),
    /// A connection was added
    ConnectionCreated(ConnectionId),
    /// A connection was removed
    ConnectionRemoved(ConnectionId),
}

/// Error applying a mutation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MutationError {
    /// Connection rejected by the graph
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Connection not found
    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    /// The node kind has no such field
    #[error("{kind} nodes have no field named {key:?}")]
    UnknownField {
        /// Kind of the edited node
        kind: NodeKind,
        /// Requested field name
        key: String,
    },
}

/// Graph plus the cached result of its last successful evaluation
#[derive(Debug, Clone)]
pub struct SessionState {
    graph: Graph,
    last_record: ResolvedAnimationRecord,
    last_error: Option<EvaluationError>,
}

impl SessionState {
    /// Start a session on a graph and evaluate it once
    pub fn new(graph: Graph) -> Self {
        let mut session = Self {
            graph,
            last_record: ResolvedAnimationRecord::default(),
            last_error: None,
        };
        let _ = session.process();
        session
    }

    /// The current graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Give up the session, keeping the graph
    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// The most recently resolved record. Holds the defaults until an
    /// evaluation succeeds.
    pub fn last_record(&self) -> &ResolvedAnimationRecord {
        &self.last_record
    }

    /// Failure of the most recent evaluation, if it failed
    pub fn last_error(&self) -> Option<&EvaluationError> {
        self.last_error.as_ref()
    }

    /// Apply a mutation and re-evaluate when it produced a graph event.
    ///
    /// A rejected mutation leaves the graph untouched. Evaluation failures do
    /// not fail the mutation; they are kept in [`Self::last_error`].
    pub fn apply(&mut self, mutation: GraphMutation) -> Result<Option<GraphEvent>, MutationError> {
        let event = self.mutate(mutation)?;
        if let Some(event) = event {
            tracing::debug!(?event, "graph changed");
            let _ = self.process();
        }
        Ok(event)
    }

    fn mutate(&mut self, mutation: GraphMutation) -> Result<Option<GraphEvent>, MutationError> {
        match mutation {
            GraphMutation::AddNode { kind, position } => {
                let node = Node::new(kind).with_position(position[0], position[1]);
                Ok(Some(GraphEvent::NodeCreated(self.graph.add_node(node))))
            }
            GraphMutation::RemoveNode(node_id) => {
                self.graph.remove_node(node_id)
                    .ok_or(MutationError::NodeNotFound(node_id))?;
                Ok(Some(GraphEvent::NodeRemoved(node_id)))
            }
            GraphMutation::Connect { from_node, from_port, to_node, to_port } => {
                let id = self.graph.connect(from_node, from_port, to_node, to_port)?;
                Ok(Some(GraphEvent::ConnectionCreated(id)))
            }
            GraphMutation::Disconnect(connection_id) => {
                self.graph.disconnect(connection_id)
                    .ok_or(MutationError::ConnectionNotFound(connection_id))?;
                Ok(Some(GraphEvent::ConnectionRemoved(connection_id)))
            }
            GraphMutation::SetField { node, key, value } => {
                let target = self.graph.node_mut(node)
                    .ok_or(MutationError::NodeNotFound(node))?;
                if !target.kind.field_names().contains(&key.as_str()) {
                    return Err(MutationError::UnknownField { kind: target.kind, key });
                }
                target.fields.insert(key, value);
                Ok(Some(GraphEvent::Process))
            }
            GraphMutation::MoveNode { node, position } => {
                let target = self.graph.node_mut(node)
                    .ok_or(MutationError::NodeNotFound(node))?;
                target.position = position;
                Ok(None)
            }
        }
    }

    /// Re-run the evaluator over the whole graph.
    ///
    /// On success the cached record is replaced; on failure it is kept and
    /// the error is remembered.
    pub fn process(&mut self) -> Result<&ResolvedAnimationRecord, EvaluationError> {
        match evaluate_graph(&self.graph) {
            Ok(record) => {
                self.last_record = record;
                self.last_error = None;
                Ok(&self.last_record)
            }
            Err(error) => {
                self.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Run trigger: evaluate, then export the cached record as a program
    pub fn export(&mut self) -> Result<String, EvaluationError> {
        let record = self.process()?;
        Ok(export_program(record))
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(crate::graphs::text_animation::starter_graph())
    }
}
