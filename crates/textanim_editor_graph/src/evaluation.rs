// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph evaluation.
//!
//! Every run is a full pass over the graph: nodes are evaluated in
//! topological order, each input port receives the value its upstream
//! output produced, and the animation sink's merged record is returned.

use crate::graph::Graph;
use crate::graphs::text_animation::{NodeKind, ResolvedAnimationRecord};
use crate::node::NodeId;
use crate::port::{PortId, PortValue, PortValues};
use std::collections::HashMap;

/// Result of evaluating a node
#[derive(Debug, Clone, Default)]
pub struct NodeOutput {
    /// Output values by port ID
    pub values: HashMap<PortId, PortValue>,
}

impl NodeOutput {
    /// Create a new empty output
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an output value
    pub fn set(&mut self, port_id: PortId, value: PortValue) {
        self.values.insert(port_id, value);
    }

    /// Get an output value
    pub fn get(&self, port_id: &PortId) -> Option<&PortValue> {
        self.values.get(port_id)
    }
}

/// Context for graph evaluation
pub struct EvaluationContext<'a> {
    /// The graph being evaluated
    pub graph: &'a Graph,
    /// Cached node outputs
    outputs: HashMap<NodeId, NodeOutput>,
    /// Evaluation order
    order: Vec<NodeId>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(graph: &'a Graph) -> Result<Self, EvaluationError> {
        let order = graph.topological_order()
            .map_err(|_| EvaluationError::CycleDetected)?;

        Ok(Self {
            graph,
            outputs: HashMap::new(),
            order,
        })
    }

    /// Get the value arriving at an input port.
    ///
    /// When several connections feed one input, the first one wins.
    pub fn get_input(&self, port_id: PortId) -> Option<&PortValue> {
        let connection = self.graph.connections_to(port_id).next()?;
        let source_output = self.outputs.get(&connection.from_node)?;
        source_output.get(&connection.from_port)
    }

    /// Set the output for a node
    pub fn set_output(&mut self, node_id: NodeId, output: NodeOutput) {
        self.outputs.insert(node_id, output);
    }

    /// Get the evaluation order
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Get all outputs
    pub fn outputs(&self) -> &HashMap<NodeId, NodeOutput> {
        &self.outputs
    }

    /// Get a node's output value by port name
    pub fn output_named(&self, node_id: NodeId, port: &str) -> Option<&PortValue> {
        let port_id = self.graph.node(node_id)?.output_named(port)?.id;
        self.outputs.get(&node_id)?.get(&port_id)
    }

    /// Evaluate every node in order, returning the records produced by sinks
    pub fn evaluate_all(&mut self) -> Result<Vec<(NodeId, ResolvedAnimationRecord)>, EvaluationError> {
        let graph = self.graph;
        let mut resolved = Vec::new();

        for index in 0..self.order.len() {
            let node_id = self.order[index];
            let node = graph.node(node_id)
                .ok_or(EvaluationError::NodeNotFound(node_id))?;

            let mut inputs = PortValues::new();
            for port in &node.inputs {
                match self.get_input(port.id) {
                    Some(value) => {
                        inputs.insert(port.name.clone(), value.clone());
                    }
                    None => {
                        tracing::debug!(node = %node.name, port = %port.name, "missing upstream value, using default");
                    }
                }
            }

            let evaluation = node.kind.evaluate(&node.fields, &inputs);
            tracing::debug!(node = %node.name, kind = %node.kind, outputs = ?evaluation.outputs, "evaluated node");

            let mut output = NodeOutput::new();
            for (name, value) in evaluation.outputs {
                if let Some(port) = node.output_named(&name) {
                    output.set(port.id, value);
                }
            }
            self.set_output(node_id, output);

            if let Some(record) = evaluation.resolved {
                resolved.push((node_id, record));
            }
        }

        Ok(resolved)
    }

    /// Evaluate the graph and return the animation sink's record
    pub fn run(mut self) -> Result<ResolvedAnimationRecord, EvaluationError> {
        let mut resolved = self.evaluate_all()?;
        match resolved.len() {
            0 => Err(EvaluationError::NoSink),
            1 => Ok(resolved.remove(0).1),
            count => Err(EvaluationError::MultipleSinks(count)),
        }
    }
}

/// Evaluate a graph once from scratch
pub fn evaluate_graph(graph: &Graph) -> Result<ResolvedAnimationRecord, EvaluationError> {
    let result = EvaluationContext::new(graph).and_then(EvaluationContext::run);
    match &result {
        Ok(record) => tracing::debug!(?record, "graph evaluated"),
        Err(error) => tracing::warn!("graph evaluation failed: {error}"),
    }
    result
}

/// Count the sinks of a graph
pub fn sink_count(graph: &Graph) -> usize {
    graph.nodes_of_kind(NodeKind::AnimationSink).count()
}

/// Error during evaluation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    /// Graph contains a cycle
    #[error("Graph contains a cycle")]
    CycleDetected,

    /// No animation sink in the graph
    #[error("Graph has no text animation node")]
    NoSink,

    /// More than one animation sink in the graph
    #[error("Graph has {0} text animation nodes, expected exactly one")]
    MultipleSinks(usize),

    /// Node referenced by the evaluation order vanished
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
}
