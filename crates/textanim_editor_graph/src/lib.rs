// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dataflow graph core for the text animation editor.
//!
//! A small node graph (color, text style and duration sources feeding a
//! single text animation sink) is evaluated into a resolved animation record,
//! which is then exported as a manimgl program.
//!
//! ## Architecture
//!
//! - Typed sockets and ports ([`port`])
//! - A closed set of node kinds with pure evaluation ([`graphs::text_animation`])
//! - Graph model with single-connection inputs ([`graph`])
//! - Full, single-pass topological evaluation ([`evaluation`])
//! - Program export and hex color helpers ([`export`], [`color`])
//! - Session state driven by graph mutations ([`session`])

pub mod color;
pub mod connection;
pub mod evaluation;
pub mod export;
pub mod graph;
pub mod graphs;
pub mod node;
pub mod port;
pub mod session;

pub use color::{hex_to_rgb, Rgb8};
pub use connection::{Connection, ConnectionId};
pub use evaluation::{evaluate_graph, EvaluationError};
pub use export::{export_program, SCENE_CLASS_NAME};
pub use graph::{ConnectionError, Graph};
pub use graphs::text_animation::{starter_graph, NodeKind, ResolvedAnimationRecord};
pub use node::{FieldKind, FieldValue, Node, NodeId};
pub use port::{Port, PortDirection, PortId, PortValue, SocketType};
pub use session::{GraphEvent, GraphMutation, MutationError, SessionState};
