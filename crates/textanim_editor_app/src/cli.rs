// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line front-end.
//!
//! Each editing command loads a graph document, applies one mutation through
//! the session, and writes the document back. `eval`, `export` and `run`
//! evaluate the graph from scratch before doing anything else.

use crate::document::{DocumentError, GraphDocument};
use crate::render::{RenderOutcome, Renderer};
use crate::settings::{EditorSettings, SettingsError, SETTINGS_FILE_NAME};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use textanim_editor_graph::evaluation::sink_count;
use textanim_editor_graph::graphs::text_animation::FONT_FAMILIES;
use textanim_editor_graph::{
    starter_graph, ConnectionId, EvaluationError, FieldValue, Graph, GraphEvent, GraphMutation,
    MutationError, NodeId, NodeKind, Port, PortId, SessionState,
};
use thiserror::Error;

/// Edit, export and render text animation graphs
#[derive(Debug, Parser)]
#[command(name = "textanim_editor", version, about)]
pub struct Cli {
    /// Settings file (defaults to ./textanim.ron when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Editor commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a graph holding one node of each kind
    New {
        /// Graph file (.ron or .json)
        graph: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Write a settings file with the default values
    InitConfig {
        /// Settings file to create
        #[arg(default_value = SETTINGS_FILE_NAME)]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// List nodes, ports, fields and connections
    Show {
        /// Graph file
        graph: PathBuf,
    },
    /// Add a node (color_source, text_source, duration_source, animation_sink)
    AddNode {
        /// Graph file
        graph: PathBuf,
        /// Node kind
        kind: NodeKind,
        /// Canvas x position
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        x: f32,
        /// Canvas y position
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        y: f32,
    },
    /// Remove a node and its connections
    RemoveNode {
        /// Graph file
        graph: PathBuf,
        /// Node id, id prefix, name or kind
        node: String,
    },
    /// Connect an output port to an input port
    Connect {
        /// Graph file
        graph: PathBuf,
        /// Source node
        from: String,
        /// Output port of the source node
        from_port: String,
        /// Target node
        to: String,
        /// Input port of the target node
        to_port: String,
    },
    /// Remove a connection
    Disconnect {
        /// Graph file
        graph: PathBuf,
        /// Connection id or id prefix
        connection: String,
    },
    /// Set a node field
    Set {
        /// Graph file
        graph: PathBuf,
        /// Node id, id prefix, name or kind
        node: String,
        /// Field name
        field: String,
        /// New value; fontSize and duration take numbers, color a hex code
        #[arg(allow_negative_numbers = true)]
        value: String,
        /// Store the value as text even for numeric fields
        #[arg(long)]
        text: bool,
    },
    /// Move a node on the canvas
    Move {
        /// Graph file
        graph: PathBuf,
        /// Node id, id prefix, name or kind
        node: String,
        /// New x position
        #[arg(allow_negative_numbers = true)]
        x: f32,
        /// New y position
        #[arg(allow_negative_numbers = true)]
        y: f32,
    },
    /// Print the resolved animation record as JSON
    Eval {
        /// Graph file
        graph: PathBuf,
    },
    /// Print or write the exported program
    Export {
        /// Graph file
        graph: PathBuf,
        /// Write the program here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export the program and hand it to the renderer
    Run {
        /// Graph file
        graph: PathBuf,
    },
}

/// Command errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Graph document error
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Settings error
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Edit rejected
    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// Graph did not evaluate
    #[error("Evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Refusing to overwrite
    #[error("{} already exists (use --force to overwrite)", .0.display())]
    AlreadyExists(PathBuf),

    /// Node reference matched nothing
    #[error("No node matches {0:?}")]
    NodeNotFound(String),

    /// Node reference matched several nodes
    #[error("{0:?} matches more than one node")]
    AmbiguousNode(String),

    /// Connection reference matched nothing
    #[error("No connection matches {0:?}")]
    ConnectionNotFound(String),

    /// Connection reference matched several connections
    #[error("{0:?} matches more than one connection")]
    AmbiguousConnection(String),

    /// Port name unknown on the node
    #[error("{node} has no {direction} port named {port:?}")]
    PortNotFound {
        /// Node name
        node: String,
        /// Requested port
        port: String,
        /// "input" or "output"
        direction: &'static str,
    },

    /// Async runtime could not start
    #[error("Failed to start runtime: {0}")]
    Runtime(std::io::Error),

    /// Renderer reported a failure
    #[error("Render failed: {0}")]
    Render(String),
}

/// Run a parsed command line
pub fn execute(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::New { graph, force } => {
            refuse_overwrite(&graph, force)?;
            GraphDocument::new(starter_graph()).save(&graph)?;
            println!("Created {}", graph.display());
        }
        Command::InitConfig { path, force } => {
            refuse_overwrite(&path, force)?;
            EditorSettings::default().save(&path)?;
            println!("Created {}", path.display());
        }
        Command::Show { graph } => {
            let document = GraphDocument::load(&graph)?;
            print!("{}", describe(&SessionState::new(document.graph)));
        }
        Command::AddNode { graph, kind, x, y } => {
            let event = edit(&graph, |_| Ok(GraphMutation::AddNode { kind, position: [x, y] }))?;
            if let Some(GraphEvent::NodeCreated(id)) = event {
                println!("{id}");
            }
        }
        Command::RemoveNode { graph, node } => {
            edit(&graph, |g| Ok(GraphMutation::RemoveNode(resolve_node(g, &node)?)))?;
        }
        Command::Connect { graph, from, from_port, to, to_port } => {
            let event = edit(&graph, |g| {
                let from_node = resolve_node(g, &from)?;
                let to_node = resolve_node(g, &to)?;
                Ok(GraphMutation::Connect {
                    from_node,
                    from_port: port_id(g, from_node, &from_port, false)?,
                    to_node,
                    to_port: port_id(g, to_node, &to_port, true)?,
                })
            })?;
            if let Some(GraphEvent::ConnectionCreated(id)) = event {
                println!("{id}");
            }
        }
        Command::Disconnect { graph, connection } => {
            edit(&graph, |g| Ok(GraphMutation::Disconnect(resolve_connection(g, &connection)?)))?;
        }
        Command::Set { graph, node, field, value, text } => {
            edit(&graph, |g| {
                let node = resolve_node(g, &node)?;
                let kind = g.node(node).map(|n| n.kind);
                let value = field_value(kind, &field, &value, text);
                Ok(GraphMutation::SetField { node, key: field, value })
            })?;
        }
        Command::Move { graph, node, x, y } => {
            edit(&graph, |g| {
                Ok(GraphMutation::MoveNode {
                    node: resolve_node(g, &node)?,
                    position: [x, y],
                })
            })?;
        }
        Command::Eval { graph } => {
            let mut session = load_session(&graph)?;
            let record = session.process()?;
            println!("{}", serde_json::to_string_pretty(record)?);
        }
        Command::Export { graph, output } => {
            let program = load_session(&graph)?.export()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, program)?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{program}"),
            }
        }
        Command::Run { graph } => {
            let settings = EditorSettings::load_or_default(cli.config.as_deref())?;
            let program = load_session(&graph)?.export()?;
            run_renderer(Renderer::new(settings.renderer), program)?;
        }
    }
    Ok(())
}

fn refuse_overwrite(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::AlreadyExists(path.to_path_buf()));
    }
    Ok(())
}

fn load_session(path: &Path) -> Result<SessionState, CliError> {
    Ok(SessionState::new(GraphDocument::load(path)?.graph))
}

/// Load, apply one mutation, save
fn edit(
    path: &Path,
    build: impl FnOnce(&Graph) -> Result<GraphMutation, CliError>,
) -> Result<Option<GraphEvent>, CliError> {
    let mut session = load_session(path)?;
    let mutation = build(session.graph())?;
    let event = session.apply(mutation)?;
    if let Some(error) = session.last_error() {
        tracing::warn!("Graph saved, but it does not evaluate: {error}");
    }
    GraphDocument::new(session.into_graph()).save(path)?;
    tracing::info!("Updated {}", path.display());
    Ok(event)
}

fn run_renderer(renderer: Renderer, program: String) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let receiver = renderer.spawn(runtime.handle(), program);
    let outcome = runtime
        .block_on(receiver)
        .unwrap_or_else(|_| RenderOutcome::Failed("Render task ended without a result".to_string()));

    match outcome {
        RenderOutcome::Completed(output) => {
            print!("{output}");
            Ok(())
        }
        RenderOutcome::Failed(error) => Err(CliError::Render(error)),
    }
}

/// Field value typed on the command line, shaped by the field's kind.
/// Unknown fields become text and are rejected by the session.
fn field_value(kind: Option<NodeKind>, key: &str, raw: &str, force_text: bool) -> FieldValue {
    match kind.and_then(|k| k.field_kind(key)) {
        Some(field_kind) if !force_text => field_kind.value_from_str(raw),
        _ => FieldValue::Text(raw.to_string()),
    }
}

/// Find a node by id, id prefix, display name or kind
fn resolve_node(graph: &Graph, reference: &str) -> Result<NodeId, CliError> {
    let wanted = reference.trim();
    let id_prefix = wanted.to_ascii_lowercase();
    let kind = wanted.parse::<NodeKind>().ok();

    let matches: Vec<NodeId> = graph
        .nodes()
        .filter(|n| {
            (!id_prefix.is_empty() && n.id.to_string().starts_with(&id_prefix))
                || n.name.eq_ignore_ascii_case(wanted)
                || kind == Some(n.kind)
        })
        .map(|n| n.id)
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(CliError::NodeNotFound(reference.to_string())),
        _ => Err(CliError::AmbiguousNode(reference.to_string())),
    }
}

/// Find a connection by id or id prefix
fn resolve_connection(graph: &Graph, reference: &str) -> Result<ConnectionId, CliError> {
    let id_prefix = reference.trim().to_ascii_lowercase();
    let matches: Vec<ConnectionId> = graph
        .connections()
        .filter(|c| !id_prefix.is_empty() && c.id.to_string().starts_with(&id_prefix))
        .map(|c| c.id)
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(CliError::ConnectionNotFound(reference.to_string())),
        _ => Err(CliError::AmbiguousConnection(reference.to_string())),
    }
}

fn port_id(
    graph: &Graph,
    node_id: NodeId,
    port: &str,
    input: bool,
) -> Result<PortId, CliError> {
    let node = graph.node(node_id).ok_or_else(|| CliError::NodeNotFound(node_id.to_string()))?;
    let found = if input { node.input_named(port) } else { node.output_named(port) };
    found.map(|p| p.id).ok_or_else(|| CliError::PortNotFound {
        node: node.name.clone(),
        port: port.to_string(),
        direction: if input { "input" } else { "output" },
    })
}

fn short_id(id: impl ToString) -> String {
    let mut id = id.to_string();
    id.truncate(8);
    id
}

/// Human-readable listing of a session's graph
fn describe(session: &SessionState) -> String {
    let graph = session.graph();
    let mut out = format!(
        "Graph '{}' ({} nodes, {} connections)\n",
        graph.name,
        graph.node_count(),
        graph.connection_count()
    );

    out.push_str("Nodes:\n");
    for node in graph.nodes() {
        out.push_str(&format!(
            "  {}  {} [{}, {}] at ({}, {})\n",
            short_id(node.id),
            node.name,
            node.kind,
            node.kind.category().name(),
            node.position[0],
            node.position[1]
        ));
        let ports = |ports: &[Port]| {
            ports
                .iter()
                .map(|p| format!("{} ({})", p.name, p.socket.name()))
                .collect::<Vec<_>>()
                .join(", ")
        };
        if !node.inputs.is_empty() {
            out.push_str(&format!("      in:  {}\n", ports(&node.inputs)));
        }
        if !node.outputs.is_empty() {
            out.push_str(&format!("      out: {}\n", ports(&node.outputs)));
        }
        for (key, value) in &node.fields {
            out.push_str(&format!("      {key} = {value}\n"));
        }
        if node.kind == NodeKind::TextSource {
            out.push_str(&format!("      font families: {}\n", FONT_FAMILIES.join(", ")));
        }
    }

    out.push_str("Connections:\n");
    for connection in graph.connections() {
        let end = |node_id: NodeId, port_id: PortId| {
            graph
                .node(node_id)
                .map(|n| {
                    let port = n.port(&port_id).map_or("?", |p| p.name.as_str());
                    format!("{}.{}", n.name, port)
                })
                .unwrap_or_else(|| "?".to_string())
        };
        out.push_str(&format!(
            "  {}  {} -> {}\n",
            short_id(connection.id),
            end(connection.from_node, connection.from_port),
            end(connection.to_node, connection.to_port)
        ));
    }

    match session.last_error() {
        None => {
            let record = session.last_record();
            out.push_str(&format!(
                "Resolved: \"{}\" {} {}pt {} for {}s\n",
                record.text,
                record.rgb(),
                record.font_size,
                record.font_family,
                record.time
            ));
        }
        Some(error) => {
            out.push_str(&format!("Evaluation failed: {error}\n"));
            if sink_count(graph) == 0 {
                out.push_str("Add one with: add-node <graph> animation_sink\n");
            }
        }
    }
    out
}
