// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph documents on disk.
//!
//! A document wraps the graph with a format version. `.json` files are read
//! and written as JSON, everything else as RON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use textanim_editor_graph::Graph;
use thiserror::Error;

/// Current graph document format version
pub const GRAPH_FORMAT_VERSION: u32 = 1;

/// Document errors
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Reading or writing the file failed
    #[error("Graph file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid RON document
    #[error("Invalid graph document: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// RON serialization failed
    #[error("Could not serialize graph: {0}")]
    RonSerialize(#[from] ron::Error),

    /// Invalid JSON document, or JSON serialization failed
    #[error("Invalid graph document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document was written by a newer editor
    #[error("Graph document version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}

/// On-disk encoding of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Rusty Object Notation
    Ron,
    /// JSON
    Json,
}

impl DocumentFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Ron,
        }
    }
}

/// A versioned graph document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Format version
    pub version: u32,
    /// The graph
    pub graph: Graph,
}

impl GraphDocument {
    /// Wrap a graph in a current-version document
    pub fn new(graph: Graph) -> Self {
        Self {
            version: GRAPH_FORMAT_VERSION,
            graph,
        }
    }

    /// Load a document, picking the format from the extension
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path)?;
        let document: GraphDocument = match DocumentFormat::from_path(path) {
            DocumentFormat::Ron => ron::from_str(&content)?,
            DocumentFormat::Json => serde_json::from_str(&content)?,
        };

        if document.version > GRAPH_FORMAT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: document.version,
                supported: GRAPH_FORMAT_VERSION,
            });
        }

        tracing::debug!(
            "Loaded graph '{}' ({} nodes, {} connections) from {}",
            document.graph.name,
            document.graph.node_count(),
            document.graph.connection_count(),
            path.display()
        );
        Ok(document)
    }

    /// Save a document, picking the format from the extension
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let content = match DocumentFormat::from_path(path) {
            DocumentFormat::Ron => {
                let config = ron::ser::PrettyConfig::default()
                    .struct_names(true)
                    .enumerate_arrays(false);
                ron::ser::to_string_pretty(self, config)?
            }
            DocumentFormat::Json => serde_json::to_string_pretty(self)?,
        };
        std::fs::write(path, content)?;
        tracing::debug!("Saved graph to {}", path.display());
        Ok(())
    }
}
