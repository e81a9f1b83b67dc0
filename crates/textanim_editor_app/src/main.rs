// SPDX-License-Identifier: MIT OR Apache-2.0
//! Text animation editor
//!
//! Command-line editor for text animation node graphs:
//! - Create and edit graphs of color, text and duration sources feeding one
//!   animation sink
//! - Evaluate a graph into its resolved animation record
//! - Export the record as a manimgl program
//! - Hand the program to the external renderer
//!
//! ## Architecture
//!
//! Graph semantics live in `textanim_editor_graph`; this binary adds the
//! settings file, graph documents on disk and the renderer hand-off. Logs go
//! to stderr so command output on stdout stays clean.

mod cli;
mod document;
mod render;
mod settings;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    tracing::debug!("Starting textanim editor v{}", env!("CARGO_PKG_VERSION"));

    match cli::execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging; `RUST_LOG` wins over the verbosity flag
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("textanim_editor={level},textanim_editor_graph={level}"))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
