// SPDX-License-Identifier: MIT OR Apache-2.0
//! Hand-off of exported programs to the external renderer.
//!
//! The program is written into the renderer's working directory and the
//! renderer is started with the script and scene name. Rendering runs on a
//! tokio runtime; the caller gets a one-shot receiver that yields exactly
//! one [`RenderOutcome`].

use crate::settings::RendererSettings;
use std::process::Stdio;
use textanim_editor_graph::SCENE_CLASS_NAME;
use tokio::process::Command;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// How a render attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Renderer exited successfully; carries its standard output
    Completed(String),
    /// Writing the script, starting the renderer or the render itself failed
    Failed(String),
}

/// Runs the external renderer
#[derive(Debug, Clone)]
pub struct Renderer {
    settings: RendererSettings,
}

impl Renderer {
    /// Create a renderer from settings
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    /// Write the program and run the renderer to completion
    pub async fn render(&self, program: &str) -> RenderOutcome {
        let work_dir = self.settings.work_dir();
        let script_path = self.settings.script_path();

        if let Err(e) = tokio::fs::write(&script_path, program).await {
            tracing::error!("Failed to write {}: {e}", script_path.display());
            return RenderOutcome::Failed(format!(
                "Failed to write {}: {e}",
                script_path.display()
            ));
        }
        tracing::info!("Program written to {}", script_path.display());

        let mut command = Command::new(&self.settings.program);
        command
            .args(&self.settings.args)
            .arg(&self.settings.script_file_name)
            .arg(SCENE_CLASS_NAME)
            .current_dir(&work_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        tracing::info!(
            "Executing {} {} {}",
            self.settings.program,
            self.settings.script_file_name,
            SCENE_CLASS_NAME
        );

        let output = match command.output().await {
            Ok(output) => output,
            Err(e) => {
                tracing::error!("Failed to start {}: {e}", self.settings.program);
                return RenderOutcome::Failed(format!(
                    "Failed to start {}: {e}",
                    self.settings.program
                ));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            tracing::error!("Renderer failed ({}): {}", output.status, stderr.trim());
            return RenderOutcome::Failed(format!(
                "{} exited with {}: {}",
                self.settings.program,
                output.status,
                stderr.trim()
            ));
        }

        if !stderr.trim().is_empty() {
            tracing::debug!("Renderer stderr: {}", stderr.trim());
        }
        tracing::info!("Render completed");
        RenderOutcome::Completed(stdout)
    }

    /// Start rendering in the background; the receiver yields the outcome once
    pub fn spawn(&self, handle: &Handle, program: String) -> oneshot::Receiver<RenderOutcome> {
        let (sender, receiver) = oneshot::channel();
        let renderer = self.clone();
        handle.spawn(async move {
            let outcome = renderer.render(&program).await;
            // The requester may have stopped listening
            let _ = sender.send(outcome);
        });
        receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tokio::runtime::{Builder, Runtime};

    fn runtime() -> Runtime {
        Builder::new_current_thread().enable_all().build().unwrap()
    }

    fn renderer(program: &str, work_dir: &Path) -> Renderer {
        Renderer::new(RendererSettings {
            program: program.to_string(),
            work_dir: Some(work_dir.to_path_buf()),
            ..RendererSettings::default()
        })
    }

    #[cfg(unix)]
    #[test]
    fn test_completed_render_returns_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = renderer("echo", dir.path());

        let outcome = runtime().block_on(renderer.render("print('hi')\n"));
        assert_eq!(
            outcome,
            RenderOutcome::Completed("text_animation.py TextAnimation\n".to_string())
        );
        let written = std::fs::read_to_string(dir.path().join("text_animation.py")).unwrap();
        assert_eq!(written, "print('hi')\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = runtime().block_on(renderer("false", dir.path()).render("pass\n"));
        assert!(matches!(outcome, RenderOutcome::Failed(ref msg) if msg.starts_with("false exited with")));
    }

    #[test]
    fn test_missing_renderer_fails() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = runtime().block_on(
            renderer("textanim-renderer-that-does-not-exist", dir.path()).render("pass\n"),
        );
        assert!(matches!(outcome, RenderOutcome::Failed(ref msg) if msg.starts_with("Failed to start")));
    }

    #[test]
    fn test_unwritable_work_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing").join("deeper");
        let outcome = runtime().block_on(renderer("echo", &missing).render("pass\n"));
        assert!(matches!(outcome, RenderOutcome::Failed(ref msg) if msg.starts_with("Failed to write")));
    }

    #[cfg(unix)]
    #[test]
    fn test_spawned_render_reports_once() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = runtime();
        let receiver = renderer("echo", dir.path()).spawn(runtime.handle(), "pass\n".to_string());
        let outcome = runtime.block_on(receiver).unwrap();
        assert!(matches!(outcome, RenderOutcome::Completed(_)));
    }
}
