// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor settings.
//!
//! Settings live in a RON file next to the user's graphs. A missing file
//! means defaults; a partial file fills the gaps with defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "textanim.ron";

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or writing the file failed
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid settings RON
    #[error("Invalid settings file: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialized
    #[error("Could not serialize settings: {0}")]
    Serialize(#[from] ron::Error),

    /// The file was written by a newer editor
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}

/// External renderer invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Renderer executable
    pub program: String,
    /// Extra arguments placed before the script path
    pub args: Vec<String>,
    /// File the exported program is written to, inside `work_dir`
    pub script_file_name: String,
    /// Directory the renderer runs in; the current directory when unset
    pub work_dir: Option<PathBuf>,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            program: "manimgl".to_string(),
            args: Vec::new(),
            script_file_name: "text_animation.py".to_string(),
            work_dir: None,
        }
    }
}

impl RendererSettings {
    /// Directory the script is written to and the renderer runs in
    pub fn work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Full path of the exported script
    pub fn script_path(&self) -> PathBuf {
        self.work_dir().join(&self.script_file_name)
    }
}

/// Editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Settings format version
    pub version: u32,
    /// Renderer invocation
    pub renderer: RendererSettings,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            renderer: RendererSettings::default(),
        }
    }
}

impl EditorSettings {
    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: EditorSettings = ron::from_str(&content)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings)
    }

    /// Load settings from `path`, or from [`SETTINGS_FILE_NAME`] in the
    /// current directory; defaults when the file does not exist
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SettingsError> {
        let path = path.map_or_else(|| PathBuf::from(SETTINGS_FILE_NAME), Path::to_path_buf);
        if !path.exists() {
            tracing::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let settings = Self::load(&path)?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
