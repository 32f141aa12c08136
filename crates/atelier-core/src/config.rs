//! Engine configuration
//!
//! ```toml
//! # atelier.toml
//! max_undo_steps = 50
//! undo_enabled = true
//!
//! [logging]
//! profile = "production"
//! ```
//!
//! Every key is optional; missing keys fall back to [`EngineConfig::default`].

use crate::errors::{AtelierError, Result};
use crate::logging_facility::Profile;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of undoable history entries
pub const DEFAULT_MAX_UNDO_STEPS: usize = 25;

/// Transaction manager settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// History depth cap; 0 means unbounded
    pub max_undo_steps: usize,
    /// When false, commits apply but are never recorded
    pub undo_enabled: bool,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub profile: Profile,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_undo_steps: DEFAULT_MAX_UNDO_STEPS,
            undo_enabled: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_max_undo_steps(mut self, steps: usize) -> Self {
        self.max_undo_steps = steps;
        self
    }

    /// Parse from TOML text
    ///
    /// # Errors
    ///
    /// Returns `Config` when the text is not valid TOML for this schema.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| AtelierError::Config {
            message: e.to_string(),
        })
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `Config` if it does not parse.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }
}
