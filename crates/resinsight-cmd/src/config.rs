//! Engine configuration
//!
//! Surface syntax details and execution policy are configurable so that a
//! host can match the exact command-file dialect it consumes. Configuration
//! is read from TOML:
//!
//! ```toml
//! [syntax]
//! argument_separator = "either"
//! allow_positional = true
//!
//! [execution]
//! stop_on_error = false
//!
//! [export.default_folders]
//! snapshots = "images"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CmdError, CmdResult};
use crate::session::ExportKind;

/// How an argument name is separated from its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentSeparator {
    /// `name=value`
    Equals,
    /// `name value`
    Whitespace,
    /// Either form
    #[default]
    Either,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntaxConfig {
    pub argument_separator: ArgumentSeparator,
    /// Bind unnamed values to scriptable fields in schema order
    pub allow_positional: bool,
    /// Lines starting with this character are skipped
    pub comment_prefix: char,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            argument_separator: ArgumentSeparator::Either,
            allow_positional: true,
            comment_prefix: '#',
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Stop after the first command whose response is an error
    pub stop_on_error: bool,
    /// Parse only when the script has parse errors
    pub skip_execution_on_parse_errors: bool,
    /// Log every command before it runs
    pub echo: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Overrides of the project-relative fallback folder per export kind
    pub default_folders: BTreeMap<ExportKind, String>,
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub syntax: SyntaxConfig,
    pub execution: ExecutionConfig,
    pub export: ExportConfig,
}

impl ScriptConfig {
    pub fn from_toml_str(text: &str) -> CmdResult<Self> {
        toml::from_str(text).map_err(|e| CmdError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> CmdResult<String> {
        toml::to_string_pretty(self).map_err(|e| CmdError::Config(e.to_string()))
    }

    /// Read configuration from a TOML file
    pub fn load(path: &Path) -> CmdResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            CmdError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Write configuration as TOML, creating parent folders
    pub fn save(&self, path: &Path) -> CmdResult {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}
