// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Server Settings
//!
//! Settings come from two places:
//!
//! 1. **Client settings** under the `pgsqlLsp` key (`workspace/didChangeConfiguration`
//!    payload or `initializationOptions`)
//! 2. **Workspace file** `.pgsql-lsp.yaml` at a workspace root
//!
//! Client settings win over the workspace file. Invalid settings are reported and the
//! previous (or default) settings stay in effect.
//!
//! ## Example
//!
//! ```yaml
//! defaultSchema: public
//! definitionFiles:
//!   - "schema/**/*.pgsql"
//!   - "migrations/*.sql"
//! ```

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Key of the server's section in client settings
pub const SETTINGS_SECTION: &str = "pgsqlLsp";

/// Workspace-level settings file name
pub const SETTINGS_FILE_NAME: &str = ".pgsql-lsp.yaml";

/// Server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Schema assumed for unqualified names
    pub default_schema: String,

    /// Glob patterns, relative to a workspace root, of files holding definitions
    pub definition_files: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_schema: "public".to_string(),
            definition_files: vec![
                "**/*.psql".to_string(),
                "**/*.pgsql".to_string(),
                "**/*.sql".to_string(),
            ],
        }
    }
}

impl Settings {
    /// Parse settings from an LSP client settings payload.
    ///
    /// Expected shape:
    /// {
    ///   "pgsqlLsp": {
    ///     "defaultSchema": "public",
    ///     "definitionFiles": ["**/*.pgsql"]
    ///   }
    /// }
    ///
    /// Returns `Ok(None)` when the payload has no `pgsqlLsp` section.
    pub fn from_lsp_settings(settings: &Value) -> Result<Option<Self>, ConfigError> {
        let Some(section) = settings.get(SETTINGS_SECTION) else {
            return Ok(None);
        };

        let parsed: Settings =
            serde_json::from_value(section.clone()).map_err(ConfigError::InvalidClientSettings)?;
        parsed.validate()?;

        Ok(Some(parsed))
    }

    /// Parse settings from YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let parsed: Settings = serde_yaml::from_str(text)?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Read and parse a YAML settings file
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml_str(&text)
    }

    /// Load `.pgsql-lsp.yaml` from a workspace root, if present
    pub fn from_workspace_root(root: &Path) -> Result<Option<Self>, ConfigError> {
        let path = root.join(SETTINGS_FILE_NAME);
        if !path.is_file() {
            return Ok(None);
        }

        Self::from_yaml_file(&path).map(Some)
    }

    /// Validate the settings
    ///
    /// Checks that:
    /// - The default schema is not empty
    /// - Every definition file pattern is a valid glob
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_schema.trim().is_empty() {
            return Err(ConfigError::EmptyDefaultSchema);
        }

        self.definition_matcher().map(|_| ())
    }

    /// Compile the definition file patterns
    pub fn definition_matcher(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.definition_files {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }

        builder.build().map_err(|source| ConfigError::InvalidPattern {
            pattern: self.definition_files.join(", "),
            source,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Default schema is empty
    #[error("defaultSchema must not be empty")]
    EmptyDefaultSchema,

    /// Definition file pattern is not a valid glob
    #[error("Invalid definition file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Client settings do not match the expected shape
    #[error("Invalid client settings: {0}")]
    InvalidClientSettings(#[source] serde_json::Error),

    /// Settings file is not valid YAML for [`Settings`]
    #[error("Invalid settings file: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// Settings file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
