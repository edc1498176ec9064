//! Loading declaration files.
//!
//! A file holds either a single [`Declaration`] or a [`CommandSetDecl`]
//! (recognized by its `commands` key). The format follows the extension:
//! `.json`, or `.yaml`/`.yml`.
//!
//! ```no_run
//! use argbind_decl::{Loaded, Loader};
//!
//! let loaded = Loader::new().with_program_name("dice").load("dice.yaml").unwrap();
//! if let Loaded::Schema(schema) = loaded {
//!     println!("{} options", schema.options().len());
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use argbind_core::{CommandSet, Schema, ValueRegistry};
use tracing::debug;

use crate::declaration::{CommandSetDecl, Declaration};
use crate::error::{DeclError, Result};

/// Serialization format of a declaration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Picks the format from the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`DeclError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(DeclError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Parsed contents of a declaration file.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclFile {
    Single(Declaration),
    Commands(CommandSetDecl),
}

impl DeclFile {
    /// Parses file contents.
    ///
    /// # Errors
    ///
    /// Returns [`DeclError::Json`] or [`DeclError::Yaml`] on malformed input.
    pub fn parse(text: &str, format: Format) -> Result<Self> {
        match format {
            Format::Json => {
                let value: serde_json::Value = serde_json::from_str(text)?;
                if value.get("commands").is_some() {
                    Ok(Self::Commands(serde_json::from_value(value)?))
                } else {
                    Ok(Self::Single(serde_json::from_value(value)?))
                }
            }
            Format::Yaml => {
                let value: serde_yaml::Value = serde_yaml::from_str(text)?;
                if value.get("commands").is_some() {
                    Ok(Self::Commands(serde_yaml::from_value(value)?))
                } else {
                    Ok(Self::Single(serde_yaml::from_value(value)?))
                }
            }
        }
    }
}

/// A built schema or command set.
#[derive(Debug, Clone)]
pub enum Loaded {
    Schema(Schema),
    Commands(CommandSet),
}

/// Builds schemas from declaration files.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    registry: Arc<ValueRegistry>,
    program_name: Option<String>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `registry` for type resolution, default conversion and parsing.
    pub fn with_registry(mut self, registry: Arc<ValueRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Overrides the program name shown in usage text.
    pub fn with_program_name(mut self, program_name: &str) -> Self {
        self.program_name = Some(program_name.to_string());
        self
    }

    /// Reads, parses and builds a declaration file.
    ///
    /// # Errors
    ///
    /// Returns [`DeclError::Io`] if the file cannot be read, and any error of
    /// [`load_str`](Self::load_str).
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Loaded> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), format = ?format, "Loading declaration file");
        self.load_str(&text, format)
    }

    /// Parses and builds declaration text.
    ///
    /// # Errors
    ///
    /// Returns a parse, resolution or configuration [`DeclError`].
    pub fn load_str(&self, text: &str, format: Format) -> Result<Loaded> {
        match DeclFile::parse(text, format)? {
            DeclFile::Single(decl) => {
                let mut builder = decl.to_builder(Arc::clone(&self.registry))?;
                if let Some(program) = &self.program_name {
                    builder = builder.program_name(program);
                }
                Ok(Loaded::Schema(builder.build()?))
            }
            DeclFile::Commands(set) => {
                let mut commands = set.build(Arc::clone(&self.registry))?;
                if let Some(program) = &self.program_name {
                    commands = commands.with_program_name(program);
                }
                Ok(Loaded::Commands(commands))
            }
        }
    }
}
