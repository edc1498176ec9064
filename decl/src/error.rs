//! Error types for loading declaration files.
//!
//! Covers reading and deserializing the file, resolving its type
//! expressions and defaults, and building the resulting schema.

use argbind_core::ConfigError;
use thiserror::Error;

/// Errors raised while turning a declaration into a schema.
#[derive(Debug, Error)]
pub enum DeclError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON deserialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file extension is neither JSON nor YAML.
    #[error("unsupported declaration format: {0}")]
    UnsupportedFormat(String),

    /// A type expression could not be parsed.
    #[error("invalid type `{expr}` for parameter `{param}`: {reason}")]
    InvalidType {
        expr: String,
        param: String,
        reason: String,
    },

    /// A bare type name that is neither a scalar, an enum nor a record.
    #[error("unknown type `{name}` for parameter `{param}`")]
    UnknownType { name: String, param: String },

    /// A record type refers to itself, directly or through other records.
    #[error("record `{0}` is defined recursively")]
    RecursiveRecord(String),

    /// A default value does not convert to its parameter's type.
    #[error("invalid default for parameter `{param}`: {reason}")]
    InvalidDefault { param: String, reason: String },

    /// The declaration is well-formed but does not make a valid schema.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience alias for results with [`DeclError`].
pub type Result<T> = std::result::Result<T, DeclError>;
