//! Error kinds raised while building schemas and binding tokens.
//!
//! - [`ConfigError`]: the schema declaration itself is invalid. Raised at
//!   build time, before any token is examined.
//! - [`OptionError`]: the token stream does not fit the schema.
//! - [`ValueError`]: a token could not be converted to its parameter's type.
//!
//! [`ParseError`] groups the two parse-time kinds and [`Error`] groups all
//! three for callers that want a single type.

use thiserror::Error;

/// The schema declaration is invalid. Always a programming defect, never a
/// user input problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("An argument should be either positional or named (or both)!")]
    NotPositionalOrNamed { param: String },

    #[error("Named arguments should have at least one name!")]
    MissingName,

    #[error("Only one argument can be marked as var args!")]
    DuplicateVarArgs,

    #[error("Only one argument can be marked as var kwargs!")]
    DuplicateVarKwargs,

    #[error("Cannot use `help` as parameter name in `{obj}`!")]
    ReservedName { obj: String },

    #[error(
        "Option name `{name}` is used multiple times in `{obj}`! \
         Recursive parsing requires unique option names among all levels."
    )]
    DuplicateName { name: String, obj: String },

    #[error("Cannot recurse into variadic parameter `{param}` in `{obj}`!")]
    RecurseIntoVariadic { param: String, obj: String },

    #[error("Cannot recurse into n-ary parameter `{param}` in `{obj}`!")]
    RecurseIntoNary { param: String, obj: String },

    #[error("Cannot recurse into parameter `{param}` of non-class type `{ty}` in `{obj}`!")]
    RecurseIntoNonRecord {
        param: String,
        ty: String,
        obj: String,
    },

    #[error("Cannot have variadic parameter `{param}` in child schema of `{obj}`!")]
    VariadicInChild { param: String, obj: String },

    #[error("Unsupported type `{ty}` for parameter `{param}` in `{obj}`!")]
    UnsupportedType {
        ty: String,
        param: String,
        obj: String,
    },

    #[error("Command `{0}` is defined more than once!")]
    DuplicateCommand(String),
}

/// Structural problem in the token stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("Prefix `{0}` is not followed by an option!")]
    BarePrefix(&'static str),

    #[error("Unexpected option `{0}`!")]
    UnexpectedOption(String),

    #[error("Option `{0}` is multiply given!")]
    MultiplyGiven(String),

    #[error("Option `{0}` is a flag and cannot be assigned a value!")]
    FlagWithValue(String),

    #[error("Option `{0}` is missing argument!")]
    MissingValue(String),

    #[error("Unexpected positional argument: `{0}`!")]
    UnexpectedPositional(String),

    #[error("Required option `{0}` is not provided!")]
    RequiredOption(String),

    #[error("Required positional argument <{0}> is not provided!")]
    RequiredPositional(String),

    #[error("No command given!")]
    NoCommand,

    #[error("Unknown command `{0}`!")]
    UnknownCommand(String),
}

/// A token could not be converted by the value registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("Cannot parse integer from `{0}`!")]
    Int(String),

    #[error("Cannot parse float from `{0}`!")]
    Float(String),

    #[error("Cannot parse boolean from `{0}`!")]
    Bool(String),

    #[error("Cannot parse enum {name} from `{value}`!")]
    Enum { name: String, value: String },

    #[error("Cannot parse literal {allowed} from `{value}`!")]
    Literal { allowed: String, value: String },

    #[error("Unsupported type {0}!")]
    Unsupported(String),

    /// Raised by registered custom converters.
    #[error("{0}")]
    Custom(String),
}

/// Error raised while matching tokens against a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Option(#[from] OptionError),

    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Any error the crate can raise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<OptionError> for Error {
    fn from(err: OptionError) -> Self {
        Self::Parse(err.into())
    }
}

impl From<ValueError> for Error {
    fn from(err: ValueError) -> Self {
        Self::Parse(err.into())
    }
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
