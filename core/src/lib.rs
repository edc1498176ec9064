//! Argument-binding engine.
//!
//! This crate turns a flat list of command-line tokens into the positional
//! and named arguments of a declared target:
//!
//! - [`ArgSpec`] / [`TypeDescriptor`] / [`RecordSpec`]: declarations, as
//!   produced by a derivation adapter (builder calls, declaration files).
//! - [`SchemaBuilder`]: validates declarations, resolves short names across
//!   the whole flattened namespace and composes record parameters into child
//!   schemas.
//! - [`Schema::parse`]: matches tokens against a built schema and assembles
//!   [`CallArgs`].
//! - [`CommandSet`]: dispatches on a leading command token.
//! - [`Driver`] / [`start`]: the exit contract: help, caught errors with
//!   usage, or the call arguments.
//! - [`ValueRegistry`]: string-to-value converters, extensible at runtime.
//!
//! # Example
//!
//! ```
//! use argbind_core::*;
//!
//! let config = RecordSpec::new("Config")
//!     .with_field(ArgSpec::named("sides", TypeDescriptor::int()).with_default(6))
//!     .with_field(
//!         ArgSpec::named("kind", TypeDescriptor::literal(["single", "pair"]))
//!             .with_default("single"),
//!     );
//! let schema = Schema::builder("throw_dice")
//!     .arg(ArgSpec::positional_or_named("cfg", TypeDescriptor::record(config)))
//!     .arg(ArgSpec::positional_or_named("count", TypeDescriptor::int()).with_default(1))
//!     .recurse(true)
//!     .build()
//!     .unwrap();
//!
//! let Outcome::Bound(call) = schema.parse(["--sides", "20", "-c", "2"]).unwrap() else {
//!     unreachable!()
//! };
//! let cfg = call.get("cfg").and_then(Value::as_record).unwrap();
//! assert_eq!(cfg["sides"], Value::Int(20));
//! assert_eq!(cfg["kind"], Value::from("single"));
//! assert_eq!(call.get("count"), Some(&Value::Int(2)));
//! ```

mod binder;
mod commands;
mod compose;
mod driver;
mod engine;
mod error;
mod names;
mod registry;
mod schema;
mod types;
mod usage;

pub use binder::CallArgs;
pub use commands::{CommandOutcome, CommandSet};
pub use driver::{CommandDriver, Driver, ErrorMode, Invocation, start};
pub use error::{ConfigError, Error, OptionError, ParseError, Result, ValueError};
pub use names::ShortNames;
pub use registry::{Converter, ValueRegistry};
pub use schema::{Descriptor, Outcome, Schema, SchemaBuilder};
pub use types::*;
pub use usage::{help_text, usage_line};
