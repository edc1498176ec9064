//! Declaration files for argbind schemas.
//!
//! A declaration describes a target's parameters (names, kinds, type
//! expressions, defaults) together with its record and enum types, in JSON
//! or YAML. The `doc` text of a declaration or record supplies the help
//! brief and per-parameter help, including short-name hints written as
//! `name [k]: description`.
//!
//! # Example
//!
//! ```
//! use argbind_core::{Outcome, Value};
//! use argbind_decl::{Format, Loaded, Loader};
//!
//! let yaml = "\
//! name: greet
//! doc: |
//!   Greet someone.
//!
//!   Args:
//!     name: Who to greet.
//!     count [k]: How often.
//! params:
//!   - { name: name }
//!   - { name: count, type: int, default: 1 }
//! ";
//! let Loaded::Schema(schema) = Loader::new().load_str(yaml, Format::Yaml).unwrap() else {
//!     unreachable!()
//! };
//! let Outcome::Bound(call) = schema.parse(["Ann", "-k", "3"]).unwrap() else {
//!     unreachable!()
//! };
//! assert_eq!(call.get("count"), Some(&Value::Int(3)));
//! ```

mod declaration;
mod docstr;
mod error;
mod loader;
mod typeexpr;

pub use declaration::{CommandSetDecl, Declaration, ParamDecl, RecordDecl, Variadic};
pub use docstr::{DocComment, DocKind, ParamHelp, parse_doc};
pub use error::{DeclError, Result};
pub use loader::{DeclFile, Format, Loaded, Loader};
pub use typeexpr::{TypeExpr, parse_type_expr};
