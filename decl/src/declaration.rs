//! Declaration file model and its translation into schema builders.
//!
//! # Example YAML
//!
//! ```yaml
//! name: throw-dice
//! doc: |
//!   Throw dice according to the configuration.
//!
//!   Args:
//!     cfg: The configuration for the dice.
//!     count [k]: The number of dice to throw.
//! recurse: true
//! params:
//!   - { name: cfg, type: Config }
//!   - { name: count, type: int, default: 1 }
//! records:
//!   Config:
//!     doc: |
//!       Attributes:
//!         sides: The number of sides on the dice.
//!     fields:
//!       - { name: sides, type: int, default: 6 }
//!       - { name: kind, type: "literal[single|pair]", default: single }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use argbind_core::{
    ArgSpec, CommandSet, ConfigError, ParamKind, RecordSpec, Schema, SchemaBuilder, ScalarKind,
    TypeDescriptor, Value, ValueError, ValueRegistry,
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::docstr::{DocComment, DocKind, parse_doc};
use crate::error::{DeclError, Result};
use crate::typeexpr::{TypeExpr, parse_type_expr};

/// Which catch-all a variadic parameter is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variadic {
    /// Unrecognized positional tokens.
    Args,
    /// Unrecognized options.
    Kwargs,
}

fn default_type() -> String {
    "str".to_string()
}

fn yes() -> bool {
    true
}

fn is_true(b: &bool) -> bool {
    *b
}

/// An explicit `default: null` is a `None` default, not a missing one.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamDecl {
    pub name: String,
    #[serde(rename = "type", default = "default_type")]
    pub ty: String,
    #[serde(default = "yes", skip_serializing_if = "is_true")]
    pub positional: bool,
    #[serde(default = "yes", skip_serializing_if = "is_true")]
    pub named: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variadic: Option<Variadic>,
    /// Absent means required.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
}

impl ParamDecl {
    fn kind(&self) -> std::result::Result<ParamKind, ConfigError> {
        match (self.variadic, self.positional, self.named) {
            (Some(Variadic::Args), ..) => Ok(ParamKind::VarArgs),
            (Some(Variadic::Kwargs), ..) => Ok(ParamKind::VarKwargs),
            (None, true, true) => Ok(ParamKind::PositionalOrNamed),
            (None, true, false) => Ok(ParamKind::PositionalOnly),
            (None, false, true) => Ok(ParamKind::NamedOnly),
            (None, false, false) => Err(ConfigError::NotPositionalOrNamed {
                param: self.name.clone(),
            }),
        }
    }
}

/// A record type usable as a parameter type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordDecl {
    #[serde(default)]
    pub doc: String,
    pub fields: Vec<ParamDecl>,
}

/// A declared target: the input of one schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declaration {
    pub name: String,
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub recurse: bool,
    #[serde(default)]
    pub kw_only: bool,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub records: BTreeMap<String, RecordDecl>,
    #[serde(default)]
    pub enums: BTreeMap<String, Vec<String>>,
}

impl Declaration {
    /// Resolves types, defaults and doc hints into a [`SchemaBuilder`].
    ///
    /// # Errors
    ///
    /// Returns [`DeclError`] for malformed or unknown types, recursive
    /// records, unconvertible defaults and parameters that are neither
    /// positional nor named.
    pub fn to_builder(&self, registry: Arc<ValueRegistry>) -> Result<SchemaBuilder> {
        let doc = parse_doc(&self.doc, DocKind::Function);
        let mut resolver = Resolver {
            decl: self,
            registry: &registry,
            stack: Vec::new(),
        };
        let args = resolver.params(&self.params, &doc)?;
        debug!(declaration = %self.name, params = args.len(), "Resolved declaration");

        Ok(SchemaBuilder::new(self.name.as_str())
            .brief(&doc.brief)
            .program_name(&self.name)
            .args(args)
            .recurse(self.recurse)
            .kw_only(self.kw_only)
            .registry(registry))
    }

    /// Builds the schema.
    ///
    /// # Errors
    ///
    /// Everything [`to_builder`](Self::to_builder) raises, plus
    /// [`DeclError::Config`] when the schema itself is invalid.
    pub fn build(&self, registry: Arc<ValueRegistry>) -> Result<Schema> {
        Ok(self.to_builder(registry)?.build()?)
    }
}

/// A file holding several commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSetDecl {
    #[serde(default)]
    pub brief: String,
    pub commands: Vec<Declaration>,
}

impl CommandSetDecl {
    /// Builds every command, in file order.
    ///
    /// # Errors
    ///
    /// The first declaration error, or [`ConfigError::DuplicateCommand`].
    pub fn build(&self, registry: Arc<ValueRegistry>) -> Result<CommandSet> {
        let mut commands = CommandSet::new(&self.brief);
        for decl in &self.commands {
            commands.add(&decl.name, decl.build(Arc::clone(&registry))?)?;
        }
        Ok(commands)
    }
}

struct Resolver<'a> {
    decl: &'a Declaration,
    registry: &'a ValueRegistry,
    /// Records being resolved, innermost last.
    stack: Vec<String>,
}

impl Resolver<'_> {
    fn params(&mut self, params: &[ParamDecl], doc: &DocComment) -> Result<Vec<ArgSpec>> {
        params.iter().map(|p| self.param(p, doc)).collect()
    }

    fn param(&mut self, param: &ParamDecl, doc: &DocComment) -> Result<ArgSpec> {
        let kind = param.kind()?;
        let expr = parse_type_expr(&param.ty).map_err(|reason| DeclError::InvalidType {
            expr: param.ty.clone(),
            param: param.name.clone(),
            reason,
        })?;
        let mut ty = self.resolve(&expr, &param.name)?;
        if kind == ParamKind::VarKwargs && ty.nary_element().is_none() {
            // Captured options may take several values and repeat.
            ty = TypeDescriptor::sequence(ty);
        }

        let mut spec = ArgSpec::new(param.name.as_str(), kind, ty);
        spec.default = match &param.default {
            Some(value) => Some(self.coerce_default(&spec.ty, value.clone(), &param.name)?),
            None => match kind {
                ParamKind::VarArgs => Some(Value::List(Vec::new())),
                ParamKind::VarKwargs => Some(Value::None),
                _ => None,
            },
        };

        let hint = doc.params.get(&param.name);
        spec.help = param
            .help
            .clone()
            .or_else(|| hint.map(|h| h.desc.clone()))
            .unwrap_or_default();
        spec.short_hint = param.short.or_else(|| hint.and_then(|h| h.short));
        Ok(spec)
    }

    fn resolve(&mut self, expr: &TypeExpr, param: &str) -> Result<TypeDescriptor> {
        Ok(match expr {
            TypeExpr::List(inner) => TypeDescriptor::sequence(self.resolve(inner, param)?),
            TypeExpr::Optional(inner) => TypeDescriptor::optional(self.resolve(inner, param)?),
            TypeExpr::Literal(values) => TypeDescriptor::literal(values.iter().cloned()),
            TypeExpr::Name(name) => match name.as_str() {
                "str" | "string" => TypeDescriptor::string(),
                "int" => TypeDescriptor::int(),
                "float" => TypeDescriptor::float(),
                "bool" => TypeDescriptor::boolean(),
                "path" => TypeDescriptor::path(),
                _ => self.named_type(name, param)?,
            },
        })
    }

    fn named_type(&mut self, name: &str, param: &str) -> Result<TypeDescriptor> {
        if let Some(members) = self.decl.enums.get(name) {
            return Ok(TypeDescriptor::enumerated(name, members.iter().cloned()));
        }
        if let Some(record) = self.decl.records.get(name) {
            if self.stack.iter().any(|r| r == name) {
                return Err(DeclError::RecursiveRecord(name.to_string()));
            }
            self.stack.push(name.to_string());
            let doc = parse_doc(&record.doc, DocKind::Record);
            let fields = self.params(&record.fields, &doc)?;
            self.stack.pop();
            return Ok(TypeDescriptor::record(RecordSpec {
                name: name.to_string(),
                brief: doc.brief,
                fields,
            }));
        }
        let custom = TypeDescriptor::custom(name);
        if self.registry.is_parsable(&custom) {
            return Ok(custom);
        }
        Err(DeclError::UnknownType {
            name: name.to_string(),
            param: param.to_string(),
        })
    }

    fn coerce_default(&self, ty: &TypeDescriptor, value: Value, param: &str) -> Result<Value> {
        coerce(self.registry, ty, value).map_err(|err| DeclError::InvalidDefault {
            param: param.to_string(),
            reason: err.to_string(),
        })
    }
}

/// Converts string defaults through the registry so that, e.g., a `path`
/// default becomes a path value and enum defaults are checked.
fn coerce(registry: &ValueRegistry, ty: &TypeDescriptor, value: Value) -> std::result::Result<Value, ValueError> {
    let target = ty.strip_optional();
    match (target, value) {
        (_, Value::None) => Ok(Value::None),
        (TypeDescriptor::SequenceOf(inner), Value::List(items)) => items
            .into_iter()
            .map(|item| coerce(registry, inner, item))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::List),
        (TypeDescriptor::Scalar(ScalarKind::String), Value::Str(s)) => Ok(Value::Str(s)),
        (TypeDescriptor::Scalar(ScalarKind::Float), Value::Int(n)) => Ok(Value::Float(n as f64)),
        (TypeDescriptor::SequenceOf(_) | TypeDescriptor::Record(_), other) => Ok(other),
        (_, Value::Str(s)) => registry.convert(target, &s),
        (_, other) => Ok(other),
    }
}
