//! Built schemas.
//!
//! A [`Schema`] is the immutable result of composing a list of
//! [`ArgSpec`](crate::ArgSpec) declarations: positional and named
//! descriptors, the name lookup table, the optional catch-all slots and any
//! composed child schemas. It is built once by [`SchemaBuilder::build`] and
//! can then be parsed any number of times; every parse works on its own
//! binding table, so a schema can be shared across threads.
//!
//! # Example
//!
//! ```
//! use argbind_core::{ArgSpec, Outcome, Schema, TypeDescriptor, Value};
//!
//! let schema = Schema::builder("greet")
//!     .arg(ArgSpec::positional("name", TypeDescriptor::string()))
//!     .arg(ArgSpec::named("count", TypeDescriptor::int()).with_default(1))
//!     .build()
//!     .unwrap();
//!
//! let Outcome::Bound(call) = schema.parse(["jane", "--count", "3"]).unwrap() else {
//!     panic!("help was not requested");
//! };
//! assert_eq!(call.positional, vec![Value::from("jane")]);
//! assert_eq!(call.named["count"], Value::Int(3));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::binder::{self, CallArgs};
use crate::compose::{self, ComposeOptions};
use crate::engine::{self, Step};
use crate::error::{ConfigError, ParseError};
use crate::names::ShortNames;
use crate::registry::ValueRegistry;
use crate::types::{ArgName, ArgSpec, ScalarKind, TypeDescriptor, Value};

/// One parameter of a built schema.
///
/// Descriptors are immutable; the per-parse `bound`/`value` state lives in
/// the engine's binding table, keyed by the descriptor's index.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub(crate) param: String,
    pub(crate) name: ArgName,
    /// Element type for n-ary descriptors.
    pub(crate) ty: TypeDescriptor,
    pub(crate) is_positional: bool,
    pub(crate) is_named: bool,
    pub(crate) is_nary: bool,
    pub(crate) required: bool,
    pub(crate) default: Value,
    pub(crate) help: String,
    pub(crate) metavar: String,
    pub(crate) child: Option<Box<Schema>>,
}

impl Descriptor {
    /// Declared parameter name; the key used in bound call arguments.
    pub fn param(&self) -> &str {
        &self.param
    }

    pub fn name(&self) -> &ArgName {
        &self.name
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    pub fn is_positional(&self) -> bool {
        self.is_positional
    }

    pub fn is_named(&self) -> bool {
        self.is_named
    }

    pub fn is_nary(&self) -> bool {
        self.is_nary
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default(&self) -> &Value {
        &self.default
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn metavar(&self) -> &str {
        &self.metavar
    }

    /// The composed child schema of a record parameter.
    pub fn child(&self) -> Option<&Schema> {
        self.child.as_deref()
    }

    /// A flag is a boolean option defaulting to `false`; it binds `true`
    /// and consumes no value token.
    pub fn is_flag(&self) -> bool {
        self.ty == TypeDescriptor::Scalar(ScalarKind::Bool)
            && self.default == Value::Bool(false)
            && !self.is_positional
    }

    /// Renders a bound value back into the tokens that would bind it.
    ///
    /// Named descriptors use the `--long` form (or `-s` when short-only),
    /// positional-only ones the bare values.
    pub fn render_tokens(&self, value: &Value) -> Vec<String> {
        let values: Vec<String> = match value {
            Value::List(items) if self.is_nary => items.iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        };
        if !self.is_named {
            return values;
        }

        let option = match &self.name.long {
            Some(long) if !long.is_empty() => format!("--{long}"),
            _ => format!("-{}", self.name.long_or_short()),
        };
        if self.is_flag() {
            return if value == &Value::Bool(true) {
                vec![option]
            } else {
                Vec::new()
            };
        }
        std::iter::once(option).chain(values).collect()
    }
}

/// A parse request that asked for help instead of binding values.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Every descriptor is bound.
    Bound(CallArgs),
    /// A help token (`-?`, `--help`) was seen.
    Help,
}

/// An immutable, reusable argument schema.
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) name: String,
    pub(crate) brief: String,
    pub(crate) program_name: String,
    pub(crate) descriptors: Vec<Descriptor>,
    pub(crate) positional: Vec<usize>,
    pub(crate) named: Vec<usize>,
    pub(crate) names: HashMap<String, usize>,
    pub(crate) var_args: Option<Descriptor>,
    pub(crate) var_kwargs: Option<Descriptor>,
    pub(crate) is_child: bool,
    pub(crate) registry: Arc<ValueRegistry>,
}

impl Schema {
    /// Returns a new [`SchemaBuilder`].
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub(crate) fn empty(
        name: &str,
        brief: &str,
        program_name: &str,
        is_child: bool,
        registry: Arc<ValueRegistry>,
    ) -> Self {
        Self {
            name: name.to_string(),
            brief: brief.to_string(),
            program_name: program_name.to_string(),
            descriptors: Vec::new(),
            positional: Vec::new(),
            named: Vec::new(),
            names: HashMap::new(),
            var_args: None,
            var_kwargs: None,
            is_child,
            registry,
        }
    }

    /// Adds a positional and/or named descriptor.
    pub(crate) fn add(&mut self, descriptor: Descriptor) -> Result<(), ConfigError> {
        if !descriptor.is_positional && !descriptor.is_named {
            return Err(ConfigError::NotPositionalOrNamed {
                param: descriptor.param,
            });
        }
        if descriptor.is_named && descriptor.name.is_empty() {
            return Err(ConfigError::MissingName);
        }

        let idx = self.descriptors.len();
        if descriptor.is_positional {
            self.positional.push(idx);
        }
        if descriptor.is_named {
            self.named.push(idx);
            // Record parameters are bound from their child scope, their own
            // name is not addressable.
            if descriptor.child.is_none() {
                if let Some(short) = descriptor.name.short {
                    self.names.insert(short.to_string(), idx);
                }
                if let Some(long) = &descriptor.name.long {
                    self.names.insert(long.clone(), idx);
                }
            }
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub(crate) fn set_var_args(&mut self, descriptor: Descriptor) -> Result<(), ConfigError> {
        if self.var_args.is_some() {
            return Err(ConfigError::DuplicateVarArgs);
        }
        self.var_args = Some(descriptor);
        Ok(())
    }

    pub(crate) fn set_var_kwargs(&mut self, descriptor: Descriptor) -> Result<(), ConfigError> {
        if self.var_kwargs.is_some() {
            return Err(ConfigError::DuplicateVarKwargs);
        }
        self.var_kwargs = Some(descriptor);
        Ok(())
    }

    /// Name of the declaration this schema was built from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn brief(&self) -> &str {
        &self.brief
    }

    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    pub fn registry(&self) -> &Arc<ValueRegistry> {
        &self.registry
    }

    /// All positional and named descriptors in declaration order.
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Positional descriptors in positional-matching order.
    pub fn positional(&self) -> impl Iterator<Item = &Descriptor> + '_ {
        self.positional.iter().map(|&idx| &self.descriptors[idx])
    }

    /// Named descriptors in declaration order.
    pub fn named(&self) -> impl Iterator<Item = &Descriptor> + '_ {
        self.named.iter().map(|&idx| &self.descriptors[idx])
    }

    /// Looks up a descriptor by short or long option name.
    pub fn lookup(&self, name: &str) -> Option<&Descriptor> {
        self.names.get(name).map(|&idx| &self.descriptors[idx])
    }

    pub fn var_args(&self) -> Option<&Descriptor> {
        self.var_args.as_ref()
    }

    pub fn var_kwargs(&self) -> Option<&Descriptor> {
        self.var_kwargs.as_ref()
    }

    /// Whether this schema was composed as the child of a record parameter.
    pub fn is_child(&self) -> bool {
        self.is_child
    }

    /// Every addressable option of this schema and its composed children,
    /// in declaration order. Record parameters are replaced by their fields.
    pub fn options(&self) -> Vec<&Descriptor> {
        let mut out = Vec::new();
        self.collect_options(&mut out);
        out
    }

    fn collect_options<'a>(&'a self, out: &mut Vec<&'a Descriptor>) {
        for descriptor in &self.descriptors {
            match &descriptor.child {
                Some(child) => child.collect_options(out),
                None if descriptor.is_named => out.push(descriptor),
                None => {}
            }
        }
    }

    /// Binds `tokens` against this schema.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Option`] for structural problems in the token
    /// stream and [`ParseError::Value`] when a token cannot be converted.
    pub fn parse<I, S>(&self, tokens: I) -> Result<Outcome, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(|t| t.as_ref().to_string()).collect();
        match engine::bind_tokens(self, tokens)? {
            Step::Help => Ok(Outcome::Help),
            Step::Bound(bindings) => Ok(Outcome::Bound(binder::assemble(self, bindings))),
        }
    }
}

/// Builder for [`Schema`].
///
/// # Examples
///
/// ```
/// use argbind_core::{ArgSpec, RecordSpec, Schema, TypeDescriptor};
///
/// let config = RecordSpec::new("Config")
///     .with_field(ArgSpec::named("sides", TypeDescriptor::int()).with_default(6));
///
/// let schema = Schema::builder("throw_dice")
///     .brief("Throw dice.")
///     .arg(ArgSpec::positional_or_named("cfg", TypeDescriptor::record(config)))
///     .arg(ArgSpec::positional_or_named("count", TypeDescriptor::int()).with_default(1))
///     .recurse(true)
///     .build()
///     .unwrap();
///
/// assert!(schema.lookup("sides").is_none()); // lives in the child schema
/// assert_eq!(schema.options().len(), 2); // --sides and --count
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    name: String,
    brief: String,
    program_name: String,
    args: Vec<ArgSpec>,
    recurse: bool,
    kw_only: bool,
    registry: Option<Arc<ValueRegistry>>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn brief(mut self, brief: &str) -> Self {
        self.brief = brief.to_string();
        self
    }

    pub fn program_name(mut self, program_name: &str) -> Self {
        self.program_name = program_name.to_string();
        self
    }

    pub fn arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = ArgSpec>) -> Self {
        self.args.extend(args);
        self
    }

    /// Composes record-typed parameters into child schemas instead of
    /// rejecting them.
    pub fn recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    /// Makes every parameter named-only.
    pub fn kw_only(mut self, kw_only: bool) -> Self {
        self.kw_only = kw_only;
        self
    }

    pub fn registry(mut self, registry: Arc<ValueRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validates the declarations and composes the schema.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for reserved or colliding names, invalid
    /// recursion targets, unsupported types and duplicate catch-alls.
    pub fn build(self) -> Result<Schema, ConfigError> {
        let registry = self.registry.unwrap_or_default();
        let options = ComposeOptions {
            recurse: self.recurse,
            kw_only: self.kw_only,
            is_child: false,
        };
        let (schema, claimed) = compose::compose(
            &self.name,
            &self.brief,
            &self.program_name,
            &self.args,
            options,
            ShortNames::new(),
            &registry,
        )?;
        tracing::debug!(schema = %self.name, short_names = claimed.len(), "Built schema");
        Ok(schema)
    }
}
