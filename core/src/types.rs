//! Declaration-side data model.
//!
//! These types describe *what* a parameter looks like before any schema is
//! built: its value shape ([`TypeDescriptor`]), how it may be supplied
//! ([`ParamKind`]) and its default. They are produced by a derivation
//! adapter (a builder call, a declaration file, ...) and consumed by
//! [`SchemaBuilder`](crate::SchemaBuilder). Values produced by binding are
//! represented by [`Value`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Scalar kinds the value registry knows how to convert.
///
/// # Examples
///
/// ```
/// use argbind_core::ScalarKind;
///
/// assert_eq!(ScalarKind::Int.to_string(), "int");
/// assert_eq!(ScalarKind::Custom("ip".into()).to_string(), "ip");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    /// Plain text, taken verbatim.
    String,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// Boolean (`true`/`false`, `yes`/`no`, ...).
    Bool,
    /// Filesystem path.
    Path,
    /// A kind whose converter is registered at runtime.
    Custom(String),
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("str"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Bool => f.write_str("bool"),
            Self::Path => f.write_str("path"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// Shape of a parameter's value.
///
/// The engine only ever branches on this closed set of variants.
///
/// # Examples
///
/// ```
/// use argbind_core::TypeDescriptor;
///
/// let numbers = TypeDescriptor::sequence(TypeDescriptor::int());
/// assert_eq!(numbers.to_string(), "list[int]");
/// assert_eq!(numbers.nary_element(), Some(&TypeDescriptor::int()));
///
/// let maybe = TypeDescriptor::optional(TypeDescriptor::string());
/// assert_eq!(maybe.strip_optional(), &TypeDescriptor::string());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDescriptor {
    /// A single scalar value.
    Scalar(ScalarKind),
    /// A named enumeration; tokens must equal one of the member values.
    Enumerated { name: String, members: Vec<String> },
    /// A set of allowed literal strings.
    LiteralSet(Vec<String>),
    /// A value that may also be absent.
    Optional(Box<TypeDescriptor>),
    /// A sequence of values; parameters of this type are n-ary.
    SequenceOf(Box<TypeDescriptor>),
    /// A structured record whose fields can be flattened into the parent.
    Record(RecordSpec),
}

impl TypeDescriptor {
    pub fn string() -> Self {
        Self::Scalar(ScalarKind::String)
    }

    pub fn int() -> Self {
        Self::Scalar(ScalarKind::Int)
    }

    pub fn float() -> Self {
        Self::Scalar(ScalarKind::Float)
    }

    pub fn boolean() -> Self {
        Self::Scalar(ScalarKind::Bool)
    }

    pub fn path() -> Self {
        Self::Scalar(ScalarKind::Path)
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self::Scalar(ScalarKind::Custom(name.into()))
    }

    pub fn enumerated<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enumerated {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn literal<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::LiteralSet(allowed.into_iter().map(Into::into).collect())
    }

    pub fn optional(inner: TypeDescriptor) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn sequence(inner: TypeDescriptor) -> Self {
        Self::SequenceOf(Box::new(inner))
    }

    pub fn record(spec: RecordSpec) -> Self {
        Self::Record(spec)
    }

    /// Strips any number of `Optional` wrappers.
    pub fn strip_optional(&self) -> &TypeDescriptor {
        match self {
            Self::Optional(inner) => inner.strip_optional(),
            other => other,
        }
    }

    /// Returns the element type if this is a sequence.
    pub fn nary_element(&self) -> Option<&TypeDescriptor> {
        match self {
            Self::SequenceOf(inner) => Some(inner),
            _ => None,
        }
    }

    /// Returns the record spec if this type resolves to a record.
    pub fn as_record(&self) -> Option<&RecordSpec> {
        match self.strip_optional() {
            Self::Record(spec) => Some(spec),
            _ => None,
        }
    }

    /// Whether tokens for this type are restricted to a fixed set of choices.
    pub fn is_choice(&self) -> bool {
        matches!(
            self.strip_optional(),
            Self::Enumerated { .. } | Self::LiteralSet(_)
        )
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::Enumerated { name, .. } => f.write_str(name),
            Self::LiteralSet(allowed) => write!(f, "literal[{}]", allowed.join("|")),
            Self::Optional(inner) => write!(f, "optional[{inner}]"),
            Self::SequenceOf(inner) => write!(f, "list[{inner}]"),
            Self::Record(spec) => f.write_str(&spec.name),
        }
    }
}

/// A structured record: a named group of fields that can be composed into
/// a parent schema as a child schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordSpec {
    /// Record type name, used in configuration error messages.
    pub name: String,
    /// Short description for help output.
    #[serde(default)]
    pub brief: String,
    /// Fields in declaration order.
    pub fields: Vec<ArgSpec>,
}

impl RecordSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Adds a field.
    pub fn with_field(mut self, field: ArgSpec) -> Self {
        self.fields.push(field);
        self
    }
}

/// How a parameter may be supplied on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// Only by position.
    PositionalOnly,
    /// Only by `--name` / `-n`.
    NamedOnly,
    /// Either by position or by name (the default).
    #[default]
    PositionalOrNamed,
    /// Catch-all for unrecognized positional tokens.
    VarArgs,
    /// Catch-all for unrecognized named tokens.
    VarKwargs,
}

impl ParamKind {
    pub fn is_variadic(self) -> bool {
        matches!(self, Self::VarArgs | Self::VarKwargs)
    }

    /// Whether a parameter of this kind is addressable by name, taking the
    /// schema-wide keyword-only switch into account.
    pub fn is_keyword(self, kw_only: bool) -> bool {
        match self {
            Self::NamedOnly | Self::PositionalOrNamed => true,
            Self::PositionalOnly => kw_only,
            Self::VarArgs | Self::VarKwargs => false,
        }
    }

    pub fn is_positional(self, kw_only: bool) -> bool {
        !kw_only && matches!(self, Self::PositionalOnly | Self::PositionalOrNamed)
    }
}

/// One declared parameter, as handed over by a derivation adapter.
///
/// A parameter without a default is required.
///
/// # Examples
///
/// ```
/// use argbind_core::{ArgSpec, ParamKind, TypeDescriptor, Value};
///
/// let count = ArgSpec::named("count", TypeDescriptor::int())
///     .with_default(1)
///     .with_help("How many times to greet.")
///     .with_short('k');
/// assert_eq!(count.kind, ParamKind::NamedOnly);
/// assert_eq!(count.default, Some(Value::Int(1)));
/// assert!(!count.is_required());
///
/// let name = ArgSpec::positional("name", TypeDescriptor::string());
/// assert!(name.is_required());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgSpec {
    /// Parameter name as declared (underscores allowed; options use the
    /// kebab-cased form).
    pub name: String,
    /// Value shape. For n-ary parameters this is `SequenceOf(element)`; for
    /// var-args it is the element type itself.
    pub ty: TypeDescriptor,
    #[serde(default)]
    pub kind: ParamKind,
    /// Default value; `None` means the parameter is required.
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub help: String,
    /// Explicit short-name hint.
    #[serde(default)]
    pub short_hint: Option<char>,
}

impl ArgSpec {
    pub fn new(name: impl Into<String>, kind: ParamKind, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            kind,
            default: None,
            help: String::new(),
            short_hint: None,
        }
    }

    pub fn positional(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self::new(name, ParamKind::PositionalOnly, ty)
    }

    pub fn named(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self::new(name, ParamKind::NamedOnly, ty)
    }

    pub fn positional_or_named(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self::new(name, ParamKind::PositionalOrNamed, ty)
    }

    /// Declares the catch-all for unrecognized positional tokens; `element`
    /// is the type each captured token converts to.
    pub fn var_args(name: impl Into<String>, element: TypeDescriptor) -> Self {
        Self::new(name, ParamKind::VarArgs, element).with_default(Value::List(Vec::new()))
    }

    /// Declares the catch-all for unrecognized options. A `SequenceOf` type
    /// lets captured options take several values and repeat.
    pub fn var_kwargs(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self::new(name, ParamKind::VarKwargs, ty).with_default(Value::None)
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Marks the parameter as required by clearing its default.
    pub fn required(mut self) -> Self {
        self.default = None;
        self
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = help.to_string();
        self
    }

    pub fn with_short(mut self, short: char) -> Self {
        self.short_hint = Some(short);
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Kebab-cased form used for option names.
    pub fn option_name(&self) -> String {
        self.name.replace('_', "-")
    }
}

/// Short and long names of a bound parameter.
///
/// A single-letter parameter name becomes a short-only name. Catch-all slots
/// have neither.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArgName {
    pub short: Option<char>,
    pub long: Option<String>,
}

impl ArgName {
    pub fn long(long: impl Into<String>) -> Self {
        Self {
            short: None,
            long: Some(long.into()),
        }
    }

    pub fn short(short: char) -> Self {
        Self {
            short: Some(short),
            long: None,
        }
    }

    pub fn both(short: char, long: impl Into<String>) -> Self {
        Self {
            short: Some(short),
            long: Some(long.into()),
        }
    }

    /// Long name if present, otherwise the short name.
    pub fn long_or_short(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) if !long.is_empty() => long.clone(),
            (_, Some(short)) => short.to_string(),
            _ => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.long_or_short().is_empty()
    }
}

impl fmt::Display for ArgName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.long_or_short())
    }
}

/// A bound value.
///
/// Serializes without tags, so `Value::Int(3)` is `3` in JSON and
/// `Value::None` is `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Path(PathBuf),
    List(Vec<Value>),
    /// Composite value of a record parameter: field name to value.
    Record(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Record(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Self::Record(fields) => {
                let parts: Vec<String> = fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<PathBuf> for Value {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}
