//! Value conversion registry.
//!
//! Maps scalar kinds to `&str -> Value` converters. Built-in kinds are
//! always present; custom kinds become parsable once registered:
//!
//! ```
//! use argbind_core::{ScalarKind, TypeDescriptor, Value, ValueError, ValueRegistry};
//!
//! let mut registry = ValueRegistry::default();
//! let percent = ScalarKind::Custom("percent".into());
//! assert!(!registry.is_parsable(&TypeDescriptor::Scalar(percent.clone())));
//!
//! registry.register(percent.clone(), |raw| {
//!     raw.strip_suffix('%')
//!         .and_then(|n| n.parse::<i64>().ok())
//!         .map(Value::Int)
//!         .ok_or_else(|| ValueError::Custom(format!("Cannot parse percent from `{raw}`!")))
//! });
//! registry.register_metavar(percent.clone(), "pct");
//!
//! let ty = TypeDescriptor::Scalar(percent);
//! assert_eq!(registry.convert(&ty, "40%").unwrap(), Value::Int(40));
//! assert_eq!(registry.metavar(&ty), "pct");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ValueError;
use crate::types::{ScalarKind, TypeDescriptor, Value};

/// A string-to-value conversion function.
pub type Converter = Arc<dyn Fn(&str) -> Result<Value, ValueError> + Send + Sync>;

/// Registry of scalar converters and their help metavars.
#[derive(Clone)]
pub struct ValueRegistry {
    converters: HashMap<ScalarKind, Converter>,
    metavars: HashMap<ScalarKind, String>,
}

impl Default for ValueRegistry {
    fn default() -> Self {
        let mut registry = Self {
            converters: HashMap::new(),
            metavars: HashMap::new(),
        };
        registry.register(ScalarKind::String, |raw| Ok(Value::Str(raw.to_string())));
        registry.register(ScalarKind::Int, to_int);
        registry.register(ScalarKind::Float, to_float);
        registry.register(ScalarKind::Bool, to_bool);
        registry.register(ScalarKind::Path, |raw| Ok(Value::Path(PathBuf::from(raw))));

        registry.register_metavar(ScalarKind::String, "text");
        registry.register_metavar(ScalarKind::Int, "int");
        registry.register_metavar(ScalarKind::Float, "float");
        registry.register_metavar(ScalarKind::Bool, "true|false");
        registry.register_metavar(ScalarKind::Path, "path");
        registry
    }
}

impl fmt::Debug for ValueRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<String> = self.converters.keys().map(ToString::to_string).collect();
        kinds.sort();
        f.debug_struct("ValueRegistry")
            .field("kinds", &kinds)
            .field("metavars", &self.metavars)
            .finish()
    }
}

impl ValueRegistry {
    /// Registers (or replaces) the converter for a scalar kind.
    pub fn register<F>(&mut self, kind: ScalarKind, converter: F)
    where
        F: Fn(&str) -> Result<Value, ValueError> + Send + Sync + 'static,
    {
        self.converters.insert(kind, Arc::new(converter));
    }

    /// Sets the metavar shown in help output for a scalar kind.
    pub fn register_metavar(&mut self, kind: ScalarKind, metavar: &str) {
        self.metavars.insert(kind, metavar.to_string());
    }

    /// Whether the engine can convert a token into this type.
    ///
    /// Sequences and records are not parsable: sequences are unwrapped into
    /// n-ary parameters before this check, records are composed.
    pub fn is_parsable(&self, ty: &TypeDescriptor) -> bool {
        match ty {
            TypeDescriptor::Scalar(kind) => self.converters.contains_key(kind),
            TypeDescriptor::Enumerated { .. } | TypeDescriptor::LiteralSet(_) => true,
            TypeDescriptor::Optional(inner) => self.is_parsable(inner),
            TypeDescriptor::SequenceOf(_) | TypeDescriptor::Record(_) => false,
        }
    }

    /// Converts one token.
    pub fn convert(&self, ty: &TypeDescriptor, raw: &str) -> Result<Value, ValueError> {
        match ty {
            TypeDescriptor::Scalar(kind) => match self.converters.get(kind) {
                Some(converter) => converter(raw),
                None => Err(ValueError::Unsupported(kind.to_string())),
            },
            TypeDescriptor::Enumerated { name, members } => {
                if members.iter().any(|m| m == raw) {
                    Ok(Value::Str(raw.to_string()))
                } else {
                    Err(ValueError::Enum {
                        name: name.clone(),
                        value: raw.to_string(),
                    })
                }
            }
            TypeDescriptor::LiteralSet(allowed) => {
                if allowed.iter().any(|a| a == raw) {
                    Ok(Value::Str(raw.to_string()))
                } else {
                    Err(ValueError::Literal {
                        allowed: allowed.join("|"),
                        value: raw.to_string(),
                    })
                }
            }
            TypeDescriptor::Optional(inner) => self.convert(inner, raw),
            other => Err(ValueError::Unsupported(other.to_string())),
        }
    }

    /// Placeholder text for a value of this type in help output.
    pub fn metavar(&self, ty: &TypeDescriptor) -> String {
        match ty.strip_optional() {
            TypeDescriptor::Scalar(kind) => self
                .metavars
                .get(kind)
                .cloned()
                .unwrap_or_else(|| "val".to_string()),
            TypeDescriptor::Enumerated { members, .. } => members.join("|"),
            TypeDescriptor::LiteralSet(allowed) => allowed.join("|"),
            _ => "val".to_string(),
        }
    }
}

fn to_int(raw: &str) -> Result<Value, ValueError> {
    raw.trim()
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|_| ValueError::Int(raw.to_string()))
}

fn to_float(raw: &str) -> Result<Value, ValueError> {
    raw.trim()
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|_| ValueError::Float(raw.to_string()))
}

fn to_bool(raw: &str) -> Result<Value, ValueError> {
    match raw.to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
        "false" | "f" | "no" | "n" | "0" => Ok(Value::Bool(false)),
        _ => Err(ValueError::Bool(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_conversions() {
        let registry = ValueRegistry::default();
        assert_eq!(
            registry.convert(&TypeDescriptor::int(), "42").unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            registry.convert(&TypeDescriptor::float(), "0.5").unwrap(),
            Value::Float(0.5)
        );
        assert_eq!(
            registry.convert(&TypeDescriptor::boolean(), "Yes").unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            registry.convert(&TypeDescriptor::path(), "/tmp/x").unwrap(),
            Value::Path(PathBuf::from("/tmp/x"))
        );
        assert_eq!(
            registry
                .convert(&TypeDescriptor::optional(TypeDescriptor::int()), "7")
                .unwrap(),
            Value::Int(7)
        );
    }

    #[test]
    fn test_conversion_errors() {
        let registry = ValueRegistry::default();
        assert_eq!(
            registry.convert(&TypeDescriptor::int(), "abc").unwrap_err(),
            ValueError::Int("abc".into())
        );
        assert_eq!(
            registry
                .convert(&TypeDescriptor::boolean(), "maybe")
                .unwrap_err()
                .to_string(),
            "Cannot parse boolean from `maybe`!"
        );
        let color = TypeDescriptor::enumerated("Color", ["red", "green"]);
        assert_eq!(
            registry.convert(&color, "blue").unwrap_err().to_string(),
            "Cannot parse enum Color from `blue`!"
        );
        let kind = TypeDescriptor::literal(["single", "pair"]);
        assert_eq!(
            registry.convert(&kind, "pair").unwrap(),
            Value::Str("pair".into())
        );
        assert!(registry.convert(&kind, "triple").is_err());
    }

    #[test]
    fn test_is_parsable() {
        let registry = ValueRegistry::default();
        assert!(registry.is_parsable(&TypeDescriptor::optional(TypeDescriptor::path())));
        assert!(!registry.is_parsable(&TypeDescriptor::sequence(TypeDescriptor::int())));
        assert!(!registry.is_parsable(&TypeDescriptor::custom("ip")));
    }

    #[test]
    fn test_metavars() {
        let registry = ValueRegistry::default();
        assert_eq!(registry.metavar(&TypeDescriptor::string()), "text");
        assert_eq!(registry.metavar(&TypeDescriptor::boolean()), "true|false");
        assert_eq!(
            registry.metavar(&TypeDescriptor::literal(["a", "b"])),
            "a|b"
        );
        assert_eq!(registry.metavar(&TypeDescriptor::custom("ip")), "val");
    }
}
