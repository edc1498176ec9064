//! Type expressions used in declaration files.
//!
//! ```text
//! str | int | float | bool | path | <custom> | <Enum> | <Record>
//! list[T] | optional[T] | T? | literal[a|b|...]
//! ```

use std::fmt;

/// Parsed, not yet resolved, type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Name(String),
    List(Box<TypeExpr>),
    Optional(Box<TypeExpr>),
    Literal(Vec<String>),
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::List(inner) => write!(f, "list[{inner}]"),
            Self::Optional(inner) => write!(f, "optional[{inner}]"),
            Self::Literal(values) => write!(f, "literal[{}]", values.join("|")),
        }
    }
}

/// Parses a type expression.
///
/// # Errors
///
/// Returns a short reason when the expression is malformed.
///
/// # Examples
///
/// ```
/// use argbind_decl::{parse_type_expr, TypeExpr};
///
/// assert_eq!(
///     parse_type_expr("list[int]?").unwrap(),
///     TypeExpr::Optional(Box::new(TypeExpr::List(Box::new(TypeExpr::Name("int".into())))))
/// );
/// assert!(parse_type_expr("list[int").is_err());
/// ```
pub fn parse_type_expr(expr: &str) -> Result<TypeExpr, String> {
    let expr = expr.trim();
    if let Some(inner) = expr.strip_suffix('?') {
        return Ok(TypeExpr::Optional(Box::new(parse_type_expr(inner)?)));
    }
    if let Some(inner) = wrapped(expr, "list")? {
        return Ok(TypeExpr::List(Box::new(parse_type_expr(inner)?)));
    }
    if let Some(inner) = wrapped(expr, "optional")? {
        return Ok(TypeExpr::Optional(Box::new(parse_type_expr(inner)?)));
    }
    if let Some(inner) = wrapped(expr, "literal")? {
        let values: Vec<String> = inner.split('|').map(|v| v.trim().to_string()).collect();
        if values.iter().any(String::is_empty) {
            return Err("empty literal value".to_string());
        }
        return Ok(TypeExpr::Literal(values));
    }

    let valid = expr
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && expr
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(TypeExpr::Name(expr.to_string()))
    } else {
        Err("not a type name".to_string())
    }
}

/// Returns the inside of `head[...]`, or `None` if `expr` is not of that form.
fn wrapped<'a>(expr: &'a str, head: &str) -> Result<Option<&'a str>, String> {
    let Some(rest) = expr.strip_prefix(head).and_then(|r| r.strip_prefix('[')) else {
        return Ok(None);
    };
    match rest.strip_suffix(']') {
        Some(inner) if !inner.trim().is_empty() => Ok(Some(inner)),
        Some(_) => Err(format!("`{head}[...]` needs an argument")),
        None => Err(format!("unclosed `{head}[`")),
    }
}
