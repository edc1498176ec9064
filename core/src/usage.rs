//! Plain-text usage and help rendering.
//!
//! Record parameters never appear by their own name: their composed child
//! fields are listed as options in their place.

use crate::schema::{Descriptor, Schema};
use crate::types::Value;

const HELP_ROW: (&str, &str) = ("-?|--help", "Show this help message and exit.");

#[derive(Clone, Copy, PartialEq, Eq)]
enum Category {
    Positional,
    Either,
    Option,
}

impl Category {
    fn label(self) -> &'static str {
        match self {
            Self::Positional => "(positional)",
            Self::Either => "(pos. or opt.)",
            Self::Option => "(option)",
        }
    }
}

/// Descriptors grouped the way they are shown: positional-only first, then
/// positional-or-named, then named-only (child fields included).
fn grouped(schema: &Schema) -> Vec<(Category, &Descriptor)> {
    let mut positional = Vec::new();
    let mut either = Vec::new();
    let mut options = Vec::new();
    for descriptor in schema.descriptors() {
        if let Some(child) = descriptor.child() {
            options.extend(child.options().into_iter().map(|d| (Category::Option, d)));
        } else if descriptor.is_positional() && !descriptor.is_named() {
            positional.push((Category::Positional, descriptor));
        } else if descriptor.is_positional() {
            either.push((Category::Either, descriptor));
        } else {
            options.push((Category::Option, descriptor));
        }
    }
    positional.into_iter().chain(either).chain(options).collect()
}

fn program<'a>(schema: &'a Schema, program: &'a str) -> &'a str {
    if !program.is_empty() {
        program
    } else if !schema.program_name().is_empty() {
        schema.program_name()
    } else {
        schema.name()
    }
}

fn value_placeholder(descriptor: &Descriptor) -> String {
    if descriptor.ty().is_choice() {
        descriptor.metavar().to_string()
    } else {
        format!("<{}>", descriptor.metavar())
    }
}

fn repeated(text: String) -> String {
    format!("{text} [{text} ...]")
}

fn positional_usage(descriptor: &Descriptor, label: &str) -> String {
    let text = format!("<{label}:{}>", descriptor.metavar());
    if descriptor.is_nary() { repeated(text) } else { text }
}

fn option_names(descriptor: &Descriptor, listing: bool) -> String {
    let name = descriptor.name();
    if listing {
        let mut forms = Vec::new();
        if let Some(short) = name.short {
            forms.push(format!("-{short}"));
        }
        if let Some(long) = &name.long {
            forms.push(format!("--{long}"));
        }
        return forms.join("|");
    }
    match &name.long {
        Some(long) => format!("--{long}"),
        None => format!("-{}", name.long_or_short()),
    }
}

fn item(descriptor: &Descriptor, listing: bool) -> String {
    if descriptor.is_positional() && !descriptor.is_named() {
        return positional_usage(descriptor, descriptor.param());
    }
    let names = option_names(descriptor, listing);
    if descriptor.is_flag() {
        return names;
    }
    let value = value_placeholder(descriptor);
    let value = if descriptor.is_nary() { repeated(value) } else { value };
    format!("{names} {value}")
}

fn usage_item(descriptor: &Descriptor) -> String {
    let text = item(descriptor, false);
    if descriptor.is_required() {
        text
    } else {
        format!("[{text}]")
    }
}

fn kwargs_item(kwargs: &Descriptor) -> String {
    let value = value_placeholder(kwargs);
    let value = if kwargs.is_nary() { repeated(value) } else { value };
    format!("--<key> {value}")
}

fn suffix(descriptor: &Descriptor) -> String {
    let note = if descriptor.is_flag() {
        "(flag)".to_string()
    } else if descriptor.is_required() {
        "(required)".to_string()
    } else {
        format!("(default: {})", render_default(descriptor.default()))
    };
    if descriptor.help().is_empty() {
        note
    } else {
        format!("{} {note}", descriptor.help())
    }
}

fn render_default(value: &Value) -> String {
    match value {
        Value::List(items) if items.is_empty() => "[]".to_string(),
        other => other.to_string(),
    }
}

/// Renders the `Usage:` block for `schema`.
///
/// An empty `program` falls back to the schema's program name, then to the
/// schema name.
///
/// # Examples
///
/// ```
/// use argbind_core::{usage_line, ArgSpec, Schema, TypeDescriptor};
///
/// let schema = Schema::builder("greet")
///     .arg(ArgSpec::positional("name", TypeDescriptor::string()))
///     .arg(ArgSpec::named("count", TypeDescriptor::int()).with_default(1))
///     .build()
///     .unwrap();
/// assert_eq!(
///     usage_line(&schema, "greet"),
///     "Usage:\n  greet <name:text> [--count <int>]"
/// );
/// ```
pub fn usage_line(schema: &Schema, program_name: &str) -> String {
    let mut parts = vec![program(schema, program_name).to_string()];
    for (_, descriptor) in grouped(schema) {
        parts.push(usage_item(descriptor));
    }
    if let Some(var_args) = schema.var_args() {
        if !schema.is_child() {
            parts.push(format!("[{}]", positional_usage(var_args, var_args.param())));
        }
    }
    if let Some(kwargs) = schema.var_kwargs() {
        parts.push(format!("[{}]", repeated(kwargs_item(kwargs))));
    }
    format!("Usage:\n  {}", parts.join(" "))
}

/// Renders the full help text: brief, usage and the argument listing.
pub fn help_text(schema: &Schema, program_name: &str) -> String {
    let mut out = String::new();
    if !schema.brief().is_empty() {
        out.push_str(schema.brief());
        out.push_str("\n\n");
    }
    out.push_str(&usage_line(schema, program_name));
    out.push('\n');

    let mut rows: Vec<(&str, String, String)> = grouped(schema)
        .into_iter()
        .map(|(category, d)| (category.label(), item(d, true), suffix(d)))
        .collect();
    if let Some(var_args) = schema.var_args().filter(|_| !schema.is_child()) {
        rows.push((
            Category::Positional.label(),
            positional_usage(var_args, var_args.param()),
            suffix(var_args),
        ));
    }
    if let Some(kwargs) = schema.var_kwargs() {
        rows.push((Category::Option.label(), kwargs_item(kwargs), suffix(kwargs)));
    }
    rows.push((
        Category::Option.label(),
        HELP_ROW.0.to_string(),
        HELP_ROW.1.to_string(),
    ));

    let label_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0);
    let item_width = rows.iter().map(|r| r.1.chars().count()).max().unwrap_or(0);
    out.push_str("\nwhere\n");
    for (label, item, help) in rows {
        let line = format!("  {label:<label_width$}  {item:<item_width$}  {help}");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
