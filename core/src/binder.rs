//! Call assembly.
//!
//! Turns a completed binding table into the arguments of the target call:
//! positional values in declaration order followed by var-args, and a map of
//! named-only values with var-kwargs captures folded in last.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::engine::Bindings;
use crate::schema::Schema;
use crate::types::Value;

/// Arguments for invoking the target of a schema.
///
/// # Examples
///
/// ```
/// use argbind_core::{ArgSpec, Outcome, Schema, TypeDescriptor, Value};
///
/// let schema = Schema::builder("copy")
///     .arg(ArgSpec::positional("src", TypeDescriptor::path()))
///     .arg(ArgSpec::var_args("rest", TypeDescriptor::string()))
///     .arg(ArgSpec::named("force", TypeDescriptor::boolean()).with_default(false))
///     .build()
///     .unwrap();
///
/// let Outcome::Bound(call) = schema.parse(["a.txt", "b", "c", "--force"]).unwrap() else {
///     unreachable!()
/// };
/// assert_eq!(call.rest(), &[Value::from("b"), Value::from("c")]);
/// assert_eq!(call.get("force"), Some(&Value::Bool(true)));
/// assert!(call.get("src").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CallArgs {
    /// Positional values, then var-args values.
    pub positional: Vec<Value>,
    /// Named-only values, then captured unknown options.
    pub named: BTreeMap<String, Value>,
    #[serde(skip)]
    positional_params: Vec<String>,
}

impl CallArgs {
    /// Looks up the bound value of a declared parameter or captured option.
    pub fn get(&self, param: &str) -> Option<&Value> {
        if let Some(value) = self.named.get(param) {
            return Some(value);
        }
        self.positional_params
            .iter()
            .position(|p| p == param)
            .and_then(|idx| self.positional.get(idx))
    }

    /// Values collected by the var-args slot.
    pub fn rest(&self) -> &[Value] {
        let start = self.positional_params.len().min(self.positional.len());
        &self.positional[start..]
    }
}

pub(crate) fn assemble(schema: &Schema, bindings: Bindings) -> CallArgs {
    let Bindings {
        mut slots,
        var_args,
        captures,
        ..
    } = bindings;

    let mut call = CallArgs::default();
    for &idx in &schema.positional {
        call.positional_params.push(schema.descriptors[idx].param.clone());
        call.positional.push(std::mem::take(&mut slots[idx].value));
    }
    call.positional.extend(var_args);

    for &idx in &schema.named {
        let descriptor = &schema.descriptors[idx];
        if descriptor.is_positional {
            continue;
        }
        call.named
            .insert(descriptor.param.clone(), std::mem::take(&mut slots[idx].value));
    }

    for capture in captures {
        let mut values = capture.values;
        let value = match values.len() {
            0 => Value::None,
            1 => values.remove(0),
            _ => Value::List(values),
        };
        call.named.insert(capture.name, value);
    }

    debug!(
        schema = %schema.name,
        positional = call.positional.len(),
        named = call.named.len(),
        "Assembled call arguments"
    );
    call
}

/// Builds the composite value of a record parameter from its child scope.
pub(crate) fn assemble_record(child: &Schema, bindings: Bindings) -> Value {
    let mut slots = bindings.slots;
    let fields = child
        .named
        .iter()
        .map(|&idx| {
            (
                child.descriptors[idx].param.clone(),
                std::mem::take(&mut slots[idx].value),
            )
        })
        .collect();
    Value::Record(fields)
}
