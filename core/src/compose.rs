//! Schema composition.
//!
//! Turns declarations into descriptors, resolving names and types, and
//! recursively builds child schemas for record parameters when recursion is
//! enabled. A child schema is keyword-only, may not declare catch-alls of
//! its own, and gets a synthetic n-ary var-args slot so that tokens meant
//! for the parent pass through it untouched.

use std::sync::Arc;

use tracing::debug;

use crate::error::ConfigError;
use crate::names::{self, ShortNames};
use crate::registry::ValueRegistry;
use crate::schema::{Descriptor, Schema};
use crate::types::{ArgName, ArgSpec, ParamKind, RecordSpec, TypeDescriptor, Value};

#[derive(Debug, Clone, Copy)]
pub(crate) struct ComposeOptions {
    pub recurse: bool,
    pub kw_only: bool,
    pub is_child: bool,
}

/// Composes one schema level.
///
/// `claimed` carries the short names used so far in the flattened
/// namespace; the updated set is returned alongside the schema.
pub(crate) fn compose(
    obj: &str,
    brief: &str,
    program_name: &str,
    fields: &[ArgSpec],
    options: ComposeOptions,
    claimed: ShortNames,
    registry: &Arc<ValueRegistry>,
) -> Result<(Schema, ShortNames), ConfigError> {
    let mut schema = Schema::empty(obj, brief, program_name, options.is_child, Arc::clone(registry));

    let namespace = names::collect_names(fields, obj, options.recurse, options.kw_only, registry)?;
    let (mut claimed, hints) =
        names::reserve_short_names(fields, &namespace, claimed, options.kw_only);

    for field in fields {
        if options.is_child && field.kind.is_variadic() {
            return Err(ConfigError::VariadicInChild {
                param: field.name.clone(),
                obj: obj.to_string(),
            });
        }

        let positional = field.kind.is_positional(options.kw_only);
        let named = field.kind.is_keyword(options.kw_only);
        let (is_nary, element) = match (field.kind, field.ty.nary_element()) {
            (ParamKind::VarArgs, _) => (true, &field.ty),
            (_, Some(inner)) => (true, inner),
            (_, None) => (false, &field.ty),
        };
        let option_name = field.option_name();

        let mut child = None;
        let name = if registry.is_parsable(element) {
            names::make_name(
                &option_name,
                named,
                hints.get(&field.name).copied(),
                &mut claimed,
            )
        } else if options.recurse {
            let record = recursion_target(field, element, is_nary, obj)?;
            let child_options = ComposeOptions {
                recurse: true,
                kw_only: true,
                is_child: true,
            };
            let (child_schema, returned) = compose(
                &record.name,
                &record.brief,
                "",
                &record.fields,
                child_options,
                claimed,
                registry,
            )?;
            claimed = returned;
            child = Some(Box::new(child_schema));
            ArgName::long(option_name.as_str())
        } else {
            return Err(ConfigError::UnsupportedType {
                ty: field.ty.to_string(),
                param: field.name.clone(),
                obj: obj.to_string(),
            });
        };
        debug!(schema = %obj, param = %field.name, name = ?name, "Resolved parameter name");

        let mut descriptor = Descriptor {
            param: field.name.clone(),
            name,
            ty: element.clone(),
            is_positional: positional,
            is_named: named,
            is_nary,
            required: field.default.is_none(),
            default: field.default.clone().unwrap_or_default(),
            help: field.help.clone(),
            metavar: registry.metavar(element),
            child,
        };

        match field.kind {
            ParamKind::VarArgs => {
                descriptor.name = ArgName::default();
                descriptor.is_positional = true;
                descriptor.required = false;
                schema.set_var_args(descriptor)?;
            }
            ParamKind::VarKwargs => {
                descriptor.name = ArgName::long("<key>");
                descriptor.is_named = true;
                descriptor.required = false;
                schema.set_var_kwargs(descriptor)?;
            }
            _ => schema.add(descriptor)?,
        }
    }

    if options.is_child {
        schema.set_var_args(parent_passthrough(registry))?;
    }

    Ok((schema, claimed))
}

/// Returns the record a parameter recurses into, or why it cannot.
fn recursion_target<'a>(
    field: &ArgSpec,
    element: &'a TypeDescriptor,
    is_nary: bool,
    obj: &str,
) -> Result<&'a RecordSpec, ConfigError> {
    if field.kind.is_variadic() {
        return Err(ConfigError::RecurseIntoVariadic {
            param: field.name.clone(),
            obj: obj.to_string(),
        });
    }
    if is_nary {
        return Err(ConfigError::RecurseIntoNary {
            param: field.name.clone(),
            obj: obj.to_string(),
        });
    }
    element
        .as_record()
        .ok_or_else(|| ConfigError::RecurseIntoNonRecord {
            param: field.name.clone(),
            ty: field.ty.to_string(),
            obj: obj.to_string(),
        })
}

/// The var-args slot every child schema gets: collects the tokens the child
/// does not recognize, in order, for the parent to match.
fn parent_passthrough(registry: &ValueRegistry) -> Descriptor {
    let ty = TypeDescriptor::string();
    Descriptor {
        param: String::new(),
        name: ArgName::default(),
        metavar: registry.metavar(&ty),
        ty,
        is_positional: true,
        is_named: false,
        is_nary: true,
        required: false,
        default: Value::List(Vec::new()),
        help: "Additional arguments for the parent parser.".to_string(),
        child: None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::schema::SchemaBuilder;

    use super::*;

    fn config() -> RecordSpec {
        RecordSpec::new("Config")
            .with_field(ArgSpec::named("sides", TypeDescriptor::int()).with_default(6))
            .with_field(
                ArgSpec::named("kind", TypeDescriptor::literal(["single", "pair"]))
                    .with_default("single"),
            )
    }

    fn dice(recurse: bool) -> Result<Schema, ConfigError> {
        SchemaBuilder::new("throw_dice")
            .arg(ArgSpec::positional_or_named("cfg", TypeDescriptor::record(config())))
            .arg(ArgSpec::positional_or_named("count", TypeDescriptor::int()).with_default(1))
            .recurse(recurse)
            .build()
    }

    #[test]
    fn test_child_schema_is_composed() {
        let schema = dice(true).unwrap();
        let cfg = &schema.descriptors()[0];
        let child = cfg.child().expect("record parameter has a child schema");

        assert!(child.is_child());
        assert!(child.positional().next().is_none());
        assert!(child.named().all(Descriptor::is_named));
        assert!(child.var_args().is_some_and(Descriptor::is_nary));
        assert_eq!(child.lookup("s").map(Descriptor::param), Some("sides"));
        assert_eq!(child.lookup("k").map(Descriptor::param), Some("kind"));
    }

    #[test]
    fn test_short_names_unique_across_levels() {
        let schema = dice(true).unwrap();
        let mut seen = HashSet::new();
        for option in schema.options() {
            if let Some(short) = option.name().short {
                assert!(seen.insert(short), "short name -{short} assigned twice");
            }
        }
        assert_eq!(seen, HashSet::from(['s', 'k', 'c']));
    }

    #[test]
    fn test_parent_letters_are_not_reused_by_child() {
        let record = RecordSpec::new("Opts")
            .with_field(ArgSpec::named("speed", TypeDescriptor::int()).with_default(1));
        let schema = SchemaBuilder::new("run")
            .arg(ArgSpec::named("size", TypeDescriptor::int()).with_default(1))
            .arg(ArgSpec::named("opts", TypeDescriptor::record(record)))
            .recurse(true)
            .build()
            .unwrap();
        let options = schema.options();
        assert_eq!(options[0].name(), &ArgName::both('s', "size"));
        assert_eq!(options[1].name(), &ArgName::long("speed"));
    }

    #[test]
    fn test_record_without_recursion_is_unsupported() {
        let err = dice(false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported type `Config` for parameter `cfg` in `throw_dice`!"
        );
    }

    #[test]
    fn test_nary_record_is_rejected() {
        let err = SchemaBuilder::new("f")
            .arg(ArgSpec::named(
                "cfgs",
                TypeDescriptor::sequence(TypeDescriptor::record(config())),
            ))
            .recurse(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::RecurseIntoNary { .. }));
    }

    #[test]
    fn test_variadic_record_is_rejected() {
        let err = SchemaBuilder::new("f")
            .arg(ArgSpec::var_args("rest", TypeDescriptor::record(config())))
            .recurse(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::RecurseIntoVariadic { .. }));
    }

    #[test]
    fn test_non_record_recursion_target_is_rejected() {
        let err = SchemaBuilder::new("f")
            .arg(ArgSpec::named(
                "grid",
                TypeDescriptor::sequence(TypeDescriptor::sequence(TypeDescriptor::int())),
            ))
            .recurse(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::RecurseIntoNary { .. }));

        let err = SchemaBuilder::new("f")
            .arg(ArgSpec::named("ip", TypeDescriptor::custom("ip")))
            .recurse(true)
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot recurse into parameter `ip` of non-class type `ip` in `f`!"
        );
    }

    #[test]
    fn test_child_cannot_declare_variadics() {
        let record = RecordSpec::new("Loose")
            .with_field(ArgSpec::var_kwargs("extra", TypeDescriptor::string()));
        let err = SchemaBuilder::new("f")
            .arg(ArgSpec::named("loose", TypeDescriptor::record(record)))
            .recurse(true)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::VariadicInChild {
                param: "extra".into(),
                obj: "Loose".into()
            }
        );
    }

    #[test]
    fn test_sibling_records_collide() {
        let a = RecordSpec::new("A")
            .with_field(ArgSpec::named("level", TypeDescriptor::int()).with_default(0));
        let b = RecordSpec::new("B")
            .with_field(ArgSpec::named("level", TypeDescriptor::int()).with_default(0));
        let err = SchemaBuilder::new("f")
            .arg(ArgSpec::named("a", TypeDescriptor::record(a)))
            .arg(ArgSpec::named("b", TypeDescriptor::record(b)))
            .recurse(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { ref name, .. } if name == "level"));
    }

    #[test]
    fn test_duplicate_catch_alls() {
        let err = SchemaBuilder::new("f")
            .arg(ArgSpec::var_args("a", TypeDescriptor::string()))
            .arg(ArgSpec::var_args("b", TypeDescriptor::string()))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateVarArgs);

        let err = SchemaBuilder::new("f")
            .arg(ArgSpec::var_kwargs("a", TypeDescriptor::string()))
            .arg(ArgSpec::var_kwargs("b", TypeDescriptor::string()))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateVarKwargs);
    }

    #[test]
    fn test_named_parameter_needs_a_name() {
        let err = SchemaBuilder::new("f")
            .arg(ArgSpec::named("", TypeDescriptor::int()))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingName);
    }

    #[test]
    fn test_kw_only_makes_everything_named() {
        let schema = SchemaBuilder::new("f")
            .arg(ArgSpec::positional("path", TypeDescriptor::path()))
            .kw_only(true)
            .build()
            .unwrap();
        assert!(schema.positional().next().is_none());
        assert_eq!(schema.lookup("p").map(Descriptor::param), Some("path"));
    }
}
