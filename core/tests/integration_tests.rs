use std::collections::HashSet;

use argbind_core::{
    ArgSpec, CallArgs, ConfigError, OptionError, Outcome, ParseError, RecordSpec, Schema,
    ScalarKind, TypeDescriptor, Value, ValueError, ValueRegistry,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bind(schema: &Schema, tokens: &[&str]) -> CallArgs {
    match schema.parse(tokens) {
        Ok(Outcome::Bound(call)) => call,
        Ok(Outcome::Help) => panic!("unexpected help for {tokens:?}"),
        Err(err) => panic!("unexpected error for {tokens:?}: {err}"),
    }
}

fn option_error(schema: &Schema, tokens: &[&str]) -> String {
    match schema.parse(tokens) {
        Err(ParseError::Option(err)) => err.to_string(),
        other => panic!("expected option error for {tokens:?}, got {other:?}"),
    }
}

fn greet() -> Schema {
    Schema::builder("greet")
        .arg(ArgSpec::positional("name", TypeDescriptor::string()))
        .arg(ArgSpec::named("count", TypeDescriptor::int()).with_default(1))
        .arg(ArgSpec::named("verbose", TypeDescriptor::boolean()).with_default(false))
        .build()
        .unwrap()
}

fn config() -> RecordSpec {
    RecordSpec::new("Config")
        .with_field(ArgSpec::named("sides", TypeDescriptor::int()).with_default(6))
        .with_field(ArgSpec::named("kind", TypeDescriptor::string()).with_default("single"))
}

fn dice() -> Schema {
    Schema::builder("throw_dice")
        .arg(ArgSpec::positional_or_named("cfg", TypeDescriptor::record(config())))
        .arg(ArgSpec::positional_or_named("count", TypeDescriptor::int()).with_default(1))
        .recurse(true)
        .build()
        .unwrap()
}

fn hi_with_kwargs() -> Schema {
    Schema::builder("hi")
        .arg(ArgSpec::positional_or_named("msg", TypeDescriptor::string()))
        .arg(ArgSpec::positional_or_named("n", TypeDescriptor::int()))
        .arg(ArgSpec::var_kwargs(
            "rest",
            TypeDescriptor::sequence(TypeDescriptor::string()),
        ))
        .build()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_positional_and_named() {
    let call = bind(&greet(), &["jane", "--count", "3"]);
    assert_eq!(call.positional, vec![Value::from("jane")]);
    assert_eq!(call.named["count"], Value::Int(3));
    assert_eq!(call.named["verbose"], Value::Bool(false));
}

#[test]
fn test_flag_consumes_no_value() {
    let call = bind(&greet(), &["jane", "--verbose"]);
    assert_eq!(call.named["verbose"], Value::Bool(true));

    assert_eq!(
        option_error(&greet(), &["jane", "--verbose", "true"]),
        "Unexpected positional argument: `true`!"
    );
    assert_eq!(
        option_error(&greet(), &["jane", "--verbose=true"]),
        "Option `verbose` is a flag and cannot be assigned a value!"
    );
}

#[test]
fn test_nary_named_option() {
    let schema = Schema::builder("sum")
        .arg(ArgSpec::named(
            "numbers",
            TypeDescriptor::sequence(TypeDescriptor::int()),
        ))
        .build()
        .unwrap();
    let call = bind(&schema, &["--numbers", "0", "1", "2", "3", "4"]);
    assert_eq!(call.named["numbers"], Value::from(vec![0, 1, 2, 3, 4]));

    assert_eq!(
        option_error(&schema, &["--numbers"]),
        "Option `numbers` is missing argument!"
    );
}

#[test]
fn test_missing_required_positional() {
    assert_eq!(
        option_error(&greet(), &[]),
        "Required positional argument <name> is not provided!"
    );
}

#[test]
fn test_missing_required_option_is_phrased_as_option() {
    let schema = Schema::builder("f")
        .arg(ArgSpec::positional_or_named("msg", TypeDescriptor::string()))
        .build()
        .unwrap();
    assert_eq!(
        option_error(&schema, &[]),
        "Required option `msg` is not provided!"
    );
}

#[test]
fn test_recursive_record() {
    let call = bind(&dice(), &["--sides", "4", "--kind", "pair", "--count", "2"]);
    let cfg = call.get("cfg").and_then(Value::as_record).unwrap();
    assert_eq!(cfg["sides"], Value::Int(4));
    assert_eq!(cfg["kind"], Value::from("pair"));
    assert_eq!(call.get("count"), Some(&Value::Int(2)));
}

#[test]
fn test_recursive_record_with_parent_positional() {
    let call = bind(&dice(), &["-s", "8", "3"]);
    let cfg = call.get("cfg").and_then(Value::as_record).unwrap();
    assert_eq!(cfg["sides"], Value::Int(8));
    assert_eq!(cfg["kind"], Value::from("single"));
    assert_eq!(call.get("count"), Some(&Value::Int(3)));
}

#[test]
fn test_record_parameter_name_is_not_an_option() {
    assert_eq!(
        option_error(&dice(), &["--cfg", "x"]),
        "Unexpected option `cfg`!"
    );
}

/// `Config` whose fields are both required.
fn strict_config() -> RecordSpec {
    RecordSpec::new("StrictConfig")
        .with_field(ArgSpec::named("sides", TypeDescriptor::int()))
        .with_field(ArgSpec::named(
            "kind",
            TypeDescriptor::literal(["single", "pair"]),
        ))
}

fn strict_record(sides: i64, kind: &str) -> Value {
    Value::Record(
        [
            ("sides".to_string(), Value::Int(sides)),
            ("kind".to_string(), Value::from(kind)),
        ]
        .into_iter()
        .collect(),
    )
}

fn dice_with_default_cfg() -> Schema {
    Schema::builder("throw_dice")
        .arg(ArgSpec::positional_or_named("count", TypeDescriptor::int()))
        .arg(
            ArgSpec::positional_or_named("cfg", TypeDescriptor::record(strict_config()))
                .with_default(strict_record(6, "single")),
        )
        .recurse(true)
        .build()
        .unwrap()
}

fn dice_with_optional_cfg() -> Schema {
    Schema::builder("throw_dice")
        .arg(ArgSpec::positional_or_named("count", TypeDescriptor::int()))
        .arg(
            ArgSpec::positional_or_named(
                "cfg",
                TypeDescriptor::optional(TypeDescriptor::record(strict_config())),
            )
            .with_default(Value::None),
        )
        .recurse(true)
        .build()
        .unwrap()
}

#[test]
fn test_record_with_required_fields_binds_when_given() {
    let tokens = ["--sides", "4", "--kind", "pair", "--count", "2"];
    for schema in [dice_with_default_cfg(), dice_with_optional_cfg()] {
        let call = bind(&schema, &tokens);
        assert_eq!(call.positional, vec![Value::Int(2), strict_record(4, "pair")]);
    }
}

#[test]
fn test_record_default_used_when_child_fields_missing() {
    let call = bind(&dice_with_default_cfg(), &["--count", "2"]);
    assert_eq!(call.positional, vec![Value::Int(2), strict_record(6, "single")]);
}

#[test]
fn test_optional_record_defaults_to_none() {
    let call = bind(&dice_with_optional_cfg(), &["--count", "2"]);
    assert_eq!(call.positional, vec![Value::Int(2), Value::None]);
}

#[test]
fn test_record_fallback_leaves_field_tokens_to_parent() {
    // `kind` is missing, so `cfg` takes its default and `--sides` is left
    // for the parent, which does not know it.
    assert_eq!(
        option_error(&dice_with_default_cfg(), &["--count", "2", "--sides", "4"]),
        "Unexpected option `sides`!"
    );
}

#[test]
fn test_required_record_propagates_child_error() {
    let schema = Schema::builder("throw_dice")
        .arg(ArgSpec::positional_or_named("cfg", TypeDescriptor::record(strict_config())))
        .recurse(true)
        .build()
        .unwrap();
    assert_eq!(
        option_error(&schema, &["--sides", "4"]),
        "Required option `kind` is not provided!"
    );
}

#[test]
fn test_record_default_does_not_hide_value_errors() {
    let err = dice_with_default_cfg()
        .parse(["--count", "2", "--sides", "many"])
        .unwrap_err();
    assert_eq!(err, ParseError::Value(ValueError::Int("many".into())));
}

#[test]
fn test_unknown_options_are_captured() {
    let forms: [&[&str]; 7] = [
        &["hello", "3", "--arg-a=val1", "--arg-a=val2"],
        &["hello", "--arg-a=val1", "--arg-a=val2", "3"],
        &["--arg-a=val1", "--arg-a=val2", "hello", "3"],
        &["--arg-a=val1", "hello", "--arg-a=val2", "3"],
        &["hello", "3", "--arg-a", "val1", "val2"],
        &["hello", "--arg-a", "val1", "val2", "--n", "3"],
        &["--arg-a", "val1", "val2", "--n", "3", "hello"],
    ];
    for tokens in forms {
        let call = bind(&hi_with_kwargs(), tokens);
        assert_eq!(call.positional, vec![Value::from("hello"), Value::Int(3)], "{tokens:?}");
        assert_eq!(call.named.len(), 1, "{tokens:?}");
        assert_eq!(call.named["arg-a"], Value::from(vec!["val1", "val2"]), "{tokens:?}");
    }
}

#[test]
fn test_single_capture_collapses_to_scalar() {
    let call = bind(&hi_with_kwargs(), &["hello", "3", "--arg-a=val1", "--arg-b=val2"]);
    assert_eq!(call.named["arg-a"], Value::from("val1"));
    assert_eq!(call.named["arg-b"], Value::from("val2"));
}

#[test]
fn test_capture_errors() {
    let schema = hi_with_kwargs();
    assert_eq!(
        option_error(&schema, &["hello", "3", "--arg-a"]),
        "Option `arg-a` is missing argument!"
    );
    assert_eq!(
        option_error(&schema, &["hello", "3", "--arg-a", "--arg-b"]),
        "Option `arg-a` is missing argument!"
    );
    assert_eq!(
        option_error(&schema, &["--arg-a", "val1", "val2", "hello", "3"]),
        "Required option `msg` is not provided!"
    );
    assert_eq!(
        option_error(&schema, &["hello", "--arg-a=val1", "--arg-a=val2", "3", "world"]),
        "Unexpected positional argument: `world`!"
    );
}

#[test]
fn test_unknown_option_goes_to_var_args() {
    let schema = Schema::builder("hi")
        .arg(ArgSpec::positional("msg", TypeDescriptor::string()))
        .arg(ArgSpec::var_args("rest", TypeDescriptor::string()))
        .build()
        .unwrap();
    let call = bind(&schema, &["hello", "--color=red", "-x", "world"]);
    assert_eq!(call.rest(), &[
        Value::from("--color=red"),
        Value::from("-x"),
        Value::from("world"),
    ]);
}

#[test]
fn test_unexpected_option_without_catch_all() {
    assert_eq!(
        option_error(&greet(), &["jane", "--color", "red"]),
        "Unexpected option `color`!"
    );
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn test_default_idempotence() {
    let schema = Schema::builder("f")
        .arg(ArgSpec::positional_or_named("path", TypeDescriptor::path()).with_default("."))
        .arg(ArgSpec::named("level", TypeDescriptor::float()).with_default(0.5))
        .arg(ArgSpec::named("tags", TypeDescriptor::sequence(TypeDescriptor::string()))
            .with_default(Vec::<String>::new()))
        .arg(ArgSpec::named("limit", TypeDescriptor::optional(TypeDescriptor::int()))
            .with_default(Value::None))
        .build()
        .unwrap();

    for _ in 0..2 {
        let call = bind(&schema, &[]);
        assert_eq!(call.positional, vec![Value::from(".")]);
        assert_eq!(call.named["level"], Value::Float(0.5));
        assert_eq!(call.named["tags"], Value::List(Vec::new()));
        assert_eq!(call.named["limit"], Value::None);
    }
}

#[test]
fn test_multiply_given_non_nary() {
    let forms: [&[&str]; 4] = [
        &["jane", "--count", "1", "--count", "2"],
        &["jane", "-c", "1", "--count", "2"],
        &["jane", "--count=1", "-c=2"],
        &["jane", "-c", "1", "-c", "2"],
    ];
    for tokens in forms {
        assert_eq!(
            option_error(&greet(), tokens),
            "Option `count` is multiply given!",
            "{tokens:?}"
        );
    }
    assert_eq!(
        option_error(&greet(), &["jane", "-v", "--verbose"]),
        "Option `verbose` is multiply given!"
    );
}

#[test]
fn test_nary_option_appends_when_repeated() {
    let schema = Schema::builder("f")
        .arg(ArgSpec::named("num", TypeDescriptor::sequence(TypeDescriptor::int())))
        .build()
        .unwrap();
    let call = bind(&schema, &["--num", "1", "2", "-n", "3", "--num=4"]);
    assert_eq!(call.named["num"], Value::from(vec![1, 2, 3, 4]));
}

#[test]
fn test_short_name_uniqueness_across_levels() {
    let inner = RecordSpec::new("Inner")
        .with_field(ArgSpec::named("depth", TypeDescriptor::int()).with_default(0))
        .with_field(ArgSpec::named("dry_run", TypeDescriptor::boolean()).with_default(false));
    let outer = RecordSpec::new("Outer")
        .with_field(ArgSpec::named("delay", TypeDescriptor::int()).with_default(0))
        .with_field(ArgSpec::named("inner", TypeDescriptor::record(inner)));
    let schema = Schema::builder("f")
        .arg(ArgSpec::named("debug", TypeDescriptor::boolean()).with_default(false))
        .arg(ArgSpec::named("outer", TypeDescriptor::record(outer)))
        .recurse(true)
        .build()
        .unwrap();

    let options = schema.options();
    assert_eq!(options.len(), 4);
    let mut seen = HashSet::new();
    for option in &options {
        if let Some(short) = option.name().short {
            assert!(seen.insert(short), "-{short} assigned twice");
        }
    }
    assert_eq!(seen.len(), 1);

    let call = bind(&schema, &["--dry-run", "--depth", "2", "-d"]);
    let outer = call.named["outer"].as_record().unwrap();
    let inner = outer["inner"].as_record().unwrap();
    assert_eq!(inner["depth"], Value::Int(2));
    assert_eq!(inner["dry_run"], Value::Bool(true));
    assert_eq!(outer["delay"], Value::Int(0));
    assert_eq!(call.named["debug"], Value::Bool(true));
}

#[test]
fn test_collision_is_a_build_error() {
    let err = Schema::builder("throw_dice")
        .arg(ArgSpec::named("cfg", TypeDescriptor::record(config())))
        .arg(ArgSpec::named("sides", TypeDescriptor::int()).with_default(2))
        .recurse(true)
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateName { ref name, .. } if name == "sides"));
}

#[test]
fn test_render_and_reparse() {
    let schema = Schema::builder("f")
        .arg(ArgSpec::positional("src", TypeDescriptor::path()))
        .arg(ArgSpec::named("count", TypeDescriptor::int()).with_default(1))
        .arg(ArgSpec::named("ratio", TypeDescriptor::float()).with_default(1.0))
        .arg(ArgSpec::named("tags", TypeDescriptor::sequence(TypeDescriptor::string()))
            .with_default(Vec::<String>::new()))
        .arg(ArgSpec::named("force", TypeDescriptor::boolean()).with_default(false))
        .arg(ArgSpec::named("mode", TypeDescriptor::literal(["fast", "safe"])).with_default("safe"))
        .build()
        .unwrap();

    let samples = [
        ("src", Value::Path("a/b.txt".into())),
        ("count", Value::Int(42)),
        ("ratio", Value::Float(2.5)),
        ("tags", Value::from(vec!["x", "y"])),
        ("force", Value::Bool(true)),
        ("mode", Value::from("fast")),
    ];
    for (param, value) in samples {
        let descriptor = schema
            .descriptors()
            .iter()
            .find(|d| d.param() == param)
            .unwrap();
        let mut tokens = descriptor.render_tokens(&value);
        if param != "src" {
            tokens.insert(0, "x".to_string());
        }
        let call = bind(&schema, &tokens.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(call.get(param), Some(&value), "{tokens:?}");
    }
}

#[test]
fn test_adjacent_nary_positionals_are_greedy() {
    let schema = Schema::builder("f")
        .arg(ArgSpec::positional("a", TypeDescriptor::sequence(TypeDescriptor::int())))
        .arg(ArgSpec::positional("b", TypeDescriptor::sequence(TypeDescriptor::int())))
        .build()
        .unwrap();
    assert_eq!(
        option_error(&schema, &["1", "2", "3"]),
        "Required positional argument <b> is not provided!"
    );
}

#[test]
fn test_double_dash_is_not_an_end_of_options_marker() {
    assert_eq!(
        option_error(&greet(), &["jane", "--", "--count"]),
        "Prefix `--` is not followed by an option!"
    );
    assert_eq!(
        option_error(&greet(), &["-"]),
        "Prefix `-` is not followed by an option!"
    );
}

#[test]
fn test_help_tokens_short_circuit() {
    assert_eq!(greet().parse(["--help"]).unwrap(), Outcome::Help);
    assert_eq!(greet().parse(["jane", "-?", "--bogus"]).unwrap(), Outcome::Help);
    // Help inside a child scope.
    assert_eq!(dice().parse(["--sides", "2", "-?"]).unwrap(), Outcome::Help);
}

#[test]
fn test_value_errors() {
    let err = greet().parse(["jane", "--count", "three"]).unwrap_err();
    assert_eq!(err, ParseError::Value(ValueError::Int("three".into())));
}

#[test]
fn test_custom_converter() {
    let mut registry = ValueRegistry::default();
    let hex = ScalarKind::Custom("hex".into());
    registry.register(hex.clone(), |raw| {
        i64::from_str_radix(raw.trim_start_matches("0x"), 16)
            .map(Value::Int)
            .map_err(|_| ValueError::Custom(format!("Cannot parse hex from `{raw}`!")))
    });

    let schema = Schema::builder("f")
        .arg(ArgSpec::named("addr", TypeDescriptor::Scalar(hex)))
        .registry(registry.into())
        .build()
        .unwrap();
    let call = bind(&schema, &["--addr", "0xff"]);
    assert_eq!(call.named["addr"], Value::Int(255));

    let err = schema.parse(["--addr", "zz"]).unwrap_err();
    assert_eq!(err.to_string(), "Cannot parse hex from `zz`!");
}

#[test]
fn test_positional_or_named_slot_skipped_when_bound_by_name() {
    let schema = Schema::builder("f")
        .arg(ArgSpec::positional_or_named("first", TypeDescriptor::string()))
        .arg(ArgSpec::positional_or_named("second", TypeDescriptor::string()))
        .build()
        .unwrap();
    let call = bind(&schema, &["--first", "a", "b"]);
    assert_eq!(call.positional, vec![Value::from("a"), Value::from("b")]);

    assert_eq!(
        option_error(&schema, &["a", "b", "--first", "c"]),
        "Option `first` is multiply given!"
    );
}

#[test]
fn test_concurrent_parses_share_schema() {
    let schema = greet();
    std::thread::scope(|scope| {
        for n in 0..8 {
            let schema = &schema;
            scope.spawn(move || {
                let count = n.to_string();
                let call = bind(schema, &["jane", "--count", count.as_str()]);
                assert_eq!(call.named["count"], Value::Int(n));
            });
        }
    });
    // Bound values never leak into the schema.
    let err = greet().parse(Vec::<&str>::new()).unwrap_err();
    assert_eq!(
        err,
        ParseError::Option(OptionError::RequiredPositional("name".into()))
    );
    assert!(schema.parse(Vec::<&str>::new()).is_err());
}
