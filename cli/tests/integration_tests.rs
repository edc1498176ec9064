use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("argbind_cli_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Declaration of the dice example.
fn write_dice(dir: &TempDir) -> PathBuf {
    let yaml = r#"name: throw-dice
doc: |
  Throw dice according to the configuration.

  Args:
    cfg: The configuration for the dice.
    count [k]: The number of dice to throw.
recurse: true
params:
  - { name: cfg, type: Config }
  - { name: count, type: int, default: 1 }
records:
  Config:
    doc: |
      Attributes:
        sides: The number of sides on the dice.
        kind: Whether to throw a single die or a pair.
    fields:
      - { name: sides, type: int, default: 6 }
      - { name: kind, type: "literal[single|pair]", default: single }
"#;
    let path = dir.join("dice.yaml");
    fs::write(&path, yaml).expect("failed to write declaration");
    path
}

/// A two-command declaration.
fn write_calc(dir: &TempDir) -> PathBuf {
    let json = serde_json::json!({
        "brief": "A tiny calculator.",
        "commands": [
            {"name": "add", "doc": "Add numbers.", "params": [
                {"name": "n", "type": "int", "variadic": "args"}
            ]},
            {"name": "neg", "doc": "Negate a number.", "params": [
                {"name": "x", "type": "int"}
            ]}
        ]
    });
    let path = dir.join("calc.json");
    fs::write(&path, serde_json::to_string_pretty(&json).unwrap())
        .expect("failed to write declaration");
    path
}

fn argbind(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_argbind"))
        .args(args)
        .output()
        .expect("failed to run argbind")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

#[test]
fn parse_prints_bound_arguments_as_json() {
    let dir = TempDir::new("parse_json");
    let dice = write_dice(&dir);

    let output = argbind(&[
        "parse",
        "--schema",
        dice.to_str().unwrap(),
        "--",
        "--sides",
        "20",
        "-k",
        "3",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["positional"][0]["sides"], 20);
    assert_eq!(value["positional"][0]["kind"], "single");
    assert_eq!(value["positional"][1], 3);
}

#[test]
fn parse_prints_yaml_when_asked() {
    let dir = TempDir::new("parse_yaml");
    let dice = write_dice(&dir);

    let output = argbind(&[
        "parse",
        "--schema",
        dice.to_str().unwrap(),
        "--format",
        "yaml",
        "--",
        "--kind",
        "pair",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let value: serde_yaml::Value = serde_yaml::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["positional"][0]["kind"].as_str(), Some("pair"));
}

#[test]
fn parse_error_prints_usage_and_exits_one() {
    let dir = TempDir::new("parse_error");
    let dice = write_dice(&dir);

    let output = argbind(&[
        "parse",
        "--schema",
        dice.to_str().unwrap(),
        "--program",
        "dice",
        "--",
        "--sides",
        "many",
    ]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.starts_with("Error: Cannot parse integer from `many`!"), "{err}");
    assert!(err.contains("Usage:\n  dice"));
    assert!(err.contains("For more information, run with -?|--help."));
    assert!(stdout(&output).is_empty());
}

#[test]
fn parse_uncaught_reports_plain_error() {
    let dir = TempDir::new("parse_uncaught");
    let dice = write_dice(&dir);

    let output = argbind(&[
        "parse",
        "--schema",
        dice.to_str().unwrap(),
        "--uncaught",
        "--",
        "--bogus",
    ]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.starts_with("error: "), "{err}");
    assert!(!err.contains("Usage:"));
}

#[test]
fn parse_help_prints_help_and_exits_zero() {
    let dir = TempDir::new("parse_help");
    let dice = write_dice(&dir);

    let output = argbind(&["parse", "--schema", dice.to_str().unwrap(), "--", "-?"]);
    assert!(output.status.success());
    let help = stdout(&output);
    assert!(help.starts_with("Throw dice according to the configuration."));
    assert!(help.contains("The number of sides on the dice."));
    assert!(help.contains("Show this help message and exit."));
}

#[test]
fn parse_dispatches_commands() {
    let dir = TempDir::new("parse_commands");
    let calc = write_calc(&dir);

    let output = argbind(&["parse", "--schema", calc.to_str().unwrap(), "add", "1", "2"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["command"], "add");
    assert_eq!(value["args"]["positional"], serde_json::json!([1, 2]));

    let output = argbind(&["parse", "--schema", calc.to_str().unwrap(), "mul"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("mul"));
}

// ---------------------------------------------------------------------------
// usage / validate
// ---------------------------------------------------------------------------

#[test]
fn usage_prints_help_text() {
    let dir = TempDir::new("usage");
    let calc = write_calc(&dir);

    let output = argbind(&["usage", "--schema", calc.to_str().unwrap(), "--program", "calc"]);
    assert!(output.status.success());
    let help = stdout(&output);
    assert!(help.contains("Usage:\n  calc <command> <command-specific-args>"));
    assert!(help.contains("Negate a number."));
}

#[test]
fn validate_counts_schemas_and_commands() {
    let dir = TempDir::new("validate");
    let dice = write_dice(&dir);
    let calc = write_calc(&dir);

    let output = argbind(&["validate", dice.to_str().unwrap(), calc.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output).trim(),
        "Validated 2 declaration file(s): 1 schema(s), 2 command(s)."
    );
}

#[test]
fn validate_rejects_broken_declaration() {
    let dir = TempDir::new("validate_broken");
    let path = dir.join("broken.yaml");
    fs::write(&path, "name: f\nparams:\n  - { name: x, type: \"list[int\" }\n").unwrap();

    let output = argbind(&["validate", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("invalid type `list[int` for parameter `x`"), "{err}");
}
