use std::path::{Path, PathBuf};

use argbind_core::{CallArgs, CommandDriver, Driver, ErrorMode, Invocation};
use argbind_decl::{Loaded, Loader};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{Level, debug};
use tracing_subscriber::EnvFilter;

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "argbind")]
#[command(about = "Bind command-line tokens against declared argument schemas")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Bind tokens against a declaration file and print the call arguments.
    Parse(ParseArgs),
    /// Print the help text generated for a declaration file.
    Usage(UsageArgs),
    /// Check that declaration files build into valid schemas.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Declaration file (.json, .yaml or .yml).
    #[arg(long)]
    schema: PathBuf,
    /// Program name shown in usage and error text.
    #[arg(long)]
    program: Option<String>,
    /// Report parse errors as plain errors instead of usage-annotated output.
    #[arg(long)]
    uncaught: bool,
    /// Output format for the bound arguments.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Tokens to bind. Put them after `--` when they start with a dash.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    tokens: Vec<String>,
}

#[derive(Debug, Args)]
struct UsageArgs {
    /// Declaration file (.json, .yaml or .yml).
    #[arg(long)]
    schema: PathBuf,
    /// Program name shown in the usage line.
    #[arg(long)]
    program: Option<String>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Declaration files to check.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

/// A bound command, as printed by `parse` for command-set files.
#[derive(Debug, Serialize)]
struct BoundCommand<'a> {
    command: &'a str,
    args: &'a CallArgs,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Usage(args) => run_usage(args),
        Command::Validate(args) => run_validate(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn load(path: &Path, program: Option<&str>) -> Result<Loaded, String> {
    let mut loader = Loader::new();
    if let Some(program) = program {
        loader = loader.with_program_name(program);
    }
    loader
        .load(path)
        .map_err(|err| format!("Failed to load '{}': {err}", path.display()))
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let mode = if args.uncaught {
        ErrorMode::Uncaught
    } else {
        ErrorMode::Caught
    };
    debug!(schema = %args.schema.display(), tokens = args.tokens.len(), "Binding tokens");

    match load(&args.schema, args.program.as_deref())? {
        Loaded::Schema(schema) => {
            let driver = Driver::new(schema).with_mode(mode);
            match driver.run(&args.tokens).map_err(|err| err.to_string())? {
                Invocation::Call(call) => print_output(&call, args.format),
                Invocation::Exit {
                    code,
                    stdout,
                    stderr,
                } => exit_with(code, &stdout, &stderr),
            }
        }
        Loaded::Commands(commands) => {
            let driver = CommandDriver::new(commands).with_mode(mode);
            match driver.run(&args.tokens).map_err(|err| err.to_string())? {
                Invocation::Call((command, call)) => print_output(
                    &BoundCommand {
                        command: &command,
                        args: &call,
                    },
                    args.format,
                ),
                Invocation::Exit {
                    code,
                    stdout,
                    stderr,
                } => exit_with(code, &stdout, &stderr),
            }
        }
    }
}

fn run_usage(args: UsageArgs) -> Result<(), String> {
    let program = args.program.as_deref().unwrap_or_default();
    let text = match load(&args.schema, args.program.as_deref())? {
        Loaded::Schema(schema) => argbind_core::help_text(&schema, program),
        Loaded::Commands(commands) => commands.help_text(program),
    };
    print!("{text}");
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let mut schemas = 0;
    let mut commands = 0;
    for path in &args.inputs {
        match load(path, None)? {
            Loaded::Schema(_) => schemas += 1,
            Loaded::Commands(set) => commands += set.commands().count(),
        }
    }
    println!(
        "Validated {} declaration file(s): {schemas} schema(s), {commands} command(s).",
        args.inputs.len()
    );
    Ok(())
}

fn print_output<T: Serialize>(value: &T, format: CliOutputFormat) -> Result<(), String> {
    let raw = match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|err| format!("Failed to serialize arguments: {err}"))?,
        CliOutputFormat::Yaml => serde_yaml::to_string(value)
            .map_err(|err| format!("Failed to serialize arguments: {err}"))?,
    };
    println!("{}", raw.trim_end());
    Ok(())
}

/// Prints a driver exit report. A zero code returns normally.
fn exit_with(code: i32, stdout: &str, stderr: &str) -> Result<(), String> {
    print!("{stdout}");
    eprint!("{stderr}");
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
