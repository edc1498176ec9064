//! Process-level exit contract.
//!
//! The driver turns a parse into either the call arguments or an exit
//! report (code plus the text to print). It never exits the process; the
//! binary that embeds it does.

use tracing::debug;

use crate::binder::CallArgs;
use crate::commands::{CommandOutcome, CommandSet};
use crate::error::{Error, ParseError};
use crate::schema::{Outcome, Schema, SchemaBuilder};
use crate::usage;

const HELP_HINT: &str = "For more information, run with -?|--help.";

/// How parse errors are surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Reported as an [`Invocation::Exit`] with code 1.
    #[default]
    Caught,
    /// Returned as `Err`.
    Uncaught,
}

/// What the caller should do after a parse.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation<T = CallArgs> {
    /// Invoke the target with these arguments.
    Call(T),
    /// Print `stdout`/`stderr` and exit with `code`.
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },
}

impl<T> Invocation<T> {
    fn help(text: String) -> Self {
        Self::Exit {
            code: 0,
            stdout: text,
            stderr: String::new(),
        }
    }

    fn failure(err: &ParseError, usage: &str) -> Self {
        Self::Exit {
            code: 1,
            stdout: String::new(),
            stderr: format!("Error: {err}\n\n{usage}\n\n{HELP_HINT}\n"),
        }
    }
}

/// Runs a single schema.
///
/// # Examples
///
/// ```
/// use argbind_core::{ArgSpec, Driver, Invocation, Schema, TypeDescriptor};
///
/// let schema = Schema::builder("greet")
///     .arg(ArgSpec::positional("name", TypeDescriptor::string()))
///     .build()
///     .unwrap();
/// let driver = Driver::new(schema).with_program_name("greet");
///
/// let Invocation::Exit { code, stderr, .. } = driver.run(Vec::<String>::new()).unwrap() else {
///     unreachable!()
/// };
/// assert_eq!(code, 1);
/// assert!(stderr.starts_with("Error: Required positional argument <name> is not provided!"));
/// ```
#[derive(Debug, Clone)]
pub struct Driver {
    schema: Schema,
    program_name: String,
    mode: ErrorMode,
}

impl Driver {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            program_name: String::new(),
            mode: ErrorMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ErrorMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_program_name(mut self, program_name: &str) -> Self {
        self.program_name = program_name.to_string();
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Parses `tokens` and reports the outcome.
    ///
    /// # Errors
    ///
    /// In [`ErrorMode::Uncaught`], the parse error.
    pub fn run<I, S>(&self, tokens: I) -> Result<Invocation, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match self.schema.parse(tokens) {
            Ok(Outcome::Bound(args)) => Ok(Invocation::Call(args)),
            Ok(Outcome::Help) => Ok(Invocation::help(usage::help_text(
                &self.schema,
                &self.program_name,
            ))),
            Err(err) if self.mode == ErrorMode::Caught => {
                debug!(schema = %self.schema.name(), error = %err, "Parse failed");
                let usage = usage::usage_line(&self.schema, &self.program_name);
                Ok(Invocation::failure(&err, &usage))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Runs a [`CommandSet`].
#[derive(Debug, Clone)]
pub struct CommandDriver {
    commands: CommandSet,
    program_name: String,
    mode: ErrorMode,
}

impl CommandDriver {
    pub fn new(commands: CommandSet) -> Self {
        Self {
            commands,
            program_name: String::new(),
            mode: ErrorMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ErrorMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_program_name(mut self, program_name: &str) -> Self {
        self.program_name = program_name.to_string();
        self
    }

    /// Parses `tokens` and reports the selected command with its arguments.
    ///
    /// # Errors
    ///
    /// In [`ErrorMode::Uncaught`], the parse error.
    pub fn run<I, S>(&self, tokens: I) -> Result<Invocation<(String, CallArgs)>, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(|t| t.as_ref().to_string()).collect();
        match self.commands.parse(&tokens) {
            Ok(CommandOutcome::Bound { command, args }) => Ok(Invocation::Call((command, args))),
            Ok(CommandOutcome::Help { command: None }) => {
                Ok(Invocation::help(self.commands.help_text(&self.program_name)))
            }
            Ok(CommandOutcome::Help {
                command: Some(command),
            }) => Ok(Invocation::help(self.command_help(&command))),
            Err(err) if self.mode == ErrorMode::Caught => {
                debug!(error = %err, "Command parse failed");
                let usage = self.usage_for(tokens.first());
                Ok(Invocation::failure(&err, &usage))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn command_program(&self, command: &str) -> String {
        let program = if self.program_name.is_empty() {
            self.commands.program_name()
        } else {
            &self.program_name
        };
        format!("{program} {command}").trim().to_string()
    }

    fn command_help(&self, command: &str) -> String {
        match self.commands.get(command) {
            Some(schema) => usage::help_text(schema, &self.command_program(command)),
            None => self.commands.help_text(&self.program_name),
        }
    }

    /// Usage of the selected command if the first token names one, else of
    /// the whole set.
    fn usage_for(&self, first: Option<&String>) -> String {
        match first.and_then(|cmd| self.commands.get(cmd).map(|schema| (cmd, schema))) {
            Some((cmd, schema)) => usage::usage_line(schema, &self.command_program(cmd)),
            None => self.commands.usage_line(&self.program_name),
        }
    }
}

/// Builds the schema and runs it against `tokens`.
///
/// # Errors
///
/// A [`ConfigError`](crate::ConfigError) from building is always returned as
/// `Err`; parse errors only in [`ErrorMode::Uncaught`].
pub fn start<I, S>(builder: SchemaBuilder, tokens: I, mode: ErrorMode) -> Result<Invocation, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let schema = builder.build()?;
    let program = schema.program_name().to_string();
    Driver::new(schema)
        .with_mode(mode)
        .with_program_name(&program)
        .run(tokens)
}
