//! Subcommand dispatch.
//!
//! A [`CommandSet`] pairs command names with schemas; the first token picks
//! the schema and the remaining tokens are bound against it.

use serde::Serialize;
use tracing::debug;

use crate::binder::CallArgs;
use crate::error::{ConfigError, OptionError, ParseError};
use crate::schema::{Outcome, Schema};

/// Result of parsing against a [`CommandSet`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    Bound { command: String, args: CallArgs },
    /// Help was requested, for the whole set (`command: None`) or for one
    /// command.
    Help { command: Option<String> },
}

/// An ordered collection of named schemas.
///
/// # Examples
///
/// ```
/// use argbind_core::{ArgSpec, CommandOutcome, CommandSet, Schema, TypeDescriptor, Value};
///
/// let add = Schema::builder("add")
///     .brief("Add numbers.")
///     .arg(ArgSpec::var_args("n", TypeDescriptor::int()))
///     .build()
///     .unwrap();
/// let commands = CommandSet::new("Calculator.").with_command("add", add).unwrap();
///
/// let CommandOutcome::Bound { command, args } = commands.parse(["add", "1", "2"]).unwrap() else {
///     unreachable!()
/// };
/// assert_eq!(command, "add");
/// assert_eq!(args.positional, vec![Value::Int(1), Value::Int(2)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandSet {
    brief: String,
    program_name: String,
    commands: Vec<(String, Schema)>,
}

impl CommandSet {
    pub fn new(brief: &str) -> Self {
        Self {
            brief: brief.to_string(),
            ..Default::default()
        }
    }

    pub fn with_program_name(mut self, program_name: &str) -> Self {
        self.program_name = program_name.to_string();
        self
    }

    /// Adds a command.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateCommand`] if the name is taken.
    pub fn add(&mut self, name: &str, schema: Schema) -> Result<(), ConfigError> {
        if self.get(name).is_some() {
            return Err(ConfigError::DuplicateCommand(name.to_string()));
        }
        self.commands.push((name.to_string(), schema));
        Ok(())
    }

    pub fn with_command(mut self, name: &str, schema: Schema) -> Result<Self, ConfigError> {
        self.add(name, schema)?;
        Ok(self)
    }

    pub fn brief(&self) -> &str {
        &self.brief
    }

    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.commands
            .iter()
            .find(|(cmd, _)| cmd == name)
            .map(|(_, schema)| schema)
    }

    pub fn commands(&self) -> impl Iterator<Item = (&str, &Schema)> + '_ {
        self.commands.iter().map(|(cmd, schema)| (cmd.as_str(), schema))
    }

    /// Selects a command by the first token and binds the rest.
    ///
    /// # Errors
    ///
    /// [`OptionError::NoCommand`] for an empty token list,
    /// [`OptionError::UnknownCommand`] for an unknown first token, and any
    /// error the selected schema raises.
    pub fn parse<I, S>(&self, tokens: I) -> Result<CommandOutcome, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(|t| t.as_ref().to_string()).collect();
        let (selected, rest) = self.select(&tokens)?;
        let Some((command, schema)) = selected else {
            return Ok(CommandOutcome::Help { command: None });
        };
        debug!(command = %command, tokens = rest.len(), "Dispatching command");
        let command = command.to_string();
        Ok(match schema.parse(rest)? {
            Outcome::Bound(args) => CommandOutcome::Bound { command, args },
            Outcome::Help => CommandOutcome::Help {
                command: Some(command),
            },
        })
    }

    /// Returns the selected command with its schema, and the remaining
    /// tokens. A leading help token selects nothing.
    fn select<'a>(
        &'a self,
        tokens: &'a [String],
    ) -> Result<(Option<(&'a str, &'a Schema)>, &'a [String]), OptionError> {
        let Some((first, rest)) = tokens.split_first() else {
            return Err(OptionError::NoCommand);
        };
        if first == "-?" || first == "--help" {
            return Ok((None, rest));
        }
        match self.get(first) {
            Some(schema) => Ok((Some((first.as_str(), schema)), rest)),
            None => Err(OptionError::UnknownCommand(first.clone())),
        }
    }

    fn program<'a>(&'a self, program_name: &'a str) -> &'a str {
        if program_name.is_empty() {
            &self.program_name
        } else {
            program_name
        }
    }

    /// The `Usage:` block of the set.
    pub fn usage_line(&self, program_name: &str) -> String {
        format!(
            "Usage:\n  {} <command> <command-specific-args>",
            self.program(program_name)
        )
    }

    /// The command listing: brief, usage and each command's first brief
    /// paragraph.
    pub fn help_text(&self, program_name: &str) -> String {
        let program = self.program(program_name);
        let mut out = String::new();
        if !self.brief.is_empty() {
            out.push_str(&self.brief);
            out.push_str("\n\n");
        }
        out.push_str(&self.usage_line(program_name));
        out.push_str("\n\nCommands:\n");

        let width = self.commands.iter().map(|(cmd, _)| cmd.len()).max().unwrap_or(0);
        for (cmd, schema) in &self.commands {
            let brief = schema.brief().split("\n\n").next().unwrap_or_default();
            let line = format!("  {cmd:<width$}  {brief}");
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out.push_str(&format!(
            "\nRun `{program} <command> --help` to see all command-specific options.\n"
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArgSpec, TypeDescriptor, Value};

    fn calculator() -> CommandSet {
        let add = Schema::builder("add")
            .brief("Add numbers.\n\nAll of them.")
            .arg(ArgSpec::var_args("n", TypeDescriptor::int()))
            .build()
            .unwrap();
        let neg = Schema::builder("neg")
            .brief("Negate a number.")
            .arg(ArgSpec::positional("a", TypeDescriptor::int()))
            .build()
            .unwrap();
        CommandSet::new("A calculator.")
            .with_program_name("calc")
            .with_command("add", add)
            .unwrap()
            .with_command("neg", neg)
            .unwrap()
    }

    #[test]
    fn test_dispatch() {
        let outcome = calculator().parse(["neg", "4"]).unwrap();
        let CommandOutcome::Bound { command, args } = outcome else {
            panic!("expected bound outcome");
        };
        assert_eq!(command, "neg");
        assert_eq!(args.get("a"), Some(&Value::Int(4)));
    }

    #[test]
    fn test_no_command() {
        let err = calculator().parse(Vec::<String>::new()).unwrap_err();
        assert_eq!(err.to_string(), "No command given!");
    }

    #[test]
    fn test_unknown_command() {
        let err = calculator().parse(["mul", "2"]).unwrap_err();
        assert_eq!(err.to_string(), "Unknown command `mul`!");
    }

    #[test]
    fn test_help_tokens() {
        assert_eq!(
            calculator().parse(["--help"]).unwrap(),
            CommandOutcome::Help { command: None }
        );
        assert_eq!(
            calculator().parse(["add", "-?"]).unwrap(),
            CommandOutcome::Help {
                command: Some("add".into())
            }
        );
    }

    #[test]
    fn test_duplicate_command() {
        let schema = Schema::builder("x").build().unwrap();
        let mut commands = CommandSet::new("");
        commands.add("x", schema.clone()).unwrap();
        assert_eq!(
            commands.add("x", schema).unwrap_err(),
            ConfigError::DuplicateCommand("x".into())
        );
    }

    #[test]
    fn test_help_text_lists_first_brief_paragraph() {
        let help = calculator().help_text("");
        assert!(help.starts_with("A calculator.\n\nUsage:\n  calc <command>"));
        assert!(help.contains("  add  Add numbers.\n"));
        assert!(!help.contains("All of them."));
        assert!(help.contains("  neg  Negate a number.\n"));
    }
}
