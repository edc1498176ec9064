//! Token matching.
//!
//! The engine walks the token list once with two cursors (the token index
//! and the next unfilled positional slot) and records what it binds in a
//! [`Bindings`] table created fresh for every parse. Record parameters are
//! bound first: each child schema matches the tokens it recognizes and
//! hands the rest, in order, back to its parent. A record parameter with a
//! default that its child scope cannot bind takes that default and leaves
//! the token list untouched.

use tracing::{debug, trace};

use crate::binder;
use crate::error::{OptionError, ParseError};
use crate::schema::Schema;
use crate::types::Value;

/// Per-parse state of one descriptor.
#[derive(Debug, Clone, Default)]
pub(crate) struct Slot {
    pub bound: bool,
    pub value: Value,
}

/// Values captured for an option that the schema does not declare.
#[derive(Debug, Clone)]
pub(crate) struct Capture {
    pub name: String,
    pub values: Vec<Value>,
}

/// Binding table for one parse, indexed like `Schema::descriptors`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Bindings {
    pub slots: Vec<Slot>,
    pub var_args: Vec<Value>,
    /// Raw tokens that went to var-args, handed back to the parent scope.
    pub leftover: Vec<String>,
    pub captures: Vec<Capture>,
}

impl Bindings {
    fn new(len: usize) -> Self {
        Self {
            slots: vec![Slot::default(); len],
            ..Default::default()
        }
    }

    fn bind(&mut self, idx: usize, value: Value, nary: bool) {
        let slot = &mut self.slots[idx];
        if nary {
            match &mut slot.value {
                Value::List(items) if slot.bound => items.push(value),
                _ => slot.value = Value::List(vec![value]),
            }
        } else {
            slot.value = value;
        }
        slot.bound = true;
    }
}

pub(crate) enum Step {
    Bound(Bindings),
    Help,
}

/// Returns the option name if `token` looks like one (`--name`, `-n`).
///
/// A bare `-` or `--` is a format error; there is no end-of-options marker.
pub(crate) fn option_name(token: &str) -> Result<Option<&str>, OptionError> {
    if let Some(name) = token.strip_prefix("--") {
        if name.is_empty() {
            return Err(OptionError::BarePrefix("--"));
        }
        return Ok(Some(name));
    }
    if let Some(name) = token.strip_prefix('-') {
        if name.is_empty() {
            return Err(OptionError::BarePrefix("-"));
        }
        return Ok(Some(name));
    }
    Ok(None)
}

/// Binds `tokens` against `schema`, composing record parameters first.
pub(crate) fn bind_tokens(schema: &Schema, tokens: Vec<String>) -> Result<Step, ParseError> {
    let mut bindings = Bindings::new(schema.descriptors.len());
    let mut tokens = tokens;

    for (idx, descriptor) in schema.descriptors.iter().enumerate() {
        let Some(child) = &descriptor.child else {
            continue;
        };
        match bind_tokens(child, tokens.clone()) {
            Ok(Step::Help) => return Ok(Step::Help),
            // An optional record falls back to its default; its tokens stay
            // with the parent, which may then reject them.
            Err(ParseError::Option(err)) if !descriptor.required => {
                debug!(
                    schema = %schema.name,
                    param = %descriptor.param,
                    error = %err,
                    "Record parameter falls back to its default"
                );
                bindings.slots[idx] = Slot {
                    bound: true,
                    value: descriptor.default.clone(),
                };
            }
            Err(err) => return Err(err),
            Ok(Step::Bound(mut child_bindings)) => {
                tokens = std::mem::take(&mut child_bindings.leftover);
                debug!(
                    schema = %schema.name,
                    param = %descriptor.param,
                    remaining = tokens.len(),
                    "Bound record parameter"
                );
                let composite = binder::assemble_record(child, child_bindings);
                bindings.slots[idx] = Slot {
                    bound: true,
                    value: composite,
                };
            }
        }
    }

    Matcher {
        schema,
        tokens,
        idx: 0,
        positional_idx: 0,
        bindings,
    }
    .run()
}

/// Where a named token is routed.
enum Target {
    Declared(usize),
    Captured(usize),
    VarArgs,
}

enum Flow {
    Continue,
    Help,
}

struct Matcher<'s> {
    schema: &'s Schema,
    tokens: Vec<String>,
    idx: usize,
    positional_idx: usize,
    bindings: Bindings,
}

impl Matcher<'_> {
    fn run(mut self) -> Result<Step, ParseError> {
        while self.idx < self.tokens.len() {
            let token = self.tokens[self.idx].clone();
            match option_name(&token)? {
                Some(name) => {
                    if let Flow::Help = self.match_named(name)? {
                        return Ok(Step::Help);
                    }
                }
                None => self.match_positional()?,
            }
        }
        self.finalize()?;
        Ok(Step::Bound(self.bindings))
    }

    fn match_named(&mut self, name: &str) -> Result<Flow, ParseError> {
        if name == "help" || name == "?" {
            return Ok(Flow::Help);
        }
        if let Some((name, value)) = name.split_once('=') {
            self.match_equals(name, value)?;
            return Ok(Flow::Continue);
        }

        let target = match self.resolve(name)? {
            Target::VarArgs => {
                self.push_var_args()?;
                return Ok(Flow::Continue);
            }
            target => target,
        };
        let facts = self.facts(&target);
        trace!(option = %facts.label, nary = facts.is_nary, "Matching option");

        if facts.bound && !facts.is_nary {
            return Err(OptionError::MultiplyGiven(facts.label).into());
        }

        if facts.is_flag {
            if let Target::Declared(idx) = target {
                self.bindings.bind(idx, Value::Bool(true), false);
            }
            self.idx += 1;
            return Ok(Flow::Continue);
        }

        if facts.is_nary {
            self.idx += 1;
            let values = self.take_values()?;
            if values.is_empty() {
                return Err(OptionError::MissingValue(facts.label).into());
            }
            for value in &values {
                self.accept(&target, value)?;
            }
            return Ok(Flow::Continue);
        }

        let Some(value) = self.tokens.get(self.idx + 1).cloned() else {
            return Err(OptionError::MissingValue(facts.label).into());
        };
        self.accept(&target, &value)?;
        self.idx += 2;
        Ok(Flow::Continue)
    }

    /// `--name=value` / `-n=value`: exactly one value, never for a flag.
    fn match_equals(&mut self, name: &str, value: &str) -> Result<(), ParseError> {
        let target = match self.resolve(name)? {
            Target::VarArgs => return self.push_var_args(),
            target => target,
        };
        let facts = self.facts(&target);

        if facts.bound && !facts.is_nary {
            return Err(OptionError::MultiplyGiven(facts.label).into());
        }
        if facts.is_flag {
            return Err(OptionError::FlagWithValue(facts.label).into());
        }
        self.accept(&target, value)?;
        self.idx += 1;
        Ok(())
    }

    fn match_positional(&mut self) -> Result<(), ParseError> {
        let schema = self.schema;

        // Slots that are also named may already be bound.
        while self.positional_idx < schema.positional.len()
            && self.bindings.slots[schema.positional[self.positional_idx]].bound
        {
            self.positional_idx += 1;
        }

        if self.positional_idx >= schema.positional.len() {
            if schema.var_args.is_some() {
                return self.push_var_args();
            }
            let token = self.tokens[self.idx].clone();
            return Err(OptionError::UnexpectedPositional(token).into());
        }

        let idx = schema.positional[self.positional_idx];
        let descriptor = &schema.descriptors[idx];
        if descriptor.is_nary {
            // Greedy: two adjacent n-ary positionals resolve first-wins.
            let values = self.take_values()?;
            for value in &values {
                self.accept(&Target::Declared(idx), value)?;
            }
        } else {
            let value = self.tokens[self.idx].clone();
            self.accept(&Target::Declared(idx), &value)?;
            self.idx += 1;
        }
        self.positional_idx += 1;
        Ok(())
    }

    /// Consumes tokens up to the next option-looking token.
    fn take_values(&mut self) -> Result<Vec<String>, OptionError> {
        let mut values = Vec::new();
        while let Some(token) = self.tokens.get(self.idx) {
            if option_name(token)?.is_some() {
                break;
            }
            values.push(token.clone());
            self.idx += 1;
        }
        Ok(values)
    }

    fn resolve(&mut self, name: &str) -> Result<Target, OptionError> {
        let schema = self.schema;
        if let Some(&idx) = schema.names.get(name) {
            return Ok(Target::Declared(idx));
        }
        if let Some(pos) = self.bindings.captures.iter().position(|c| c.name == name) {
            return Ok(Target::Captured(pos));
        }
        if schema.var_kwargs.is_some() {
            debug!(schema = %schema.name, option = %name, "Capturing unknown option");
            self.bindings.captures.push(Capture {
                name: name.to_string(),
                values: Vec::new(),
            });
            return Ok(Target::Captured(self.bindings.captures.len() - 1));
        }
        if schema.var_args.is_some() {
            return Ok(Target::VarArgs);
        }
        Err(OptionError::UnexpectedOption(name.to_string()))
    }

    fn facts(&self, target: &Target) -> OptionFacts {
        let schema = self.schema;
        match target {
            Target::Declared(idx) => {
                let descriptor = &schema.descriptors[*idx];
                OptionFacts {
                    label: descriptor.name.to_string(),
                    is_flag: descriptor.is_flag(),
                    is_nary: descriptor.is_nary,
                    bound: self.bindings.slots[*idx].bound,
                }
            }
            Target::Captured(pos) => {
                let capture = &self.bindings.captures[*pos];
                OptionFacts {
                    label: capture.name.clone(),
                    is_flag: false,
                    is_nary: schema.var_kwargs.as_ref().is_some_and(|d| d.is_nary),
                    bound: !capture.values.is_empty(),
                }
            }
            Target::VarArgs => OptionFacts::default(),
        }
    }

    /// Converts and stores one value for a declared or captured option.
    fn accept(&mut self, target: &Target, raw: &str) -> Result<(), ParseError> {
        let schema = self.schema;
        match target {
            Target::Declared(idx) => {
                let descriptor = &schema.descriptors[*idx];
                let value = schema.registry.convert(&descriptor.ty, raw)?;
                self.bindings.bind(*idx, value, descriptor.is_nary);
            }
            Target::Captured(pos) => {
                if let Some(kwargs) = &schema.var_kwargs {
                    let value = schema.registry.convert(&kwargs.ty, raw)?;
                    self.bindings.captures[*pos].values.push(value);
                }
            }
            Target::VarArgs => {}
        }
        Ok(())
    }

    /// Routes the current token, verbatim, to the var-args slot.
    fn push_var_args(&mut self) -> Result<(), ParseError> {
        let schema = self.schema;
        let token = self.tokens[self.idx].clone();
        if let Some(var_args) = &schema.var_args {
            let value = schema.registry.convert(&var_args.ty, &token)?;
            trace!(schema = %schema.name, token = %token, "Routing token to var-args");
            self.bindings.var_args.push(value);
            self.bindings.leftover.push(token);
        }
        self.idx += 1;
        Ok(())
    }

    /// Checks required descriptors and fills in defaults.
    fn finalize(&mut self) -> Result<(), OptionError> {
        let schema = self.schema;
        for &idx in schema.positional.iter().chain(schema.named.iter()) {
            if self.bindings.slots[idx].bound {
                continue;
            }
            let descriptor = &schema.descriptors[idx];
            if descriptor.required {
                return Err(if descriptor.is_named {
                    OptionError::RequiredOption(descriptor.name.to_string())
                } else {
                    OptionError::RequiredPositional(descriptor.name.to_string())
                });
            }
            self.bindings.slots[idx] = Slot {
                bound: true,
                value: descriptor.default.clone(),
            };
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct OptionFacts {
    label: String,
    is_flag: bool,
    is_nary: bool,
    bound: bool,
}
