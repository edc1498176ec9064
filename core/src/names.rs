//! Short-name resolution.
//!
//! Short names are assigned once, while a schema is composed, so that no
//! two options in the flattened namespace of a schema and its composed
//! children share a letter:
//!
//! 1. option names of length one are reserved and block that letter;
//! 2. explicit hints are honored in declaration order, a hint whose letter
//!    is already claimed is dropped;
//! 3. the remaining options take their first letter if it is still free.
//!
//! The set of claimed letters is an explicit [`ShortNames`] value that is
//! passed into child composition and handed back, never shared behind a
//! reference.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::error::ConfigError;
use crate::registry::ValueRegistry;
use crate::types::{ArgName, ArgSpec};

/// Letters already used as short option names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortNames {
    claimed: BTreeSet<char>,
}

impl ShortNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, letter: char) -> bool {
        self.claimed.contains(&letter)
    }

    /// Claims a letter; returns `false` if it was already taken.
    pub fn claim(&mut self, letter: char) -> bool {
        self.claimed.insert(letter)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.claimed.iter().copied()
    }
}

/// Collects the option names of `fields` and, when recursing, of every
/// composed record, checking reserved and duplicate names.
pub(crate) fn collect_names(
    fields: &[ArgSpec],
    obj: &str,
    recurse: bool,
    kw_only: bool,
    registry: &ValueRegistry,
) -> Result<Vec<String>, ConfigError> {
    let mut used = Vec::new();
    for field in fields {
        if field.name == "help" {
            return Err(ConfigError::ReservedName {
                obj: obj.to_string(),
            });
        }

        let element = field.ty.nary_element().unwrap_or(&field.ty);
        if registry.is_parsable(element) {
            if field.kind.is_keyword(kw_only) {
                push_unique(&mut used, field.option_name(), obj)?;
            }
        } else if recurse && !field.kind.is_variadic() {
            if let Some(record) = element.as_record() {
                for child in collect_names(&record.fields, &record.name, true, true, registry)? {
                    push_unique(&mut used, child, obj)?;
                }
            }
        }
    }
    Ok(used)
}

fn push_unique(used: &mut Vec<String>, name: String, obj: &str) -> Result<(), ConfigError> {
    if used.contains(&name) {
        return Err(ConfigError::DuplicateName {
            name,
            obj: obj.to_string(),
        });
    }
    used.push(name);
    Ok(())
}

/// Reserves single-letter option names and honors explicit hints.
///
/// Returns the updated claimed set and the hints that survived, keyed by
/// parameter name.
pub(crate) fn reserve_short_names(
    fields: &[ArgSpec],
    namespace: &[String],
    mut claimed: ShortNames,
    kw_only: bool,
) -> (ShortNames, HashMap<String, char>) {
    for name in namespace {
        let mut chars = name.chars();
        if let (Some(letter), None) = (chars.next(), chars.next()) {
            claimed.claim(letter);
        }
    }

    let mut honored = HashMap::new();
    for field in fields {
        if !field.kind.is_keyword(kw_only) {
            continue;
        }
        let Some(hint) = field.short_hint else {
            continue;
        };
        if claimed.claim(hint) {
            honored.insert(field.name.clone(), hint);
        } else {
            debug!(param = %field.name, short = %hint, "Dropping short-name hint already in use");
        }
    }

    (claimed, honored)
}

/// Builds the name of one parameter, claiming an automatic short name when
/// its first letter is still free.
pub(crate) fn make_name(
    option_name: &str,
    named: bool,
    hint: Option<char>,
    claimed: &mut ShortNames,
) -> ArgName {
    if named {
        let mut chars = option_name.chars();
        let first = chars.next();
        if let (Some(letter), None) = (first, chars.next()) {
            return ArgName::short(letter);
        }
        if let Some(hint) = hint {
            return ArgName::both(hint, option_name);
        }
        if let Some(letter) = first.filter(|c| c.is_alphanumeric()) {
            if claimed.claim(letter) {
                return ArgName::both(letter, option_name);
            }
        }
    }
    ArgName::long(option_name)
}
