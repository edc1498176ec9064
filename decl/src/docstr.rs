//! Doc-comment parsing.
//!
//! A declaration's `doc` text supplies the brief shown in help output and,
//! in its parameter section, per-parameter help and short-name hints:
//!
//! ```text
//! Throw dice according to the configuration.
//!
//! Args:
//!     cfg: The configuration for the dice.
//!     count [k]: The number of dice
//!         to throw.
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

const BRIEF_ENDERS: [&str; 6] = [
    "Args:",
    "Arguments:",
    "Returns:",
    "Yields:",
    "Raises:",
    "Attributes:",
];

/// `name annotation: description`, annotation optional.
static PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+?)(?:\s+(.*?))?:(.*)$").expect("static regex must compile"));

/// A standalone `[k]` token.
static SHORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)\[(\S)\](?:\s|$)").expect("static regex must compile"));

/// Which parameter-section header applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    /// `Args:` / `Arguments:`
    Function,
    /// `Attributes:`
    Record,
}

impl DocKind {
    fn headers(self) -> &'static [&'static str] {
        match self {
            Self::Function => &["Args:", "Arguments:"],
            Self::Record => &["Attributes:"],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamHelp {
    pub desc: String,
    pub short: Option<char>,
}

/// Parsed doc comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComment {
    pub brief: String,
    pub params: HashMap<String, ParamHelp>,
}

/// Parses the brief and the parameter section of `doc`.
///
/// # Examples
///
/// ```
/// use argbind_decl::{parse_doc, DocKind};
///
/// let doc = parse_doc("Greet someone.\n\nArgs:\n    name: Who.\n    count [k]: How often.\n", DocKind::Function);
/// assert_eq!(doc.brief, "Greet someone.");
/// assert_eq!(doc.params["name"].desc, "Who.");
/// assert_eq!(doc.params["count"].short, Some('k'));
/// ```
pub fn parse_doc(doc: &str, kind: DocKind) -> DocComment {
    let lines: Vec<&str> = doc.lines().collect();

    let brief: Vec<&str> = lines
        .iter()
        .take_while(|line| !BRIEF_ENDERS.contains(&line.trim()))
        .map(|line| line.trim_end())
        .collect();
    let brief = brief.join("\n").trim().to_string();

    let Some(header) = lines
        .iter()
        .position(|line| kind.headers().contains(&line.trim()))
    else {
        return DocComment {
            brief,
            params: HashMap::new(),
        };
    };

    // The section runs until the first empty or non-indented line.
    let section: Vec<&str> = lines[header + 1..]
        .iter()
        .take_while(|line| line.starts_with([' ', '\t']) && !line.trim().is_empty())
        .copied()
        .collect();

    DocComment {
        brief,
        params: parse_section(&section),
    }
}

fn parse_section(section: &[&str]) -> HashMap<String, ParamHelp> {
    let base = section
        .iter()
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut merged: Vec<String> = Vec::new();
    for line in section {
        let indent = line.len() - line.trim_start().len();
        if indent > base {
            // Continuation of the previous entry.
            let Some(last) = merged.last_mut() else {
                return HashMap::new();
            };
            last.push(' ');
            last.push_str(line.trim());
        } else {
            merged.push(line.trim().to_string());
        }
    }

    let mut params = HashMap::new();
    for line in merged {
        let Some(caps) = PARAM_RE.captures(&line) else {
            continue;
        };
        let annotation = caps.get(2).map_or("", |m| m.as_str().trim());
        let short = SHORT_RE
            .captures(annotation)
            .and_then(|c| c[1].chars().next());
        params.insert(
            caps[1].trim().to_string(),
            ParamHelp {
                desc: caps[3].trim().to_string(),
                short,
            },
        );
    }
    params
}
