//! wend_script: parser for "stringproc" transition snippets.
//!
//! A wayto table maps target node ids to transition text. Text beginning
//! with the [`SCRIPT_MARKER`] is a stringproc: a semicolon-separated
//! sequence of automation commands in the host client's scripting idiom.
//! This crate turns one snippet into a closed set of structured [`Action`]s,
//! parsed once at load time:
//!
//! - `true`
//! - `fput 'go gate'` / `fput("go gate")` / `move 'northeast'`
//! - `multifput 'ask guide about travel 2','ask guide about travel 2'`
//! - `waitfor 'A crew member escorts you off the ship.'`
//! - `sleep 0.5`
//! - `waitrt?`
//! - `fput CMD if dothistimeout(CMD, 25, /pattern/) =~ /refinement/`
//! - `2.times{ ... }`
//! - `Map[7].wayto['3668'].call`
//! - `UserVars.mapdb_origin = 28908`
//!
//! Simple local assignments (`table = "ghost"`) are recorded while parsing
//! and folded into later `#{table}` interpolations in double-quoted
//! strings. Anything outside this set is rejected with
//! [`ScriptError::Unsupported`] rather than interpreted at run time.

mod parser;
pub use parser::{ScriptError, parse_script};

use std::fmt;

use regex::Regex;

/// Marker prefix distinguishing a stringproc from a plain direction token.
pub const SCRIPT_MARKER: &str = ";e";

/// One primitive step of a stringproc.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Placeholder that always succeeds (`true`); seen on edges the host
    /// client treats as already handled, e.g. urchin-guide teleports.
    NoOp,
    /// Emit one command line to the game session.
    Send(String),
    /// Emit a fixed ordered list of command lines; the retry-style prompt idiom.
    MultiSend(Vec<String>),
    /// Block until incoming text matches, or until the bound elapses.
    /// Without a bound this waits indefinitely.
    WaitFor {
        pattern: Pattern,
        timeout_secs: Option<f64>,
    },
    /// Cooperative pause for a fixed duration.
    Sleep { seconds: f64 },
    /// Block until the session's action delay (roundtime) clears.
    WaitRoundtime,
    /// Send `command` only when a bounded wait for `pattern` comes up
    /// empty; the send is skipped when the desired state is already
    /// reported by the session.
    Conditional {
        command: String,
        timeout_secs: f64,
        pattern: Pattern,
    },
    /// Run the nested body a fixed number of times.
    Repeat { count: u32, body: Vec<Action> },
    /// Invoke another origin's wayto entry through the registry.
    CrossCall { map: String, target: String },
    /// Write into the session's persistent key/value store.
    SetVar { key: String, value: String },
}

/// Text pattern awaited by [`Action::WaitFor`] and [`Action::Conditional`].
///
/// `waitfor` arguments match as literal substrings; `/…/` literals compile
/// to regular expressions once, at parse time. Equality compares source
/// text, so re-parsing the same snippet yields structurally equal actions.
#[derive(Debug, Clone)]
pub enum Pattern {
    Literal(String),
    Regex { source: String, compiled: Regex },
}

impl Pattern {
    pub fn literal(text: impl Into<String>) -> Self {
        Pattern::Literal(text.into())
    }

    /// Compile a regex pattern from its source text.
    ///
    /// # Errors
    /// Returns the underlying error if the source is not a valid regex.
    pub fn regex(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        let compiled = Regex::new(&source)?;
        Ok(Pattern::Regex { source, compiled })
    }

    /// True when `text` satisfies the pattern.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Pattern::Literal(lit) => text.contains(lit),
            Pattern::Regex { compiled, .. } => compiled.is_match(text),
        }
    }

    /// Source text of the pattern, without delimiters.
    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Literal(lit) => lit,
            Pattern::Regex { source, .. } => source,
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Pattern::Literal(a), Pattern::Literal(b)) => a == b,
            (Pattern::Regex { source: a, .. }, Pattern::Regex { source: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(lit) => write!(f, "'{lit}'"),
            Pattern::Regex { source, .. } => write!(f, "/{source}/"),
        }
    }
}
