//! Transition classification: direction tokens vs stringproc scripts.
//!
//! Wayto entries are free text. Text beginning with the `;e` marker parses
//! into a structured action sequence once, at load time; everything else
//! is a movement token kept verbatim, whether a compass word or a custom
//! command like "go ladder".

use std::fmt;

use wend_script::{Action, SCRIPT_MARKER, ScriptError, parse_script};

/// Compass and relative movement tokens with fixed spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compass {
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
    Up,
    Down,
    Out,
}

impl Compass {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "north" => Some(Compass::North),
            "northeast" => Some(Compass::Northeast),
            "east" => Some(Compass::East),
            "southeast" => Some(Compass::Southeast),
            "south" => Some(Compass::South),
            "southwest" => Some(Compass::Southwest),
            "west" => Some(Compass::West),
            "northwest" => Some(Compass::Northwest),
            "up" => Some(Compass::Up),
            "down" => Some(Compass::Down),
            "out" => Some(Compass::Out),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Compass::North => "north",
            Compass::Northeast => "northeast",
            Compass::East => "east",
            Compass::Southeast => "southeast",
            Compass::South => "south",
            Compass::Southwest => "southwest",
            Compass::West => "west",
            Compass::Northwest => "northwest",
            Compass::Up => "up",
            Compass::Down => "down",
            Compass::Out => "out",
        }
    }
}

/// A movement token. Compass words get the enumerated form; anything else
/// ("go ladder", "go arch") is carried verbatim as a custom token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Direction {
    Compass(Compass),
    Custom(String),
}

impl Direction {
    pub fn from_token(token: &str) -> Self {
        match Compass::from_token(token) {
            Some(compass) => Direction::Compass(compass),
            None => Direction::Custom(token.to_string()),
        }
    }

    /// The token exactly as registered.
    pub fn as_str(&self) -> &str {
        match self {
            Direction::Compass(compass) => compass.as_str(),
            Direction::Custom(token) => token,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed stringproc: the action sequence plus the source text it came
/// from, kept for reporting and round-tripping.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    raw: String,
    actions: Vec<Action>,
}

impl Script {
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// The registered text, marker included.
    pub fn source(&self) -> &str {
        &self.raw
    }
}

/// What a wayto entry requires to traverse its edge.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Direction(Direction),
    Script(Script),
}

impl Transition {
    /// Classify transition text: `;e`-marked text parses as a stringproc,
    /// anything else is a direction token kept verbatim.
    ///
    /// # Errors
    /// Returns a [`ScriptError`] when a marked snippet fails to parse.
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        if let Some(body) = text.trim_start().strip_prefix(SCRIPT_MARKER) {
            let actions = parse_script(body)?;
            Ok(Transition::Script(Script {
                raw: text.to_string(),
                actions,
            }))
        } else {
            Ok(Transition::Direction(Direction::from_token(text)))
        }
    }

    pub fn as_direction(&self) -> Option<&Direction> {
        match self {
            Transition::Direction(direction) => Some(direction),
            Transition::Script(_) => None,
        }
    }

    pub fn as_script(&self) -> Option<&Script> {
        match self {
            Transition::Script(script) => Some(script),
            Transition::Direction(_) => None,
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(self, Transition::Script(_))
    }

    /// The transition text exactly as registered.
    pub fn text(&self) -> &str {
        match self {
            Transition::Direction(direction) => direction.as_str(),
            Transition::Script(script) => script.source(),
        }
    }
}
