//! Tokenizer and recursive-descent parser for stringproc snippets.
//!
//! The snippet language is a flat, semicolon-separated command list with
//! two nesting forms (`N.times{…}` blocks and parenthesized call
//! arguments), so the parser works directly over a small token stream.
//! Local assignments are folded into `#{…}` interpolations as statements
//! are consumed; nothing is evaluated after parse time.

use std::collections::HashMap;
use std::fmt;

use crate::{Action, Pattern};

/// Errors that can happen when parsing a stringproc snippet.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    #[error("empty script")]
    Empty,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated regex literal")]
    UnterminatedRegex,
    #[error("invalid regex /{regex}/: {message}")]
    BadRegex { regex: String, message: String },
    #[error("unknown interpolation variable `{0}`")]
    UnknownVar(String),
    #[error("unsupported construct `{0}`")]
    Unsupported(String),
    #[error("expected {expected}, found {found}")]
    Expected { expected: &'static str, found: String },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(String),
    Str { raw: String, interpolates: bool },
    Regex(String),
    Semi,
    Comma,
    Dot,
    Assign,
    MatchOp,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "`{name}`"),
            Token::Number(raw) => write!(f, "`{raw}`"),
            Token::Str { raw, .. } => write!(f, "'{raw}'"),
            Token::Regex(source) => write!(f, "/{source}/"),
            Token::Semi => write!(f, "`;`"),
            Token::Comma => write!(f, "`,`"),
            Token::Dot => write!(f, "`.`"),
            Token::Assign => write!(f, "`=`"),
            Token::MatchOp => write!(f, "`=~`"),
            Token::LParen => write!(f, "`(`"),
            Token::RParen => write!(f, "`)`"),
            Token::LBrace => write!(f, "`{{`"),
            Token::RBrace => write!(f, "`}}`"),
            Token::LBracket => write!(f, "`[`"),
            Token::RBracket => write!(f, "`]`"),
        }
    }
}

fn lex(source: &str) -> Result<Vec<Token>, ScriptError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            ';' => {
                tokens.push(Token::Semi);
                i += 1;
            },
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            },
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            },
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            },
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            },
            '{' => {
                tokens.push(Token::LBrace);
                i += 1;
            },
            '}' => {
                tokens.push(Token::RBrace);
                i += 1;
            },
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            },
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            },
            '=' => {
                if chars.get(i + 1) == Some(&'~') {
                    tokens.push(Token::MatchOp);
                    i += 2;
                } else {
                    tokens.push(Token::Assign);
                    i += 1;
                }
            },
            '\'' | '"' => {
                let quote = c;
                let mut raw = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(ScriptError::UnterminatedString),
                        Some(&ch) if ch == quote => {
                            i += 1;
                            break;
                        },
                        Some(&'\\') => {
                            let Some(&next) = chars.get(i + 1) else {
                                return Err(ScriptError::UnterminatedString);
                            };
                            raw.push('\\');
                            raw.push(next);
                            i += 2;
                        },
                        Some(&ch) => {
                            raw.push(ch);
                            i += 1;
                        },
                    }
                }
                tokens.push(Token::Str {
                    raw,
                    interpolates: quote == '"',
                });
            },
            '/' => {
                let mut source = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(ScriptError::UnterminatedRegex),
                        Some(&'/') => {
                            i += 1;
                            break;
                        },
                        Some(&'\\') => {
                            let Some(&next) = chars.get(i + 1) else {
                                return Err(ScriptError::UnterminatedRegex);
                            };
                            source.push('\\');
                            source.push(next);
                            i += 2;
                        },
                        Some(&ch) => {
                            source.push(ch);
                            i += 1;
                        },
                    }
                }
                tokens.push(Token::Regex(source));
            },
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                // only take a '.' as a decimal point when a digit follows,
                // so `2.times` lexes as number, dot, ident
                if chars.get(i) == Some(&'.') && chars.get(i + 1).is_some_and(char::is_ascii_digit) {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                tokens.push(Token::Number(chars[start..i].iter().collect()));
            },
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let mut name: String = chars[start..i].iter().collect();
                if chars.get(i) == Some(&'?') {
                    name.push('?');
                    i += 1;
                }
                tokens.push(Token::Ident(name));
            },
            other => return Err(ScriptError::Unsupported(format!("character `{other}`"))),
        }
    }
    Ok(tokens)
}

/// Parse one stringproc body (the text after the `;e` marker) into an
/// ordered action sequence.
///
/// # Errors
/// Returns a [`ScriptError`] when the snippet is empty, malformed, or uses
/// a construct outside the supported set.
pub fn parse_script(source: &str) -> Result<Vec<Action>, ScriptError> {
    let tokens = lex(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        locals: HashMap::new(),
    };
    let actions = parser.parse_statements(false)?;
    if actions.is_empty() {
        return Err(ScriptError::Empty);
    }
    Ok(actions)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Local assignments seen so far, folded into later interpolations.
    locals: HashMap<String, String>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn found(token: Option<&Token>) -> String {
        token.map_or_else(|| "end of script".to_string(), ToString::to_string)
    }

    fn expect(&mut self, token: &Token, expected: &'static str) -> Result<(), ScriptError> {
        match self.peek() {
            Some(tok) if tok == token => {
                self.pos += 1;
                Ok(())
            },
            other => Err(ScriptError::Expected {
                expected,
                found: Self::found(other),
            }),
        }
    }

    fn expect_ident(&mut self, name: &str, expected: &'static str) -> Result<(), ScriptError> {
        match self.peek() {
            Some(Token::Ident(found)) if found == name => {
                self.pos += 1;
                Ok(())
            },
            other => Err(ScriptError::Expected {
                expected,
                found: Self::found(other),
            }),
        }
    }

    fn expect_string(&mut self) -> Result<String, ScriptError> {
        match self.next() {
            Some(Token::Str { raw, interpolates }) => self.fold_string(&raw, interpolates),
            other => Err(ScriptError::Expected {
                expected: "string literal",
                found: Self::found(other.as_ref()),
            }),
        }
    }

    fn expect_number(&mut self) -> Result<String, ScriptError> {
        match self.next() {
            Some(Token::Number(raw)) => Ok(raw),
            other => Err(ScriptError::Expected {
                expected: "number",
                found: Self::found(other.as_ref()),
            }),
        }
    }

    fn expect_f64(&mut self) -> Result<f64, ScriptError> {
        let raw = self.expect_number()?;
        raw.parse::<f64>().map_err(|_| ScriptError::Expected {
            expected: "number",
            found: raw,
        })
    }

    fn expect_regex(&mut self) -> Result<Pattern, ScriptError> {
        match self.next() {
            Some(Token::Regex(source)) => Pattern::regex(&source).map_err(|err| ScriptError::BadRegex {
                regex: source,
                message: err.to_string(),
            }),
            other => Err(ScriptError::Expected {
                expected: "regex literal",
                found: Self::found(other.as_ref()),
            }),
        }
    }

    /// Parse a statement sequence; with `until_brace` the closing `}` is
    /// consumed, otherwise the sequence runs to the end of the script.
    fn parse_statements(&mut self, until_brace: bool) -> Result<Vec<Action>, ScriptError> {
        let mut actions = Vec::new();
        loop {
            while matches!(self.peek(), Some(Token::Semi)) {
                self.pos += 1;
            }
            match self.peek() {
                None if until_brace => {
                    return Err(ScriptError::Expected {
                        expected: "`}`",
                        found: Self::found(None),
                    });
                },
                None => break,
                Some(Token::RBrace) if until_brace => {
                    self.pos += 1;
                    break;
                },
                _ => {},
            }
            if let Some(action) = self.parse_statement()? {
                actions.push(action);
            }
            match self.peek() {
                None | Some(Token::Semi) => {},
                Some(Token::RBrace) if until_brace => {},
                other => {
                    return Err(ScriptError::Expected {
                        expected: "`;`",
                        found: Self::found(other),
                    });
                },
            }
        }
        Ok(actions)
    }

    /// Parse one statement; local assignments fold into state and yield no action.
    fn parse_statement(&mut self) -> Result<Option<Action>, ScriptError> {
        match self.peek() {
            Some(Token::Ident(_)) => self.parse_ident_statement(),
            Some(Token::Number(_)) => self.parse_repeat().map(Some),
            other => Err(ScriptError::Expected {
                expected: "statement",
                found: Self::found(other),
            }),
        }
    }

    fn parse_ident_statement(&mut self) -> Result<Option<Action>, ScriptError> {
        let Some(Token::Ident(name)) = self.next() else {
            unreachable!("caller checked for an ident");
        };
        match name.as_str() {
            "true" => Ok(Some(Action::NoOp)),
            "fput" => self.parse_fput().map(Some),
            "move" => {
                let line = self.parse_call_arg()?;
                Ok(Some(Action::Send(line)))
            },
            "multifput" => {
                let mut lines = vec![self.expect_string()?];
                while matches!(self.peek(), Some(Token::Comma)) {
                    self.pos += 1;
                    lines.push(self.expect_string()?);
                }
                Ok(Some(Action::MultiSend(lines)))
            },
            "waitfor" => {
                let text = self.expect_string()?;
                Ok(Some(Action::WaitFor {
                    pattern: Pattern::literal(text),
                    timeout_secs: None,
                }))
            },
            "sleep" => {
                let seconds = self.expect_f64()?;
                Ok(Some(Action::Sleep { seconds }))
            },
            "waitrt?" => Ok(Some(Action::WaitRoundtime)),
            "Map" => self.parse_cross_call().map(Some),
            "UserVars" => self.parse_var_write().map(Some),
            _ => {
                if matches!(self.peek(), Some(Token::Assign)) {
                    self.pos += 1;
                    let value = self.expect_string()?;
                    self.locals.insert(name, value);
                    Ok(None)
                } else {
                    Err(ScriptError::Unsupported(name))
                }
            },
        }
    }

    /// `fput ARG` or `fput(ARG)`, optionally guarded by a
    /// `if dothistimeout(CMD, SECS, /PAT/) =~ /…/` modifier.
    fn parse_fput(&mut self) -> Result<Action, ScriptError> {
        let command = self.parse_call_arg()?;
        if matches!(self.peek(), Some(Token::Ident(name)) if name == "if") {
            self.pos += 1;
            self.expect_ident("dothistimeout", "`dothistimeout`")?;
            self.expect(&Token::LParen, "`(`")?;
            // probe command; always the same line as the guarded send
            let _probe = self.expect_string()?;
            self.expect(&Token::Comma, "`,`")?;
            let timeout_secs = self.expect_f64()?;
            self.expect(&Token::Comma, "`,`")?;
            let pattern = self.expect_regex()?;
            self.expect(&Token::RParen, "`)`")?;
            if matches!(self.peek(), Some(Token::MatchOp)) {
                self.pos += 1;
                // refinement regex; validated, then collapsed into the probe
                let _refinement = self.expect_regex()?;
            }
            return Ok(Action::Conditional {
                command,
                timeout_secs,
                pattern,
            });
        }
        Ok(Action::Send(command))
    }

    /// `N.times{ … }`
    fn parse_repeat(&mut self) -> Result<Action, ScriptError> {
        let raw = self.expect_number()?;
        let count: u32 = raw.parse().map_err(|_| ScriptError::Expected {
            expected: "integer repeat count",
            found: raw.clone(),
        })?;
        self.expect(&Token::Dot, "`.`")?;
        self.expect_ident("times", "`times`")?;
        self.expect(&Token::LBrace, "`{`")?;
        let body = self.parse_statements(true)?;
        Ok(Action::Repeat { count, body })
    }

    /// `Map[ID].wayto['TARGET'].call`
    fn parse_cross_call(&mut self) -> Result<Action, ScriptError> {
        self.expect(&Token::LBracket, "`[`")?;
        let map = match self.next() {
            Some(Token::Number(raw)) => raw,
            Some(Token::Str { raw, interpolates }) => self.fold_string(&raw, interpolates)?,
            other => {
                return Err(ScriptError::Expected {
                    expected: "map id",
                    found: Self::found(other.as_ref()),
                });
            },
        };
        self.expect(&Token::RBracket, "`]`")?;
        self.expect(&Token::Dot, "`.`")?;
        self.expect_ident("wayto", "`wayto`")?;
        self.expect(&Token::LBracket, "`[`")?;
        let target = self.expect_string()?;
        self.expect(&Token::RBracket, "`]`")?;
        self.expect(&Token::Dot, "`.`")?;
        self.expect_ident("call", "`call`")?;
        Ok(Action::CrossCall { map, target })
    }

    /// `UserVars.KEY = VALUE`
    fn parse_var_write(&mut self) -> Result<Action, ScriptError> {
        self.expect(&Token::Dot, "`.`")?;
        let key = match self.next() {
            Some(Token::Ident(name)) => name,
            other => {
                return Err(ScriptError::Expected {
                    expected: "variable name",
                    found: Self::found(other.as_ref()),
                });
            },
        };
        self.expect(&Token::Assign, "`=`")?;
        let value = match self.next() {
            Some(Token::Number(raw)) => raw,
            Some(Token::Str { raw, interpolates }) => self.fold_string(&raw, interpolates)?,
            other => {
                return Err(ScriptError::Expected {
                    expected: "value",
                    found: Self::found(other.as_ref()),
                });
            },
        };
        Ok(Action::SetVar { key, value })
    }

    /// A single string argument, bare or parenthesized.
    fn parse_call_arg(&mut self) -> Result<String, ScriptError> {
        if matches!(self.peek(), Some(Token::LParen)) {
            self.pos += 1;
            let text = self.expect_string()?;
            self.expect(&Token::RParen, "`)`")?;
            Ok(text)
        } else {
            self.expect_string()
        }
    }

    /// Resolve escapes, and for double-quoted strings fold `#{name}`
    /// interpolations from recorded local assignments.
    fn fold_string(&self, raw: &str, interpolates: bool) -> Result<String, ScriptError> {
        let chars: Vec<char> = raw.chars().collect();
        let mut out = String::with_capacity(raw.len());
        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                '\\' if i + 1 < chars.len() => {
                    match chars[i + 1] {
                        '\\' => out.push('\\'),
                        '\'' => out.push('\''),
                        '"' => out.push('"'),
                        'n' if interpolates => out.push('\n'),
                        't' if interpolates => out.push('\t'),
                        other => {
                            out.push('\\');
                            out.push(other);
                        },
                    }
                    i += 2;
                },
                '#' if interpolates && chars.get(i + 1) == Some(&'{') => {
                    let mut j = i + 2;
                    let mut name = String::new();
                    while j < chars.len() && chars[j] != '}' {
                        name.push(chars[j]);
                        j += 1;
                    }
                    if j == chars.len() {
                        return Err(ScriptError::Unsupported("unterminated interpolation".to_string()));
                    }
                    let value = self
                        .locals
                        .get(name.trim())
                        .ok_or_else(|| ScriptError::UnknownVar(name.trim().to_string()))?;
                    out.push_str(value);
                    i = j + 1;
                },
                ch => {
                    out.push(ch);
                    i += 1;
                },
            }
        }
        Ok(out)
    }
}
