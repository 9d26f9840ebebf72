//! The game-session interface the executor drives.
//!
//! The core never talks to a game server; it consumes this trait. The
//! embedding client supplies the live session: the command stream, the
//! incoming text it can match patterns against, roundtime tracking, and
//! the persistent key/value store some stringprocs write through
//! (`UserVars.…`).

use std::time::Duration;

use thiserror::Error;

use wend_script::Pattern;

/// Failures surfaced by [`ActionContext`] primitives.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    /// A bounded pattern wait elapsed without a match.
    #[error("no match for {pattern} within {timeout_secs}s")]
    Timeout { pattern: String, timeout_secs: f64 },
    /// The underlying session cannot carry out the primitive at all,
    /// e.g. the connection dropped.
    #[error("session unavailable: {0}")]
    Unavailable(String),
}

/// One live game session, as seen by the executor.
///
/// Implementations are expected to be cooperative: `wait_for_pattern`,
/// `sleep`, and `wait_for_action_delay_clear` are the only suspension
/// points, and one script runs to completion or failure before another
/// begins against the same context, keeping the command stream ordered.
pub trait ActionContext {
    /// Emit one line of text to the session.
    ///
    /// # Errors
    /// [`ContextError::Unavailable`] when the session cannot accept it.
    fn send(&mut self, line: &str) -> Result<(), ContextError>;

    /// Block until incoming text matches `pattern`, returning the matched
    /// text, or fail with [`ContextError::Timeout`] once `timeout`
    /// elapses. `None` waits indefinitely; there is no implicit bound.
    ///
    /// # Errors
    /// [`ContextError::Timeout`] on an elapsed bound,
    /// [`ContextError::Unavailable`] on session failure.
    fn wait_for_pattern(&mut self, pattern: &Pattern, timeout: Option<Duration>) -> Result<String, ContextError>;

    /// Suspend for the given duration.
    ///
    /// # Errors
    /// [`ContextError::Unavailable`] on session failure.
    fn sleep(&mut self, duration: Duration) -> Result<(), ContextError>;

    /// True while the session reports an active action delay (roundtime).
    fn action_delay_active(&self) -> bool;

    /// Block until the action delay clears.
    ///
    /// # Errors
    /// [`ContextError::Unavailable`] on session failure.
    fn wait_for_action_delay_clear(&mut self) -> Result<(), ContextError>;

    /// Read a persistent session variable.
    fn get_var(&self, key: &str) -> Option<String>;

    /// Write a persistent session variable.
    fn set_var(&mut self, key: &str, value: &str);
}
