//! Interpreter configuration
//!
//! Settings chosen by whoever embeds the interpreter: how many consecutive
//! executions of one line count as an infinite loop, and whether errors are
//! handed back to the caller or end the process.

use crate::error::Result;

/// Consecutive repeats of one line before the run is aborted
pub const DEFAULT_LOOP_LIMIT: usize = 1000;

/// What the session boundary does with an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Return the error value to the caller
    #[default]
    Return,
    /// Print a diagnostic to stderr and exit the process
    Exit,
}

impl ErrorPolicy {
    /// Pass a result through the boundary
    ///
    /// Under [`ErrorPolicy::Exit`] an error never returns: it is printed and the
    /// process terminates with the error's exit code.
    pub fn apply<T>(self, result: Result<T>) -> Result<T> {
        match (self, result) {
            (ErrorPolicy::Exit, Err(err)) => {
                eprintln!("error: {}", err);
                std::process::exit(err.exit_code())
            }
            (_, result) => result,
        }
    }
}

/// Interpreter settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    pub loop_limit: usize,
    pub error_policy: ErrorPolicy,
}

impl InterpreterConfig {
    pub fn new() -> Self {
        Self {
            loop_limit: DEFAULT_LOOP_LIMIT,
            error_policy: ErrorPolicy::Return,
        }
    }

    pub fn with_loop_limit(mut self, loop_limit: usize) -> Self {
        self.loop_limit = loop_limit;
        self
    }

    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self::new()
    }
}
