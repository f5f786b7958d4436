//! Line BASIC Interpreter
//!
//! A tree-walking interpreter for a small line-numbered BASIC dialect. Source
//! lines are tokenized, parsed into statements, stored in a program table keyed
//! by line number, and executed by a program-counter driven state machine that
//! supports unstructured control flow (`GOTO`, `IF ... GOTO`, `ELSE`, `END`).
//!
//! ```no_run
//! use line_basic::Session;
//!
//! let mut session = Session::new();
//! session.load("10 LET X = 41\n20 PRINT X + 1\n").unwrap();
//! session.run().unwrap();
//! ```

pub mod config;
pub mod console;
pub mod executor;
pub mod parser;
pub mod program;
pub mod session;
pub mod tokenizer;
pub mod variables;

// Re-export core types for convenience
pub use crate::error::{BasicError, Result};
pub use config::{ErrorPolicy, InterpreterConfig};
pub use console::{BufferConsole, Console, StdConsole};
pub use executor::{Executor, Halt, StepResult};
pub use parser::{parse, parse_statement, Expression, Operator, Statement};
pub use program::{Line, LineNumber, ProgramStore};
pub use session::{CommandOutcome, Session};
pub use tokenizer::{tokenize, tokenize_line, Token, TokenizedLine};
pub use variables::{Environment, StopHandle, Value};

/// Core error handling types for the interpreter
pub mod error {
    use crate::parser::Operator;
    use crate::program::LineNumber;
    use thiserror::Error;

    /// Result type for interpreter operations
    pub type Result<T> = std::result::Result<T, BasicError>;

    /// Every failure the tokenizer, parser, program table or executor can report.
    #[derive(Debug, Error)]
    pub enum BasicError {
        // Parse-time errors
        #[error("Syntax error{}: {message}; {text}", at_line(.line))]
        Syntax {
            line: Option<LineNumber>,
            text: String,
            message: String,
        },
        #[error("Unknown statement{}: {keyword}; {text}", at_line(.line))]
        UnknownStatement {
            line: Option<LineNumber>,
            text: String,
            keyword: String,
        },

        // Runtime errors
        #[error("Undefined variable: {name}")]
        UndefinedVariable { name: String },
        #[error("Unknown line: {target}{}", from_line(.from))]
        UnknownLine {
            target: LineNumber,
            from: Option<LineNumber>,
        },
        #[error("Infinite loop: line {line} repeated {repeats} times")]
        InfiniteLoop { line: LineNumber, repeats: usize },
        #[error("Type mismatch: cannot apply {op} to {left} and {right}")]
        TypeMismatch {
            op: Operator,
            left: &'static str,
            right: &'static str,
        },
        #[error("Condition must be an integer, found {found}")]
        NonIntegerCondition { found: &'static str },
        #[error("Division by zero")]
        DivisionByZero,
        #[error("Integer overflow in {op}")]
        Overflow { op: Operator },
        #[error("Input closed while waiting for {name}")]
        InputClosed { name: String },
        #[error("No program loaded")]
        EmptyProgram,

        // System errors
        #[error("I/O error: {0}")]
        Io(#[from] std::io::Error),
    }

    impl BasicError {
        /// Build a syntax error for the given statement text
        pub fn syntax(
            line: Option<LineNumber>,
            text: impl Into<String>,
            message: impl Into<String>,
        ) -> Self {
            BasicError::Syntax {
                line,
                text: text.into(),
                message: message.into(),
            }
        }

        /// Attach a line number to a parse error that was raised without one
        pub fn at_line(self, number: LineNumber) -> Self {
            match self {
                BasicError::Syntax {
                    line: None,
                    text,
                    message,
                } => BasicError::Syntax {
                    line: Some(number),
                    text,
                    message,
                },
                BasicError::UnknownStatement {
                    line: None,
                    text,
                    keyword,
                } => BasicError::UnknownStatement {
                    line: Some(number),
                    text,
                    keyword,
                },
                other => other,
            }
        }

        /// True for errors raised while tokenizing or parsing
        pub fn is_parse_error(&self) -> bool {
            matches!(
                self,
                BasicError::Syntax { .. } | BasicError::UnknownStatement { .. }
            )
        }

        /// Process exit code a command line front end should use
        pub fn exit_code(&self) -> i32 {
            1
        }
    }

    fn at_line(line: &Option<LineNumber>) -> String {
        match line {
            Some(number) => format!(" at line {}", number),
            None => String::new(),
        }
    }

    fn from_line(from: &Option<LineNumber>) -> String {
        match from {
            Some(number) => format!(" (from line {})", number),
            None => String::new(),
        }
    }

}
