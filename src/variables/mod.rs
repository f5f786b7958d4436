//! Runtime values and the execution environment
//!
//! The environment holds variable bindings plus the three control registers
//! the executor drives: the program counter, the last executed line, and the
//! running flag an interrupt can clear between statements.

use crate::error::{BasicError, Result};
use crate::program::LineNumber;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A runtime value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// 64-bit signed integer
    Integer(i64),
    /// Text
    String(String),
}

impl Value {
    /// Name of the value's type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
        }
    }

    /// Coerce one line of user input: integer if it parses, raw text otherwise
    pub fn from_input(input: &str) -> Self {
        let text = input.trim_end_matches(['\r', '\n']);
        match text.trim().parse::<i64>() {
            Ok(n) => Value::Integer(n),
            Err(_) => Value::String(text.to_string()),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::String(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Cloneable handle that can ask a running program to stop
///
/// Stopping only clears the running flag; the executor notices it before the
/// next statement and halts with the environment intact.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    /// Request a stop at the next statement boundary
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Variable bindings plus control registers
#[derive(Debug)]
pub struct Environment {
    variables: HashMap<String, Value>,
    /// Line the engine intends to execute next
    pub program_counter: LineNumber,
    /// Last executed line, `None` before the first step
    pub current_line: Option<LineNumber>,
    running: Arc<AtomicBool>,
}

impl Environment {
    /// Create an empty environment
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
            program_counter: 0,
            current_line: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Read a variable; unbound names are an error, never a default
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.variables
            .get(name)
            .ok_or_else(|| BasicError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    /// Bind a variable, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Check if a variable exists
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Clear all variables
    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }

    /// Reset the control registers to their pre-run state
    pub fn reset_registers(&mut self) {
        self.program_counter = 0;
        self.current_line = None;
        self.set_running(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn set_running(&mut self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    /// Handle that shares this environment's running flag
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Integer(-12).to_string(), "-12");
        assert_eq!(Value::from("hello").to_string(), "hello");
        assert_eq!(Value::from(3).type_name(), "integer");
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::from(3).as_integer(), Some(3));
        assert_eq!(Value::from("3").as_integer(), None);
    }

    #[test]
    fn test_input_coercion() {
        assert_eq!(Value::from_input("42\n"), Value::Integer(42));
        assert_eq!(Value::from_input(" -7 \r\n"), Value::Integer(-7));
        assert_eq!(Value::from_input("forty two\n"), Value::from("forty two"));
        assert_eq!(Value::from_input(""), Value::from(""));
    }

    #[test]
    fn test_undefined_variable_is_error() {
        let env = Environment::new();
        match env.get("X") {
            Err(BasicError::UndefinedVariable { name }) => assert_eq!(name, "X"),
            other => panic!("expected undefined variable, got {:?}", other),
        }
        assert!(!env.contains("X"));
    }

    #[test]
    fn test_set_overwrites() {
        let mut env = Environment::new();
        env.set("X", Value::Integer(1));
        env.set("X", Value::from("one"));
        assert_eq!(env.get("X").unwrap(), &Value::from("one"));
    }

    #[test]
    fn test_stop_handle_shares_running_flag() {
        let mut env = Environment::new();
        assert!(!env.is_running());

        env.set_running(true);
        let handle = env.stop_handle();
        assert!(handle.is_running());

        handle.stop();
        assert!(!env.is_running());
    }

    #[test]
    fn test_reset_registers_keeps_variables() {
        let mut env = Environment::new();
        env.set("A", Value::Integer(5));
        env.program_counter = 30;
        env.current_line = Some(20);
        env.set_running(true);

        env.reset_registers();
        assert_eq!(env.program_counter, 0);
        assert_eq!(env.current_line, None);
        assert!(!env.is_running());
        assert!(env.contains("A"));

        env.clear_variables();
        assert!(!env.contains("A"));
    }

    // Property-Based Tests

    #[test]
    fn prop_integer_binding_roundtrip() {
        fn property(value: i64) -> bool {
            let mut env = Environment::new();
            env.set("TEST", Value::Integer(value));
            env.get("TEST").ok() == Some(&Value::Integer(value))
        }

        let mut qc = quickcheck::QuickCheck::new().tests(50);
        qc.quickcheck(property as fn(i64) -> bool);
    }

    #[test]
    fn prop_non_numeric_input_kept_as_text() {
        fn property(text: String) -> TestResult {
            if text.contains(['\r', '\n']) || text.trim().parse::<i64>().is_ok() {
                return TestResult::discard();
            }
            TestResult::from_bool(Value::from_input(&text) == Value::String(text))
        }

        let mut qc = quickcheck::QuickCheck::new().tests(50);
        qc.quickcheck(property as fn(String) -> TestResult);
    }
}
