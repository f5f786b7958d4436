//! Expression evaluation
//!
//! Tree-walking evaluation against an [`Environment`]. Integer arithmetic is
//! checked; comparisons yield `1` or `0`.

use crate::error::{BasicError, Result};
use crate::parser::{Expression, Operator};
use crate::variables::{Environment, Value};

/// Evaluate an expression to a value
pub fn evaluate(expr: &Expression, env: &Environment) -> Result<Value> {
    match expr {
        Expression::Value(value) => Ok(value.clone()),
        Expression::Identifier(name) => env.get(name).cloned(),
        Expression::Operation { op, left, right } => {
            let left = evaluate(left, env)?;
            let right = evaluate(right, env)?;
            apply(*op, left, right)
        }
    }
}

/// Apply a binary operator to two values
pub fn apply(op: Operator, left: Value, right: Value) -> Result<Value> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer_op(op, a, b),
        (Value::String(a), Value::String(b)) => string_op(op, a, b),
        (left, right) => Err(BasicError::TypeMismatch {
            op,
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}

/// Truth of a condition value; only integers qualify
pub fn is_true(value: &Value) -> Result<bool> {
    value
        .as_integer()
        .map(|n| n != 0)
        .ok_or(BasicError::NonIntegerCondition {
            found: value.type_name(),
        })
}

fn integer_op(op: Operator, a: i64, b: i64) -> Result<Value> {
    let result = match op {
        Operator::Add => a.checked_add(b),
        Operator::Subtract => a.checked_sub(b),
        Operator::Multiply => a.checked_mul(b),
        Operator::Divide => {
            if b == 0 {
                return Err(BasicError::DivisionByZero);
            }
            a.checked_div(b)
        }
        Operator::Equal => Some(i64::from(a == b)),
        Operator::NotEqual => Some(i64::from(a != b)),
        Operator::LessThan => Some(i64::from(a < b)),
        Operator::LessThanOrEqual => Some(i64::from(a <= b)),
        Operator::GreaterThan => Some(i64::from(a > b)),
        Operator::GreaterThanOrEqual => Some(i64::from(a >= b)),
    };
    result
        .map(Value::Integer)
        .ok_or(BasicError::Overflow { op })
}

fn string_op(op: Operator, a: String, b: String) -> Result<Value> {
    let flag = match op {
        Operator::Add => return Ok(Value::String(a + &b)),
        Operator::Subtract | Operator::Multiply | Operator::Divide => {
            return Err(BasicError::TypeMismatch {
                op,
                left: "string",
                right: "string",
            })
        }
        Operator::Equal => a == b,
        Operator::NotEqual => a != b,
        Operator::LessThan => a < b,
        Operator::LessThanOrEqual => a <= b,
        Operator::GreaterThan => a > b,
        Operator::GreaterThanOrEqual => a >= b,
    };
    Ok(Value::Integer(i64::from(flag)))
}
