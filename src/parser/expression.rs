//! Expression parsing
//!
//! Expressions form a right-leaning chain with no operator precedence:
//!
//! ```text
//! EXPR    := PRIMARY (OPERATOR EXPR)?
//! PRIMARY := '(' EXPR ')' | VALUE
//! VALUE   := INTEGER-LITERAL | STRING-LITERAL | IDENTIFIER
//! ```
//!
//! `1 - 2 - 3` therefore parses as `1 - (2 - 3)`.

use crate::error::{BasicError, Result};
use crate::tokenizer::Token;
use crate::variables::Value;
use std::fmt;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Operator {
    /// Look up an operator by its source symbol
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "+" => Operator::Add,
            "-" => Operator::Subtract,
            "*" => Operator::Multiply,
            "/" => Operator::Divide,
            "==" => Operator::Equal,
            "!=" => Operator::NotEqual,
            "<" => Operator::LessThan,
            "<=" => Operator::LessThanOrEqual,
            ">" => Operator::GreaterThan,
            ">=" => Operator::GreaterThanOrEqual,
            _ => return None,
        };
        Some(op)
    }

    /// Source symbol for this operator
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
        }
    }

    /// True for the comparison operators
    pub fn is_comparison(self) -> bool {
        !matches!(
            self,
            Operator::Add | Operator::Subtract | Operator::Multiply | Operator::Divide
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Integer or string literal
    Value(Value),
    /// Variable reference, resolved only when evaluated
    Identifier(String),
    /// Binary operation
    Operation {
        op: Operator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    /// Build an operation node
    pub fn operation(op: Operator, left: Expression, right: Expression) -> Self {
        Expression::Operation {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Value(Value::Integer(n)) => write!(f, "{}", n),
            Expression::Value(Value::String(s)) => write!(f, "\"{}\"", s),
            Expression::Identifier(name) => f.write_str(name),
            Expression::Operation { op, left, right } => {
                // A left-hand operation can only come from parentheses
                if matches!(**left, Expression::Operation { .. }) {
                    write!(f, "( {} ) {} {}", left, op, right)
                } else {
                    write!(f, "{} {} {}", left, op, right)
                }
            }
        }
    }
}

/// Forward-only cursor over an immutable token slice
#[derive(Debug, Clone)]
pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// The next token without consuming it
    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    /// Consume and return the next token
    pub fn next_token(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// The full token sequence, consumed part included
    pub fn tokens(&self) -> &'a [Token] {
        self.tokens
    }
}

/// Parse a whole token slice as one expression
///
/// An empty slice yields `Ok(None)`. Errors carry the joined token text; the
/// statement parser replaces it with the full line.
pub fn parse_expression(tokens: &[Token]) -> Result<Option<Expression>> {
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut cursor = TokenCursor::new(tokens);
    let expr = parse_chain(&mut cursor)?;

    match cursor.peek() {
        None => Ok(Some(expr)),
        Some(token) if token.as_str() == ")" => Err(error_at(&cursor, "unmatched ')'")),
        Some(token) => Err(error_at(
            &cursor,
            format!("unexpected token '{}'", token),
        )),
    }
}

fn parse_chain(cursor: &mut TokenCursor<'_>) -> Result<Expression> {
    let left = parse_primary(cursor)?;

    let token = match cursor.peek() {
        None => return Ok(left),
        Some(token) if token.as_str() == ")" => return Ok(left),
        Some(token) => token,
    };

    let op = Operator::from_symbol(token.as_str()).ok_or_else(|| {
        error_at(cursor, format!("expected operator, found '{}'", token))
    })?;
    cursor.next_token();

    let right = parse_chain(cursor)?;
    Ok(Expression::operation(op, left, right))
}

fn parse_primary(cursor: &mut TokenCursor<'_>) -> Result<Expression> {
    let token = cursor
        .next_token()
        .ok_or_else(|| error_at(cursor, "expected operand at end of expression"))?;

    match token.as_str() {
        "(" => {
            let inner = parse_chain(cursor)?;
            match cursor.next_token() {
                Some(close) if close.as_str() == ")" => Ok(inner),
                _ => Err(error_at(cursor, "missing ')'")),
            }
        }
        ")" => Err(error_at(cursor, "unmatched ')'")),
        symbol if Operator::from_symbol(symbol).is_some() => Err(error_at(
            cursor,
            format!("expected operand, found operator '{}'", symbol),
        )),
        _ => parse_operand(token),
    }
}

/// Classify a single operand token as a literal or an identifier
pub fn parse_operand(token: &Token) -> Result<Expression> {
    let text = token.as_str();

    if token.is_quoted() {
        let inner = text
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .filter(|inner| !inner.contains('"'))
            .ok_or_else(|| BasicError::syntax(None, text, "malformed string literal"))?;
        return Ok(Expression::Value(Value::String(inner.to_string())));
    }

    if is_integer_literal(text) {
        let n = text
            .parse::<i64>()
            .map_err(|_| BasicError::syntax(None, text, "integer literal out of range"))?;
        return Ok(Expression::Value(Value::Integer(n)));
    }

    if text.contains(['(', ')']) {
        return Err(BasicError::syntax(None, text, "parentheses must be separate tokens"));
    }
    if text.contains('"') {
        return Err(BasicError::syntax(None, text, "malformed string literal"));
    }

    Ok(Expression::Identifier(text.to_string()))
}

/// Digits with an optional leading minus sign
pub fn is_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn error_at(cursor: &TokenCursor<'_>, message: impl Into<String>) -> BasicError {
    let text = cursor
        .tokens()
        .iter()
        .map(Token::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    BasicError::syntax(None, text, message)
}
