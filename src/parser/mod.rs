//! Parser for BASIC statements and expressions
//!
//! Turns a tokenized line into a [`Statement`]. Dispatch happens on the first
//! token through the closed [`Keyword`] enum; every statement form validates
//! its own arity and fixed tokens and either returns a complete statement or a
//! syntax error carrying the line number and raw text.

pub mod expression;

pub use expression::{parse_expression, Expression, Operator, TokenCursor};

use crate::error::{BasicError, Result};
use crate::program::LineNumber;
use crate::tokenizer::{tokenize_line, Token, TokenizedLine};
use std::fmt;

/// Statement keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Let,
    Print,
    Input,
    Goto,
    If,
    Else,
    Rem,
    End,
}

impl Keyword {
    /// Case-insensitive keyword lookup
    pub fn lookup(word: &str) -> Option<Self> {
        let keyword = match word.to_ascii_uppercase().as_str() {
            "LET" => Keyword::Let,
            "PRINT" => Keyword::Print,
            "INPUT" => Keyword::Input,
            "GOTO" => Keyword::Goto,
            "IF" => Keyword::If,
            "ELSE" => Keyword::Else,
            "REM" => Keyword::Rem,
            "END" => Keyword::End,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Let => "LET",
            Keyword::Print => "PRINT",
            Keyword::Input => "INPUT",
            Keyword::Goto => "GOTO",
            Keyword::If => "IF",
            Keyword::Else => "ELSE",
            Keyword::Rem => "REM",
            Keyword::End => "END",
        }
    }
}

/// BASIC statements, one per line
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `LET X = expr`
    Let {
        identifier: String,
        expr: Expression,
    },
    /// `PRINT [expr]`
    Print { expr: Option<Expression> },
    /// `INPUT ["prompt"] X`
    Input {
        identifier: String,
        prompt: Option<String>,
    },
    /// `GOTO n`
    Goto { target: LineNumber },
    /// `IF cond GOTO n`
    If {
        condition: Expression,
        target: LineNumber,
    },
    /// `ELSE GOTO n` or `ELSE IF cond GOTO n`
    ///
    /// ELSE is positional, not paired: it only fires when execution falls
    /// through to it directly from a false `IF` (or a false `ELSE IF`) on the
    /// preceding line. Reached any other way it does nothing.
    Else {
        condition: Option<Expression>,
        target: LineNumber,
    },
    /// `REM comment`
    Rem { comment: String },
    /// `END`
    End,
}

impl Statement {
    /// The keyword that introduces this statement
    pub fn keyword(&self) -> Keyword {
        match self {
            Statement::Let { .. } => Keyword::Let,
            Statement::Print { .. } => Keyword::Print,
            Statement::Input { .. } => Keyword::Input,
            Statement::Goto { .. } => Keyword::Goto,
            Statement::If { .. } => Keyword::If,
            Statement::Else { .. } => Keyword::Else,
            Statement::Rem { .. } => Keyword::Rem,
            Statement::End => Keyword::End,
        }
    }

    /// Check if this statement can transfer control
    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            Statement::Goto { .. } | Statement::If { .. } | Statement::Else { .. }
        )
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { identifier, expr } => write!(f, "LET {} = {}", identifier, expr),
            Statement::Print { expr: Some(expr) } => write!(f, "PRINT {}", expr),
            Statement::Print { expr: None } => f.write_str("PRINT"),
            Statement::Input {
                identifier,
                prompt: Some(prompt),
            } => write!(f, "INPUT \"{}\" {}", prompt, identifier),
            Statement::Input {
                identifier,
                prompt: None,
            } => write!(f, "INPUT {}", identifier),
            Statement::Goto { target } => write!(f, "GOTO {}", target),
            Statement::If { condition, target } => write!(f, "IF {} GOTO {}", condition, target),
            Statement::Else {
                condition: Some(condition),
                target,
            } => write!(f, "ELSE IF {} GOTO {}", condition, target),
            Statement::Else {
                condition: None,
                target,
            } => write!(f, "ELSE GOTO {}", target),
            Statement::Rem { comment } if comment.is_empty() => f.write_str("REM"),
            Statement::Rem { comment } => write!(f, "REM {}", comment),
            Statement::End => f.write_str("END"),
        }
    }
}

/// Tokenize and parse a single statement
///
/// A leading line number, if any, is accepted and ignored.
pub fn parse(text: &str) -> Result<Statement> {
    let line = tokenize_line(text)?;
    parse_statement(&line)
}

/// Parse a tokenized line into a statement
pub fn parse_statement(line: &TokenizedLine) -> Result<Statement> {
    let tokens = &line.tokens;

    let first = tokens
        .first()
        .ok_or_else(|| syntax(line, "missing statement"))?;

    let keyword = Keyword::lookup(first.as_str()).ok_or_else(|| BasicError::UnknownStatement {
        line: line.line_number,
        text: line.text.clone(),
        keyword: first.to_string(),
    })?;

    let args = &tokens[1..];
    match keyword {
        Keyword::Let => parse_let(args, line),
        Keyword::Print => {
            let expr = parse_expression(args).map_err(in_line(line))?;
            Ok(Statement::Print { expr })
        }
        Keyword::Input => parse_input(args, line),
        Keyword::Goto => match args {
            [target] => Ok(Statement::Goto {
                target: parse_target(target, line)?,
            }),
            _ => Err(syntax(line, "expected GOTO <line>")),
        },
        Keyword::If => {
            let (condition, target) = parse_conditional(args, line)?;
            Ok(Statement::If { condition, target })
        }
        Keyword::Else => parse_else(args, line),
        Keyword::Rem => {
            // Everything after REM is a comment, spacing kept
            let comment = line
                .text
                .trim_start()
                .get(first.as_str().len()..)
                .unwrap_or("")
                .trim()
                .to_string();
            Ok(Statement::Rem { comment })
        }
        Keyword::End => {
            if args.is_empty() {
                Ok(Statement::End)
            } else {
                Err(syntax(line, "END takes no operands"))
            }
        }
    }
}

/// Parse LET statement (LET X = expr)
fn parse_let(args: &[Token], line: &TokenizedLine) -> Result<Statement> {
    if args.len() < 3 {
        return Err(syntax(line, "expected LET <identifier> = <expression>"));
    }

    let identifier = parse_identifier(&args[0], line)?;

    if args[1].as_str() != "=" {
        return Err(syntax(line, "expected '=' after identifier"));
    }

    let expr = parse_expression(&args[2..])
        .map_err(in_line(line))?
        .ok_or_else(|| syntax(line, "expected expression after '='"))?;

    Ok(Statement::Let { identifier, expr })
}

/// Parse INPUT statement (INPUT X or INPUT "prompt" X)
fn parse_input(args: &[Token], line: &TokenizedLine) -> Result<Statement> {
    match args {
        [identifier] => Ok(Statement::Input {
            identifier: parse_identifier(identifier, line)?,
            prompt: None,
        }),
        [prompt, identifier] if prompt.is_quoted() => {
            let prompt = match expression::parse_operand(prompt).map_err(in_line(line))? {
                Expression::Value(crate::variables::Value::String(text)) => text,
                _ => return Err(syntax(line, "INPUT prompt must be a string literal")),
            };
            Ok(Statement::Input {
                identifier: parse_identifier(identifier, line)?,
                prompt: Some(prompt),
            })
        }
        _ => Err(syntax(line, "expected INPUT [\"prompt\"] <identifier>")),
    }
}

/// Parse ELSE statement (ELSE GOTO n or ELSE IF cond GOTO n)
fn parse_else(args: &[Token], line: &TokenizedLine) -> Result<Statement> {
    match args.first() {
        Some(token) if token.is_keyword("GOTO") => match args {
            [_, target] => Ok(Statement::Else {
                condition: None,
                target: parse_target(target, line)?,
            }),
            _ => Err(syntax(line, "expected ELSE GOTO <line>")),
        },
        Some(token) if token.is_keyword("IF") => {
            let (condition, target) = parse_conditional(&args[1..], line)?;
            Ok(Statement::Else {
                condition: Some(condition),
                target,
            })
        }
        _ => Err(syntax(line, "expected GOTO or IF after ELSE")),
    }
}

/// Parse `<condition...> GOTO <n>`, shared by IF and ELSE IF
fn parse_conditional(args: &[Token], line: &TokenizedLine) -> Result<(Expression, LineNumber)> {
    let goto_pos = args
        .iter()
        .rposition(|t| t.is_keyword("GOTO"))
        .ok_or_else(|| syntax(line, "expected GOTO after condition"))?;

    if goto_pos + 2 != args.len() {
        return Err(syntax(line, "expected a single line number after GOTO"));
    }

    let condition = parse_expression(&args[..goto_pos])
        .map_err(in_line(line))?
        .ok_or_else(|| syntax(line, "expected condition before GOTO"))?;
    let target = parse_target(&args[goto_pos + 1], line)?;

    Ok((condition, target))
}

/// Parse a jump target line number
fn parse_target(token: &Token, line: &TokenizedLine) -> Result<LineNumber> {
    let text = token.as_str();
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(syntax(line, format!("invalid line number '{}'", text)));
    }
    text.parse::<LineNumber>()
        .map_err(|_| syntax(line, format!("invalid line number '{}'", text)))
}

/// Parse a variable name in assignment position
fn parse_identifier(token: &Token, line: &TokenizedLine) -> Result<String> {
    let text = token.as_str();
    if Operator::from_symbol(text).is_some() || text == "(" || text == ")" || text == "=" {
        return Err(syntax(line, format!("expected identifier, found '{}'", text)));
    }
    match expression::parse_operand(token).map_err(in_line(line))? {
        Expression::Identifier(name) => Ok(name),
        _ => Err(syntax(line, format!("expected identifier, found literal {}", text))),
    }
}

fn syntax(line: &TokenizedLine, message: impl Into<String>) -> BasicError {
    BasicError::syntax(line.line_number, line.text.clone(), message)
}

/// Re-home an expression error onto the full statement line
fn in_line(line: &TokenizedLine) -> impl Fn(BasicError) -> BasicError + '_ {
    move |err| match err {
        BasicError::Syntax { message, .. } => syntax(line, message),
        other => other,
    }
}
