//! Tokenizer for BASIC source lines
//!
//! Splits a source line into whitespace-delimited tokens. Double quotes open
//! and close a quoted region in which whitespace is kept; the quotes stay in
//! the token text until the parser turns the token into a string value.

use crate::error::{BasicError, Result};
use crate::program::LineNumber;
use std::fmt;

/// A single opaque unit of source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Create a token from its text
    pub fn new(text: impl Into<String>) -> Self {
        Token(text.into())
    }

    /// The token text, quotes included
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the token starts a string literal
    pub fn is_quoted(&self) -> bool {
        self.0.starts_with('"')
    }

    /// Case-insensitive comparison against a keyword
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.0.eq_ignore_ascii_case(keyword)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tokenized source line with its optional explicit line number
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizedLine {
    pub line_number: Option<LineNumber>,
    /// Statement text without the line number, kept for diagnostics
    pub text: String,
    pub tokens: Vec<Token>,
}

impl TokenizedLine {
    /// Create a new tokenized line
    pub fn new(
        line_number: Option<LineNumber>,
        text: impl Into<String>,
        tokens: Vec<Token>,
    ) -> Self {
        Self {
            line_number,
            text: text.into(),
            tokens,
        }
    }

    /// True if the line holds no statement tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Split statement text into tokens
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for ch in text.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                current.push(ch);
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(Token(std::mem::take(&mut current)));
                }
            }
            c => current.push(c),
        }
    }

    if quoted {
        return Err(BasicError::syntax(None, text.trim(), "unterminated string literal"));
    }

    if !current.is_empty() {
        tokens.push(Token(current));
    }

    Ok(tokens)
}

/// Tokenize a full source line, splitting off a leading line number if present
pub fn tokenize_line(source: &str) -> Result<TokenizedLine> {
    let trimmed = source.trim();
    let (line_number, text) = split_line_number(trimmed)?;

    let tokens = tokenize(text).map_err(|e| match line_number {
        Some(number) => e.at_line(number),
        None => e,
    })?;

    Ok(TokenizedLine::new(line_number, text, tokens))
}

/// Separate `"10 PRINT X"` into `(Some(10), "PRINT X")`
///
/// An all-digit first word that does not fit a line number is a syntax error.
fn split_line_number(line: &str) -> Result<(Option<LineNumber>, &str)> {
    let (first, rest) = match line.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim_start()),
        None => (line, ""),
    };

    if first.is_empty() || !first.bytes().all(|b| b.is_ascii_digit()) {
        return Ok((None, line));
    }

    let number = first.parse::<LineNumber>().map_err(|_| {
        BasicError::syntax(None, line, format!("line number {} out of range", first))
    })?;
    Ok((Some(number), rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::as_str).collect()
    }

    #[test]
    fn test_whitespace_splits_tokens() {
        let tokens = tokenize("LET  X =\t1 + Y").unwrap();
        assert_eq!(texts(&tokens), vec!["LET", "X", "=", "1", "+", "Y"]);
    }

    #[test]
    fn test_quoted_region_keeps_spaces_and_quotes() {
        let tokens = tokenize("PRINT \"hello,  world\" + X").unwrap();
        assert_eq!(texts(&tokens), vec!["PRINT", "\"hello,  world\"", "+", "X"]);
        assert!(tokens[1].is_quoted());
        assert!(!tokens[2].is_quoted());
    }

    #[test]
    fn test_empty_and_blank_lines() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   \t ").unwrap().is_empty());
    }

    #[test]
    fn test_unterminated_string_is_syntax_error() {
        let err = tokenize("PRINT \"oops").unwrap_err();
        assert!(matches!(err, BasicError::Syntax { line: None, .. }));

        let err = tokenize_line("30 PRINT \"oops").unwrap_err();
        assert!(matches!(err, BasicError::Syntax { line: Some(30), .. }));
    }

    #[test]
    fn test_tokenize_line_with_number() {
        let line = tokenize_line("10 PRINT X").unwrap();
        assert_eq!(line.line_number, Some(10));
        assert_eq!(line.text, "PRINT X");
        assert_eq!(texts(&line.tokens), vec!["PRINT", "X"]);
    }

    #[test]
    fn test_tokenize_line_without_number() {
        let line = tokenize_line("  PRINT 10  ").unwrap();
        assert_eq!(line.line_number, None);
        assert_eq!(line.text, "PRINT 10");
        assert_eq!(texts(&line.tokens), vec!["PRINT", "10"]);
    }

    #[test]
    fn test_tokenize_line_number_only() {
        let line = tokenize_line("40").unwrap();
        assert_eq!(line.line_number, Some(40));
        assert!(line.is_empty());
    }

    #[test]
    fn test_oversized_line_number_is_syntax_error() {
        let err = tokenize_line("4294967296 PRINT 1").unwrap_err();
        match err {
            BasicError::Syntax { line, message, .. } => {
                assert_eq!(line, None);
                assert!(message.contains("out of range"));
            }
            other => panic!("expected syntax error, got {:?}", other),
        }

        let line = tokenize_line("4294967295 END").unwrap();
        assert_eq!(line.line_number, Some(u32::MAX));
    }

    #[test]
    fn test_keyword_comparison_ignores_case() {
        let token = Token::new("goto");
        assert!(token.is_keyword("GOTO"));
        assert!(!token.is_keyword("GOSUB"));
    }

    // Property-Based Tests

    #[quickcheck]
    fn prop_plain_words_survive_tokenizing(words: Vec<String>) -> TestResult {
        let words: Vec<String> = words
            .into_iter()
            .filter(|w| !w.is_empty() && w.chars().all(|c| c.is_ascii_alphanumeric()))
            .collect();
        if words.is_empty() {
            return TestResult::discard();
        }

        let tokens = tokenize(&words.join(" ")).unwrap();
        let expected: Vec<&str> = words.iter().map(String::as_str).collect();
        TestResult::from_bool(texts(&tokens) == expected)
    }
}
