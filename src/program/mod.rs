//! Program storage and management
//!
//! Stores parsed program lines keyed by line number. Iteration is always in
//! ascending line order, which is also the order of sequential fallthrough.

use crate::error::Result;
use crate::parser::{parse_statement, Statement};
use crate::tokenizer::{tokenize_line, TokenizedLine};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Program line number
pub type LineNumber = u32;

/// A stored program line
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub number: LineNumber,
    pub statement: Statement,
    /// Statement text as it was entered
    pub source: String,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.source)
    }
}

/// Program line storage
#[derive(Debug, Clone, Default)]
pub struct ProgramStore {
    lines: BTreeMap<LineNumber, Line>,
    /// Next number handed to a line written without one
    next_auto: LineNumber,
}

impl ProgramStore {
    /// Create a new program store
    pub fn new() -> Self {
        Self {
            lines: BTreeMap::new(),
            next_auto: 0,
        }
    }

    /// Load a whole program from source text
    ///
    /// Loading stops at the first error and returns no partial program.
    pub fn load(source: &str) -> Result<Self> {
        Self::load_lines(source.lines())
    }

    /// Load a program from individual source lines, skipping blank ones
    pub fn load_lines<'a, I>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut program = Self::new();
        for text in lines {
            if text.trim().is_empty() {
                continue;
            }
            program.insert_source(text)?;
        }
        info!(lines = program.len(), "program loaded");
        Ok(program)
    }

    /// Parse one source line and store it, returning its line number
    pub fn insert_source(&mut self, text: &str) -> Result<LineNumber> {
        let tokenized = tokenize_line(text)?;
        self.insert_tokenized(tokenized)
    }

    /// Parse an already tokenized line and store it
    ///
    /// Lines without an explicit number take the next auto number.
    pub fn insert_tokenized(&mut self, tokenized: TokenizedLine) -> Result<LineNumber> {
        let number = match tokenized.line_number {
            Some(number) => number,
            None => self.next_auto_number(),
        };
        let statement = parse_statement(&tokenized).map_err(|e| e.at_line(number))?;
        debug!(line = number, %statement, "parsed line");

        self.insert(Line {
            number,
            statement,
            source: tokenized.text,
        });
        Ok(number)
    }

    /// Store a line, replacing any line with the same number
    pub fn insert(&mut self, line: Line) -> Option<Line> {
        let replaced = self.lines.insert(line.number, line);
        if let Some(old) = &replaced {
            debug!(line = old.number, "replaced existing line");
        }
        replaced
    }

    /// Get a program line
    pub fn get(&self, number: LineNumber) -> Option<&Line> {
        self.lines.get(&number)
    }

    pub fn contains(&self, number: LineNumber) -> bool {
        self.lines.contains_key(&number)
    }

    /// Delete a program line
    pub fn remove(&mut self, number: LineNumber) -> Option<Line> {
        self.lines.remove(&number)
    }

    /// Clear all program lines and restart auto numbering
    pub fn clear(&mut self) {
        self.lines.clear();
        self.next_auto = 0;
    }

    /// Line numbers in ascending order
    pub fn line_numbers(&self) -> Vec<LineNumber> {
        self.lines.keys().copied().collect()
    }

    pub fn first_line(&self) -> Option<LineNumber> {
        self.lines.keys().next().copied()
    }

    pub fn last_line(&self) -> Option<LineNumber> {
        self.lines.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines in ascending order
    pub fn iter(&self) -> impl Iterator<Item = &Line> {
        self.lines.values()
    }

    /// `"<n> <statement>"` for every line, in ascending order
    pub fn listing(&self) -> Vec<String> {
        self.iter().map(Line::to_string).collect()
    }

    fn next_auto_number(&mut self) -> LineNumber {
        let number = self.next_auto;
        self.next_auto = self.next_auto.saturating_add(1);
        number
    }
}
