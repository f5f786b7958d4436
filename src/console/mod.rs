//! Console interface for program I/O
//!
//! `PRINT` writes and `INPUT` reads through a [`Console`]. [`StdConsole`] talks
//! to the process's stdin/stdout; [`BufferConsole`] captures output and replays
//! scripted input, for tests and embedding.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Program input and output
pub trait Console {
    /// Write text with no trailing newline (prompts)
    fn print(&mut self, text: &str) -> io::Result<()>;

    /// Write one line of program output
    fn print_line(&mut self, text: &str) -> io::Result<()>;

    /// Block for one line of input; `Ok(None)` means input is exhausted
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Console bound to the process's standard streams
#[derive(Debug, Default)]
pub struct StdConsole;

impl StdConsole {
    pub fn new() -> Self {
        StdConsole
    }
}

impl Console for StdConsole {
    fn print(&mut self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()
    }

    fn print_line(&mut self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", text)?;
        stdout.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buffer = String::new();
        let read = io::stdin().lock().read_line(&mut buffer)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(buffer))
    }
}

/// In-memory console: scripted input, captured output
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    input: VecDeque<String>,
    output: String,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Console that will answer reads with the given lines, in order
    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: lines.into_iter().map(Into::into).collect(),
            output: String::new(),
        }
    }

    /// Everything written so far
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Output split into lines
    pub fn output_lines(&self) -> Vec<&str> {
        self.output.lines().collect()
    }

    /// Take the output, leaving the buffer empty
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }
}

impl Console for BufferConsole {
    fn print(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        Ok(())
    }

    fn print_line(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        self.output.push('\n');
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.input.pop_front())
    }
}
