//! Interpreter sessions
//!
//! A [`Session`] owns one program, one environment and one console. It is the
//! boundary between the interpreter core and whoever drives it: every public
//! operation passes its result through the configured [`ErrorPolicy`], so an
//! embedding caller gets error values back while a command line front end can
//! ask for print-and-exit instead.

use crate::config::InterpreterConfig;
use crate::console::{Console, StdConsole};
use crate::error::Result;
use crate::executor::{Executor, Flow, Halt, StepResult};
use crate::parser::{parse, parse_statement, Statement};
use crate::program::{LineNumber, ProgramStore};
use crate::tokenizer::tokenize_line;
use crate::variables::{Environment, StopHandle};
use tracing::info;

/// What a REPL command did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Blank input
    Nothing,
    /// The program listing was written to the console
    Listed,
    /// The program (or part of it) ran and halted
    Ran(Halt),
    /// The program was cleared
    Cleared,
    /// A numbered line was stored
    Stored(LineNumber),
    /// A bare line number removed that line
    Deleted(LineNumber),
    /// An immediate statement was executed
    Executed,
    /// The user asked to leave
    Exit,
}

/// One interpreter instance
#[derive(Debug)]
pub struct Session<C: Console = StdConsole> {
    program: ProgramStore,
    environment: Environment,
    executor: Executor,
    console: C,
    config: InterpreterConfig,
}

impl Session<StdConsole> {
    /// Session on stdin/stdout with default settings
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    /// Session on stdin/stdout
    pub fn with_config(config: InterpreterConfig) -> Self {
        Self::with_console(StdConsole::new(), config)
    }
}

impl Default for Session<StdConsole> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Console> Session<C> {
    /// Session on a caller-supplied console
    pub fn with_console(console: C, config: InterpreterConfig) -> Self {
        Self {
            program: ProgramStore::new(),
            environment: Environment::new(),
            executor: Executor::new(&config),
            console,
            config,
        }
    }

    pub fn program(&self) -> &ProgramStore {
        &self.program
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    /// Handle an interrupt source can use to stop a running program
    pub fn stop_handle(&self) -> StopHandle {
        self.environment.stop_handle()
    }

    /// Parse a single statement
    pub fn parse(&self, line: &str) -> Result<Statement> {
        self.config.error_policy.apply(parse(line))
    }

    /// Replace the current program with one loaded from source text
    ///
    /// On error the current program is left untouched.
    pub fn load(&mut self, source: &str) -> Result<()> {
        let result = ProgramStore::load(source).map(|program| self.replace_program(program));
        self.config.error_policy.apply(result)
    }

    /// Replace the current program with one loaded from source lines
    pub fn load_lines<'a, I>(&mut self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let result = ProgramStore::load_lines(lines).map(|program| self.replace_program(program));
        self.config.error_policy.apply(result)
    }

    /// Store one source line in the program
    pub fn insert_line(&mut self, text: &str) -> Result<LineNumber> {
        let result = self.program.insert_source(text);
        self.config.error_policy.apply(result)
    }

    /// Run the program from its first line with fresh variables
    pub fn run(&mut self) -> Result<Halt> {
        let result = self.run_program();
        self.config.error_policy.apply(result)
    }

    /// Prepare a stepwise run from the first line
    pub fn start(&mut self) -> Result<()> {
        self.environment.clear_variables();
        let result = self.executor.start(&self.program, &mut self.environment);
        self.config.error_policy.apply(result)
    }

    /// Execute one line of a run prepared with [`Session::start`]
    pub fn step(&mut self) -> Result<StepResult> {
        let result = self
            .executor
            .step(&self.program, &mut self.environment, &mut self.console);
        if !matches!(result, Ok(StepResult::Continue)) {
            self.environment.set_running(false);
        }
        self.config.error_policy.apply(result)
    }

    /// Execute a statement immediately without storing it
    ///
    /// `GOTO n`, and `IF ... GOTO n` when true, run the stored program from
    /// line `n`; the halt reason is returned in that case.
    pub fn execute(&mut self, statement: &Statement) -> Result<Option<Halt>> {
        let result = self.execute_immediate(statement);
        self.config.error_policy.apply(result)
    }

    /// Write the program listing to the console
    pub fn list(&mut self) -> Result<()> {
        let result = self.write_listing();
        self.config.error_policy.apply(result)
    }

    /// Clear the program, the variables and the control registers
    pub fn clear(&mut self) {
        self.program.clear();
        self.environment.clear_variables();
        self.environment.reset_registers();
        info!("program cleared");
    }

    /// Handle one line of REPL input
    ///
    /// `list`, `run`, `new` and `exit` are commands (any case); `<n> <statement>`
    /// stores a line, a bare `<n>` deletes one, anything else is executed
    /// immediately.
    pub fn command(&mut self, input: &str) -> Result<CommandOutcome> {
        let result = self.dispatch(input.trim());
        self.config.error_policy.apply(result)
    }

    fn dispatch(&mut self, input: &str) -> Result<CommandOutcome> {
        if input.is_empty() {
            return Ok(CommandOutcome::Nothing);
        }

        match input.to_ascii_lowercase().as_str() {
            "exit" => return Ok(CommandOutcome::Exit),
            "list" => {
                self.write_listing()?;
                return Ok(CommandOutcome::Listed);
            }
            "run" => return self.run_program().map(CommandOutcome::Ran),
            "new" => {
                self.clear();
                self.console.print_line("New program created.")?;
                return Ok(CommandOutcome::Cleared);
            }
            _ => {}
        }

        let line = tokenize_line(input)?;
        match line.line_number {
            Some(number) if line.is_empty() => {
                self.program.remove(number);
                Ok(CommandOutcome::Deleted(number))
            }
            Some(_) => self.program.insert_tokenized(line).map(CommandOutcome::Stored),
            None => {
                let statement = parse_statement(&line)?;
                match self.execute_immediate(&statement)? {
                    Some(halt) => Ok(CommandOutcome::Ran(halt)),
                    None => Ok(CommandOutcome::Executed),
                }
            }
        }
    }

    fn run_program(&mut self) -> Result<Halt> {
        self.environment.clear_variables();
        self.executor
            .run(&self.program, &mut self.environment, &mut self.console)
    }

    fn execute_immediate(&mut self, statement: &Statement) -> Result<Option<Halt>> {
        self.environment.set_running(true);
        let flow = self
            .executor
            .execute_statement(statement, &mut self.environment, &mut self.console);
        self.environment.set_running(false);

        match flow? {
            Flow::Jump(target) => self
                .executor
                .run_from(&self.program, &mut self.environment, &mut self.console, target)
                .map(Some),
            Flow::Next | Flow::End | Flow::Interrupted => Ok(None),
        }
    }

    fn write_listing(&mut self) -> Result<()> {
        if self.program.is_empty() {
            self.console.print_line("No program loaded.")?;
            return Ok(());
        }
        for line in self.program.iter() {
            self.console.print_line(&line.to_string())?;
        }
        Ok(())
    }

    fn replace_program(&mut self, program: ProgramStore) {
        self.program = program;
        self.environment.clear_variables();
        self.environment.reset_registers();
    }
}
