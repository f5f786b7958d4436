//! Execution engine for BASIC programs
//!
//! The executor walks the program table with a cursor into the ascending list
//! of line numbers. Each step resolves the environment's program counter to a
//! stored line, runs its statement, and then either advances to the next line
//! or follows the jump the statement requested.
//!
//! `ELSE` is positional: it fires only when the step that reaches it is a
//! sequential fallthrough from a false `IF` (or false `ELSE IF`) immediately
//! before it. The executor tracks this as an "armed" flag that lives for
//! exactly one step.

pub mod eval;

pub use eval::{apply, evaluate, is_true};

use crate::config::InterpreterConfig;
use crate::console::Console;
use crate::error::{BasicError, Result};
use crate::parser::{Expression, Statement};
use crate::program::{LineNumber, ProgramStore};
use crate::variables::{Environment, Value};
use tracing::{debug, trace};

/// Control effect of one executed statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Fall through to the next line
    Next,
    /// Transfer control to a line
    Jump(LineNumber),
    /// `END` was executed
    End,
    /// The statement was abandoned because the run was stopped
    Interrupted,
}

/// Why a run stopped without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// Fell off the last line of the program
    EndOfProgram,
    /// An `END` statement was executed
    End,
    /// The running flag was cleared
    Interrupted,
}

impl Halt {
    /// Process exit code for a run that halted this way
    pub fn exit_code(self) -> i32 {
        0
    }
}

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Continue,
    Halted(Halt),
}

/// Program-counter driven statement executor
#[derive(Debug, Clone)]
pub struct Executor {
    /// Program line numbers, ascending
    lines: Vec<LineNumber>,
    /// Index into `lines` of the line about to run
    cursor: usize,
    max_line: LineNumber,
    loop_limit: usize,
    /// Consecutive re-executions of the current line
    repeats: usize,
    /// Set by a false IF for the step that follows it
    else_armed: bool,
}

impl Executor {
    /// Create a new executor
    pub fn new(config: &InterpreterConfig) -> Self {
        Self {
            lines: Vec::new(),
            cursor: 0,
            max_line: 0,
            loop_limit: config.loop_limit,
            repeats: 0,
            else_armed: false,
        }
    }

    /// Run a program from its first line until it halts
    pub fn run(
        &mut self,
        program: &ProgramStore,
        env: &mut Environment,
        console: &mut dyn Console,
    ) -> Result<Halt> {
        let first = program.first_line().ok_or(BasicError::EmptyProgram)?;
        self.run_from(program, env, console, first)
    }

    /// Run a program starting at the given line
    pub fn run_from(
        &mut self,
        program: &ProgramStore,
        env: &mut Environment,
        console: &mut dyn Console,
        line: LineNumber,
    ) -> Result<Halt> {
        self.start_at(program, env, line)?;

        let result = loop {
            match self.step(program, env, console) {
                Ok(StepResult::Continue) => {}
                Ok(StepResult::Halted(halt)) => break Ok(halt),
                Err(err) => break Err(err),
            }
        };

        env.set_running(false);
        match &result {
            Ok(halt) => debug!(?halt, line = ?env.current_line, "run halted"),
            Err(err) => debug!(%err, line = ?env.current_line, "run aborted"),
        }
        result
    }

    /// Prepare to run from the first line
    pub fn start(&mut self, program: &ProgramStore, env: &mut Environment) -> Result<()> {
        let first = program.first_line().ok_or(BasicError::EmptyProgram)?;
        self.start_at(program, env, first)
    }

    /// Prepare to run from a given line
    pub fn start_at(
        &mut self,
        program: &ProgramStore,
        env: &mut Environment,
        line: LineNumber,
    ) -> Result<()> {
        self.lines = program.line_numbers();
        self.max_line = program.last_line().ok_or(BasicError::EmptyProgram)?;
        self.cursor = self.resolve(line, None)?;
        self.repeats = 0;
        self.else_armed = false;

        env.program_counter = line;
        env.current_line = None;
        env.set_running(true);

        debug!(line, max_line = self.max_line, "starting run");
        Ok(())
    }

    /// Execute the line named by the program counter
    pub fn step(
        &mut self,
        program: &ProgramStore,
        env: &mut Environment,
        console: &mut dyn Console,
    ) -> Result<StepResult> {
        if !env.is_running() {
            debug!(line = ?env.current_line, "stop requested");
            return Ok(StepResult::Halted(Halt::Interrupted));
        }

        let pc = env.program_counter;
        if self.lines.is_empty() || pc > self.max_line {
            return Ok(StepResult::Halted(Halt::EndOfProgram));
        }

        // The counter moved somewhere other than the cursor: re-resolve
        if self.lines.get(self.cursor) != Some(&pc) {
            self.cursor = self.resolve(pc, env.current_line)?;
        }

        if env.current_line == Some(pc) {
            self.repeats += 1;
            if self.repeats > self.loop_limit {
                return Err(BasicError::InfiniteLoop {
                    line: pc,
                    repeats: self.repeats,
                });
            }
        } else {
            self.repeats = 0;
        }

        let line = program.get(pc).ok_or(BasicError::UnknownLine {
            target: pc,
            from: env.current_line,
        })?;
        env.current_line = Some(pc);
        debug!(
            line = pc,
            keyword = line.statement.keyword().as_str(),
            control = line.statement.is_control_flow(),
            statement = %line.statement,
            "executing"
        );

        let armed = std::mem::take(&mut self.else_armed);
        match self.execute(&line.statement, armed, env, console)? {
            Flow::Next => {
                self.cursor += 1;
                match self.lines.get(self.cursor) {
                    Some(&next) => {
                        env.program_counter = next;
                        Ok(StepResult::Continue)
                    }
                    None => Ok(StepResult::Halted(Halt::EndOfProgram)),
                }
            }
            Flow::Jump(target) => {
                self.cursor = self.resolve(target, Some(pc))?;
                env.program_counter = target;
                Ok(StepResult::Continue)
            }
            Flow::End => Ok(StepResult::Halted(Halt::End)),
            Flow::Interrupted => Ok(StepResult::Halted(Halt::Interrupted)),
        }
    }

    /// Execute one statement outside of a program run
    ///
    /// There is no preceding line, so `ELSE` never fires here.
    pub fn execute_statement(
        &mut self,
        statement: &Statement,
        env: &mut Environment,
        console: &mut dyn Console,
    ) -> Result<Flow> {
        self.else_armed = false;
        let flow = self.execute(statement, false, env, console);
        self.else_armed = false;
        flow
    }

    fn execute(
        &mut self,
        statement: &Statement,
        else_armed: bool,
        env: &mut Environment,
        console: &mut dyn Console,
    ) -> Result<Flow> {
        match statement {
            Statement::Let { identifier, expr } => {
                let value = evaluate(expr, env)?;
                trace!(var = %identifier, %value, "bind");
                env.set(identifier.clone(), value);
                Ok(Flow::Next)
            }
            Statement::Print { expr } => {
                let text = match expr {
                    Some(expr) => evaluate(expr, env)?.to_string(),
                    None => String::new(),
                };
                console.print_line(&text)?;
                Ok(Flow::Next)
            }
            Statement::Input { identifier, prompt } => {
                self.execute_input(identifier, prompt.as_deref(), env, console)
            }
            Statement::Goto { target } => {
                debug!(to = *target, "goto");
                Ok(Flow::Jump(*target))
            }
            Statement::If { condition, target } => self.branch(condition, *target, env),
            Statement::Else { condition, target } => {
                if !else_armed {
                    debug!(to = *target, "ELSE not reached from a false IF, skipped");
                    return Ok(Flow::Next);
                }
                match condition {
                    Some(condition) => self.branch(condition, *target, env),
                    None => {
                        debug!(to = *target, "ELSE taken");
                        Ok(Flow::Jump(*target))
                    }
                }
            }
            Statement::Rem { .. } => Ok(Flow::Next),
            Statement::End => Ok(Flow::End),
        }
    }

    /// Shared by IF and ELSE IF
    fn branch(
        &mut self,
        condition: &Expression,
        target: LineNumber,
        env: &Environment,
    ) -> Result<Flow> {
        let value = evaluate(condition, env)?;
        if is_true(&value)? {
            debug!(%condition, to = target, "condition true, jumping");
            Ok(Flow::Jump(target))
        } else {
            debug!(%condition, "condition false, falling through");
            self.else_armed = true;
            Ok(Flow::Next)
        }
    }

    fn execute_input(
        &mut self,
        identifier: &str,
        prompt: Option<&str>,
        env: &mut Environment,
        console: &mut dyn Console,
    ) -> Result<Flow> {
        if let Some(prompt) = prompt {
            console.print(prompt)?;
        }

        let Some(text) = console.read_line()? else {
            return Err(BasicError::InputClosed {
                name: identifier.to_string(),
            });
        };

        // A stop that arrived while blocked wins over the input
        if !env.is_running() {
            debug!(var = identifier, "stopped during INPUT, nothing bound");
            return Ok(Flow::Interrupted);
        }

        let value = Value::from_input(&text);
        trace!(var = identifier, %value, "input bound");
        env.set(identifier, value);
        Ok(Flow::Next)
    }

    /// Find the cursor position of a line, or fail with `UnknownLine`
    fn resolve(&self, target: LineNumber, from: Option<LineNumber>) -> Result<usize> {
        self.lines
            .binary_search(&target)
            .map_err(|_| BasicError::UnknownLine { target, from })
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(&InterpreterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::BufferConsole;
    use crate::parser::parse;
    use crate::variables::StopHandle;
    use std::io;

    fn run_source(source: &str) -> (Result<Halt>, Environment, BufferConsole) {
        run_with_input(source, Vec::<String>::new())
    }

    fn run_with_input(
        source: &str,
        input: Vec<String>,
    ) -> (Result<Halt>, Environment, BufferConsole) {
        let program = ProgramStore::load(source).unwrap();
        let mut env = Environment::new();
        let mut console = BufferConsole::with_input(input);
        let result = Executor::default().run(&program, &mut env, &mut console);
        (result, env, console)
    }

    #[test]
    fn test_sequential_program() {
        let (result, env, console) = run_source("0 LET X = 1\n1 PRINT X\n");
        assert_eq!(result.unwrap(), Halt::EndOfProgram);
        assert_eq!(console.output(), "1\n");
        assert_eq!(env.current_line, Some(1));
        assert!(!env.is_running());
    }

    #[test]
    fn test_counting_loop() {
        let source = "0 LET X = 0\n1 LET X = X + 1\n2 IF X < 3 GOTO 1\n3 PRINT X\n";
        let (result, env, console) = run_source(source);
        assert_eq!(result.unwrap(), Halt::EndOfProgram);
        assert_eq!(console.output_lines(), vec!["3"]);
        assert_eq!(env.get("X").unwrap(), &Value::Integer(3));
    }

    #[test]
    fn test_self_goto_is_infinite_loop() {
        let (result, _, _) = run_source("0 GOTO 0");
        match result {
            Err(BasicError::InfiniteLoop { line, repeats }) => {
                assert_eq!(line, 0);
                assert_eq!(repeats, 1001);
            }
            other => panic!("expected infinite loop, got {:?}", other),
        }
    }

    #[test]
    fn test_loop_limit_is_configurable() {
        let program = ProgramStore::load("10 GOTO 10").unwrap();
        let config = InterpreterConfig::new().with_loop_limit(3);
        let mut env = Environment::new();
        let mut console = BufferConsole::new();
        let result = Executor::new(&config).run(&program, &mut env, &mut console);
        assert!(matches!(
            result,
            Err(BasicError::InfiniteLoop { line: 10, repeats: 4 })
        ));
    }

    #[test]
    fn test_goto_unknown_line() {
        let (result, _, console) = run_source("10 PRINT 1\n20 GOTO 999\n30 PRINT 2\n");
        assert!(matches!(
            result,
            Err(BasicError::UnknownLine {
                target: 999,
                from: Some(20)
            })
        ));
        assert_eq!(console.output(), "1\n");
    }

    #[test]
    fn test_goto_gap_between_lines_is_unknown() {
        let (result, _, _) = run_source("10 GOTO 15\n20 END\n");
        assert!(matches!(result, Err(BasicError::UnknownLine { target: 15, .. })));
    }

    #[test]
    fn test_undefined_variable_aborts_run() {
        let (result, _, console) = run_source("10 PRINT Y\n20 PRINT 1\n");
        assert!(matches!(
            result,
            Err(BasicError::UndefinedVariable { ref name }) if name == "Y"
        ));
        assert_eq!(console.output(), "");
    }

    #[test]
    fn test_if_true_skips_else() {
        let source = "\
5 LET X = 1
10 IF X == 1 GOTO 30
20 ELSE GOTO 40
30 PRINT 30
35 END
40 PRINT 40
";
        let (result, _, console) = run_source(source);
        assert_eq!(result.unwrap(), Halt::End);
        assert_eq!(console.output_lines(), vec!["30"]);
    }

    #[test]
    fn test_if_false_falls_through_to_else() {
        let source = "\
5 LET X = 0
10 IF X == 1 GOTO 30
20 ELSE GOTO 40
30 PRINT 30
35 END
40 PRINT 40
";
        let (result, _, console) = run_source(source);
        assert_eq!(result.unwrap(), Halt::EndOfProgram);
        assert_eq!(console.output_lines(), vec!["40"]);
    }

    #[test]
    fn test_else_without_preceding_false_if_is_noop() {
        // Reached by sequential flow from a non-IF line
        let (_, _, console) = run_source("10 PRINT 1\n20 ELSE GOTO 40\n30 PRINT 3\n40 PRINT 4\n");
        assert_eq!(console.output_lines(), vec!["1", "3", "4"]);

        // Reached by a jump
        let (_, _, console) = run_source("10 GOTO 20\n20 ELSE GOTO 40\n30 PRINT 3\n40 PRINT 4\n");
        assert_eq!(console.output_lines(), vec!["3", "4"]);
    }

    #[test]
    fn test_else_if_chain() {
        let source = "\
5 LET X = 2
10 IF X == 1 GOTO 100
20 ELSE IF X == 2 GOTO 200
30 ELSE GOTO 300
100 PRINT 100
110 END
200 PRINT 200
210 END
300 PRINT 300
";
        let (_, _, console) = run_source(source);
        assert_eq!(console.output_lines(), vec!["200"]);

        let (_, _, console) = run_source(&source.replace("LET X = 2", "LET X = 7"));
        assert_eq!(console.output_lines(), vec!["300"]);
    }

    #[test]
    fn test_end_differs_from_end_of_program() {
        let (result, _, console) = run_source("10 PRINT 1\n20 END\n30 PRINT 2\n");
        assert_eq!(result.unwrap(), Halt::End);
        assert_eq!(console.output(), "1\n");

        let (result, _, _) = run_source("10 PRINT 1\n");
        assert_eq!(result.unwrap(), Halt::EndOfProgram);
    }

    #[test]
    fn test_empty_program() {
        let program = ProgramStore::new();
        let mut env = Environment::new();
        let mut console = BufferConsole::new();
        let result = Executor::default().run(&program, &mut env, &mut console);
        assert!(matches!(result, Err(BasicError::EmptyProgram)));
    }

    #[test]
    fn test_print_blank_line() {
        let (_, _, console) = run_source("10 PRINT\n20 PRINT \"A B\"\n");
        assert_eq!(console.output(), "\nA B\n");
    }

    #[test]
    fn test_input_binds_integer_or_text() {
        let source = "10 INPUT \"N? \" N\n20 INPUT S\n30 PRINT N + 1\n40 PRINT S\n";
        let (result, env, console) =
            run_with_input(source, vec!["41\n".to_string(), "hello\n".to_string()]);
        assert_eq!(result.unwrap(), Halt::EndOfProgram);
        assert_eq!(env.get("S").unwrap(), &Value::from("hello"));
        assert_eq!(console.output(), "N? 42\nhello\n");
    }

    #[test]
    fn test_input_exhausted_is_an_error() {
        let source = "10 INPUT N\n20 PRINT N * 2\n30 PRINT \"done\"\n";
        let (result, env, console) = run_source(source);
        let err = result.unwrap_err();
        assert!(matches!(err, BasicError::InputClosed { ref name } if name == "N"));
        assert_eq!(err.exit_code(), 1);
        assert!(!env.contains("N"));
        assert!(!env.is_running());
        assert_eq!(env.current_line, Some(10));
        assert_eq!(console.output(), "");
    }

    /// Console whose input arrives after a stop request
    struct StoppingConsole {
        handle: StopHandle,
    }

    impl Console for StoppingConsole {
        fn print(&mut self, _text: &str) -> io::Result<()> {
            Ok(())
        }

        fn print_line(&mut self, _text: &str) -> io::Result<()> {
            Ok(())
        }

        fn read_line(&mut self) -> io::Result<Option<String>> {
            self.handle.stop();
            Ok(Some("5\n".to_string()))
        }
    }

    #[test]
    fn test_stop_during_input_binds_nothing() {
        let program = ProgramStore::load("10 INPUT N\n20 PRINT N\n").unwrap();
        let mut env = Environment::new();
        let mut console = StoppingConsole {
            handle: env.stop_handle(),
        };
        let result = Executor::default().run(&program, &mut env, &mut console);
        assert_eq!(result.unwrap(), Halt::Interrupted);
        assert!(!env.contains("N"));
    }

    #[test]
    fn test_stop_handle_halts_between_steps() {
        let program = ProgramStore::load("10 LET X = 1\n20 LET X = 2\n30 GOTO 20\n").unwrap();
        let mut env = Environment::new();
        let mut console = BufferConsole::new();
        let mut executor = Executor::default();

        executor.start(&program, &mut env).unwrap();
        assert_eq!(env.program_counter, 10);
        assert_eq!(env.current_line, None);

        assert_eq!(
            executor.step(&program, &mut env, &mut console).unwrap(),
            StepResult::Continue
        );
        assert_eq!(env.program_counter, 20);

        env.stop_handle().stop();
        assert_eq!(
            executor.step(&program, &mut env, &mut console).unwrap(),
            StepResult::Halted(Halt::Interrupted)
        );
        assert_eq!(env.get("X").unwrap(), &Value::Integer(1));
        assert_eq!(env.current_line, Some(10));
    }

    #[test]
    fn test_externally_moved_counter_is_resolved() {
        let program = ProgramStore::load("10 PRINT 1\n20 PRINT 2\n30 PRINT 3\n").unwrap();
        let mut env = Environment::new();
        let mut console = BufferConsole::new();
        let mut executor = Executor::default();

        executor.start(&program, &mut env).unwrap();
        env.program_counter = 30;
        executor.step(&program, &mut env, &mut console).unwrap();
        assert_eq!(console.output(), "3\n");

        executor.start(&program, &mut env).unwrap();
        env.program_counter = 25;
        assert!(matches!(
            executor.step(&program, &mut env, &mut console),
            Err(BasicError::UnknownLine { target: 25, .. })
        ));
    }

    #[test]
    fn test_run_from_line() {
        let program = ProgramStore::load("10 PRINT 1\n20 PRINT 2\n").unwrap();
        let mut env = Environment::new();
        let mut console = BufferConsole::new();
        let mut executor = Executor::default();

        executor.run_from(&program, &mut env, &mut console, 20).unwrap();
        assert_eq!(console.output(), "2\n");

        assert!(matches!(
            executor.run_from(&program, &mut env, &mut console, 15),
            Err(BasicError::UnknownLine { target: 15, from: None })
        ));
    }

    #[test]
    fn test_execute_statement_reports_flow() {
        let mut executor = Executor::default();
        let mut env = Environment::new();
        let mut console = BufferConsole::new();

        let flow = executor
            .execute_statement(&parse("LET A = 3").unwrap(), &mut env, &mut console)
            .unwrap();
        assert_eq!(flow, Flow::Next);
        assert_eq!(env.get("A").unwrap(), &Value::Integer(3));

        let flow = executor
            .execute_statement(&parse("IF A == 3 GOTO 50").unwrap(), &mut env, &mut console)
            .unwrap();
        assert_eq!(flow, Flow::Jump(50));

        let flow = executor
            .execute_statement(&parse("ELSE GOTO 60").unwrap(), &mut env, &mut console)
            .unwrap();
        assert_eq!(flow, Flow::Next);

        let flow = executor
            .execute_statement(&parse("END").unwrap(), &mut env, &mut console)
            .unwrap();
        assert_eq!(flow, Flow::End);
    }

    #[test]
    fn test_string_condition_is_error() {
        let (result, _, _) = run_source("10 LET S = \"yes\"\n20 IF S GOTO 10\n");
        assert!(matches!(result, Err(BasicError::NonIntegerCondition { .. })));
    }

    #[test]
    fn test_halt_exit_codes() {
        assert_eq!(Halt::EndOfProgram.exit_code(), 0);
        assert_eq!(Halt::End.exit_code(), 0);
        assert_eq!(Halt::Interrupted.exit_code(), 0);
    }
}
