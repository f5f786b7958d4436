use clap::{Parser, Subcommand};
use line_basic::{BasicError, CommandOutcome, ErrorPolicy, Halt, InterpreterConfig, Session};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "line-basic", version, about = "Line-numbered BASIC interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a program file and run it
    Run {
        /// Path to a BASIC source file
        file: PathBuf,
        /// Log each parsed line and control transfer
        #[arg(short, long)]
        verbose: bool,
    },
    /// Interactive prompt
    Repl {
        /// Log each parsed line and control transfer
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Run { file, verbose } => {
            init_tracing(verbose);
            run_file(&file)
        }
        Command::Repl { verbose } => {
            init_tracing(verbose);
            repl()
        }
    }
}

/// RUST_LOG wins; otherwise `--verbose` turns on the interpreter's debug events
fn init_tracing(verbose: bool) {
    let default = if verbose { "line_basic=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run_file(file: &Path) -> ExitCode {
    // Under the exit policy an error prints itself and ends the process
    let policy = ErrorPolicy::Exit;
    let Ok(source) = policy.apply(fs::read_to_string(file).map_err(BasicError::from)) else {
        return ExitCode::FAILURE;
    };

    let mut session = Session::with_config(InterpreterConfig::new().with_error_policy(policy));
    if session.load(&source).is_err() {
        return ExitCode::FAILURE;
    }

    match session.run() {
        Ok(halt) => {
            if halt == Halt::End {
                println!("Program ended");
            }
            ExitCode::from(halt.exit_code() as u8)
        }
        Err(_) => ExitCode::FAILURE,
    }
}

fn repl() -> ExitCode {
    println!("BASIC interpreter v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' to quit, 'help' for help\n");

    let mut session = Session::new();
    let stdin = io::stdin();
    let mut line_buffer = String::new();

    loop {
        print!("BASIC> ");
        if io::stdout().flush().is_err() {
            return ExitCode::FAILURE;
        }

        line_buffer.clear();
        match stdin.lock().read_line(&mut line_buffer) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let input = line_buffer.trim();
        if input.eq_ignore_ascii_case("help") {
            print_help();
            continue;
        }

        match session.command(input) {
            Ok(CommandOutcome::Exit) => break,
            Ok(CommandOutcome::Ran(Halt::End)) => println!("Program ended"),
            Ok(_) => {}
            Err(e) => println!("Error: {}", e),
        }
    }

    println!("Goodbye!");
    ExitCode::SUCCESS
}

fn print_help() {
    println!("Commands:");
    println!("  list           - Show the stored program");
    println!("  run            - Run the stored program");
    println!("  new            - Clear the program and variables");
    println!("  exit           - Leave the interpreter");
    println!("  <n> <stmt>     - Store or replace line n");
    println!("  <n>            - Delete line n");
    println!("  <stmt>         - Execute a statement immediately");
    println!();
    println!("Statements:");
    println!("  LET X = <expr>");
    println!("  PRINT [<expr>]");
    println!("  INPUT [\"prompt\"] X");
    println!("  GOTO <n>");
    println!("  IF <expr> GOTO <n>");
    println!("  ELSE GOTO <n> | ELSE IF <expr> GOTO <n>");
    println!("  REM <comment>");
    println!("  END");
    println!();
}
