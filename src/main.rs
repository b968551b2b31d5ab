// ABOUTME: CLI driver (§6) — script/one-shot stdin modes, REPL, and prelude loading

mod config;
mod env;
mod error;
mod eval;
mod facade;
mod lexer;
mod mode;
mod parser;
mod primitives;
mod sandbox;
mod value;

use clap::Parser;
use config::{FsConfig, HISTORY_FILE, PRELUDE_PATH, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use env::Environment;
use error::HostError;
use eval::Evaluator;
use parser::parse_program;
use primitives::root_environment;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use sandbox::Sandbox;
use std::io::Read as _;
use std::path::PathBuf;
use std::rc::Rc;
use value::Value;

const PROMPT: &str = "> ";

/// A stack-driven Lisp-family evaluator with closures, macros, and
/// structured Fatal propagation.
#[derive(Parser, Debug)]
#[command(name = "lisp-eval-core")]
#[command(version = config::VERSION)]
#[command(about = "A stack-driven Lisp-family evaluator")]
struct CliArgs {
    /// Script file to run; omit to start the REPL
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Read one program from stdin up to a blank line, evaluate it, and exit
    #[arg(short = 'n')]
    blank_line: bool,

    /// Read one program from stdin until EOF, evaluate it, and exit
    #[arg(short = 'e')]
    eof: bool,

    /// Allowed filesystem root for the `load` primitive (repeatable; defaults to ".")
    #[arg(long = "fs-sandbox", value_name = "PATH", action = clap::ArgAction::Append)]
    fs_paths: Vec<PathBuf>,

    /// Maximum file size in bytes the sandbox will read
    #[arg(long = "max-file-size", value_name = "BYTES", default_value_t = FsConfig::default().max_file_size)]
    max_file_size: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let fs_config = FsConfig {
        allowed_paths: if args.fs_paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            args.fs_paths.clone()
        },
        max_file_size: args.max_file_size,
    };
    let sandbox = Sandbox::new(fs_config)?;

    let env = root_environment();
    load_prelude(&env, &sandbox);

    if let Some(script_path) = &args.script {
        let contents = std::fs::read_to_string(script_path)
            .map_err(|e| format!("cannot read {}: {}", script_path.display(), e))?;
        let result = run_source(&contents, env, Some(&sandbox))?;
        print_result(&result);
        return Ok(());
    }

    if args.blank_line {
        let source = read_until_blank_line();
        let result = run_source(&source, env, Some(&sandbox))?;
        print_result(&result);
        return Ok(());
    }

    if args.eof {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        let result = run_source(&source, env, Some(&sandbox))?;
        print_result(&result);
        return Ok(());
    }

    run_repl(env, &sandbox)
}

fn run_source(source: &str, env: Rc<Environment>, sandbox: Option<&Sandbox>) -> Result<Value, HostError> {
    let program = parse_program(source)?;
    let mut evaluator = Evaluator::new(program, env, sandbox);
    Ok(evaluator.run())
}

fn print_result(value: &Value) {
    println!("{PROMPT}{value}");
}

/// Reads stdin to a blank line (§6 `-n`), not including the blank line
/// itself, concatenated with newlines preserved for the parser.
fn read_until_blank_line() -> String {
    use std::io::BufRead;
    let stdin = std::io::stdin();
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line).unwrap_or(0);
        if read == 0 || line.trim().is_empty() {
            break;
        }
        lines.push(line);
    }
    lines.concat()
}

/// Loads the fixed-path prelude if present, evaluating it against `env`
/// before any user program runs (§6 "Persisted state"). Failures are
/// reported but non-fatal to startup.
fn load_prelude(env: &Rc<Environment>, sandbox: &Sandbox) {
    if !sandbox.file_exists(PRELUDE_PATH) {
        return;
    }
    let contents = match sandbox.read_file(PRELUDE_PATH) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("warning: could not read prelude: {e}");
            return;
        }
    };
    match parse_program(&contents) {
        Ok(program) => {
            let mut evaluator = Evaluator::new(program, env.clone(), Some(sandbox));
            let result = evaluator.run();
            if result.is_fatal() {
                eprintln!("warning: prelude raised an uncaught fatal");
            }
        }
        Err(e) => eprintln!("warning: could not parse prelude: {e}"),
    }
}

/// Interactive REPL (§6): accumulates lines until they parse as a
/// complete program, evaluates, and prints the result after `> `.
fn run_repl(env: Rc<Environment>, sandbox: &Sandbox) -> Result<(), Box<dyn std::error::Error>> {
    let rl_config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), rustyline::history::DefaultHistory> = Editor::with_config(rl_config)?;
    let _ = rl.load_history(HISTORY_FILE);

    println!("{WELCOME_MESSAGE}");
    println!("{WELCOME_SUBTITLE}");

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() { PROMPT } else { "  " };
        match rl.readline(prompt) {
            Ok(line) => {
                buffer.push_str(&line);
                buffer.push('\n');
                if buffer.trim().is_empty() {
                    buffer.clear();
                    continue;
                }
                match parse_program(&buffer) {
                    Ok(program) => {
                        let mut evaluator = Evaluator::new(program, env.clone(), Some(sandbox));
                        let result = evaluator.run();
                        print_result(&result);
                        buffer.clear();
                    }
                    Err(e) if incomplete(&e) => continue,
                    Err(e) => {
                        eprintln!("parse error: {e}");
                        buffer.clear();
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {e}");
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    Ok(())
}

/// Distinguishes "needs another line" from a genuine syntax error, so the
/// REPL can keep accumulating a multi-line form instead of reporting a
/// spurious error on every incomplete `(`.
fn incomplete(err: &HostError) -> bool {
    matches!(err, HostError::Parse { message, .. } if message.contains("unclosed") || message.contains("end of input"))
}
