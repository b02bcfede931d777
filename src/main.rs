use std::env;
use std::panic;
use std::path::Path;
use std::process;

use qlisp::ast::{Function, Value};
use qlisp::environment::Environment;
use qlisp::evaluator::{create_global_env, eval};
use qlisp::printer::to_string;
use qlisp::reader::read_str;
use qlisp::{loader, prelude};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

const VERSION: &str = env!("CARGO_PKG_VERSION");

enum ExitCode {
    ArgumentError,
    RuntimeError,
}

impl ExitCode {
    fn code(&self) -> i32 {
        match self {
            ExitCode::ArgumentError => 1,
            ExitCode::RuntimeError => 2,
        }
    }
}

#[derive(Debug, Default)]
struct Options {
    files: Vec<String>,
    eval: Option<String>,
    no_prelude: bool,
}

fn main() {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_usage();
            process::exit(0);
        }
        Err(message) => {
            eprintln!("Error: {message}");
            eprintln!("Try 'qlisp --help' for more information.");
            process::exit(ExitCode::ArgumentError.code());
        }
    };

    let result = panic::catch_unwind(|| run(&options));

    match result {
        Ok(Ok(())) => {}
        Ok(Err(exit)) => process::exit(exit.code()),
        Err(panic_info) => {
            eprintln!("The interpreter encountered an unexpected error and must exit.");

            if let Some(msg) = panic_info.downcast_ref::<&str>() {
                eprintln!("Error: {msg}");
            } else if let Some(msg) = panic_info.downcast_ref::<String>() {
                eprintln!("Error: {msg}");
            } else {
                eprintln!("Error: Unknown panic occurred");
            }

            process::exit(1);
        }
    }
}

/// Install a stderr subscriber when `QLISP_LOG` (or `RUST_LOG`) is set
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let Ok(directives) = env::var("QLISP_LOG").or_else(|_| env::var("RUST_LOG")) else {
        return;
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(EnvFilter::new(directives))
        .init();
}

/// `Ok(None)` means help was requested
fn parse_args(args: &[String]) -> Result<Option<Options>, String> {
    let mut options = Options::default();
    let mut args = args.iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--no-prelude" => options.no_prelude = true,
            "-e" | "--eval" => match args.next() {
                Some(expr) => options.eval = Some(expr.clone()),
                None => return Err(format!("{arg} requires an expression argument")),
            },
            file if !file.starts_with('-') => options.files.push(file.to_owned()),
            unknown => return Err(format!("Unknown option: {unknown}")),
        }
    }

    Ok(Some(options))
}

fn run(options: &Options) -> Result<(), ExitCode> {
    let mut env = create_global_env();

    if !options.no_prelude
        && let Err(err) = prelude::load_prelude(&mut env)
    {
        eprintln!("Warning: {err}");
    }

    for file in &options.files {
        let result = loader::load(&mut env, Path::new(file));
        if result.is_error() {
            println!("{}", to_string(&env, &result));
        }
    }

    if let Some(expr) = &options.eval {
        return eval_and_print(&mut env, expr);
    }

    if options.files.is_empty() {
        return run_repl(&mut env);
    }

    Ok(())
}

/// Evaluate one line as a program and print the result
fn eval_and_print(env: &mut Environment<'_>, line: &str) -> Result<(), ExitCode> {
    match read_str(line) {
        Ok(program) => {
            let result = eval(env, program);
            println!("{}", to_string(env, &result));
            if result.is_error() {
                return Err(ExitCode::RuntimeError);
            }
            Ok(())
        }
        Err(err) => {
            println!("<stdin>:{err}");
            Err(ExitCode::RuntimeError)
        }
    }
}

fn run_repl(env: &mut Environment<'_>) -> Result<(), ExitCode> {
    println!("qlisp {VERSION}");
    println!("Enter expressions like: (+ 1 2) or (map (\\ {{x}} {{* x x}}) {{1 2 3}})");
    println!("Type :help for more commands, or Ctrl+C to exit.");
    println!();

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("Could not initialize REPL: {err}");
            return Err(ExitCode::RuntimeError);
        }
    };

    loop {
        match rl.readline("qlisp> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                // Add the line to history
                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":env" => {
                        print_environment(env);
                        continue;
                    }
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                // Errors are already printed; the session carries on
                let _ = eval_and_print(env, line);
            }

            Err(ReadlineError::Eof | ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }

    Ok(())
}

fn print_usage() {
    println!("qlisp {VERSION} - a small Lisp with quoted expressions");
    println!();
    println!("Usage: qlisp [OPTIONS] [FILE...]");
    println!();
    println!("Loads each FILE in order into one session. With no FILE and no");
    println!("--eval, starts an interactive REPL.");
    println!();
    println!("Options:");
    println!("  -e, --eval EXPR   Evaluate EXPR and print the result");
    println!("      --no-prelude  Do not load the standard prelude");
    println!("  -h, --help        Show this help message");
    println!();
    println!("Environment:");
    println!("  QLISP_LOG         Log filter, e.g. 'qlisp=debug' (falls back to RUST_LOG)");
}

fn print_help() {
    println!("REPL commands:");
    println!("  :help      - Show this help message");
    println!("  :env       - Show current environment bindings");
    println!("  :quit      - Exit the interpreter");
    println!("  :exit      - Exit the interpreter");
    println!("  Ctrl+C     - Exit the interpreter");
    println!();
    println!("Language:");
    println!("  Numbers: 42, -5, 0x1F, 017     Strings: \"hello\\n\"");
    println!("  S-expressions are evaluated:   (+ 1 2)");
    println!("  Q-expressions are quoted:      {{1 2 (+ 1 2)}}");
    println!("  Arithmetic: + - * / %          Comparison: == != < <= > >=");
    println!("  Logic: && || !                 Bitwise: & | ^ ~ << >>");
    println!("  Lists: list head tail join eval");
    println!("  Definitions: def (global), = (local), \\ (lambda)");
    println!("  Other: if type error print load assert assert_err");
    println!();
    println!("Examples:");
    println!("  (def {{add}} (\\ {{a b}} {{+ a b}}))");
    println!("  (def {{inc}} (add 1))      ; partial application");
    println!("  (fun {{rest x & xs}} {{xs}})  ; variadic formals (prelude)");
    println!("  (map inc {{1 2 3}})");
    println!();
}

fn print_environment(env: &Environment<'_>) {
    let bindings = env.bindings();

    if bindings.is_empty() {
        println!("Environment is empty.");
        return;
    }

    println!("Environment bindings ({} total):", bindings.len());
    println!();

    // Separate built-in functions from user-defined values
    let mut builtins = Vec::new();
    let mut user_defined = Vec::new();

    for (name, value) in bindings.iter() {
        match value {
            Value::Function(Function::Native(_)) => builtins.push(name),
            _ => user_defined.push((name, value)),
        }
    }

    if !builtins.is_empty() {
        println!("Built-in functions ({}):", builtins.len());
        // Print in columns for readability
        let mut col = 0;
        for name in builtins {
            print!("  {name:<15}");
            col += 1;
            if col % 4 == 0 {
                println!();
            }
        }
        if col % 4 != 0 {
            println!();
        }
        println!();
    }

    if !user_defined.is_empty() {
        println!("User-defined values ({}):", user_defined.len());
        for (name, value) in user_defined {
            println!("  {name} = {}", to_string(env, value));
        }
    }
}
