use mylisp::ast::Value;
use mylisp::builtinops::BUILTIN_OPS;
use mylisp::evaluator::{self, Environment};
use mylisp::interpret;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::panic;
use std::process;

fn main() {
    init_tracing();

    let result = panic::catch_unwind(|| {
        run_repl();
    });

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");

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

/// Log to stderr, only if RUST_LOG is set
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn run_repl() {
    println!("MyLisp Version 0.1.0");
    println!("Enter expressions like: (+ 1 2)");
    println!("Type :help for more commands, or Ctrl+C to exit.");
    println!();

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("Could not initialize REPL: {err}");
            process::exit(1);
        }
    };
    let mut env = evaluator::create_global_env();

    loop {
        match rl.readline("mylisp> ") {
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
                        print_environment(&env);
                        continue;
                    }
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                // Errors are values too, so there is always something to print
                println!("{}", interpret(line, &mut env));
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  :help      - Show this help message");
    println!("  :env       - Show current environment bindings");
    println!("  :quit      - Exit the interpreter");
    println!("  :exit      - Exit the interpreter");
    println!("  Ctrl+C     - Exit the interpreter");
    println!();
    println!("Builtins:");
    for chunk in BUILTIN_OPS.chunks(8) {
        let names: Vec<_> = chunk.iter().map(|op| op.id).collect();
        println!("  {}", names.join(" "));
    }
    println!();
    println!("Examples:");
    println!("  (+ 1 2.5)");
    println!("  (set 'add (lambda '(x y) '(+ x y)))");
    println!("  ((add 3) 4)");
    println!("  ((lambda '(x & rest) '(list x rest)) 1 2 3)");
    println!("  (if (> 2 1) 'yes 'no)");
    println!();
}

fn print_environment(env: &Environment) {
    let bindings = env.get_all_bindings();

    // Separate built-in functions from user-defined values
    let (builtins, user_defined): (Vec<_>, Vec<_>) = bindings
        .into_iter()
        .partition(|(_, value)| matches!(value, Value::Builtin(_)));

    println!("Built-in functions ({}):", builtins.len());
    let mut col = 0;
    for (name, _) in builtins {
        print!("  {name:<10}");
        col += 1;
        if col % 6 == 0 {
            println!();
        }
    }
    if col % 6 != 0 {
        println!();
    }
    println!();

    if user_defined.is_empty() {
        println!("No user-defined values.");
        return;
    }
    println!("User-defined values ({}):", user_defined.len());
    for (name, value) in user_defined {
        println!("  {name} = {value}");
    }
}
