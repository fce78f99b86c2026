//! `bramble`: a single-pass bytecode compiler and stack-machine VM for
//! a small dynamically typed scripting language. This crate root wires
//! the pieces together behind the handful of entry points the CLI
//! (`src/main.rs`) and integration tests call.

pub mod chunk;
pub mod compiler;
pub mod engine;
pub mod errors;
pub mod heap;
#[cfg(feature = "plv")]
pub mod plv;
pub mod scanner;
pub mod table;
pub mod value;
pub mod virtual_machine;

use std::io::{self, Write};

pub use engine::Engine;
pub use virtual_machine::{InterpretResult, Sink, VM};

/// Compiles and runs `source` against a brand-new `Engine`, for
/// one-shot use (the `prog <path>` CLI form, and most tests). A REPL
/// instead keeps one `Engine`/`VM` pair alive across lines — see
/// `run_repl` below.
pub fn run_source(source: &str) -> InterpretResult {
    let mut engine = Engine::new();
    let mut vm = VM::new(&mut engine);
    vm.interpret(source)
}

/// Reads `path` and interprets it once against a fresh `Engine`/`VM`
/// pair. The `Err` case is a plain I/O failure (file not found,
/// permission denied, ...); the caller (`main.rs`) maps that and the
/// returned `InterpretResult` to a process exit code.
pub fn run_file(path: &str) -> io::Result<InterpretResult> {
    let source = std::fs::read_to_string(path)?;
    Ok(run_source(&source))
}

/// The interactive REPL: one `Engine`/`VM` pair lives for the whole
/// session, so a `var` declared on one line is still visible on the
/// next. Reads from stdin one line at a time until EOF (an empty
/// `read_line`); a compile or runtime error on one line is reported to
/// stderr but does not end the session.
pub fn run_repl() {
    let mut engine = Engine::new();
    let mut vm = VM::new(&mut engine);
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().expect("stdout flush should not fail");

        line.clear();
        let bytes_read = stdin.read_line(&mut line).expect("reading a line from stdin should not fail");
        if bytes_read == 0 {
            println!();
            break;
        }

        vm.interpret(&line);
    }
}

/// Like `run_source`, but routes everything the program `print`s into
/// an in-memory buffer instead of real stdout, so integration tests can
/// assert on output without spawning the built binary as a subprocess.
pub fn run_source_capturing(source: &str) -> (InterpretResult, String) {
    let mut engine = Engine::new();
    let mut vm = VM::with_writer(&mut engine, Sink::Buffer(Vec::new()));
    let result = vm.interpret(source);
    let captured = vm.into_captured_stdout();
    (result, captured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_precedence_scenario() {
        assert_eq!(run_source("print 1 + 2 * 3;"), InterpretResult::Ok);
    }

    #[test]
    fn bad_syntax_is_a_compile_error() {
        assert_eq!(run_source("var;"), InterpretResult::CompileError);
    }

    #[test]
    fn adding_a_string_to_a_number_is_a_runtime_error() {
        assert_eq!(run_source("\"a\" + 1;"), InterpretResult::RuntimeError);
    }
}
