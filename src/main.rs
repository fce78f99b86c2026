use std::io::ErrorKind;
use std::{env, process};

use bramble::{run_file, run_repl, InterpretResult};

/// `prog` (REPL), `prog <path>` (run once), or `prog --disassemble
/// <path>` (compile and dump bytecode instead of running it). Argument
/// handling is a plain hand-rolled match on `env::args()` — no
/// CLI-parsing crate.
fn main() {
    let args: Vec<String> = env::args().collect();

    match args.as_slice() {
        [_] => run_repl(),
        [_, path] if path != "--disassemble" && path != "--plv" => {
            let code = match run_file(path) {
                Ok(InterpretResult::Ok) => 0,
                Ok(InterpretResult::CompileError) => 65,
                Ok(InterpretResult::RuntimeError) => 70,
                Err(err) => {
                    report_io_error(path, &err);
                    74
                }
            };
            process::exit(code);
        }
        [_, flag, path] if flag == "--disassemble" => process::exit(disassemble(path)),
        #[cfg(feature = "plv")]
        [_, flag, path] if flag == "--plv" => process::exit(export_plv(path)),
        _ => {
            eprintln!("Usage: bramble [--disassemble|--plv] [path]");
            process::exit(64);
        }
    }
}

/// Compiles `path` without running it and dumps the full bytecode tree
/// (the script plus every nested function, recursively) to stdout.
fn disassemble(path: &str) -> i32 {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            report_io_error(path, &err);
            return 74;
        }
    };

    let mut engine = bramble::Engine::new();
    match bramble::compiler::Compiler::compile(&source, &mut engine) {
        Some(handle) => {
            let function = engine.heap.as_function(handle).expect("compile() returns a Function handle");
            function.chunk.disassemble_recursive(&engine.heap, "<script>");
            0
        }
        None => 65,
    }
}

/// Compiles `path` and writes a JSON dump of its bytecode (recursively
/// into nested functions) to `./bramble_plv.json`, for tooling built
/// against the Program Lifecycle Visualizer's old JSON shape.
#[cfg(feature = "plv")]
fn export_plv(path: &str) -> i32 {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            report_io_error(path, &err);
            return 74;
        }
    };

    let mut engine = bramble::Engine::new();
    match bramble::compiler::Compiler::compile(&source, &mut engine) {
        Some(handle) => {
            let function = engine.heap.as_function(handle).expect("compile() returns a Function handle");
            bramble::plv::write_report(&function.chunk, &engine.heap, "<script>", "./bramble_plv.json")
                .expect("writing the PLV report should not fail");
            0
        }
        None => 65,
    }
}

fn report_io_error(path: &str, err: &std::io::Error) {
    match err.kind() {
        ErrorKind::NotFound => eprintln!("File '{}' not found.", path),
        ErrorKind::PermissionDenied => eprintln!("Need permission to open '{}'.", path),
        _ => eprintln!("Unexpected error reading '{}': {}", path, err),
    }
}
