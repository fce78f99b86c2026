mod call_frame;
mod run;

use std::io::{self, Write};

use crate::chunk::Chunk;
use crate::compiler::Compiler;
use crate::engine::Engine;
use crate::errors::{report_runtime_error, FrameInfo};
use crate::heap::Handle;
use crate::table::Table;
use crate::value::Value;

pub use call_frame::CallFrame;

const FRAMES_MAX: usize = 64;

/// Where `OP_PRINT` writes. Real stdout in normal use; an in-memory
/// buffer in tests, so `run_source_capturing` can assert on a program's
/// output without spawning the built binary as a subprocess. A plain
/// `Box<dyn Write>` can't be downcast back to its buffer afterward, so
/// this is a closed enum instead.
pub enum Sink {
    Stdout(io::Stdout),
    Buffer(Vec<u8>),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Stdout(s) => s.write(buf),
            Sink::Buffer(b) => b.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Stdout(s) => s.flush(),
            Sink::Buffer(b) => b.flush(),
        }
    }
}

/// The three outcomes a host (CLI/REPL) can observe from a run.
/// Nothing finer-grained crosses this boundary — there is no in-band
/// `try` for the guest language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileError,
    RuntimeError,
}

/// The stack-machine interpreter: a value stack, a stack of call
/// frames, a globals table, and a borrow of the `Engine` (heap +
/// string intern set) it shares with whichever `Compiler` produced the
/// chunks it runs. One `VM` persists across an entire REPL session so
/// that `var` declarations and other globals survive from one typed
/// line to the next.
pub struct VM<'a> {
    engine: &'a mut Engine,
    frames: Vec<CallFrame>,
    stack: Vec<Value>,
    globals: Table,
    trace: bool,
    /// Where `print` statements write. Defaults to real stdout; tests
    /// swap in an in-memory buffer so `run_source_capturing` can assert
    /// on program output without spawning a subprocess.
    stdout: Sink,
}

impl<'a> VM<'a> {
    pub fn new(engine: &'a mut Engine) -> Self {
        Self::with_writer(engine, Sink::Stdout(io::stdout()))
    }

    pub fn with_writer(engine: &'a mut Engine, writer: Sink) -> Self {
        VM {
            engine,
            frames: Vec::with_capacity(FRAMES_MAX),
            stack: Vec::with_capacity(256),
            globals: Table::new(),
            trace: std::env::var_os("BRAMBLE_TRACE").is_some(),
            stdout: writer,
        }
    }

    /// Consumes the VM and returns whatever was written to its sink as
    /// a `String`. Only meaningful when constructed with a `Sink::Buffer`
    /// (as `run_source_capturing` does); returns an empty string for a
    /// real-stdout-backed `VM`.
    pub fn into_captured_stdout(self) -> String {
        match self.stdout {
            Sink::Buffer(bytes) => String::from_utf8(bytes).expect("captured output is valid UTF-8"),
            Sink::Stdout(_) => String::new(),
        }
    }

    /// Compiles `source` against this VM's shared `Engine` and, if
    /// compilation succeeds, runs the resulting script. Globals and the
    /// heap persist across calls; the value stack and call-frame stack
    /// are reset at the start of each call so one REPL line's failure
    /// can't corrupt the next line's starting state.
    pub fn interpret(&mut self, source: &str) -> InterpretResult {
        let script = match Compiler::compile(source, self.engine) {
            Some(handle) => handle,
            None => return InterpretResult::CompileError,
        };

        self.stack.clear();
        self.frames.clear();
        self.stack.push(Value::Obj(script));

        if let Err(message) = self.call(script, 0) {
            self.fail(&message);
            return InterpretResult::RuntimeError;
        }

        match self.run() {
            Ok(()) => InterpretResult::Ok,
            Err(message) => {
                self.fail(&message);
                InterpretResult::RuntimeError
            }
        }
    }

    /// Reports a runtime error with a full stack trace, then resets the
    /// stack so a REPL session can keep accepting input afterward.
    fn fail(&mut self, message: &str) {
        let frame_infos: Vec<FrameInfo<'_>> = self
            .frames
            .iter()
            .rev()
            .map(|frame| {
                let function = self.engine.heap.as_function(frame.function).unwrap();
                let line = function.chunk.lines[frame.ip.saturating_sub(1)];
                let name = function.name.map(|h| self.engine.heap.as_string(h).unwrap().chars.as_str());
                FrameInfo { name, line }
            })
            .collect();

        report_runtime_error(message, &frame_infos);
        self.stack.clear();
        self.frames.clear();
    }

    fn current_frame(&self) -> &CallFrame {
        self.frames.last().expect("run() never executes with an empty frame stack")
    }

    fn current_chunk(&self) -> &Chunk {
        &self.engine.heap.as_function(self.current_frame().function).unwrap().chunk
    }

    fn read_byte(&mut self) -> u8 {
        let ip = self.current_frame().ip;
        let byte = self.current_chunk().code[ip];
        self.frames.last_mut().unwrap().ip += 1;
        byte
    }

    fn read_short(&mut self) -> u16 {
        let ip = self.current_frame().ip;
        let bytes = [self.current_chunk().code[ip], self.current_chunk().code[ip + 1]];
        self.frames.last_mut().unwrap().ip += 2;
        u16::from_be_bytes(bytes)
    }

    fn read_constant(&mut self, idx: u8) -> Value {
        self.current_chunk().constants[idx as usize]
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Value {
        self.stack.pop().expect("a well-formed chunk never pops an empty stack")
    }

    fn peek(&self, distance: usize) -> Value {
        self.stack[self.stack.len() - 1 - distance]
    }

    /// Calls `callee` (already on the stack at `argc` below the top)
    /// with `argc` arguments already pushed above it. Pushes the new
    /// `CallFrame` on success.
    fn call(&mut self, callee: Handle, argc: u8) -> Result<(), String> {
        let function = self
            .engine
            .heap
            .as_function(callee)
            .ok_or_else(|| "Can only call functions.".to_string())?;

        if function.arity != argc {
            return Err(format!("Expected {} arguments but got {}.", function.arity, argc));
        }

        if self.frames.len() == FRAMES_MAX {
            return Err("Stack overflow.".to_string());
        }

        let slot_base = self.stack.len() - argc as usize - 1;
        self.frames.push(CallFrame { function: callee, ip: 0, slot_base });
        Ok(())
    }

    /// Dispatches a callee `Value` that may not even be an object at
    /// all (`"a"(1)` or `1(2)`), then defers to `call`.
    fn call_value(&mut self, callee: Value, argc: u8) -> Result<(), String> {
        match callee {
            Value::Obj(handle) => self.call(handle, argc),
            _ => Err("Can only call functions.".to_string()),
        }
    }
}
