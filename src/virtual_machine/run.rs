use std::io::Write;

use crate::chunk::OpCode;
use crate::heap::display_value;
use crate::value::Value;

use super::VM;

impl<'a> VM<'a> {
    /// The dispatch loop: a single `match` on the next opcode byte.
    /// Returns `Ok(())` when the top-level script returns (the normal
    /// way a run ends) or `Err(message)` on the first runtime error,
    /// which the caller turns into a stack trace.
    pub(super) fn run(&mut self) -> Result<(), String> {
        loop {
            if self.trace {
                self.print_trace();
            }

            let byte = self.read_byte();
            let op = OpCode::from_u8(byte).expect("a well-formed chunk never emits an unknown opcode");

            use OpCode::*;
            match op {
                OP_CONSTANT => {
                    let idx = self.read_byte();
                    let value = self.read_constant(idx);
                    self.push(value);
                }
                OP_NIL => self.push(Value::Nil),
                OP_TRUE => self.push(Value::Bool(true)),
                OP_FALSE => self.push(Value::Bool(false)),
                OP_POP => {
                    self.pop();
                }
                OP_GET_LOCAL => {
                    let slot = self.read_byte() as usize;
                    let base = self.current_frame().slot_base;
                    self.push(self.stack[base + slot]);
                }
                OP_SET_LOCAL => {
                    let slot = self.read_byte() as usize;
                    let base = self.current_frame().slot_base;
                    self.stack[base + slot] = self.peek(0);
                }
                OP_GET_GLOBAL => {
                    let idx = self.read_byte();
                    let handle = self.read_constant(idx).as_obj().expect("identifier constants are strings");
                    match self.globals.get(&self.engine.heap, handle) {
                        Some(value) => self.push(value),
                        None => return Err(self.undefined_variable(handle)),
                    }
                }
                OP_DEFINE_GLOBAL => {
                    let idx = self.read_byte();
                    let handle = self.read_constant(idx).as_obj().expect("identifier constants are strings");
                    let value = self.peek(0);
                    self.globals.set(&self.engine.heap, handle, value);
                    self.pop();
                }
                OP_SET_GLOBAL => {
                    let idx = self.read_byte();
                    let handle = self.read_constant(idx).as_obj().expect("identifier constants are strings");
                    // A miss here must NOT implicitly declare the global,
                    // so existence is checked before `set` ever runs.
                    if self.globals.get(&self.engine.heap, handle).is_none() {
                        return Err(self.undefined_variable(handle));
                    }
                    let value = self.peek(0);
                    self.globals.set(&self.engine.heap, handle, value);
                }
                OP_EQUAL => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(Value::values_equal(a, b)));
                }
                OP_GREATER => self.binary_compare(|a, b| a > b)?,
                OP_LESS => self.binary_compare(|a, b| a < b)?,
                OP_ADD => self.add()?,
                OP_SUBTRACT => self.binary_numeric(|a, b| a - b)?,
                OP_MULTIPLY => self.binary_numeric(|a, b| a * b)?,
                OP_DIVIDE => self.binary_numeric(|a, b| a / b)?,
                OP_NOT => {
                    let value = self.pop();
                    self.push(Value::Bool(value.is_falsy()));
                }
                OP_NEGATE => match self.peek(0).as_number() {
                    Some(n) => {
                        self.pop();
                        self.push(Value::Number(-n));
                    }
                    None => return Err("Operand must be a number.".to_string()),
                },
                OP_PRINT => {
                    let value = self.pop();
                    writeln!(self.stdout, "{}", display_value(&self.engine.heap, value))
                        .expect("writing to the configured print sink should not fail");
                }
                OP_JUMP => {
                    let offset = self.read_short();
                    self.frames.last_mut().unwrap().ip += offset as usize;
                }
                OP_JUMP_IF_FALSE => {
                    let offset = self.read_short();
                    if self.peek(0).is_falsy() {
                        self.frames.last_mut().unwrap().ip += offset as usize;
                    }
                }
                OP_LOOP => {
                    let offset = self.read_short();
                    self.frames.last_mut().unwrap().ip -= offset as usize;
                }
                OP_CALL => {
                    let argc = self.read_byte();
                    let callee = self.peek(argc as usize);
                    self.call_value(callee, argc)?;
                }
                OP_RETURN => {
                    let result = self.pop();
                    let frame = self.frames.pop().expect("run() never executes with an empty frame stack");
                    if self.frames.is_empty() {
                        self.pop(); // the script Function itself
                        return Ok(());
                    }
                    self.stack.truncate(frame.slot_base);
                    self.push(result);
                }
            }
        }
    }

    fn undefined_variable(&self, handle: crate::heap::Handle) -> String {
        format!("Undefined variable '{}'.", self.engine.heap.as_string(handle).unwrap().chars)
    }

    fn binary_numeric(&mut self, op: impl Fn(f64, f64) -> f64) -> Result<(), String> {
        match (self.peek(1).as_number(), self.peek(0).as_number()) {
            (Some(a), Some(b)) => {
                self.pop();
                self.pop();
                self.push(Value::Number(op(a, b)));
                Ok(())
            }
            _ => Err("Operands must be numbers.".to_string()),
        }
    }

    fn binary_compare(&mut self, op: impl Fn(f64, f64) -> bool) -> Result<(), String> {
        match (self.peek(1).as_number(), self.peek(0).as_number()) {
            (Some(a), Some(b)) => {
                self.pop();
                self.pop();
                self.push(Value::Bool(op(a, b)));
                Ok(())
            }
            _ => Err("Operands must be numbers.".to_string()),
        }
    }

    /// `+` overloads onto numeric addition or string concatenation.
    /// The concatenated string is routed through the intern table like
    /// every other string this crate creates.
    fn add(&mut self) -> Result<(), String> {
        match (self.peek(1), self.peek(0)) {
            (Value::Number(a), Value::Number(b)) => {
                self.pop();
                self.pop();
                self.push(Value::Number(a + b));
                Ok(())
            }
            (Value::Obj(ha), Value::Obj(hb)) => {
                match (self.engine.heap.as_string(ha), self.engine.heap.as_string(hb)) {
                    (Some(sa), Some(sb)) => {
                        let combined = format!("{}{}", sa.chars, sb.chars);
                        let handle = self.engine.intern(&combined);
                        self.pop();
                        self.pop();
                        self.push(Value::Obj(handle));
                        Ok(())
                    }
                    _ => Err("Operands must be two numbers or two strings.".to_string()),
                }
            }
            _ => Err("Operands must be two numbers or two strings.".to_string()),
        }
    }

    fn print_trace(&self) {
        print!("          ");
        for value in &self.stack {
            print!("[ {} ]", display_value(&self.engine.heap, *value));
        }
        println!();
        self.current_chunk().disassemble_instruction(&self.engine.heap, self.current_frame().ip);
    }
}
