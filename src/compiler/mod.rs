mod expressions;
mod precedence;
mod statements;

use crate::chunk::{Chunk, OpCode};
use crate::engine::Engine;
use crate::errors::report_compile_error;
use crate::heap::{Handle, HeapObject};
use crate::scanner::{Scanner, Token, TokenKind};
use crate::value::Value;

use precedence::{get_rule, ParseFn, Precedence};

/// A local variable slot tracked by the compiler while it's in scope.
/// `depth == -1` marks "declared but not yet initialized", which is
/// how a variable's own initializer is kept from referencing itself.
struct Local<'a> {
    name: &'a str,
    depth: i32,
}

/// Whether a `FunctionFrame` is compiling the implicit top-level
/// script or a user `fun` body. Only the former forbids `return`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Script,
    Function,
}

/// Per-function compilation state. Compiler frames form a stack: the
/// one on top of `Compiler::frames` is "current", and compiling a
/// nested `fun` body pushes a new frame. An explicit `Vec` stack is
/// easier to thread through a Pratt parser split across several `impl`
/// blocks than a recursive `enclosing: Option<Box<Compiler>>` chain.
struct FunctionFrame<'a> {
    kind: FunctionKind,
    function_name: Option<Handle>,
    chunk: Chunk,
    arity: u8,
    locals: Vec<Local<'a>>,
    scope_depth: i32,
}

impl<'a> FunctionFrame<'a> {
    fn new(kind: FunctionKind, function_name: Option<Handle>) -> Self {
        // Slot 0 is reserved for the callee itself and is never named
        // by user code, so it can never be resolved by `resolve_local`.
        FunctionFrame {
            kind,
            function_name,
            chunk: Chunk::new(),
            arity: 0,
            locals: vec![Local { name: "", depth: 0 }],
            scope_depth: 0,
        }
    }
}

/// A single-pass Pratt parser that emits bytecode directly as it
/// parses — there is no intermediate syntax tree. `engine` is the
/// Compiler's window into the shared `Heap`/string-intern table; it
/// outlives this call because string and function constants compiled
/// here must still be valid once the VM runs them.
pub struct Compiler<'a> {
    scanner: Scanner<'a>,
    previous: Token<'a>,
    current: Token<'a>,
    had_error: bool,
    panic_mode: bool,
    engine: &'a mut Engine,
    frames: Vec<FunctionFrame<'a>>,
}

/// The result of compiling: the top-level script's `Function` handle,
/// or nothing if any compile error was reported.
impl<'a> Compiler<'a> {
    pub fn compile(source: &'a str, engine: &'a mut Engine) -> Option<Handle> {
        let dummy = Token { kind: TokenKind::EOF, lexeme: "", line: 0 };
        let mut compiler = Compiler {
            scanner: Scanner::new(source),
            previous: dummy,
            current: dummy,
            had_error: false,
            panic_mode: false,
            engine,
            frames: vec![FunctionFrame::new(FunctionKind::Script, None)],
        };

        compiler.advance();
        while !compiler.match_token(TokenKind::EOF) {
            compiler.declaration();
        }

        let script = compiler.end_function();
        if compiler.had_error {
            None
        } else {
            Some(compiler.engine.heap.alloc(HeapObject::Function(script)))
        }
    }

    fn frame(&self) -> &FunctionFrame<'a> {
        self.frames.last().expect("compiler always has at least the script frame")
    }

    fn frame_mut(&mut self) -> &mut FunctionFrame<'a> {
        self.frames.last_mut().expect("compiler always has at least the script frame")
    }

    fn chunk(&self) -> &Chunk {
        &self.frame().chunk
    }

    fn chunk_mut(&mut self) -> &mut Chunk {
        &mut self.frame_mut().chunk
    }

    fn scope_depth(&self) -> i32 {
        self.frame().scope_depth
    }

    /// Finishes the current frame: emits the implicit `nil; return`
    /// every function falls through to, pops the frame, and hands back
    /// the `crate::heap::FunctionObject` it accumulated. The chunk's
    /// remaining home is the heap, not the compiler.
    fn end_function(&mut self) -> crate::heap::FunctionObject {
        self.emit_op(OpCode::OP_NIL);
        self.emit_op(OpCode::OP_RETURN);
        let frame = self.frames.pop().expect("end_function called with no active frame");
        crate::heap::FunctionObject { arity: frame.arity, chunk: frame.chunk, name: frame.function_name }
    }

    // ---- token stream plumbing ----

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.next_token();
            if self.current.kind != TokenKind::ERROR {
                break;
            }
            let tok = self.current;
            self.error_at(tok, tok.lexeme);
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.check(kind) {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    // ---- error reporting ----

    fn error_at_current(&mut self, message: &str) {
        let tok = self.current;
        self.error_at(tok, message);
    }

    fn error_at_previous(&mut self, message: &str) {
        let tok = self.previous;
        self.error_at(tok, message);
    }

    fn error_at(&mut self, token: Token<'a>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        report_compile_error(&token, message);
        self.had_error = true;
    }

    /// Resynchronizes at the next statement boundary after a parse
    /// error, so one bad token doesn't produce a cascade of follow-on
    /// errors for the rest of the file.
    fn synchronize(&mut self) {
        self.panic_mode = false;

        while self.current.kind != TokenKind::EOF {
            if self.previous.kind == TokenKind::SEMICOLON {
                return;
            }

            match self.current.kind {
                TokenKind::CLASS
                | TokenKind::FUN
                | TokenKind::VAR
                | TokenKind::FOR
                | TokenKind::IF
                | TokenKind::WHILE
                | TokenKind::PRINT
                | TokenKind::RETURN => return,
                _ => {}
            }

            self.advance();
        }
    }

    // ---- bytecode emission ----

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line;
        self.chunk_mut().write(byte, line);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.emit_byte(op as u8);
    }

    fn emit_two(&mut self, op: OpCode, byte: u8) {
        self.emit_op(op);
        self.emit_byte(byte);
    }

    fn emit_constant(&mut self, value: Value) {
        match self.chunk_mut().add_constant(value) {
            Ok(idx) => self.emit_two(OpCode::OP_CONSTANT, idx),
            Err(_) => self.error_at_previous("Too many constants in one chunk."),
        }
    }

    /// Interns `name` and adds it as a constant, returning its index —
    /// used for every global variable and parameter name.
    fn identifier_constant(&mut self, name: &str) -> u8 {
        let handle = self.engine.intern(name);
        match self.chunk_mut().add_constant(Value::Obj(handle)) {
            Ok(idx) => idx,
            Err(_) => {
                self.error_at_previous("Too many constants in one chunk.");
                0
            }
        }
    }

    /// Emits a jump instruction with a two-byte placeholder offset and
    /// returns the offset of the placeholder, to be resolved later by
    /// `patch_jump`.
    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_op(op);
        self.emit_byte(0xff);
        self.emit_byte(0xff);
        self.chunk().len() - 2
    }

    fn patch_jump(&mut self, offset: usize) {
        let jump = self.chunk().len() - offset - 2;
        if jump > u16::MAX as usize {
            self.error_at_previous("Too much code to jump over.");
            return;
        }
        let bytes = (jump as u16).to_be_bytes();
        self.chunk_mut().code[offset] = bytes[0];
        self.chunk_mut().code[offset + 1] = bytes[1];
    }

    fn emit_loop(&mut self, loop_start: usize) {
        self.emit_op(OpCode::OP_LOOP);
        let offset = self.chunk().len() - loop_start + 2;
        if offset > u16::MAX as usize {
            self.error_at_previous("Loop body too large.");
            return;
        }
        let bytes = (offset as u16).to_be_bytes();
        self.emit_byte(bytes[0]);
        self.emit_byte(bytes[1]);
    }

    // ---- scopes and locals ----

    fn begin_scope(&mut self) {
        self.frame_mut().scope_depth += 1;
    }

    fn end_scope(&mut self) {
        self.frame_mut().scope_depth -= 1;
        let depth = self.scope_depth();

        while let Some(local) = self.frame().locals.last() {
            if local.depth > depth {
                self.emit_op(OpCode::OP_POP);
                self.frame_mut().locals.pop();
            } else {
                break;
            }
        }
    }

    fn add_local(&mut self, name: &'a str) {
        if self.frame().locals.len() >= 256 {
            self.error_at_previous("Too many local variables in function (max 256).");
            return;
        }
        self.frame_mut().locals.push(Local { name, depth: -1 });
    }

    fn declare_variable(&mut self) {
        if self.scope_depth() == 0 {
            return;
        }

        let name = self.previous.lexeme;
        let depth = self.scope_depth();
        let mut duplicate = false;
        for local in self.frame().locals.iter().rev() {
            if local.depth != -1 && local.depth < depth {
                break;
            }
            if local.name == name {
                duplicate = true;
                break;
            }
        }

        if duplicate {
            self.error_at_previous("Already a variable with this name in this scope.");
        } else {
            self.add_local(name);
        }
    }

    fn resolve_local(&mut self, name: &str) -> Option<u8> {
        for (idx, local) in self.frame().locals.iter().enumerate().rev() {
            if local.name == name {
                if local.depth == -1 {
                    self.error_at_previous("Can't read local variable in its own initializer.");
                }
                return Some(idx as u8);
            }
        }
        None
    }

    fn mark_initialized(&mut self) {
        if self.scope_depth() == 0 {
            return;
        }
        let depth = self.scope_depth();
        self.frame_mut().locals.last_mut().expect("a local was just declared").depth = depth;
    }

    /// Parses a variable name, declaring it as a local if inside a
    /// scope. Returns the global constant-pool index (meaningless, and
    /// never used, at local scope).
    fn parse_variable(&mut self, message: &str) -> u8 {
        self.consume(TokenKind::IDENTIFIER, message);
        self.declare_variable();
        if self.scope_depth() > 0 {
            return 0;
        }
        self.identifier_constant(self.previous.lexeme)
    }

    fn define_variable(&mut self, global: u8) {
        if self.scope_depth() > 0 {
            self.mark_initialized();
            return;
        }
        self.emit_two(OpCode::OP_DEFINE_GLOBAL, global);
    }

    // ---- Pratt driver ----

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let prefix_rule = get_rule(self.previous.kind).prefix;
        if prefix_rule == ParseFn::None {
            self.error_at_previous("Expect expression.");
            return;
        }

        let can_assign = precedence <= Precedence::ASSIGNMENT;
        self.apply_parse_fn(prefix_rule, can_assign);

        while precedence <= get_rule(self.current.kind).precedence {
            self.advance();
            let infix_rule = get_rule(self.previous.kind).infix;
            self.apply_parse_fn(infix_rule, can_assign);
        }

        if can_assign && self.match_token(TokenKind::EQUAL) {
            self.error_at_previous("Invalid assignment target.");
        }
    }

    fn apply_parse_fn(&mut self, parse_fn: ParseFn, can_assign: bool) {
        match parse_fn {
            ParseFn::Number => self.number(),
            ParseFn::StringLit => self.string_lit(),
            ParseFn::Literal => self.literal(),
            ParseFn::Grouping => self.grouping(),
            ParseFn::Unary => self.unary(),
            ParseFn::Binary => self.binary(),
            ParseFn::Variable => self.variable(can_assign),
            ParseFn::And => self.and_(),
            ParseFn::Or => self.or_(),
            ParseFn::Call => self.call(),
            ParseFn::None => unreachable!("parse_precedence filters out ParseFn::None before dispatch"),
        }
    }

    fn expression(&mut self) {
        self.parse_precedence(Precedence::ASSIGNMENT);
    }
}
