use crate::chunk::OpCode;
use crate::heap::{Handle, HeapObject};
use crate::scanner::TokenKind;
use crate::value::Value;

use super::{Compiler, FunctionFrame, FunctionKind};

impl<'a> Compiler<'a> {
    /// `declaration -> funDecl | varDecl | statement`. Resynchronizes
    /// at the next statement boundary if the declaration's own parse
    /// left the compiler in panic mode, so one bad statement doesn't
    /// cascade into a wall of follow-on errors for the rest of the file.
    pub(super) fn declaration(&mut self) {
        if self.match_token(TokenKind::FUN) {
            self.fun_declaration();
        } else if self.match_token(TokenKind::VAR) {
            self.var_declaration();
        } else {
            self.statement();
        }

        if self.panic_mode {
            self.synchronize();
        }
    }

    /// `fun NAME ( params ) { body }`. `mark_initialized` runs before
    /// the body is compiled so the function can call itself by name.
    fn fun_declaration(&mut self) {
        let global = self.parse_variable("Expect function name.");
        let name = self.previous.lexeme;
        self.mark_initialized();

        let name_handle = self.engine.intern(name);
        self.function(FunctionKind::Function, Some(name_handle));
        self.define_variable(global);
    }

    /// Compiles a function body in a fresh `FunctionFrame` pushed onto
    /// the compiler's frame stack, then emits the finished `Function`
    /// as a constant in the *enclosing* chunk — this is what lets a
    /// nested function's bytecode live entirely separately from its
    /// parent's while still being reachable as an ordinary value.
    pub(super) fn function(&mut self, kind: FunctionKind, name: Option<Handle>) {
        self.frames.push(FunctionFrame::new(kind, name));
        self.begin_scope();

        self.consume(TokenKind::LEFT_PAREN, "Expect '(' after function name.");
        if !self.check(TokenKind::RIGHT_PAREN) {
            loop {
                if self.frame().arity >= 255 {
                    self.error_at_current("Can't have more than 255 parameters.");
                }
                self.frame_mut().arity += 1;
                let constant = self.parse_variable("Expect parameter name.");
                self.define_variable(constant);
                if !self.match_token(TokenKind::COMMA) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after parameters.");
        self.consume(TokenKind::LEFT_BRACE, "Expect '{' before function body.");
        self.block();

        let function = self.end_function();
        let handle = self.engine.heap.alloc(HeapObject::Function(function));
        self.emit_constant(Value::Obj(handle));
    }

    /// `var NAME [= expr] ;`. A variable with no initializer is bound
    /// to `nil`.
    fn var_declaration(&mut self) {
        let global = self.parse_variable("Expect variable name.");

        if self.match_token(TokenKind::EQUAL) {
            self.expression();
        } else {
            self.emit_op(OpCode::OP_NIL);
        }
        self.consume(TokenKind::SEMICOLON, "Expect ';' after variable declaration.");

        self.define_variable(global);
    }

    fn statement(&mut self) {
        if self.match_token(TokenKind::PRINT) {
            self.print_statement();
        } else if self.match_token(TokenKind::IF) {
            self.if_statement();
        } else if self.match_token(TokenKind::RETURN) {
            self.return_statement();
        } else if self.match_token(TokenKind::WHILE) {
            self.while_statement();
        } else if self.match_token(TokenKind::FOR) {
            self.for_statement();
        } else if self.match_token(TokenKind::LEFT_BRACE) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    /// Reads declarations until the closing `}` (or `EOF`, which is
    /// reported as a missing brace by `consume`). Does NOT open or
    /// close a scope itself — callers (a bare block statement, or a
    /// function body) own that decision.
    pub(super) fn block(&mut self) {
        while !self.check(TokenKind::RIGHT_BRACE) && !self.check(TokenKind::EOF) {
            self.declaration();
        }
        self.consume(TokenKind::RIGHT_BRACE, "Expect '}' after block.");
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::SEMICOLON, "Expect ';' after value.");
        self.emit_op(OpCode::OP_PRINT);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::SEMICOLON, "Expect ';' after expression.");
        self.emit_op(OpCode::OP_POP);
    }

    fn if_statement(&mut self) {
        self.consume(TokenKind::LEFT_PAREN, "Expect '(' after 'if'.");
        self.expression();
        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after condition.");

        let then_jump = self.emit_jump(OpCode::OP_JUMP_IF_FALSE);
        self.emit_op(OpCode::OP_POP);
        self.statement();

        let else_jump = self.emit_jump(OpCode::OP_JUMP);
        self.patch_jump(then_jump);
        self.emit_op(OpCode::OP_POP);

        if self.match_token(TokenKind::ELSE) {
            self.statement();
        }
        self.patch_jump(else_jump);
    }

    fn while_statement(&mut self) {
        let loop_start = self.chunk().len();
        self.consume(TokenKind::LEFT_PAREN, "Expect '(' after 'while'.");
        self.expression();
        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after condition.");

        let exit_jump = self.emit_jump(OpCode::OP_JUMP_IF_FALSE);
        self.emit_op(OpCode::OP_POP);
        self.statement();
        self.emit_loop(loop_start);

        self.patch_jump(exit_jump);
        self.emit_op(OpCode::OP_POP);
    }

    /// Desugars `for (init; cond; incr) body` into the `init` prelude
    /// followed by a `while`-shaped loop whose back-edge first runs
    /// `incr` (jump over `incr` on first entry, loop back to `incr` on
    /// every later iteration).
    fn for_statement(&mut self) {
        self.begin_scope();
        self.consume(TokenKind::LEFT_PAREN, "Expect '(' after 'for'.");

        if self.match_token(TokenKind::SEMICOLON) {
            // No initializer.
        } else if self.match_token(TokenKind::VAR) {
            self.var_declaration();
        } else {
            self.expression_statement();
        }

        let mut loop_start = self.chunk().len();
        let mut exit_jump: Option<usize> = None;

        if !self.match_token(TokenKind::SEMICOLON) {
            self.expression();
            self.consume(TokenKind::SEMICOLON, "Expect ';' after loop condition.");

            exit_jump = Some(self.emit_jump(OpCode::OP_JUMP_IF_FALSE));
            self.emit_op(OpCode::OP_POP);
        }

        if !self.match_token(TokenKind::RIGHT_PAREN) {
            let body_jump = self.emit_jump(OpCode::OP_JUMP);

            let increment_start = self.chunk().len();
            self.expression();
            self.emit_op(OpCode::OP_POP);
            self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after for clauses.");

            self.emit_loop(loop_start);
            loop_start = increment_start;
            self.patch_jump(body_jump);
        }

        self.statement();
        self.emit_loop(loop_start);

        if let Some(exit_jump) = exit_jump {
            self.patch_jump(exit_jump);
            self.emit_op(OpCode::OP_POP);
        }

        self.end_scope();
    }

    fn return_statement(&mut self) {
        if self.frame().kind == FunctionKind::Script {
            self.error_at_previous("Can't return from top-level code.");
        }

        if self.match_token(TokenKind::SEMICOLON) {
            self.emit_op(OpCode::OP_NIL);
            self.emit_op(OpCode::OP_RETURN);
        } else {
            self.expression();
            self.consume(TokenKind::SEMICOLON, "Expect ';' after return value.");
            self.emit_op(OpCode::OP_RETURN);
        }
    }
}
