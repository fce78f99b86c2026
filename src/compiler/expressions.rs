use crate::chunk::OpCode;
use crate::compiler::Compiler;
use crate::scanner::TokenKind;
use crate::value::Value;

use super::precedence::Precedence;

impl<'a> Compiler<'a> {
    /// `NUMBER` literal: `[0-9]+(\.[0-9]+)?`, parsed straight out of the
    /// lexeme and emitted as a pooled constant.
    pub(super) fn number(&mut self) {
        let lexeme = self.previous.lexeme;
        let value: f64 = lexeme.parse().expect("scanner only produces well-formed number lexemes");
        self.emit_constant(Value::Number(value));
    }

    /// `STRING` literal. The lexeme still carries its surrounding quotes;
    /// the interior bytes are what gets interned.
    pub(super) fn string_lit(&mut self) {
        let lexeme = self.previous.lexeme;
        let interior = &lexeme[1..lexeme.len() - 1];
        let handle = self.engine.intern(interior);
        self.emit_constant(Value::Obj(handle));
    }

    pub(super) fn literal(&mut self) {
        match self.previous.kind {
            TokenKind::FALSE => self.emit_op(OpCode::OP_FALSE),
            TokenKind::NIL => self.emit_op(OpCode::OP_NIL),
            TokenKind::TRUE => self.emit_op(OpCode::OP_TRUE),
            _ => unreachable!("literal() only dispatched for FALSE/NIL/TRUE"),
        }
    }

    pub(super) fn grouping(&mut self) {
        self.expression();
        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after expression.");
    }

    pub(super) fn unary(&mut self) {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::UNARY);

        match operator {
            TokenKind::BANG => self.emit_op(OpCode::OP_NOT),
            TokenKind::MINUS => self.emit_op(OpCode::OP_NEGATE),
            _ => unreachable!("unary() only dispatched for BANG/MINUS"),
        }
    }

    /// Parses the right operand one precedence level tighter than the
    /// operator's own, giving left-associativity, then emits the
    /// operator. `!=`, `<=`, and `>=` are each two opcodes: there is no
    /// dedicated opcode for them.
    pub(super) fn binary(&mut self) {
        let operator = self.previous.kind;
        let rule = super::precedence::get_rule(operator);
        self.parse_precedence(rule.precedence.one_higher());

        match operator {
            TokenKind::PLUS => self.emit_op(OpCode::OP_ADD),
            TokenKind::MINUS => self.emit_op(OpCode::OP_SUBTRACT),
            TokenKind::STAR => self.emit_op(OpCode::OP_MULTIPLY),
            TokenKind::SLASH => self.emit_op(OpCode::OP_DIVIDE),
            TokenKind::EQUAL_EQUAL => self.emit_op(OpCode::OP_EQUAL),
            TokenKind::BANG_EQUAL => {
                self.emit_op(OpCode::OP_EQUAL);
                self.emit_op(OpCode::OP_NOT);
            }
            TokenKind::GREATER => self.emit_op(OpCode::OP_GREATER),
            TokenKind::GREATER_EQUAL => {
                self.emit_op(OpCode::OP_LESS);
                self.emit_op(OpCode::OP_NOT);
            }
            TokenKind::LESS => self.emit_op(OpCode::OP_LESS),
            TokenKind::LESS_EQUAL => {
                self.emit_op(OpCode::OP_GREATER);
                self.emit_op(OpCode::OP_NOT);
            }
            _ => unreachable!("binary() only dispatched for the operators above"),
        }
    }

    /// `and`: short-circuits by leaving the falsy left operand on the
    /// stack and jumping over the right operand entirely.
    pub(super) fn and_(&mut self) {
        let end_jump = self.emit_jump(OpCode::OP_JUMP_IF_FALSE);
        self.emit_op(OpCode::OP_POP);
        self.parse_precedence(Precedence::AND);
        self.patch_jump(end_jump);
    }

    /// `or`: short-circuits by jumping straight to the end when the
    /// left operand is truthy, otherwise falling through to evaluate
    /// the right operand.
    pub(super) fn or_(&mut self) {
        let else_jump = self.emit_jump(OpCode::OP_JUMP_IF_FALSE);
        let end_jump = self.emit_jump(OpCode::OP_JUMP);

        self.patch_jump(else_jump);
        self.emit_op(OpCode::OP_POP);

        self.parse_precedence(Precedence::OR);
        self.patch_jump(end_jump);
    }

    /// Parses a variable reference or assignment: a local if the name
    /// resolves within the current function frame, a global otherwise.
    pub(super) fn variable(&mut self, can_assign: bool) {
        let name = self.previous.lexeme;
        self.named_variable(name, can_assign);
    }

    pub(super) fn named_variable(&mut self, name: &str, can_assign: bool) {
        let (get_op, set_op, arg) = match self.resolve_local(name) {
            Some(slot) => (OpCode::OP_GET_LOCAL, OpCode::OP_SET_LOCAL, slot),
            None => {
                let idx = self.identifier_constant(name);
                (OpCode::OP_GET_GLOBAL, OpCode::OP_SET_GLOBAL, idx)
            }
        };

        if can_assign && self.match_token(TokenKind::EQUAL) {
            self.expression();
            self.emit_two(set_op, arg);
        } else {
            self.emit_two(get_op, arg);
        }
    }

    /// `(` already consumed. Parses a comma-separated argument list and
    /// emits `OP_CALL argc`; more than 255 arguments is a compile error
    /// (the operand is a single byte).
    pub(super) fn call(&mut self) {
        let argc = self.argument_list();
        self.emit_two(OpCode::OP_CALL, argc);
    }

    fn argument_list(&mut self) -> u8 {
        let mut argc: u32 = 0;
        if !self.check(TokenKind::RIGHT_PAREN) {
            loop {
                self.expression();
                if argc == 255 {
                    self.error_at_previous("Can't have more than 255 arguments.");
                }
                argc += 1;
                if !self.match_token(TokenKind::COMMA) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after arguments.");
        argc as u8
    }

}
