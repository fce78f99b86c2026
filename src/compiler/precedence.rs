use crate::scanner::TokenKind;

/// Ascending operator precedence. `Precedence::ASSIGNMENT` binds looser
/// than `Precedence::OR`, which binds looser than `Precedence::AND`,
/// and so on up to `Precedence::PRIMARY`, the tightest.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Precedence {
    NONE,
    ASSIGNMENT, // =
    OR,         // or
    AND,        // and
    EQUALITY,   // == !=
    COMPARISON, // < > <= >=
    TERM,       // + -
    FACTOR,     // * /
    UNARY,      // ! -
    CALL,       // ()
    PRIMARY,
}

impl Precedence {
    /// One step tighter than `self`; used to parse the right-hand side
    /// of a left-associative binary operator one level above its own
    /// precedence.
    pub fn one_higher(self) -> Precedence {
        use Precedence::*;
        match self {
            NONE => ASSIGNMENT,
            ASSIGNMENT => OR,
            OR => AND,
            AND => EQUALITY,
            EQUALITY => COMPARISON,
            COMPARISON => TERM,
            TERM => FACTOR,
            FACTOR => UNARY,
            UNARY => CALL,
            CALL => PRIMARY,
            PRIMARY => PRIMARY,
        }
    }
}

/// Identifies which parsing function a `ParserRule` wants, standing in
/// for a first-class function value in a language without function
/// pointers — a single `dispatch` match covers every rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFn {
    Number,
    StringLit,
    Literal,
    Grouping,
    Unary,
    Binary,
    Variable,
    And,
    Or,
    Call,
    None,
}

/// The Pratt table entry for one token kind: what to do when it's seen
/// in prefix position, what to do when it's seen in infix position, and
/// the infix precedence used to decide whether to keep consuming.
#[derive(Debug, Clone, Copy)]
pub struct ParserRule {
    pub prefix: ParseFn,
    pub infix: ParseFn,
    pub precedence: Precedence,
}

const fn rule(prefix: ParseFn, infix: ParseFn, precedence: Precedence) -> ParserRule {
    ParserRule { prefix, infix, precedence }
}

pub fn get_rule(kind: TokenKind) -> ParserRule {
    use ParseFn::*;
    use Precedence::*;
    use TokenKind::*;

    match kind {
        LEFT_PAREN => rule(Grouping, Call, CALL),
        RIGHT_PAREN => rule(None, None, NONE),
        LEFT_BRACE => rule(None, None, NONE),
        RIGHT_BRACE => rule(None, None, NONE),
        COMMA => rule(None, None, NONE),
        DOT => rule(None, None, NONE),
        MINUS => rule(Unary, Binary, TERM),
        PLUS => rule(None, Binary, TERM),
        SEMICOLON => rule(None, None, NONE),
        SLASH => rule(None, Binary, FACTOR),
        STAR => rule(None, Binary, FACTOR),
        BANG => rule(Unary, None, NONE),
        BANG_EQUAL => rule(None, Binary, EQUALITY),
        EQUAL => rule(None, None, NONE),
        EQUAL_EQUAL => rule(None, Binary, EQUALITY),
        GREATER => rule(None, Binary, COMPARISON),
        GREATER_EQUAL => rule(None, Binary, COMPARISON),
        LESS => rule(None, Binary, COMPARISON),
        LESS_EQUAL => rule(None, Binary, COMPARISON),
        IDENTIFIER => rule(Variable, None, NONE),
        STRING => rule(StringLit, None, NONE),
        NUMBER => rule(Number, None, NONE),
        AND => rule(None, And, AND),
        CLASS => rule(None, None, NONE),
        ELSE => rule(None, None, NONE),
        FALSE => rule(Literal, None, NONE),
        FOR => rule(None, None, NONE),
        FUN => rule(None, None, NONE),
        IF => rule(None, None, NONE),
        NIL => rule(Literal, None, NONE),
        OR => rule(None, Or, OR),
        PRINT => rule(None, None, NONE),
        RETURN => rule(None, None, NONE),
        SUPER => rule(None, None, NONE),
        THIS => rule(None, None, NONE),
        TRUE => rule(Literal, None, NONE),
        VAR => rule(None, None, NONE),
        WHILE => rule(None, None, NONE),
        ERROR => rule(None, None, NONE),
        EOF => rule(None, None, NONE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_climbs_in_declared_order() {
        assert!(Precedence::NONE < Precedence::ASSIGNMENT);
        assert!(Precedence::TERM < Precedence::FACTOR);
        assert!(Precedence::UNARY < Precedence::CALL);
    }

    #[test]
    fn binary_operators_resolve_to_the_binary_rule() {
        assert_eq!(get_rule(TokenKind::PLUS).infix, ParseFn::Binary);
        assert_eq!(get_rule(TokenKind::STAR).precedence, Precedence::FACTOR);
    }
}
