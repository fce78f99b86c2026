/// The kind of a lexeme produced by the `Scanner`. Spelled in
/// `SCREAMING_SNAKE_CASE` to match the `OpCode`/`Precedence` naming used
/// everywhere else in this crate.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACE,
    RIGHT_BRACE,
    COMMA,
    DOT,
    MINUS,
    PLUS,
    SEMICOLON,
    SLASH,
    STAR,
    BANG,
    BANG_EQUAL,
    EQUAL,
    EQUAL_EQUAL,
    GREATER,
    GREATER_EQUAL,
    LESS,
    LESS_EQUAL,
    IDENTIFIER,
    STRING,
    NUMBER,
    AND,
    CLASS,
    ELSE,
    FALSE,
    FOR,
    FUN,
    IF,
    NIL,
    OR,
    PRINT,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    VAR,
    WHILE,
    ERROR,
    EOF,
}

/// A single lexeme. `lexeme` borrows directly from the source the
/// `Scanner` was built over, so tokenizing never allocates.
#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub line: i32,
}

/// Scans source text into a flat stream of `Token`s, one at a time.
/// There is no lookahead buffer: the compiler pulls tokens with
/// `next_token` and keeps the one token of lookahead it needs itself.
pub struct Scanner<'a> {
    source: &'a [u8],
    start: usize,
    current: usize,
    line: i32,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner { source: source.as_bytes(), start: 0, current: 0, line: 1 }
    }

    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace();
        self.start = self.current;

        if self.is_at_end() {
            return self.make_token(TokenKind::EOF);
        }

        let c = self.advance();

        if is_digit(c) {
            return self.number();
        }
        if is_alpha(c) {
            return self.identifier();
        }

        match c {
            b'(' => self.make_token(TokenKind::LEFT_PAREN),
            b')' => self.make_token(TokenKind::RIGHT_PAREN),
            b'{' => self.make_token(TokenKind::LEFT_BRACE),
            b'}' => self.make_token(TokenKind::RIGHT_BRACE),
            b',' => self.make_token(TokenKind::COMMA),
            b'.' => self.make_token(TokenKind::DOT),
            b'-' => self.make_token(TokenKind::MINUS),
            b'+' => self.make_token(TokenKind::PLUS),
            b';' => self.make_token(TokenKind::SEMICOLON),
            b'/' => self.make_token(TokenKind::SLASH),
            b'*' => self.make_token(TokenKind::STAR),
            b'!' => {
                let kind = if self.matches(b'=') { TokenKind::BANG_EQUAL } else { TokenKind::BANG };
                self.make_token(kind)
            }
            b'=' => {
                let kind = if self.matches(b'=') { TokenKind::EQUAL_EQUAL } else { TokenKind::EQUAL };
                self.make_token(kind)
            }
            b'<' => {
                let kind = if self.matches(b'=') { TokenKind::LESS_EQUAL } else { TokenKind::LESS };
                self.make_token(kind)
            }
            b'>' => {
                let kind = if self.matches(b'=') { TokenKind::GREATER_EQUAL } else { TokenKind::GREATER };
                self.make_token(kind)
            }
            b'"' => self.string(),
            _ => self.make_error_token("Unexpected character."),
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> u8 {
        let b = self.source[self.current];
        self.current += 1;
        b
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() {
            b'\0'
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.source.len() {
            b'\0'
        } else {
            self.source[self.current + 1]
        }
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                b' ' | b'\r' | b'\t' => {
                    self.advance();
                }
                b'\n' => {
                    self.line += 1;
                    self.advance();
                }
                b'/' if self.peek_next() == b'/' => {
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn string(&mut self) -> Token<'a> {
        while self.peek() != b'"' && !self.is_at_end() {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            return self.make_error_token("Unterminated string.");
        }

        // The closing quote.
        self.advance();
        self.make_token(TokenKind::STRING)
    }

    fn number(&mut self) -> Token<'a> {
        while is_digit(self.peek()) {
            self.advance();
        }

        if self.peek() == b'.' && is_digit(self.peek_next()) {
            self.advance();
            while is_digit(self.peek()) {
                self.advance();
            }
        }

        self.make_token(TokenKind::NUMBER)
    }

    fn identifier(&mut self) -> Token<'a> {
        while is_alpha(self.peek()) || is_digit(self.peek()) {
            self.advance();
        }
        self.make_token(self.identifier_kind())
    }

    /// Keyword lookup dispatches on the first character, then checks
    /// the remaining bytes against the one keyword (if any) that starts
    /// with it — a flat trie rather than a `HashMap<&str, TokenKind>`.
    fn identifier_kind(&self) -> TokenKind {
        let text = self.lexeme_so_far();
        let bytes = text.as_bytes();

        match bytes[0] {
            b'a' => self.check_keyword(1, "nd", TokenKind::AND),
            b'c' => self.check_keyword(1, "lass", TokenKind::CLASS),
            b'e' => self.check_keyword(1, "lse", TokenKind::ELSE),
            b'f' if bytes.len() > 1 => match bytes[1] {
                b'a' => self.check_keyword(2, "lse", TokenKind::FALSE),
                b'o' => self.check_keyword(2, "r", TokenKind::FOR),
                b'u' => self.check_keyword(2, "n", TokenKind::FUN),
                _ => TokenKind::IDENTIFIER,
            },
            b'i' => self.check_keyword(1, "f", TokenKind::IF),
            b'n' => self.check_keyword(1, "il", TokenKind::NIL),
            b'o' => self.check_keyword(1, "r", TokenKind::OR),
            b'p' => self.check_keyword(1, "rint", TokenKind::PRINT),
            b'r' => self.check_keyword(1, "eturn", TokenKind::RETURN),
            b's' => self.check_keyword(1, "uper", TokenKind::SUPER),
            b't' if bytes.len() > 1 => match bytes[1] {
                b'h' => self.check_keyword(2, "is", TokenKind::THIS),
                b'r' => self.check_keyword(2, "ue", TokenKind::TRUE),
                _ => TokenKind::IDENTIFIER,
            },
            b'v' => self.check_keyword(1, "ar", TokenKind::VAR),
            b'w' => self.check_keyword(1, "hile", TokenKind::WHILE),
            _ => TokenKind::IDENTIFIER,
        }
    }

    fn check_keyword(&self, start: usize, rest: &str, kind: TokenKind) -> TokenKind {
        let text = self.lexeme_so_far();
        if &text[start..] == rest {
            kind
        } else {
            TokenKind::IDENTIFIER
        }
    }

    fn lexeme_so_far(&self) -> &'a str {
        std::str::from_utf8(&self.source[self.start..self.current]).expect("source is valid UTF-8")
    }

    fn make_token(&self, kind: TokenKind) -> Token<'a> {
        Token { kind, lexeme: self.lexeme_so_far(), line: self.line }
    }

    fn make_error_token(&self, message: &'static str) -> Token<'a> {
        Token { kind: TokenKind::ERROR, lexeme: message, line: self.line }
    }
}

fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(source);
        let mut out = Vec::new();
        loop {
            let tok = scanner.next_token();
            let done = tok.kind == TokenKind::EOF;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn scans_punctuators_and_two_char_operators() {
        assert_eq!(
            kinds("(){},.;-+/* ! != = == > >= < <="),
            vec![
                TokenKind::LEFT_PAREN,
                TokenKind::RIGHT_PAREN,
                TokenKind::LEFT_BRACE,
                TokenKind::RIGHT_BRACE,
                TokenKind::COMMA,
                TokenKind::DOT,
                TokenKind::SEMICOLON,
                TokenKind::MINUS,
                TokenKind::PLUS,
                TokenKind::SLASH,
                TokenKind::STAR,
                TokenKind::BANG,
                TokenKind::BANG_EQUAL,
                TokenKind::EQUAL,
                TokenKind::EQUAL_EQUAL,
                TokenKind::GREATER,
                TokenKind::GREATER_EQUAL,
                TokenKind::LESS,
                TokenKind::LESS_EQUAL,
                TokenKind::EOF,
            ]
        );
    }

    #[test]
    fn skips_line_comments_and_tracks_lines() {
        let mut scanner = Scanner::new("// a comment\nvar x;");
        let tok = scanner.next_token();
        assert_eq!(tok.kind, TokenKind::VAR);
        assert_eq!(tok.line, 2);
    }

    #[test]
    fn recognizes_every_keyword_distinctly_from_identifiers() {
        assert_eq!(
            kinds("and class else false for fun if nil or print return super this true var while"),
            vec![
                TokenKind::AND,
                TokenKind::CLASS,
                TokenKind::ELSE,
                TokenKind::FALSE,
                TokenKind::FOR,
                TokenKind::FUN,
                TokenKind::IF,
                TokenKind::NIL,
                TokenKind::OR,
                TokenKind::PRINT,
                TokenKind::RETURN,
                TokenKind::SUPER,
                TokenKind::THIS,
                TokenKind::TRUE,
                TokenKind::VAR,
                TokenKind::WHILE,
                TokenKind::EOF,
            ]
        );
        assert_eq!(kinds("android"), vec![TokenKind::IDENTIFIER, TokenKind::EOF]);
        assert_eq!(kinds("forest"), vec![TokenKind::IDENTIFIER, TokenKind::EOF]);
    }

    #[test]
    fn scans_integer_and_decimal_numbers() {
        let mut scanner = Scanner::new("123 4.5");
        let a = scanner.next_token();
        assert_eq!(a.kind, TokenKind::NUMBER);
        assert_eq!(a.lexeme, "123");
        let b = scanner.next_token();
        assert_eq!(b.kind, TokenKind::NUMBER);
        assert_eq!(b.lexeme, "4.5");
    }

    #[test]
    fn unterminated_string_yields_error_token() {
        let mut scanner = Scanner::new("\"abc");
        let tok = scanner.next_token();
        assert_eq!(tok.kind, TokenKind::ERROR);
        assert_eq!(tok.lexeme, "Unterminated string.");
    }

    #[test]
    fn string_may_span_multiple_lines() {
        let mut scanner = Scanner::new("\"a\nb\" 1");
        let tok = scanner.next_token();
        assert_eq!(tok.kind, TokenKind::STRING);
        assert_eq!(tok.lexeme, "\"a\nb\"");
        let next = scanner.next_token();
        assert_eq!(next.line, 2);
    }
}
