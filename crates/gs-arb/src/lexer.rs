//! ARB program tokenizer
//!
//! Produces one classified token at a time. Whitespace, comments and
//! newlines are real tokens because the header line framing depends on them;
//! the parser skips them inside statements.

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Newline,
    /// Spaces, tabs, lone carriage returns, and `#` comments
    Whitespace,
    Identifier,
    Integer(u32),
    Float(f32),
    Semicolon,
    Comma,
    Dot,
    DotDot,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Equals,
    Plus,
    Minus,
    Eof,
    Invalid(char),
}

/// Classified lexeme with its position in the program text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
    pub len: usize,
}

impl Token {
    /// Whitespace, comments and newlines
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Newline)
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Incremental tokenizer over a program text
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    source: &'src str,
    pos: usize,
    current: Token,
}

impl<'src> Lexer<'src> {
    /// Create a lexer that starts reading at byte `start`.
    ///
    /// No token is read until [`Lexer::advance`] is called.
    pub fn new(source: &'src str, start: usize) -> Self {
        let start = start.min(source.len());
        Self {
            source,
            pos: start,
            current: Token {
                kind: TokenKind::Eof,
                offset: start,
                len: 0,
            },
        }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Current token
    pub fn current(&self) -> Token {
        self.current
    }

    /// Text of a token
    pub fn text(&self, token: Token) -> &'src str {
        &self.source[token.offset..token.end()]
    }

    /// Text between two byte offsets
    pub fn slice(&self, start: usize, end: usize) -> &'src str {
        &self.source[start.min(end)..end.min(self.source.len())]
    }

    /// Read the next token and make it current
    pub fn advance(&mut self) -> Token {
        self.current = self.read_token();
        self.current
    }

    /// Advance past trivia to the next significant token
    pub fn advance_significant(&mut self) -> Token {
        loop {
            let token = self.advance();
            if !token.is_trivia() {
                return token;
            }
        }
    }

    /// Next significant token without consuming anything
    pub fn peek_significant(&self) -> Token {
        self.clone().advance_significant()
    }

    fn peek_byte(&self, ahead: usize) -> Option<u8> {
        self.source.as_bytes().get(self.pos + ahead).copied()
    }

    fn read_token(&mut self) -> Token {
        let start = self.pos;
        let Some(c) = self.source[start..].chars().next() else {
            return Token {
                kind: TokenKind::Eof,
                offset: start,
                len: 0,
            };
        };

        let kind = match c {
            '\n' => {
                self.pos += 1;
                TokenKind::Newline
            }
            '\r' if self.peek_byte(1) == Some(b'\n') => {
                self.pos += 2;
                TokenKind::Newline
            }
            ' ' | '\t' | '\r' | '\x0c' => {
                while matches!(self.peek_byte(0), Some(b' ' | b'\t' | b'\x0c'))
                    || (self.peek_byte(0) == Some(b'\r') && self.peek_byte(1) != Some(b'\n'))
                {
                    self.pos += 1;
                }
                TokenKind::Whitespace
            }
            '#' => {
                while !matches!(self.peek_byte(0), None | Some(b'\n')) {
                    if self.peek_byte(0) == Some(b'\r') && self.peek_byte(1) == Some(b'\n') {
                        break;
                    }
                    self.pos += 1;
                }
                // Comments may contain any UTF-8; realign on a char boundary
                while !self.source.is_char_boundary(self.pos) {
                    self.pos += 1;
                }
                TokenKind::Whitespace
            }
            c if is_ident_start(c) => {
                self.bump_ident();
                TokenKind::Identifier
            }
            '0'..='9' => self.read_number(),
            '.' if matches!(self.peek_byte(1), Some(b'0'..=b'9')) => self.read_number(),
            '.' if self.peek_byte(1) == Some(b'.') => {
                self.pos += 2;
                TokenKind::DotDot
            }
            _ => {
                self.pos += c.len_utf8();
                match c {
                    ';' => TokenKind::Semicolon,
                    ',' => TokenKind::Comma,
                    '.' => TokenKind::Dot,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    '=' => TokenKind::Equals,
                    '+' => TokenKind::Plus,
                    '-' => TokenKind::Minus,
                    other => TokenKind::Invalid(other),
                }
            }
        };

        Token {
            kind,
            offset: start,
            len: self.pos - start,
        }
    }

    fn bump_ident(&mut self) {
        while let Some(b) = self.peek_byte(0) {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'$' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn bump_digits(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek_byte(0), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        self.pos > start
    }

    /// Numbers: `12`, `1.5`, `.5`, `5.`, with an optional exponent.
    ///
    /// Digits directly followed by identifier characters (`2D`, `3D`) form
    /// an identifier; `0..3` is an integer followed by `..`.
    fn read_number(&mut self) -> TokenKind {
        let start = self.pos;
        let mut is_float = false;

        self.bump_digits();

        if self.peek_byte(0) == Some(b'.') {
            let next = self.peek_byte(1);
            let dot_continues = match next {
                Some(b'0'..=b'9') => true,
                Some(b'.') => false,
                Some(b) => !(b.is_ascii_alphabetic() || b == b'_' || b == b'$'),
                None => true,
            };
            if dot_continues {
                is_float = true;
                self.pos += 1;
                self.bump_digits();
            }
        }

        if matches!(self.peek_byte(0), Some(b'e' | b'E')) {
            let sign = matches!(self.peek_byte(1), Some(b'+' | b'-'));
            let digit_at = if sign { 2 } else { 1 };
            if matches!(self.peek_byte(digit_at), Some(b'0'..=b'9')) {
                is_float = true;
                self.pos += digit_at;
                self.bump_digits();
            }
        }

        if !is_float {
            if let Some(b) = self.peek_byte(0) {
                if b.is_ascii_alphabetic() || b == b'_' || b == b'$' {
                    self.bump_ident();
                    return TokenKind::Identifier;
                }
            }
        }

        let text = &self.source[start..self.pos];
        if !is_float {
            if let Ok(value) = text.parse::<u32>() {
                return TokenKind::Integer(value);
            }
        }
        match text.parse::<f32>() {
            Ok(value) => TokenKind::Float(value),
            Err(_) => TokenKind::Invalid('.'),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source, 0);
        let mut out = Vec::new();
        loop {
            let token = lexer.advance();
            if token.kind == TokenKind::Eof {
                break;
            }
            out.push(token.kind);
        }
        out
    }

    #[test]
    fn test_statement_tokens() {
        assert_eq!(
            kinds("MOV r0, c[1].x;"),
            vec![
                TokenKind::Identifier,
                TokenKind::Whitespace,
                TokenKind::Identifier,
                TokenKind::Comma,
                TokenKind::Whitespace,
                TokenKind::Identifier,
                TokenKind::LBracket,
                TokenKind::Integer(1),
                TokenKind::RBracket,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("1.5"), vec![TokenKind::Float(1.5)]);
        assert_eq!(kinds(".25"), vec![TokenKind::Float(0.25)]);
        assert_eq!(kinds("5."), vec![TokenKind::Float(5.0)]);
        assert_eq!(kinds("2e2"), vec![TokenKind::Float(200.0)]);
        assert_eq!(kinds("1.5e-1"), vec![TokenKind::Float(0.15)]);
        assert_eq!(kinds("42"), vec![TokenKind::Integer(42)]);
    }

    #[test]
    fn test_ranges_and_targets() {
        assert_eq!(
            kinds("0..3"),
            vec![TokenKind::Integer(0), TokenKind::DotDot, TokenKind::Integer(3)]
        );
        assert_eq!(kinds("2D"), vec![TokenKind::Identifier]);
        assert_eq!(
            kinds("1.x"),
            vec![TokenKind::Integer(1), TokenKind::Dot, TokenKind::Identifier]
        );
    }

    #[test]
    fn test_comments_and_newlines() {
        assert_eq!(
            kinds("# hello\r\nEND"),
            vec![
                TokenKind::Whitespace,
                TokenKind::Newline,
                TokenKind::Identifier
            ]
        );
        assert_eq!(kinds("\n"), vec![TokenKind::Newline]);
    }

    #[test]
    fn test_offsets_and_text() {
        let mut lexer = Lexer::new("!!ARBfp1.0\nEND", 10);
        let newline = lexer.advance();
        assert_eq!(newline.kind, TokenKind::Newline);
        assert_eq!(newline.offset, 10);
        let end = lexer.advance();
        assert_eq!(end.offset, 11);
        assert_eq!(lexer.text(end), "END");
        assert_eq!(lexer.advance().kind, TokenKind::Eof);
        assert_eq!(lexer.advance().kind, TokenKind::Eof);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::new("A  B", 0);
        lexer.advance();
        let peeked = lexer.peek_significant();
        assert_eq!(peeked.offset, 3);
        assert_eq!(lexer.current().offset, 0);
        assert_eq!(lexer.advance_significant(), peeked);
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(kinds("@"), vec![TokenKind::Invalid('@')]);
        assert_eq!(kinds("é"), vec![TokenKind::Invalid('é')]);
    }
}
