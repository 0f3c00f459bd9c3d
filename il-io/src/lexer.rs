//! Char-based lexer for the textual IL format. Mechanically similar to a
//! hand-written recursive-descent lexer (single-character lookahead,
//! `current_char`-driven dispatch) but scoped to the IL grammar rather than
//! a general-purpose source language: no keyword table, no string
//! interpolation, no bilingual identifiers.

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Bare identifier: opcode mnemonics, type names, block labels, `il`/
    /// `func`/`extern`/`global`, `true`/`false`/`null`, and `.loc` directives
    /// (the leading `.` is part of the identifier).
    Ident(String),
    /// `%name` — a temporary reference.
    Percent(String),
    /// `@name` — a global/extern reference.
    At(String),
    /// `^name` — a branch target reference.
    Caret(String),
    IntLit(i64),
    FloatLit(f64),
    StrLit(Vec<u8>),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Eq,
    Arrow,
    Newline,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
}

pub struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    _source: &'a str,
}

#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { chars: source.chars().collect(), pos: 0, line: 1, column: 1, _source: source }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_insignificant();
        let (line, column) = (self.line, self.column);
        let Some(c) = self.peek() else {
            return Ok(Token { kind: TokenKind::Eof, line, column });
        };

        let kind = match c {
            '\n' => {
                self.advance();
                TokenKind::Newline
            }
            '(' => { self.advance(); TokenKind::LParen }
            ')' => { self.advance(); TokenKind::RParen }
            '{' => { self.advance(); TokenKind::LBrace }
            '}' => { self.advance(); TokenKind::RBrace }
            ',' => { self.advance(); TokenKind::Comma }
            ':' => { self.advance(); TokenKind::Colon }
            '=' => { self.advance(); TokenKind::Eq }
            '-' if self.peek_at(1) == Some('>') => {
                self.advance();
                self.advance();
                TokenKind::Arrow
            }
            '%' => {
                self.advance();
                TokenKind::Percent(self.read_ident_text(line, column)?)
            }
            '@' => {
                self.advance();
                TokenKind::At(self.read_ident_text(line, column)?)
            }
            '^' => {
                self.advance();
                TokenKind::Caret(self.read_ident_text(line, column)?)
            }
            '"' => self.read_string(line, column)?,
            c if c.is_ascii_digit() || (c == '-' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) => {
                self.read_number(line, column)?
            }
            // Signed NaN/Inf literals (`-inf`, `-nan`) are the one case where
            // a leading sign attaches to an identifier rather than a digit.
            '-' if self.peek_at(1).is_some_and(|d| d.is_alphabetic()) => {
                self.advance();
                let rest = self.read_ident_text(line, column)?;
                TokenKind::Ident(format!("-{rest}"))
            }
            c if c.is_alphabetic() || c == '_' || c == '.' => self.read_ident_or_keyword(),
            other => {
                return Err(LexError { message: format!("unexpected character '{other}'"), line, column });
            }
        };
        Ok(Token { kind, line, column })
    }

    fn skip_insignificant(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some(';') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn is_ident_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_' || c == '.'
    }

    fn read_ident_text(&mut self, line: u32, column: u32) -> Result<String, LexError> {
        let start = self.pos;
        while self.peek().is_some_and(Self::is_ident_char) {
            self.advance();
        }
        if self.pos == start {
            return Err(LexError { message: "expected identifier".into(), line, column });
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn read_ident_or_keyword(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(Self::is_ident_char) {
            self.advance();
        }
        TokenKind::Ident(self.chars[start..self.pos].iter().collect())
    }

    fn read_number(&mut self, line: u32, column: u32) -> Result<TokenKind, LexError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.advance();
        }
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.advance();
            self.advance();
            let digit_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.advance();
            }
            if self.peek() == Some('.') {
                // hex float: consume fractional digits and optional p-exponent.
                self.advance();
                while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                    self.advance();
                }
                if matches!(self.peek(), Some('p') | Some('P')) {
                    self.advance();
                    if matches!(self.peek(), Some('+') | Some('-')) {
                        self.advance();
                    }
                    while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        self.advance();
                    }
                }
                let text: String = self.chars[start..self.pos].iter().collect();
                let value = parse_hex_float(&text)
                    .ok_or_else(|| LexError { message: format!("invalid hex float literal '{text}'"), line, column })?;
                return Ok(TokenKind::FloatLit(value));
            }
            let digits: String = self.chars[digit_start..self.pos].iter().collect();
            let value = i64::from_str_radix(&digits, 16)
                .map_err(|e| LexError { message: format!("invalid hex integer literal: {e}"), line, column })?;
            return Ok(TokenKind::IntLit(value));
        }
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('b') | Some('B')) {
            self.advance();
            self.advance();
            let digit_start = self.pos;
            while matches!(self.peek(), Some('0') | Some('1')) {
                self.advance();
            }
            let digits: String = self.chars[digit_start..self.pos].iter().collect();
            let value = i64::from_str_radix(&digits, 2)
                .map_err(|e| LexError { message: format!("invalid binary integer literal: {e}"), line, column })?;
            return Ok(TokenKind::IntLit(value));
        }

        let mut is_float = false;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if is_float {
            let value: f64 = text
                .parse()
                .map_err(|_| LexError { message: format!("invalid float literal '{text}'"), line, column })?;
            Ok(TokenKind::FloatLit(value))
        } else {
            let value: i64 = text
                .parse()
                .map_err(|_| LexError { message: format!("invalid integer literal '{text}'"), line, column })?;
            Ok(TokenKind::IntLit(value))
        }
    }

    fn read_string(&mut self, line: u32, column: u32) -> Result<TokenKind, LexError> {
        self.advance(); // opening quote
        let mut bytes = Vec::new();
        loop {
            match self.advance() {
                None => return Err(LexError { message: "unterminated string literal".into(), line, column }),
                Some('"') => break,
                Some('\\') => {
                    let escaped = self.advance().ok_or_else(|| LexError {
                        message: "unterminated escape sequence".into(),
                        line,
                        column,
                    })?;
                    match escaped {
                        'n' => bytes.push(b'\n'),
                        'r' => bytes.push(b'\r'),
                        't' => bytes.push(b'\t'),
                        '\\' => bytes.push(b'\\'),
                        '"' => bytes.push(b'"'),
                        '0' => bytes.push(0),
                        'x' => {
                            let hi = self.advance().ok_or_else(|| LexError {
                                message: "truncated \\x escape".into(),
                                line,
                                column,
                            })?;
                            let lo = self.advance().ok_or_else(|| LexError {
                                message: "truncated \\x escape".into(),
                                line,
                                column,
                            })?;
                            let byte = u8::from_str_radix(&format!("{hi}{lo}"), 16)
                                .map_err(|_| LexError { message: "invalid \\x escape".into(), line, column })?;
                            bytes.push(byte);
                        }
                        'u' => {
                            if self.peek() != Some('{') {
                                return Err(LexError { message: "expected '{' after \\u".into(), line, column });
                            }
                            self.advance();
                            let start = self.pos;
                            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                                self.advance();
                            }
                            let hex: String = self.chars[start..self.pos].iter().collect();
                            if self.peek() != Some('}') {
                                return Err(LexError { message: "expected '}' to close \\u escape".into(), line, column });
                            }
                            self.advance();
                            let code = u32::from_str_radix(&hex, 16)
                                .map_err(|_| LexError { message: "invalid \\u escape".into(), line, column })?;
                            let ch = char::from_u32(code)
                                .ok_or_else(|| LexError { message: "invalid unicode scalar in \\u escape".into(), line, column })?;
                            let mut buf = [0u8; 4];
                            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                        }
                        'U' => {
                            let start = self.pos;
                            for _ in 0..8 {
                                if self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                                    self.advance();
                                }
                            }
                            let hex: String = self.chars[start..self.pos].iter().collect();
                            let code = u32::from_str_radix(&hex, 16)
                                .map_err(|_| LexError { message: "invalid \\U escape".into(), line, column })?;
                            let ch = char::from_u32(code)
                                .ok_or_else(|| LexError { message: "invalid unicode scalar in \\U escape".into(), line, column })?;
                            let mut buf = [0u8; 4];
                            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                        }
                        other => {
                            return Err(LexError { message: format!("unrecognized escape '\\{other}'"), line, column });
                        }
                    }
                }
                Some(c) => {
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
        }
        Ok(TokenKind::StrLit(bytes))
    }
}

fn parse_hex_float(text: &str) -> Option<f64> {
    // Minimal hex-float support (`0x1.fp3`) sufficient for round-tripping
    // values this toolchain itself emits; full IEEE hex-float parsing with
    // every edge case is out of scope.
    let neg = text.starts_with('-');
    let text = text.trim_start_matches('-');
    let rest = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))?;
    let (mantissa, exponent) = match rest.split_once(['p', 'P']) {
        Some((m, e)) => (m, e.parse::<i32>().ok()?),
        None => (rest, 0),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    let int_val = if int_part.is_empty() { 0u64 } else { u64::from_str_radix(int_part, 16).ok()? };
    let mut value = int_val as f64;
    let mut scale = 1.0f64 / 16.0;
    for c in frac_part.chars() {
        let digit = c.to_digit(16)? as f64;
        value += digit * scale;
        scale /= 16.0;
    }
    value *= 2f64.powi(exponent);
    Some(if neg { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_simple_instruction_line() {
        let toks = kinds("%0 = add i64 40, 2\n");
        assert_eq!(
            toks,
            vec![
                TokenKind::Percent("0".into()),
                TokenKind::Eq,
                TokenKind::Ident("add".into()),
                TokenKind::Ident("i64".into()),
                TokenKind::IntLit(40),
                TokenKind::Comma,
                TokenKind::IntLit(2),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_hex_and_binary_integers() {
        assert_eq!(kinds("0x2A")[0], TokenKind::IntLit(42));
        assert_eq!(kinds("0b101")[0], TokenKind::IntLit(5));
    }

    #[test]
    fn lexes_branch_target_with_caret() {
        let toks = kinds("^loop");
        assert_eq!(toks[0], TokenKind::Caret("loop".into()));
    }

    #[test]
    fn lexes_string_escapes() {
        let toks = kinds("\"a\\nb\"");
        assert_eq!(toks[0], TokenKind::StrLit(b"a\nb".to_vec()));
    }

    #[test]
    fn skips_comments() {
        let toks = kinds("add ; a comment\ni64");
        assert_eq!(toks[0], TokenKind::Ident("add".into()));
        assert_eq!(toks[1], TokenKind::Newline);
        assert_eq!(toks[2], TokenKind::Ident("i64".into()));
    }
}
