//! microc-lex - Lexical Analyzer
//!
//! Turns source text into a flat token stream. One pass, no backtracking:
//! each call to [`Lexer::next_token`] consumes exactly the characters that
//! make up one token and returns it paired with its [`Span`]. Unknown bytes
//! are reported through the shared [`Handler`] and skipped so the rest of
//! the file can still be tokenized.

use microc_util::diagnostic::{DiagnosticBuilder, E_LEXER_UNEXPECTED_CHAR};
use microc_util::{FileId, Handler, Span, Symbol};

/// A lexical token, already carrying its resolved payload (interned
/// identifier, parsed literal value) rather than a raw substring.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Int(i64),
    Ident(Symbol),

    // Keywords
    KwInt,
    KwChar,
    KwBool,
    KwVoid,
    KwStruct,
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwReturn,
    KwBreak,
    KwTrue,
    KwFalse,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Dot,
    Arrow, // ->
    Amp,   // &
    Star,  // *
    Plus,
    Minus,
    Slash,
    Percent,
    Bang,
    Tilde,
    Pipe,
    Caret,
    Shl,
    Shr,
    AmpAmp,
    PipePipe,
    Eq, // =
    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Question,
    Colon,
    PlusPlus,
    MinusMinus,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,

    Eof,
}

impl Token {
    /// Keyword lookup, used once an identifier-shaped run of characters has
    /// been scanned.
    fn keyword(ident: &str) -> Option<Token> {
        Some(match ident {
            "int" => Token::KwInt,
            "char" => Token::KwChar,
            "bool" => Token::KwBool,
            "void" => Token::KwVoid,
            "struct" => Token::KwStruct,
            "if" => Token::KwIf,
            "else" => Token::KwElse,
            "while" => Token::KwWhile,
            "for" => Token::KwFor,
            "return" => Token::KwReturn,
            "break" => Token::KwBreak,
            "true" => Token::KwTrue,
            "false" => Token::KwFalse,
            _ => return None,
        })
    }
}

/// A token together with the source range it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Scans one source file into a token stream.
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    file_id: FileId,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file_id: FileId) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            file_id,
        }
    }

    /// Tokenizes the whole input, always ending with a trailing [`Token::Eof`].
    pub fn tokenize(mut self, handler: &Handler) -> Vec<SpannedToken> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token(handler);
            let is_eof = tok.token == Token::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while self.peek().is_some() && self.peek() != Some(b'\n') {
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.advance();
                    self.advance();
                    while self.peek().is_some()
                        && !(self.peek() == Some(b'*') && self.peek_at(1) == Some(b'/'))
                    {
                        self.advance();
                    }
                    self.advance();
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn make_span(&self, start: usize, start_line: u32, start_col: u32) -> Span {
        Span::with_file(start, self.pos, self.file_id, start_line, start_col)
    }

    /// Scans and returns the next token. Callers that want a full stream
    /// should use [`Lexer::tokenize`] instead.
    pub fn next_token(&mut self, handler: &Handler) -> SpannedToken {
        self.skip_trivia();

        let start = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let Some(b) = self.peek() else {
            return SpannedToken {
                token: Token::Eof,
                span: self.make_span(start, start_line, start_col),
            };
        };

        if b.is_ascii_digit() {
            return self.lex_number(start, start_line, start_col);
        }
        if b.is_ascii_alphabetic() || b == b'_' {
            return self.lex_ident(start, start_line, start_col);
        }

        self.advance();
        let token = match b {
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'{' => Token::LBrace,
            b'}' => Token::RBrace,
            b'[' => Token::LBracket,
            b']' => Token::RBracket,
            b';' => Token::Semi,
            b',' => Token::Comma,
            b'.' => Token::Dot,
            b'~' => Token::Tilde,
            b'?' => Token::Question,
            b':' => Token::Colon,
            b'+' => {
                if self.peek() == Some(b'+') {
                    self.advance();
                    Token::PlusPlus
                } else {
                    self.two_char(b'=', Token::PlusEq, Token::Plus)
                }
            }
            b'-' => {
                if self.peek() == Some(b'>') {
                    self.advance();
                    Token::Arrow
                } else if self.peek() == Some(b'-') {
                    self.advance();
                    Token::MinusMinus
                } else {
                    self.two_char(b'=', Token::MinusEq, Token::Minus)
                }
            }
            b'*' => self.two_char(b'=', Token::StarEq, Token::Star),
            b'/' => self.two_char(b'=', Token::SlashEq, Token::Slash),
            b'%' => self.two_char(b'=', Token::PercentEq, Token::Percent),
            b'^' => self.two_char(b'=', Token::CaretEq, Token::Caret),
            b'&' => {
                if self.peek() == Some(b'&') {
                    self.advance();
                    Token::AmpAmp
                } else {
                    self.two_char(b'=', Token::AmpEq, Token::Amp)
                }
            }
            b'|' => {
                if self.peek() == Some(b'|') {
                    self.advance();
                    Token::PipePipe
                } else {
                    self.two_char(b'=', Token::PipeEq, Token::Pipe)
                }
            }
            b'!' => self.two_char(b'=', Token::Ne, Token::Bang),
            b'=' => self.two_char(b'=', Token::EqEq, Token::Eq),
            b'<' => {
                if self.peek() == Some(b'<') {
                    self.advance();
                    Token::Shl
                } else {
                    self.two_char(b'=', Token::Le, Token::Lt)
                }
            }
            b'>' => {
                if self.peek() == Some(b'>') {
                    self.advance();
                    Token::Shr
                } else {
                    self.two_char(b'=', Token::Ge, Token::Gt)
                }
            }
            other => {
                let span = self.make_span(start, start_line, start_col);
                DiagnosticBuilder::error(format!("unexpected character '{}'", other as char))
                    .code(E_LEXER_UNEXPECTED_CHAR)
                    .span(span)
                    .emit(handler);
                return self.next_token(handler);
            }
        };

        SpannedToken {
            token,
            span: self.make_span(start, start_line, start_col),
        }
    }

    /// Consumes `second` if it follows the char just advanced past, producing
    /// `two` on a match and `one` otherwise.
    fn two_char(&mut self, second: u8, two: Token, one: Token) -> Token {
        if self.peek() == Some(second) {
            self.advance();
            two
        } else {
            one
        }
    }

    fn lex_number(&mut self, start: usize, start_line: u32, start_col: u32) -> SpannedToken {
        while self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
            self.advance();
        }
        let text = &self.source[start..self.pos];
        let value = text.parse::<i64>().unwrap_or(0);
        SpannedToken {
            token: Token::Int(value),
            span: self.make_span(start, start_line, start_col),
        }
    }

    fn lex_ident(&mut self, start: usize, start_line: u32, start_col: u32) -> SpannedToken {
        while self
            .peek()
            .map(|b| b.is_ascii_alphanumeric() || b == b'_')
            .unwrap_or(false)
        {
            self.advance();
        }
        let text = &self.source[start..self.pos];
        let token = Token::keyword(text).unwrap_or_else(|| Token::Ident(Symbol::intern(text)));
        SpannedToken {
            token,
            span: self.make_span(start, start_line, start_col),
        }
    }
}
