//! Clause lexer
//!
//! Tokenizes `$select`/`$expand`/`$filter`/`$orderby` clause text into typed
//! tokens with a single token of non-destructive lookahead. The lexer has no
//! side effects beyond cursor advancement; every failure is a lexical error
//! carrying the raw clause text and the offending byte position.

use uriql_ast::{Token, TokenKind};
use uriql_diagnostics::{Result, Span, UriqlError, UQL0001, UQL0003, UQL0004, UQL0005, UQL0104};

/// Lexer over a single clause string
#[derive(Debug)]
pub struct ExpressionLexer {
    text: String,
    /// Byte position of the next unread character
    pos: usize,
    current: Token,
    /// One-token lookahead buffer, filled by [`Self::peek_next_token`]
    peeked: Option<Token>,
    allow_semicolon_delimiter: bool,
}

impl ExpressionLexer {
    /// Create a lexer over `text`
    ///
    /// When `start_at_first_token` is set the first token is read
    /// immediately and becomes [`Self::current_token`]; otherwise the
    /// current token is a zero-width end placeholder until the first
    /// [`Self::next_token`] call. `allow_semicolon_delimiter` controls
    /// whether `;` is a token or an unrecognized character.
    pub fn new(
        text: impl Into<String>,
        start_at_first_token: bool,
        allow_semicolon_delimiter: bool,
    ) -> Result<Self> {
        let mut lexer = Self {
            text: text.into(),
            pos: 0,
            current: Token::end(0),
            peeked: None,
            allow_semicolon_delimiter,
        };
        if start_at_first_token {
            lexer.current = lexer.lex_token()?;
        }
        Ok(lexer)
    }

    /// The clause text being tokenized
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The token most recently produced
    pub fn current_token(&self) -> &Token {
        &self.current
    }

    /// Advance to the next token and return it
    pub fn next_token(&mut self) -> Result<Token> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lex_token()?,
        };
        self.current = token.clone();
        Ok(token)
    }

    /// Look at the token after the current one without consuming it
    pub fn peek_next_token(&mut self) -> Result<Token> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lex_token()?);
        }
        Ok(self.peeked.clone().expect("peek buffer just filled"))
    }

    /// Read a dotted (namespace-qualified) identifier starting at the
    /// current token
    ///
    /// The current token must be an identifier. Each `.`-identifier pair is
    /// consumed and appended; in select context a terminal `.*` is accepted
    /// as well (e.g. `Ns.*`). On return the current token is the last
    /// component consumed.
    pub fn read_dotted_identifier(&mut self, in_select_context: bool) -> Result<String> {
        if self.current.kind != TokenKind::Identifier {
            return Err(UriqlError::syntax_at(
                UQL0104,
                format!("Expected identifier, found {}", self.current),
                self.text.clone(),
                self.current.position(),
            ));
        }
        let mut result = self.current.text.clone();
        while self.peek_next_token()?.kind == TokenKind::Dot {
            self.next_token()?; // consume the dot
            let component = self.next_token()?;
            match component.kind {
                TokenKind::Identifier => {
                    result.push('.');
                    result.push_str(&component.text);
                }
                TokenKind::Star if in_select_context => {
                    result.push_str(".*");
                    break;
                }
                _ => {
                    return Err(UriqlError::syntax_at(
                        UQL0104,
                        format!("Expected identifier after '.', found {component}"),
                        self.text.clone(),
                        component.position(),
                    ));
                }
            }
        }
        Ok(result)
    }

    fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn lex_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let start = self.pos;
        let Some(ch) = self.peek_char() else {
            return Ok(Token::end(start));
        };

        match ch {
            '*' => Ok(self.single_char_token(TokenKind::Star)),
            '.' => Ok(self.single_char_token(TokenKind::Dot)),
            '/' => Ok(self.single_char_token(TokenKind::Slash)),
            ',' => Ok(self.single_char_token(TokenKind::Comma)),
            '(' => Ok(self.single_char_token(TokenKind::OpenParen)),
            ')' => Ok(self.single_char_token(TokenKind::CloseParen)),
            '=' => Ok(self.single_char_token(TokenKind::Equal)),
            ';' if self.allow_semicolon_delimiter => {
                Ok(self.single_char_token(TokenKind::Semicolon))
            }
            '$' => self.lex_system_identifier(start),
            '\'' => self.lex_string_literal(start),
            '-' => {
                // A sign directly attached to a digit belongs to the number
                if self.rest()[1..].starts_with(|c: char| c.is_ascii_digit()) {
                    self.lex_number(start)
                } else {
                    Ok(self.single_char_token(TokenKind::Minus))
                }
            }
            c if c.is_ascii_digit() => self.lex_number(start),
            c if is_identifier_start(c) => Ok(self.lex_identifier(start)),
            c => Err(UriqlError::lexical(
                UQL0001,
                format!("Unrecognized character '{c}'"),
                self.text.clone(),
                start,
            )),
        }
    }

    fn single_char_token(&mut self, kind: TokenKind) -> Token {
        let start = self.pos;
        let ch = self.bump().expect("caller checked a character is present");
        Token::new(kind, ch, Span::new(start, self.pos))
    }

    fn lex_identifier(&mut self, start: usize) -> Token {
        while matches!(self.peek_char(), Some(c) if is_identifier_continue(c)) {
            self.bump();
        }
        Token::new(
            TokenKind::Identifier,
            &self.text[start..self.pos],
            Span::new(start, self.pos),
        )
    }

    fn lex_system_identifier(&mut self, start: usize) -> Result<Token> {
        self.bump(); // the '$'
        if !matches!(self.peek_char(), Some(c) if is_identifier_start(c)) {
            return Err(UriqlError::lexical(
                UQL0005,
                "'$' must be followed by an identifier",
                self.text.clone(),
                start,
            ));
        }
        while matches!(self.peek_char(), Some(c) if is_identifier_continue(c)) {
            self.bump();
        }
        Ok(Token::new(
            TokenKind::SystemIdentifier,
            &self.text[start..self.pos],
            Span::new(start, self.pos),
        ))
    }

    fn lex_string_literal(&mut self, start: usize) -> Result<Token> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\'') => {
                    // A doubled quote is an escaped quote
                    if self.peek_char() == Some('\'') {
                        self.bump();
                        value.push('\'');
                    } else {
                        return Ok(Token::new(
                            TokenKind::StringLiteral,
                            value,
                            Span::new(start, self.pos),
                        ));
                    }
                }
                Some(c) => value.push(c),
                None => {
                    return Err(UriqlError::lexical(
                        UQL0003,
                        "Unterminated string literal",
                        self.text.clone(),
                        start,
                    ));
                }
            }
        }
    }

    fn lex_number(&mut self, start: usize) -> Result<Token> {
        if self.peek_char() == Some('-') {
            self.bump();
        }
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        let mut kind = TokenKind::IntegerLiteral;
        if self.peek_char() == Some('.') {
            // Only a digit run makes the dot part of the number; `1.x` is a
            // malformed literal rather than a dotted identifier
            self.bump();
            if !matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                return Err(UriqlError::lexical(
                    UQL0004,
                    format!("Malformed numeric literal '{}'", &self.text[start..self.pos]),
                    self.text.clone(),
                    start,
                ));
            }
            while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
            kind = TokenKind::DecimalLiteral;
        }
        Ok(Token::new(
            kind,
            &self.text[start..self.pos],
            Span::new(start, self.pos),
        ))
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
