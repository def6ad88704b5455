// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for device-tree source.
//!
//! Device-tree source is context sensitive at the character level: `>`
//! closes a cell array but compares inside a parenthesised cell
//! expression, `abc` is a node name at statement level but a macro inside
//! a value, and `12` is a name in one place and an integer in another.
//! The lexer therefore tracks a small [`Mode`] that follows the
//! punctuation it has already produced.
//!
//! # Design Principles
//!
//! - **Never fails**: unknown characters become [`DtsToken::Error`]
//! - **Trivia preservation**: whitespace, comments and preprocessor lines
//!   ride on the following token
//! - **Absolute spans**: embedded lexers start at a base offset so their
//!   spans nest inside the enclosing token
//!
//! # Example
//!
//! ```
//! use trestle_core::dts::{DtsToken, Lexer};
//!
//! let kinds: Vec<_> = Lexer::new("reg = <0x10 4>;").map(|t| t.kind()).collect();
//! assert_eq!(
//!     kinds,
//!     [
//!         DtsToken::Name,
//!         DtsToken::Assign,
//!         DtsToken::LAngl,
//!         DtsToken::Int,
//!         DtsToken::Int,
//!         DtsToken::RAngl,
//!         DtsToken::Semicolon,
//!     ]
//! );
//! ```

use std::collections::VecDeque;
use std::iter::Peekable;
use std::str::CharIndices;

use ecow::EcoString;

use super::syntax::DtsToken;
use crate::source_analysis::{Span, Token, Trivia};

/// Compiler directives, longest first where spellings share a prefix.
const DIRECTIVES: &[(&str, DtsToken)] = &[
    ("/dts-v1/", DtsToken::V1),
    ("/plugin/", DtsToken::Plugin),
    ("/memreserve/", DtsToken::MemReserve),
    ("/delete-node/", DtsToken::DeleteNode),
    ("/delete-property/", DtsToken::DeleteProp),
    ("/omit-if-no-ref/", DtsToken::OmitNode),
    ("/bits/", DtsToken::Bits),
];

/// Preprocessor directives recognised at the start of a line.
const PREPROCESSOR: &[&str] = &[
    "include", "define", "undef", "if", "ifdef", "ifndef", "elif", "else", "endif", "error",
    "warning", "pragma", "line",
];

/// What the lexer expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Statements: names, labels, directives, braces.
    Top,
    /// After `=`: strings, cell arrays, byte arrays, macros.
    Value,
    /// Inside `<...>`; `depth` counts open parentheses.
    Cell { depth: u32 },
    /// Inside `[...]`.
    Bytes,
    /// A bare expression. `macros` lexes identifiers as macro
    /// invocations; otherwise they stay plain identifiers.
    Expression { macros: bool },
}

/// A lexer that tokenizes device-tree source.
///
/// Implements [`Iterator`], yielding every token except the final
/// end-of-input token. Use [`lex`] to get the full stream the parser
/// needs.
pub struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<CharIndices<'src>>,
    /// Byte position in `source`.
    position: usize,
    /// Offset added to every span.
    base: u32,
    mode: Mode,
    pending_trivia: Vec<Trivia>,
    /// Tokens already lexed as part of a multi-token construct.
    queue: VecDeque<Token<DtsToken>>,
    /// Only whitespace seen since the last newline.
    line_start: bool,
    /// The previous token was `&`, so a name follows.
    after_handle: bool,
    /// Between `/memreserve/` and `;`, where digits are integers.
    in_memreserve: bool,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.position)
            .field("mode", &self.mode)
            .field("remaining", &self.source.get(self.position..).unwrap_or(""))
            .finish()
    }
}

impl<'src> Lexer<'src> {
    /// Creates a lexer for a device-tree source file.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self::with_mode(source, 0, Mode::Top)
    }

    /// Creates a lexer for a bare expression starting at `base`.
    #[must_use]
    pub fn expression(source: &'src str, base: u32) -> Self {
        Self::with_mode(source, base, Mode::Expression { macros: true })
    }

    /// Creates a lexer for the text of a macro invocation starting at
    /// `base`. Identifiers are not folded into macro tokens.
    #[must_use]
    pub fn macro_text(source: &'src str, base: u32) -> Self {
        Self::with_mode(source, base, Mode::Expression { macros: false })
    }

    fn with_mode(source: &'src str, base: u32, mode: Mode) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            base,
            mode,
            pending_trivia: Vec::new(),
            queue: VecDeque::new(),
            line_start: true,
            after_handle: false,
            in_memreserve: false,
        }
    }

    /// Lexes everything, ending with the end-of-input token.
    #[must_use]
    pub fn tokenize(mut self) -> Vec<Token<DtsToken>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.lex_token();
            let is_eof = token.kind() == DtsToken::Eof;
            tokens.push(token);
            if is_eof {
                return tokens;
            }
        }
    }

    // ========================================================================
    // Character Cursor
    // ========================================================================

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n).map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        Some(c)
    }

    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    fn rest(&self) -> &'src str {
        &self.source[self.position..]
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are not supported"
    )]
    fn span_from(&self, start: usize) -> Span {
        Span::new(self.base + start as u32, self.base + self.position as u32)
    }

    fn text_from(&self, start: usize) -> &'src str {
        &self.source[start..self.position]
    }

    // ========================================================================
    // Trivia
    // ========================================================================

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    let start = self.position;
                    self.advance_while(char::is_whitespace);
                    let text = self.text_from(start);
                    if text.contains('\n') {
                        self.line_start = true;
                    }
                    self.push_trivia(Trivia::Whitespace, start);
                }
                Some('/') if self.peek_char_n(1) == Some('/') => {
                    let start = self.position;
                    self.advance_while(|c| c != '\n');
                    self.push_trivia(Trivia::LineComment, start);
                }
                Some('/') if self.peek_char_n(1) == Some('*') => self.lex_block_comment(),
                Some('#') if self.line_start && self.at_preprocessor_directive() => {
                    self.lex_preprocessor_line();
                }
                Some('/') if self.line_start && self.rest().starts_with("/include/") => {
                    self.lex_preprocessor_line();
                }
                _ => break,
            }
        }
    }

    fn push_trivia(&mut self, make: fn(EcoString) -> Trivia, start: usize) {
        let text = EcoString::from(self.text_from(start));
        self.pending_trivia.push(make(text));
    }

    fn lex_block_comment(&mut self) {
        let start = self.position;
        self.advance(); // /
        self.advance(); // *
        loop {
            match self.peek_char() {
                None => break, // unterminated
                Some('*') if self.peek_char_n(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    break;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
        self.push_trivia(Trivia::BlockComment, start);
    }

    fn at_preprocessor_directive(&self) -> bool {
        let word_and_rest = &self.rest()[1..];
        let word_len = word_and_rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(word_and_rest.len());
        let (word, after) = word_and_rest.split_at(word_len);
        PREPROCESSOR.contains(&word) && !after.starts_with(is_name_char)
    }

    /// Consumes a preprocessor line, following backslash continuations.
    fn lex_preprocessor_line(&mut self) {
        let start = self.position;
        loop {
            match self.peek_char() {
                None | Some('\n') => break,
                Some('\\') if self.peek_char_n(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                }
                Some('\\') if self.peek_char_n(1) == Some('\r') && self.peek_char_n(2) == Some('\n') => {
                    self.advance();
                    self.advance();
                    self.advance();
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
        self.push_trivia(Trivia::Preprocessor, start);
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    fn lex_token(&mut self) -> Token<DtsToken> {
        if let Some(token) = self.queue.pop_front() {
            return token;
        }

        self.skip_trivia();
        let leading_trivia = std::mem::take(&mut self.pending_trivia);
        let after_handle = std::mem::take(&mut self.after_handle);
        let start = self.position;

        let kind = match self.peek_char() {
            None => DtsToken::Eof,
            Some(c) if after_handle && is_ident_char(c) => {
                self.advance_while(is_ident_char);
                DtsToken::Name
            }
            Some(c) => match self.mode {
                Mode::Top => self.lex_top(c),
                Mode::Value => self.lex_value(c),
                Mode::Cell { depth } => self.lex_cell(c, depth),
                Mode::Bytes => self.lex_bytes(c),
                Mode::Expression { macros } => self.lex_expression(c, macros),
            },
        };
        self.line_start = false;

        let token = Token::with_trivia(
            kind,
            self.text_from(start),
            self.span_from(start),
            leading_trivia,
        );
        self.queue_continuation(kind);
        token
    }

    /// Lexes the tokens that follow an opening quote or `&{` as one unit,
    /// so their content is not split by the current mode.
    fn queue_continuation(&mut self, kind: DtsToken) {
        match kind {
            DtsToken::DQuote => self.queue_quoted('"', DtsToken::StringValue, DtsToken::DQuote),
            DtsToken::SQuote => self.queue_quoted('\'', DtsToken::CharValue, DtsToken::SQuote),
            DtsToken::Handle if self.peek_char() == Some('{') => {
                self.queue_single(DtsToken::LBrace);
                let start = self.position;
                self.advance_while(|c| !matches!(c, '}' | ';' | '>') && !c.is_whitespace());
                if self.position > start {
                    self.queue_from(DtsToken::Path, start);
                }
                if self.peek_char() == Some('}') {
                    self.queue_single(DtsToken::RBrace);
                }
            }
            DtsToken::Handle => self.after_handle = true,
            _ => {}
        }
    }

    fn queue_quoted(&mut self, quote: char, value: DtsToken, close: DtsToken) {
        let start = self.position;
        while let Some(c) = self.peek_char() {
            if c == quote || c == '\n' {
                break;
            }
            self.advance();
            if c == '\\' && self.peek_char().is_some_and(|c| c != '\n') {
                self.advance();
            }
        }
        if self.position > start {
            self.queue_from(value, start);
        }
        if self.peek_char() == Some(quote) {
            self.queue_single(close);
        } else if !matches!(self.mode, Mode::Expression { .. }) {
            // an unclosed quote ends at the newline and the next line
            // starts a new statement
            self.mode = Mode::Top;
        }
    }

    fn queue_single(&mut self, kind: DtsToken) {
        let start = self.position;
        self.advance();
        self.queue_from(kind, start);
    }

    fn queue_from(&mut self, kind: DtsToken, start: usize) {
        let token = Token::new(kind, self.text_from(start), self.span_from(start));
        self.queue.push_back(token);
    }

    fn single(&mut self, kind: DtsToken) -> DtsToken {
        self.advance();
        kind
    }

    /// Consumes a punctuation character and switches mode. Bare
    /// expressions never change mode.
    fn switch(&mut self, kind: DtsToken, mode: Mode) -> DtsToken {
        self.advance();
        if !matches!(self.mode, Mode::Expression { .. }) {
            self.mode = mode;
        }
        if kind == DtsToken::Semicolon {
            self.in_memreserve = false;
        }
        kind
    }

    // ========================================================================
    // Statement Level
    // ========================================================================

    fn lex_top(&mut self, c: char) -> DtsToken {
        match c {
            '0'..='9' if self.in_memreserve => self.lex_number(),
            '/' => self.lex_slash(),
            '=' => self.switch(DtsToken::Assign, Mode::Value),
            '<' => self.switch(DtsToken::LAngl, Mode::Cell { depth: 0 }),
            '[' => self.switch(DtsToken::LBrac, Mode::Bytes),
            ';' => self.switch(DtsToken::Semicolon, Mode::Top),
            '&' => self.single(DtsToken::Handle),
            c if is_name_char(c) => self.lex_top_word(),
            c => self.lex_punctuation(c),
        }
    }

    /// A label, a node or property name, or a statement-level macro.
    fn lex_top_word(&mut self) -> DtsToken {
        if let Some(kind) = self.lex_label() {
            return kind;
        }
        let start = self.position;
        self.advance_while(is_name_char);
        if self.peek_char() == Some('(') && is_c_identifier(self.text_from(start)) {
            self.consume_macro_arguments();
            return DtsToken::PpMacro;
        }
        DtsToken::Name
    }

    fn lex_slash(&mut self) -> DtsToken {
        let rest = self.rest();
        if let Some(&(spelling, kind)) = DIRECTIVES.iter().find(|(s, _)| rest.starts_with(s)) {
            for _ in 0..spelling.len() {
                self.advance();
            }
            if kind == DtsToken::MemReserve {
                self.in_memreserve = true;
            }
            return kind;
        }
        self.single(DtsToken::Slash)
    }

    /// Tokens that mean the same thing in every mode.
    fn lex_punctuation(&mut self, c: char) -> DtsToken {
        match c {
            '{' => self.switch(DtsToken::LBrace, Mode::Top),
            '}' => self.switch(DtsToken::RBrace, Mode::Top),
            ';' => self.switch(DtsToken::Semicolon, Mode::Top),
            '(' => self.single(DtsToken::LParen),
            ')' => self.single(DtsToken::RParen),
            ']' => self.single(DtsToken::RBrac),
            '>' => self.single(DtsToken::RAngl),
            ',' => self.single(DtsToken::Comma),
            ':' => self.single(DtsToken::Colon),
            '"' => self.single(DtsToken::DQuote),
            '\'' => self.single(DtsToken::SQuote),
            _ => self.single(DtsToken::Error),
        }
    }

    // ========================================================================
    // Values
    // ========================================================================

    fn lex_value(&mut self, c: char) -> DtsToken {
        match c {
            '<' => self.switch(DtsToken::LAngl, Mode::Cell { depth: 0 }),
            '[' => self.switch(DtsToken::LBrac, Mode::Bytes),
            '=' => self.single(DtsToken::Assign),
            '&' => self.single(DtsToken::Handle),
            '/' => self.lex_slash(),
            '0'..='9' => self.lex_number(),
            c if is_ident_start(c) => self.lex_value_word(),
            c => self.lex_punctuation(c),
        }
    }

    /// A label or a macro invocation.
    fn lex_value_word(&mut self) -> DtsToken {
        if let Some(kind) = self.lex_label() {
            return kind;
        }
        self.advance_while(is_ident_char);
        if self.peek_char() == Some('(') {
            self.consume_macro_arguments();
        }
        DtsToken::PpMacro
    }

    /// `ident:` with no space before the colon.
    fn lex_label(&mut self) -> Option<DtsToken> {
        let rest = self.rest();
        if !rest.starts_with(is_ident_start) {
            return None;
        }
        let len = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
        if !rest[len..].starts_with(':') {
            return None;
        }
        for _ in 0..=len {
            self.advance();
        }
        Some(DtsToken::Label)
    }

    /// Consumes a balanced argument list. Stops early, unbalanced, at a
    /// statement boundary so a missing `)` cannot swallow the file.
    fn consume_macro_arguments(&mut self) {
        let mut depth = 0u32;
        while let Some(c) = self.peek_char() {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                ';' | '{' | '}' => return,
                _ => {}
            }
            self.advance();
            if depth == 0 {
                return;
            }
        }
    }

    fn lex_number(&mut self) -> DtsToken {
        if self.peek_char() == Some('0') && matches!(self.peek_char_n(1), Some('x' | 'X')) {
            self.advance();
            self.advance();
            self.advance_while(|c| c.is_ascii_hexdigit());
        } else {
            self.advance_while(|c| c.is_ascii_digit());
        }
        self.advance_while(|c| matches!(c, 'u' | 'U' | 'l' | 'L'));
        if self.peek_char().is_some_and(is_ident_char) {
            self.advance_while(is_ident_char);
            return DtsToken::Error;
        }
        DtsToken::Int
    }

    // ========================================================================
    // Cell Arrays and Expressions
    // ========================================================================

    fn lex_cell(&mut self, c: char, depth: u32) -> DtsToken {
        match c {
            '>' if depth == 0 => self.switch(DtsToken::RAngl, Mode::Value),
            '&' if depth == 0 => self.single(DtsToken::Handle),
            '(' => self.switch(DtsToken::LParen, Mode::Cell { depth: depth + 1 }),
            ')' => self.switch(
                DtsToken::RParen,
                Mode::Cell {
                    depth: depth.saturating_sub(1),
                },
            ),
            ']' => self.switch(DtsToken::RBrac, Mode::Value),
            '[' => self.switch(DtsToken::LBrac, Mode::Bytes),
            '=' if self.peek_char_n(1) != Some('=') => self.switch(DtsToken::Assign, Mode::Value),
            '0'..='9' => self.lex_number(),
            c if is_ident_start(c) => self.lex_value_word(),
            c => self.lex_operator(c),
        }
    }

    fn lex_expression(&mut self, c: char, macros: bool) -> DtsToken {
        match c {
            '0'..='9' => self.lex_number(),
            '[' => self.single(DtsToken::LBrac),
            c if is_ident_start(c) && macros => self.lex_value_word(),
            c if is_ident_start(c) => {
                self.advance_while(is_ident_char);
                DtsToken::Ident
            }
            c => self.lex_operator(c),
        }
    }

    /// C operators; anything else falls through to punctuation.
    fn lex_operator(&mut self, c: char) -> DtsToken {
        let next = self.peek_char_n(1);
        let (kind, len) = match (c, next) {
            ('<', Some('<')) => (DtsToken::Lsh, 2),
            ('<', Some('=')) => (DtsToken::Leq, 2),
            ('<', _) => (DtsToken::Les, 1),
            ('>', Some('>')) => (DtsToken::Rsh, 2),
            ('>', Some('=')) => (DtsToken::Geq, 2),
            ('>', _) => (DtsToken::Grt, 1),
            ('=', Some('=')) => (DtsToken::Eq, 2),
            ('=', _) => (DtsToken::Assign, 1),
            ('!', Some('=')) => (DtsToken::Neq, 2),
            ('!', _) => (DtsToken::LNot, 1),
            ('&', Some('&')) => (DtsToken::LAnd, 2),
            ('&', _) => (DtsToken::And, 1),
            ('|', Some('|')) => (DtsToken::LOr, 2),
            ('|', _) => (DtsToken::Or, 1),
            ('+', _) => (DtsToken::Add, 1),
            ('-', _) => (DtsToken::Sub, 1),
            ('*', _) => (DtsToken::Mul, 1),
            ('/', _) => (DtsToken::Div, 1),
            ('%', _) => (DtsToken::Mod, 1),
            ('^', _) => (DtsToken::Xor, 1),
            ('~', _) => (DtsToken::Not, 1),
            ('?', _) => (DtsToken::Ternary, 1),
            _ => return self.lex_punctuation(c),
        };
        for _ in 0..len {
            self.advance();
        }
        kind
    }

    // ========================================================================
    // Byte Arrays
    // ========================================================================

    fn lex_bytes(&mut self, c: char) -> DtsToken {
        if c == ']' {
            return self.switch(DtsToken::RBrac, Mode::Value);
        }
        if !is_ident_char(c) {
            return self.lex_punctuation(c);
        }

        let rest = self.rest();
        let run = &rest[..rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len())];
        if run.chars().all(|c| c.is_ascii_hexdigit()) && !rest[run.len()..].starts_with(':') {
            // a run of hex digits is a sequence of two-digit bytes
            if run.len() == 1 {
                return self.single(DtsToken::Error);
            }
            self.advance();
            self.advance();
            return DtsToken::Byte;
        }
        if is_ident_start(c) {
            return self.lex_value_word();
        }
        self.advance_while(is_ident_char);
        DtsToken::Error
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token<DtsToken>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.lex_token();
        (token.kind() != DtsToken::Eof).then_some(token)
    }
}

/// Characters of node and property names.
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ',' | '.' | '_' | '+' | '*' | '#' | '?' | '@' | '-')
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_c_identifier(text: &str) -> bool {
    text.starts_with(is_ident_start) && text.chars().all(is_ident_char)
}

/// Lexes a device-tree source file, ending with the end-of-input token.
#[must_use]
pub fn lex(source: &str) -> Vec<Token<DtsToken>> {
    Lexer::new(source).tokenize()
}

/// Lexes a bare expression whose text starts at `base`.
#[must_use]
pub fn lex_expression(source: &str, base: u32) -> Vec<Token<DtsToken>> {
    Lexer::expression(source, base).tokenize()
}

/// Lexes the text of a macro invocation starting at `base`.
#[must_use]
pub fn lex_macro(source: &str, base: u32) -> Vec<Token<DtsToken>> {
    Lexer::macro_text(source, base).tokenize()
}
