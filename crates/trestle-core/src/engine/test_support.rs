// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! A small calculator language for exercising the engine in isolation.
//!
//! ```text
//! program   := (statement ';')*
//! statement := '{...}' | 'let' IDENT '=' expr | expr
//! expr      := precedence climbing over CALC_OPERATORS
//! ```
//!
//! `{...}` is a lazy region parsed by [`BlockGrammar`]. Written
//! directly as a statement, its root collapses into an
//! `EmbeddedStatement`; inside an expression it stays an `Embedded` root.

use std::fmt;

use super::{
    BinaryOperator, CompletedMarker, EmbedContext, Grammar, Grouping, LOWEST, Language,
    LazyRule, Node, OperatorTable, Parser, PrefixOperator, RootShape, TernaryOperator, TokenSet,
    expression,
};
use crate::source_analysis::{Diagnostic, Span, Token, Trivia};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Calc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum CalcToken {
    Num,
    Ident,
    Let,
    Plus,
    Minus,
    Star,
    Caret,
    Bang,
    Lt,
    Question,
    Colon,
    Eq,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semi,
    Embed,
    Junk,
    Eof,
}

impl fmt::Display for CalcToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Num => "number",
            Self::Ident => "identifier",
            Self::Let => "'let'",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::Caret => "'^'",
            Self::Bang => "'!'",
            Self::Lt => "'<'",
            Self::Question => "'?'",
            Self::Colon => "':'",
            Self::Eq => "'='",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::Semi => "';'",
            Self::Embed => "block",
            Self::Junk => "unknown character",
            Self::Eof => "end of input",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum CalcNode {
    Program,
    Statement,
    Let,
    Expr,
    Num,
    Name,
    Add,
    Sub,
    Mul,
    Pow,
    Neg,
    Not,
    Less,
    Ternary,
    Paren,
    EmbedExpr,
    Embedded,
    EmbeddedStatement,
    Block,
    Error,
}

impl Language for Calc {
    type TokenKind = CalcToken;
    type NodeKind = CalcNode;
    const EOF: CalcToken = CalcToken::Eof;
    const ERROR: CalcNode = CalcNode::Error;
}

pub(crate) static CALC_OPERATORS: OperatorTable<Calc> = OperatorTable {
    binary: &[
        BinaryOperator::non_assoc(CalcToken::Lt, 2, CalcNode::Less),
        BinaryOperator::left(CalcToken::Plus, 3, CalcNode::Add),
        BinaryOperator::left(CalcToken::Minus, 3, CalcNode::Sub),
        BinaryOperator::left(CalcToken::Star, 4, CalcNode::Mul),
        BinaryOperator::right(CalcToken::Caret, 5, CalcNode::Pow),
    ],
    prefix: &[
        PrefixOperator {
            token: CalcToken::Minus,
            node: CalcNode::Neg,
        },
        PrefixOperator {
            token: CalcToken::Bang,
            node: CalcNode::Not,
        },
    ],
    prefix_level: 6,
    ternary: Some(TernaryOperator {
        token: CalcToken::Question,
        separator: CalcToken::Colon,
        level: 1,
        node: CalcNode::Ternary,
    }),
    grouping: Some(Grouping {
        open: CalcToken::LParen,
        close: CalcToken::RParen,
        node: CalcNode::Paren,
    }),
};

static CALC_LAZY: [LazyRule<Calc>; 1] = [LazyRule {
    token: CalcToken::Embed,
    grammar: &BlockGrammar,
    lexer: lex_block,
}];

const STATEMENT_RECOVERY: TokenSet<CalcToken> = TokenSet::new(&[CalcToken::Semi]);

/// Statements separated by `;`.
pub(crate) struct CalcGrammar;

impl Grammar<Calc> for CalcGrammar {
    fn name(&self) -> &'static str {
        "calc"
    }

    fn root(&self, _context: &EmbedContext<Calc>) -> RootShape<Calc> {
        RootShape::Node(CalcNode::Program)
    }

    fn parse_entry(&self, p: &mut Parser<'_, Calc>) {
        p.zero_or_more("program", statement);
    }

    fn operators(&self) -> Option<&OperatorTable<Calc>> {
        Some(&CALC_OPERATORS)
    }

    fn parse_atom(&self, p: &mut Parser<'_, Calc>) -> Option<CompletedMarker> {
        atom(p)
    }

    fn lazy_rules(&self) -> &[LazyRule<Calc>] {
        &CALC_LAZY
    }
}

/// A single expression.
pub(crate) struct CalcExpressionGrammar;

impl Grammar<Calc> for CalcExpressionGrammar {
    fn name(&self) -> &'static str {
        "calc-expression"
    }

    fn root(&self, _context: &EmbedContext<Calc>) -> RootShape<Calc> {
        RootShape::Node(CalcNode::Expr)
    }

    fn parse_entry(&self, p: &mut Parser<'_, Calc>) {
        if !expression(p, LOWEST) {
            p.error_expected("expression");
        }
    }

    fn operators(&self) -> Option<&OperatorTable<Calc>> {
        Some(&CALC_OPERATORS)
    }

    fn parse_atom(&self, p: &mut Parser<'_, Calc>) -> Option<CompletedMarker> {
        atom(p)
    }
}

/// `{ expr }`, embedded lazily.
pub(crate) struct BlockGrammar;

impl Grammar<Calc> for BlockGrammar {
    fn name(&self) -> &'static str {
        "calc-block"
    }

    fn root(&self, context: &EmbedContext<Calc>) -> RootShape<Calc> {
        if context.enclosing() == Some(CalcNode::Statement) {
            RootShape::Collapse(CalcNode::EmbeddedStatement)
        } else {
            RootShape::Node(CalcNode::Embedded)
        }
    }

    fn parse_entry(&self, p: &mut Parser<'_, Calc>) {
        let mut seq = p.sequence();
        seq.token(CalcToken::LBrace)
            .pin()
            .rule("expression", |p| expression(p, LOWEST))
            .token(CalcToken::RBrace);
        seq.finish(CalcNode::Block, None);
    }

    fn operators(&self) -> Option<&OperatorTable<Calc>> {
        Some(&CALC_OPERATORS)
    }

    fn parse_atom(&self, p: &mut Parser<'_, Calc>) -> Option<CompletedMarker> {
        atom(p)
    }
}

fn statement(p: &mut Parser<'_, Calc>) -> bool {
    p.rule("statement", |p| {
        let mut seq = p.sequence();
        seq.rule("statement", statement_body)
            .pin()
            .token(CalcToken::Semi);
        seq.finish(CalcNode::Statement, None)
    })
}

fn statement_body(p: &mut Parser<'_, Calc>) -> bool {
    if p.at(CalcToken::Embed) && p.nth(1) == CalcToken::Semi {
        p.bump();
        return true;
    }
    let_body(p) || expression(p, LOWEST)
}

fn let_body(p: &mut Parser<'_, Calc>) -> bool {
    if !p.at(CalcToken::Let) {
        return false;
    }
    let mut seq = p.sequence();
    seq.token(CalcToken::Let)
        .pin()
        .token(CalcToken::Ident)
        .token(CalcToken::Eq)
        .rule("expression", |p| expression(p, LOWEST));
    seq.finish(CalcNode::Let, STATEMENT_RECOVERY)
}

fn atom(p: &mut Parser<'_, Calc>) -> Option<CompletedMarker> {
    let kind = match p.current() {
        CalcToken::Num => CalcNode::Num,
        CalcToken::Ident => CalcNode::Name,
        CalcToken::Embed => CalcNode::EmbedExpr,
        _ => return None,
    };
    let m = p.open();
    p.bump();
    Some(p.close(m, kind))
}

pub(crate) fn lex(source: &str) -> Vec<Token<CalcToken>> {
    lex_from(source, 0, false)
}

fn lex_block(source: &str, base: u32) -> Vec<Token<CalcToken>> {
    lex_from(source, base, true)
}

#[expect(clippy::cast_possible_truncation, reason = "test inputs are small")]
fn lex_from(source: &str, base: u32, inside_block: bool) -> Vec<Token<CalcToken>> {
    let span = |start: usize, end: usize| Span::new(base + start as u32, base + end as u32);
    let mut tokens = Vec::new();
    let mut trivia = Vec::new();
    let mut pos = 0;
    while let Some(c) = source[pos..].chars().next() {
        let start = pos;
        if c.is_whitespace() {
            while source[pos..].chars().next().is_some_and(char::is_whitespace) {
                pos += source[pos..].chars().next().map_or(0, char::len_utf8);
            }
            trivia.push(Trivia::Whitespace(source[start..pos].into()));
            continue;
        }
        pos += c.len_utf8();
        let kind = match c {
            '0'..='9' => {
                while source[pos..].starts_with(|c: char| c.is_ascii_digit()) {
                    pos += 1;
                }
                CalcToken::Num
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                while source[pos..].starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
                    pos += 1;
                }
                if &source[start..pos] == "let" {
                    CalcToken::Let
                } else {
                    CalcToken::Ident
                }
            }
            '{' if !inside_block => {
                let mut depth = 1;
                while depth > 0 {
                    match source[pos..].chars().next() {
                        Some('{') => depth += 1,
                        Some('}') => depth -= 1,
                        Some(_) => {}
                        None => break,
                    }
                    pos += source[pos..].chars().next().map_or(0, char::len_utf8);
                }
                CalcToken::Embed
            }
            '{' => CalcToken::LBrace,
            '}' => CalcToken::RBrace,
            '+' => CalcToken::Plus,
            '-' => CalcToken::Minus,
            '*' => CalcToken::Star,
            '^' => CalcToken::Caret,
            '!' => CalcToken::Bang,
            '<' => CalcToken::Lt,
            '?' => CalcToken::Question,
            ':' => CalcToken::Colon,
            '=' => CalcToken::Eq,
            '(' => CalcToken::LParen,
            ')' => CalcToken::RParen,
            ';' => CalcToken::Semi,
            _ => CalcToken::Junk,
        };
        tokens.push(Token::with_trivia(
            kind,
            &source[start..pos],
            span(start, pos),
            std::mem::take(&mut trivia),
        ));
    }
    tokens.push(Token::with_trivia(
        CalcToken::Eof,
        "",
        span(pos, pos),
        trivia,
    ));
    tokens
}

pub(crate) fn parse_calc_with(
    grammar: &dyn Grammar<Calc>,
    source: &str,
) -> (Node<Calc>, Vec<Diagnostic>) {
    super::parse(grammar, lex(source))
}

/// A grammar whose entry rule is an arbitrary function, for poking at
/// the engine one call at a time.
pub(crate) struct ScriptGrammar(pub fn(&mut Parser<'_, Calc>));

impl Grammar<Calc> for ScriptGrammar {
    fn name(&self) -> &'static str {
        "calc-script"
    }

    fn root(&self, _context: &EmbedContext<Calc>) -> RootShape<Calc> {
        RootShape::Node(CalcNode::Program)
    }

    fn parse_entry(&self, p: &mut Parser<'_, Calc>) {
        (self.0)(p);
    }

    fn operators(&self) -> Option<&OperatorTable<Calc>> {
        Some(&CALC_OPERATORS)
    }

    fn parse_atom(&self, p: &mut Parser<'_, Calc>) -> Option<CompletedMarker> {
        atom(p)
    }
}
