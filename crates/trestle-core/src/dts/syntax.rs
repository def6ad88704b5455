// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token and node kinds for device-tree source.
//!
//! The device-tree grammar, its expression grammar and the embedded
//! preprocessor-macro grammar all share these kinds, so a macro tree can
//! use the same expression nodes as a cell expression.

use std::fmt;

use crate::engine::Language;

/// The device-tree language marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dts;

impl Language for Dts {
    type TokenKind = DtsToken;
    type NodeKind = DtsNode;
    const EOF: DtsToken = DtsToken::Eof;
    const ERROR: DtsNode = DtsNode::Error;
}

/// Token kinds produced by the device-tree lexers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DtsToken {
    // ========================================================================
    // Compiler directives
    // ========================================================================
    /// `/dts-v1/`
    V1,
    /// `/plugin/`
    Plugin,
    /// `/memreserve/`
    MemReserve,
    /// `/delete-node/`
    DeleteNode,
    /// `/delete-property/`
    DeleteProp,
    /// `/omit-if-no-ref/`
    OmitNode,
    /// `/bits/`
    Bits,

    // ========================================================================
    // Punctuation
    // ========================================================================
    Slash,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBrac,
    RBrac,
    /// `<` opening a cell array.
    LAngl,
    /// `>` closing a cell array.
    RAngl,
    Semicolon,
    Comma,
    Assign,

    // ========================================================================
    // Names and literals
    // ========================================================================
    /// `name:`, the colon included.
    Label,
    /// A node or property name.
    Name,
    /// `&` starting a phandle reference.
    Handle,
    /// The path inside `&{...}`.
    Path,
    DQuote,
    StringValue,
    SQuote,
    CharValue,
    Int,
    /// Two hex digits inside `[...]`.
    Byte,
    /// A preprocessor macro invocation, parsed lazily by the macro grammar.
    PpMacro,

    // ========================================================================
    // Expression operators
    // ========================================================================
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lsh,
    Rsh,
    Les,
    Grt,
    Leq,
    Geq,
    Eq,
    Neq,
    And,
    Xor,
    Or,
    LAnd,
    LOr,
    LNot,
    Not,
    Ternary,
    Colon,

    /// A plain identifier, only produced inside macro text.
    Ident,
    /// A character the lexer does not recognise.
    Error,
    Eof,
}

impl DtsToken {
    /// The fixed spelling of a directive or operator token.
    #[must_use]
    pub const fn spelling(self) -> Option<&'static str> {
        Some(match self {
            Self::V1 => "/dts-v1/",
            Self::Plugin => "/plugin/",
            Self::MemReserve => "/memreserve/",
            Self::DeleteNode => "/delete-node/",
            Self::DeleteProp => "/delete-property/",
            Self::OmitNode => "/omit-if-no-ref/",
            Self::Bits => "/bits/",
            Self::Slash | Self::Div => "/",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrac => "[",
            Self::RBrac => "]",
            Self::LAngl | Self::Les => "<",
            Self::RAngl | Self::Grt => ">",
            Self::Semicolon => ";",
            Self::Comma => ",",
            Self::Assign => "=",
            Self::Handle | Self::And => "&",
            Self::DQuote => "\"",
            Self::SQuote => "'",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Mod => "%",
            Self::Lsh => "<<",
            Self::Rsh => ">>",
            Self::Leq => "<=",
            Self::Geq => ">=",
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Xor => "^",
            Self::Or => "|",
            Self::LAnd => "&&",
            Self::LOr => "||",
            Self::LNot => "!",
            Self::Not => "~",
            Self::Ternary => "?",
            Self::Colon => ":",
            Self::Label
            | Self::Name
            | Self::Path
            | Self::StringValue
            | Self::CharValue
            | Self::Int
            | Self::Byte
            | Self::PpMacro
            | Self::Ident
            | Self::Error
            | Self::Eof => return None,
        })
    }
}

impl fmt::Display for DtsToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(spelling) = self.spelling() {
            return write!(f, "'{spelling}'");
        }
        f.write_str(match self {
            Self::Label => "label",
            Self::Name => "name",
            Self::Path => "path",
            Self::StringValue => "string content",
            Self::CharValue => "character",
            Self::Int => "integer",
            Self::Byte => "byte",
            Self::PpMacro => "macro",
            Self::Ident => "identifier",
            Self::Error => "unknown character",
            _ => "end of input",
        })
    }
}

/// Node kinds of device-tree, expression and macro trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DtsNode {
    // ========================================================================
    // Device tree
    // ========================================================================
    File,
    /// Top-level entries: root nodes and directives.
    Content,
    /// The entries of a node body (or of a fragment file).
    NodeContent,
    /// An item followed by its `;`.
    Entry,
    RootNode,
    SubNode,
    Property,
    CompilerDirective,
    CellArray,
    CellArrayBits,
    Cell,
    ByteArray,
    String,
    Char,
    PHandle,
    PpMacro,
    Error,

    // ========================================================================
    // Expressions
    // ========================================================================
    /// Root of a standalone expression parse.
    ExpressionFile,
    IntExpr,
    CharExpr,
    ParenExpr,
    PpMacroExpr,
    NegExpr,
    LNotExpr,
    BNotExpr,
    AddExpr,
    SubExpr,
    MulExpr,
    DivExpr,
    ModExpr,
    LshExpr,
    RshExpr,
    LesExpr,
    GrtExpr,
    LeqExpr,
    GeqExpr,
    EqExpr,
    NeqExpr,
    BAndExpr,
    XorExpr,
    BOrExpr,
    LAndExpr,
    LOrExpr,
    TernaryExpr,

    // ========================================================================
    // Embedded macros
    // ========================================================================
    /// Root of a macro used as a value or inside an expression.
    MacroRoot,
    /// Root of a macro used as a top-level statement.
    MacroStatement,
    MacroCall,
    MacroArgs,
    MacroArg,
    /// A macro name without arguments.
    MacroRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_tokens_display_quoted() {
        assert_eq!(DtsToken::Semicolon.to_string(), "';'");
        assert_eq!(DtsToken::DeleteProp.to_string(), "'/delete-property/'");
        assert_eq!(DtsToken::RAngl.to_string(), "'>'");
    }

    #[test]
    fn variable_tokens_display_as_words() {
        assert_eq!(DtsToken::Name.to_string(), "name");
        assert_eq!(DtsToken::Eof.to_string(), "end of input");
        assert_eq!(DtsToken::Label.spelling(), None);
    }
}
