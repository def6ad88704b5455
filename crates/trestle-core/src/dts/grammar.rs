// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The device-tree source grammar.
//!
//! ```text
//! file          := nodeContent | content
//! content       := (entry(rootNode) | directive entries | entry(ppMacro) | invalidEntry)*
//! nodeContent   := (/delete-property/ NAME ; | /delete-node/ NAME ;
//!                  | entry(subNode) | entry(property))+
//! rootNode      := LABEL* ('/' | pHandle) '{' nodeContent? '}'
//! subNode       := LABEL* /omit-if-no-ref/? LABEL* NAME '{' nodeContent? '}'
//! property      := LABEL* NAME ('=' values)?
//! value         := string | pHandle | cellArray | byteArray | ppMacro
//! ```
//!
//! Every production that can commit to a partial match has a pin and a
//! recovery set, so an error inside one property or node stays local to
//! it. Anything at the top level that no production accepts is skipped
//! through the next `;` as a single error node.

use super::Dts;
use super::expressions::{OPERATORS, atom};
use super::macros::MACRO_RULES;
use super::syntax::{DtsNode, DtsToken};
use crate::engine::{
    CompletedMarker, EmbedContext, Grammar, LOWEST, LazyRule, OperatorTable, Parser, RootShape,
    TokenSet, expression,
};

const DIRECTIVE_RECOVERY: TokenSet<DtsToken> = TokenSet::new(&[DtsToken::Semicolon]);
const ROOT_NODE_RECOVERY: TokenSet<DtsToken> = TokenSet::new(&[DtsToken::Semicolon]);
const NODE_RECOVERY: TokenSet<DtsToken> =
    TokenSet::new(&[DtsToken::Semicolon, DtsToken::Name]);
const PROPERTY_RECOVERY: TokenSet<DtsToken> =
    TokenSet::new(&[DtsToken::Semicolon, DtsToken::RBrace, DtsToken::Name]);
const BITS_RECOVERY: TokenSet<DtsToken> =
    TokenSet::new(&[DtsToken::Semicolon, DtsToken::RBrace, DtsToken::LAngl]);
const CELL_RECOVERY: TokenSet<DtsToken> = TokenSet::new(&[
    DtsToken::Semicolon,
    DtsToken::RBrace,
    DtsToken::Comma,
    DtsToken::RAngl,
    DtsToken::RParen,
]);
const BYTE_RECOVERY: TokenSet<DtsToken> = TokenSet::new(&[
    DtsToken::Semicolon,
    DtsToken::RBrace,
    DtsToken::Comma,
    DtsToken::RBrac,
    DtsToken::RParen,
]);
const PATH_RECOVERY: TokenSet<DtsToken> =
    TokenSet::new(&[DtsToken::Semicolon, DtsToken::RAngl, DtsToken::RBrace]);
const CELL_FIRST: TokenSet<DtsToken> = TokenSet::new(&[
    DtsToken::Int,
    DtsToken::SQuote,
    DtsToken::LParen,
    DtsToken::PpMacro,
]);

/// Device-tree source files (`.dts`, `.dtsi`, overlays).
#[derive(Debug, Clone, Copy, Default)]
pub struct DtsGrammar;

impl Grammar<Dts> for DtsGrammar {
    fn name(&self) -> &'static str {
        "dts"
    }

    fn root(&self, _context: &EmbedContext<Dts>) -> RootShape<Dts> {
        RootShape::Node(DtsNode::File)
    }

    fn parse_entry(&self, p: &mut Parser<'_, Dts>) {
        if p.at_end() {
            return;
        }
        if !node_content(p) {
            content(p);
        }
    }

    fn operators(&self) -> Option<&OperatorTable<Dts>> {
        Some(&OPERATORS)
    }

    fn parse_atom(&self, p: &mut Parser<'_, Dts>) -> Option<CompletedMarker> {
        atom(p)
    }

    fn lazy_rules(&self) -> &[LazyRule<Dts>] {
        &MACRO_RULES
    }
}

// ============================================================================
// Top Level
// ============================================================================

fn content(p: &mut Parser<'_, Dts>) {
    p.rule("content", |p| {
        let m = p.open();
        p.zero_or_more("content", |p| {
            entry(p, root_node)
                || entry(p, |p| keyword_directive(p, DtsToken::V1))
                || entry(p, |p| keyword_directive(p, DtsToken::Plugin))
                || entry(p, memreserve)
                || entry(p, |p| reference_directive(p, DtsToken::OmitNode))
                || entry(p, |p| reference_directive(p, DtsToken::DeleteNode))
                || entry(p, pp_macro)
                || invalid_entry(p)
        });
        p.close(m, DtsNode::Content);
    });
}

/// `item ';'`, committed once `item` matched.
fn entry(p: &mut Parser<'_, Dts>, item: impl FnOnce(&mut Parser<'_, Dts>) -> bool) -> bool {
    p.rule("entry", |p| {
        let mut seq = p.sequence();
        seq.with(item).pin().token(DtsToken::Semicolon);
        seq.finish(DtsNode::Entry, None)
    })
}

/// Skips one unrecognised top-level statement through its `;`, treating
/// braces as nesting.
fn invalid_entry(p: &mut Parser<'_, Dts>) -> bool {
    if p.at_end() {
        return false;
    }
    p.rule("invalid entry", |p| {
        p.error_expected("root node or directive");
        let m = p.open();
        let mut depth = 0u32;
        while !p.at_end() {
            let current = p.current();
            p.bump();
            match current {
                DtsToken::LBrace => depth += 1,
                DtsToken::RBrace => depth = depth.saturating_sub(1),
                DtsToken::Semicolon if depth == 0 => break,
                _ => {}
            }
        }
        p.close(m, DtsNode::Error);
        true
    })
}

fn keyword_directive(p: &mut Parser<'_, Dts>, keyword: DtsToken) -> bool {
    p.rule("directive", |p| {
        let mut seq = p.sequence();
        seq.token(keyword).pin();
        seq.finish(DtsNode::CompilerDirective, DIRECTIVE_RECOVERY)
    })
}

/// `/omit-if-no-ref/ &ref` and `/delete-node/ &ref`.
fn reference_directive(p: &mut Parser<'_, Dts>, keyword: DtsToken) -> bool {
    p.rule("directive", |p| {
        let mut seq = p.sequence();
        seq.token(keyword).pin().rule("reference", phandle);
        seq.finish(DtsNode::CompilerDirective, DIRECTIVE_RECOVERY)
    })
}

fn memreserve(p: &mut Parser<'_, Dts>) -> bool {
    p.rule("memreserve", |p| {
        let mut seq = p.sequence();
        seq.repeat("labels", labels)
            .token(DtsToken::MemReserve)
            .pin()
            .rule("address", cell)
            .rule("size", cell);
        seq.finish(DtsNode::CompilerDirective, DIRECTIVE_RECOVERY)
    })
}

// ============================================================================
// Nodes
// ============================================================================

fn root_node(p: &mut Parser<'_, Dts>) -> bool {
    p.rule("root node", |p| {
        let mut seq = p.sequence();
        seq.repeat("labels", labels)
            .rule("'/' or reference", |p| p.eat(DtsToken::Slash) || phandle(p))
            .token(DtsToken::LBrace)
            .pin()
            .optional(node_content)
            .token(DtsToken::RBrace);
        seq.finish(DtsNode::RootNode, ROOT_NODE_RECOVERY)
    })
}

fn sub_node(p: &mut Parser<'_, Dts>) -> bool {
    p.rule("sub node", |p| {
        let mut seq = p.sequence();
        seq.repeat("labels", labels)
            .optional(|p| p.eat(DtsToken::OmitNode))
            .repeat("labels", labels)
            .token(DtsToken::Name)
            .token(DtsToken::LBrace)
            .pin()
            .optional(node_content)
            .token(DtsToken::RBrace);
        seq.finish(DtsNode::SubNode, NODE_RECOVERY)
    })
}

fn node_content(p: &mut Parser<'_, Dts>) -> bool {
    p.rule("node content", |p| {
        let m = p.open();
        let matched = p.one_or_more("node content", |p| {
            entry(p, delete_property)
                || entry(p, delete_node_by_name)
                || entry(p, sub_node)
                || entry(p, property)
        });
        if matched {
            p.close(m, DtsNode::NodeContent);
        } else {
            p.drop_marker(m);
        }
        matched
    })
}

fn delete_property(p: &mut Parser<'_, Dts>) -> bool {
    p.rule("directive", |p| {
        let mut seq = p.sequence();
        seq.token(DtsToken::DeleteProp).pin().token(DtsToken::Name);
        seq.finish(DtsNode::CompilerDirective, DIRECTIVE_RECOVERY)
    })
}

/// Commits only once the name is seen, leaving `/delete-node/ &ref` to
/// the top level.
fn delete_node_by_name(p: &mut Parser<'_, Dts>) -> bool {
    p.rule("directive", |p| {
        let mut seq = p.sequence();
        seq.token(DtsToken::DeleteNode).token(DtsToken::Name).pin();
        seq.finish(DtsNode::CompilerDirective, DIRECTIVE_RECOVERY)
    })
}

// ============================================================================
// Properties
// ============================================================================

fn property(p: &mut Parser<'_, Dts>) -> bool {
    p.rule("property", |p| {
        let mut seq = p.sequence();
        seq.repeat("labels", labels)
            .token(DtsToken::Name)
            .optional(property_assignment);
        seq.finish(DtsNode::Property, None)
    })
}

fn property_assignment(p: &mut Parser<'_, Dts>) -> bool {
    p.rule("property assignment", |p| {
        let mut seq = p.sequence();
        seq.token(DtsToken::Assign)
            .pin()
            .repeat("labels", labels)
            .rule("property value", value)
            .repeat("labels", labels)
            .repeat("values", |p| {
                let mut seq = p.sequence();
                seq.token(DtsToken::Comma)
                    .repeat("labels", labels)
                    .rule("property value", value)
                    .repeat("labels", labels);
                seq.finish(None, None)
            });
        seq.finish(None, PROPERTY_RECOVERY)
    })
}

fn value(p: &mut Parser<'_, Dts>) -> bool {
    p.rule("value", |p| {
        string(p) || phandle(p) || cell_array(p) || byte_array(p) || pp_macro(p)
    })
}

fn labels(p: &mut Parser<'_, Dts>) -> bool {
    p.eat(DtsToken::Label)
}

fn string(p: &mut Parser<'_, Dts>) -> bool {
    if !p.at(DtsToken::DQuote) {
        return false;
    }
    let mut seq = p.sequence();
    seq.token(DtsToken::DQuote)
        .pin()
        .optional(|p| p.eat(DtsToken::StringValue))
        .token(DtsToken::DQuote);
    seq.finish(DtsNode::String, None)
}

/// `'c'`, shared with the expression grammars.
pub(super) fn char_literal(p: &mut Parser<'_, Dts>) -> bool {
    if !p.at(DtsToken::SQuote) {
        return false;
    }
    let mut seq = p.sequence();
    seq.token(DtsToken::SQuote)
        .pin()
        .repeat("character", |p| p.eat(DtsToken::CharValue))
        .token(DtsToken::SQuote);
    seq.finish(DtsNode::Char, None)
}

/// A macro token in a `PpMacro` node; its text is parsed lazily.
pub(super) fn pp_macro(p: &mut Parser<'_, Dts>) -> bool {
    if !p.at(DtsToken::PpMacro) {
        return false;
    }
    let m = p.open();
    p.bump();
    p.close(m, DtsNode::PpMacro);
    true
}

fn phandle(p: &mut Parser<'_, Dts>) -> bool {
    if !p.at(DtsToken::Handle) {
        return false;
    }
    p.rule("reference", |p| {
        let mut seq = p.sequence();
        seq.token(DtsToken::Handle)
            .pin()
            .rule("label or path", |p| p.eat(DtsToken::Name) || phandle_path(p));
        seq.finish(DtsNode::PHandle, None)
    })
}

fn phandle_path(p: &mut Parser<'_, Dts>) -> bool {
    let mut seq = p.sequence();
    seq.token(DtsToken::LBrace)
        .pin()
        .with(|p| {
            let found = p.eat(DtsToken::Path);
            if !found {
                p.error_expected(DtsToken::Path);
            }
            p.recover_until(PATH_RECOVERY, found);
            found
        })
        .token(DtsToken::RBrace);
    seq.finish(None, None)
}

// ============================================================================
// Cell and Byte Arrays
// ============================================================================

fn cell_array(p: &mut Parser<'_, Dts>) -> bool {
    p.rule("cell array", |p| {
        let mut seq = p.sequence();
        seq.optional(bits)
            .token(DtsToken::LAngl)
            .pin()
            .with(|p| {
                p.zero_or_more("cells", |p| {
                    let mut seq = p.sequence();
                    seq.repeat("labels", labels)
                        .rule("cell", |p| phandle(p) || cell(p))
                        .repeat("labels", labels);
                    seq.finish(None, None)
                });
                p.recover_until(CELL_RECOVERY, true);
                true
            })
            .token(DtsToken::RAngl);
        seq.finish(DtsNode::CellArray, None)
    })
}

fn bits(p: &mut Parser<'_, Dts>) -> bool {
    let mut seq = p.sequence();
    seq.token(DtsToken::Bits)
        .pin()
        .rule("integer or macro", |p| p.eat(DtsToken::Int) || pp_macro(p));
    seq.finish(DtsNode::CellArrayBits, BITS_RECOVERY)
}

fn cell(p: &mut Parser<'_, Dts>) -> bool {
    if !p.at_any(CELL_FIRST) {
        return false;
    }
    p.rule("cell", |p| {
        let mut seq = p.sequence();
        match seq.parser().current() {
            DtsToken::Int => {
                seq.token(DtsToken::Int);
            }
            DtsToken::SQuote => {
                seq.with(char_literal);
            }
            DtsToken::LParen => {
                seq.token(DtsToken::LParen)
                    .pin()
                    .rule("expression", |p| expression(p, LOWEST))
                    .token(DtsToken::RParen);
            }
            _ => {
                seq.with(pp_macro);
            }
        }
        seq.finish(DtsNode::Cell, None)
    })
}

fn byte_array(p: &mut Parser<'_, Dts>) -> bool {
    if !p.at(DtsToken::LBrac) {
        return false;
    }
    p.rule("byte array", |p| {
        let mut seq = p.sequence();
        seq.token(DtsToken::LBrac)
            .pin()
            .with(|p| {
                p.zero_or_more("bytes", |p| {
                    let mut seq = p.sequence();
                    seq.repeat("labels", labels)
                        .rule("byte", |p| p.eat(DtsToken::Byte) || pp_macro(p))
                        .repeat("labels", labels);
                    seq.finish(None, None)
                });
                p.recover_until(BYTE_RECOVERY, true);
                true
            })
            .token(DtsToken::RBrac);
        seq.finish(DtsNode::ByteArray, None)
    })
}
