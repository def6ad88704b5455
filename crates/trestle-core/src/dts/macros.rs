// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The embedded grammar for preprocessor macro invocations.
//!
//! The lexers keep a macro such as `GPIO(1, FLAGS | 2)` as one opaque
//! token; this grammar parses its text when the region is materialized.
//! A macro used as a whole top-level statement gets a `MacroStatement`
//! root that absorbs its call node; anywhere else the call sits under a
//! `MacroRoot`.

use super::Dts;
use super::expressions::{OPERATORS, atom};
use super::lexer::lex_macro;
use super::syntax::{DtsNode, DtsToken};
use crate::engine::{
    CompletedMarker, EmbedContext, Grammar, LOWEST, LazyRule, OperatorTable, Parser, RootShape,
    TokenSet, expression,
};

/// Registers the macro token for lazy parsing.
pub(crate) static MACRO_RULES: [LazyRule<Dts>; 1] = [LazyRule {
    token: DtsToken::PpMacro,
    grammar: &MacroGrammar,
    lexer: lex_macro,
}];

const ARGUMENT_RECOVERY: TokenSet<DtsToken> =
    TokenSet::new(&[DtsToken::Comma, DtsToken::RParen]);

/// Parses the text of one macro invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacroGrammar;

impl Grammar<Dts> for MacroGrammar {
    fn name(&self) -> &'static str {
        "dts-macro"
    }

    fn root(&self, context: &EmbedContext<Dts>) -> RootShape<Dts> {
        let statement = !context.is_root()
            && context.ancestors().iter().all(|kind| {
                matches!(
                    kind,
                    DtsNode::File | DtsNode::Content | DtsNode::Entry | DtsNode::PpMacro
                )
            });
        if statement {
            RootShape::Collapse(DtsNode::MacroStatement)
        } else {
            RootShape::Node(DtsNode::MacroRoot)
        }
    }

    fn parse_entry(&self, p: &mut Parser<'_, Dts>) {
        if macro_call(p).is_none() {
            p.error_expected("macro name");
        }
    }

    fn operators(&self) -> Option<&OperatorTable<Dts>> {
        Some(&OPERATORS)
    }

    fn parse_atom(&self, p: &mut Parser<'_, Dts>) -> Option<CompletedMarker> {
        if !p.at(DtsToken::Ident) {
            return atom(p);
        }
        if p.nth(1) == DtsToken::LParen {
            return macro_call(p);
        }
        let m = p.open();
        p.bump();
        Some(p.close(m, DtsNode::MacroRef))
    }
}

/// `NAME ('(' args ')')?`
fn macro_call(p: &mut Parser<'_, Dts>) -> Option<CompletedMarker> {
    if !p.at(DtsToken::Ident) {
        return None;
    }
    p.rule("macro call", |p| {
        let m = p.open();
        p.bump();
        if p.at(DtsToken::LParen) {
            macro_args(p);
        }
        Some(p.close(m, DtsNode::MacroCall))
    })
}

fn macro_args(p: &mut Parser<'_, Dts>) -> bool {
    let mut seq = p.sequence();
    seq.token(DtsToken::LParen)
        .pin()
        .with(macro_arg)
        .repeat("arguments", |p| p.eat(DtsToken::Comma) && macro_arg(p))
        .token(DtsToken::RParen);
    seq.finish(DtsNode::MacroArgs, None)
}

/// One argument; may be empty, as in `F(a,)`.
fn macro_arg(p: &mut Parser<'_, Dts>) -> bool {
    p.rule("macro argument", |p| {
        let m = p.open();
        expression(p, LOWEST);
        p.recover_until(ARGUMENT_RECOVERY, true);
        p.close(m, DtsNode::MacroArg);
        true
    })
}
