// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lazily parsed embedded regions.
//!
//! A grammar can register token kinds whose text belongs to another
//! grammar (a preprocessor macro inside a device-tree cell, say). The
//! outer parse keeps such a token as an opaque [`LazyRegion`] leaf and
//! records the kinds of its enclosing nodes. The first call to
//! [`LazyRegion::materialize`] lexes the token text with the rule's
//! lexer and runs the embedded grammar over it; later calls, from any
//! thread, see that same result.
//!
//! The embedded parse uses the options and cancellation token of the
//! parse that produced the region.

use std::fmt;
use std::sync::OnceLock;

use tracing::debug;

use super::language::{EmbedContext, Grammar, Language};
use super::options::{CancellationToken, ParseOptions};
use super::{Parse, run};
use crate::source_analysis::{Span, Token};

/// Lexes the text of a lazy token. Receives the token's start offset so
/// embedded spans stay absolute.
pub type EmbeddedLexer<L> = fn(&str, u32) -> Vec<Token<<L as Language>::TokenKind>>;

/// Registers `token` as embedded content for `grammar`.
#[derive(Clone, Copy)]
pub struct LazyRule<L: Language> {
    pub token: L::TokenKind,
    pub grammar: &'static dyn Grammar<L>,
    pub lexer: EmbeddedLexer<L>,
}

impl<L: Language> fmt::Debug for LazyRule<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRule")
            .field("token", &self.token)
            .field("grammar", &self.grammar.name())
            .finish_non_exhaustive()
    }
}

/// An embedded region, parsed on first access.
#[derive(Debug, Clone)]
pub struct LazyRegion<L: Language> {
    token: Token<L::TokenKind>,
    context: EmbedContext<L>,
    rule: LazyRule<L>,
    options: ParseOptions,
    cancellation: Option<CancellationToken>,
    tree: OnceLock<Parse<L>>,
}

impl<L: Language> LazyRegion<L> {
    pub(crate) fn new(
        token: Token<L::TokenKind>,
        context: EmbedContext<L>,
        rule: LazyRule<L>,
        options: ParseOptions,
        cancellation: Option<CancellationToken>,
    ) -> Self {
        Self {
            token,
            context,
            rule,
            options,
            cancellation,
            tree: OnceLock::new(),
        }
    }

    /// The opaque token as it appears in the outer tree.
    #[must_use]
    pub fn token(&self) -> &Token<L::TokenKind> {
        &self.token
    }

    /// The span of the token text.
    #[must_use]
    pub fn span(&self) -> Span {
        self.token.span()
    }

    /// Kinds of the nodes enclosing this region, outermost first.
    #[must_use]
    pub fn context(&self) -> &EmbedContext<L> {
        &self.context
    }

    /// The embedded grammar's name.
    #[must_use]
    pub fn grammar_name(&self) -> &'static str {
        self.rule.grammar.name()
    }

    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.tree.get().is_some()
    }

    /// The embedded tree, parsing it on first access. Concurrent first
    /// callers block until one of them has finished, then all see that
    /// result.
    pub fn materialize(&self) -> &Parse<L> {
        self.tree.get_or_init(|| self.reparse())
    }

    /// Parses the region afresh, ignoring any cached tree. The result is
    /// structurally equal to [`materialize`](Self::materialize).
    #[must_use]
    pub fn reparse(&self) -> Parse<L> {
        debug!(
            grammar = self.rule.grammar.name(),
            span = %self.token.span(),
            "parsing embedded region"
        );
        let tokens = (self.rule.lexer)(self.token.text(), self.token.span().start());
        let (parse, _) = run(
            self.rule.grammar,
            tokens,
            &self.context,
            &self.options,
            self.cancellation.as_ref(),
        );
        debug_assert!(self.span().contains(parse.root().span()));
        parse
    }
}

impl<L: Language> PartialEq for LazyRegion<L> {
    /// Regions compare by their token and context, never by whether they
    /// have been materialized.
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
            && self.context == other.context
            && self.rule.token == other.rule.token
            && self.rule.grammar.name() == other.rule.grammar.name()
    }
}
