// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! What a grammar instance registers with the engine.
//!
//! A [`Language`] fixes the closed token and node enumerations. A
//! [`Grammar`] over that language supplies the entry rule, the operator
//! table for its expression sub-language, the atoms of that
//! sub-language, and the token kinds whose content is parsed lazily by
//! another grammar.

use std::fmt;
use std::hash::Hash;

use super::lazy::LazyRule;
use super::parser::{CompletedMarker, Parser};
use super::pratt::OperatorTable;

/// The token and node vocabulary of one family of grammars.
///
/// Implemented on a zero-sized marker type. Grammars that embed each
/// other lazily share a language.
pub trait Language: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Token kinds produced by the lexer. `Display` is used in
    /// diagnostics (`expected ';', got '}'`), so it should read the way a
    /// user would name the token.
    type TokenKind: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Node kinds the grammar rules close markers with.
    type NodeKind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// The end-of-input sentinel that terminates every token stream.
    const EOF: Self::TokenKind;

    /// The kind given to nodes that hold tokens skipped by recovery.
    const ERROR: Self::NodeKind;
}

/// How a grammar's root marker is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootShape<L: Language> {
    /// Close the root as a node of this kind.
    Node(L::NodeKind),
    /// Close the root as this kind, merging it with its single child
    /// node when both cover the same span.
    Collapse(L::NodeKind),
}

/// One grammar instance: the entry rule plus its registration data.
pub trait Grammar<L: Language>: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Chooses the root node shape. `context` is empty for a top-level
    /// parse and holds the enclosing node kinds for a lazy region.
    fn root(&self, context: &EmbedContext<L>) -> RootShape<L>;

    /// Parses the whole token stream. Whatever is left before end of
    /// input afterwards is wrapped in an error node by the engine.
    fn parse_entry(&self, p: &mut Parser<'_, L>);

    /// The precedence table, if the grammar has an expression language.
    fn operators(&self) -> Option<&OperatorTable<L>> {
        None
    }

    /// Parses one expression primary that is not a prefix operator or a
    /// parenthesised group: literals, references, embedded macros.
    fn parse_atom(&self, _p: &mut Parser<'_, L>) -> Option<CompletedMarker> {
        None
    }

    /// Token kinds whose text is parsed on demand by another grammar.
    fn lazy_rules(&self) -> &[LazyRule<L>] {
        &[]
    }
}

/// A fixed set of token kinds, used for lookahead and recovery stop-sets.
#[derive(Clone, Copy)]
pub struct TokenSet<K: 'static>(&'static [K]);

impl<K: Copy + PartialEq + 'static> TokenSet<K> {
    #[must_use]
    pub const fn new(kinds: &'static [K]) -> Self {
        Self(kinds)
    }

    #[must_use]
    pub fn contains(self, kind: K) -> bool {
        self.0.contains(&kind)
    }
}

impl<K: fmt::Debug> fmt::Debug for TokenSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0).finish()
    }
}

/// The node kinds enclosing a lazily parsed region, outermost first.
///
/// Passed explicitly to the embedded grammar's [`Grammar::root`] so it
/// can tell where it was embedded without any ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedContext<L: Language> {
    ancestors: Vec<L::NodeKind>,
}

impl<L: Language> EmbedContext<L> {
    /// The context of a top-level parse: nothing encloses it.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            ancestors: Vec::new(),
        }
    }

    /// Enclosing node kinds, outermost first.
    #[must_use]
    pub fn ancestors(&self) -> &[L::NodeKind] {
        &self.ancestors
    }

    /// The innermost enclosing node kind.
    #[must_use]
    pub fn enclosing(&self) -> Option<L::NodeKind> {
        self.ancestors.last().copied()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.ancestors.is_empty()
    }

    /// This context extended by further enclosing kinds.
    #[must_use]
    pub fn nested(&self, inner: impl IntoIterator<Item = L::NodeKind>) -> Self {
        let mut ancestors = self.ancestors.clone();
        ancestors.extend(inner);
        Self { ancestors }
    }
}

impl<L: Language> Default for EmbedContext<L> {
    fn default() -> Self {
        Self::root()
    }
}
