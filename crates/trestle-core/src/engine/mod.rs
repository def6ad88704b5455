// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The grammar-independent parsing engine.
//!
//! A parse runs in three steps:
//!
//! 1. The grammar's entry rule drives a [`Parser`], which appends marker
//!    events to a log while consuming tokens.
//! 2. Anything the entry rule did not consume is wrapped in an error
//!    node, and the root marker is closed (or collapsed).
//! 3. The builder turns the log into a [`Node`] tree in one pass.
//!
//! The engine never fails on bad input: the result is always a tree that
//! covers every token, plus diagnostics. Only cancellation ends a parse
//! early, and only through [`parse_with`].
//!
//! # Usage
//!
//! ```
//! use trestle_core::dts::{self, DtsGrammar, DtsNode};
//! use trestle_core::engine;
//!
//! let tokens = dts::lex("/ { status = \"okay\"; };");
//! let (root, diagnostics) = engine::parse(&DtsGrammar, tokens);
//! assert!(diagnostics.is_empty());
//! assert_eq!(root.kind(), DtsNode::File);
//! assert_eq!(root.find_all(DtsNode::Property).len(), 1);
//! ```

mod builder;
mod error;
mod event;
mod language;
mod lazy;
mod options;
mod parser;
mod pratt;
mod sequence;
mod tree;

#[cfg(test)]
mod property_tests;
#[cfg(test)]
pub(crate) mod test_support;

use tracing::debug;

pub use error::ParseError;
pub use language::{EmbedContext, Grammar, Language, RootShape, TokenSet};
pub use lazy::{EmbeddedLexer, LazyRegion, LazyRule};
pub use options::{CancellationToken, DEFAULT_MAX_DEPTH, ParseOptions};
pub use parser::{Checkpoint, CompletedMarker, Marker, Parser};
pub use pratt::{
    Associativity, BinaryOperator, Grouping, LOWEST, OperatorTable, PrefixOperator,
    TernaryOperator, expression, expression_node,
};
pub use sequence::Sequence;
pub use tree::{Element, Node};

use crate::source_analysis::{Diagnostic, Token};

/// A finished parse: the tree and its diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Parse<L: Language> {
    root: Node<L>,
    diagnostics: Vec<Diagnostic>,
}

impl<L: Language> Parse<L> {
    #[must_use]
    pub fn root(&self) -> &Node<L> {
        &self.root
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    #[must_use]
    pub fn into_parts(self) -> (Node<L>, Vec<Diagnostic>) {
        (self.root, self.diagnostics)
    }
}

/// Parses `tokens` with `grammar` using default options.
///
/// The root always spans the whole input and every token ends up in the
/// tree, on malformed input inside error nodes.
#[must_use]
pub fn parse<L: Language>(
    grammar: &dyn Grammar<L>,
    tokens: Vec<Token<L::TokenKind>>,
) -> (Node<L>, Vec<Diagnostic>) {
    run(
        grammar,
        tokens,
        &EmbedContext::root(),
        &ParseOptions::default(),
        None,
    )
    .0
    .into_parts()
}

/// Parses `tokens` with explicit options and an optional cancellation
/// token.
///
/// # Errors
///
/// Returns [`ParseError::Cancelled`] if `cancellation` was triggered
/// before the parse completed.
pub fn parse_with<L: Language>(
    grammar: &dyn Grammar<L>,
    tokens: Vec<Token<L::TokenKind>>,
    options: &ParseOptions,
    cancellation: Option<&CancellationToken>,
) -> Result<Parse<L>, ParseError> {
    let (parse, stats) = run(grammar, tokens, &EmbedContext::root(), options, cancellation);
    if stats.cancelled {
        return Err(ParseError::Cancelled {
            rule_calls: stats.rule_calls,
        });
    }
    Ok(parse)
}

/// Counters from one run of the engine.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunStats {
    pub cancelled: bool,
    pub rule_calls: u64,
}

/// Runs `grammar` over `tokens` as if embedded in `context`.
pub(crate) fn run<L: Language>(
    grammar: &dyn Grammar<L>,
    tokens: Vec<Token<L::TokenKind>>,
    context: &EmbedContext<L>,
    options: &ParseOptions,
    cancellation: Option<&CancellationToken>,
) -> (Parse<L>, RunStats) {
    let token_count = tokens.len();
    let mut p = Parser::new(grammar, tokens, options, cancellation);

    let root = p.open();
    grammar.parse_entry(&mut p);
    p.consume_leftovers();
    match grammar.root(context) {
        RootShape::Node(kind) => p.close(root, kind),
        RootShape::Collapse(kind) => p.collapse(root, kind),
    };

    let mut output = p.finish();
    let root = builder::build(grammar, context, options, cancellation, &mut output);
    debug!(
        grammar = grammar.name(),
        tokens = token_count,
        rule_calls = output.rule_calls,
        diagnostics = output.diagnostics.len(),
        cancelled = output.cancelled,
        "parsed"
    );

    let stats = RunStats {
        cancelled: output.cancelled,
        rule_calls: output.rule_calls,
    };
    (
        Parse {
            root,
            diagnostics: output.diagnostics,
        },
        stats,
    )
}
