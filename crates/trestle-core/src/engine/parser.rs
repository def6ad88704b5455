// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The parser state shared by every grammar rule.
//!
//! A [`Parser`] owns the token stream, the cursor, the marker event log
//! and the explicit marker stack for one parse. Grammar rules are plain
//! functions `fn(&mut Parser<'_, L>) -> bool` that return whether they
//! matched. A failed rule must leave the cursor where it started, which
//! [`Sequence`] and [`Parser::rollback`] take care of.
//!
//! # Marker discipline
//!
//! Markers nest strictly: a marker opened after `M` must be closed or
//! dropped before `M`. Breaking this is a bug in a grammar rule, not in
//! the input, so it panics instead of producing a diagnostic.
//!
//! # Depth limit
//!
//! The first rule that would nest deeper than
//! [`ParseOptions::max_depth`] reports one diagnostic, and from then on
//! every rule fails at once, recovery skips nothing and no further
//! errors are reported. Whatever the unwinding rules leave unconsumed
//! ends up in a single error node, so the tree stays total. The
//! diagnostic survives [`Parser::rollback`].

use std::fmt;

use ecow::{EcoString, eco_format};
use tracing::{debug, trace, warn};

use super::event::{Event, MarkerState};
use super::language::{Grammar, Language, TokenSet};
use super::options::{CancellationToken, ParseOptions};
use super::sequence::Sequence;
use crate::source_analysis::{Diagnostic, Span, Token};

/// Remaining stack below which a rule switches to a fresh segment.
const STACK_RED_ZONE: usize = 64 * 1024;

/// Size of each new stack segment.
const STACK_GROWTH: usize = 1024 * 1024;

/// Longest token text quoted verbatim in a diagnostic.
const MAX_QUOTED_LEN: usize = 24;

/// An open subtree. Must be passed to [`Parser::close`] or
/// [`Parser::drop_marker`].
#[derive(Debug)]
#[must_use = "markers must be closed or dropped"]
pub struct Marker {
    index: usize,
}

/// A closed subtree, which can still be wrapped by a new parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedMarker {
    index: usize,
}

impl CompletedMarker {
    /// Opens a marker that will become the parent of this already
    /// closed node. The expression loop uses this to wrap the left
    /// operand once it sees a binary operator.
    pub fn precede<L: Language>(self, p: &mut Parser<'_, L>) -> Marker {
        let parent = p.open();
        p.precedes.push((self.index, parent.index));
        parent
    }
}

/// A saved parser state for backtracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    position: usize,
    events: usize,
    open: usize,
    innermost: Option<usize>,
    precedes: usize,
    diagnostics: usize,
    last_error_at: Option<usize>,
}

/// Everything the tree builder needs once parsing is over.
pub(crate) struct ParserOutput<L: Language> {
    pub events: Vec<Event<L::NodeKind>>,
    pub precedes: Vec<(usize, usize)>,
    pub tokens: Vec<Token<L::TokenKind>>,
    pub diagnostics: Vec<Diagnostic>,
    pub cancelled: bool,
    pub rule_calls: u64,
}

/// Recursive-descent parser state for one token stream.
pub struct Parser<'g, L: Language> {
    grammar: &'g dyn Grammar<L>,
    tokens: Vec<Token<L::TokenKind>>,
    pos: usize,
    events: Vec<Event<L::NodeKind>>,
    /// Event indices of the currently open markers, innermost last.
    open: Vec<usize>,
    /// `(child, parent)` pairs recorded by [`CompletedMarker::precede`].
    precedes: Vec<(usize, usize)>,
    diagnostics: Vec<Diagnostic>,
    /// Token index of the last reported error, for deduplication.
    last_error_at: Option<usize>,
    depth: usize,
    max_depth: usize,
    /// Set once the depth limit is hit; re-added after every rollback.
    too_deep: Option<Diagnostic>,
    cancellation: Option<&'g CancellationToken>,
    cancelled: bool,
    rule_calls: u64,
}

impl<L: Language> fmt::Debug for Parser<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("grammar", &self.grammar.name())
            .field("position", &self.pos)
            .field("current", &self.current())
            .field("open_markers", &self.open.len())
            .field("depth", &self.depth)
            .field("diagnostics", &self.diagnostics.len())
            .finish_non_exhaustive()
    }
}

impl<'g, L: Language> Parser<'g, L> {
    /// Creates a parser over `tokens`. An end-of-input token is appended
    /// if the stream does not already end with one.
    pub(crate) fn new(
        grammar: &'g dyn Grammar<L>,
        mut tokens: Vec<Token<L::TokenKind>>,
        options: &ParseOptions,
        cancellation: Option<&'g CancellationToken>,
    ) -> Self {
        if tokens.last().is_none_or(|token| token.kind() != L::EOF) {
            let end = tokens.last().map_or(0, |token| token.span().end());
            tokens.push(Token::new(L::EOF, "", Span::empty_at(end)));
        }
        Self {
            grammar,
            tokens,
            pos: 0,
            events: Vec::new(),
            open: Vec::new(),
            precedes: Vec::new(),
            diagnostics: Vec::new(),
            last_error_at: None,
            depth: 0,
            max_depth: options.max_depth,
            too_deep: None,
            cancellation,
            cancelled: false,
            rule_calls: 0,
        }
    }

    /// The grammar being parsed.
    #[must_use]
    pub fn grammar(&self) -> &'g dyn Grammar<L> {
        self.grammar
    }

    // ========================================================================
    // Token Cursor
    // ========================================================================

    #[must_use]
    pub fn current(&self) -> L::TokenKind {
        self.nth(0)
    }

    /// The kind `n` tokens ahead. Reads past the end return end of input.
    #[must_use]
    pub fn nth(&self, n: usize) -> L::TokenKind {
        self.nth_token(n).kind()
    }

    #[must_use]
    pub fn current_token(&self) -> &Token<L::TokenKind> {
        self.nth_token(0)
    }

    #[must_use]
    pub fn at(&self, kind: L::TokenKind) -> bool {
        self.current() == kind
    }

    #[must_use]
    pub fn at_any(&self, set: TokenSet<L::TokenKind>) -> bool {
        set.contains(self.current())
    }

    #[must_use]
    pub fn at_end(&self) -> bool {
        self.at(L::EOF)
    }

    /// Index of the current token.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Consumes the current token into the innermost open node. Does
    /// nothing at end of input.
    pub fn bump(&mut self) {
        if self.at_end() {
            return;
        }
        self.events.push(Event::Token);
        self.pos += 1;
    }

    /// Consumes the current token if it has the given kind.
    pub fn eat(&mut self, kind: L::TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Like [`eat`](Self::eat), but reports `expected <kind>` on mismatch.
    pub fn expect(&mut self, kind: L::TokenKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error_expected(kind);
            false
        }
    }

    fn nth_token(&self, n: usize) -> &Token<L::TokenKind> {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    // ========================================================================
    // Markers
    // ========================================================================

    /// Opens a subtree starting at the current token.
    pub fn open(&mut self) -> Marker {
        let index = self.events.len();
        self.events.push(Event::Open(MarkerState::Pending));
        self.open.push(index);
        Marker { index }
    }

    /// Closes `marker` as a node of `kind`.
    ///
    /// # Panics
    ///
    /// If `marker` is not the innermost open marker.
    pub fn close(&mut self, marker: Marker, kind: L::NodeKind) -> CompletedMarker {
        self.pop_marker(&marker, "closed");
        self.events[marker.index] = Event::Open(MarkerState::Done(kind));
        self.events.push(Event::Close);
        CompletedMarker {
            index: marker.index,
        }
    }

    /// Discards `marker` without creating a node. Anything parsed since
    /// it was opened becomes part of the enclosing node.
    ///
    /// # Panics
    ///
    /// If `marker` is not the innermost open marker.
    pub fn drop_marker(&mut self, marker: Marker) {
        self.pop_marker(&marker, "dropped");
        self.events[marker.index] = Event::Open(MarkerState::Dropped);
    }

    /// Closes the root marker as `kind`, merging it with its only child
    /// node if that child spans the same input.
    ///
    /// # Panics
    ///
    /// If `marker` is not the only open marker.
    pub fn collapse(&mut self, marker: Marker, kind: L::NodeKind) -> CompletedMarker {
        assert!(
            self.open.len() == 1,
            "only the root marker can be collapsed ({} markers open)",
            self.open.len()
        );
        self.pop_marker(&marker, "collapsed");
        self.events[marker.index] = Event::Open(MarkerState::Collapsed(kind));
        self.events.push(Event::Close);
        CompletedMarker {
            index: marker.index,
        }
    }

    /// Number of currently open markers.
    #[must_use]
    pub fn open_markers(&self) -> usize {
        self.open.len()
    }

    fn pop_marker(&mut self, marker: &Marker, action: &str) {
        let innermost = self.open.pop();
        assert!(
            innermost == Some(marker.index),
            "marker at event {} {action} out of order: innermost open marker is at event {innermost:?}",
            marker.index,
        );
    }

    // ========================================================================
    // Backtracking
    // ========================================================================

    /// Saves the cursor and everything recorded so far.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            position: self.pos,
            events: self.events.len(),
            open: self.open.len(),
            innermost: self.open.last().copied(),
            precedes: self.precedes.len(),
            diagnostics: self.diagnostics.len(),
            last_error_at: self.last_error_at,
        }
    }

    /// Restores a checkpoint: cursor, events, diagnostics and markers.
    /// Markers opened after the checkpoint are discarded.
    ///
    /// # Panics
    ///
    /// If a marker that was open at the checkpoint has since been closed.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        assert!(
            self.open.len() >= checkpoint.open
                && self.open[..checkpoint.open].last().copied() == checkpoint.innermost,
            "rollback across a marker closed after the checkpoint"
        );
        self.pos = checkpoint.position;
        self.events.truncate(checkpoint.events);
        self.open.truncate(checkpoint.open);
        self.precedes.truncate(checkpoint.precedes);
        self.diagnostics.truncate(checkpoint.diagnostics);
        self.last_error_at = checkpoint.last_error_at;
        if let Some(diagnostic) = &self.too_deep {
            if self.diagnostics.last() != Some(diagnostic) {
                self.diagnostics.push(diagnostic.clone());
            }
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Reports an error at the current token. At most one error is kept
    /// per token position; later ones at the same position are dropped,
    /// as is everything after the depth limit was hit.
    pub fn error(&mut self, message: impl Into<EcoString>) {
        if self.too_deep.is_some() || self.last_error_at == Some(self.pos) {
            return;
        }
        let span = self.current_token().span();
        self.diagnostics.push(Diagnostic::error(message, span));
        self.last_error_at = Some(self.pos);
    }

    /// Reports `expected <what>, got <current token>`.
    pub fn error_expected(&mut self, what: impl fmt::Display) {
        if self.too_deep.is_some() || self.last_error_at == Some(self.pos) {
            return;
        }
        let found = self.describe_current();
        self.error(eco_format!("expected {what}, got {found}"));
    }

    /// The current token as it should appear in a message.
    #[must_use]
    pub fn describe_current(&self) -> EcoString {
        let token = self.current_token();
        if token.kind() == L::EOF {
            return EcoString::from("end of input");
        }
        let text = token.text();
        if text.chars().count() > MAX_QUOTED_LEN {
            let prefix: String = text.chars().take(MAX_QUOTED_LEN).collect();
            eco_format!("'{prefix}...'")
        } else {
            eco_format!("'{text}'")
        }
    }

    /// Diagnostics reported so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    // ========================================================================
    // Rules and Combinators
    // ========================================================================

    /// Runs one grammar rule.
    ///
    /// Every non-terminal goes through here. It checks the cancellation
    /// token, bounds the rule depth, and grows the native stack when it
    /// runs low. A rule that is cut short returns `T::default()`, which
    /// is the failure value for both `bool` and `Option`.
    pub fn rule<T: Default>(&mut self, name: &'static str, body: impl FnOnce(&mut Self) -> T) -> T {
        self.rule_calls += 1;
        if self.check_cancelled() || self.too_deep.is_some() {
            return T::default();
        }
        if self.depth >= self.max_depth {
            warn!(rule = name, depth = self.depth, "rule depth limit reached");
            self.report_too_deep();
            return T::default();
        }
        self.depth += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || body(self));
        self.depth -= 1;
        result
    }

    fn report_too_deep(&mut self) {
        let diagnostic = Diagnostic::error(
            eco_format!("input nested too deeply (limit is {} levels)", self.max_depth),
            self.current_token().span(),
        )
        .with_hint("raise `max-depth` in the parse options to accept deeper input");
        self.diagnostics.push(diagnostic.clone());
        self.last_error_at = Some(self.pos);
        self.too_deep = Some(diagnostic);
    }

    /// Current rule nesting depth.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Calls `item` until it fails. Always succeeds.
    ///
    /// An iteration that succeeds without consuming anything would loop
    /// forever, so it ends the repetition and is logged as a grammar bug.
    pub fn zero_or_more(&mut self, name: &'static str, mut item: impl FnMut(&mut Self) -> bool) -> bool {
        loop {
            let before = self.pos;
            if !item(self) {
                break;
            }
            if self.pos == before {
                warn!(
                    rule = name,
                    position = before,
                    "repetition matched without consuming input"
                );
                break;
            }
        }
        true
    }

    /// Calls `item` at least once, then until it fails.
    pub fn one_or_more(&mut self, name: &'static str, mut item: impl FnMut(&mut Self) -> bool) -> bool {
        if !item(self) {
            return false;
        }
        self.zero_or_more(name, item)
    }

    /// Calls `item` and succeeds whatever it returns.
    pub fn optional(&mut self, item: impl FnOnce(&mut Self) -> bool) -> bool {
        item(self);
        true
    }

    /// Starts a sequence production at the current token.
    pub fn sequence(&mut self) -> Sequence<'_, 'g, L> {
        Sequence::new(self)
    }

    /// Skips tokens until one in `stop` (or end of input) is current,
    /// wrapping them in an error node. Returns whether anything was
    /// skipped. `report` adds an `unexpected` diagnostic first. Skips
    /// nothing once the depth limit was hit.
    pub fn recover_until(&mut self, stop: TokenSet<L::TokenKind>, report: bool) -> bool {
        if self.at_end() || self.at_any(stop) || self.too_deep.is_some() {
            return false;
        }
        if report {
            let found = self.describe_current();
            self.error(eco_format!("unexpected {found}"));
        }
        let start = self.pos;
        let marker = self.open();
        while !self.at_end() && !self.at_any(stop) {
            self.bump();
        }
        self.close(marker, L::ERROR);
        trace!(from = start, to = self.pos, "skipped tokens during recovery");
        true
    }

    // ========================================================================
    // Cancellation and Completion
    // ========================================================================

    fn check_cancelled(&mut self) -> bool {
        if !self.cancelled && self.cancellation.is_some_and(CancellationToken::is_cancelled) {
            debug!(rule_calls = self.rule_calls, "parse cancelled");
            self.cancelled = true;
        }
        self.cancelled
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Wraps anything the entry rule left unconsumed in one error node.
    pub(crate) fn consume_leftovers(&mut self) {
        if self.at_end() {
            return;
        }
        if !self.cancelled {
            let found = self.describe_current();
            self.error(eco_format!("unexpected {found}"));
        }
        let marker = self.open();
        while !self.at_end() {
            self.bump();
        }
        self.close(marker, L::ERROR);
    }

    pub(crate) fn finish(self) -> ParserOutput<L> {
        assert!(
            self.open.is_empty(),
            "{} marker(s) left open at end of parse",
            self.open.len()
        );
        ParserOutput {
            events: self.events,
            precedes: self.precedes,
            tokens: self.tokens,
            diagnostics: self.diagnostics,
            cancelled: self.cancelled,
            rule_calls: self.rule_calls,
        }
    }
}
