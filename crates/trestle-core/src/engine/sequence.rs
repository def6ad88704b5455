// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Sequence productions with pin and recovery.
//!
//! A [`Sequence`] runs the steps of one production in order inside its
//! own marker:
//!
//! - Before the pin, a failing step makes the whole production fail and
//!   restores the cursor, so the caller can try a sibling alternative.
//! - After the pin, a failing step reports `expected X, got Y` (once per
//!   production), the remaining steps are still attempted, and the node
//!   is closed anyway.
//! - If the production matched or was pinned, its recovery stop-set then
//!   skips tokens into an error node until a token in the set is current.
//!
//! ```
//! # use trestle_core::dts::{DtsNode, DtsToken};
//! # use trestle_core::engine::{Parser, TokenSet};
//! # use trestle_core::dts::Dts;
//! const RECOVER: TokenSet<DtsToken> = TokenSet::new(&[DtsToken::Semicolon]);
//!
//! fn delete_property(p: &mut Parser<'_, Dts>) -> bool {
//!     let mut seq = p.sequence();
//!     seq.token(DtsToken::DeleteProp).pin().token(DtsToken::Name);
//!     seq.finish(DtsNode::CompilerDirective, RECOVER)
//! }
//! ```

use std::fmt;

use super::language::{Language, TokenSet};
use super::parser::{Checkpoint, CompletedMarker, Marker, Parser};

/// An in-progress sequence production. See the module docs.
#[derive(Debug)]
#[must_use = "a sequence does nothing until it is finished"]
pub struct Sequence<'p, 'g, L: Language> {
    p: &'p mut Parser<'g, L>,
    checkpoint: Checkpoint,
    marker: Marker,
    matched: bool,
    pinned: bool,
    reported: bool,
}

impl<'p, 'g, L: Language> Sequence<'p, 'g, L> {
    pub(crate) fn new(p: &'p mut Parser<'g, L>) -> Self {
        let checkpoint = p.checkpoint();
        let marker = p.open();
        Self {
            p,
            checkpoint,
            marker,
            matched: true,
            pinned: false,
            reported: false,
        }
    }

    /// Expects a token of `kind`.
    pub fn token(&mut self, kind: L::TokenKind) -> &mut Self {
        self.step(kind, |p| p.eat(kind))
    }

    /// Expects any token in `set`; `expected` names the set in messages.
    pub fn one_of(&mut self, set: TokenSet<L::TokenKind>, expected: &'static str) -> &mut Self {
        self.step(expected, |p| {
            if p.at_any(set) {
                p.bump();
                true
            } else {
                false
            }
        })
    }

    /// Runs a sub-rule; `expected` describes it in messages.
    pub fn rule(&mut self, expected: &'static str, rule: impl FnOnce(&mut Parser<'g, L>) -> bool) -> &mut Self {
        self.step(expected, rule)
    }

    /// Runs a sub-rule that reports its own failures. After the pin, a
    /// failure here adds no `expected` diagnostic of its own.
    pub fn with(&mut self, rule: impl FnOnce(&mut Parser<'g, L>) -> bool) -> &mut Self {
        if self.running() && !rule(self.p) {
            self.reported |= self.pinned;
            self.matched = false;
        }
        self
    }

    /// Runs a sub-rule whose failure is not an error.
    pub fn optional(&mut self, rule: impl FnOnce(&mut Parser<'g, L>) -> bool) -> &mut Self {
        if self.running() {
            rule(self.p);
        }
        self
    }

    /// Runs a sub-rule zero or more times.
    pub fn repeat(&mut self, name: &'static str, rule: impl FnMut(&mut Parser<'g, L>) -> bool) -> &mut Self {
        if self.running() {
            self.p.zero_or_more(name, rule);
        }
        self
    }

    /// Commits to this production if every step so far matched.
    pub fn pin(&mut self) -> &mut Self {
        if self.matched {
            self.pinned = true;
        }
        self
    }

    /// The underlying parser, for lookahead between steps.
    pub fn parser(&mut self) -> &mut Parser<'g, L> {
        self.p
    }

    /// Ends the production: closes it as `kind` (or drops the marker when
    /// `kind` is `None`) after running `recovery`, or rolls everything
    /// back if it failed before the pin. Returns whether it matched or
    /// was pinned.
    pub fn finish(
        self,
        kind: impl Into<Option<L::NodeKind>>,
        recovery: impl Into<Option<TokenSet<L::TokenKind>>>,
    ) -> bool {
        match kind.into() {
            Some(kind) => self.complete(kind, recovery).is_some(),
            None => {
                let Some((p, marker)) = self.settle(recovery.into()) else {
                    return false;
                };
                p.drop_marker(marker);
                true
            }
        }
    }

    /// Like [`finish`](Self::finish), but returns the closed node so it
    /// can be wrapped by an enclosing expression.
    pub fn complete(
        self,
        kind: L::NodeKind,
        recovery: impl Into<Option<TokenSet<L::TokenKind>>>,
    ) -> Option<CompletedMarker> {
        let (p, marker) = self.settle(recovery.into())?;
        Some(p.close(marker, kind))
    }

    /// Rolls back a failed production, or runs recovery on a successful
    /// or pinned one and hands back its still-open marker.
    fn settle(self, recovery: Option<TokenSet<L::TokenKind>>) -> Option<(&'p mut Parser<'g, L>, Marker)> {
        let Self {
            p,
            checkpoint,
            marker,
            matched,
            pinned,
            reported,
        } = self;
        if !matched && !pinned {
            let _ = marker;
            p.rollback(checkpoint);
            return None;
        }
        if let Some(stop) = recovery {
            p.recover_until(stop, !reported);
        }
        Some((p, marker))
    }

    fn running(&self) -> bool {
        self.matched || self.pinned
    }

    fn step(&mut self, expected: impl fmt::Display, rule: impl FnOnce(&mut Parser<'g, L>) -> bool) -> &mut Self {
        if !self.running() {
            return self;
        }
        if !rule(self.p) {
            if self.pinned && !self.reported {
                self.p.error_expected(expected);
                self.reported = true;
            }
            self.matched = false;
        }
        self
    }
}
