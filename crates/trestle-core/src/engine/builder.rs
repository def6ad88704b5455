// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Turns a finished event log into a [`Node`] tree in one pass.

use super::event::{Event, MarkerState};
use super::language::{EmbedContext, Grammar, Language};
use super::lazy::LazyRegion;
use super::options::{CancellationToken, ParseOptions};
use super::parser::ParserOutput;
use super::tree::{Element, Node};
use crate::source_analysis::Token;

struct Frame<L: Language> {
    kind: L::NodeKind,
    collapse: bool,
    children: Vec<Element<L>>,
}

struct TreeBuilder<'a, L: Language> {
    grammar: &'a dyn Grammar<L>,
    context: &'a EmbedContext<L>,
    options: &'a ParseOptions,
    cancellation: Option<&'a CancellationToken>,
    tokens: std::vec::IntoIter<Token<L::TokenKind>>,
    stack: Vec<Frame<L>>,
    root: Option<Node<L>>,
    last_end: u32,
}

/// Builds the tree for `output`. Tokens are moved into the tree, and
/// lazy regions inherit `options` and `cancellation`.
///
/// # Panics
///
/// On a marker that was never closed or an unbalanced close, both of
/// which are grammar bugs.
pub(crate) fn build<L: Language>(
    grammar: &dyn Grammar<L>,
    context: &EmbedContext<L>,
    options: &ParseOptions,
    cancellation: Option<&CancellationToken>,
    output: &mut ParserOutput<L>,
) -> Node<L> {
    let mut events = std::mem::take(&mut output.events);
    let mut forward_parent = vec![None; events.len()];
    for &(child, parent) in &output.precedes {
        forward_parent[child] = Some(parent);
    }

    let mut builder = TreeBuilder {
        grammar,
        context,
        options,
        cancellation,
        tokens: std::mem::take(&mut output.tokens).into_iter(),
        stack: Vec::new(),
        root: None,
        last_end: 0,
    };

    let mut chain = Vec::new();
    for index in 0..events.len() {
        match std::mem::replace(&mut events[index], Event::Open(MarkerState::Dropped)) {
            Event::Open(state) => {
                // A preceding parent is started together with its first
                // child, outermost first, and skipped when reached.
                chain.push(state);
                let mut current = index;
                while let Some(parent) = forward_parent[current] {
                    match std::mem::replace(&mut events[parent], Event::Open(MarkerState::Dropped)) {
                        Event::Open(state) => chain.push(state),
                        other => unreachable!("forward parent points at {other:?}"),
                    }
                    current = parent;
                }
                for state in chain.drain(..).rev() {
                    builder.start(state);
                }
            }
            Event::Close => builder.finish(),
            Event::Token => builder.token(),
        }
    }

    match builder.root {
        Some(root) => root,
        None => panic!("event log did not close a root node"),
    }
}

impl<L: Language> TreeBuilder<'_, L> {
    fn start(&mut self, state: MarkerState<L::NodeKind>) {
        let (kind, collapse) = match state {
            MarkerState::Done(kind) => (kind, false),
            MarkerState::Collapsed(kind) => (kind, true),
            MarkerState::Dropped => return,
            MarkerState::Pending => panic!("marker left open when building the tree"),
        };
        self.stack.push(Frame {
            kind,
            collapse,
            children: Vec::new(),
        });
    }

    fn finish(&mut self) {
        let Some(mut frame) = self.stack.pop() else {
            panic!("close event without a matching open node");
        };
        if self.stack.is_empty() {
            // the root takes the end-of-input token and its trivia
            frame
                .children
                .extend(self.tokens.by_ref().map(Element::Token));
        }

        let offset = self
            .tokens
            .as_slice()
            .first()
            .map_or(self.last_end, |token| token.full_span().start());
        let mut node = Node::new(frame.kind, frame.children, offset);
        if frame.collapse {
            node = node.collapse(frame.kind);
        }

        match self.stack.last_mut() {
            Some(parent) => parent.children.push(Element::Node(node)),
            None => self.root = Some(node),
        }
    }

    fn token(&mut self) {
        let Some(token) = self.tokens.next() else {
            panic!("token event past the end of the token stream");
        };
        self.last_end = token.span().end();
        let element = match self
            .grammar
            .lazy_rules()
            .iter()
            .find(|rule| rule.token == token.kind())
        {
            Some(rule) => {
                let context = self
                    .context
                    .nested(self.stack.iter().map(|frame| frame.kind));
                Element::Lazy(LazyRegion::new(
                    token,
                    context,
                    *rule,
                    self.options.clone(),
                    self.cancellation.cloned(),
                ))
            }
            None => Element::Token(token),
        };
        let Some(parent) = self.stack.last_mut() else {
            panic!("token consumed outside of any node");
        };
        parent.children.push(element);
    }
}
