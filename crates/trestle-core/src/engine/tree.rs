// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The concrete syntax tree.
//!
//! A [`Node`] owns its children outright. Leaves are the lexer's tokens,
//! moved into the tree unchanged, so concatenating the full text of the
//! leaves in order reproduces the input exactly.
//!
//! Node spans include the leading trivia of their first token. Sibling
//! spans therefore tile their parent, and a root always spans `0..len`.

use std::fmt::Write as _;

use super::lazy::LazyRegion;
use super::language::Language;
use crate::source_analysis::{Span, Token};

/// An interior node of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<L: Language> {
    kind: L::NodeKind,
    span: Span,
    children: Vec<Element<L>>,
}

/// A child of a [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub enum Element<L: Language> {
    Node(Node<L>),
    Token(Token<L::TokenKind>),
    /// A token whose content belongs to an embedded grammar.
    Lazy(LazyRegion<L>),
}

impl<L: Language> Element<L> {
    /// The span including leading trivia.
    #[must_use]
    pub fn full_span(&self) -> Span {
        match self {
            Self::Node(node) => node.span,
            Self::Token(token) => token.full_span(),
            Self::Lazy(region) => region.token().full_span(),
        }
    }

    #[must_use]
    pub fn as_node(&self) -> Option<&Node<L>> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    /// The leaf token, for plain tokens and lazy regions alike.
    #[must_use]
    pub fn as_token(&self) -> Option<&Token<L::TokenKind>> {
        match self {
            Self::Token(token) => Some(token),
            Self::Lazy(region) => Some(region.token()),
            Self::Node(_) => None,
        }
    }

    #[must_use]
    pub fn as_lazy(&self) -> Option<&LazyRegion<L>> {
        match self {
            Self::Lazy(region) => Some(region),
            _ => None,
        }
    }
}

impl<L: Language> Node<L> {
    /// Creates a node; its span is computed from the children, or is the
    /// empty span at `empty_offset` when there are none.
    #[must_use]
    pub(crate) fn new(kind: L::NodeKind, children: Vec<Element<L>>, empty_offset: u32) -> Self {
        let span = match (children.first(), children.last()) {
            (Some(first), Some(last)) => first.full_span().merge(last.full_span()),
            _ => Span::empty_at(empty_offset),
        };
        Self {
            kind,
            span,
            children,
        }
    }

    /// Merges this root with its only child node when the child covers
    /// the same input. Zero-width tokens next to the child (the
    /// end-of-input sentinel) do not prevent the merge.
    pub(crate) fn collapse(self, kind: L::NodeKind) -> Self {
        let single_covering_child = {
            let mut nodes = self.child_nodes();
            nodes.next().is_some_and(|inner| inner.span == self.span) && nodes.next().is_none()
        };
        let mergeable = single_covering_child
            && self
                .children
                .iter()
                .all(|child| child.as_node().is_some() || child.full_span().is_empty());
        if !mergeable {
            return Self { kind, ..self };
        }

        let mut children = Vec::with_capacity(self.children.len());
        for child in self.children {
            match child {
                Element::Node(inner) => children.extend(inner.children),
                other => children.push(other),
            }
        }
        Self {
            kind,
            span: self.span,
            children,
        }
    }

    #[must_use]
    pub fn kind(&self) -> L::NodeKind {
        self.kind
    }

    /// The span including the first token's leading trivia.
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    #[must_use]
    pub fn children(&self) -> &[Element<L>] {
        &self.children
    }

    /// Direct child nodes.
    pub fn child_nodes(&self) -> impl Iterator<Item = &Node<L>> {
        self.children.iter().filter_map(Element::as_node)
    }

    /// The first direct child node of `kind`.
    #[must_use]
    pub fn child(&self, kind: L::NodeKind) -> Option<&Node<L>> {
        self.child_nodes().find(|node| node.kind == kind)
    }

    /// The first direct child token of `kind`.
    #[must_use]
    pub fn child_token(&self, kind: L::TokenKind) -> Option<&Token<L::TokenKind>> {
        self.children
            .iter()
            .filter_map(Element::as_token)
            .find(|token| token.kind() == kind)
    }

    /// All leaf tokens in source order. Lazy regions contribute their
    /// opaque token.
    #[must_use]
    pub fn tokens(&self) -> Vec<&Token<L::TokenKind>> {
        let mut out = Vec::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a Token<L::TokenKind>>) {
        for child in &self.children {
            match child {
                Element::Node(node) => node.collect_tokens(out),
                leaf => out.extend(leaf.as_token()),
            }
        }
    }

    /// The exact source text covered by this node, trivia included.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for token in self.tokens() {
            token.write_full_text(&mut out);
        }
        out
    }

    /// Every descendant node (including `self`) of `kind`.
    #[must_use]
    pub fn find_all(&self, kind: L::NodeKind) -> Vec<&Node<L>> {
        let mut out = Vec::new();
        self.visit(&mut |node| {
            if node.kind == kind {
                out.push(node);
            }
        });
        out
    }

    /// Every lazy region below this node, in source order.
    #[must_use]
    pub fn lazy_regions(&self) -> Vec<&LazyRegion<L>> {
        let mut out = Vec::new();
        self.visit(&mut |node| out.extend(node.children.iter().filter_map(Element::as_lazy)));
        out
    }

    /// Error nodes produced by recovery, in preorder.
    #[must_use]
    pub fn errors(&self) -> Vec<&Node<L>> {
        self.find_all(L::ERROR)
    }

    /// Returns `true` if recovery produced any error node below here.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Node<L>)) {
        f(self);
        for node in self.child_nodes() {
            node.visit(f);
        }
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// An indented dump, one node or token per line. Lazy regions are
    /// shown as their opaque token.
    #[must_use]
    pub fn debug_tree(&self) -> String {
        let mut out = String::new();
        self.write_tree(&mut out, 0, false);
        out
    }

    /// Like [`debug_tree`](Self::debug_tree), with every lazy region
    /// materialized and printed beneath its token.
    #[must_use]
    pub fn debug_tree_expanded(&self) -> String {
        let mut out = String::new();
        self.write_tree(&mut out, 0, true);
        out
    }

    fn write_tree(&self, out: &mut String, indent: usize, expand: bool) {
        let _ = writeln!(out, "{:indent$}{:?}@{}", "", self.kind, self.span, indent = indent);
        for child in &self.children {
            match child {
                Element::Node(node) => node.write_tree(out, indent + 2, expand),
                Element::Token(token) => write_token(out, token, indent + 2, ""),
                Element::Lazy(region) => {
                    write_token(out, region.token(), indent + 2, " (lazy)");
                    if expand {
                        region.materialize().root().write_tree(out, indent + 4, expand);
                    }
                }
            }
        }
    }

    /// A compact S-expression: `(Kind child...)`, tokens as their text,
    /// empty tokens omitted.
    #[must_use]
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        let _ = write!(out, "({:?}", self.kind);
        for child in &self.children {
            match child {
                Element::Node(node) => {
                    out.push(' ');
                    node.write_sexp(out);
                }
                leaf => {
                    if let Some(token) = leaf.as_token().filter(|token| !token.text().is_empty()) {
                        out.push(' ');
                        out.push_str(token.text());
                    }
                }
            }
        }
        out.push(')');
    }
}

fn write_token<K: std::fmt::Debug + Copy>(out: &mut String, token: &Token<K>, indent: usize, suffix: &str) {
    let _ = writeln!(
        out,
        "{:indent$}{:?}@{} {:?}{suffix}",
        "",
        token.kind(),
        token.span(),
        token.text(),
        indent = indent
    );
}
