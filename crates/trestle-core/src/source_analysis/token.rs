// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Tokens handed from a lexer to the parsing engine.
//!
//! The engine is generic over the token kind: each grammar defines its
//! own closed enumeration and the engine only compares kinds for
//! equality. Whitespace, comments and preprocessor lines never appear as
//! tokens of their own. They are kept as [`Trivia`] attached to the
//! following token, so the parser's cursor can never land on them while
//! the tree still reproduces the input byte for byte.

use ecow::EcoString;

use super::Span;

/// Non-semantic source text preceding a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Trivia {
    /// Spaces, tabs and newlines.
    Whitespace(EcoString),

    /// `// ...` up to (not including) the newline.
    LineComment(EcoString),

    /// `/* ... */`, possibly unterminated at end of input.
    BlockComment(EcoString),

    /// A C preprocessor line such as `#include <foo.h>`.
    Preprocessor(EcoString),
}

impl Trivia {
    /// The exact source text of this trivia.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Whitespace(s)
            | Self::LineComment(s)
            | Self::BlockComment(s)
            | Self::Preprocessor(s) => s,
        }
    }

    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(self, Self::LineComment(_) | Self::BlockComment(_))
    }

    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "inputs over 4GB are not supported"
    )]
    pub fn len(&self) -> u32 {
        self.as_str().len() as u32
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

/// A token of kind `K` with its text, location and leading trivia.
///
/// `span` covers the token text only. [`Token::full_span`] extends it
/// backwards over the leading trivia.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token<K> {
    kind: K,
    text: EcoString,
    span: Span,
    leading_trivia: Vec<Trivia>,
}

impl<K: Copy> Token<K> {
    /// Creates a token without trivia.
    #[must_use]
    pub fn new(kind: K, text: impl Into<EcoString>, span: Span) -> Self {
        Self::with_trivia(kind, text, span, Vec::new())
    }

    /// Creates a token with the given leading trivia.
    #[must_use]
    pub fn with_trivia(
        kind: K,
        text: impl Into<EcoString>,
        span: Span,
        leading_trivia: Vec<Trivia>,
    ) -> Self {
        let text = text.into();
        debug_assert_eq!(
            text.len(),
            span.len() as usize,
            "token text must match its span"
        );
        Self {
            kind,
            text,
            span,
            leading_trivia,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> K {
        self.kind
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }

    #[must_use]
    pub fn leading_trivia(&self) -> &[Trivia] {
        &self.leading_trivia
    }

    /// The span covering the leading trivia and the token text.
    #[must_use]
    pub fn full_span(&self) -> Span {
        let trivia: u32 = self.leading_trivia.iter().map(Trivia::len).sum();
        Span::new(self.span.start() - trivia, self.span.end())
    }

    /// Returns `true` if any leading trivia is a comment.
    #[must_use]
    pub fn has_leading_comment(&self) -> bool {
        self.leading_trivia.iter().any(Trivia::is_comment)
    }

    /// Appends the leading trivia and the token text to `out`.
    pub fn write_full_text(&self, out: &mut String) {
        for trivia in &self.leading_trivia {
            out.push_str(trivia.as_str());
        }
        out.push_str(&self.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Word,
    }

    #[test]
    fn full_span_covers_trivia() {
        let token = Token::with_trivia(
            Kind::Word,
            "abc",
            Span::new(9, 12),
            vec![
                Trivia::Whitespace("  ".into()),
                Trivia::LineComment("// hi\n".into()),
                Trivia::Whitespace(" ".into()),
            ],
        );
        assert_eq!(token.span(), Span::new(9, 12));
        assert_eq!(token.full_span(), Span::new(0, 12));
        assert!(token.has_leading_comment());
    }

    #[test]
    fn write_full_text_reconstructs_source() {
        let token = Token::with_trivia(
            Kind::Word,
            "node",
            Span::new(14, 18),
            vec![
                Trivia::Preprocessor("#include <a.h>".into()),
                Trivia::Whitespace("\n".into()),
            ],
        );
        let mut out = String::new();
        token.write_full_text(&mut out);
        assert_eq!(out, "#include <a.h>\nnode");
    }

    #[test]
    fn token_without_trivia() {
        let token = Token::new(Kind::Word, "x", Span::new(3, 4));
        assert_eq!(token.kind(), Kind::Word);
        assert_eq!(token.text(), "x");
        assert_eq!(token.full_span(), token.span());
        assert!(!token.has_leading_comment());
    }
}
