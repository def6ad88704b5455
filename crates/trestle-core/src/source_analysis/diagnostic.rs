// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Diagnostics produced while parsing.
//!
//! Malformed input never makes a parse fail: every problem is reported
//! as a [`Diagnostic`] and the tree is still built. Diagnostics are kept
//! in the order they were first reported.

use ecow::EcoString;

use super::Span;

/// A message attached to a range of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// How serious the problem is.
    pub severity: Severity,
    /// The user-facing message, e.g. `expected ';', got '}'`.
    pub message: EcoString,
    /// Where the problem was detected.
    pub span: Span,
    /// Optional suggestion for fixing the problem.
    pub hint: Option<EcoString>,
}

impl Diagnostic {
    #[must_use]
    pub fn error(message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Attaches a suggestion shown alongside the message.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<EcoString>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}: {}", self.severity, self.span, self.message)
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// A syntax error. The tree contains an error node or a missing piece.
    Error,
    /// Suspicious but well-formed input.
    Warning,
    /// Informational note.
    Hint,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Hint => "hint",
        })
    }
}
