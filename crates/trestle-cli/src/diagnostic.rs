// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Source-annotated syntax diagnostics using miette.
//!
//! Converts trestle-core diagnostics into miette reports that show the
//! offending line with a labelled span underneath.

// Suppress unused_assignments for struct fields used by derive macros
#![allow(unused_assignments)]

use miette::{Diagnostic, SourceSpan};
use trestle_core::source_analysis::{Diagnostic as CoreDiagnostic, Severity};

/// A syntax diagnostic with rich formatting.
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("{message}")]
#[diagnostic(code(trestle::syntax))]
pub struct SyntaxDiagnostic {
    pub severity: Severity,
    pub message: String,
    #[source_code]
    pub src: miette::NamedSource<String>,
    #[label("{label}")]
    pub span: SourceSpan,
    pub label: String,
    #[help]
    pub hint: Option<String>,
}

impl SyntaxDiagnostic {
    pub fn from_core_diagnostic(diagnostic: &CoreDiagnostic, source_path: &str, source: &str) -> Self {
        let label = match diagnostic.severity {
            Severity::Error => "here",
            Severity::Warning => "warning here",
            Severity::Hint => "note",
        };

        Self {
            severity: diagnostic.severity,
            message: diagnostic.message.to_string(),
            src: miette::NamedSource::new(source_path, source.to_string()),
            span: diagnostic.span.into(),
            label: label.to_string(),
            hint: diagnostic.hint.as_ref().map(ToString::to_string),
        }
    }
}
