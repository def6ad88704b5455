// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! CLI command implementations.

pub mod check;
pub mod parse;

use camino::Utf8Path;
use miette::{Context, IntoDiagnostic, Result};

use crate::diagnostic::SyntaxDiagnostic;
use trestle_core::source_analysis::Diagnostic;

/// Reads a source file, naming it in the error.
fn read_source(path: &Utf8Path) -> Result<String> {
    std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read '{path}'"))
}

/// Prints each diagnostic to stderr with its source line.
fn report(diagnostics: &[Diagnostic], path: &Utf8Path, source: &str) {
    for diagnostic in diagnostics {
        let rich = SyntaxDiagnostic::from_core_diagnostic(diagnostic, path.as_str(), source);
        eprintln!("{:?}", miette::Report::new(rich));
    }
}
