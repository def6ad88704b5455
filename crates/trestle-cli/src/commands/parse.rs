// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `trestle parse`: print the syntax tree of one file.
//!
//! The tree goes to stdout and diagnostics to stderr, so the output can
//! be piped or diffed. Macros stay opaque unless `--expand-macros` is
//! given, in which case each one is parsed and printed beneath its token.

use std::fmt::Write as _;

use camino::Utf8Path;
use clap::ValueEnum;
use miette::Result;
use tracing::debug;
use trestle_core::dts::{self, Dts, ExpressionGrammar};
use trestle_core::engine::{self, Node, Parse, ParseOptions};
use trestle_core::source_analysis::Diagnostic;

use super::{read_source, report};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GrammarChoice {
    /// A device-tree source file
    Dts,
    /// A bare C expression
    Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TreeFormat {
    /// Indented tree with spans
    Tree,
    /// One-line S-expression
    Sexp,
}

pub fn run(
    file: &Utf8Path,
    grammar: GrammarChoice,
    format: TreeFormat,
    expand_macros: bool,
    options: &ParseOptions,
) -> Result<()> {
    let source = read_source(file)?;
    let parse = parse_source(&source, grammar, options)?;
    print!("{}", render(&parse, format, expand_macros));

    let mut diagnostics = parse.diagnostics().to_vec();
    if expand_macros {
        diagnostics.extend(embedded_diagnostics(parse.root()));
    }
    debug!(%file, diagnostics = diagnostics.len(), "parsed file");
    report(&diagnostics, file, &source);
    Ok(())
}

fn parse_source(source: &str, grammar: GrammarChoice, options: &ParseOptions) -> Result<Parse<Dts>> {
    let parse = match grammar {
        GrammarChoice::Dts => dts::parse_with(source, options, None)?,
        GrammarChoice::Expr => engine::parse_with(
            &ExpressionGrammar,
            dts::lex_expression(source, 0),
            options,
            None,
        )?,
    };
    Ok(parse)
}

/// Diagnostics from every macro region, materializing each one.
pub(crate) fn embedded_diagnostics(root: &Node<Dts>) -> Vec<Diagnostic> {
    root.lazy_regions()
        .into_iter()
        .flat_map(|region| region.materialize().diagnostics().iter().cloned())
        .collect()
}

fn render(parse: &Parse<Dts>, format: TreeFormat, expand_macros: bool) -> String {
    let root = parse.root();
    match format {
        TreeFormat::Tree if expand_macros => root.debug_tree_expanded(),
        TreeFormat::Tree => root.debug_tree(),
        TreeFormat::Sexp => {
            let mut out = root.to_sexp();
            out.push('\n');
            if expand_macros {
                for region in root.lazy_regions() {
                    let _ = writeln!(out, "{} {}", region.span(), region.materialize().root().to_sexp());
                }
            }
            out
        }
    }
}
