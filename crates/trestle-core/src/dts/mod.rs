// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Device-tree source, built on the generic engine.
//!
//! Three grammars share the [`Dts`] language:
//!
//! - [`DtsGrammar`] parses whole `.dts`/`.dtsi` files.
//! - [`ExpressionGrammar`] parses a bare C expression.
//! - [`MacroGrammar`] parses the text of a preprocessor macro. The other
//!   two register it for `PpMacro` tokens, so macros become lazy regions
//!   that are parsed only when a consumer asks for them.
//!
//! ```
//! use trestle_core::dts::{self, DtsNode};
//!
//! let (root, diagnostics) = dts::parse("/ { compatible = \"acme,board\"; };");
//! assert!(diagnostics.is_empty());
//! assert_eq!(root.find_all(DtsNode::RootNode).len(), 1);
//! ```

mod expressions;
mod grammar;
mod lexer;
mod macros;
mod syntax;


pub use expressions::ExpressionGrammar;
pub use grammar::DtsGrammar;
pub use lexer::{Lexer, lex, lex_expression, lex_macro};
pub use macros::MacroGrammar;
pub use syntax::{Dts, DtsNode, DtsToken};

use crate::engine::{self, CancellationToken, Node, Parse, ParseError, ParseOptions};
use crate::source_analysis::Diagnostic;

/// Parses a device-tree source file.
#[must_use]
pub fn parse(source: &str) -> (Node<Dts>, Vec<Diagnostic>) {
    engine::parse(&DtsGrammar, lex(source))
}

/// Parses a standalone expression.
#[must_use]
pub fn parse_expression(source: &str) -> (Node<Dts>, Vec<Diagnostic>) {
    engine::parse(&ExpressionGrammar, lex_expression(source, 0))
}

/// Parses a device-tree source file with explicit options.
///
/// # Errors
///
/// Returns [`ParseError::Cancelled`] if `cancellation` fires first.
pub fn parse_with(
    source: &str,
    options: &ParseOptions,
    cancellation: Option<&CancellationToken>,
) -> Result<Parse<Dts>, ParseError> {
    engine::parse_with(&DtsGrammar, lex(source), options, cancellation)
}
