// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Source primitives shared by every grammar.
//!
//! - [`Span`]: byte ranges into the input
//! - [`Token`] and [`Trivia`]: what lexers hand to the engine
//! - [`Diagnostic`]: what the engine hands back besides the tree

mod diagnostic;
mod span;
mod token;

pub use diagnostic::{Diagnostic, Severity};
pub use span::Span;
pub use token::{Token, Trivia};
