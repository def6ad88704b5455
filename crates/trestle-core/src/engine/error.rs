// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Errors that end a parse early.
//!
//! Malformed input is never an error here; it produces diagnostics and
//! error nodes. The only way a parse fails is being cancelled.

// Suppress unused_assignments for struct fields used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ParseError {
    /// A [`CancellationToken`](super::CancellationToken) was triggered.
    #[error("parse cancelled after {rule_calls} rule invocations")]
    #[diagnostic(
        code(trestle::parse::cancelled),
        help("the input changed or the request was withdrawn; parse again if still needed")
    )]
    Cancelled { rule_calls: u64 },
}
