// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Trestle parsing core.
//!
//! This crate contains:
//! - Source primitives (spans, tokens with leading trivia, diagnostics)
//! - A grammar-independent engine that builds lossless concrete syntax
//!   trees with pin-based error recovery, precedence climbing and lazily
//!   parsed embedded regions
//! - A device-tree source front-end built on that engine
//!
//! The engine is designed for editors: every input produces a tree that
//! covers all of it, and embedded regions cost nothing until they are
//! looked at.

#![doc = include_str!("../../../README.md")]

pub mod dts;
pub mod engine;
pub mod source_analysis;
