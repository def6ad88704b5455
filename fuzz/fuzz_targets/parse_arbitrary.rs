// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for parser crash safety and losslessness.
//!
//! Feeds arbitrary input to the device-tree parser and asserts that it
//! never panics, that the tree reproduces the input exactly, and that
//! every error node came with a diagnostic. Each macro region is
//! materialized as well, so the embedded grammar is fuzzed too.
//!
//! The corpus in `fuzz/corpus/parse_arbitrary/` seeds mutation with
//! small device-tree files.

#![no_main]

use libfuzzer_sys::fuzz_target;
use trestle_core::dts;

fuzz_target!(|data: &[u8]| {
    // Invalid UTF-8 never reaches the lexer
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    let (root, diagnostics) = dts::parse(source);
    assert_eq!(root.text(), source);
    if root.has_errors() {
        assert!(!diagnostics.is_empty());
    }

    for region in root.lazy_regions() {
        let embedded = region.materialize();
        assert_eq!(embedded.root().span(), region.span());
        if embedded.root().has_errors() {
            assert!(!embedded.diagnostics().is_empty());
        }
    }
});
