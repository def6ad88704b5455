// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the engine, driven by the calculator grammar.
//!
//! 1. **Totality**: any input yields a tree whose text is the input
//! 2. **Spans tile**: child spans are contiguous and cover their parent
//! 3. **Error nodes produce diagnostics**
//! 4. **Lazy regions are self-contained**: materializing never panics and
//!    the embedded tree covers exactly the region's text
//! 5. **Determinism**: parsing the same input twice gives equal trees

use proptest::prelude::*;

use super::test_support::{Calc, CalcGrammar, CalcNode, lex};
use super::{Element, Node, parse};

// ============================================================================
// Generators
// ============================================================================

const FRAGMENTS: &[&str] = &[
    "1;",
    "x;",
    "let x = 1;",
    "let y = x + 2 * 3;",
    "a < b ? c : d;",
    "-x ^ 2 ^ 3;",
    "!(a + b);",
    "{1 + 2};",
    "x * {a ? b : c};",
    "(((1)));",
    "let = ;",
    "1 2 3;",
];

fn fragment() -> impl Strategy<Value = String> {
    prop::sample::select(FRAGMENTS).prop_map(std::string::ToString::to_string)
}

/// Several fragments glued together, one of them cut short.
fn near_valid_calc() -> impl Strategy<Value = String> {
    (prop::collection::vec(fragment(), 1..6), any::<prop::sample::Index>()).prop_map(
        |(parts, cut)| {
            let joined = parts.join(" ");
            let mut at = cut.index(joined.len() + 1);
            while !joined.is_char_boundary(at) {
                at -= 1;
            }
            let mut truncated = joined[..at].to_string();
            truncated.push_str(&joined[at..].replacen(';', "", 1));
            truncated
        },
    )
}

fn arbitrary_input() -> impl Strategy<Value = String> {
    prop_oneof![near_valid_calc(), "\\PC{0,300}", "[0-9a-z+*^!<?:=(){};\\- ]{0,200}"]
}

// ============================================================================
// Helpers
// ============================================================================

fn assert_tiled(node: &Node<Calc>) -> Result<(), TestCaseError> {
    let mut cursor = node.span().start();
    for child in node.children() {
        let span = child.full_span();
        prop_assert_eq!(span.start(), cursor, "gap before child of {:?}", node.kind());
        cursor = span.end();
        if let Element::Node(inner) = child {
            assert_tiled(inner)?;
        }
    }
    if !node.children().is_empty() {
        prop_assert_eq!(cursor, node.span().end(), "children of {:?} stop short", node.kind());
    }
    Ok(())
}

fn proptest_config() -> ProptestConfig {
    let default = ProptestConfig::default();
    ProptestConfig {
        cases: default.cases.max(512),
        ..default
    }
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn tree_text_reproduces_input(input in arbitrary_input()) {
        let (root, diagnostics) = parse(&CalcGrammar, lex(&input));
        let len = u32::try_from(input.len()).unwrap_or(u32::MAX);
        prop_assert_eq!(root.text(), input.as_str());
        prop_assert_eq!(root.span().start(), 0);
        prop_assert_eq!(root.span().end(), len);
        for diagnostic in &diagnostics {
            prop_assert!(diagnostic.span.end() <= len, "{} out of bounds", diagnostic);
        }
    }

    #[test]
    fn child_spans_tile_their_parent(input in arbitrary_input()) {
        let (root, _) = parse(&CalcGrammar, lex(&input));
        assert_tiled(&root)?;
    }

    #[test]
    fn error_nodes_produce_diagnostics(input in arbitrary_input()) {
        let (root, diagnostics) = parse(&CalcGrammar, lex(&input));
        if !root.find_all(CalcNode::Error).is_empty() {
            prop_assert!(!diagnostics.is_empty(), "error node without diagnostic for {:?}", input);
        }
    }

    #[test]
    fn lazy_regions_cover_their_token(input in near_valid_calc()) {
        let (root, _) = parse(&CalcGrammar, lex(&input));
        for region in root.lazy_regions() {
            let embedded = region.materialize();
            prop_assert_eq!(embedded.root().text(), region.token().text());
            prop_assert_eq!(embedded.root().span(), region.span());
            assert_tiled(embedded.root())?;
        }
    }

    #[test]
    fn parsing_is_deterministic(input in arbitrary_input()) {
        let first = parse(&CalcGrammar, lex(&input));
        let second = parse(&CalcGrammar, lex(&input));
        prop_assert_eq!(first, second);
    }
}
