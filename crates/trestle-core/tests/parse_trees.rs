// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Snapshot tests for representative device-tree parses.
//!
//! Trees are rendered with `debug_tree` (spans, kinds and token text) or
//! `to_sexp` when only the shape matters.

use trestle_core::dts::{self, DtsNode};
use trestle_core::engine::{CancellationToken, ParseError, ParseOptions};
use trestle_core::source_analysis::Diagnostic;

fn render(root_sexp: String, diagnostics: &[Diagnostic]) -> String {
    let mut output = root_sexp;
    for diagnostic in diagnostics {
        output.push('\n');
        output.push_str(&diagnostic.to_string());
    }
    output
}

#[test]
fn root_node_with_property() {
    let (root, diagnostics) = dts::parse("/ { a = <1>; };");
    assert!(diagnostics.is_empty());
    insta::assert_snapshot!(root.debug_tree().trim_end(), @r#"
    File@0..15
      Content@0..15
        Entry@0..15
          RootNode@0..14
            Slash@0..1 "/"
            LBrace@2..3 "{"
            NodeContent@3..12
              Entry@3..12
                Property@3..11
                  Name@4..5 "a"
                  Assign@6..7 "="
                  CellArray@7..11
                    LAngl@8..9 "<"
                    Cell@9..10
                      Int@9..10 "1"
                    RAngl@10..11 ">"
                Semicolon@11..12 ";"
            RBrace@13..14 "}"
          Semicolon@14..15 ";"
      Eof@15..15 ""
    "#);
}

#[test]
fn value_macro_expands_under_macro_root() {
    let (root, diagnostics) = dts::parse("gpios = <&gpio 5 GPIO_ACTIVE_LOW>;");
    assert!(diagnostics.is_empty());
    insta::assert_snapshot!(root.debug_tree_expanded().trim_end(), @r#"
    File@0..34
      NodeContent@0..34
        Entry@0..34
          Property@0..33
            Name@0..5 "gpios"
            Assign@6..7 "="
            CellArray@7..33
              LAngl@8..9 "<"
              PHandle@9..14
                Handle@9..10 "&"
                Name@10..14 "gpio"
              Cell@14..16
                Int@15..16 "5"
              Cell@16..32
                PpMacro@16..32
                  PpMacro@17..32 "GPIO_ACTIVE_LOW" (lazy)
                    MacroRoot@17..32
                      MacroCall@17..32
                        Ident@17..32 "GPIO_ACTIVE_LOW"
                      Eof@32..32 ""
              RAngl@32..33 ">"
          Semicolon@33..34 ";"
      Eof@34..34 ""
    "#);
}

#[test]
fn statement_macro_collapses() {
    let (root, diagnostics) = dts::parse("FOO(1);");
    assert!(diagnostics.is_empty());
    insta::assert_snapshot!(root.debug_tree_expanded().trim_end(), @r#"
    File@0..7
      Content@0..7
        Entry@0..7
          PpMacro@0..6
            PpMacro@0..6 "FOO(1)" (lazy)
              MacroStatement@0..6
                Ident@0..3 "FOO"
                MacroArgs@3..6
                  LParen@3..4 "("
                  MacroArg@4..5
                    IntExpr@4..5
                      Int@4..5 "1"
                  RParen@5..6 ")"
                Eof@6..6 ""
          Semicolon@6..7 ";"
      Eof@7..7 ""
    "#);
}

#[test]
fn unclosed_cell_array_recovers_locally() {
    let (root, diagnostics) = dts::parse("/ { a = <1 2; b; };");
    insta::assert_snapshot!(render(root.to_sexp(), &diagnostics), @r"
    (File (Content (Entry (RootNode / { (NodeContent (Entry (Property a = (CellArray < (Cell 1) (Cell 2))) ;) (Entry (Property b) ;)) }) ;)))
    error@12..13: expected '>', got ';'
    ");
}

#[test]
fn unknown_statement_is_skipped() {
    let (root, diagnostics) = dts::parse("/dts-v1/;\nbogus;\n");
    insta::assert_snapshot!(render(root.to_sexp(), &diagnostics), @r"
    (File (Content (Entry (CompilerDirective /dts-v1/) ;) (Error bogus ;)))
    error@10..15: expected root node or directive, got 'bogus'
    ");
}

#[test]
fn expression_precedence() {
    let (root, diagnostics) = dts::parse_expression("-1 + 2 * (3 ? 4 : 5)");
    assert!(diagnostics.is_empty());
    insta::assert_snapshot!(root.to_sexp(), @"(ExpressionFile (AddExpr (NegExpr - (IntExpr 1)) + (MulExpr (IntExpr 2) * (ParenExpr ( (TernaryExpr (IntExpr 3) ? (IntExpr 4) : (IntExpr 5)) )))))");
}

#[test]
fn configured_depth_limit() {
    let options = ParseOptions { max_depth: 5 };
    let parse = dts::parse_with("/ { a { b { c { }; }; }; };", &options, None)
        .expect("parse without cancellation");
    assert_eq!(parse.root().text(), "/ { a { b { c { }; }; }; };");
    let messages: Vec<_> = parse.diagnostics().iter().map(|d| d.message.as_str()).collect();
    assert_eq!(messages, vec!["input nested too deeply (limit is 5 levels)"]);
}

#[test]
fn cancelled_parse_returns_error() {
    let token = CancellationToken::new();
    token.cancel();
    let result = dts::parse_with("/ { };", &ParseOptions::default(), Some(&token));
    assert!(matches!(result, Err(ParseError::Cancelled { .. })));
}

#[test]
fn fragment_files_parse_as_node_content() {
    let (root, diagnostics) = dts::parse("&i2c0 { status = \"okay\"; };\n");
    assert!(diagnostics.is_empty());
    assert_eq!(root.find_all(DtsNode::RootNode).len(), 1);

    let (root, diagnostics) = dts::parse("status = \"okay\";\n");
    assert!(diagnostics.is_empty());
    assert!(root.child(DtsNode::NodeContent).is_some());
}
