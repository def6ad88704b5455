// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! C preprocessor expressions, as they appear inside cell arrays.

use super::Dts;
use super::grammar::{char_literal, pp_macro};
use super::macros::MACRO_RULES;
use super::syntax::{DtsNode, DtsToken};
use crate::engine::{
    BinaryOperator, CompletedMarker, EmbedContext, Grammar, Grouping, LOWEST, LazyRule,
    OperatorTable, Parser, PrefixOperator, RootShape, TernaryOperator, expression,
};

/// C operator precedence, loosest first.
pub(crate) static OPERATORS: OperatorTable<Dts> = OperatorTable {
    binary: &[
        BinaryOperator::left(DtsToken::LOr, 2, DtsNode::LOrExpr),
        BinaryOperator::left(DtsToken::LAnd, 3, DtsNode::LAndExpr),
        BinaryOperator::left(DtsToken::Or, 4, DtsNode::BOrExpr),
        BinaryOperator::left(DtsToken::Xor, 5, DtsNode::XorExpr),
        BinaryOperator::left(DtsToken::And, 6, DtsNode::BAndExpr),
        BinaryOperator::left(DtsToken::Eq, 7, DtsNode::EqExpr),
        BinaryOperator::left(DtsToken::Neq, 7, DtsNode::NeqExpr),
        BinaryOperator::left(DtsToken::Les, 8, DtsNode::LesExpr),
        BinaryOperator::left(DtsToken::Grt, 8, DtsNode::GrtExpr),
        BinaryOperator::left(DtsToken::Leq, 8, DtsNode::LeqExpr),
        BinaryOperator::left(DtsToken::Geq, 8, DtsNode::GeqExpr),
        BinaryOperator::left(DtsToken::Lsh, 9, DtsNode::LshExpr),
        BinaryOperator::left(DtsToken::Rsh, 9, DtsNode::RshExpr),
        BinaryOperator::left(DtsToken::Add, 10, DtsNode::AddExpr),
        BinaryOperator::left(DtsToken::Sub, 10, DtsNode::SubExpr),
        BinaryOperator::left(DtsToken::Mul, 11, DtsNode::MulExpr),
        BinaryOperator::left(DtsToken::Div, 11, DtsNode::DivExpr),
        BinaryOperator::left(DtsToken::Mod, 11, DtsNode::ModExpr),
    ],
    prefix: &[
        PrefixOperator {
            token: DtsToken::Sub,
            node: DtsNode::NegExpr,
        },
        PrefixOperator {
            token: DtsToken::LNot,
            node: DtsNode::LNotExpr,
        },
        PrefixOperator {
            token: DtsToken::Not,
            node: DtsNode::BNotExpr,
        },
    ],
    prefix_level: 12,
    ternary: Some(TernaryOperator {
        token: DtsToken::Ternary,
        separator: DtsToken::Colon,
        level: 1,
        node: DtsNode::TernaryExpr,
    }),
    grouping: Some(Grouping {
        open: DtsToken::LParen,
        close: DtsToken::RParen,
        node: DtsNode::ParenExpr,
    }),
};

/// Literals and macros: the primaries shared by every device-tree
/// expression.
pub(crate) fn atom(p: &mut Parser<'_, Dts>) -> Option<CompletedMarker> {
    let kind = match p.current() {
        DtsToken::Int => DtsNode::IntExpr,
        DtsToken::SQuote => DtsNode::CharExpr,
        DtsToken::PpMacro => DtsNode::PpMacroExpr,
        _ => return None,
    };
    let m = p.open();
    match kind {
        DtsNode::IntExpr => p.bump(),
        DtsNode::CharExpr => {
            char_literal(p);
        }
        _ => {
            pp_macro(p);
        }
    }
    Some(p.close(m, kind))
}

/// A standalone expression, such as the text of a `(...)` cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionGrammar;

impl Grammar<Dts> for ExpressionGrammar {
    fn name(&self) -> &'static str {
        "dts-expression"
    }

    fn root(&self, _context: &EmbedContext<Dts>) -> RootShape<Dts> {
        RootShape::Node(DtsNode::ExpressionFile)
    }

    fn parse_entry(&self, p: &mut Parser<'_, Dts>) {
        if !expression(p, LOWEST) {
            p.error_expected("expression");
        }
    }

    fn operators(&self) -> Option<&OperatorTable<Dts>> {
        Some(&OPERATORS)
    }

    fn parse_atom(&self, p: &mut Parser<'_, Dts>) -> Option<CompletedMarker> {
        atom(p)
    }

    fn lazy_rules(&self) -> &[LazyRule<Dts>] {
        &MACRO_RULES
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_expression;

    fn sexp(source: &str) -> String {
        let (root, diagnostics) = parse_expression(source);
        assert!(diagnostics.is_empty(), "{source}: {diagnostics:?}");
        root.to_sexp()
    }

    fn messages(source: &str) -> Vec<String> {
        parse_expression(source)
            .1
            .into_iter()
            .map(|d| d.message.to_string())
            .collect()
    }

    #[test]
    fn shifts_bind_tighter_than_bitwise_or() {
        assert_eq!(
            sexp("1 << 2 | 3"),
            "(ExpressionFile (BOrExpr (LshExpr (IntExpr 1) << (IntExpr 2)) | (IntExpr 3)))"
        );
    }

    #[test]
    fn comparison_binds_tighter_than_logical_and() {
        assert_eq!(
            sexp("1 < 2 && 3 >= 4"),
            "(ExpressionFile (LAndExpr (LesExpr (IntExpr 1) < (IntExpr 2)) && \
             (GeqExpr (IntExpr 3) >= (IntExpr 4))))"
        );
    }

    #[test]
    fn equality_is_left_associative() {
        assert_eq!(
            sexp("1 == 2 != 3"),
            "(ExpressionFile (NeqExpr (EqExpr (IntExpr 1) == (IntExpr 2)) != (IntExpr 3)))"
        );
    }

    #[test]
    fn ternary_is_loosest() {
        assert_eq!(
            sexp("1 || 2 ? 3 : 4"),
            "(ExpressionFile (TernaryExpr (LOrExpr (IntExpr 1) || (IntExpr 2)) ? \
             (IntExpr 3) : (IntExpr 4)))"
        );
    }

    #[test]
    fn prefix_operators_and_groups() {
        assert_eq!(
            sexp("~(1 + 2) * -3"),
            "(ExpressionFile (MulExpr (BNotExpr ~ (ParenExpr ( (AddExpr (IntExpr 1) + \
             (IntExpr 2)) ))) * (NegExpr - (IntExpr 3))))"
        );
    }

    #[test]
    fn characters_and_macros_are_primaries() {
        assert_eq!(
            sexp("'a' + FOO(1)"),
            "(ExpressionFile (AddExpr (CharExpr (Char ' a ')) + (PpMacroExpr (PpMacro FOO(1)))))"
        );
    }

    #[test]
    fn empty_expression_is_reported() {
        assert_eq!(messages(""), vec!["expected expression, got end of input"]);
    }

    #[test]
    fn missing_right_operand() {
        assert_eq!(messages("1 +"), vec!["expected expression, got end of input"]);
    }

    #[test]
    fn unclosed_group() {
        assert_eq!(messages("(1 + 2"), vec!["expected ')', got end of input"]);
    }

    #[test]
    fn trailing_tokens_are_leftovers() {
        let (root, diagnostics) = parse_expression("1 2");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message.as_str(), "unexpected '2'");
        assert!(root.has_errors());
    }
}
