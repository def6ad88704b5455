// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Precedence climbing over a static operator table.
//!
//! One parametrised rule, [`expression`], parses every expression of a
//! grammar. Levels are small integers where a higher level binds
//! tighter, and level [`LOWEST`] means "no restriction".
//!
//! The loop consumes an operator only if its level is greater than the
//! level the caller asked for:
//!
//! - left-associative operators parse their right operand at their own
//!   level, so `a - b - c` folds to `(a - b) - c` in the loop;
//! - right-associative operators parse it one level lower;
//! - prefix operators parse their operand at the table's prefix level,
//!   so `-a * b` is `(-a) * b`;
//! - both ternary branches parse at [`LOWEST`], so `a ? b ? c : d : e`
//!   nests in the then-branch and `a ? b : c ? d : e` chains in the
//!   else-branch.

use super::language::Language;
use super::parser::{CompletedMarker, Parser};

/// The level that accepts every operator.
pub const LOWEST: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
    /// Chaining two operators of the same level is reported.
    None,
}

/// A binary operator row of the precedence table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryOperator<L: Language> {
    pub token: L::TokenKind,
    pub level: u8,
    pub associativity: Associativity,
    pub node: L::NodeKind,
}

impl<L: Language> BinaryOperator<L> {
    #[must_use]
    pub const fn left(token: L::TokenKind, level: u8, node: L::NodeKind) -> Self {
        Self {
            token,
            level,
            associativity: Associativity::Left,
            node,
        }
    }

    #[must_use]
    pub const fn right(token: L::TokenKind, level: u8, node: L::NodeKind) -> Self {
        Self {
            token,
            level,
            associativity: Associativity::Right,
            node,
        }
    }

    #[must_use]
    pub const fn non_assoc(token: L::TokenKind, level: u8, node: L::NodeKind) -> Self {
        Self {
            token,
            level,
            associativity: Associativity::None,
            node,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixOperator<L: Language> {
    pub token: L::TokenKind,
    pub node: L::NodeKind,
}

/// `cond <token> then <separator> else`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TernaryOperator<L: Language> {
    pub token: L::TokenKind,
    pub separator: L::TokenKind,
    pub level: u8,
    pub node: L::NodeKind,
}

/// `<open> expression <close>`, parsed with no level restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grouping<L: Language> {
    pub open: L::TokenKind,
    pub close: L::TokenKind,
    pub node: L::NodeKind,
}

/// The precedence table of one grammar. Built as a `static` and never
/// mutated.
#[derive(Debug, Clone, Copy)]
pub struct OperatorTable<L: Language> {
    pub binary: &'static [BinaryOperator<L>],
    pub prefix: &'static [PrefixOperator<L>],
    /// Level operands of prefix operators are parsed at.
    pub prefix_level: u8,
    pub ternary: Option<TernaryOperator<L>>,
    pub grouping: Option<Grouping<L>>,
}

impl<L: Language> OperatorTable<L> {
    /// The binary operator row for `token`, if any.
    #[must_use]
    pub fn binary(&self, token: L::TokenKind) -> Option<&BinaryOperator<L>> {
        self.binary.iter().find(|op| op.token == token)
    }

    #[must_use]
    pub fn prefix(&self, token: L::TokenKind) -> Option<&PrefixOperator<L>> {
        self.prefix.iter().find(|op| op.token == token)
    }
}

/// Parses an expression whose operators all bind tighter than
/// `min_level`. Returns `false` if no primary matched, in which case
/// nothing was consumed.
pub fn expression<L: Language>(p: &mut Parser<'_, L>, min_level: u8) -> bool {
    expression_node(p, min_level).is_some()
}

/// [`expression`], returning the outermost node.
pub fn expression_node<L: Language>(p: &mut Parser<'_, L>, min_level: u8) -> Option<CompletedMarker> {
    let table = p.grammar().operators()?;
    p.rule("expression", |p| {
        let mut lhs = primary(p, table)?;
        loop {
            let current = p.current();
            if let Some(ternary) = table.ternary.filter(|t| t.token == current) {
                if ternary.level <= min_level {
                    break;
                }
                let m = lhs.precede(p);
                p.bump();
                operand(p, LOWEST);
                if p.expect(ternary.separator) {
                    operand(p, LOWEST);
                }
                lhs = p.close(m, ternary.node);
                continue;
            }

            let Some(&op) = table.binary(current) else {
                break;
            };
            if op.level <= min_level {
                break;
            }
            let m = lhs.precede(p);
            p.bump();
            let rhs_level = match op.associativity {
                Associativity::Left | Associativity::None => op.level,
                Associativity::Right => op.level - 1,
            };
            operand(p, rhs_level);
            lhs = p.close(m, op.node);

            if op.associativity == Associativity::None
                && table.binary(p.current()).is_some_and(|next| next.level == op.level)
            {
                let found = p.describe_current();
                p.error(ecow::eco_format!(
                    "{found} cannot be chained without parentheses"
                ));
            }
        }
        Some(lhs)
    })
}

/// Parses an operand that must be present, reporting its absence.
fn operand<L: Language>(p: &mut Parser<'_, L>, min_level: u8) {
    if !expression(p, min_level) {
        p.error_expected("expression");
    }
}

fn primary<L: Language>(p: &mut Parser<'_, L>, table: &OperatorTable<L>) -> Option<CompletedMarker> {
    let current = p.current();
    if let Some(op) = table.prefix(current) {
        let m = p.open();
        p.bump();
        operand(p, table.prefix_level);
        return Some(p.close(m, op.node));
    }
    if let Some(group) = table.grouping.filter(|g| g.open == current) {
        let m = p.open();
        p.bump();
        operand(p, LOWEST);
        p.expect(group.close);
        return Some(p.close(m, group.node));
    }
    p.grammar().parse_atom(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{CalcExpressionGrammar, parse_calc_with};

    fn sexp(source: &str) -> String {
        let (root, diagnostics) = parse_calc_with(&CalcExpressionGrammar, source);
        assert!(diagnostics.is_empty(), "{source}: {diagnostics:?}");
        root.to_sexp()
    }

    fn errors(source: &str) -> Vec<String> {
        let (_, diagnostics) = parse_calc_with(&CalcExpressionGrammar, source);
        diagnostics.into_iter().map(|d| d.message.to_string()).collect()
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            sexp("1+2*3"),
            "(Expr (Add (Num 1) + (Mul (Num 2) * (Num 3))))"
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            sexp("1-2-3"),
            "(Expr (Sub (Sub (Num 1) - (Num 2)) - (Num 3)))"
        );
    }

    #[test]
    fn nested_ternary_in_then_branch() {
        assert_eq!(
            sexp("a?b?c:d:e"),
            "(Expr (Ternary (Name a) ? (Ternary (Name b) ? (Name c) : (Name d)) : (Name e)))"
        );
    }

    #[test]
    fn ternary_chains_in_else_branch() {
        assert_eq!(
            sexp("a?b:c?d:e"),
            "(Expr (Ternary (Name a) ? (Name b) : (Ternary (Name c) ? (Name d) : (Name e))))"
        );
    }

    #[test]
    fn prefix_binds_tighter_than_binary() {
        assert_eq!(sexp("-a*b"), "(Expr (Mul (Neg - (Name a)) * (Name b)))");
        assert_eq!(sexp("!-a"), "(Expr (Not ! (Neg - (Name a))))");
    }

    #[test]
    fn right_associative_operator_nests_right() {
        assert_eq!(
            sexp("2^3^4"),
            "(Expr (Pow (Num 2) ^ (Pow (Num 3) ^ (Num 4))))"
        );
    }

    #[test]
    fn parentheses_reset_the_level() {
        assert_eq!(
            sexp("(1+2)*3"),
            "(Expr (Mul (Paren ( (Add (Num 1) + (Num 2)) )) * (Num 3)))"
        );
    }

    #[test]
    fn binary_binds_tighter_than_ternary_condition() {
        assert_eq!(
            sexp("a+b?c:d"),
            "(Expr (Ternary (Add (Name a) + (Name b)) ? (Name c) : (Name d)))"
        );
    }

    #[test]
    fn chained_non_associative_operator_is_reported() {
        assert_eq!(
            errors("a<b<c"),
            vec!["'<' cannot be chained without parentheses"]
        );
    }

    #[test]
    fn missing_right_operand_is_reported_once() {
        assert_eq!(errors("1+"), vec!["expected expression, got end of input"]);
    }

    #[test]
    fn missing_close_paren_is_reported() {
        assert_eq!(errors("(1"), vec!["expected ')', got end of input"]);
    }

    #[test]
    fn deep_nesting_hits_depth_limit_without_overflow() {
        let source = format!("{}1{}", "(".repeat(5000), ")".repeat(5000));
        let diagnostics = errors(&source);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].contains("nested too deeply"));
    }
}
