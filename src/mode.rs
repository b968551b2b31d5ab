// ABOUTME: The per-call operand-evaluation overlay (§4.1.2)

use crate::value::MacroParams;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub enum Mode {
    Or,
    And,
    /// `test` is filled in once position 1 (the condition) has been
    /// resolved, so positions 2/3 can decide whether to evaluate or skip.
    If { test: Option<bool> },
    /// 1-based positions that ARE evaluated; everything else is passed as
    /// the raw, unevaluated sub-expression (not a Nil placeholder).
    Exec(HashSet<usize>),
    /// `catch`: position 1 (the protected expression) is evaluated;
    /// positions >= 2 (handler clauses) are skipped with a Nil placeholder
    /// and only inspected later, during Fatal unwinding (§4.5).
    Try,
}

/// What the evaluator should do with the operand at a freshly-incremented
/// position (1-based; see §4.1.2).
pub enum Disposition {
    Evaluate,
    /// Push this literal value instead of evaluating the sub-expression.
    Literal(LiteralKind),
}

pub enum LiteralKind {
    /// The sub-expression itself, unevaluated (EXEC mask misses).
    RawForm,
    /// A Nil placeholder (IF's skipped branch, TRY's clauses).
    Nil,
}

impl Mode {
    /// The mode that should be loaded once a call's head settles (§4.1.1
    /// step 2), keyed by primitive name.
    pub fn for_primitive(name: &str) -> Option<Mode> {
        match name {
            "or" => Some(Mode::Or),
            "and" => Some(Mode::And),
            "if" => Some(Mode::If { test: None }),
            "quote" | "lambda" | "defmacro" => Some(Mode::Exec(HashSet::new())),
            "define" | "set!" => Some(Mode::Exec(HashSet::from([2]))),
            "catch" => Some(Mode::Try),
            _ => None,
        }
    }

    /// The implicit mode for a Macro call, derived from its parameter
    /// descriptor: evaluated positions are exactly those whose formal
    /// parameter carried a `,name` mark at parse time. A rest-parameter
    /// macro has no per-position marks, so every position is literal (see
    /// SPEC_FULL.md §14).
    pub fn for_macro(params: &MacroParams) -> Mode {
        match params {
            MacroParams::Rest(_) => Mode::Exec(HashSet::new()),
            MacroParams::Fixed(entries) => {
                let evaluated: HashSet<usize> = entries
                    .iter()
                    .enumerate()
                    .filter(|(_, (_, eval))| *eval)
                    .map(|(i, _)| i + 1)
                    .collect();
                Mode::Exec(evaluated)
            }
        }
    }

    /// Decides what to do with operand `pos` (1-based), not accounting for
    /// OR/AND/IF's need to see the already-resolved value at lower
    /// positions — the evaluator applies that decision itself once the
    /// value is known (see `Evaluator::note_operand_pushed`).
    pub fn disposition(&self, pos: usize) -> Disposition {
        match self {
            Mode::Exec(mask) => {
                if mask.contains(&pos) {
                    Disposition::Evaluate
                } else {
                    Disposition::Literal(LiteralKind::RawForm)
                }
            }
            Mode::Try => {
                if pos == 1 {
                    Disposition::Evaluate
                } else {
                    Disposition::Literal(LiteralKind::Nil)
                }
            }
            Mode::If { test } => match (pos, test) {
                (1, _) => Disposition::Evaluate,
                (2, Some(true)) => Disposition::Evaluate,
                (2, _) => Disposition::Literal(LiteralKind::Nil),
                (3, Some(false)) => Disposition::Evaluate,
                (3, _) => Disposition::Literal(LiteralKind::Nil),
                // "Extra positions beyond 3 are skipped."
                _ => Disposition::Literal(LiteralKind::Nil),
            },
            // OR/AND evaluate every position; the short-circuit decision
            // happens after the value is known, in the evaluator.
            Mode::Or | Mode::And => Disposition::Evaluate,
        }
    }
}
