//! Absorb runs of arbitrary tokens into an expansion of the neighboring
//! clause.

use super::ClauseCombiner;
use crate::clause::{Clause, Direction, add_repeat_max};

const PRIORITY: u32 = 3;

/// Combines a clause with an adjacent run of `[]` (any-token) into an
/// [`Clause::Expansion`], so the engine matches the concrete clause and
/// stretches its hits instead of joining against every token position. An
/// existing expansion on the matching side is extended rather than nested.
pub struct AnyExpansionCombiner;

/// `AnyToken` or a repetition of it, as `(min, max)`.
fn any_run(clause: &Clause) -> Option<(u32, Option<u32>)> {
    let (inner, min, max) = clause.repeat_parts();
    matches!(inner, Clause::AnyToken).then_some((min, max))
}

impl ClauseCombiner for AnyExpansionCombiner {
    fn name(&self) -> &'static str {
        "any-expansion"
    }

    fn priority(&self, left: &Clause, right: &Clause) -> Option<u32> {
        // A pair of any-token runs belongs to the repetition rule.
        match (left.is_any_token_run(), right.is_any_token_run()) {
            (false, true) | (true, false) => Some(PRIORITY),
            _ => None,
        }
    }

    fn combine(&self, left: Clause, right: Clause) -> Clause {
        assert!(
            self.can_combine(&left, &right),
            "cannot combine {left} and {right}"
        );
        if let Some((run_min, run_max)) = any_run(&right) {
            expand(left, Direction::Right, run_min, run_max)
        } else {
            let (run_min, run_max) = any_run(&left).expect("checked by can_combine");
            expand(right, Direction::Left, run_min, run_max)
        }
    }
}

fn expand(base: Clause, direction: Direction, run_min: u32, run_max: Option<u32>) -> Clause {
    match base {
        Clause::Expansion {
            clause,
            direction: existing,
            min,
            max,
        } if existing == direction => Clause::Expansion {
            clause,
            direction,
            min: min + run_min,
            max: add_repeat_max(max, run_max),
        },
        other => Clause::Expansion {
            clause: Box::new(other),
            direction,
            min: run_min,
            max: run_max,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clause_followed_by_any_run_expands_right() {
        let rule = AnyExpansionCombiner;
        let left = Clause::term("word", "cat");
        let right = Clause::AnyToken.repeated(0, Some(3));
        assert_eq!(rule.priority(&left, &right), Some(3));
        assert_eq!(
            rule.combine(left, right),
            Clause::Expansion {
                clause: Box::new(Clause::term("word", "cat")),
                direction: Direction::Right,
                min: 0,
                max: Some(3),
            }
        );
    }

    #[test]
    fn any_run_followed_by_clause_expands_left() {
        let rule = AnyExpansionCombiner;
        let left = Clause::AnyToken;
        let right = Clause::term("word", "cat");
        assert_eq!(
            rule.combine(left, right),
            Clause::Expansion {
                clause: Box::new(Clause::term("word", "cat")),
                direction: Direction::Left,
                min: 1,
                max: Some(1),
            }
        );
    }

    #[test]
    fn existing_expansion_is_extended_not_nested() {
        let rule = AnyExpansionCombiner;
        let left = Clause::Expansion {
            clause: Box::new(Clause::term("word", "cat")),
            direction: Direction::Right,
            min: 1,
            max: Some(2),
        };
        let right = Clause::AnyToken.repeated(1, None);
        assert_eq!(
            rule.combine(left, right),
            Clause::Expansion {
                clause: Box::new(Clause::term("word", "cat")),
                direction: Direction::Right,
                min: 2,
                max: None,
            }
        );
    }

    #[test]
    fn two_any_runs_do_not_combine_here() {
        let rule = AnyExpansionCombiner;
        let left = Clause::AnyToken;
        let right = Clause::AnyToken.repeated(1, Some(2));
        assert_eq!(rule.priority(&left, &right), None);
    }
}
