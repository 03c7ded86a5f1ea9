//! Recognize adjacent identical clauses and combine them.

use super::ClauseCombiner;
use crate::clause::{Clause, add_repeat_max};

const PRIORITY: u32 = 1;

/// Combines two structurally identical clauses (either of which may already
/// be a repetition wrapper around the shared inner clause) into a single
/// repetition whose minimum is the sum of the minimums and whose maximum is
/// the sum of the maximums, with an unbounded maximum absorbing any addend.
pub struct RepetitionCombiner;

impl ClauseCombiner for RepetitionCombiner {
    fn name(&self) -> &'static str {
        "repetition"
    }

    fn priority(&self, left: &Clause, right: &Clause) -> Option<u32> {
        if left == right {
            return Some(PRIORITY);
        }
        (left.repeat_parts().0 == right.repeat_parts().0).then_some(PRIORITY)
    }

    fn combine(&self, left: Clause, right: Clause) -> Clause {
        assert!(
            self.can_combine(&left, &right),
            "cannot combine {left} and {right}"
        );
        let (inner, left_min, left_max) = left.into_repeat_parts();
        let (_, right_min, right_max) = right.into_repeat_parts();
        Clause::Repeat {
            clause: Box::new(inner),
            min: left_min + right_min,
            max: add_repeat_max(left_max, right_max),
        }
    }
}
