//! Merge adjacent token constraints on the same annotation into one phrase.

use super::ClauseCombiner;
use crate::clause::Clause;

const PRIORITY: u32 = 2;

/// Combines two adjacent `Term`/`Phrase` clauses over the same annotation
/// into a single `Phrase`, which executes as one positional lookup instead
/// of an adjacency join.
pub struct AdjacentTermsCombiner;

fn phrase_parts(clause: &Clause) -> Option<(&str, &[String])> {
    match clause {
        Clause::Term { annotation, value } => Some((annotation, std::slice::from_ref(value))),
        Clause::Phrase { annotation, values } => Some((annotation, values)),
        _ => None,
    }
}

impl ClauseCombiner for AdjacentTermsCombiner {
    fn name(&self) -> &'static str {
        "adjacent-terms"
    }

    fn priority(&self, left: &Clause, right: &Clause) -> Option<u32> {
        let (left_annotation, _) = phrase_parts(left)?;
        let (right_annotation, _) = phrase_parts(right)?;
        (left_annotation == right_annotation).then_some(PRIORITY)
    }

    fn combine(&self, left: Clause, right: Clause) -> Clause {
        assert!(
            self.can_combine(&left, &right),
            "cannot combine {left} and {right}"
        );
        let (annotation, left_values) = match phrase_parts(&left) {
            Some((a, v)) => (a.to_string(), v.to_vec()),
            None => unreachable!(),
        };
        let mut values = left_values;
        match right {
            Clause::Term { value, .. } => values.push(value),
            Clause::Phrase {
                values: right_values,
                ..
            } => values.extend(right_values),
            _ => unreachable!(),
        }
        Clause::Phrase { annotation, values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_pairs_merge_into_phrase() {
        let rule = AdjacentTermsCombiner;
        let left = Clause::term("word", "black");
        let right = Clause::term("word", "cat");
        assert_eq!(rule.priority(&left, &right), Some(2));
        assert_eq!(
            rule.combine(left, right),
            Clause::phrase("word", ["black", "cat"])
        );
    }

    #[test]
    fn phrases_concatenate() {
        let rule = AdjacentTermsCombiner;
        let left = Clause::phrase("word", ["the", "black"]);
        let right = Clause::phrase("word", ["cat", "sat"]);
        assert_eq!(
            rule.combine(left, right),
            Clause::phrase("word", ["the", "black", "cat", "sat"])
        );
    }

    #[test]
    fn different_annotations_do_not_combine() {
        let rule = AdjacentTermsCombiner;
        let left = Clause::term("word", "black");
        let right = Clause::term("lemma", "cat");
        assert_eq!(rule.priority(&left, &right), None);
    }
}
