//! Clause types making up a compiled corpus query.
//!
//! Clauses form a tree; the children of a [`Clause::Sequence`] are the flat
//! sibling lists the rewrite optimizer operates on. Structural equality
//! (derived `PartialEq`) is what the repetition rule means by "identical".
//! The `Display` form is deterministic and is used as the canonical text of a
//! query when computing job identity, so it must remain stable.

use std::fmt;

/// A component sub-query, combinable with its siblings inside a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Clause {
    /// A single-token constraint on one annotation, e.g. `lemma = "walk"`.
    Term { annotation: String, value: String },

    /// Adjacent single-token constraints on the same annotation, executed as
    /// one phrase lookup. Produced by the adjacency rule; cheaper than the
    /// equivalent `Sequence` of `Term`s.
    Phrase {
        annotation: String,
        values: Vec<String>,
    },

    /// Matches any single token.
    AnyToken,

    /// `min..=max` repetitions of the inner clause; `max == None` means
    /// unbounded.
    Repeat {
        clause: Box<Clause>,
        min: u32,
        max: Option<u32>,
    },

    /// The inner clause's hits stretched by `min..=max` arbitrary tokens to
    /// one side. Produced by combining a clause with an adjacent run of
    /// [`Clause::AnyToken`].
    Expansion {
        clause: Box<Clause>,
        direction: Direction,
        min: u32,
        max: Option<u32>,
    },

    /// Ordered adjacency of sub-clauses.
    Sequence(Vec<Clause>),
}

/// Side on which an [`Clause::Expansion`] stretches its hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

impl Clause {
    pub fn term(annotation: impl Into<String>, value: impl Into<String>) -> Clause {
        Clause::Term {
            annotation: annotation.into(),
            value: value.into(),
        }
    }

    pub fn phrase(
        annotation: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Clause {
        Clause::Phrase {
            annotation: annotation.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Wraps `self` in a repetition. `repeat(1, Some(1))` is the identity.
    pub fn repeated(self, min: u32, max: Option<u32>) -> Clause {
        if min == 1 && max == Some(1) {
            return self;
        }
        Clause::Repeat {
            clause: Box::new(self),
            min,
            max,
        }
    }

    pub fn sequence(clauses: impl IntoIterator<Item = Clause>) -> Clause {
        Clause::Sequence(clauses.into_iter().collect())
    }

    /// Views any clause as a repetition: a `Repeat` yields its parts, every
    /// other clause counts as one repetition of itself.
    pub fn repeat_parts(&self) -> (&Clause, u32, Option<u32>) {
        match self {
            Clause::Repeat { clause, min, max } => (clause, *min, *max),
            other => (other, 1, Some(1)),
        }
    }

    /// Consuming variant of [`repeat_parts`](Self::repeat_parts).
    pub fn into_repeat_parts(self) -> (Clause, u32, Option<u32>) {
        match self {
            Clause::Repeat { clause, min, max } => (*clause, min, max),
            other => (other, 1, Some(1)),
        }
    }

    /// True for `AnyToken` or a repetition of `AnyToken`: the shapes the
    /// expansion rule absorbs.
    pub fn is_any_token_run(&self) -> bool {
        matches!(self.repeat_parts().0, Clause::AnyToken)
    }
}

/// Adds two repetition maximums; an unbounded maximum absorbs any addend.
pub fn add_repeat_max(left: Option<u32>, right: Option<u32>) -> Option<u32> {
    match (left, right) {
        (Some(l), Some(r)) => Some(l.saturating_add(r)),
        _ => None,
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Term { annotation, value } => write!(f, "{annotation}={value:?}"),
            Clause::Phrase { annotation, values } => {
                write!(f, "{annotation}=[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{value:?}")?;
                }
                write!(f, "]")
            }
            Clause::AnyToken => write!(f, "[]"),
            Clause::Repeat { clause, min, max } => {
                write!(f, "rep({clause}, {min}, {})", MaxRep(*max))
            }
            Clause::Expansion {
                clause,
                direction,
                min,
                max,
            } => {
                let side = match direction {
                    Direction::Left => "left",
                    Direction::Right => "right",
                };
                write!(f, "expand({clause}, {side}, {min}, {})", MaxRep(*max))
            }
            Clause::Sequence(clauses) => {
                write!(f, "seq(")?;
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{clause}")?;
                }
                write!(f, ")")
            }
        }
    }
}

struct MaxRep(Option<u32>);

impl fmt::Display for MaxRep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(max) => write!(f, "{max}"),
            None => write!(f, "inf"),
        }
    }
}
